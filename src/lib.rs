//! Course Prerequisite Requirements
//!
//! Prerequisites are sets of courses picked from a catalogue by faculty,
//! institute, code or pattern, combined into AND/OR trees that can be
//! enumerated, compared and simplified.

pub mod domain;
pub use domain::{
    Atom, Config, ConfigurationError, Expression, Filter, Relationship, Requirement,
    RequirementSet, SetConfig, UnknownAtomError,
};

/// Catalogue loading and the text form of requirements.
pub mod storage;
pub use storage::{Catalogue, CatalogueError};
