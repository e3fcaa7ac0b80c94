//! Domain models for course prerequisites.
//!
//! This module contains the requirement engine: course atoms, filter criteria,
//! requirement sets and trees, combination enumeration, and the normalizer.

mod atom;
pub use atom::{Atom, InvalidAtomError};

/// Enumeration of the ways a requirement can be fulfilled.
pub mod combination;
pub use combination::Combination;

mod config;
pub use config::Config;

mod error;
pub use error::{ConfigurationError, UnknownAtomError};

mod expression;
pub use expression::Expression;

/// Filter criteria selecting courses from a catalogue.
pub mod filter;
pub use filter::{Filter, FilterKey, Selector};

/// Requirement trees and views of their nodes.
pub mod requirement;
pub use requirement::{NodeId, NodeRef, Relationship, Requirement};

mod requirement_set;
pub use requirement_set::{RequirementSet, SetConfig};

mod simplify;
