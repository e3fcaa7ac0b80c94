//! Errors raised while building or querying requirements.
//!
//! All of these are raised eagerly, at the point where a requirement is
//! configured or resolved. Nothing is deferred to evaluation time.

use thiserror::Error;

use crate::domain::{Atom, atom::InvalidAtomError};

/// A requirement was configured with invalid input.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A filter key other than `faculty`, `institute`, `coursecode` or
    /// `search` was supplied.
    #[error(
        "unknown filter key '{0}': valid keys are faculty, institute, coursecode, search and \
         quantity"
    )]
    UnknownFilterKey(String),

    /// A filter value was not a list of strings.
    #[error("filter '{key}' must be a list of strings, got {found}")]
    NotAStringList {
        /// The offending filter key.
        key: String,
        /// A description of what was found instead.
        found: String,
    },

    /// A quantity was neither a non-negative integer nor unset.
    #[error("quantity must be a non-negative integer or null, got {0}")]
    InvalidQuantity(String),

    /// The quantity asks for more courses than the filters select.
    #[error("quantity {quantity} exceeds the {atoms} course(s) selected")]
    QuantityExceedsAtoms {
        /// The configured quantity.
        quantity: usize,
        /// The number of resolved courses.
        atoms: usize,
    },

    /// A relationship other than `and` or `or` was supplied.
    #[error("relationship must be either 'and' or 'or', not '{0}'")]
    InvalidRelationship(String),

    /// A tree child was neither a requirement set nor a requirement tree.
    #[error("requirement trees can only contain requirement sets or trees, not {0}")]
    NotARequirement(String),

    /// A selector string was empty, or consisted of only the exclusion marker.
    #[error("empty selector in filter '{key}'")]
    EmptySelector {
        /// The filter key holding the empty selector.
        key: String,
    },

    /// A `search` selector did not compile to a valid pattern.
    #[error("invalid search pattern '{pattern}'")]
    InvalidPattern {
        /// The selector as written.
        pattern: String,
        /// The underlying pattern compilation error.
        #[source]
        source: Box<regex::Error>,
    },

    /// A literal course code was not a valid atom.
    #[error(transparent)]
    Atom(#[from] InvalidAtomError),

    /// Requirement text could not be parsed.
    #[error("invalid requirement text: {0}")]
    Syntax(String),
}

/// A course code was queried that the catalogue does not know.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("course {0} is not in the catalogue")]
pub struct UnknownAtomError(pub Atom);
