//! Unresolved requirement expressions.
//!
//! An [`Expression`] mirrors the shape of a [`Requirement`] but holds filter
//! criteria instead of resolved courses. It is what configuration files and
//! requirement text produce; [`Expression::resolve`] turns it into a
//! requirement against a catalogue.

use serde_json::Value;
use tracing::instrument;

use crate::{
    domain::{
        ConfigurationError, Relationship, Requirement, SetConfig,
        requirement_set::json_kind,
    },
    storage::Catalogue,
};

/// A requirement whose sets have not yet been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// A single requirement set.
    Set(SetConfig),
    /// Sub-expressions joined by a relationship.
    Tree {
        /// How the children combine.
        relationship: Relationship,
        /// The sub-expressions, in order.
        children: Vec<Expression>,
    },
}

impl Expression {
    /// Builds an expression from a JSON value.
    ///
    /// An object with a `relationship` key is a tree, whose `children` hold
    /// further expressions:
    ///
    /// ```json
    /// {"relationship": "or", "children": [{"coursecode": ["MAT1100"]}, {"faculty": ["hf"], "quantity": 1}]}
    /// ```
    ///
    /// Any other object is a requirement set.
    ///
    /// # Errors
    ///
    /// Returns an error if the relationship is neither `and` nor `or`, a child
    /// is not an object, or a set is misconfigured.
    pub fn from_value(value: &Value) -> Result<Self, ConfigurationError> {
        let Value::Object(map) = value else {
            return Err(ConfigurationError::NotARequirement(
                json_kind(value).to_string(),
            ));
        };

        let Some(relationship) = map.get("relationship") else {
            return Ok(Self::Set(SetConfig::from_value(value)?));
        };

        let relationship: Relationship = match relationship {
            Value::String(relationship) => relationship.parse()?,
            other => {
                return Err(ConfigurationError::InvalidRelationship(other.to_string()));
            }
        };

        let children = match map.get("children") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(children)) => children
                .iter()
                .map(Self::from_value)
                .collect::<Result<_, _>>()?,
            Some(other) => {
                return Err(ConfigurationError::NotARequirement(
                    json_kind(other).to_string(),
                ));
            }
        };

        Ok(Self::Tree {
            relationship,
            children,
        })
    }

    /// Resolves every set in the expression against a catalogue.
    ///
    /// # Errors
    ///
    /// Returns the first resolution error encountered.
    #[instrument(level = "debug", skip_all)]
    pub fn resolve(&self, catalogue: &Catalogue) -> Result<Requirement, ConfigurationError> {
        match self {
            Self::Set(config) => Ok(config.resolve(catalogue)?.into()),
            Self::Tree {
                relationship,
                children,
            } => {
                let children = children
                    .iter()
                    .map(|child| child.resolve(catalogue))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Requirement::tree(*relationship, children))
            }
        }
    }
}

impl From<SetConfig> for Expression {
    fn from(config: SetConfig) -> Self {
        Self::Set(config)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use test_case::test_case;

    use super::*;
    use crate::{domain::Atom, storage::catalogue::tests::sample_catalogue};

    #[test]
    fn object_without_relationship_is_a_set() {
        let expression = Expression::from_value(&json!({"coursecode": ["MAT1100"]})).unwrap();
        assert!(matches!(expression, Expression::Set(_)));
    }

    #[test]
    fn nested_trees_resolve() {
        let expression = Expression::from_value(&json!({
            "relationship": "AND",
            "children": [
                {"institute": ["stk"], "quantity": 1},
                {
                    "relationship": "or",
                    "children": [{"coursecode": ["MAT1100"]}, {"coursecode": ["MAT1110"]}]
                }
            ]
        }))
        .unwrap();

        let requirement = expression.resolve(&sample_catalogue()).unwrap();
        assert_eq!(requirement.relationship(), Some(Relationship::And));
        assert_eq!(requirement.combination_count(), 4);
        assert_eq!(
            requirement.courses(),
            ["STK1100", "STK1110", "MAT1100", "MAT1110"].map(|code| Atom::try_from(code).unwrap())
        );
    }

    #[test_case(json!({"relationship": "xor", "children": []}); "unknown relationship")]
    #[test_case(json!({"relationship": 1, "children": []}); "relationship not a string")]
    #[test_case(json!({"relationship": "and", "children": ["MAT1100"]}); "child not an object")]
    #[test_case(json!({"relationship": "and", "children": {}}); "children not a list")]
    #[test_case(json!(3); "not an object")]
    fn malformed_trees_are_rejected(value: Value) {
        assert!(Expression::from_value(&value).is_err());
    }

    #[test]
    fn resolution_errors_surface() {
        let expression = Expression::from_value(&json!({
            "relationship": "or",
            "children": [{"institute": ["stk"], "quantity": 5}]
        }))
        .unwrap();
        assert!(matches!(
            expression.resolve(&sample_catalogue()),
            Err(ConfigurationError::QuantityExceedsAtoms {
                quantity: 5,
                atoms: 2
            })
        ));
    }
}
