//! The text form of requirements.
//!
//! A requirement set renders as `2 of [Faculty: mn, Coursecode: MAT1100]`,
//! listing only the filter categories it was configured with. A tree renders
//! as `{ child and child and ... }`, nested as deep as the tree goes.
//!
//! Parsing is best-effort. A single set, or a single level of braces around
//! sets, reads back into an [`Expression`]. Deeper nesting is rejected. Sets
//! whose courses were derived rather than configured render as literal course
//! codes, so their original criteria are not recoverable.
//!
//! Values within a set are separated by `", "`. A selector value that itself
//! contains `", "` is read back as two values.

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;

use crate::domain::{
    ConfigurationError, Expression, Filter, FilterKey, Relationship, Requirement,
    RequirementSet, SetConfig, requirement::NodeRef,
};

static SET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:(\d+)\s+of\s+)?\[([^\[\]]*)\]\s*$").expect("this should never fail")
});

static SET_IN_TREE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\d+\s+of\s+)?\[[^\[\]]*\]").expect("this should never fail")
});

impl fmt::Display for RequirementSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} of [", self.quantity())?;
        for (i, (key, selectors)) in self.filter().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: ", key.label())?;
            for (j, selector) in selectors.iter().enumerate() {
                if j > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{selector}")?;
            }
        }
        f.write_str("]")
    }
}

impl fmt::Display for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(set) = self.as_set() {
            return write!(f, "{set}");
        }

        let relationship = self.relationship().unwrap_or(Relationship::And);
        f.write_str("{ ")?;
        for (i, child) in self.children().enumerate() {
            if i > 0 {
                write!(f, " {relationship} ")?;
            }
            write!(f, "{child}")?;
        }
        if self.child_count() > 0 {
            f.write_str(" ")?;
        }
        f.write_str("}")
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.view())
    }
}

impl FromStr for Expression {
    type Err = ConfigurationError;

    /// Parses a requirement set, or a single level of braces around sets.
    ///
    /// An empty pair of braces reads as an AND tree with no children.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        let Some(inner) = trimmed
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
        else {
            return parse_set(trimmed).map(Self::Set);
        };

        if inner.contains(['{', '}']) {
            return Err(ConfigurationError::Syntax(
                "nested requirement trees cannot be parsed".to_string(),
            ));
        }

        let mut relationship = None;
        let mut children = Vec::new();
        let mut end = 0;

        for block in SET_IN_TREE.find_iter(inner) {
            let gap = inner[end..block.start()].trim();
            if children.is_empty() {
                if !gap.is_empty() {
                    return Err(unexpected(gap));
                }
            } else {
                let word: Relationship = gap.parse().map_err(|_| unexpected(gap))?;
                if relationship.is_some_and(|seen| seen != word) {
                    return Err(ConfigurationError::Syntax(
                        "mixed relationships at one level".to_string(),
                    ));
                }
                relationship = Some(word);
            }

            children.push(Self::Set(parse_set(block.as_str())?));
            end = block.end();
        }

        let rest = inner[end..].trim();
        if !rest.is_empty() {
            return Err(unexpected(rest));
        }

        Ok(Self::Tree {
            relationship: relationship.unwrap_or(Relationship::And),
            children,
        })
    }
}

fn unexpected(text: &str) -> ConfigurationError {
    ConfigurationError::Syntax(format!("unexpected '{text}'"))
}

/// Parses `<k> of [<Label>: value, value, <Label>: value]`.
///
/// Values are split on `", "`. A piece beginning with a known label starts a
/// new category; any other piece continues the current one.
fn parse_set(text: &str) -> Result<SetConfig, ConfigurationError> {
    let captures = SET
        .captures(text)
        .ok_or_else(|| ConfigurationError::Syntax(format!("not a requirement set: '{text}'")))?;

    let quantity = captures
        .get(1)
        .map(|quantity| {
            quantity
                .as_str()
                .parse::<usize>()
                .map_err(|_| ConfigurationError::InvalidQuantity(quantity.as_str().to_string()))
        })
        .transpose()?;

    let body = captures.get(2).map_or("", |body| body.as_str()).trim();
    let mut filter = Filter::new();
    let mut current: Option<FilterKey> = None;

    if !body.is_empty() {
        for piece in body.split(", ") {
            let (key, value) = match labelled(piece) {
                Some((key, value)) => (key, value),
                None => {
                    let key = current.ok_or_else(|| {
                        ConfigurationError::Syntax(format!("value '{piece}' has no label"))
                    })?;
                    (key, piece)
                }
            };
            current = Some(key);
            filter = filter.with(key, [value.trim()])?;
        }
    }

    Ok(SetConfig::new(filter, quantity))
}

fn labelled(piece: &str) -> Option<(FilterKey, &str)> {
    let (label, value) = piece.split_once(": ")?;
    FilterKey::from_label(label.trim()).map(|key| (key, value))
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::storage::{Catalogue, catalogue::tests::sample_catalogue};

    fn set(codes: &[&str]) -> RequirementSet {
        SetConfig::coursecodes(codes.iter().copied())
            .unwrap()
            .resolve(&Catalogue::default())
            .unwrap()
    }

    #[test]
    fn set_lists_only_configured_categories() {
        let config = SetConfig::new(
            Filter::new()
                .with(FilterKey::Search, ["MATdddd"])
                .unwrap()
                .with(FilterKey::Faculty, ["mn"])
                .unwrap()
                .with(FilterKey::Coursecode, ["-MAT1110"])
                .unwrap(),
            Some(2),
        );
        let resolved = config.resolve(&sample_catalogue()).unwrap();
        assert_eq!(
            resolved.to_string(),
            "2 of [Faculty: mn, Coursecode: -MAT1110, Regexp requirement: MATdddd]"
        );
    }

    #[test]
    fn empty_set_renders_without_categories() {
        assert_eq!(RequirementSet::empty().to_string(), "0 of []");
    }

    #[test]
    fn tree_renders_recursively() {
        let inner = set(&["B"]).or_with(set(&["C"]));
        let tree = set(&["A"]).scale(1).unwrap().and_with(inner);
        assert_eq!(
            tree.to_string(),
            "{ 1 of [Coursecode: A] and { 1 of [Coursecode: B] or 1 of [Coursecode: C] } }"
        );
    }

    #[test]
    fn empty_tree_renders_as_braces() {
        assert_eq!(Requirement::or_of(Vec::new()).to_string(), "{ }");
    }

    #[test_case(
        SetConfig::new(Filter::new().with(FilterKey::Institute, ["stk", "ifi"]).unwrap(), None);
        "institutes"
    )]
    #[test_case(
        SetConfig::new(
            Filter::new()
                .with(FilterKey::Faculty, ["mn"])
                .unwrap()
                .with(FilterKey::Search, ["-STK...."])
                .unwrap(),
            Some(3),
        );
        "faculty minus search"
    )]
    #[test_case(
        SetConfig::new(Filter::new().with(FilterKey::Coursecode, ["FIL1000", "FIL2000"]).unwrap(), Some(1));
        "codes"
    )]
    fn labelled_sets_round_trip(config: SetConfig) {
        let catalogue = sample_catalogue();
        let original = config.resolve(&catalogue).unwrap();

        let parsed: Expression = original.to_string().parse().unwrap();
        let reparsed = parsed.resolve(&catalogue).unwrap();

        assert_eq!(reparsed.courses(), original.atoms());
        assert_eq!(reparsed, Requirement::from(original));
    }

    #[test]
    fn missing_quantity_means_all() {
        let parsed: Expression = "[Coursecode: MAT1100, MAT1110]".parse().unwrap();
        let Expression::Set(config) = parsed else {
            panic!("expected a set");
        };
        assert_eq!(config.quantity(), None);
        assert_eq!(config.filter().selectors(FilterKey::Coursecode).unwrap().len(), 2);
    }

    #[test]
    fn single_level_tree_round_trips() {
        let catalogue = sample_catalogue();
        let tree = set(&["MAT1100"]).or_with(set(&["STK1100", "STK1110"]).scale(1).unwrap());

        let parsed: Expression = tree.to_string().parse().unwrap();
        assert_eq!(parsed.resolve(&catalogue).unwrap(), tree);
    }

    #[test]
    fn values_containing_the_separator_are_split() {
        let config = SetConfig::new(
            Filter::new()
                .with(FilterKey::Faculty, ["mn, hf"])
                .unwrap(),
            None,
        );
        let rendered = config
            .resolve(&sample_catalogue())
            .unwrap()
            .to_string();
        assert_eq!(rendered, "0 of [Faculty: mn, hf]");

        let Ok(Expression::Set(parsed)) = rendered.parse::<Expression>() else {
            panic!("expected a set");
        };
        let values: Vec<&str> = parsed
            .filter()
            .selectors(FilterKey::Faculty)
            .unwrap()
            .iter()
            .map(crate::domain::filter::Selector::value)
            .collect();
        assert_eq!(values, ["mn", "hf"]);
    }

    #[test]
    fn empty_braces_parse_as_empty_tree() {
        let parsed: Expression = "{ }".parse().unwrap();
        assert_eq!(
            parsed,
            Expression::Tree {
                relationship: Relationship::And,
                children: Vec::new()
            }
        );
    }

    #[test_case("{ [Coursecode: A] and { [Coursecode: B] or [Coursecode: C] } }"; "nested tree")]
    #[test_case("{ [Coursecode: A] and [Coursecode: B] or [Coursecode: C] }"; "mixed relationships")]
    #[test_case("{ [Coursecode: A] xor [Coursecode: B] }"; "unknown relationship")]
    #[test_case("{ [Coursecode: A] [Coursecode: B] }"; "missing relationship")]
    #[test_case("two of [Coursecode: A]"; "word quantity")]
    #[test_case("1 of [MAT1100]"; "unlabelled value")]
    #[test_case("1 of [Department: mn]"; "unknown label")]
    #[test_case("MAT1100"; "bare code")]
    fn malformed_text_is_rejected(text: &str) {
        assert!(text.parse::<Expression>().is_err());
    }
}
