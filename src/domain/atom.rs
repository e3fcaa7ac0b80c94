use std::{fmt, hash::Hash, ops::Deref, str::FromStr};

use non_empty_string::NonEmptyString;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// A course identifier, such as `MAT1100`.
///
/// Atoms are opaque: they compare by equality only, and any ordering of atoms
/// comes from the catalogue or from the order they were supplied in, never
/// from sorting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom(NonEmptyString);

impl Atom {
    /// Creates a new `Atom` from a course code.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAtomError` if the code is empty or contains whitespace.
    pub fn new(code: String) -> Result<Self, InvalidAtomError> {
        let non_empty =
            NonEmptyString::new(code.clone()).map_err(|_| InvalidAtomError(code.clone()))?;

        if code.chars().any(char::is_whitespace) {
            return Err(InvalidAtomError(code));
        }

        Ok(Self(non_empty))
    }

    /// Returns the course code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Hash for Atom {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl TryFrom<String> for Atom {
    type Error = InvalidAtomError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Atom {
    type Error = InvalidAtomError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl FromStr for Atom {
    type Err = InvalidAtomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl AsRef<str> for Atom {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for Atom {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl PartialEq<str> for Atom {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Atom {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Atom {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Atom {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Self::new(code).map_err(de::Error::custom)
    }
}

/// Error returned when a string is not a usable course code.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid course code '{0}': must be non-empty and contain no whitespace")]
pub struct InvalidAtomError(String);

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use test_case::test_case;

    use super::*;

    #[test_case("MAT1100"; "plain code")]
    #[test_case("IN-KJM1900"; "code with dash")]
    #[test_case("x"; "single character")]
    fn valid_codes(code: &str) {
        let atom = Atom::try_from(code).unwrap();
        assert_eq!(atom.as_str(), code);
        assert_eq!(atom.to_string(), code);
    }

    #[test_case(""; "empty")]
    #[test_case("MAT 1100"; "inner space")]
    #[test_case(" MAT1100"; "leading space")]
    fn invalid_codes(code: &str) {
        assert_eq!(
            Atom::try_from(code),
            Err(InvalidAtomError(code.to_string()))
        );
    }

    #[test]
    fn equal_atoms_hash_equal() {
        let set: HashSet<Atom> = ["MAT1100", "MAT1100", "MAT1110"]
            .into_iter()
            .map(|code| Atom::try_from(code).unwrap())
            .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn compares_with_str() {
        let atom = Atom::try_from("STK1100").unwrap();
        assert_eq!(atom, "STK1100");
        assert!(atom != "STK1110");
    }

    #[test]
    fn serializes_as_plain_string() {
        let atom = Atom::try_from("FYS1000").unwrap();
        assert_eq!(serde_json::to_string(&atom).unwrap(), "\"FYS1000\"");
    }

    #[test]
    fn deserialization_validates() {
        let atom: Atom = serde_json::from_str("\"FYS1000\"").unwrap();
        assert_eq!(atom, "FYS1000");
        assert!(serde_json::from_str::<Atom>("\"FYS 1000\"").is_err());
    }
}
