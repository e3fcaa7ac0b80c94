//! Filter criteria and their resolution against a catalogue.
//!
//! A [`Filter`] selects courses by faculty, institute, literal course code, or
//! search pattern. Every selector adds to the selection unless it starts with
//! [`EXCLUSION_MARKER`], in which case it subtracts. The resolved list is the
//! de-duplicated union of all inclusions, in first-seen order, minus the union
//! of all exclusions.

use std::{
    collections::{BTreeMap, HashSet},
    fmt,
    str::FromStr,
};

use regex::Regex;
use tracing::instrument;

use crate::{
    domain::{Atom, ConfigurationError},
    storage::Catalogue,
};

/// Leading character that turns a selector into an exclusion.
pub const EXCLUSION_MARKER: char = '-';

/// The categories a filter can select courses by.
///
/// The declaration order is the order categories are resolved and rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterKey {
    /// Every catalogue course belonging to a faculty.
    Faculty,
    /// Every catalogue course belonging to an institute.
    Institute,
    /// A literal course code. The code need not exist in the catalogue.
    Coursecode,
    /// A restricted search pattern matched against every catalogue course
    /// code.
    Search,
}

impl FilterKey {
    /// All keys, in resolution order.
    pub const ALL: [Self; 4] = [Self::Faculty, Self::Institute, Self::Coursecode, Self::Search];

    /// The key as it is spelled in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Faculty => "faculty",
            Self::Institute => "institute",
            Self::Coursecode => "coursecode",
            Self::Search => "search",
        }
    }

    /// The label used for this key in the text form of a requirement set.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Faculty => "Faculty",
            Self::Institute => "Institute",
            Self::Coursecode => "Coursecode",
            Self::Search => "Regexp requirement",
        }
    }

    /// Looks a key up by its text label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.label() == label)
    }

    fn matching(
        self,
        value: &str,
        catalogue: &Catalogue,
    ) -> Result<Vec<Atom>, ConfigurationError> {
        let atoms = match self {
            Self::Faculty => catalogue
                .iter()
                .filter(|entry| entry.faculty() == value)
                .map(|entry| entry.coursecode().clone())
                .collect(),
            Self::Institute => catalogue
                .iter()
                .filter(|entry| entry.institute() == value)
                .map(|entry| entry.coursecode().clone())
                .collect(),
            Self::Coursecode => vec![Atom::new(value.to_string())?],
            Self::Search => {
                let pattern = search_pattern(value)?;
                catalogue
                    .iter()
                    .filter(|entry| pattern.is_match(entry.coursecode()))
                    .map(|entry| entry.coursecode().clone())
                    .collect()
            }
        };
        Ok(atoms)
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKey {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ConfigurationError::UnknownFilterKey(s.to_string()))
    }
}

/// A single filter value, either adding to or subtracting from the selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    value: String,
    excluding: bool,
}

impl Selector {
    fn parse(key: FilterKey, raw: String) -> Result<Self, ConfigurationError> {
        let (value, excluding) = match raw.strip_prefix(EXCLUSION_MARKER) {
            Some(rest) => (rest.to_string(), true),
            None => (raw, false),
        };

        if value.is_empty() {
            return Err(ConfigurationError::EmptySelector {
                key: key.to_string(),
            });
        }

        // validate eagerly, so resolution never fails on a bad selector
        match key {
            FilterKey::Coursecode => {
                Atom::new(value.clone())?;
            }
            FilterKey::Search => {
                search_pattern(&value)?;
            }
            FilterKey::Faculty | FilterKey::Institute => {}
        }

        Ok(Self { value, excluding })
    }

    /// The selector value, without the exclusion marker.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether this selector subtracts from the selection.
    #[must_use]
    pub const fn is_excluding(&self) -> bool {
        self.excluding
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.excluding {
            write!(f, "{EXCLUSION_MARKER}{}", self.value)
        } else {
            f.write_str(&self.value)
        }
    }
}

/// Criteria selecting a set of courses.
///
/// Only the keys that were actually supplied are remembered, so that the text
/// form of a requirement set shows exactly the criteria it was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    selectors: BTreeMap<FilterKey, Vec<Selector>>,
}

impl Filter {
    /// Creates a filter that selects nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter from literal course codes.
    ///
    /// # Errors
    ///
    /// Returns an error if any code is empty or not a valid course code.
    pub fn coursecodes<I, S>(codes: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new().with(FilterKey::Coursecode, codes)
    }

    /// A literal filter for already-validated courses, used for derived sets.
    pub(crate) fn from_atoms(atoms: &[Atom]) -> Self {
        let mut filter = Self::new();
        if !atoms.is_empty() {
            let selectors = atoms
                .iter()
                .map(|atom| Selector {
                    value: atom.to_string(),
                    excluding: false,
                })
                .collect();
            filter.selectors.insert(FilterKey::Coursecode, selectors);
        }
        filter
    }

    /// Adds selectors under the given key.
    ///
    /// Supplying the same key twice appends to the existing selectors.
    ///
    /// # Errors
    ///
    /// Returns an error if a selector is empty, a course code is invalid, or a
    /// search pattern does not compile.
    pub fn with<I, S>(mut self, key: FilterKey, selectors: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parsed = selectors
            .into_iter()
            .map(|raw| Selector::parse(key, raw.into()))
            .collect::<Result<Vec<_>, _>>()?;
        self.selectors.entry(key).or_default().extend(parsed);
        Ok(self)
    }

    /// Adds selectors under a key given by name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownFilterKey`] for an unrecognised
    /// key, and otherwise fails as [`Filter::with`] does.
    pub fn with_key<I, S>(self, key: &str, selectors: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(key.parse()?, selectors)
    }

    /// The selectors supplied under `key`, if the key was supplied at all.
    #[must_use]
    pub fn selectors(&self, key: FilterKey) -> Option<&[Selector]> {
        self.selectors.get(&key).map(Vec::as_slice)
    }

    /// Iterates over the supplied keys and their selectors, in resolution
    /// order.
    pub fn iter(&self) -> impl Iterator<Item = (FilterKey, &[Selector])> {
        self.selectors
            .iter()
            .map(|(&key, selectors)| (key, selectors.as_slice()))
    }

    /// Whether no criteria were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Resolves the criteria against a catalogue into an ordered list of
    /// unique course codes.
    ///
    /// # Errors
    ///
    /// Returns an error if a selector cannot be evaluated. Selectors are
    /// validated when they are added, so this only fails for filters that were
    /// constructed inconsistently.
    #[instrument(level = "debug", skip(catalogue))]
    pub fn resolve(&self, catalogue: &Catalogue) -> Result<Vec<Atom>, ConfigurationError> {
        let mut included = Vec::new();
        let mut seen = HashSet::new();
        let mut excluded = HashSet::new();

        for (key, selectors) in self.iter() {
            for selector in selectors {
                let matches = key.matching(selector.value(), catalogue)?;
                if selector.is_excluding() {
                    excluded.extend(matches);
                } else {
                    for atom in matches {
                        if seen.insert(atom.clone()) {
                            included.push(atom);
                        }
                    }
                }
            }
        }

        included.retain(|atom| !excluded.contains(atom));
        tracing::trace!(count = included.len(), "resolved filter");
        Ok(included)
    }
}

/// Compiles a search selector.
///
/// Every character matches literally, except that `.` matches any single
/// character and every lowercase ASCII letter is escaped, so that `d` stands
/// for any digit (and `w`, `s` for their usual classes).
fn search_pattern(selector: &str) -> Result<Regex, ConfigurationError> {
    let mut pattern = String::with_capacity(selector.len() * 2);
    for c in selector.chars() {
        match c {
            '.' => pattern.push('.'),
            c if c.is_ascii_lowercase() => {
                pattern.push('\\');
                pattern.push(c);
            }
            c => pattern.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }

    Regex::new(&pattern).map_err(|source| ConfigurationError::InvalidPattern {
        pattern: selector.to_string(),
        source: Box::new(source),
    })
}
