//! The course catalogue: every known course and its prerequisites.
//!
//! The catalogue is a read-only table loaded once from a JSON or YAML file.
//! Its row order is the order the filter resolution reports courses in.

use std::{
    collections::HashMap,
    fmt, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::{Atom, Relationship, Requirement, RequirementSet, UnknownAtomError};

/// One element of a nested prerequisite list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NestedItem {
    /// A course that must be taken.
    Course(Atom),
    /// Courses that are interchangeable: any one of them will do.
    Interchangeable(Vec<Atom>),
}

impl NestedItem {
    /// The courses this element mentions.
    #[must_use]
    pub fn courses(&self) -> &[Atom] {
        match self {
            Self::Course(course) => std::slice::from_ref(course),
            Self::Interchangeable(courses) => courses,
        }
    }

    /// Whether this element mentions the course.
    #[must_use]
    pub fn mentions(&self, code: &str) -> bool {
        self.courses().iter().any(|course| course == code)
    }
}

/// Which of a course's prerequisite lists to consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrerequisiteKind {
    /// Prerequisites that must be fulfilled before taking the course.
    Obligatory,
    /// Prerequisites that are recommended but not enforced.
    Recommended,
}

impl fmt::Display for PrerequisiteKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Obligatory => f.write_str("obligatory"),
            Self::Recommended => f.write_str("recommended"),
        }
    }
}

/// A row of the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueEntry {
    coursecode: Atom,
    #[serde(default)]
    coursename: String,
    #[serde(default)]
    faculty: String,
    #[serde(default)]
    institute: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    obligatory: Vec<NestedItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    recommended: Vec<NestedItem>,
}

impl CatalogueEntry {
    /// Creates a row with no prerequisites.
    #[must_use]
    pub fn new(
        coursecode: Atom,
        coursename: impl Into<String>,
        faculty: impl Into<String>,
        institute: impl Into<String>,
    ) -> Self {
        Self {
            coursecode,
            coursename: coursename.into(),
            faculty: faculty.into(),
            institute: institute.into(),
            obligatory: Vec::new(),
            recommended: Vec::new(),
        }
    }

    /// Sets the obligatory prerequisites.
    #[must_use]
    pub fn with_obligatory(mut self, items: Vec<NestedItem>) -> Self {
        self.obligatory = items;
        self
    }

    /// Sets the recommended prerequisites.
    #[must_use]
    pub fn with_recommended(mut self, items: Vec<NestedItem>) -> Self {
        self.recommended = items;
        self
    }

    /// The course code.
    #[must_use]
    pub const fn coursecode(&self) -> &Atom {
        &self.coursecode
    }

    /// The course name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.coursename
    }

    /// The faculty offering the course.
    #[must_use]
    pub fn faculty(&self) -> &str {
        &self.faculty
    }

    /// The institute offering the course.
    #[must_use]
    pub fn institute(&self) -> &str {
        &self.institute
    }

    /// The obligatory prerequisites, in the nested-list format.
    #[must_use]
    pub fn obligatory(&self) -> &[NestedItem] {
        &self.obligatory
    }

    /// The recommended prerequisites, in the nested-list format.
    #[must_use]
    pub fn recommended(&self) -> &[NestedItem] {
        &self.recommended
    }

    /// The prerequisite list of the given kind.
    #[must_use]
    pub fn prerequisites(&self, kind: PrerequisiteKind) -> &[NestedItem] {
        match kind {
            PrerequisiteKind::Obligatory => &self.obligatory,
            PrerequisiteKind::Recommended => &self.recommended,
        }
    }
}

/// Errors raised while loading a catalogue.
#[derive(Debug, thiserror::Error)]
pub enum CatalogueError {
    /// The catalogue file could not be read.
    #[error("failed to read catalogue {}", .path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The catalogue was not valid JSON, or the rows were malformed.
    #[error("failed to parse JSON catalogue: {0}")]
    Json(#[from] serde_json::Error),

    /// The catalogue was not valid YAML, or the rows were malformed.
    #[error("failed to parse YAML catalogue: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The file extension did not name a supported format.
    #[error("unsupported catalogue format {}: expected .json, .yaml or .yml", .0.display())]
    UnsupportedFormat(PathBuf),

    /// The same course code appears in more than one row.
    #[error("course {0} appears more than once in the catalogue")]
    DuplicateCourse(Atom),
}

/// A course which lists another course among its prerequisites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Lead<'a> {
    /// The course that has the prerequisite.
    pub course: &'a CatalogueEntry,
    /// Which list mentions the prerequisite.
    pub kind: PrerequisiteKind,
}

/// All known courses, in catalogue order.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    entries: Vec<CatalogueEntry>,
    index: HashMap<String, usize>,
}

impl Catalogue {
    /// Builds a catalogue from its rows.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError::DuplicateCourse`] if two rows share a course
    /// code.
    pub fn from_entries(
        entries: impl IntoIterator<Item = CatalogueEntry>,
    ) -> Result<Self, CatalogueError> {
        let entries: Vec<CatalogueEntry> = entries.into_iter().collect();
        let mut index = HashMap::with_capacity(entries.len());

        for (position, entry) in entries.iter().enumerate() {
            if index
                .insert(entry.coursecode.to_string(), position)
                .is_some()
            {
                return Err(CatalogueError::DuplicateCourse(entry.coursecode.clone()));
            }
        }

        Ok(Self { entries, index })
    }

    /// Loads a catalogue from a `.json`, `.yaml` or `.yml` file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, the extension is
    /// not supported, or a course code is repeated.
    #[instrument(level = "debug")]
    pub fn load(path: &Path) -> Result<Self, CatalogueError> {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);

        let read = || {
            std::fs::read_to_string(path).map_err(|source| CatalogueError::Io {
                path: path.to_path_buf(),
                source,
            })
        };

        let entries: Vec<CatalogueEntry> = match extension.as_deref() {
            Some("json") => serde_json::from_str(&read()?)?,
            Some("yaml" | "yml") => serde_yaml::from_str(&read()?)?,
            _ => return Err(CatalogueError::UnsupportedFormat(path.to_path_buf())),
        };

        let catalogue = Self::from_entries(entries)?;
        debug!(courses = catalogue.len(), "loaded catalogue");
        Ok(catalogue)
    }

    /// Looks a course up by its code.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&CatalogueEntry> {
        self.index.get(code).map(|&position| &self.entries[position])
    }

    /// Whether the course is in the catalogue.
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    /// Iterates over the rows in catalogue order.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogueEntry> {
        self.entries.iter()
    }

    /// The number of courses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalogue has no courses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A course's prerequisites of the given kind, as a requirement.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownAtomError`] if the course is not in the catalogue.
    pub fn prerequisites(
        &self,
        code: &Atom,
        kind: PrerequisiteKind,
    ) -> Result<Requirement, UnknownAtomError> {
        let entry = self.entry(code)?;
        Ok(Requirement::from_nested_list(
            entry.prerequisites(kind),
            Relationship::And,
        ))
    }

    /// Every course listing `code` among its prerequisites, in catalogue
    /// order.
    ///
    /// A course mentioning `code` in both of its lists is reported once, as
    /// obligatory.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownAtomError`] if the course is not in the catalogue.
    pub fn leads_to(&self, code: &Atom) -> Result<Vec<Lead<'_>>, UnknownAtomError> {
        self.entry(code)?;

        let mentions = |items: &[NestedItem]| items.iter().any(|item| item.mentions(code));

        Ok(self
            .iter()
            .filter_map(|course| {
                let kind = if mentions(course.obligatory()) {
                    PrerequisiteKind::Obligatory
                } else if mentions(course.recommended()) {
                    PrerequisiteKind::Recommended
                } else {
                    return None;
                };
                Some(Lead { course, kind })
            })
            .collect())
    }

    /// Everything that must be taken before `code`, following obligatory
    /// prerequisites all the way down.
    ///
    /// Each prerequisite brings its own prerequisites along with it. For a
    /// group of interchangeable courses, the choice is between each course
    /// together with its own prerequisites. A course already being expanded
    /// further up is not expanded again, so cycles in the catalogue end the
    /// walk instead of looping.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownAtomError`] if the course is not in the catalogue.
    #[instrument(level = "debug", skip(self), fields(course = %code))]
    pub fn prerequisite_closure(&self, code: &Atom) -> Result<Requirement, UnknownAtomError> {
        self.entry(code)?;

        let mut path = vec![code.clone()];
        Ok(self.expand(code, &mut path).simplified())
    }

    fn expand(&self, code: &Atom, path: &mut Vec<Atom>) -> Requirement {
        let Some(entry) = self.get(code) else {
            return Requirement::and_of(Vec::new());
        };

        let mut parts = Vec::new();
        for item in entry.obligatory() {
            let mut branches = Vec::new();
            for course in item.courses() {
                if path.contains(course) {
                    continue;
                }
                path.push(course.clone());
                let below = self.expand(course, path);
                path.pop();
                branches.push(Requirement::and_of([
                    RequirementSet::from_atoms([course.clone()]).into(),
                    below,
                ]));
            }

            match item {
                NestedItem::Course(_) => parts.extend(branches),
                NestedItem::Interchangeable(_) if branches.is_empty() => {}
                NestedItem::Interchangeable(_) => parts.push(Requirement::or_of(branches)),
            }
        }

        Requirement::and_of(parts)
    }

    fn entry(&self, code: &Atom) -> Result<&CatalogueEntry, UnknownAtomError> {
        self.get(code).ok_or_else(|| UnknownAtomError(code.clone()))
    }
}

impl<'a> IntoIterator for &'a Catalogue {
    type Item = &'a CatalogueEntry;
    type IntoIter = std::slice::Iter<'a, CatalogueEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
