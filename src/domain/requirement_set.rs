//! The leaf of a requirement: a list of courses and how many of them are
//! needed.
//!
//! Construction is two-phase. A [`SetConfig`] holds the filter criteria and an
//! optional quantity; [`SetConfig::resolve`] evaluates it against a catalogue
//! and produces an immutable [`RequirementSet`] whose courses and quantity are
//! fixed.

use std::hash::{Hash, Hasher};

use serde_json::Value;
use tracing::instrument;

use crate::{
    domain::{
        Atom, ConfigurationError, Filter, FilterKey, Requirement,
        combination::{self, Combination, KSubsets},
        requirement::NodeRef,
    },
    storage::Catalogue,
};

/// Unresolved configuration of a [`RequirementSet`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetConfig {
    filter: Filter,
    quantity: Option<usize>,
}

impl SetConfig {
    /// Creates a configuration from filter criteria and an optional quantity.
    ///
    /// An unset quantity means every selected course is required.
    #[must_use]
    pub const fn new(filter: Filter, quantity: Option<usize>) -> Self {
        Self { filter, quantity }
    }

    /// Creates a configuration selecting literal course codes, all required.
    ///
    /// # Errors
    ///
    /// Returns an error if any code is not a valid course code.
    pub fn coursecodes<I, S>(codes: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self::new(Filter::coursecodes(codes)?, None))
    }

    /// Sets the quantity.
    #[must_use]
    pub const fn with_quantity(mut self, quantity: usize) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Builds a configuration from a JSON object such as
    /// `{"faculty": ["mn"], "search": ["-MAT1..."], "quantity": 2}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an object, a key is not a filter
    /// key or `quantity`, a filter value is not a list of strings, or the
    /// quantity is neither a non-negative integer nor `null`.
    pub fn from_value(value: &Value) -> Result<Self, ConfigurationError> {
        let Value::Object(map) = value else {
            return Err(ConfigurationError::NotARequirement(
                json_kind(value).to_string(),
            ));
        };

        let mut filter = Filter::new();
        let mut quantity = None;

        for (key, value) in map {
            if key == "quantity" {
                quantity = parse_quantity(value)?;
                continue;
            }

            let key: FilterKey = key.parse()?;
            let not_a_list = || ConfigurationError::NotAStringList {
                key: key.to_string(),
                found: json_kind(value).to_string(),
            };

            let Value::Array(items) = value else {
                return Err(not_a_list());
            };
            let selectors = items
                .iter()
                .map(|item| item.as_str().ok_or_else(not_a_list))
                .collect::<Result<Vec<_>, _>>()?;

            filter = filter.with(key, selectors)?;
        }

        Ok(Self::new(filter, quantity))
    }

    /// The filter criteria.
    #[must_use]
    pub const fn filter(&self) -> &Filter {
        &self.filter
    }

    /// The configured quantity, if any.
    #[must_use]
    pub const fn quantity(&self) -> Option<usize> {
        self.quantity
    }

    /// Resolves the filter criteria against a catalogue.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::QuantityExceedsAtoms`] if the configured
    /// quantity is larger than the number of courses selected.
    #[instrument(level = "debug", skip(catalogue))]
    pub fn resolve(&self, catalogue: &Catalogue) -> Result<RequirementSet, ConfigurationError> {
        let atoms = self.filter.resolve(catalogue)?;
        let quantity = self.quantity.unwrap_or(atoms.len());

        if quantity > atoms.len() {
            return Err(ConfigurationError::QuantityExceedsAtoms {
                quantity,
                atoms: atoms.len(),
            });
        }

        Ok(RequirementSet {
            filter: self.filter.clone(),
            atoms,
            quantity,
        })
    }
}

fn parse_quantity(value: &Value) -> Result<Option<usize>, ConfigurationError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => number
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| ConfigurationError::InvalidQuantity(number.to_string())),
        other => Err(ConfigurationError::InvalidQuantity(
            json_kind(other).to_string(),
        )),
    }
}

/// A short description of the kind of a JSON value, for error messages.
pub(crate) const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// A resolved list of courses along with how many of them must be taken.
///
/// Equality and hashing consider only the resolved courses and the quantity,
/// so two sets built from different criteria that select the same courses are
/// interchangeable.
#[derive(Debug, Clone)]
pub struct RequirementSet {
    filter: Filter,
    atoms: Vec<Atom>,
    quantity: usize,
}

impl RequirementSet {
    /// The canonical empty set: no criteria, nothing required.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            filter: Filter::new(),
            atoms: Vec::new(),
            quantity: 0,
        }
    }

    /// A set requiring every one of the given courses.
    ///
    /// Duplicates are dropped, keeping the first occurrence.
    #[must_use]
    pub fn from_atoms(atoms: impl IntoIterator<Item = Atom>) -> Self {
        let mut unique: Vec<Atom> = Vec::new();
        for atom in atoms {
            if !unique.contains(&atom) {
                unique.push(atom);
            }
        }

        Self {
            filter: Filter::from_atoms(&unique),
            quantity: unique.len(),
            atoms: unique,
        }
    }

    /// A set requiring any one of the given courses.
    pub(crate) fn one_of(atoms: impl IntoIterator<Item = Atom>) -> Self {
        let mut set = Self::from_atoms(atoms);
        set.quantity = set.quantity.min(1);
        set
    }

    /// The filter criteria this set was resolved from.
    #[must_use]
    pub const fn filter(&self) -> &Filter {
        &self.filter
    }

    /// The resolved courses, in catalogue or insertion order.
    #[must_use]
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// How many of the courses must be taken.
    #[must_use]
    pub const fn quantity(&self) -> usize {
        self.quantity
    }

    /// Whether nothing more is required.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.quantity == 0
    }

    /// Whether every course is required, leaving no choice.
    #[must_use]
    pub fn is_simple(&self) -> bool {
        self.quantity == self.atoms.len()
    }

    /// All ways of picking `quantity` of the courses, in lexicographic order.
    ///
    /// Each call starts a fresh enumeration.
    #[must_use]
    pub fn combinations(&self) -> KSubsets<'_, Atom> {
        KSubsets::new(&self.atoms, self.quantity)
    }

    /// The number of combinations, computed without enumerating them.
    #[must_use]
    pub fn combination_count(&self) -> usize {
        combination::binomial(self.atoms.len(), self.quantity)
    }

    /// Returns a copy of this set requiring `quantity` of its courses.
    ///
    /// Scaling to zero returns the canonical [`RequirementSet::empty`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::QuantityExceedsAtoms`] if `quantity` is
    /// larger than the number of courses.
    pub fn scale(&self, quantity: usize) -> Result<Self, ConfigurationError> {
        if quantity == 0 {
            return Ok(Self::empty());
        }
        if quantity > self.atoms.len() {
            return Err(ConfigurationError::QuantityExceedsAtoms {
                quantity,
                atoms: self.atoms.len(),
            });
        }
        Ok(Self {
            quantity,
            ..self.clone()
        })
    }

    /// Combines this set with another requirement under AND.
    #[must_use]
    pub fn and_with(self, other: impl Into<Requirement>) -> Requirement {
        Requirement::and_of([self.into(), other.into()])
    }

    /// Combines this set with another requirement under OR.
    #[must_use]
    pub fn or_with(self, other: impl Into<Requirement>) -> Requirement {
        Requirement::or_of([self.into(), other.into()])
    }

    /// Whether the course is among this set's courses, regardless of quantity.
    #[must_use]
    pub fn contains_atom(&self, atom: &Atom) -> bool {
        self.atoms.contains(atom)
    }

    /// Whether every course reachable from `other` is among this set's
    /// courses.
    #[must_use]
    pub fn contains(&self, other: &Requirement) -> bool {
        other
            .courses()
            .iter()
            .all(|atom| self.contains_atom(atom))
    }

    /// Whether fulfilling this set necessarily means `atom` has been taken.
    #[must_use]
    pub fn guarantees(&self, atom: &Atom) -> bool {
        self.contains_atom(atom) && self.is_simple()
    }

    /// Whether fulfilling this set necessarily fulfils `other`.
    ///
    /// This holds when every combination of this set is a superset of some
    /// combination of `other`.
    #[must_use]
    pub fn implies(&self, other: &Requirement) -> bool {
        self.implies_node(other.view())
    }

    pub(crate) fn implies_node(&self, other: NodeRef<'_>) -> bool {
        let theirs = other.combinations();
        self.combinations().all(|ours| {
            theirs
                .iter()
                .any(|their| their.iter().all(|atom| ours.contains(atom)))
        })
    }

    /// What is still owed on this set once everything `other` guarantees has
    /// been credited.
    ///
    /// Returns `None` when nothing remains.
    #[must_use]
    pub fn requirements_not_implied_by(&self, other: &Requirement) -> Option<Requirement> {
        self.residual(other.view())
    }

    pub(crate) fn residual(&self, other: NodeRef<'_>) -> Option<Requirement> {
        let theirs = other.combinations();
        let mut leftovers: Vec<Combination> = Vec::new();

        for their in &theirs {
            for ours in self.combinations() {
                let leftover: Combination = ours
                    .into_iter()
                    .filter(|atom| !their.contains(atom))
                    .collect();
                if leftover.is_empty() {
                    return None;
                }
                if !leftovers.contains(&leftover) {
                    leftovers.push(leftover);
                }
            }
        }

        match leftovers.len() {
            0 => Some(self.clone().into()),
            1 => leftovers
                .pop()
                .map(|leftover| Self::from_atoms(leftover).into()),
            _ => Some(
                Requirement::or_of(
                    leftovers
                        .into_iter()
                        .map(|leftover| Self::from_atoms(leftover).into()),
                )
                .simplified(),
            ),
        }
    }

    /// Credits a course as already taken: removes it and lowers the quantity
    /// by one.
    ///
    /// Returns `false`, changing nothing, if the course is not in this set.
    pub fn assume_taken(&mut self, atom: &Atom) -> bool {
        let Some(position) = self.atoms.iter().position(|a| a == atom) else {
            return false;
        };

        self.atoms.remove(position);
        self.quantity = self.quantity.saturating_sub(1);
        // the original criteria no longer describe this set
        self.filter = Filter::from_atoms(&self.atoms);
        true
    }
}

impl PartialEq for RequirementSet {
    fn eq(&self, other: &Self) -> bool {
        self.atoms == other.atoms && self.quantity == other.quantity
    }
}

impl Eq for RequirementSet {}

impl Hash for RequirementSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.atoms.hash(state);
        self.quantity.hash(state);
    }
}
