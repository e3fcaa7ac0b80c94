//! Requirement trees: requirement sets joined by AND/OR.
//!
//! A [`Requirement`] owns an arena of nodes addressed by [`NodeId`]. Each node
//! is either a leaf [`RequirementSet`] or an internal node holding an ordered
//! list of child ids and a [`Relationship`]. Every node records the id of its
//! parent, and removing a child is an explicit operation on the parent's child
//! list, so there are no reference cycles.
//!
//! Read-only queries go through [`NodeRef`], a borrowed view of one node.
//! Combining requirements with [`Requirement::and_of`] or
//! [`Requirement::or_of`] copies each operand into the new arena, so a node is
//! only ever part of one tree.

use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use borsh::BorshSerialize;
use sha2::{Digest, Sha256};
use tracing::{trace, warn};

use crate::{
    domain::{
        Atom, ConfigurationError, RequirementSet, UnknownAtomError,
        combination::{self, Combination},
    },
    storage::{Catalogue, NestedItem},
};

/// How the children of a requirement tree combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, BorshSerialize)]
pub enum Relationship {
    /// Every child must be fulfilled.
    And,
    /// At least one child must be fulfilled.
    Or,
}

impl Relationship {
    /// The relationship as it is spelled in text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relationship {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "and" => Ok(Self::And),
            "or" => Ok(Self::Or),
            _ => Err(ConfigurationError::InvalidRelationship(s.to_string())),
        }
    }
}

/// Index of a node within a [`Requirement`]'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub(crate) enum Node {
    Leaf(RequirementSet),
    Tree {
        relationship: Relationship,
        children: Vec<NodeId>,
    },
}

#[derive(Debug, Clone)]
struct Slot {
    node: Node,
    parent: Option<NodeId>,
}

/// A requirement expression: a single requirement set, or a tree of them.
///
/// Equality and hashing are structural, derived from the
/// [fingerprint](Self::fingerprint).
#[derive(Debug, Clone)]
pub struct Requirement {
    slots: Vec<Option<Slot>>,
    root: NodeId,
}

impl Requirement {
    /// Creates a tree joining the given requirements under `relationship`.
    ///
    /// The children keep the order they are given in.
    #[must_use]
    pub fn tree(
        relationship: Relationship,
        children: impl IntoIterator<Item = Self>,
    ) -> Self {
        let mut requirement = Self {
            slots: Vec::new(),
            root: NodeId(0),
        };
        let root = requirement.alloc(
            Node::Tree {
                relationship,
                children: Vec::new(),
            },
            None,
        );
        for child in children {
            let id = requirement.graft(child.view(), Some(root));
            requirement.children_mut(root).push(id);
        }
        requirement
    }

    /// Creates a tree requiring every one of `children`.
    #[must_use]
    pub fn and_of(children: impl IntoIterator<Item = Self>) -> Self {
        Self::tree(Relationship::And, children)
    }

    /// Creates a tree requiring at least one of `children`.
    #[must_use]
    pub fn or_of(children: impl IntoIterator<Item = Self>) -> Self {
        Self::tree(Relationship::Or, children)
    }

    /// Builds a tree from the nested-list wire format.
    ///
    /// Every sub-list becomes a set requiring one of its courses. All
    /// top-level single courses are gathered into one set requiring all of
    /// them, placed after the sub-lists. Everything is joined under
    /// `relationship`.
    #[must_use]
    pub fn from_nested_list(items: &[NestedItem], relationship: Relationship) -> Self {
        let mut singles = Vec::new();
        let mut children = Vec::new();

        for item in items {
            match item {
                NestedItem::Course(course) => singles.push(course.clone()),
                NestedItem::Interchangeable(courses) if courses.is_empty() => {
                    warn!("skipping empty group of interchangeable courses");
                }
                NestedItem::Interchangeable(courses) => {
                    children.push(RequirementSet::one_of(courses.iter().cloned()).into());
                }
            }
        }

        if !singles.is_empty() {
            children.push(RequirementSet::from_atoms(singles).into());
        }

        Self::tree(relationship, children)
    }

    /// The id of the root node.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// A view of the root node.
    #[must_use]
    pub const fn view(&self) -> NodeRef<'_> {
        NodeRef {
            owner: self,
            id: self.root,
        }
    }

    /// A view of the node with the given id, if it is still part of the tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.slots
            .get(id.0)
            .and_then(Option::as_ref)
            .map(|_| NodeRef { owner: self, id })
    }

    /// The root as a requirement set, if the root is a leaf.
    #[must_use]
    pub fn as_set(&self) -> Option<&RequirementSet> {
        self.view().as_set()
    }

    /// The root relationship, if the root is a tree.
    #[must_use]
    pub fn relationship(&self) -> Option<Relationship> {
        self.view().relationship()
    }

    /// Every course mentioned anywhere in the requirement, de-duplicated in
    /// first-seen order.
    #[must_use]
    pub fn courses(&self) -> Vec<Atom> {
        self.view().courses()
    }

    /// Every concrete way to fulfil the requirement.
    #[must_use]
    pub fn combinations(&self) -> Vec<Combination> {
        self.view().combinations()
    }

    /// The number of combinations, computed without enumerating them.
    #[must_use]
    pub fn combination_count(&self) -> usize {
        self.view().combination_count()
    }

    /// Whether every course mentioned is required, leaving no choice.
    #[must_use]
    pub fn is_simple(&self) -> bool {
        self.view().is_simple()
    }

    /// Whether nothing is required any more.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.view().is_empty()
    }

    /// Whether the course appears anywhere in the requirement.
    #[must_use]
    pub fn contains_atom(&self, atom: &Atom) -> bool {
        self.view().contains_atom(atom)
    }

    /// Whether every course of `other` appears in this requirement.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.view().contains(other.view())
    }

    /// Whether fulfilling this requirement necessarily fulfils `other`.
    #[must_use]
    pub fn implies(&self, other: &Self) -> bool {
        self.view().implies(other.view())
    }

    /// Whether fulfilling this requirement necessarily means `atom` has been
    /// taken.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownAtomError`] if the course is not in the catalogue.
    pub fn implies_atom(
        &self,
        atom: &Atom,
        catalogue: &Catalogue,
    ) -> Result<bool, UnknownAtomError> {
        if !catalogue.contains(atom) {
            return Err(UnknownAtomError(atom.clone()));
        }

        Ok(match self.as_set() {
            Some(set) => set.guarantees(atom),
            None => self.implies(&RequirementSet::from_atoms([atom.clone()]).into()),
        })
    }

    /// What is still owed once everything `other` guarantees has been
    /// credited, or `None` if nothing remains.
    #[must_use]
    pub fn requirements_not_implied_by(&self, other: &Self) -> Option<Self> {
        self.view().residual(other.view())
    }

    /// Credits a course as already taken everywhere in the requirement.
    ///
    /// Sets containing the course lose it and require one course fewer. Under
    /// AND, children left with nothing to require are dropped. Under OR, a
    /// child left with nothing to require fulfils the whole node, which is
    /// then cleared.
    pub fn assume_taken(&mut self, atom: &Atom) {
        let root = self.root;
        self.assume_taken_at(root, atom);
    }

    /// Removes `child` from the children of `parent`, along with everything
    /// below it.
    ///
    /// Returns `false`, changing nothing, if `child` is not a child of
    /// `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.node(child).and_then(NodeRef::parent).map(|p| p.id) != Some(parent) {
            return false;
        }
        let Node::Tree { children, .. } = &mut self.slot_mut(parent).node else {
            return false;
        };
        let Some(position) = children.iter().position(|&id| id == child) else {
            return false;
        };
        children.remove(position);
        self.release(child);
        true
    }

    /// A hash of the structure of the requirement.
    ///
    /// Leaves hash their resolved courses and quantity; trees hash their
    /// relationship and their children's fingerprints, in order.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        self.view().fingerprint()
    }

    pub(crate) fn assume_taken_at(&mut self, id: NodeId, atom: &Atom) -> bool {
        let children = match &mut self.slot_mut(id).node {
            Node::Leaf(set) => return set.assume_taken(atom),
            Node::Tree { children, .. } => children.clone(),
        };

        let mut changed = false;
        for child in children {
            changed |= self.assume_taken_at(child, atom);
        }
        if changed {
            self.prune_empty_children(id);
        }
        changed
    }

    /// Drops children with nothing left to require.
    ///
    /// Under OR a single such child fulfils the node, so every child goes.
    pub(crate) fn prune_empty_children(&mut self, id: NodeId) -> bool {
        let Some((relationship, children)) = self.tree_parts(id) else {
            return false;
        };
        let empty: Vec<NodeId> = children
            .iter()
            .copied()
            .filter(|&child| self.view_at(child).is_empty())
            .collect();
        if empty.is_empty() {
            return false;
        }

        let doomed = match relationship {
            Relationship::And => empty,
            Relationship::Or => children,
        };
        trace!(count = doomed.len(), %relationship, "dropping fulfilled children");
        for child in doomed {
            self.remove_child(id, child);
        }
        true
    }

    pub(crate) fn view_at(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { owner: self, id }
    }

    pub(crate) fn tree_parts(&self, id: NodeId) -> Option<(Relationship, Vec<NodeId>)> {
        match &self.slot(id).node {
            Node::Tree {
                relationship,
                children,
            } => Some((*relationship, children.clone())),
            Node::Leaf(_) => None,
        }
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.slot_mut(id).node
    }

    /// Replaces the child `child` of `parent` with `grandchild`, a child of
    /// `child`, discarding `child` and its other descendants.
    pub(crate) fn splice(&mut self, parent: NodeId, child: NodeId, grandchild: NodeId) {
        if let Node::Tree { children, .. } = &mut self.slot_mut(child).node {
            children.retain(|&id| id != grandchild);
        }
        if let Node::Tree { children, .. } = &mut self.slot_mut(parent).node {
            for id in children.iter_mut().filter(|id| **id == child) {
                *id = grandchild;
            }
        }
        self.slot_mut(grandchild).parent = Some(parent);
        self.release(child);
    }

    /// Makes `child`, the only child of the root, the new root.
    pub(crate) fn promote(&mut self, child: NodeId) {
        let old_root = self.root;
        if let Node::Tree { children, .. } = &mut self.slot_mut(old_root).node {
            children.clear();
        }
        self.slot_mut(child).parent = None;
        self.root = child;
        self.release(old_root);
    }

    /// Replaces the node at `id` with a leaf, discarding its descendants.
    pub(crate) fn replace_with_leaf(&mut self, id: NodeId, set: RequirementSet) {
        let old = std::mem::replace(self.node_mut(id), Node::Leaf(set));
        if let Node::Tree { children, .. } = old {
            for child in children {
                self.release(child);
            }
        }
    }

    fn alloc(&mut self, node: Node, parent: Option<NodeId>) -> NodeId {
        self.slots.push(Some(Slot { node, parent }));
        NodeId(self.slots.len() - 1)
    }

    /// Copies the subtree under `source` into this arena.
    fn graft(&mut self, source: NodeRef<'_>, parent: Option<NodeId>) -> NodeId {
        match &source.slot().node {
            Node::Leaf(set) => self.alloc(Node::Leaf(set.clone()), parent),
            Node::Tree {
                relationship,
                children,
            } => {
                let id = self.alloc(
                    Node::Tree {
                        relationship: *relationship,
                        children: Vec::with_capacity(children.len()),
                    },
                    parent,
                );
                for &child in children {
                    let child = self.graft(source.at(child), Some(id));
                    self.children_mut(id).push(child);
                }
                id
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        if let Some(Slot {
            node: Node::Tree { children, .. },
            ..
        }) = self.slots[id.0].take()
        {
            for child in children {
                self.release(child);
            }
        }
    }

    fn children_mut(&mut self, id: NodeId) -> &mut Vec<NodeId> {
        match &mut self.slot_mut(id).node {
            Node::Tree { children, .. } => children,
            Node::Leaf(_) => unreachable!("leaves have no children"),
        }
    }

    fn slot(&self, id: NodeId) -> &Slot {
        self.slots[id.0]
            .as_ref()
            .expect("ids reachable from the root are always live")
    }

    fn slot_mut(&mut self, id: NodeId) -> &mut Slot {
        self.slots[id.0]
            .as_mut()
            .expect("ids reachable from the root are always live")
    }
}

impl From<RequirementSet> for Requirement {
    fn from(set: RequirementSet) -> Self {
        Self {
            slots: vec![Some(Slot {
                node: Node::Leaf(set),
                parent: None,
            })],
            root: NodeId(0),
        }
    }
}

impl PartialEq for Requirement {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint() == other.fingerprint()
    }
}

impl Eq for Requirement {}

impl Hash for Requirement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint().hash(state);
    }
}

/// A borrowed view of one node of a [`Requirement`].
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    owner: &'a Requirement,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    /// The id of this node.
    #[must_use]
    pub const fn id(self) -> NodeId {
        self.id
    }

    /// The parent of this node, or `None` for the root.
    #[must_use]
    pub fn parent(self) -> Option<Self> {
        self.slot().parent.map(|id| self.at(id))
    }

    /// The requirement set, if this node is a leaf.
    #[must_use]
    pub fn as_set(self) -> Option<&'a RequirementSet> {
        match &self.slot().node {
            Node::Leaf(set) => Some(set),
            Node::Tree { .. } => None,
        }
    }

    /// The relationship, if this node is a tree.
    #[must_use]
    pub fn relationship(self) -> Option<Relationship> {
        match &self.slot().node {
            Node::Tree { relationship, .. } => Some(*relationship),
            Node::Leaf(_) => None,
        }
    }

    /// The children of this node, in order. Leaves have none.
    pub fn children(self) -> impl Iterator<Item = Self> + 'a {
        let ids: &'a [NodeId] = match &self.slot().node {
            Node::Tree { children, .. } => children,
            Node::Leaf(_) => &[],
        };
        let owner = self.owner;
        ids.iter().map(move |&id| NodeRef { owner, id })
    }

    /// Copies the subtree under this node into a standalone requirement.
    #[must_use]
    pub fn to_requirement(self) -> Requirement {
        let mut requirement = Requirement {
            slots: Vec::new(),
            root: NodeId(0),
        };
        requirement.root = requirement.graft(self, None);
        requirement
    }

    /// Every course mentioned under this node, de-duplicated in first-seen
    /// order.
    #[must_use]
    pub fn courses(self) -> Vec<Atom> {
        match self.as_set() {
            Some(set) => set.atoms().to_vec(),
            None => {
                let mut courses = Vec::new();
                for atom in self.children().flat_map(Self::courses) {
                    if !courses.contains(&atom) {
                        courses.push(atom);
                    }
                }
                courses
            }
        }
    }

    /// Every concrete way to fulfil this node.
    ///
    /// An AND node takes one combination from each child and concatenates
    /// them; an OR node lists each child's combinations in turn. A tree with
    /// no children has the single empty combination.
    #[must_use]
    pub fn combinations(self) -> Vec<Combination> {
        if let Some(set) = self.as_set() {
            return set.combinations().collect();
        }

        let sequences: Vec<_> = self.children().map(Self::combinations).collect();
        match self.relationship() {
            Some(Relationship::Or) if !sequences.is_empty() => combination::chain(sequences),
            _ => combination::product(sequences),
        }
    }

    /// The number of combinations, computed without enumerating them.
    #[must_use]
    pub fn combination_count(self) -> usize {
        if let Some(set) = self.as_set() {
            return set.combination_count();
        }

        let counts = self.children().map(Self::combination_count);
        match self.relationship() {
            Some(Relationship::Or) if self.child_count() > 0 => combination::chain_count(counts),
            _ => combination::product_count(counts),
        }
    }

    /// Whether every course under this node is required, leaving no choice.
    ///
    /// An OR node is never simple.
    #[must_use]
    pub fn is_simple(self) -> bool {
        match self.relationship() {
            None => self.as_set().is_some_and(RequirementSet::is_simple),
            Some(Relationship::And) => self.children().all(Self::is_simple),
            Some(Relationship::Or) => false,
        }
    }

    /// Whether nothing is required under this node.
    #[must_use]
    pub fn is_empty(self) -> bool {
        match self.as_set() {
            Some(set) => set.is_empty(),
            None => self.child_count() == 0,
        }
    }

    /// Whether the course appears anywhere under this node.
    #[must_use]
    pub fn contains_atom(self, atom: &Atom) -> bool {
        match self.as_set() {
            Some(set) => set.contains_atom(atom),
            None => self.children().any(|child| child.contains_atom(atom)),
        }
    }

    /// Whether every course under `other` appears under this node.
    #[must_use]
    pub fn contains(self, other: NodeRef<'_>) -> bool {
        other.courses().iter().all(|atom| self.contains_atom(atom))
    }

    /// Whether fulfilling this node necessarily fulfils `other`.
    ///
    /// A leaf implies `other` when every one of its combinations covers some
    /// combination of `other`. A tree decomposes `other` first: it must imply
    /// every child of an AND and some child of an OR. Against a leaf, an AND
    /// tree needs one child, or the union of its fully required children, to
    /// imply it; an OR tree needs every child to imply it, since any branch
    /// might be the one taken.
    #[must_use]
    pub fn implies(self, other: NodeRef<'_>) -> bool {
        if let Some(set) = self.as_set() {
            return set.implies_node(other);
        }

        match other.relationship() {
            Some(_) if other.child_count() == 0 => true,
            Some(Relationship::And) => other.children().all(|child| self.implies(child)),
            Some(Relationship::Or) => other.children().any(|child| self.implies(child)),
            None if self.child_count() == 0 => RequirementSet::empty().implies_node(other),
            None => match self.relationship() {
                Some(Relationship::Or) => self.children().all(|child| child.implies(other)),
                _ => {
                    self.children().any(|child| child.implies(other))
                        || RequirementSet::from_atoms(self.guaranteed_atoms()).implies_node(other)
                }
            },
        }
    }

    /// Courses of the children that are required in full.
    fn guaranteed_atoms(self) -> Vec<Atom> {
        self.children()
            .filter(|child| child.is_simple())
            .flat_map(Self::courses)
            .collect()
    }

    pub(crate) fn residual(self, other: NodeRef<'_>) -> Option<Requirement> {
        if let Some(set) = self.as_set() {
            return set.residual(other);
        }
        if self.child_count() == 0 {
            return None;
        }

        let residuals: Vec<Option<Requirement>> =
            self.children().map(|child| child.residual(other)).collect();

        match self.relationship() {
            Some(Relationship::Or) => {
                if residuals.iter().any(Option::is_none) {
                    return None;
                }
                Some(Requirement::or_of(residuals.into_iter().flatten()).simplified())
            }
            _ => {
                let owed: Vec<Requirement> = residuals.into_iter().flatten().collect();
                if owed.is_empty() {
                    return None;
                }
                Some(Requirement::and_of(owed).simplified())
            }
        }
    }

    /// A hash of the structure under this node.
    #[must_use]
    pub fn fingerprint(self) -> String {
        #[derive(BorshSerialize)]
        enum FingerprintData<'a> {
            Leaf { atoms: Vec<&'a str>, quantity: usize },
            Tree {
                relationship: Relationship,
                children: Vec<String>,
            },
        }

        let data = match &self.slot().node {
            Node::Leaf(set) => FingerprintData::Leaf {
                atoms: set.atoms().iter().map(Atom::as_str).collect(),
                quantity: set.quantity(),
            },
            Node::Tree { relationship, .. } => FingerprintData::Tree {
                relationship: *relationship,
                children: self.children().map(Self::fingerprint).collect(),
            },
        };

        // encode using [borsh](https://borsh.io/)
        let encoded = borsh::to_vec(&data).expect("this should never fail");

        let hash = Sha256::digest(encoded);

        format!("{hash:x}")
    }

    pub(crate) fn child_count(self) -> usize {
        match &self.slot().node {
            Node::Tree { children, .. } => children.len(),
            Node::Leaf(_) => 0,
        }
    }

    const fn at(self, id: NodeId) -> Self {
        Self {
            owner: self.owner,
            id,
        }
    }

    fn slot(self) -> &'a Slot {
        self.owner.slot(self.id)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;
    use crate::{domain::SetConfig, storage::catalogue::tests::sample_catalogue};

    /// The courses random requirements are drawn from.
    pub(crate) const POOL: [&str; 5] = ["A", "B", "C", "D", "E"];

    fn arb_set() -> impl Strategy<Value = RequirementSet> {
        proptest::sample::subsequence(POOL.to_vec(), 1..=POOL.len())
            .prop_flat_map(|codes| {
                let len = codes.len();
                (Just(codes), 0..=len)
            })
            .prop_map(|(codes, quantity)| set(&codes).scale(quantity).unwrap())
    }

    /// Random AND/OR trees, a few levels deep, over [`POOL`].
    pub(crate) fn arb_requirement() -> impl Strategy<Value = Requirement> {
        arb_set()
            .prop_map(Requirement::from)
            .prop_recursive(3, 16, 3, |inner| {
                (any::<bool>(), prop::collection::vec(inner, 0..=3)).prop_map(
                    |(all, children)| {
                        let relationship = if all {
                            Relationship::And
                        } else {
                            Relationship::Or
                        };
                        Requirement::tree(relationship, children)
                    },
                )
            })
    }

    /// Every selection of courses from [`POOL`].
    pub(crate) fn every_selection() -> impl Iterator<Item = Vec<Atom>> {
        (0..1_u32 << POOL.len()).map(|mask| {
            POOL.iter()
                .enumerate()
                .filter(|&(i, _)| mask & (1 << i) != 0)
                .map(|(_, code)| atom(code))
                .collect()
        })
    }

    /// Whether having taken `taken` fulfils the node, evaluated directly on
    /// the tree rather than through its combinations.
    pub(crate) fn fulfilled_by(node: NodeRef<'_>, taken: &[Atom]) -> bool {
        if let Some(set) = node.as_set() {
            let held = set.atoms().iter().filter(|atom| taken.contains(atom)).count();
            return held >= set.quantity();
        }
        match node.relationship() {
            Some(Relationship::Or) if node.child_count() > 0 => {
                node.children().any(|child| fulfilled_by(child, taken))
            }
            _ => node.children().all(|child| fulfilled_by(child, taken)),
        }
    }

    proptest! {
        #[test]
        fn implication_holds_for_every_selection(a in arb_requirement(), b in arb_requirement()) {
            for candidate in [b.clone(), Requirement::or_of([a.clone(), b]), a.clone()] {
                if a.implies(&candidate) {
                    for taken in every_selection() {
                        prop_assert!(
                            !fulfilled_by(a.view(), &taken)
                                || fulfilled_by(candidate.view(), &taken)
                        );
                    }
                }
            }
        }

        #[test]
        fn taken_course_counts_towards_every_selection(
            tree in arb_requirement(),
            index in 0..POOL.len()
        ) {
            let course = atom(POOL[index]);
            let mut credited = tree.clone();
            credited.assume_taken(&course);

            for taken in every_selection() {
                let mut with_course = taken.clone();
                if !with_course.contains(&course) {
                    with_course.push(course.clone());
                }
                prop_assert_eq!(
                    fulfilled_by(credited.view(), &taken),
                    fulfilled_by(tree.view(), &with_course)
                );
            }
        }

        #[test]
        fn nothing_remains_exactly_when_fulfilled(tree in arb_requirement()) {
            for taken in every_selection() {
                let given: Requirement = RequirementSet::from_atoms(taken.clone()).into();
                prop_assert_eq!(
                    tree.requirements_not_implied_by(&given).is_none(),
                    fulfilled_by(tree.view(), &taken)
                );
            }
        }
    }

    fn atom(code: &str) -> Atom {
        Atom::try_from(code).unwrap()
    }

    fn set(codes: &[&str]) -> RequirementSet {
        SetConfig::coursecodes(codes.iter().copied())
            .unwrap()
            .resolve(&Catalogue::default())
            .unwrap()
    }

    fn req(codes: &[&str]) -> Requirement {
        set(codes).into()
    }

    fn choose(k: usize, codes: &[&str]) -> Requirement {
        set(codes).scale(k).unwrap().into()
    }

    fn codes(combinations: &[Combination]) -> Vec<Vec<&str>> {
        combinations
            .iter()
            .map(|c| c.iter().map(Atom::as_str).collect())
            .collect()
    }

    #[test]
    fn or_combinations_are_chained_without_merging() {
        let mat = set(&["MAT1100", "MAT1110", "MAT1120"]);
        let stk = choose(1, &["STK1100", "STK1110"]);
        let either = mat.scale(2).unwrap().or_with(stk);

        assert_eq!(
            codes(&either.combinations()),
            [
                vec!["MAT1100", "MAT1110"],
                vec!["MAT1100", "MAT1120"],
                vec!["MAT1110", "MAT1120"],
                vec!["STK1100"],
                vec!["STK1110"],
            ]
        );
        assert_eq!(either.combination_count(), 5);
    }

    #[test]
    fn and_combinations_are_flattened_products() {
        let mat = set(&["MAT1100", "MAT1110", "MAT1120"]);
        let stk = choose(1, &["STK1100", "STK1110"]);
        let both = mat.and_with(stk);

        assert_eq!(
            codes(&both.combinations()),
            [
                vec!["MAT1100", "MAT1110", "MAT1120", "STK1100"],
                vec!["MAT1100", "MAT1110", "MAT1120", "STK1110"],
            ]
        );
        assert_eq!(both.combination_count(), 2);
    }

    #[test]
    fn combination_counts_multiply_and_add() {
        let a = choose(2, &["A1", "A2", "A3", "A4"]);
        let b = choose(1, &["B1", "B2", "B3"]);
        let both = Requirement::and_of([a.clone(), b.clone()]);
        let either = Requirement::or_of([a.clone(), b.clone()]);

        assert_eq!(both.combinations().len(), a.combinations().len() * b.combinations().len());
        assert_eq!(either.combinations().len(), a.combinations().len() + b.combinations().len());
        assert_eq!(both.combination_count(), 18);
        assert_eq!(either.combination_count(), 9);
    }

    #[test]
    fn courses_are_deduplicated_in_order() {
        let tree = Requirement::or_of([req(&["A", "B"]), req(&["B", "C"])]);
        assert_eq!(tree.courses(), [atom("A"), atom("B"), atom("C")]);
    }

    #[test]
    fn simple_trees() {
        let a = req(&["A"]);
        let b = req(&["B", "C"]);
        let choice = choose(1, &["D", "E"]);

        assert!(Requirement::and_of([a.clone(), b.clone()]).is_simple());
        assert!(!Requirement::or_of([a.clone(), b.clone()]).is_simple());
        assert!(!Requirement::and_of([a, choice]).is_simple());
    }

    #[test]
    fn contains_checks_every_course() {
        let tree = Requirement::and_of([req(&["A"]), choose(1, &["B", "C"])]);
        assert!(tree.contains_atom(&atom("C")));
        assert!(!tree.contains_atom(&atom("D")));
        assert!(tree.contains(&req(&["A", "B"])));
        assert!(!tree.contains(&req(&["A", "D"])));
    }

    #[test]
    fn and_tree_implies_leaf_through_single_child() {
        let all_mat = set(&["MAT1100", "MAT1110", "MAT1120"]);
        let one_of_mat: Requirement = all_mat.scale(1).unwrap().into();
        let tree = Requirement::and_of([one_of_mat.clone(), req(&["MAT1100"])]);
        assert!(tree.implies(&req(&["MAT1100"])));

        let split = Requirement::and_of([req(&["MAT1100"]), req(&["MAT1110", "MAT1120"])]);
        assert!(split.implies(&one_of_mat));
    }

    #[test]
    fn and_tree_implies_leaf_through_guaranteed_courses() {
        let split = Requirement::and_of([req(&["A"]), req(&["B"]), choose(1, &["C", "D"])]);
        assert!(split.implies(&req(&["A", "B"])));
        assert!(!split.implies(&req(&["A", "C"])));
    }

    #[test]
    fn or_tree_implies_leaf_only_through_every_child() {
        let either = Requirement::or_of([req(&["A", "B"]), req(&["A", "C"])]);
        assert!(either.implies(&req(&["A"])));
        assert!(!either.implies(&req(&["B"])));
    }

    #[test]
    fn implication_decomposes_other_tree() {
        let tree = Requirement::and_of([req(&["A"]), req(&["B"])]);
        assert!(tree.implies(&Requirement::and_of([req(&["A"]), req(&["B"])])));
        assert!(tree.implies(&Requirement::or_of([req(&["C"]), req(&["B"])])));
        assert!(!tree.implies(&Requirement::and_of([req(&["A"]), req(&["C"])])));
    }

    #[test]
    fn implies_atom_checks_catalogue() {
        let catalogue = sample_catalogue();
        let tree = Requirement::and_of([req(&["MAT1100"]), choose(1, &["STK1100", "STK1110"])]);

        assert_eq!(tree.implies_atom(&atom("MAT1100"), &catalogue), Ok(true));
        assert_eq!(tree.implies_atom(&atom("STK1100"), &catalogue), Ok(false));
        assert_eq!(
            tree.implies_atom(&atom("XYZ9999"), &catalogue),
            Err(UnknownAtomError(atom("XYZ9999")))
        );

        let leaf = req(&["MAT1100", "MAT1110"]);
        assert_eq!(leaf.implies_atom(&atom("MAT1110"), &catalogue), Ok(true));
    }

    #[test]
    fn assume_taken_drops_fulfilled_and_children() {
        let mut tree = Requirement::and_of([req(&["A"]), choose(1, &["B", "C"])]);
        tree.assume_taken(&atom("A"));
        assert_eq!(tree, Requirement::and_of([choose(1, &["B", "C"])]));

        tree.assume_taken(&atom("C"));
        assert!(tree.is_empty());
    }

    #[test]
    fn assume_taken_fulfils_or_tree() {
        let mut tree = Requirement::and_of([
            req(&["X"]),
            Requirement::or_of([req(&["A"]), req(&["B", "C"])]),
        ]);
        tree.assume_taken(&atom("A"));
        assert_eq!(tree, Requirement::and_of([req(&["X"])]));
    }

    #[test]
    fn assume_taken_absent_course_changes_nothing() {
        let mut tree = Requirement::and_of([req(&["A"]), choose(1, &["B", "C"])]);
        let before = tree.clone();
        tree.assume_taken(&atom("Z"));
        assert_eq!(tree, before);
    }

    #[test]
    fn from_nested_list_builds_groups_then_singles() {
        let items = vec![
            NestedItem::Interchangeable(vec![atom("MAT1100"), atom("MAT1110")]),
            NestedItem::Course(atom("IN1000")),
            NestedItem::Course(atom("IN1010")),
            NestedItem::Interchangeable(Vec::new()),
        ];
        let tree = Requirement::from_nested_list(&items, Relationship::And);

        assert_eq!(tree.relationship(), Some(Relationship::And));
        let children: Vec<_> = tree.view().children().collect();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].as_set().unwrap().quantity(), 1);
        assert_eq!(children[1].as_set().unwrap().quantity(), 2);
        assert_eq!(
            tree.courses(),
            [atom("MAT1100"), atom("MAT1110"), atom("IN1000"), atom("IN1010")]
        );
    }

    #[test]
    fn children_know_their_parent() {
        let tree = Requirement::and_of([
            req(&["A"]),
            Requirement::or_of([req(&["B"]), req(&["C"])]),
        ]);
        let root = tree.view();
        assert!(root.parent().is_none());
        for child in root.children() {
            assert_eq!(child.parent().map(NodeRef::id), Some(root.id()));
            for grandchild in child.children() {
                assert_eq!(grandchild.parent().map(NodeRef::id), Some(child.id()));
            }
        }
    }

    #[test]
    fn remove_child_requires_actual_parent() {
        let mut tree = Requirement::and_of([
            req(&["A"]),
            Requirement::or_of([req(&["B"]), req(&["C"])]),
        ]);
        let root = tree.root();
        let children: Vec<NodeId> = tree.view().children().map(NodeRef::id).collect();
        let grandchild = tree.view_at(children[1]).children().next().unwrap().id();

        assert!(!tree.remove_child(root, grandchild));
        assert!(tree.remove_child(children[1], grandchild));
        assert!(tree.node(grandchild).is_none());
        assert!(tree.remove_child(root, children[0]));
        assert_eq!(tree.courses(), [atom("C")]);
    }

    #[test]
    fn subtree_copies_are_independent() {
        let tree = Requirement::and_of([req(&["A"]), choose(1, &["B", "C"])]);
        let child = tree.view().children().nth(1).unwrap();
        let mut copy = child.to_requirement();
        copy.assume_taken(&atom("B"));

        assert!(copy.is_empty());
        assert_eq!(tree.courses(), [atom("A"), atom("B"), atom("C")]);
    }

    #[test]
    fn equality_follows_structure() {
        let a = Requirement::and_of([req(&["A"]), req(&["B"])]);
        let b = Requirement::and_of([req(&["A"]), req(&["B"])]);
        let c = Requirement::or_of([req(&["A"]), req(&["B"])]);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let unique: HashSet<Requirement> = [a, b, c].into_iter().collect();
        assert_eq!(unique.len(), 2);
    }

    #[test]
    fn empty_tree_is_fulfilled() {
        let tree = Requirement::or_of(Vec::new());
        assert!(tree.is_empty());
        assert_eq!(tree.combinations(), [Combination::new()]);
        assert_eq!(tree.combination_count(), 1);
        assert!(!tree.implies(&req(&["A"])));
    }

    #[test]
    fn tree_residual_keeps_unfulfilled_and_children() {
        let tree = Requirement::and_of([req(&["A"]), choose(1, &["B", "C"])]);
        let residual = tree.requirements_not_implied_by(&req(&["C"])).unwrap();
        assert_eq!(residual, req(&["A"]));

        assert!(tree.requirements_not_implied_by(&req(&["A", "B"])).is_none());
    }

    #[test]
    fn tree_residual_of_or_is_none_once_any_branch_is_fulfilled() {
        let tree = Requirement::or_of([req(&["A", "B"]), req(&["C"])]);
        assert!(tree.requirements_not_implied_by(&req(&["C"])).is_none());

        let residual = tree.requirements_not_implied_by(&req(&["A"])).unwrap();
        assert_eq!(residual, Requirement::or_of([req(&["B"]), req(&["C"])]));
    }

    #[test]
    fn relationship_parsing() {
        assert_eq!("and".parse::<Relationship>().unwrap(), Relationship::And);
        assert_eq!("OR".parse::<Relationship>().unwrap(), Relationship::Or);
        assert!(matches!(
            "xor".parse::<Relationship>(),
            Err(ConfigurationError::InvalidRelationship(_))
        ));
    }
}
