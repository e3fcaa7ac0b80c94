//! Rewriting requirement trees into smaller equivalent trees.
//!
//! The rewrite works bottom-up and repeats until a full pass changes nothing.
//! At each internal node:
//!
//! 1. a child tree with a single child is replaced by that child
//! 2. a child tree leaving no choice is replaced by a set over its courses
//! 3. children with nothing left to require are dropped
//! 4. a child made redundant by a sibling is dropped
//! 5. under AND, courses a simple sibling requires are credited to the other
//!    siblings, and the simple sets are merged into one
//!
//! Redundancy spanning different levels of the tree is not detected.

use tracing::{debug, instrument, trace};

use crate::domain::{
    Relationship, Requirement, RequirementSet,
    requirement::{NodeId, NodeRef},
};

impl Requirement {
    /// Rewrites the requirement in place into a smaller equivalent one.
    ///
    /// Simplifying an already simplified requirement changes nothing.
    #[instrument(level = "debug", skip(self))]
    pub fn simplify(&mut self) {
        let mut passes = 0_usize;
        loop {
            passes += 1;
            let root = self.root();
            let changed = self.simplify_node(root) | self.collapse_root();
            if !changed {
                break;
            }
        }
        debug!(passes, "simplified requirement");
    }

    /// Consumes the requirement and returns it simplified.
    #[must_use]
    pub fn simplified(mut self) -> Self {
        self.simplify();
        self
    }

    fn simplify_node(&mut self, id: NodeId) -> bool {
        let Some((_, children)) = self.tree_parts(id) else {
            return false;
        };

        let mut changed = false;
        for child in children {
            changed |= self.simplify_node(child);
        }

        changed |= self.collapse_single_children(id);
        changed |= self.flatten_simple_children(id);
        changed |= self.prune_empty_children(id);
        changed |= self.drop_redundant_siblings(id);
        changed |= self.credit_required_courses(id);
        changed |= self.prune_empty_children(id);
        changed
    }

    fn collapse_single_children(&mut self, id: NodeId) -> bool {
        let Some((_, children)) = self.tree_parts(id) else {
            return false;
        };

        let mut changed = false;
        for child in children {
            let only = match self.tree_parts(child) {
                Some((_, grandchildren)) if grandchildren.len() == 1 => grandchildren[0],
                _ => continue,
            };
            trace!("collapsing single-child subtree");
            self.splice(id, child, only);
            changed = true;
        }
        changed
    }

    fn flatten_simple_children(&mut self, id: NodeId) -> bool {
        let Some((_, children)) = self.tree_parts(id) else {
            return false;
        };

        let mut changed = false;
        for child in children {
            let view = self.view_at(child);
            if view.relationship().is_none() || view.child_count() == 0 || !view.is_simple() {
                continue;
            }
            trace!("flattening simple subtree");
            let set = RequirementSet::from_atoms(view.courses());
            self.replace_with_leaf(child, set);
            changed = true;
        }
        changed
    }

    fn drop_redundant_siblings(&mut self, id: NodeId) -> bool {
        let mut changed = false;
        while let Some(redundant) = self.redundant_sibling(id) {
            trace!("dropping sibling made redundant by implication");
            self.remove_child(id, redundant);
            changed = true;
        }
        changed
    }

    /// Finds a child that can be dropped without changing what the node
    /// requires.
    ///
    /// Under AND a child implied by a sibling adds nothing; under OR a child
    /// implying a sibling is never the easiest branch. Of two equivalent
    /// siblings, the one mentioning more courses goes.
    fn redundant_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (relationship, children) = self.tree_parts(id)?;

        for (i, &first) in children.iter().enumerate() {
            for &second in &children[i + 1..] {
                let (a, b) = (self.view_at(first), self.view_at(second));
                let redundant = match (a.implies(b), b.implies(a)) {
                    (true, true) if b.courses().len() < a.courses().len() => first,
                    (true, true) => second,
                    (true, false) => stronger_or_weaker(relationship, first, second),
                    (false, true) => stronger_or_weaker(relationship, second, first),
                    (false, false) => continue,
                };
                return Some(redundant);
            }
        }
        None
    }

    fn credit_required_courses(&mut self, id: NodeId) -> bool {
        let Some((Relationship::And, children)) = self.tree_parts(id) else {
            return false;
        };

        let mut changed = false;
        for &giver in &children {
            let view = self.view_at(giver);
            if view.is_empty() || !view.is_simple() {
                continue;
            }
            let courses = view.courses();

            for &receiver in children.iter().filter(|&&child| child != giver) {
                for course in &courses {
                    if self.assume_taken_at(receiver, course) {
                        trace!(%course, "crediting course required by sibling");
                        changed = true;
                    }
                }
            }
        }

        changed | self.merge_simple_leaves(id)
    }

    fn merge_simple_leaves(&mut self, id: NodeId) -> bool {
        let Some((_, children)) = self.tree_parts(id) else {
            return false;
        };

        let simple: Vec<NodeId> = children
            .into_iter()
            .filter(|&child| {
                self.view_at(child)
                    .as_set()
                    .is_some_and(|set| !set.is_empty() && set.is_simple())
            })
            .collect();
        let [first, rest @ ..] = simple.as_slice() else {
            return false;
        };
        if rest.is_empty() {
            return false;
        }

        trace!(count = simple.len(), "merging simple sets");
        let merged = RequirementSet::from_atoms(
            simple
                .iter()
                .flat_map(|&child| self.view_at(child).courses()),
        );
        self.replace_with_leaf(*first, merged);
        for &child in rest {
            self.remove_child(id, child);
        }
        true
    }

    fn collapse_root(&mut self) -> bool {
        let root: NodeRef<'_> = self.view();
        if root.relationship().is_none() {
            return false;
        }

        if root.child_count() == 1 {
            let only = root.children().map(NodeRef::id).next();
            if let Some(only) = only {
                trace!("promoting only child to root");
                self.promote(only);
                return true;
            }
        }

        if root.child_count() > 0 && root.is_simple() {
            trace!("flattening simple root");
            let set = RequirementSet::from_atoms(root.courses());
            let id = root.id();
            self.replace_with_leaf(id, set);
            return true;
        }

        false
    }
}

/// Picks which of an implying/implied pair to drop.
const fn stronger_or_weaker(
    relationship: Relationship,
    implying: NodeId,
    implied: NodeId,
) -> NodeId {
    match relationship {
        Relationship::And => implied,
        Relationship::Or => implying,
    }
}
