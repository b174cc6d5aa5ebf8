//! Tree merging for root-parallel search.
//!
//! `merge` folds the statistics of one tree into another rooted at an equal
//! state. Matched children are merged recursively; unmatched children are
//! deep-copied in with their whole subtree.

use super::error::SearchError;
use super::node::NodeId;
use super::tree::SearchTree;

impl<S: Clone + PartialEq> SearchTree<S> {
    /// Merge the subtree at `b` of `other` into the subtree at `a`.
    ///
    /// Requires equal states and equal root-ness at `a` and `b`. The check
    /// happens before anything is modified.
    pub fn merge(&mut self, a: NodeId, other: &SearchTree<S>, b: NodeId) -> Result<(), SearchError> {
        let (ours, theirs) = (self.get(a), other.get(b));
        if ours.is_root() != theirs.is_root() {
            return Err(SearchError::MergeRootMismatch);
        }
        if ours.state != theirs.state {
            return Err(SearchError::MergeStateMismatch);
        }

        let mut stack = vec![(a, b)];
        while let Some((ours, theirs)) = stack.pop() {
            let their_node = other.get(theirs);
            {
                let node = self.get_mut(ours);
                node.total += their_node.total;
                node.visits += their_node.visits;
            }

            for &their_child in &their_node.children {
                let state = &other.get(their_child).state;
                match self.find_child(ours, state) {
                    Some(our_child) => stack.push((our_child, their_child)),
                    None => {
                        self.copy_subtree_from(other, their_child, ours);
                    }
                }
            }
        }
        Ok(())
    }

    /// Merge all of `other` into `self`, root to root.
    pub fn merge_tree(&mut self, other: &SearchTree<S>) -> Result<(), SearchError> {
        self.merge(self.root(), other, other.root())
    }

    /// Remove statistics that `self` inherited from `baseline`.
    ///
    /// `self` must have been produced by growing a copy of `baseline`, so
    /// every baseline node lives at the same id with the same state.
    pub fn subtract_baseline(&mut self, baseline: &SearchTree<S>) -> Result<(), SearchError> {
        for (id, base) in baseline.iter() {
            if !self.contains(id) || self.get(id).state != base.state {
                return Err(SearchError::MergeStateMismatch);
            }
        }

        for (id, base) in baseline.iter() {
            let node = self.get_mut(id);
            node.total -= base.total;
            node.visits = node.visits.saturating_sub(base.visits);
        }
        Ok(())
    }
}
