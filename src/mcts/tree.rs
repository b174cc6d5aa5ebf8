//! Arena-based search tree.
//!
//! Uses a flat `Vec` of slots with index-based references. Reclaiming a
//! subtree returns its slots to a free list; surviving nodes keep their ids.

use serde::{Deserialize, Serialize};

use super::error::SearchError;
use super::node::{NodeId, SearchNode};

/// Arena-based search tree.
///
/// Nodes live in slots addressed by `NodeId`.
/// Every live node other than the root appears exactly once in its
/// parent's `children`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchTree<S> {
    /// Node slots; `None` marks a reclaimed slot.
    nodes: Vec<Option<SearchNode<S>>>,

    /// Reclaimed slots available for reuse.
    free: Vec<NodeId>,

    /// The root node ID.
    root: NodeId,
}

impl<S> SearchTree<S> {
    /// A tree holding only `root_state`.
    pub fn new(root_state: S) -> Self {
        Self::with_capacity(root_state, 1024)
    }

    /// Like [`SearchTree::new`], reserving room for `capacity` nodes.
    pub fn with_capacity(root_state: S, capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity.max(1));
        nodes.push(Some(SearchNode::root(root_state)));
        Self {
            nodes,
            free: Vec::new(),
            root: NodeId::new(0),
        }
    }

    /// Get the root node ID.
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get the root node.
    #[must_use]
    pub fn root_node(&self) -> &SearchNode<S> {
        self.get(self.root)
    }

    /// Check whether `id` refers to a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.get(id.index()).map_or(false, Option::is_some)
    }

    /// Get a node by ID.
    ///
    /// Panics on a reclaimed or out-of-range id.
    #[inline]
    #[must_use]
    pub fn get(&self, id: NodeId) -> &SearchNode<S> {
        match self.nodes.get(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("stale or invalid {id}"),
        }
    }

    /// Mutable access to a live node.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut SearchNode<S> {
        match self.nodes.get_mut(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("stale or invalid {id}"),
        }
    }

    /// Children of a node.
    #[inline]
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.get(id).children
    }

    /// Allocate a node, reusing a reclaimed slot when one is available.
    fn alloc(&mut self, node: SearchNode<S>) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = Some(node);
            id
        } else {
            let id = NodeId::new(self.nodes.len() as u32);
            self.nodes.push(Some(node));
            id
        }
    }

    /// Create a zero-statistics child of `parent` and attach it.
    pub fn add_child(&mut self, parent: NodeId, state: S) -> NodeId {
        let depth = self.get(parent).depth + 1;
        let child = self.alloc(SearchNode::new(state, parent, depth));
        self.get_mut(parent).children.push(child);
        child
    }

    /// Install a full batch of children on a leaf.
    ///
    /// The children become visible together once every node is allocated.
    pub fn set_children(&mut self, parent: NodeId, states: Vec<S>) -> &[NodeId] {
        debug_assert!(self.get(parent).is_leaf(), "set_children on a non-leaf");
        let depth = self.get(parent).depth + 1;
        let batch: smallvec::SmallVec<[NodeId; 8]> = states
            .into_iter()
            .map(|state| self.alloc(SearchNode::new(state, parent, depth)))
            .collect();
        let node = self.get_mut(parent);
        node.children = batch;
        &node.children
    }

    /// Reclaim every descendant of `id`, leaving `id` as a leaf.
    pub fn release_children(&mut self, id: NodeId) {
        let mut stack: Vec<NodeId> = std::mem::take(&mut self.get_mut(id).children).into_vec();
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes[next.index()].take() {
                stack.extend(node.children);
                self.free.push(next);
            }
        }
    }

    /// Number of live nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// A tree always holds its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every node and start over from `root_state`.
    pub fn reset(&mut self, root_state: S) {
        self.nodes.clear();
        self.free.clear();
        self.nodes.push(Some(SearchNode::root(root_state)));
        self.root = NodeId::new(0);
    }

    /// Iterate over all live nodes.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SearchNode<S>)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (NodeId::new(i as u32), n)))
    }

    /// Size and shape summary.
    #[must_use]
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        for (_, node) in self.iter() {
            stats.node_count += 1;
            stats.max_depth = stats.max_depth.max(node.depth);
            if node.is_leaf() {
                stats.leaf_count += 1;
            }
        }
        stats
    }
}

impl<S: Clone> SearchTree<S> {
    /// Deep-copy the subtree at `source_id` of `source` under `new_parent`.
    ///
    /// Statistics and child order are preserved. With `NodeId::NONE` as the
    /// parent the copy is detached and the caller is responsible for it.
    pub fn copy_subtree_from(
        &mut self,
        source: &SearchTree<S>,
        source_id: NodeId,
        new_parent: NodeId,
    ) -> NodeId {
        let mut top = NodeId::NONE;
        let mut stack = vec![(source_id, new_parent)];

        while let Some((from, parent)) = stack.pop() {
            let original = source.get(from);
            let depth = if parent.is_none() { 0 } else { self.get(parent).depth + 1 };
            let mut copy = SearchNode::new(original.state.clone(), parent, depth);
            copy.total = original.total;
            copy.visits = original.visits;

            let id = self.alloc(copy);
            if !parent.is_none() {
                self.get_mut(parent).children.push(id);
            }
            if from == source_id {
                top = id;
            }

            for &child in original.children.iter().rev() {
                stack.push((child, id));
            }
        }

        top
    }

    /// Extract `id` and its descendants as an independent tree rooted at `id`.
    ///
    /// The copy shares nothing with `self`. Node ids are assigned in
    /// depth-first order, so extracting the same subtree twice yields trees
    /// with identical ids.
    #[must_use]
    pub fn subtree(&self, id: NodeId) -> SearchTree<S> {
        let node = self.get(id);
        let mut tree = SearchTree::with_capacity(node.state.clone(), self.len());
        let root = tree.root();
        {
            let r = tree.get_mut(root);
            r.total = node.total;
            r.visits = node.visits;
        }
        for &child in &node.children {
            tree.copy_subtree_from(self, child, root);
        }
        tree
    }
}

impl<S: Clone + PartialEq> SearchTree<S> {
    /// Find the child of `parent` holding `state`.
    #[must_use]
    pub fn find_child(&self, parent: NodeId, state: &S) -> Option<NodeId> {
        self.get(parent)
            .children
            .iter()
            .copied()
            .find(|&c| self.get(c).state == *state)
    }

    /// Replace the statistics and descendants of `at` with a copy of `source`.
    ///
    /// The displaced descendants are reclaimed. `at` keeps its id, parent
    /// link and position in its parent's children.
    pub fn replace_subtree(&mut self, at: NodeId, source: &SearchTree<S>) -> Result<(), SearchError> {
        let replacement = source.root_node();
        if self.get(at).state != replacement.state {
            return Err(SearchError::MergeStateMismatch);
        }

        self.release_children(at);
        {
            let node = self.get_mut(at);
            node.total = replacement.total;
            node.visits = replacement.visits;
        }
        for &child in &replacement.children {
            self.copy_subtree_from(source, child, at);
        }
        Ok(())
    }
}

/// Statistics about the search tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Total number of live nodes.
    pub node_count: usize,

    /// Maximum depth reached.
    pub max_depth: u32,

    /// Number of nodes without children.
    pub leaf_count: usize,
}
