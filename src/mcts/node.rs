//! MCTS node structures.
//!
//! Uses arena-based allocation with index references (NodeId). A node owns
//! its children through the index list; the parent index is navigational
//! only and never participates in reclamation.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Index into the SearchTree node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Marks an absent node, such as the root's parent.
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Create a new node ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    /// Arena slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            write!(f, "NodeId(NONE)")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}

/// A node in the search tree.
///
/// Statistics are from the perspective of the player who moved into
/// `state`, so a parent prefers the child with the greatest `expected`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchNode<S> {
    /// State at this node.
    pub state: S,

    /// `NodeId::NONE` at the root.
    pub parent: NodeId,

    /// Plies below the tree root.
    pub depth: u32,

    /// Owned children, at most one per distinct state.
    /// Up to eight ids are stored inline.
    pub children: SmallVec<[NodeId; 8]>,

    /// Accumulated signed reward across all backpropagations.
    pub total: f64,

    /// Number of backpropagations through this node.
    pub visits: u32,
}

impl<S> SearchNode<S> {
    /// Create a node with zero statistics.
    pub fn new(state: S, parent: NodeId, depth: u32) -> Self {
        Self {
            state,
            parent,
            depth,
            children: SmallVec::new(),
            total: 0.0,
            visits: 0,
        }
    }

    /// Create a root node.
    pub fn root(state: S) -> Self {
        Self::new(state, NodeId::NONE, 0)
    }

    /// Mean reward, undefined until the node has been visited.
    #[inline]
    #[must_use]
    pub fn expected(&self) -> Option<f64> {
        if self.visits == 0 {
            None
        } else {
            Some(self.total / f64::from(self.visits))
        }
    }

    /// Record one backpropagated contribution.
    #[inline]
    pub fn record(&mut self, contribution: f64) {
        self.total += contribution;
        self.visits += 1;
    }

    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    #[inline]
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
