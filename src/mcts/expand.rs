//! Leaf expansion.

use crate::core::SearchRng;
use crate::rules::Environment;

use super::error::SearchError;
use super::node::NodeId;
use super::tree::SearchTree;

/// Expand a leaf with one child per legal action.
///
/// The children are installed as one batch, one per distinct successor
/// state. Returns a uniformly chosen new
/// child to roll out from. A node that already has children is left alone
/// and one of its existing children is returned.
pub fn expand<E: Environment>(
    env: &E,
    tree: &mut SearchTree<E::State>,
    node: NodeId,
    rng: &mut SearchRng,
) -> Result<NodeId, SearchError> {
    if tree.get(node).is_leaf() {
        let state = &tree.get(node).state;
        let actions = env.actions(state);
        if actions.is_empty() {
            return Err(SearchError::NoLegalActions {
                context: "when expanding a leaf",
            });
        }
        // Actions that reach the same state share one child.
        let mut children: Vec<E::State> = Vec::with_capacity(actions.len());
        for action in &actions {
            let next = env.transition(state, action);
            if !children.contains(&next) {
                children.push(next);
            }
        }
        tree.set_children(node, children);
    }

    rng.choose(tree.children(node))
        .copied()
        .ok_or(SearchError::NoLegalActions {
            context: "when expanding a leaf",
        })
}
