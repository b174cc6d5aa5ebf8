//! Parity backpropagation.

use crate::rules::Environment;

use super::error::SearchError;
use super::node::NodeId;
use super::policy::Rollout;
use super::tree::SearchTree;

/// Credit a finished play-out to `leaf` and every ancestor up to the root.
///
/// The terminal state pays `r` to the player who moved into it. Each step
/// up flips the sign, so the terminal's parent receives `-r`, its
/// grandparent `+r`, and so on. Play-out states below `leaf` are not in the
/// tree but still count towards the parity.
///
/// Returns the reward read from the terminal state.
pub fn backpropagate<E: Environment>(
    env: &E,
    tree: &mut SearchTree<E::State>,
    leaf: NodeId,
    rollout: &Rollout<E::State>,
) -> Result<f64, SearchError> {
    let terminal = rollout.chain.last().unwrap_or(&tree.get(leaf).state);
    let reward = env
        .reward(terminal)
        .ok_or_else(|| SearchError::MissingReward(format!("{terminal:?}")))?;

    let mut sign = if rollout.len() % 2 == 0 { 1.0 } else { -1.0 };
    let mut current = leaf;
    while !current.is_none() {
        let node = tree.get_mut(current);
        node.record(sign * reward);
        sign = -sign;
        current = node.parent;
    }
    Ok(reward)
}
