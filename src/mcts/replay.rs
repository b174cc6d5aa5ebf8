//! Advancing a tree along actually-played actions.

use crate::rules::Environment;

use super::node::NodeId;
use super::tree::SearchTree;

impl<S: Clone + PartialEq> SearchTree<S> {
    /// Walk from `from` along `actions`, reusing matching children.
    ///
    /// A child whose state equals the transition result is reused with its
    /// statistics intact; otherwise a zero-statistics child is attached.
    /// Returns the node reached after the whole sequence.
    pub fn play<E>(&mut self, env: &E, from: NodeId, actions: &[E::Action]) -> NodeId
    where
        E: Environment<State = S>,
    {
        let mut current = from;
        for action in actions {
            let next = env.transition(&self.get(current).state, action);
            current = match self.find_child(current, &next) {
                Some(child) => child,
                None => self.add_child(current, next),
            };
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::tictactoe::{Cell, TicTacToe};

    #[test]
    fn test_play_empty_returns_start() {
        let env = TicTacToe::new();
        let mut tree = SearchTree::new(env.initial_state());
        let root = tree.root();

        assert_eq!(tree.play(&env, root, &[]), root);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_play_reuses_existing_child() {
        let env = TicTacToe::new();
        let mut tree = SearchTree::new(env.initial_state());
        let root = tree.root();

        let first = tree.play(&env, root, &[Cell::new(4)]);
        tree.get_mut(first).record(1.0);
        let second = tree.play(&env, root, &[Cell::new(4)]);

        assert_eq!(first, second);
        assert_eq!(tree.children(root).len(), 1);
        assert_eq!(tree.get(second).visits, 1);
    }

    #[test]
    fn test_play_extends_path() {
        let env = TicTacToe::new();
        let mut tree = SearchTree::new(env.initial_state());
        let root = tree.root();

        let moves = [Cell::new(0), Cell::new(4), Cell::new(8)];
        let end = tree.play(&env, root, &moves);

        assert_eq!(tree.get(end).depth, 3);
        assert_eq!(tree.len(), 4);
        let expected = moves
            .iter()
            .fold(env.initial_state(), |s, a| env.transition(&s, a));
        assert_eq!(tree.get(end).state, expected);
    }
}
