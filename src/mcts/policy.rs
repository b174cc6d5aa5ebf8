//! MCTS policies for selection and rollout.
//!
//! - `UctSelector`: UCT scoring blended with the apprentice's evaluation
//! - `RolloutPolicy`: How to play out a leaf to a terminal state
//!   (`UniformRollout`, `GuidedRollout`)

use tracing::trace;

use crate::core::SearchRng;
use crate::nn::Apprentice;
use crate::rules::Environment;

use super::error::SearchError;
use super::node::NodeId;
use super::tree::SearchTree;

// =============================================================================
// Selection
// =============================================================================

/// UCT selection with a learned bias term.
///
/// Formula: E(c) + w * eval(c) + bias * sqrt(ln(N + 1) / (n(c) + 1))
#[derive(Clone, Copy, Debug)]
pub struct UctSelector {
    /// Weight on the exploration term.
    pub exploration_bias: f64,

    /// Weight on the apprentice's evaluation of the child.
    pub bonus_weight: f64,
}

impl UctSelector {
    /// Default weight on the apprentice evaluation.
    pub const DEFAULT_BONUS_WEIGHT: f64 = 0.5;

    pub fn new(exploration_bias: f64) -> Self {
        Self {
            exploration_bias,
            bonus_weight: Self::DEFAULT_BONUS_WEIGHT,
        }
    }

    pub fn with_bonus_weight(mut self, bonus_weight: f64) -> Self {
        self.bonus_weight = bonus_weight;
        self
    }

    /// Score a non-root node for selection by its parent.
    pub fn score<S, A, P>(&self, tree: &SearchTree<S>, node: NodeId, apprentice: &P) -> f64
    where
        P: Apprentice<S, A> + ?Sized,
    {
        let child = tree.get(node);
        let parent_visits = if child.parent.is_none() {
            0
        } else {
            tree.get(child.parent).visits
        };

        let exploitation = child.expected().unwrap_or(0.0);
        let bonus = self.bonus_weight * apprentice.evaluate(&child.state);
        let exploration = self.exploration_bias
            * ((f64::from(parent_visits) + 1.0).ln() / (f64::from(child.visits) + 1.0)).sqrt();
        exploitation + bonus + exploration
    }

    /// Choose the child of `node` to descend into.
    ///
    /// Returns `None` for a leaf. When no child has been visited yet the
    /// choice is uniform; otherwise the first child with the maximum score
    /// wins.
    pub fn select<S, A, P>(
        &self,
        tree: &SearchTree<S>,
        node: NodeId,
        apprentice: &P,
        rng: &mut SearchRng,
    ) -> Option<NodeId>
    where
        P: Apprentice<S, A> + ?Sized,
    {
        let children = tree.children(node);
        if children.is_empty() {
            return None;
        }

        if children.iter().all(|&c| tree.get(c).expected().is_none()) {
            return rng.choose(children).copied();
        }

        let mut best = children[0];
        let mut best_score = self.score(tree, best, apprentice);
        for &child in &children[1..] {
            let score = self.score(tree, child, apprentice);
            if score > best_score {
                best = child;
                best_score = score;
            }
        }
        Some(best)
    }
}

// =============================================================================
// Rollout
// =============================================================================

/// States created by one play-out, in order, ending at a terminal state.
///
/// The chain is empty when the play-out started on a terminal state. These
/// nodes are never attached to the tree.
#[derive(Clone, Debug)]
pub struct Rollout<S> {
    /// States below the starting node, last one terminal.
    pub chain: Vec<S>,

    /// Plies where guided sampling gave up and chose uniformly.
    pub fallbacks: u32,
}

impl<S> Rollout<S> {
    fn new() -> Self {
        Self {
            chain: Vec::new(),
            fallbacks: 0,
        }
    }

    /// Number of plies played.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

/// Policy for playing out a leaf to a terminal state.
pub trait RolloutPolicy<E, P>: Send + Sync
where
    E: Environment,
    P: Apprentice<E::State, E::Action>,
{
    /// Play from `start` to a terminal state.
    ///
    /// Fails if a non-terminal state has no legal actions.
    fn rollout(
        &self,
        env: &E,
        apprentice: &P,
        start: &E::State,
        rng: &mut SearchRng,
    ) -> Result<Rollout<E::State>, SearchError>;
}

/// Uniform random rollout.
///
/// Plays uniformly random legal actions until terminal.
#[derive(Clone, Debug, Default)]
pub struct UniformRollout;

impl<E, P> RolloutPolicy<E, P> for UniformRollout
where
    E: Environment,
    P: Apprentice<E::State, E::Action>,
{
    fn rollout(
        &self,
        env: &E,
        _apprentice: &P,
        start: &E::State,
        rng: &mut SearchRng,
    ) -> Result<Rollout<E::State>, SearchError> {
        let mut rollout = Rollout::new();
        let mut current = start.clone();

        while !env.is_terminal(&current) {
            let actions = env.actions(&current);
            let action = rng.choose(&actions).ok_or(SearchError::NoLegalActions {
                context: "at non-terminal state during rollout",
            })?;
            current = env.transition(&current, action);
            rollout.chain.push(current.clone());
        }
        Ok(rollout)
    }
}

/// Apprentice-guided rollout with a bounded retry budget.
///
/// Each ply samples an index from the apprentice's distribution and keeps
/// it if it decodes to a legal action. Indices that decode to nothing are
/// illegal draws like any other. After `1 + max_retries` illegal samples,
/// or at once when the distribution has no usable weight, the ply falls
/// back to a uniform legal choice.
#[derive(Clone, Debug)]
pub struct GuidedRollout {
    /// Resamples allowed after the first illegal draw.
    pub max_retries: u32,
}

impl GuidedRollout {
    /// Default resample budget.
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    fn sample<E: Environment>(
        &self,
        env: &E,
        distribution: &[f32],
        legal: &[E::Action],
        rng: &mut SearchRng,
    ) -> Option<E::Action> {
        for _ in 0..=self.max_retries {
            // No usable weight at all: every retry would fail the same way.
            let index = rng.choose_weighted(distribution)?;
            // An index outside the action space counts as one more illegal draw.
            match env.action_from_index(index) {
                Some(action) if legal.contains(&action) => return Some(action),
                _ => continue,
            }
        }
        None
    }
}

impl Default for GuidedRollout {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_RETRIES)
    }
}

impl<E, P> RolloutPolicy<E, P> for GuidedRollout
where
    E: Environment,
    P: Apprentice<E::State, E::Action>,
{
    fn rollout(
        &self,
        env: &E,
        apprentice: &P,
        start: &E::State,
        rng: &mut SearchRng,
    ) -> Result<Rollout<E::State>, SearchError> {
        let mut rollout = Rollout::new();
        let mut current = start.clone();

        while !env.is_terminal(&current) {
            let legal = env.actions(&current);
            if legal.is_empty() {
                return Err(SearchError::NoLegalActions {
                    context: "at non-terminal state during rollout",
                });
            }

            let distribution = apprentice.action_distribution(&current);
            let action = match self.sample(env, &distribution, &legal, rng) {
                Some(action) => action,
                None => {
                    rollout.fallbacks += 1;
                    trace!(ply = rollout.len(), "guided sampling fell back to uniform");
                    legal[rng.gen_range_usize(0..legal.len())].clone()
                }
            };

            current = env.transition(&current, &action);
            rollout.chain.push(current.clone());
        }
        Ok(rollout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::tictactoe::{Board, Cell, TicTacToe};
    use crate::nn::{ApprenticeError, UniformApprentice};

    /// Puts all mass on one fixed index and evaluates states by a lookup.
    struct FixedApprentice {
        index: usize,
        favourite: Option<Board>,
    }

    impl Apprentice<Board, Cell> for FixedApprentice {
        fn action_distribution(&self, _state: &Board) -> Vec<f32> {
            let mut dist = vec![0.0; 9];
            dist[self.index] = 1.0;
            dist
        }

        fn evaluate(&self, state: &Board) -> f64 {
            if Some(*state) == self.favourite {
                1.0
            } else {
                0.0
            }
        }

        fn train(&mut self, _: &[Board], _: &[Cell], _: f64) -> Result<(), ApprenticeError> {
            Ok(())
        }
    }

    /// Splits its mass between the centre and an index one past the
    /// action space.
    struct OverflowApprentice;

    impl Apprentice<Board, Cell> for OverflowApprentice {
        fn action_distribution(&self, _state: &Board) -> Vec<f32> {
            let mut dist = vec![0.0; 10];
            dist[4] = 1.0;
            dist[9] = 1.0;
            dist
        }

        fn evaluate(&self, _state: &Board) -> f64 {
            0.0
        }

        fn train(&mut self, _: &[Board], _: &[Cell], _: f64) -> Result<(), ApprenticeError> {
            Ok(())
        }
    }

    fn expanded_root(env: &TicTacToe) -> SearchTree<Board> {
        let mut tree = SearchTree::new(env.initial_state());
        let root = tree.root();
        let children: Vec<Board> = env
            .actions(&env.initial_state())
            .iter()
            .map(|a| env.transition(&env.initial_state(), a))
            .collect();
        tree.set_children(root, children);
        tree
    }

    #[test]
    fn test_select_leaf_returns_none() {
        let env = TicTacToe::new();
        let tree = SearchTree::new(env.initial_state());
        let mut rng = SearchRng::new(1);
        let apprentice = UniformApprentice::new(9);

        let selected =
            UctSelector::new(0.5).select::<_, Cell, _>(&tree, tree.root(), &apprentice, &mut rng);
        assert_eq!(selected, None);
    }

    #[test]
    fn test_select_all_unvisited_returns_unvisited() {
        let env = TicTacToe::new();
        let tree = expanded_root(&env);
        let apprentice = UniformApprentice::new(9);
        let selector = UctSelector::new(0.5);

        for seed in 0..20 {
            let mut rng = SearchRng::new(seed);
            let chosen = selector
                .select::<_, Cell, _>(&tree, tree.root(), &apprentice, &mut rng)
                .unwrap();
            assert!(tree.get(chosen).expected().is_none());
        }
    }

    #[test]
    fn test_select_prefers_higher_expected() {
        let env = TicTacToe::new();
        let mut tree = expanded_root(&env);
        let root = tree.root();
        let children = tree.children(root).to_vec();
        for &c in &children {
            tree.get_mut(c).record(-1.0);
            tree.get_mut(root).record(1.0);
        }
        tree.get_mut(children[3]).total = 1.0;

        let apprentice = UniformApprentice::new(9);
        let mut rng = SearchRng::new(3);
        let chosen = UctSelector::new(0.5).select::<_, Cell, _>(&tree, root, &apprentice, &mut rng);
        assert_eq!(chosen, Some(children[3]));
    }

    #[test]
    fn test_select_ties_take_first() {
        let env = TicTacToe::new();
        let mut tree = expanded_root(&env);
        let root = tree.root();
        let children = tree.children(root).to_vec();
        tree.get_mut(children[0]).record(0.0);
        tree.get_mut(root).record(0.0);

        // Unvisited children score the same as the visited one with
        // expected 0, so the first child wins the tie.
        let apprentice = UniformApprentice::new(9);
        let mut rng = SearchRng::new(3);
        let selector = UctSelector::new(0.0);
        assert_eq!(
            selector.select::<_, Cell, _>(&tree, root, &apprentice, &mut rng),
            Some(children[0])
        );
    }

    #[test]
    fn test_score_uses_apprentice_bonus() {
        let env = TicTacToe::new();
        let mut tree = expanded_root(&env);
        let root = tree.root();
        let children = tree.children(root).to_vec();
        tree.get_mut(root).record(0.0);
        tree.get_mut(children[0]).record(0.0);

        let favourite = tree.get(children[5]).state;
        let apprentice = FixedApprentice { index: 0, favourite: Some(favourite) };
        let selector = UctSelector::new(0.0);

        assert_eq!(selector.score::<_, Cell, _>(&tree, children[5], &apprentice), 0.5);
        assert_eq!(selector.score::<_, Cell, _>(&tree, children[1], &apprentice), 0.0);
        let mut rng = SearchRng::new(9);
        assert_eq!(selector.select::<_, Cell, _>(&tree, root, &apprentice, &mut rng), Some(children[5]));
    }

    #[test]
    fn test_score_exploration_term() {
        let env = TicTacToe::new();
        let mut tree = expanded_root(&env);
        let root = tree.root();
        let child = tree.children(root)[0];
        for _ in 0..3 {
            tree.get_mut(root).record(0.0);
        }
        tree.get_mut(child).record(1.0);

        let apprentice = UniformApprentice::new(9);
        let score = UctSelector::new(2.0).score::<_, Cell, _>(&tree, child, &apprentice);
        let expected = 1.0 + 2.0 * (4.0f64.ln() / 2.0).sqrt();
        assert!((score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_uniform_rollout_reaches_terminal() {
        let env = TicTacToe::new();
        let apprentice = UniformApprentice::new(9);
        let mut rng = SearchRng::new(11);

        let rollout = UniformRollout.rollout(&env, &apprentice, &env.initial_state(), &mut rng).unwrap();

        assert!(rollout.len() >= 5);
        assert!(env.is_terminal(rollout.chain.last().unwrap()));
        assert_eq!(rollout.fallbacks, 0);
    }

    #[test]
    fn test_rollout_from_terminal_is_empty() {
        let env = TicTacToe::new();
        let apprentice = UniformApprentice::new(9);
        let mut rng = SearchRng::new(11);
        let won = [0u8, 3, 1, 4, 2]
            .iter()
            .fold(env.initial_state(), |s, &c| env.transition(&s, &Cell::new(c)));

        let rollout = UniformRollout.rollout(&env, &apprentice, &won, &mut rng).unwrap();
        assert!(rollout.is_empty());
    }

    #[test]
    fn test_guided_rollout_follows_distribution() {
        let env = TicTacToe::new();
        let apprentice = FixedApprentice { index: 4, favourite: None };
        let mut rng = SearchRng::new(5);

        let rollout = GuidedRollout::default()
            .rollout(&env, &apprentice, &env.initial_state(), &mut rng)
            .unwrap();

        // The centre is legal on the first ply, then never again.
        assert_eq!(rollout.chain[0].mark(Cell::new(4)), Some(env.initial_state().to_move()));
        assert_eq!(rollout.fallbacks as usize, rollout.len() - 1);
        assert!(env.is_terminal(rollout.chain.last().unwrap()));
    }

    #[test]
    fn test_guided_rollout_falls_back_on_empty_distribution() {
        let env = TicTacToe::new();
        let apprentice = UniformApprentice::new(0);
        let mut rng = SearchRng::new(5);

        let rollout = GuidedRollout::new(0)
            .rollout(&env, &apprentice, &env.initial_state(), &mut rng)
            .unwrap();

        assert_eq!(rollout.fallbacks as usize, rollout.len());
        assert!(env.is_terminal(rollout.chain.last().unwrap()));
    }

    #[test]
    fn test_guided_rollout_retries_undecodable_index() {
        let env = TicTacToe::new();
        let mut rng = SearchRng::new(21);
        let policy = GuidedRollout::new(3);
        let runs: u32 = 2000;

        let centre_first = (0..runs)
            .filter(|_| {
                let rollout = policy
                    .rollout(&env, &OverflowApprentice, &env.initial_state(), &mut rng)
                    .unwrap();
                rollout.chain[0].mark(Cell::new(4)).is_some()
            })
            .count();

        // Four draws at even odds miss the centre with probability 1/16, and
        // the uniform fallback still finds it 1 time in 9: about 0.944.
        // Giving up after the first undecodable draw would land near 0.556.
        let rate = centre_first as f64 / f64::from(runs);
        assert!(rate > 0.9, "centre opened {rate:.3} of the time");
    }
}
