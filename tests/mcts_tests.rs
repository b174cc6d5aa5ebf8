//! MCTS integration tests using TicTacToe and small contract-breaking
//! environments.

use apprentice_mcts::games::{Board, Cell, TicTacToe};
use apprentice_mcts::mcts::{
    best_action, ParallelSearch, RolloutKind, SearchConfig, SearchError, SearchTree,
    SequentialSearcher, UctSelector,
};
use apprentice_mcts::nn::{TabularApprentice, UniformApprentice};
use apprentice_mcts::{Environment, SearchRng};

fn play(env: &TicTacToe, cells: &[u8]) -> Board {
    cells
        .iter()
        .fold(env.initial_state(), |s, &c| env.transition(&s, &Cell::new(c)))
}

fn visit_profile(tree: &SearchTree<Board>) -> Vec<(Board, u32, i64)> {
    let mut profile: Vec<_> = tree
        .iter()
        .map(|(_, n)| (n.state, n.visits, (n.total * 1000.0).round() as i64))
        .collect();
    profile.sort_by_key(|(s, v, t)| (format!("{s:?}"), *v, *t));
    profile
}

// =============================================================================
// Environments that break the contract
// =============================================================================

/// Counts down from a start value; 1 has no actions but is not terminal.
struct StuckCounter;

impl Environment for StuckCounter {
    type State = u8;
    type Action = u8;

    fn transition(&self, state: &u8, action: &u8) -> u8 {
        state.saturating_sub(*action)
    }

    fn actions(&self, state: &u8) -> Vec<u8> {
        if *state > 1 {
            vec![1]
        } else {
            vec![]
        }
    }

    fn reward(&self, state: &u8) -> Option<f64> {
        (*state == 0).then_some(1.0)
    }

    fn is_terminal(&self, state: &u8) -> bool {
        *state == 0
    }

    fn action_space_size(&self) -> usize {
        1
    }

    fn action_index(&self, _action: &u8) -> Option<usize> {
        Some(0)
    }

    fn action_from_index(&self, index: usize) -> Option<u8> {
        (index == 0).then_some(1)
    }
}

/// Terminal at 0 but never pays out.
struct SilentCounter;

impl Environment for SilentCounter {
    type State = u8;
    type Action = u8;

    fn transition(&self, state: &u8, _action: &u8) -> u8 {
        state.saturating_sub(1)
    }

    fn actions(&self, state: &u8) -> Vec<u8> {
        if *state > 0 {
            vec![1]
        } else {
            vec![]
        }
    }

    fn reward(&self, _state: &u8) -> Option<f64> {
        None
    }

    fn is_terminal(&self, state: &u8) -> bool {
        *state == 0
    }

    fn action_space_size(&self) -> usize {
        1
    }

    fn action_index(&self, _action: &u8) -> Option<usize> {
        Some(0)
    }

    fn action_from_index(&self, _index: usize) -> Option<u8> {
        Some(1)
    }
}

// =============================================================================
// Sequential Search
// =============================================================================

#[test]
fn test_one_iteration_from_empty_tree() {
    let env = TicTacToe::new();
    let apprentice = UniformApprentice::new(9);
    let mut tree = SearchTree::new(env.initial_state());
    let root = tree.root();

    SequentialSearcher::new(&env, &apprentice, &SearchConfig::default())
        .run(&mut tree, root, 1)
        .unwrap();

    assert_eq!(tree.root_node().visits, 1);
    let visited: Vec<_> = tree
        .children(root)
        .iter()
        .copied()
        .filter(|&c| tree.get(c).visits > 0)
        .collect();
    assert_eq!(visited.len(), 1);
    assert_eq!(tree.get(visited[0]).visits, 1);
    // Only the root has been expanded.
    assert!(tree.children(root).iter().all(|&c| tree.get(c).is_leaf()));
}

#[test]
fn test_expected_is_total_over_visits_everywhere() {
    let env = TicTacToe::new();
    let apprentice = UniformApprentice::new(9);
    let mut tree = SearchTree::new(env.initial_state());
    let root = tree.root();

    SequentialSearcher::new(&env, &apprentice, &SearchConfig::default())
        .run(&mut tree, root, 500)
        .unwrap();

    for (_, node) in tree.iter() {
        match node.expected() {
            Some(e) => assert_eq!(e, node.total / f64::from(node.visits)),
            None => assert_eq!(node.visits, 0),
        }
        // A node is rolled out from at most once before it is expanded;
        // every later visit passes through exactly one child.
        if !node.is_leaf() {
            let through: u32 = node.children.iter().map(|&c| tree.get(c).visits).sum();
            assert!(through <= node.visits);
            assert!(node.visits - through <= 1);
        }
    }
}

#[test]
fn test_blocks_immediate_threat() {
    let env = TicTacToe::new();
    let apprentice = UniformApprentice::new(9);
    // X: a1 c3, O: a2 b2. X must block O's row on c2.
    let mut tree = SearchTree::new(play(&env, &[0, 3, 8, 4]));
    let root = tree.root();

    let action = SequentialSearcher::new(&env, &apprentice, &SearchConfig::default())
        .search(&mut tree, root, 3000)
        .unwrap();
    assert_eq!(action, Cell::new(5));
}

#[test]
fn test_guided_rollouts_with_tabular_apprentice() {
    let env = TicTacToe::new();
    let apprentice = TabularApprentice::new(env);
    let config = SearchConfig::default().with_rollout(RolloutKind::Guided { max_retries: 3 });
    let mut tree = SearchTree::new(env.initial_state());
    let root = tree.root();
    let mut searcher = SequentialSearcher::new(&env, &apprentice, &config);

    let action = searcher.search(&mut tree, root, 200).unwrap();

    assert!(env.actions(&env.initial_state()).contains(&action));
    assert_eq!(searcher.stats().rollouts, 200);
}

#[test]
fn test_search_continues_from_replayed_node() {
    let env = TicTacToe::new();
    let apprentice = UniformApprentice::new(9);
    let mut tree = SearchTree::new(env.initial_state());
    let root = tree.root();
    let mut searcher = SequentialSearcher::new(&env, &apprentice, &SearchConfig::default());

    let first = searcher.search(&mut tree, root, 300).unwrap();
    let node = tree.play(&env, root, &[first]);
    let before = tree.get(node).visits;
    searcher.search(&mut tree, node, 100).unwrap();

    assert_eq!(tree.get(node).visits, before + 100);
    assert_eq!(tree.root_node().visits, 400);
}

// =============================================================================
// Selection
// =============================================================================

#[test]
fn test_selection_with_all_unvisited_never_scores() {
    let env = TicTacToe::new();
    let apprentice = UniformApprentice::new(9);
    let mut tree = SearchTree::new(env.initial_state());
    let root = tree.root();
    let children: Vec<Board> = env
        .actions(&env.initial_state())
        .iter()
        .map(|a| env.transition(&env.initial_state(), a))
        .collect();
    tree.set_children(root, children);
    // Visits on the parent alone leave every child undefined.
    tree.get_mut(root).record(0.0);

    let selector = UctSelector::new(0.5);
    let mut seen = std::collections::HashSet::new();
    let mut rng = SearchRng::new(17);
    for _ in 0..200 {
        let chosen = selector
            .select::<_, Cell, _>(&tree, root, &apprentice, &mut rng)
            .unwrap();
        assert!(tree.get(chosen).expected().is_none());
        seen.insert(chosen);
    }
    // Uniform choice reaches more than one child.
    assert!(seen.len() > 1);
}

// =============================================================================
// Parallel Search
// =============================================================================

#[test]
fn test_single_worker_matches_sequential() {
    let env = TicTacToe::new();
    let apprentice = UniformApprentice::new(9);
    let config = SearchConfig::default().with_workers(1).with_seed(99);

    let mut parallel_tree = SearchTree::new(env.initial_state());
    let root = parallel_tree.root();
    let parallel_action = ParallelSearch::new(&env, &apprentice, config.clone())
        .search(&mut parallel_tree, root, 300)
        .unwrap();

    // The coordinator hands its only worker the first fork of the seed.
    let mut sequential_tree = SearchTree::new(env.initial_state());
    let stream = SearchRng::new(config.seed).fork();
    let sequential_action = SequentialSearcher::new(&env, &apprentice, &config)
        .with_rng(stream)
        .search(&mut sequential_tree, root, 300)
        .unwrap();

    assert_eq!(parallel_action, sequential_action);
    assert_eq!(visit_profile(&parallel_tree), visit_profile(&sequential_tree));
}

#[test]
fn test_parallel_is_reproducible() {
    let env = TicTacToe::new();
    let apprentice = UniformApprentice::new(9);
    let config = SearchConfig::default().with_workers(3).with_seed(5);

    let run = || {
        let mut tree = SearchTree::new(env.initial_state());
        let root = tree.root();
        ParallelSearch::new(&env, &apprentice, config.clone())
            .search(&mut tree, root, 300)
            .unwrap();
        visit_profile(&tree)
    };

    assert_eq!(run(), run());
}

#[test]
fn test_parallel_merges_worker_statistics() {
    let env = TicTacToe::new();
    let apprentice = UniformApprentice::new(9);
    let mut tree = SearchTree::new(env.initial_state());
    let root = tree.root();
    let mut search = ParallelSearch::new(&env, &apprentice, SearchConfig::default().with_workers(4));

    search.search(&mut tree, root, 1000).unwrap();

    assert_eq!(tree.root_node().visits, 1000);
    assert_eq!(search.stats().rollouts, 1000);
    // Merging never leaves two children with the same state.
    for (id, _) in tree.iter() {
        let states: Vec<Board> = tree.children(id).iter().map(|&c| tree.get(c).state).collect();
        let mut unique = states.clone();
        unique.sort_by_key(|s| format!("{s:?}"));
        unique.dedup();
        assert_eq!(unique.len(), states.len());
    }
}

// =============================================================================
// Fatal Conditions
// =============================================================================

#[test]
fn test_non_terminal_without_actions_is_fatal() {
    let env = StuckCounter;
    let apprentice = UniformApprentice::new(1);
    let mut tree = SearchTree::new(3u8);
    let root = tree.root();

    let result = SequentialSearcher::new(&env, &apprentice, &SearchConfig::default()).search(&mut tree, root, 5);
    assert!(matches!(result, Err(SearchError::NoLegalActions { .. })));

    let mut start = SearchTree::new(1u8);
    let start_root = start.root();
    let result = SequentialSearcher::new(&env, &apprentice, &SearchConfig::default()).search(&mut start, start_root, 5);
    assert!(matches!(result, Err(SearchError::NoLegalActions { .. })));
}

#[test]
fn test_parallel_failure_leaves_tree_untouched() {
    let env = StuckCounter;
    let apprentice = UniformApprentice::new(1);
    let mut tree = SearchTree::new(3u8);
    let root = tree.root();
    let mut search = ParallelSearch::new(&env, &apprentice, SearchConfig::default().with_workers(2));

    assert!(search.search(&mut tree, root, 10).is_err());
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.root_node().visits, 0);
}

#[test]
fn test_missing_reward_is_fatal() {
    let env = SilentCounter;
    let apprentice = UniformApprentice::new(1);
    let mut tree = SearchTree::new(2u8);
    let root = tree.root();

    let result = SequentialSearcher::new(&env, &apprentice, &SearchConfig::default()).search(&mut tree, root, 1);
    assert!(matches!(result, Err(SearchError::MissingReward(_))));
}

#[test]
fn test_contract_check_rejects_disagreement() {
    assert!(matches!(
        StuckCounter.check_consistent(&1),
        Err(SearchError::ContractViolation(_))
    ));
    assert!(matches!(
        SilentCounter.check_consistent(&0),
        Err(SearchError::ContractViolation(_))
    ));
    assert!(StuckCounter.check_consistent(&3).is_ok());
}

#[test]
fn test_best_action_requires_children() {
    let env = TicTacToe::new();
    let tree = SearchTree::new(env.initial_state());

    assert!(matches!(
        best_action(&env, &tree, tree.root()),
        Err(SearchError::Desync(_))
    ));
}
