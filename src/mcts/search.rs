//! Core MCTS search algorithm.
//!
//! Each iteration runs SELECT, EXPAND, ROLLOUT and BACKPROP from a fixed
//! starting node. The tree is owned by the caller, so statistics survive
//! between searches and across real moves.

use std::time::Instant;

use tracing::debug;

use crate::core::SearchRng;
use crate::nn::Apprentice;
use crate::rules::Environment;

use super::backprop::backpropagate;
use super::config::SearchConfig;
use super::error::SearchError;
use super::expand::expand;
use super::node::NodeId;
use super::policy::{RolloutPolicy, UctSelector};
use super::stats::SearchStats;
use super::tree::SearchTree;

/// Single-threaded MCTS search context.
///
/// Borrows the environment and apprentice; owns its RNG, policies and
/// statistics.
pub struct SequentialSearcher<'a, E, P>
where
    E: Environment,
    P: Apprentice<E::State, E::Action>,
{
    /// The environment rules.
    env: &'a E,

    /// Learned guidance for selection and guided rollouts.
    apprentice: &'a P,

    /// Selection policy.
    selector: UctSelector,

    /// Rollout policy.
    rollout: Box<dyn RolloutPolicy<E, P> + 'a>,

    /// RNG for selection, expansion and rollouts.
    rng: SearchRng,

    /// Search statistics.
    stats: SearchStats,
}

impl<'a, E, P> SequentialSearcher<'a, E, P>
where
    E: Environment,
    P: Apprentice<E::State, E::Action>,
{
    /// Create a new search context seeded from `config.seed`.
    pub fn new(env: &'a E, apprentice: &'a P, config: &SearchConfig) -> Self {
        Self {
            env,
            apprentice,
            selector: config.selector(),
            rollout: config.rollout.build(),
            rng: SearchRng::new(config.seed),
            stats: SearchStats::default(),
        }
    }

    /// Use an existing RNG stream instead of a fresh one.
    pub fn with_rng(mut self, rng: SearchRng) -> Self {
        self.rng = rng;
        self
    }

    /// Set a custom rollout policy.
    pub fn with_rollout<R: RolloutPolicy<E, P> + 'a>(mut self, rollout: R) -> Self {
        self.rollout = Box::new(rollout);
        self
    }

    /// Statistics of the most recent search.
    #[must_use]
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Run `iterations` iterations from `start` and pick the best action.
    pub fn search(
        &mut self,
        tree: &mut SearchTree<E::State>,
        start: NodeId,
        iterations: u32,
    ) -> Result<E::Action, SearchError> {
        check_start(self.env, tree, start)?;
        self.run(tree, start, iterations)?;
        best_action(self.env, tree, start)
    }

    /// Run `iterations` iterations from `start` without choosing an action.
    pub fn run(
        &mut self,
        tree: &mut SearchTree<E::State>,
        start: NodeId,
        iterations: u32,
    ) -> Result<(), SearchError> {
        let timer = Instant::now();
        self.stats.reset();

        for _ in 0..iterations {
            self.iteration(tree, start)?;
            self.stats.iterations += 1;
        }

        self.stats.time_us = timer.elapsed().as_micros() as u64;
        debug!(
            iterations = self.stats.iterations,
            expanded = self.stats.nodes_expanded,
            fallbacks = self.stats.guided_fallbacks,
            max_depth = self.stats.max_depth,
            time_us = self.stats.time_us,
            "sequential search finished"
        );
        Ok(())
    }

    /// Single MCTS iteration: select, expand, rollout, backpropagate.
    fn iteration(&mut self, tree: &mut SearchTree<E::State>, start: NodeId) -> Result<(), SearchError> {
        // === SELECTION ===
        let mut current = start;
        while let Some(child) = self.selector.select(tree, current, self.apprentice, &mut self.rng) {
            current = child;
        }

        // === EXPANSION ===
        if !self.env.is_terminal(&tree.get(current).state) {
            current = expand(self.env, tree, current, &mut self.rng)?;
            let parent = tree.get(current).parent;
            self.stats.nodes_expanded += tree.children(parent).len() as u32;
        }

        // === ROLLOUT ===
        let rollout = self
            .rollout
            .rollout(self.env, self.apprentice, &tree.get(current).state, &mut self.rng)?;
        self.stats.rollouts += 1;
        self.stats.rollout_plies += rollout.len() as u64;
        self.stats.guided_fallbacks += rollout.fallbacks;
        self.stats.max_depth = self
            .stats
            .max_depth
            .max(tree.get(current).depth + rollout.len() as u32);

        // === BACKPROPAGATION ===
        backpropagate(self.env, tree, current, &rollout)?;
        Ok(())
    }
}

/// Reject a starting node that has nothing to search.
pub(crate) fn check_start<E: Environment>(
    env: &E,
    tree: &SearchTree<E::State>,
    start: NodeId,
) -> Result<(), SearchError> {
    let state = &tree.get(start).state;
    if env.actions(state).is_empty() {
        return Err(SearchError::NoLegalActions {
            context: "at search start",
        });
    }
    env.check_consistent(state)
}

/// The legal action at `node` whose child has the greatest expected reward.
///
/// Unvisited children count as negative infinity and are never returned;
/// ties keep the first legal action. Fails with `Desync` if a legal action
/// has no child and with `Unsearched` if no child has been visited, as
/// after a zero-iteration search.
pub fn best_action<E: Environment>(
    env: &E,
    tree: &SearchTree<E::State>,
    node: NodeId,
) -> Result<E::Action, SearchError> {
    let state = &tree.get(node).state;
    let mut best: Option<(E::Action, f64)> = None;

    for action in env.actions(state) {
        let next = env.transition(state, &action);
        let child = tree
            .find_child(node, &next)
            .ok_or_else(|| SearchError::Desync(format!("{action:?}")))?;
        let value = tree.get(child).expected().unwrap_or(f64::NEG_INFINITY);
        match &best {
            Some((_, best_value)) if value <= *best_value => {}
            _ => best = Some((action, value)),
        }
    }

    match best {
        None => Err(SearchError::NoLegalActions {
            context: "when choosing the best action",
        }),
        Some((_, value)) if value == f64::NEG_INFINITY => Err(SearchError::Unsearched),
        Some((action, _)) => Ok(action),
    }
}
