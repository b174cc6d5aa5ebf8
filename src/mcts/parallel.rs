//! Root-parallel search.
//!
//! Every worker searches a private copy of the subtree at the starting
//! node. The finished copies are folded into one tree, which replaces the
//! starting node's subtree in the caller's tree. Workers share the
//! environment and apprentice by reference and nothing mutable except the
//! list of finished copies.

use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use tracing::debug;

use crate::core::SearchRng;
use crate::nn::Apprentice;
use crate::rules::Environment;

use super::config::SearchConfig;
use super::error::SearchError;
use super::node::NodeId;
use super::search::{best_action, check_start, SequentialSearcher};
use super::stats::SearchStats;
use super::tree::SearchTree;

/// A worker's finished tree and counters.
struct WorkerResult<S> {
    worker: usize,
    tree: SearchTree<S>,
    stats: SearchStats,
}

/// Root-parallel MCTS coordinator.
pub struct ParallelSearch<'a, E, P>
where
    E: Environment,
    P: Apprentice<E::State, E::Action>,
{
    env: &'a E,
    apprentice: &'a P,
    config: SearchConfig,

    /// Parent stream; each worker gets a fork.
    rng: SearchRng,

    stats: SearchStats,
}

impl<'a, E, P> ParallelSearch<'a, E, P>
where
    E: Environment,
    P: Apprentice<E::State, E::Action>,
{
    pub fn new(env: &'a E, apprentice: &'a P, config: SearchConfig) -> Self {
        let rng = SearchRng::new(config.seed);
        Self {
            env,
            apprentice,
            config,
            rng,
            stats: SearchStats::default(),
        }
    }

    /// Use an existing RNG stream instead of one seeded from the config.
    pub fn with_rng(mut self, rng: SearchRng) -> Self {
        self.rng = rng;
        self
    }

    /// Merged statistics of the most recent search.
    #[must_use]
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search from `start` on all workers and pick the best action.
    ///
    /// On error the caller's tree is left as it was.
    pub fn search(
        &mut self,
        tree: &mut SearchTree<E::State>,
        start: NodeId,
        iterations: u32,
    ) -> Result<E::Action, SearchError> {
        check_start(self.env, tree, start)?;
        let timer = Instant::now();

        let shares = split_iterations(iterations, self.config.resolved_workers());
        let baseline = tree.subtree(start);
        let streams: Vec<SearchRng> = shares.iter().map(|_| self.rng.fork()).collect();
        let finished: Mutex<Vec<WorkerResult<E::State>>> = Mutex::new(Vec::with_capacity(shares.len()));

        let outcomes: Vec<Result<(), SearchError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = shares
                .iter()
                .zip(streams)
                .enumerate()
                .map(|(worker, (&share, rng))| {
                    let (env, apprentice, config) = (self.env, self.apprentice, &self.config);
                    let (baseline, finished) = (&baseline, &finished);
                    scope.spawn(move || -> Result<(), SearchError> {
                        let mut copy = baseline.clone();
                        let root = copy.root();
                        let mut searcher = SequentialSearcher::new(env, apprentice, config).with_rng(rng);
                        searcher.run(&mut copy, root, share)?;

                        let result = WorkerResult {
                            worker,
                            tree: copy,
                            stats: searcher.stats().clone(),
                        };
                        finished
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push(result);
                        Ok(())
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        });
        outcomes.into_iter().collect::<Result<(), _>>()?;

        let mut results = finished.into_inner().unwrap_or_else(PoisonError::into_inner);
        results.sort_by_key(|r| r.worker);
        let merged = fold_results(results, &baseline, &mut self.stats)?;

        tree.replace_subtree(start, &merged)?;
        self.stats.time_us = timer.elapsed().as_micros() as u64;
        debug!(
            workers = shares.len(),
            iterations = self.stats.iterations,
            nodes = tree.len(),
            time_us = self.stats.time_us,
            "parallel search finished"
        );

        best_action(self.env, tree, start)
    }
}

/// Fold worker trees left to right into the first one.
///
/// Every tree after the first has the starting statistics subtracted, so
/// whatever the tree held before the search is counted once.
fn fold_results<S: Clone + PartialEq>(
    results: Vec<WorkerResult<S>>,
    baseline: &SearchTree<S>,
    stats: &mut SearchStats,
) -> Result<SearchTree<S>, SearchError> {
    stats.reset();
    let mut results = results.into_iter();
    let Some(first) = results.next() else {
        return Ok(baseline.clone());
    };

    stats.absorb(&first.stats);
    let mut merged = first.tree;
    for mut result in results {
        result.tree.subtract_baseline(baseline)?;
        merged.merge_tree(&result.tree)?;
        stats.absorb(&result.stats);
    }
    Ok(merged)
}

/// Split `iterations` into `workers` shares; the last share takes the
/// remainder.
///
/// Never uses more workers than iterations, and always at least one.
#[must_use]
pub fn split_iterations(iterations: u32, workers: usize) -> Vec<u32> {
    let workers = (workers.max(1) as u32).min(iterations.max(1));
    let share = iterations / workers;
    let mut shares = vec![share; workers as usize];
    if let Some(last) = shares.last_mut() {
        *last = iterations - share * (workers - 1);
    }
    shares
}
