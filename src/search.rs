// Copyright 2019 Karl Sundequist Blomdahl <karl.sundequist.blomdahl@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::atomic::Ordering as AtomicOrdering;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::context::Context;
use crate::error::SearchError;
use crate::node::Tree;
use crate::options::{Config, SearchOption};

/// The outcome of a completed [`search`] call.
pub struct SearchResult<T> {
    pub tree: Tree<T>,
    pub iterations: u64,
    pub duration: Duration,
    pub error: Option<SearchError>,
}

/// Runs Monte-Carlo tree search, driving `run_fn` on each selected frontier
/// node in accordance with the PUCT bandit policy until a stopping
/// condition configured via `opts` is reached.
pub fn search<T>(
    mut run_fn: impl FnMut(&mut Context<T>),
    opts: impl IntoIterator<Item = SearchOption<T>>,
) -> SearchResult<T>
where
    T: 'static,
{
    let mut cfg = Config::default();
    for opt in opts {
        opt.apply(&mut cfg);
    }

    let mut tree = cfg.continuation.take().unwrap_or_default();
    let mut rng = SmallRng::seed_from_u64(cfg.seed);
    let max_iters_defined = cfg.max_iters > 0;
    let explore_factor = cfg.explore_factor;

    let start = Instant::now();
    let mut iters: u64 = 0;
    let mut path: Vec<String> = Vec::with_capacity(64);
    let mut result_err: Option<SearchError> = None;

    loop {
        // 1. Select a frontier node, descending along the maximum bandit at
        // each exhausted node, recording the path of actions taken.
        let mut frontier = tree.root_id();
        path.clear();
        while tree.node(frontier).exhausted() && !tree.node(frontier).is_leaf() {
            let next = match tree.select_next(frontier) {
                Some(next) => next,
                // The winning arm has no recorded child -- should not
                // happen given select_next's allocate-then-promote order,
                // but stop descending and expand from here rather than
                // panic on a violated invariant.
                None => break,
            };
            let action = tree.node(frontier).arms()[0].action.clone();
            path.push(action);
            frontier = next;
        }

        // 2. Run the user's experiment at the frontier.
        let (expand, mut priors, flags, value, count, done, err) = {
            let node = tree.node_mut(frontier);
            let mut ctx = Context::new(&path, Some(node.payload_slot()));
            run_fn(&mut ctx);
            ctx.into_parts()
        };

        if flags.minimize {
            tree.set_minimize(frontier, true);
        } else if flags.maximize {
            tree.set_minimize(frontier, false);
        }

        // 2b. Optionally shuffle expanded actions (and their matching
        // priors) before inserting them, so ties in prior are not also
        // ties in queue order.
        let mut expand = expand;
        if cfg.expand_shuffle && expand.len() > 1 {
            let n = expand.len();
            for i in (1..n).rev() {
                let j = rng.gen_range(0..=i);
                expand.swap(i, j);
                if priors.len() == n {
                    priors.swap(i, j);
                }
            }
        }

        // 2c. Expand the node with the proposed children. Missing priors
        // default to 1.0; duplicate actions are ignored.
        for (i, action) in expand.into_iter().enumerate() {
            let prior = priors.get(i).copied().unwrap_or(1.0);
            tree.add_child(frontier, action, prior);
        }

        // 2d. Mark the node exhausted unless the run function asked to
        // keep expanding it across future visits.
        if flags.exhausted {
            tree.exhaust(frontier);
        }

        // 2e. Backpropagate the result up the tree, fixing bandit heaps
        // along the way.
        let mut head = tree.node(frontier).parent();
        while let Some(id) = head {
            tree.add_value_runs(id, value, count);
            tree.recompute_priority(id, explore_factor);
            head = tree.node(id).parent();
        }

        // 3. State keeping and termination.
        iters += 1;

        if done {
            result_err = err;
            break;
        }
        if let Some(rx) = &cfg.done_chan {
            if rx.try_recv().is_ok() {
                break;
            }
        }
        if let Some(deadline) = &cfg.deadline {
            if deadline.load(AtomicOrdering::SeqCst) {
                break;
            }
        }
        if max_iters_defined && iters >= cfg.max_iters {
            break;
        }
    }

    #[cfg(feature = "trace-search")]
    eprintln!(
        "search finished after {} iterations in {:?}: {} nodes, root trials {}",
        iters,
        start.elapsed(),
        tree.len(),
        tree.node(tree.root_id()).trials()
    );

    SearchResult {
        tree,
        iterations: iters,
        duration: start.elapsed(),
        error: result_err,
    }
}
