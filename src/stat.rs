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

use std::cmp::Ordering;

use ordered_float::OrderedFloat;

use crate::fastlog;
use crate::histogram::Histogram;
use crate::node::{NodeId, Tree};

/// A single bandit arm: one action available from a node, together with its
/// accumulated experiment statistics.
///
/// `value` accumulates in the owning node's objective direction already --
/// if the node is minimizing, the run function's raw value was negated
/// before being added here, so `score` is always "higher is better" from
/// this arm's own point of view.
#[derive(Debug, Clone)]
pub struct Stat {
    pub action: String,
    pub prior: f32,
    pub runs: f32,
    pub value: f32,
    pub priority: f32,
    pub child: Option<NodeId>,
}

impl Stat {
    pub fn new(action: String, prior: f32) -> Self {
        Stat {
            action,
            prior,
            runs: 0.0,
            value: 0.0,
            priority: f32::INFINITY,
            child: None,
        }
    }

    /// Mean observed value for this arm, or `-inf` if it has never been run.
    pub fn score(&self) -> f32 {
        if self.runs == 0.0 {
            f32::NEG_INFINITY
        } else {
            self.value / self.runs
        }
    }

    /// Score translated back to the caller's original objective direction.
    pub fn external_score(&self, minimize: bool) -> f32 {
        let s = self.score();
        if minimize && s.is_finite() {
            -s
        } else {
            s
        }
    }

    /// PUCT priority for this arm given the owning node's trial count and
    /// the search's explore factor. Untried arms are always `+inf`.
    pub fn compute_priority(&self, trials: f32, explore_factor: f32) -> f32 {
        if self.runs == 0.0 {
            return f32::INFINITY;
        }
        let exploit = self.value / (self.runs + 1.0);
        let explore =
            self.prior * explore_factor * (fastlog::ln(trials + 1.0) / (self.runs + 1.0)).sqrt();
        exploit + explore
    }

    pub fn recompute_priority(&mut self, trials: f32, explore_factor: f32) {
        self.priority = self.compute_priority(trials, explore_factor);
    }
}

/// Orders by score, higher first; arms with no runs never win.
pub fn compare_max_stat(a: &Stat, b: &Stat) -> Ordering {
    OrderedFloat(b.score()).cmp(&OrderedFloat(a.score()))
}

/// Orders by score, lower first; arms with no runs never win.
pub fn compare_min_stat(a: &Stat, b: &Stat) -> Ordering {
    let (sa, sb) = (a.score(), b.score());
    match (sa.is_finite(), sb.is_finite()) {
        (false, false) => Ordering::Equal,
        (false, true) => Ordering::Greater,
        (true, false) => Ordering::Less,
        (true, true) => OrderedFloat(sa).cmp(&OrderedFloat(sb)),
    }
}

/// Orders by run count, higher first.
pub fn compare_stat_popularity(a: &Stat, b: &Stat) -> Ordering {
    OrderedFloat(b.runs).cmp(&OrderedFloat(a.runs))
}

/// Aggregate counters describing a finished tree's shape, for callers that
/// want more than a single variation line.
#[derive(Debug, Clone, Default)]
pub struct SearchStats {
    pub node_count: i64,
    pub leaf_count: i64,
    pub exhausted_nodes: i64,
    pub max_depth: i64,
}

/// Buckets `id`'s arms' current priorities into a [`Histogram`], visited in
/// priority order (untried arms first, then the heapified prefix) so that
/// a caller truncating early still sees the arms a real selection would
/// have looked at first.
pub fn priority_histogram<T>(tree: &Tree<T>, id: NodeId, explore_factor: f32) -> Histogram {
    let mut hist = Histogram::priority_bins(explore_factor as f64);
    for arm in tree.node(id).queue().iter_priority_order() {
        hist.insert(arm.priority as f64);
    }
    hist
}

/// Walks every node of `tree` and tallies a [`SearchStats`] summary.
pub fn compute_search_stats<T>(tree: &crate::node::Tree<T>) -> SearchStats {
    let mut stats = SearchStats::default();
    for (id, node) in tree.nodes() {
        stats.node_count += 1;
        if !node.arms().iter().any(|a| a.child.is_some()) {
            stats.leaf_count += 1;
        }
        if node.exhausted() {
            stats.exhausted_nodes += 1;
        }
        let depth = crate::variation::depth(tree, id) as i64;
        if depth > stats.max_depth {
            stats.max_depth = depth;
        }
    }
    stats
}
