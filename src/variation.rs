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

//! Post-search tree walks: extracting principal variations and folding
//! over the tree.

use std::cmp::Ordering;

use rand::Rng;

use crate::node::{NodeId, Tree};
use crate::stat::{compare_max_stat, compare_min_stat, compare_stat_popularity, Stat};

/// Depth of `id` below the root (root has depth 0).
pub fn depth<T>(tree: &Tree<T>, id: NodeId) -> usize {
    let mut n = 0;
    let mut cur = id;
    while let Some(parent) = tree.node(cur).parent() {
        n += 1;
        cur = parent;
    }
    n
}

/// The sequence of action labels from the root up to (and including) `id`.
pub fn line<T>(tree: &Tree<T>, id: NodeId) -> Vec<String> {
    let mut buf = Vec::with_capacity(1 + depth(tree, id));
    let mut cur = id;
    while tree.node(cur).parent().is_some() {
        buf.push(tree.node(cur).action().to_string());
        cur = tree.node(cur).parent().unwrap();
    }
    buf.reverse();
    buf
}

/// Picks the child of `id` selected by `cmp` (lower is better, matching
/// [`std::cmp::Ordering`]), breaking ties uniformly at random among
/// equivalent arms. Returns `None` if `id` has no children.
fn select_child<T, R: Rng + ?Sized>(
    tree: &Tree<T>,
    id: NodeId,
    cmp: impl Fn(&Stat, &Stat) -> Ordering,
    rng: &mut R,
) -> Option<NodeId> {
    let arms = tree.node(id).arms();
    if arms.is_empty() {
        return None;
    }

    // Build an equivalence set of all arms tied for best under `cmp` in a
    // single pass, matching cmp pairwise rather than sorting.
    let mut best: Vec<&Stat> = vec![&arms[0]];
    for arm in &arms[1..] {
        match cmp(best[0], arm) {
            Ordering::Greater => {
                best.clear();
                best.push(arm);
            }
            Ordering::Equal => best.push(arm),
            Ordering::Less => {}
        }
    }

    let winner = if best.len() > 1 {
        best[rng.gen_range(0..best.len())]
    } else {
        best[0]
    };
    winner.child
}

fn select_line<T, R: Rng + ?Sized>(
    tree: &Tree<T>,
    cmp: impl Fn(&Stat, &Stat) -> Ordering,
    rng: &mut R,
) -> NodeId {
    let mut cur = tree.root_id();
    while let Some(next) = select_child(tree, cur, &cmp, rng) {
        cur = next;
    }
    cur
}

/// The principal variation preferring, at each step, the child with the
/// highest mean score.
pub fn max_variation<T, R: Rng + ?Sized>(tree: &Tree<T>, rng: &mut R) -> NodeId {
    select_line(tree, compare_max_stat, rng)
}

/// The principal variation preferring, at each step, the child with the
/// lowest mean score.
pub fn min_variation<T, R: Rng + ?Sized>(tree: &Tree<T>, rng: &mut R) -> NodeId {
    select_line(tree, compare_min_stat, rng)
}

/// The principal variation preferring, at each step, the most-visited
/// child.
pub fn most_popular_variation<T, R: Rng + ?Sized>(tree: &Tree<T>, rng: &mut R) -> NodeId {
    select_line(tree, compare_stat_popularity, rng)
}

/// Folds `f` over every node in the tree in arena order.
pub fn reduce<T, A>(tree: &Tree<T>, init: A, mut f: impl FnMut(A, NodeId, &Tree<T>) -> A) -> A {
    let mut acc = init;
    for (id, _) in tree.nodes() {
        acc = f(acc, id, tree);
    }
    acc
}

/// Folds `f` over every bandit arm of every node in the tree.
pub fn reduce_child<T, A>(tree: &Tree<T>, init: A, mut f: impl FnMut(A, &Stat) -> A) -> A {
    let mut acc = init;
    for (_, node) in tree.nodes() {
        for arm in node.arms() {
            acc = f(acc, arm);
        }
    }
    acc
}

/// The node in the tree maximizing `score_fn`.
pub fn pick_max<T>(tree: &Tree<T>, score_fn: impl Fn(NodeId, &Tree<T>) -> f64) -> NodeId {
    reduce(tree, tree.root_id(), |best, id, t| {
        if score_fn(id, t) > score_fn(best, t) {
            id
        } else {
            best
        }
    })
}

/// The node in the tree minimizing `score_fn`.
pub fn pick_min<T>(tree: &Tree<T>, score_fn: impl Fn(NodeId, &Tree<T>) -> f64) -> NodeId {
    reduce(tree, tree.root_id(), |best, id, t| {
        if score_fn(id, t) < score_fn(best, t) {
            id
        } else {
            best
        }
    })
}
