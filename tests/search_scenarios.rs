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

//! End-to-end search scenarios exercising the public API as a caller would.

use std::collections::HashSet;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp};

use puct_search::variation::{line, max_variation, most_popular_variation};
use puct_search::{done_after, expand_shuffle, max_iters, rand_source, search, use_continuation};

#[test]
fn two_arm_bias_is_favored_more_often_as_iterations_grow() {
    let run_with = |iters: u64, seed: u64| -> f32 {
        let exp = Exp::new(1.0).unwrap();
        let mut noise_rng = SmallRng::seed_from_u64(seed);

        let result = search::<()>(
            |ctx| {
                if ctx.is_empty() {
                    ctx.expand(["a", "b"]);
                }
                let bias: f32 = if ctx.action_at(0) == "a" { 1.01 } else { 0.99 };
                let noise: f64 = exp.sample(&mut noise_rng);
                ctx.set_result_value(bias * noise as f32);
            },
            [max_iters(iters), expand_shuffle(true), rand_source(seed)],
        );

        let root = result.tree.root_id();
        let arms = result.tree.node(root).arms();
        let a = arms.iter().find(|s| s.action == "a").unwrap();
        a.runs
    };

    // With many more iterations the "a" arm should pick up a much larger
    // share of visits purely from its (small) value advantage, since
    // more total trials gives the bandit policy more opportunity to
    // separate the two arms' means from noise.
    let runs_at_200 = run_with(200, 11);
    let runs_at_4000 = run_with(4000, 11);
    assert!(runs_at_4000 > runs_at_200);
}

#[test]
fn continuation_matches_a_single_longer_run() {
    let run_fn = |ctx: &mut puct_search::Context<()>| {
        if ctx.is_empty() {
            ctx.expand(["a", "b"]);
        }
        let bias = if ctx.action_at(0) == "a" { 1.0 } else { 0.5 };
        ctx.set_result_value(bias);
    };

    let one_shot = search::<()>(run_fn, [max_iters(200), rand_source(3)]);

    let first_half = search::<()>(run_fn, [max_iters(100), rand_source(3)]);
    let resumed = search::<()>(
        run_fn,
        [max_iters(100), rand_source(3), use_continuation(first_half.tree)],
    );

    let one_shot_root = one_shot.tree.node(one_shot.tree.root_id());
    let resumed_root = resumed.tree.node(resumed.tree.root_id());
    assert_eq!(one_shot_root.trials(), resumed_root.trials());
}

#[test]
fn deadline_bounds_iteration_count() {
    let result = search::<()>(
        |ctx| {
            std::thread::sleep(Duration::from_millis(1));
            ctx.set_result_value(0.0);
        },
        [done_after(Duration::from_millis(10))],
    );

    assert!(result.iterations >= 1);
    assert!(result.iterations <= 50);
}

#[test]
fn empty_expansion_keeps_selecting_the_unexhausted_root() {
    let mut visits = 0usize;
    let result = search::<()>(
        |ctx| {
            visits += 1;
            // Never calls expand(): the root is never marked exhausted, so
            // every iteration re-selects and re-runs it directly.
            ctx.set_result_value(1.0);
        },
        [max_iters(25)],
    );

    assert_eq!(result.iterations, 25);
    assert_eq!(visits, 25);
    assert!(result.tree.node(result.tree.root_id()).arms().is_empty());
}

#[test]
fn most_popular_variation_walks_the_most_visited_line() {
    let result = search::<()>(
        |ctx| {
            if ctx.is_empty() {
                ctx.expand(["a", "b"]);
            }
            let bias = if ctx.action_at(0) == "a" { 1.0 } else { -1.0 };
            ctx.set_result_value(bias);
        },
        [max_iters(300), rand_source(5)],
    );

    let mut rng = SmallRng::seed_from_u64(5);
    let leaf = most_popular_variation(&result.tree, &mut rng);
    assert_eq!(result.tree.node(leaf).action(), "a");
}

#[test]
fn puct_tuning_narrows_toward_the_fastlog_constant() {
    // Reimplements the fastlog approximation locally with a parameterized
    // pair of constants `(1+k, -k)`, independent of the crate's own tuned
    // `fastlog` module, so the search is free to land anywhere in [-2, 2]
    // rather than trivially rediscovering a shared constant.
    fn mse_for_k(k: f32) -> f64 {
        let c0 = 1.0 + k;
        let c1 = -k;
        let ln2 = std::f32::consts::LN_2;
        let mut x = 1.0_f32;
        let mut sum = 0.0_f64;
        let mut n = 0usize;
        while x < 1.0e7 {
            let bits = x.to_bits();
            let exponent = (bits >> 23) as f32;
            let mantissa_bits = (bits & 0x7fffff) | (0x7f << 23);
            let frac = f32::from_bits(mantissa_bits) - 1.0;
            let log2_approx = frac * (c0 + c1 * frac) - 127.0 + exponent;
            let ln_approx = ln2 * log2_approx;
            sum += (ln_approx as f64 - (x as f64).ln()).powi(2);
            n += 1;
            x *= 1.01;
        }
        sum / n as f64
    }

    fn k_for_path<'a>(path: impl Iterator<Item = &'a str>) -> f32 {
        let (mut lo, mut hi) = (-2.0_f32, 2.0_f32);
        for action in path {
            let mid = (lo + hi) / 2.0;
            match action {
                "lo" => hi = mid,
                "hi" => lo = mid,
                _ => {}
            }
        }
        (lo + hi) / 2.0
    }

    let result = search::<()>(
        |ctx| {
            const ACTIONS: [&str; 2] = ["lo", "hi"];
            let path: Vec<&str> = (0..ctx.len()).map(|i| ctx.action_at(i)).collect();
            let mse = mse_for_k(k_for_path(path.into_iter()));
            ctx.expand(ACTIONS);
            ctx.set_result_value(-(mse as f32));
        },
        [max_iters(3000), rand_source(7)],
    );

    let baseline_mse = mse_for_k(0.0);

    let mut rng = SmallRng::seed_from_u64(7);
    let leaf = max_variation(&result.tree, &mut rng);
    let path = line(&result.tree, leaf);
    let best_k = k_for_path(path.iter().map(String::as_str));
    let best_mse = mse_for_k(best_k);

    assert!(
        best_mse < baseline_mse,
        "tuned mse {} not below baseline {}",
        best_mse,
        baseline_mse
    );
    // Documented basin (spec.md scenario C / SPEC_FULL.md §8 scenario C):
    // the true tuned constant is k ~= 0.3462012, widened slightly here to
    // account for the bisection's finite depth.
    assert!(
        best_k >= 0.340 && best_k <= 0.353,
        "k {} outside documented basin [0.340, 0.353]",
        best_k
    );
    assert!(best_mse <= 3.0e-5, "tuned mse {} exceeds documented tolerance 3.0e-5", best_mse);
}

#[test]
fn expand_shuffle_does_not_always_favor_insertion_order() {
    let mut first_arms: HashSet<String> = HashSet::new();

    for seed in 0..40u64 {
        let result = search::<()>(
            |ctx| {
                if ctx.is_empty() {
                    ctx.expand(["a", "b"]);
                }
                ctx.set_result_value(0.0);
            },
            [max_iters(1), expand_shuffle(true), rand_source(seed)],
        );

        let root = result.tree.root_id();
        first_arms.insert(result.tree.node(root).arms()[0].action.clone());
    }

    assert_eq!(
        first_arms.len(),
        2,
        "expand shuffle never varied the lazy queue's head across 40 seeds"
    );
}
