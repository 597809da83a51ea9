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

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

use crate::node::Tree;

/// Default PCG-style seed, matching the search's historical default.
const DEFAULT_SEED: u64 = 1337;

/// Default PUCT exploration constant.
const DEFAULT_EXPLORE_FACTOR: f32 = std::f32::consts::PI * 2.0;

/// Resolved configuration for a search, built up by applying each
/// [`SearchOption`] in order before the search loop starts.
pub struct Config<T> {
    pub(crate) seed: u64,
    pub(crate) max_iters: u64,
    pub(crate) expand_shuffle: bool,
    pub(crate) explore_factor: f32,
    pub(crate) continuation: Option<Tree<T>>,
    pub(crate) done_chan: Option<Receiver<()>>,
    pub(crate) deadline: Option<Arc<AtomicBool>>,
}

impl<T> Default for Config<T> {
    fn default() -> Self {
        Config {
            seed: DEFAULT_SEED,
            max_iters: 0,
            expand_shuffle: true,
            explore_factor: DEFAULT_EXPLORE_FACTOR,
            continuation: None,
            done_chan: None,
            deadline: None,
        }
    }
}

/// A single configuration change applied to a [`Config`] before a search
/// begins. Constructed by the free functions in this module and passed to
/// [`crate::search`].
pub struct SearchOption<T>(Box<dyn FnOnce(&mut Config<T>)>);

impl<T> SearchOption<T> {
    fn new(f: impl FnOnce(&mut Config<T>) + 'static) -> Self {
        SearchOption(Box::new(f))
    }

    pub(crate) fn apply(self, cfg: &mut Config<T>) {
        (self.0)(cfg)
    }
}

/// Stops the search after `n` iterations. `0` (the default) means
/// unbounded -- some other stopping condition must be supplied.
pub fn max_iters<T>(n: u64) -> SearchOption<T> {
    SearchOption::new(move |cfg| cfg.max_iters = n)
}

/// Stops the search as soon as `done` receives or is closed, checked once
/// per iteration boundary.
pub fn done<T>(done: Receiver<()>) -> SearchOption<T> {
    SearchOption::new(move |cfg| cfg.done_chan = Some(done))
}

/// Stops the search after wall-clock duration `d`, checked once per
/// iteration boundary (so the true bound is `d` plus the cost of one more
/// run-function call).
pub fn done_after<T>(d: Duration) -> SearchOption<T>
where
    T: 'static,
{
    SearchOption::new(move |cfg| {
        let flag = Arc::new(AtomicBool::new(false));
        let signal = flag.clone();
        std::thread::spawn(move || {
            std::thread::sleep(d);
            signal.store(true, AtomicOrdering::SeqCst);
        });
        cfg.deadline = Some(flag);
    })
}

/// Seeds the search's random source, used for expansion shuffling and
/// variation tie-breaks.
pub fn rand_source<T>(seed: u64) -> SearchOption<T> {
    SearchOption::new(move |cfg| cfg.seed = seed)
}

/// Whether newly proposed children are shuffled before insertion. Default
/// `true`, so ties in prior are not also ties in queue-insertion order.
pub fn expand_shuffle<T>(shuffle: bool) -> SearchOption<T> {
    SearchOption::new(move |cfg| cfg.expand_shuffle = shuffle)
}

/// The PUCT exploration constant. Default `2 * pi`.
pub fn explore_factor<T>(c: f32) -> SearchOption<T> {
    SearchOption::new(move |cfg| cfg.explore_factor = c)
}

/// Resumes search from a tree returned by a previous search, instead of
/// starting from an empty root.
pub fn use_continuation<T>(tree: Tree<T>) -> SearchOption<T>
where
    T: 'static,
{
    SearchOption::new(move |cfg| cfg.continuation = Some(tree))
}
