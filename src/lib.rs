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

//! A general-purpose Monte-Carlo tree search engine built around a PUCT
//! (Predictor + UCT) bandit policy.
//!
//! The caller drives the search by supplying a run function
//! (`FnMut(&mut Context<T>)`) which inspects the action path to the current
//! frontier node, optionally proposes new children with priors, and reports
//! one or more experimental outcomes. [`search`] repeatedly selects a
//! frontier using the bandit policy, invokes the run function, expands and
//! backpropagates, until a configured stopping condition is met.
//!
//! ```
//! use puct_search::{search, max_iters};
//!
//! let result = search::<()>(
//!     |ctx| {
//!         if ctx.is_empty() {
//!             ctx.expand(["left", "right"]);
//!         }
//!         ctx.set_result_value(1.0);
//!     },
//!     [max_iters(50)],
//! );
//! assert!(result.iterations > 0);
//! ```

mod context;
mod error;
pub mod fastlog;
mod histogram;
mod node;
mod options;
mod queue;
mod search;
mod stat;
pub mod variation;

pub use context::Context;
pub use error::SearchError;
pub use histogram::{HistBin, Histogram};
pub use node::{Node, NodeId, Tree};
pub use options::{
    done, done_after, expand_shuffle, explore_factor, max_iters, rand_source, use_continuation,
    Config, SearchOption,
};
pub use queue::LazyQueue;
pub use search::{search, SearchResult};
pub use stat::{
    compare_max_stat, compare_min_stat, compare_stat_popularity, compute_search_stats,
    priority_histogram, SearchStats, Stat,
};
