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

//! Fixed ascending-threshold bucket counters, used by the `histogram`
//! search option to summarize run counts, scores, or priorities across a
//! finished tree.

/// One bucket: `count` values inserted have all been `<= max`.
#[derive(Debug, Clone, Copy)]
pub struct HistBin {
    pub max: f64,
    pub count: i64,
}

/// A fixed set of ascending bins with running counts.
#[derive(Debug, Clone)]
pub struct Histogram {
    bins: Vec<HistBin>,
}

impl Histogram {
    pub fn new(max_bin_values: impl IntoIterator<Item = f64>) -> Self {
        let bins: Vec<HistBin> = max_bin_values
            .into_iter()
            .map(|max| HistBin { max, count: 0 })
            .collect();
        debug_assert!(!bins.is_empty(), "Histogram requires at least one bin");
        Histogram { bins }
    }

    pub fn bins(&self) -> &[HistBin] {
        &self.bins
    }

    fn bucket_of(&self, x: f64) -> usize {
        self.bins
            .partition_point(|b| b.max < x)
            .min(self.bins.len().saturating_sub(1))
    }

    pub fn insert(&mut self, x: f64) {
        let i = self.bucket_of(x);
        self.bins[i].count += 1;
    }

    pub fn remove(&mut self, x: f64) {
        let i = self.bucket_of(x);
        if self.bins[i].count > 0 {
            self.bins[i].count -= 1;
        }
    }

    /// Run-count bins: powers of two from 0 to 2048, plus `+inf`.
    pub fn run_bins() -> Self {
        Histogram::new([
            0.0, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0, 128.0, 256.0, 512.0, 1024.0, 2048.0,
            f64::INFINITY,
        ])
    }

    /// Score bins spanning `[-1, 1]` in steps of `0.2`, clamped by `+/-inf`.
    pub fn score_bins() -> Self {
        Histogram::new([
            f64::NEG_INFINITY,
            -1.0,
            -0.8,
            -0.6,
            -0.4,
            -0.2,
            0.0,
            0.2,
            0.4,
            0.6,
            0.8,
            1.0,
            f64::INFINITY,
        ])
    }

    /// Priority bins: like `score_bins` scaled by `explore_factor`.
    pub fn priority_bins(explore_factor: f64) -> Self {
        Histogram::new([
            f64::NEG_INFINITY,
            -1.0 * explore_factor,
            -0.8 * explore_factor,
            -0.6 * explore_factor,
            -0.4 * explore_factor,
            -0.2 * explore_factor,
            0.0,
            0.2 * explore_factor,
            0.4 * explore_factor,
            0.6 * explore_factor,
            0.8 * explore_factor,
            1.0 * explore_factor,
            f64::INFINITY,
        ])
    }
}
