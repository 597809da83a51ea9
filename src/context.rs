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

use anyhow::Error as AnyError;

use crate::error::SearchError;

/// Flags carried by a [`Context`] between the search loop and the run
/// function for a single visit.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ContextFlags {
    pub(crate) exhausted: bool,
    pub(crate) minimize: bool,
    pub(crate) maximize: bool,
}

/// Handed to the run function on every visit to a frontier node.
///
/// Exposes the action path leading to the frontier, lets the run function
/// propose new children with optional priors, report an experimental
/// outcome, set the node's objective direction, and read or replace the
/// frontier's user payload.
pub struct Context<'a, T> {
    actions: &'a [String],
    payload: Option<&'a mut Option<T>>,

    expand: Vec<String>,
    priors: Vec<f32>,
    flags: ContextFlags,

    count: f32,
    value: f32,

    done: bool,
    err: Option<SearchError>,
}

impl<'a, T> Context<'a, T> {
    pub(crate) fn new(actions: &'a [String], payload: Option<&'a mut Option<T>>) -> Self {
        Context {
            actions,
            payload,
            expand: Vec::new(),
            priors: Vec::new(),
            flags: ContextFlags::default(),
            count: 0.0,
            value: 0.0,
            done: false,
            err: None,
        }
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<f32>, ContextFlags, f32, f32, bool, Option<SearchError>) {
        (self.expand, self.priors, self.flags, self.value, self.count, self.done, self.err)
    }

    /// Number of actions from the root to the current frontier.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Actions from the root up to (not including) the current node.
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(String::as_str)
    }

    /// Action at `i`, or `""` if out of range.
    pub fn action_at(&self, i: usize) -> &str {
        self.actions.get(i).map(String::as_str).unwrap_or("")
    }

    /// Stops the search immediately with [`SearchError::Stopped`].
    pub fn stop(&mut self) {
        self.stop_err(SearchError::Stopped);
    }

    /// Stops the search immediately with a caller-supplied error.
    pub fn stop_err(&mut self, err: impl Into<AnyError>) {
        self.done = true;
        self.err = Some(match err.into().downcast::<SearchError>() {
            Ok(e) => e,
            Err(e) => SearchError::Other(e),
        });
    }

    /// Appends actions to the expand set without exhausting the node,
    /// allowing it to be partially expanded across repeated visits.
    pub fn append(&mut self, actions: impl IntoIterator<Item = impl Into<String>>) {
        self.expand.extend(actions.into_iter().map(Into::into));
    }

    /// Appends actions to the expand set and marks the node exhausted: it
    /// will not be expanded from again, though it still receives priority
    /// updates via backpropagation.
    pub fn expand(&mut self, actions: impl IntoIterator<Item = impl Into<String>>) {
        self.append(actions);
        self.flags.exhausted = true;
    }

    /// Unnormalized priors for the actions passed to `expand`/`append`,
    /// one-to-one. Missing entries default to `1.0`.
    pub fn priors(&mut self, priors: impl IntoIterator<Item = f32>) {
        self.priors.extend(priors);
    }

    /// Sets the objective direction of the current node (and, by
    /// inheritance, its as-yet-unallocated children) to minimize.
    pub fn minimize(&mut self) {
        self.flags.minimize = true;
        self.flags.maximize = false;
    }

    /// Sets the objective direction of the current node to maximize (the
    /// default).
    pub fn maximize(&mut self) {
        self.flags.maximize = true;
        self.flags.minimize = false;
    }

    /// Sets the experiment result to an explicit value and count.
    pub fn set_result(&mut self, value: f32, count: f32) {
        self.value = value;
        self.count = count;
    }

    /// Sets the experiment result to an explicit value from a single run.
    pub fn set_result_value(&mut self, value: f32) {
        self.set_result(value, 1.0);
    }

    /// Adds to the experiment result and increments the run count by one.
    pub fn add_result_value(&mut self, value: f32) {
        self.add_result(value, 1.0);
    }

    /// Adds to the experiment result and count.
    pub fn add_result(&mut self, value: f32, count: f32) {
        self.value += value;
        self.count += count;
    }

    /// Adds to the experiment value only.
    pub fn add_value(&mut self, value: f32) {
        self.value += value;
    }

    /// Adds to the experiment run count only.
    pub fn add_count(&mut self, count: f32) {
        self.count += count;
    }

    /// The current frontier node's user payload, if any.
    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref().and_then(|p| p.as_ref())
    }

    /// Mutable access to the current frontier node's user payload.
    pub fn payload_mut(&mut self) -> Option<&mut T> {
        self.payload.as_mut().and_then(|p| p.as_mut())
    }

    /// Replaces the current frontier node's user payload.
    pub fn set_payload(&mut self, value: Option<T>) {
        if let Some(slot) = self.payload.as_mut() {
            **slot = value;
        }
    }
}
