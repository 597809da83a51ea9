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

use thiserror::Error;

/// An error raised by, or surfaced through, a running search.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The run function called [`crate::Context::stop`].
    #[error("search stopped")]
    Stopped,

    /// The run function called [`crate::Context::stop_err`] with a caller error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
