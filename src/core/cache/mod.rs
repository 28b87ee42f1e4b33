// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
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

//! Texture and combiner caches
//!
//! Both caches are owned by one interpreter and hand out backend handles:
//! - [`TextureCache`]: decoded textures keyed by source identity, bounded
//!   and LRU-evicted
//! - [`CombinerCache`]: shader programs keyed by canonical combiner id and
//!   render options, never evicted within a run

mod combiner;
mod texture_cache;

pub use combiner::*;
pub use texture_cache::*;

#[cfg(test)]
mod tests;
