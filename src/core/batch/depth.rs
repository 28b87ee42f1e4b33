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

//! Deferred pixel-depth queries
//!
//! Reading depth back from the device is expensive, so coordinates are
//! collected first and resolved together in one backend call. Each unique
//! coordinate is read at most once per frame.

use std::collections::{BTreeSet, HashMap};

use crate::core::backend::{FramebufferId, RenderingBackend};

type Coord = (u32, u32);

fn key(x: f32, y: f32) -> Coord {
    (x.to_bits(), y.to_bits())
}

/// Pending and resolved depth reads for the current frame
#[derive(Debug, Default)]
pub struct DepthQueries {
    pending: BTreeSet<Coord>,
    resolved: HashMap<Coord, f32>,
}

impl DepthQueries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a read of window coordinate (x, y)
    pub fn request(&mut self, x: f32, y: f32) {
        let coord = key(x, y);
        if !self.resolved.contains_key(&coord) {
            self.pending.insert(coord);
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn resolved(&self) -> usize {
        self.resolved.len()
    }

    /// Read back every pending coordinate in a single backend call
    pub fn resolve<B>(&mut self, backend: &mut B, fb: FramebufferId)
    where
        B: RenderingBackend + ?Sized,
    {
        if self.pending.is_empty() {
            return;
        }
        let coords: Vec<Coord> = std::mem::take(&mut self.pending).into_iter().collect();
        let points: Vec<(f32, f32)> = coords
            .iter()
            .map(|&(x, y)| (f32::from_bits(x), f32::from_bits(y)))
            .collect();
        let depths = backend.get_pixel_depth(fb, &points);
        if depths.len() != coords.len() {
            log::warn!(
                "Depth read-back returned {} values for {} coordinates",
                depths.len(),
                coords.len()
            );
        }
        for (coord, depth) in coords.into_iter().zip(depths) {
            self.resolved.insert(coord, depth);
        }
    }

    /// Depth at (x, y), resolving pending reads if it is not cached yet
    pub fn depth_at<B>(&mut self, backend: &mut B, fb: FramebufferId, x: f32, y: f32) -> f32
    where
        B: RenderingBackend + ?Sized,
    {
        let coord = key(x, y);
        if let Some(&depth) = self.resolved.get(&coord) {
            return depth;
        }
        self.pending.insert(coord);
        self.resolve(backend, fb);
        self.resolved.get(&coord).copied().unwrap_or(1.0)
    }

    /// Start of frame: every cached value is stale
    pub fn clear(&mut self) {
        self.pending.clear();
        self.resolved.clear();
    }
}
