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

//! Triangle batching
//!
//! Transformed triangles are written as interleaved floats into one
//! buffer and handed to the backend in as few draw calls as possible:
//! - [`TriangleBatch`] holds up to `capacity` triangles and flushes when
//!   full
//! - [`BoundState`] mirrors what was last sent to the backend and flushes
//!   the batch before anything a pending draw depends on changes
//! - [`cull_triangle`] rejects triangles before they reach the buffer
//! - [`DepthQueries`] batches pixel-depth read-backs once per frame

mod culling;
mod depth;
mod state;

pub use culling::*;
pub use depth::*;
pub use state::*;

use crate::core::backend::RenderingBackend;

/// Accumulated triangles awaiting one draw call
#[derive(Debug)]
pub struct TriangleBatch {
    buf: Vec<f32>,
    num_tris: usize,
    capacity: usize,
    /// Floats per vertex of the triangles currently buffered
    stride: usize,
    draw_calls: u64,
}

impl TriangleBatch {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::new(),
            num_tris: 0,
            capacity: capacity.max(1),
            stride: 0,
            draw_calls: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.num_tris
    }

    pub fn is_empty(&self) -> bool {
        self.num_tris == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Draw calls issued since construction
    pub fn draw_calls(&self) -> u64 {
        self.draw_calls
    }

    /// Append one triangle, three vertices of equal stride
    ///
    /// A change of stride flushes what is buffered first; reaching
    /// capacity flushes afterwards.
    pub fn push<B>(&mut self, backend: &mut B, vertices: &[f32])
    where
        B: RenderingBackend + ?Sized,
    {
        let stride = vertices.len() / 3;
        if stride != self.stride && !self.is_empty() {
            self.flush(backend);
        }
        if self.buf.capacity() == 0 {
            self.buf.reserve(self.capacity * vertices.len());
        }
        self.stride = stride;
        self.buf.extend_from_slice(vertices);
        self.num_tris += 1;

        if self.num_tris == self.capacity {
            self.flush(backend);
        }
    }

    /// Submit buffered triangles, if any
    pub fn flush<B>(&mut self, backend: &mut B)
    where
        B: RenderingBackend + ?Sized,
    {
        if self.num_tris == 0 {
            return;
        }
        log::trace!("Flushing {} triangles", self.num_tris);
        backend.draw_triangles(&self.buf, self.num_tris);
        self.buf.clear();
        self.num_tris = 0;
        self.draw_calls += 1;
    }
}

#[cfg(test)]
mod tests;
