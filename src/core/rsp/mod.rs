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

//! RSP vertex/matrix/lighting pipeline
//!
//! Emulates the geometry half of the console's signal processor:
//! - Modelview stack (max depth 11) and projection with a cached product
//! - Up to 7 directional or positional lights plus ambient
//! - A 64-entry transformed vertex buffer with clip codes, lit colors,
//!   generated texture coordinates and fog
//! - The segment table used to resolve segmented addresses
//!
//! # Clip codes
//!
//! | Bit | Plane          |
//! |-----|----------------|
//! | 0   | x < -w         |
//! | 1   | x > w          |
//! | 2   | y < -w         |
//! | 3   | y > w          |
//! | 4   | near (unused)  |
//! | 5   | z > w          |
//!
//! The near-plane bit is never set. Geometry crossing the near plane is
//! therefore never trivially rejected, matching hardware.

mod lighting;
mod matrix;
mod vertex;

pub use lighting::*;
pub use matrix::*;
pub use vertex::*;

use crate::core::gbi::{ExtraGeometryMode, GeometryMode};

/// Vertices addressable by load commands
pub const VERTEX_BUFFER_SIZE: usize = 64;

/// Extra vertex slots used by rectangle commands
pub const RECT_VERTEX_BASE: usize = VERTEX_BUFFER_SIZE;

/// Number of segment table entries
pub const SEGMENT_COUNT: usize = 16;

/// Geometry-pipeline state
#[derive(Debug, Clone)]
pub struct RspState {
    pub matrices: MatrixStack,
    pub lights: LightState,
    pub geometry_mode: GeometryMode,
    pub extra_geometry_mode: ExtraGeometryMode,

    /// Fog multiplier and offset from the fog move-word
    pub fog_mul: i16,
    pub fog_offset: i16,

    /// Texture coordinate scale (0x10000 = 1.0)
    pub texture_scale: [u16; 2],
    pub texture_on: bool,
    pub texture_tile: u8,
    pub texture_level: u8,

    pub vertices: [Vertex; VERTEX_BUFFER_SIZE + 4],
    pub segments: [u32; SEGMENT_COUNT],

    pub attenuation: Attenuation,
}

impl RspState {
    pub fn new(attenuation: Attenuation) -> Self {
        Self {
            matrices: MatrixStack::new(),
            lights: LightState::new(),
            geometry_mode: GeometryMode::empty(),
            extra_geometry_mode: ExtraGeometryMode::empty(),
            fog_mul: 0,
            fog_offset: 0,
            texture_scale: [0, 0],
            texture_on: false,
            texture_tile: 0,
            texture_level: 0,
            vertices: [Vertex::default(); VERTEX_BUFFER_SIZE + 4],
            segments: [0; SEGMENT_COUNT],
            attenuation,
        }
    }

    /// Per-frame reset: single identity modelview, two lights, lights dirty
    pub fn reset(&mut self) {
        self.matrices.reset();
        self.lights.reset();
        self.extra_geometry_mode = ExtraGeometryMode::empty();
    }

    /// Resolve a segmented address through the segment table
    ///
    /// # Examples
    ///
    /// ```
    /// use ultragfx::core::rsp::{Attenuation, RspState};
    ///
    /// let mut rsp = RspState::new(Attenuation { linear: 0.0, quadratic: 0.0 });
    /// rsp.segments[6] = 0x8020_0000;
    /// assert_eq!(rsp.segmented(0x0600_0100), 0x8020_0100);
    /// assert_eq!(rsp.segmented(0x8000_1000), 0x8000_1000);
    /// ```
    pub fn segmented(&self, addr: u32) -> u32 {
        let segment = ((addr >> 24) & 0x0F) as usize;
        let base = self.segments[segment];
        if base != 0 && (addr >> 28) == 0 {
            base.wrapping_add(addr & 0x00FF_FFFF)
        } else {
            addr
        }
    }

    pub fn set_segment(&mut self, index: usize, base: u32) {
        if let Some(slot) = self.segments.get_mut(index) {
            *slot = base;
        }
    }

    /// Pop the modelview stack and flag lights for recomputation
    pub fn pop_matrices(&mut self, count: usize) {
        if self.matrices.pop(count) {
            self.lights.mark_dirty();
        }
    }

    /// Whether every listed vertex lies outside one common clip plane
    pub fn vertices_rejected(&self, first: usize, last: usize) -> bool {
        if first > last || last >= VERTEX_BUFFER_SIZE {
            return false;
        }
        self.vertices[first..=last]
            .iter()
            .fold(0xFF, |acc, v| acc & v.clip_rej)
            != 0
    }
}

#[cfg(test)]
mod tests;
