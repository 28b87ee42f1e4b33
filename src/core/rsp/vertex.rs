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

//! Vertex transform

use glam::Vec4;

use super::{RspState, VERTEX_BUFFER_SIZE};
use crate::core::gbi::{GeometryMode, Vtx};

pub const CLIP_X_NEG: u8 = 0x01;
pub const CLIP_X_POS: u8 = 0x02;
pub const CLIP_Y_NEG: u8 = 0x04;
pub const CLIP_Y_POS: u8 = 0x08;
pub const CLIP_Z_NEG: u8 = 0x10;
pub const CLIP_Z_POS: u8 = 0x20;

/// Transformed vertex in the vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    /// Clip-space position
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
    /// Texture coordinates in S10.5 texel units
    pub u: f32,
    pub v: f32,
    /// Color; alpha holds the fog factor while fog is enabled
    pub color: [u8; 4],
    /// Clip-rejection bits
    pub clip_rej: u8,
}

/// Clip codes of a clip-space position (near plane never tested)
///
/// # Examples
///
/// ```
/// use ultragfx::core::rsp::{clip_codes, CLIP_X_POS, CLIP_Z_POS};
///
/// assert_eq!(clip_codes(2.0, 0.0, 0.0, 1.0), CLIP_X_POS);
/// assert_eq!(clip_codes(0.0, 0.0, -5.0, 1.0), 0);
/// assert_eq!(clip_codes(0.0, 0.0, 5.0, 1.0), CLIP_Z_POS);
/// ```
#[inline]
pub fn clip_codes(x: f32, y: f32, z: f32, w: f32) -> u8 {
    let mut codes = 0;
    if x < -w {
        codes |= CLIP_X_NEG;
    }
    if x > w {
        codes |= CLIP_X_POS;
    }
    if y < -w {
        codes |= CLIP_Y_NEG;
    }
    if y > w {
        codes |= CLIP_Y_POS;
    }
    if z > w {
        codes |= CLIP_Z_POS;
    }
    codes
}

impl RspState {
    /// Transform `src` into the vertex buffer starting at `dest`
    ///
    /// Entries that would run past the buffer are dropped.
    pub fn load_vertices(&mut self, src: &[Vtx], dest: usize) {
        if dest >= VERTEX_BUFFER_SIZE {
            log::warn!("Vertex load at index {} outside the buffer", dest);
            return;
        }
        let count = src.len().min(VERTEX_BUFFER_SIZE - dest);
        if count < src.len() {
            log::warn!(
                "Vertex load of {} at {} truncated to {}",
                src.len(),
                dest,
                count
            );
        }

        if self
            .geometry_mode
            .intersects(GeometryMode::LIGHTING | GeometryMode::TEXTURE_GEN)
        {
            self.lights.update_coefficients(self.matrices.modelview());
        }

        for (i, vtx) in src[..count].iter().enumerate() {
            self.vertices[dest + i] = self.transform_vertex(vtx);
        }
    }

    /// Run one vertex through transform, lighting, texgen and fog
    pub fn transform_vertex(&self, vtx: &Vtx) -> Vertex {
        let ob = Vec4::new(vtx.ob[0] as f32, vtx.ob[1] as f32, vtx.ob[2] as f32, 1.0);
        let clip = *self.matrices.mvp() * ob;

        let mut out = Vertex {
            x: clip.x,
            y: clip.y,
            z: clip.z,
            w: clip.w,
            clip_rej: clip_codes(clip.x, clip.y, clip.z, clip.w),
            color: vtx.cn,
            ..Vertex::default()
        };

        let [scale_s, scale_t] = self.texture_scale;
        if self.geometry_mode.contains(GeometryMode::LIGHTING) {
            let normal = vtx.normal();
            let eye = (*self.matrices.modelview() * ob).truncate();
            let rgb = self
                .lights
                .shade(normal, eye, self.matrices.modelview(), self.attenuation);
            out.color = [rgb[0], rgb[1], rgb[2], vtx.cn[3]];

            if self.geometry_mode.contains(GeometryMode::TEXTURE_GEN) {
                let (mut dx, mut dy) = self.lights.lookat_projection(normal);
                if self.geometry_mode.contains(GeometryMode::TEXTURE_GEN_LINEAR) {
                    dx = (-dx).acos() / 4.0;
                    dy = (-dy).acos() / 4.0;
                } else {
                    dx = (dx + 1.0) / 4.0;
                    dy = (dy + 1.0) / 4.0;
                }
                out.u = (dx * scale_s as f32).trunc();
                out.v = (dy * scale_t as f32).trunc();
            } else {
                out.u = scaled_tc(vtx.tc[0], scale_s);
                out.v = scaled_tc(vtx.tc[1], scale_t);
            }
        } else {
            out.u = scaled_tc(vtx.tc[0], scale_s);
            out.v = scaled_tc(vtx.tc[1], scale_t);
        }

        if self.geometry_mode.contains(GeometryMode::FOG) {
            out.color[3] = self.fog_factor(clip.z, clip.w);
        }

        out
    }

    /// Fog factor stored in place of vertex alpha
    pub fn fog_factor(&self, z: f32, w: f32) -> u8 {
        let w = if w.abs() < 0.001 {
            0.001f32.copysign(w)
        } else {
            w
        };
        let mut winv = 1.0 / w;
        if winv < 0.0 {
            winv = 32767.0;
        }
        let fog = z * winv * self.fog_mul as f32 + self.fog_offset as f32;
        fog.clamp(0.0, 255.0) as u8
    }
}

#[inline]
fn scaled_tc(tc: i16, scale: u16) -> f32 {
    ((tc as i32 * scale as i32) >> 16) as f32
}
