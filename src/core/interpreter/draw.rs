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

//! Triangle and rectangle submission
//!
//! Drawing one triangle:
//! 1. Reject or cull it (rectangles skip this)
//! 2. Bring depth, decal, viewport and scissor up to date
//! 3. Canonicalize the combiner and import the textures it samples
//! 4. Select the program variant for the current options and clamp bits
//! 5. Write the three vertices' attributes into the batch
//!
//! # Vertex layout
//!
//! ```text
//! x y z w                          always
//! u v [clamp_s] [clamp_t]          per sampled texture
//! fog_r fog_g fog_b fog_factor     when fog is on
//! gray_r gray_g gray_b gray_a      when grayscale is on
//! r g b [a]                        per combiner input slot
//! ```

use super::rdp_ops::RectCorners;
use super::Interpreter;
use crate::core::backend::RenderingBackend;
use crate::core::batch::{cull_triangle, SamplerState};
use crate::core::cache::{CombinerInput, CombinerMapping, ShaderOpts};
use crate::core::gbi::{GeometryMode, G_TF_POINT, G_TX_CLAMP, G_TX_MIRROR};
use crate::core::rdp::NativeRect;
use crate::core::resource::ResourceProvider;
use crate::core::rsp::{Vertex, RECT_VERTEX_BASE};

const CLAMP_S: [ShaderOpts; 2] = [ShaderOpts::CLAMP_S0, ShaderOpts::CLAMP_S1];
const CLAMP_T: [ShaderOpts; 2] = [ShaderOpts::CLAMP_T0, ShaderOpts::CLAMP_T1];

#[inline]
fn unit(value: u8) -> f32 {
    value as f32 / 255.0
}

#[inline]
fn unit4(color: [u8; 4]) -> [f32; 4] {
    [unit(color[0]), unit(color[1]), unit(color[2]), unit(color[3])]
}

impl<B: RenderingBackend> Interpreter<B> {
    /// Submit the triangle formed by three vertex-buffer entries
    pub(in crate::core::interpreter) fn draw_triangle(
        &mut self,
        provider: &dyn ResourceProvider,
        indices: [usize; 3],
        is_rect: bool,
    ) {
        let v = indices.map(|i| self.rsp.vertices[i]);

        if !is_rect {
            if let Some(reason) = cull_triangle(
                [&v[0], &v[1], &v[2]],
                self.rsp.geometry_mode,
                self.rsp.extra_geometry_mode,
            ) {
                log::trace!("Dropped triangle {:?}: {:?}", indices, reason);
                self.stats.culled += 1;
                return;
            }
        }

        self.update_depth_and_rects();

        let mapping = self
            .combiners
            .mapping(self.rdp.combine_mode, self.rdp.is_two_cycle());
        let mut options = self.render_options();

        for slot in 0..2 {
            if !mapping.used_textures[slot] {
                continue;
            }
            if self.rdp.textures_changed[slot] {
                self.batch.flush(&mut self.backend);
                self.import_texture(provider, slot);
                self.rdp.textures_changed[slot] = false;
            }
            options |= self.bind_sampler(slot);
        }
        options |= self.blend_options(&mapping);

        let program = self.combiners.program(&mut self.backend, &mapping, options);
        self.bound
            .set_shader(&mut self.batch, &mut self.backend, program);
        let use_alpha = options.contains(ShaderOpts::USE_ALPHA);
        self.bound
            .set_use_alpha(&mut self.batch, &mut self.backend, use_alpha);

        let mut floats = std::mem::take(&mut self.scratch);
        floats.clear();
        for vertex in &v {
            self.push_vertex(&mut floats, vertex, &mapping, options);
        }
        self.batch.push(&mut self.backend, &floats);
        self.scratch = floats;
        self.stats.triangles += 1;
    }

    /// Draw a screen-aligned rectangle through the four extra vertex slots
    ///
    /// `tex_coords` are the S10.5 coordinates of the upper-left,
    /// lower-left, lower-right and upper-right corners; without them the
    /// corners take the fill color.
    pub(in crate::core::interpreter) fn draw_rectangle(
        &mut self,
        provider: &dyn ResourceProvider,
        rect: RectCorners,
        tex_coords: Option<[(i32, i32); 4]>,
    ) {
        let native_w = self.view.native_width as f32;
        let native_h = self.view.native_height as f32;
        let to_x = |x: i32| x as f32 / (4.0 * native_w / 2.0) - 1.0;
        let to_y = |y: i32| -(y as f32 / (4.0 * native_h / 2.0)) + 1.0;

        let positions = [
            (rect.ulx, rect.uly),
            (rect.ulx, rect.lry),
            (rect.lrx, rect.lry),
            (rect.lrx, rect.uly),
        ];
        let fill = fill_color(self.rdp.fill_color);
        for (i, &(x, y)) in positions.iter().enumerate() {
            let vertex = &mut self.rsp.vertices[RECT_VERTEX_BASE + i];
            vertex.x = to_x(x);
            vertex.y = to_y(y);
            vertex.z = -1.0;
            vertex.w = 1.0;
            vertex.clip_rej = 0;
            match tex_coords {
                Some(coords) => {
                    vertex.u = coords[i].0 as f32;
                    vertex.v = coords[i].1 as f32;
                }
                None => vertex.color = fill,
            }
        }

        let saved_mode_h = self.rdp.other_mode_h;
        if self.rdp.is_copy() {
            self.rdp.other_mode_h = (saved_mode_h & !(3 << 12)) | G_TF_POINT;
        }
        let saved_geometry = self.rsp.geometry_mode;
        let saved_viewport = self.rdp.viewport;
        self.rsp.geometry_mode = GeometryMode::empty();
        self.rdp.viewport = NativeRect {
            x: 0.0,
            y: 0.0,
            width: native_w,
            height: native_h,
        };
        self.rdp.viewport_or_scissor_changed = true;

        let base = RECT_VERTEX_BASE;
        self.draw_triangle(provider, [base, base + 1, base + 3], true);
        self.draw_triangle(provider, [base + 1, base + 2, base + 3], true);

        self.rsp.geometry_mode = saved_geometry;
        self.rdp.viewport = saved_viewport;
        self.rdp.viewport_or_scissor_changed = true;
        self.rdp.other_mode_h = saved_mode_h;
    }

    fn update_depth_and_rects(&mut self) {
        let depth_test = self.rsp.geometry_mode.contains(GeometryMode::ZBUFFER);
        let depth_mask = self.rdp.depth_update();
        self.bound
            .set_depth(&mut self.batch, &mut self.backend, depth_test, depth_mask);
        let decal = self.rdp.zmode_decal();
        self.bound
            .set_decal(&mut self.batch, &mut self.backend, decal);

        if self.rdp.viewport_or_scissor_changed {
            let bottom_left = self.backend.origin_bottom_left();
            let viewport = self.framebuffers.remap(self.rdp.viewport, bottom_left);
            let scissor = self.framebuffers.remap(self.rdp.scissor, bottom_left);
            self.bound
                .set_viewport(&mut self.batch, &mut self.backend, viewport);
            self.bound
                .set_scissor(&mut self.batch, &mut self.backend, scissor);
            self.rdp.viewport_or_scissor_changed = false;
        }
    }

    /// Option bits that follow from the render modes
    fn render_options(&self) -> ShaderOpts {
        let mut options = ShaderOpts::empty();
        options.set(ShaderOpts::USE_ALPHA, self.rdp.use_alpha());
        options.set(ShaderOpts::USE_FOG, self.rdp.use_fog());
        options.set(ShaderOpts::TEXTURE_EDGE, self.rdp.texture_edge());
        options.set(ShaderOpts::USE_NOISE, self.rdp.use_noise());
        options.set(ShaderOpts::TWO_CYCLE, self.rdp.is_two_cycle());
        options.set(ShaderOpts::ALPHA_THRESHOLD, self.rdp.alpha_threshold());
        options.set(ShaderOpts::GRAYSCALE, self.grayscale);
        options.set(ShaderOpts::INVISIBLE, self.rdp.invisible());
        match self.custom_shader {
            Some(index) => options.with_custom_shader(index),
            None => options,
        }
    }

    /// Send the sampler of `slot`, returning the clamp bits the shader needs
    ///
    /// When a tile asks for wrapping or mirroring but its declared extent
    /// differs from the loaded one, wrapping would show the unloaded
    /// texels; clamping is done in the shader instead.
    fn bind_sampler(&mut self, slot: usize) -> ShaderOpts {
        let tile = self.rdp.tiles[(self.rsp.texture_tile as usize + slot) & 7];
        let (width, height) = self.texture_sizes[slot];
        let mut options = ShaderOpts::empty();
        let mut cms = tile.cms;
        let mut cmt = tile.cmt;

        if tile.width() != width << (cms & G_TX_MIRROR) {
            options |= CLAMP_S[slot];
            cms &= !G_TX_CLAMP;
        }
        if tile.height() != height << (cmt & G_TX_MIRROR) {
            options |= CLAMP_T[slot];
            cmt &= !G_TX_CLAMP;
        }

        let sampler = SamplerState {
            linear: self.rdp.linear_filter(),
            cms,
            cmt,
        };
        self.bound
            .set_sampler(&mut self.batch, &mut self.backend, slot, sampler);
        options
    }

    fn push_vertex(
        &self,
        out: &mut Vec<f32>,
        v: &Vertex,
        mapping: &CombinerMapping,
        options: ShaderOpts,
    ) {
        let z = if self.backend.z_is_from_0_to_1() {
            (v.z + v.w) / 2.0
        } else {
            v.z
        };
        out.extend_from_slice(&[v.x, v.y, z, v.w]);

        for slot in 0..2 {
            if !mapping.used_textures[slot] {
                continue;
            }
            let tile = self.rdp.tiles[(self.rsp.texture_tile as usize + slot) & 7];
            let (width, height) = self.texture_sizes[slot];
            let (width, height) = (width.max(1) as f32, height.max(1) as f32);

            let mut u = v.u / 32.0;
            let mut t = v.v / 32.0;
            u = apply_shift(u, tile.shifts);
            t = apply_shift(t, tile.shiftt);
            u -= tile.uls as f32 / 4.0;
            t -= tile.ult as f32 / 4.0;
            if self.rdp.linear_filter() {
                u += 0.5;
                t += 0.5;
            }
            out.push(u / width);
            out.push(t / height);
            if options.contains(CLAMP_S[slot]) {
                out.push((width - 0.5) / width);
            }
            if options.contains(CLAMP_T[slot]) {
                out.push((height - 0.5) / height);
            }
        }

        let use_fog = options.contains(ShaderOpts::USE_FOG);
        if use_fog {
            let fog = unit4(self.rdp.fog_color);
            out.extend_from_slice(&[fog[0], fog[1], fog[2], unit(v.color[3])]);
        }
        if options.contains(ShaderOpts::GRAYSCALE) {
            out.extend_from_slice(&unit4(self.grayscale_color));
        }

        let use_alpha = options.contains(ShaderOpts::USE_ALPHA);
        let lod = self.lod_fraction(v.w);
        for i in 0..mapping.num_inputs as usize {
            let rgb = self.input_color(mapping.inputs[0][i], v, lod);
            out.extend_from_slice(&rgb[..3]);
            if use_alpha {
                let input = mapping.inputs[1][i];
                let alpha = if use_fog && input == CombinerInput::Shade {
                    // Shade alpha holds the fog factor
                    1.0
                } else {
                    self.input_color(input, v, lod)[3]
                };
                out.push(alpha);
            }
        }
    }

    /// Distance-based level-of-detail fraction
    fn lod_fraction(&self, w: f32) -> f32 {
        let distance = self.config.lod_distance;
        ((w - distance) / distance).clamp(0.0, 1.0)
    }

    fn input_color(&self, input: CombinerInput, v: &Vertex, lod: f32) -> [f32; 4] {
        let splat = |value: f32| [value; 4];
        match input {
            CombinerInput::Prim => unit4(self.rdp.prim_color),
            CombinerInput::PrimAlpha => splat(unit(self.rdp.prim_color[3])),
            CombinerInput::Shade => unit4(v.color),
            CombinerInput::ShadeAlpha => splat(unit(v.color[3])),
            CombinerInput::Env => unit4(self.rdp.env_color),
            CombinerInput::EnvAlpha => splat(unit(self.rdp.env_color[3])),
            CombinerInput::LodFraction => splat(lod),
            CombinerInput::PrimLodFraction => splat(unit(self.rdp.prim_lod_fraction)),
            CombinerInput::One => splat(1.0),
            _ => splat(0.0),
        }
    }
}

/// Texture coordinate after a tile's shift (1..=10 shift right, 11..=15 left)
fn apply_shift(coord: f32, shift: u8) -> f32 {
    match shift {
        0 => coord,
        1..=10 => coord / (1u32 << shift) as f32,
        _ => coord * (1u32 << (16 - shift.min(16))) as f32,
    }
}

/// RGBA8 of the packed RGBA5551 fill color
fn fill_color(packed: u32) -> [u8; 4] {
    crate::core::gbi::rgba5551_to_rgba8(packed as u16)
}
