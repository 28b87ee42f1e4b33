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

//! Lights and look-at vectors
//!
//! Directional lights are evaluated against object-space normals. Their
//! directions are pulled into object space once per modelview change (the
//! "dirty" flag) by multiplying with the transposed rotation part of the
//! modelview, then normalized. The last active light is the ambient term.

use glam::{Mat3, Mat4, Vec3};

use crate::core::gbi::RawLight;

/// Directional/positional lights besides the ambient one
pub const MAX_LIGHTS: usize = 7;

/// Default look-at X direction
pub const DEFAULT_LOOKAT_X: [i8; 3] = [127, 0, 0];

/// Default look-at Y direction
pub const DEFAULT_LOOKAT_Y: [i8; 3] = [0, 127, 0];

/// Attenuation coefficients for positional lights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub linear: f32,
    pub quadratic: f32,
}

impl Attenuation {
    #[inline]
    pub fn factor(&self, distance: f32) -> f32 {
        1.0 / (1.0 + self.linear * distance + self.quadratic * distance * distance)
    }
}

/// Light table plus cached object-space coefficients
#[derive(Debug, Clone)]
pub struct LightState {
    lights: [RawLight; MAX_LIGHTS + 1],
    /// Active lights including the ambient one
    num_lights: usize,
    coeffs: [Vec3; MAX_LIGHTS],
    lookat: [[i8; 3]; 2],
    lookat_coeffs: [Vec3; 2],
    dirty: bool,
}

impl Default for LightState {
    fn default() -> Self {
        Self::new()
    }
}

impl LightState {
    pub fn new() -> Self {
        Self {
            lights: [RawLight::default(); MAX_LIGHTS + 1],
            num_lights: 2,
            coeffs: [Vec3::ZERO; MAX_LIGHTS],
            lookat: [DEFAULT_LOOKAT_X, DEFAULT_LOOKAT_Y],
            lookat_coeffs: [Vec3::X, Vec3::Y],
            dirty: true,
        }
    }

    /// One directional light plus ambient, coefficients stale
    pub fn reset(&mut self) {
        self.num_lights = 2;
        self.lookat = [DEFAULT_LOOKAT_X, DEFAULT_LOOKAT_Y];
        self.dirty = true;
    }

    pub fn num_lights(&self) -> usize {
        self.num_lights
    }

    /// Set the active count, ambient included (clamped to 1..=8)
    pub fn set_num_lights(&mut self, count: usize) {
        self.num_lights = count.clamp(1, MAX_LIGHTS + 1);
        self.dirty = true;
    }

    pub fn light(&self, index: usize) -> Option<&RawLight> {
        self.lights.get(index)
    }

    pub fn set_light(&mut self, index: usize, light: RawLight) {
        if let Some(slot) = self.lights.get_mut(index) {
            *slot = light;
            self.dirty = true;
        }
    }

    /// Overwrite the color of one light
    pub fn set_light_color(&mut self, index: usize, color: [u8; 3]) {
        if let Some(slot) = self.lights.get_mut(index) {
            slot.col = color;
            slot.colc = color;
        }
    }

    pub fn lookat(&self, axis: usize) -> Option<[i8; 3]> {
        self.lookat.get(axis).copied()
    }

    pub fn set_lookat(&mut self, axis: usize, dir: [i8; 3]) {
        if axis < 2 {
            self.lookat[axis] = dir;
            self.dirty = true;
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn coefficient(&self, index: usize) -> Vec3 {
        self.coeffs[index]
    }

    /// Recompute object-space coefficients if a matrix changed
    pub fn update_coefficients(&mut self, modelview: &Mat4) {
        if !self.dirty {
            return;
        }
        let to_object = Mat3::from_mat4(*modelview).transpose();
        for i in 0..self.num_lights - 1 {
            self.coeffs[i] = object_direction(&to_object, self.lights[i].dir);
        }
        for axis in 0..2 {
            self.lookat_coeffs[axis] = object_direction(&to_object, self.lookat[axis]);
        }
        self.dirty = false;
    }

    /// Lit vertex color
    ///
    /// `eye_pos` is the vertex after the modelview, needed only for
    /// positional lights.
    pub fn shade(
        &self,
        normal: [i8; 3],
        eye_pos: Vec3,
        modelview: &Mat4,
        attenuation: Attenuation,
    ) -> [u8; 3] {
        let ambient = &self.lights[self.num_lights - 1];
        let mut rgb = [
            ambient.col[0] as f32,
            ambient.col[1] as f32,
            ambient.col[2] as f32,
        ];
        let n = Vec3::new(normal[0] as f32, normal[1] as f32, normal[2] as f32);

        for i in 0..self.num_lights - 1 {
            let light = &self.lights[i];
            let intensity = if light.is_positional() {
                positional_intensity(light, n, eye_pos, modelview, attenuation)
            } else {
                n.dot(self.coeffs[i]) / 127.0
            };
            if intensity > 0.0 {
                for c in 0..3 {
                    rgb[c] += intensity * light.col[c] as f32;
                }
            }
        }

        [
            rgb[0].min(255.0) as u8,
            rgb[1].min(255.0) as u8,
            rgb[2].min(255.0) as u8,
        ]
    }

    /// Projections of a normal onto the two look-at axes, clamped to [-1, 1]
    pub fn lookat_projection(&self, normal: [i8; 3]) -> (f32, f32) {
        let n = Vec3::new(normal[0] as f32, normal[1] as f32, normal[2] as f32);
        let x = (n.dot(self.lookat_coeffs[0]) / 127.0).clamp(-1.0, 1.0);
        let y = (n.dot(self.lookat_coeffs[1]) / 127.0).clamp(-1.0, 1.0);
        (x, y)
    }
}

fn object_direction(to_object: &Mat3, dir: [i8; 3]) -> Vec3 {
    let dir = Vec3::new(dir[0] as f32, dir[1] as f32, dir[2] as f32) / 127.0;
    (*to_object * dir).normalize_or_zero()
}

fn positional_intensity(
    light: &RawLight,
    normal: Vec3,
    eye_pos: Vec3,
    modelview: &Mat4,
    attenuation: Attenuation,
) -> f32 {
    let light_pos = Vec3::new(light.pos[0] as f32, light.pos[1] as f32, light.pos[2] as f32);
    let to_light = light_pos - eye_pos;
    let distance = to_light.length();
    let dir = (Mat3::from_mat4(*modelview).transpose() * to_light).normalize_or_zero();
    normal.dot(dir) / 127.0 * attenuation.factor(distance)
}
