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

//! Graphics device contract
//!
//! The interpreter drives a modern graphics API through [`RenderingBackend`].
//! Every call is synchronous from the interpreter's point of view; whatever
//! the device does asynchronously stays behind this boundary.
//!
//! Backends never hold a reference back to the interpreter. What they need
//! to know about the current frame arrives as a [`FrameView`].

mod recording;

pub use recording::{BackendCall, RecordingBackend};

/// Backend texture object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

/// Backend shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderHandle(pub u32);

/// Backend render target; id 0 is the swap target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FramebufferId(pub u32);

impl FramebufferId {
    pub const PRIMARY: FramebufferId = FramebufferId(0);
}

/// Rectangle in backend pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Read-only description of the frame being rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameView {
    /// Output width in backend pixels
    pub width: u32,
    /// Output height in backend pixels
    pub height: u32,
    /// Console-native width
    pub native_width: u32,
    /// Console-native height
    pub native_height: u32,
    /// Window-chrome offset applied when drawing into the swap target
    pub offset_x: i32,
    pub offset_y: i32,
}

impl FrameView {
    pub fn new(width: u32, height: u32, native_width: u32, native_height: u32) -> Self {
        Self {
            width,
            height,
            native_width,
            native_height,
            offset_x: 0,
            offset_y: 0,
        }
    }
}

/// Everything a backend needs to compile one combiner program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderDesc {
    /// Canonical combiner id
    pub shader_id: u64,
    /// Render option bits, clamp bits included
    pub option_id: u32,
    /// Number of per-vertex input slots
    pub num_inputs: u8,
    /// Texture units sampled by the program
    pub used_textures: [bool; 2],
}

/// Graphics device operations consumed by the interpreter
pub trait RenderingBackend {
    fn name(&self) -> &str;

    /// Clip-space depth runs 0..1 instead of -1..1
    fn z_is_from_0_to_1(&self) -> bool;

    /// Framebuffer row 0 is the bottom row
    fn origin_bottom_left(&self) -> bool;

    fn start_frame(&mut self, view: &FrameView);
    fn end_frame(&mut self);

    fn new_texture(&mut self) -> TextureHandle;
    fn delete_texture(&mut self, texture: TextureHandle);
    fn select_texture(&mut self, slot: usize, texture: TextureHandle);
    /// Upload RGBA8 pixels into the texture selected last
    fn upload_texture(&mut self, rgba: &[u8], width: u32, height: u32);
    fn set_sampler_parameters(&mut self, slot: usize, linear: bool, cms: u8, cmt: u8);

    fn lookup_shader(&mut self, shader_id: u64, option_id: u32) -> Option<ShaderHandle>;
    fn create_shader(&mut self, desc: &ShaderDesc) -> ShaderHandle;
    fn load_shader(&mut self, shader: ShaderHandle);
    fn unload_shader(&mut self, shader: ShaderHandle);

    fn set_depth_test_and_mask(&mut self, depth_test: bool, depth_mask: bool);
    fn set_zmode_decal(&mut self, decal: bool);
    fn set_viewport(&mut self, rect: Rect);
    fn set_scissor(&mut self, rect: Rect);
    fn set_use_alpha(&mut self, use_alpha: bool);

    /// Draw `num_tris` triangles from an interleaved float buffer
    fn draw_triangles(&mut self, buf: &[f32], num_tris: usize);

    fn create_framebuffer(&mut self) -> FramebufferId;
    fn update_framebuffer_parameters(
        &mut self,
        fb: FramebufferId,
        width: u32,
        height: u32,
        msaa_level: u32,
    );
    fn start_draw_to_framebuffer(&mut self, fb: FramebufferId);
    fn clear_framebuffer(&mut self);
    fn resolve_msaa(&mut self, dst: FramebufferId, src: FramebufferId);
    fn copy_framebuffer(
        &mut self,
        dst: FramebufferId,
        src: FramebufferId,
        src_rect: Rect,
        dst_rect: Rect,
    );
    /// Read RGBA5551 pixels of a framebuffer
    fn read_framebuffer_to_cpu(&mut self, fb: FramebufferId, width: u32, height: u32) -> Vec<u16>;
    fn select_texture_fb(&mut self, slot: usize, fb: FramebufferId);

    /// Depth values at window coordinates, in request order
    fn get_pixel_depth(&mut self, fb: FramebufferId, coords: &[(f32, f32)]) -> Vec<f32>;
}
