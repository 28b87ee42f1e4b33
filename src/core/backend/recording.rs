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

//! Headless backend that records every call
//!
//! Used by the CLI to replay scenes without a GPU and by the tests to
//! observe exactly what the interpreter asked the device to do.

use std::collections::HashMap;

use super::{
    FrameView, FramebufferId, Rect, RenderingBackend, ShaderDesc, ShaderHandle, TextureHandle,
};

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    StartFrame(FrameView),
    EndFrame,
    NewTexture(TextureHandle),
    DeleteTexture(TextureHandle),
    SelectTexture { slot: usize, texture: TextureHandle },
    UploadTexture { width: u32, height: u32, rgba: Vec<u8> },
    SetSampler { slot: usize, linear: bool, cms: u8, cmt: u8 },
    CreateShader(ShaderDesc, ShaderHandle),
    LoadShader(ShaderHandle),
    UnloadShader(ShaderHandle),
    SetDepth { test: bool, mask: bool },
    SetZmodeDecal(bool),
    SetViewport(Rect),
    SetScissor(Rect),
    SetUseAlpha(bool),
    DrawTriangles { num_tris: usize, buf: Vec<f32> },
    CreateFramebuffer(FramebufferId),
    UpdateFramebuffer { fb: FramebufferId, width: u32, height: u32, msaa_level: u32 },
    StartDrawToFramebuffer(FramebufferId),
    ClearFramebuffer,
    ResolveMsaa { dst: FramebufferId, src: FramebufferId },
    CopyFramebuffer { dst: FramebufferId, src: FramebufferId },
    ReadFramebuffer(FramebufferId),
    SelectTextureFb { slot: usize, fb: FramebufferId },
    GetPixelDepth(Vec<(f32, f32)>),
}

/// Recording backend
///
/// # Examples
///
/// ```
/// use ultragfx::core::backend::{RecordingBackend, RenderingBackend};
///
/// let mut backend = RecordingBackend::new();
/// let texture = backend.new_texture();
/// backend.select_texture(0, texture);
/// backend.upload_texture(&[0; 4], 1, 1);
/// assert_eq!(backend.texture_uploads(), 1);
/// ```
#[derive(Debug)]
pub struct RecordingBackend {
    calls: Vec<BackendCall>,
    next_texture: u32,
    next_shader: u32,
    next_framebuffer: u32,
    shaders: HashMap<(u64, u32), ShaderHandle>,
    z_0_to_1: bool,
    bottom_left: bool,
    depth_value: f32,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            next_texture: 1,
            next_shader: 1,
            next_framebuffer: 1,
            shaders: HashMap::new(),
            z_0_to_1: false,
            bottom_left: true,
            depth_value: 1.0,
        }
    }

    /// Report a 0..1 clip-space depth range
    pub fn with_z_range_0_to_1(mut self, enabled: bool) -> Self {
        self.z_0_to_1 = enabled;
        self
    }

    /// Report a top-left framebuffer origin
    pub fn with_top_left_origin(mut self) -> Self {
        self.bottom_left = false;
        self
    }

    /// Depth returned by every pixel-depth query
    pub fn with_depth_value(mut self, depth: f32) -> Self {
        self.depth_value = depth;
        self
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Triangle counts of every draw call, in submission order
    pub fn draw_batches(&self) -> Vec<usize> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::DrawTriangles { num_tris, .. } => Some(*num_tris),
                _ => None,
            })
            .collect()
    }

    pub fn draw_calls(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::DrawTriangles { .. }))
    }

    pub fn texture_uploads(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::UploadTexture { .. }))
    }

    pub fn textures_created(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::NewTexture(_)))
    }

    pub fn shaders_created(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::CreateShader(..)))
    }

    /// Last uploaded texture, if any
    pub fn last_upload(&self) -> Option<(u32, u32, &[u8])> {
        self.calls.iter().rev().find_map(|call| match call {
            BackendCall::UploadTexture { width, height, rgba } => {
                Some((*width, *height, rgba.as_slice()))
            }
            _ => None,
        })
    }

    fn count(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.iter().filter(|call| pred(call)).count()
    }
}

impl RenderingBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn z_is_from_0_to_1(&self) -> bool {
        self.z_0_to_1
    }

    fn origin_bottom_left(&self) -> bool {
        self.bottom_left
    }

    fn start_frame(&mut self, view: &FrameView) {
        self.calls.push(BackendCall::StartFrame(*view));
    }

    fn end_frame(&mut self) {
        self.calls.push(BackendCall::EndFrame);
    }

    fn new_texture(&mut self) -> TextureHandle {
        let texture = TextureHandle(self.next_texture);
        self.next_texture += 1;
        self.calls.push(BackendCall::NewTexture(texture));
        texture
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        self.calls.push(BackendCall::DeleteTexture(texture));
    }

    fn select_texture(&mut self, slot: usize, texture: TextureHandle) {
        self.calls.push(BackendCall::SelectTexture { slot, texture });
    }

    fn upload_texture(&mut self, rgba: &[u8], width: u32, height: u32) {
        self.calls.push(BackendCall::UploadTexture {
            width,
            height,
            rgba: rgba.to_vec(),
        });
    }

    fn set_sampler_parameters(&mut self, slot: usize, linear: bool, cms: u8, cmt: u8) {
        self.calls.push(BackendCall::SetSampler {
            slot,
            linear,
            cms,
            cmt,
        });
    }

    fn lookup_shader(&mut self, shader_id: u64, option_id: u32) -> Option<ShaderHandle> {
        self.shaders.get(&(shader_id, option_id)).copied()
    }

    fn create_shader(&mut self, desc: &ShaderDesc) -> ShaderHandle {
        let shader = ShaderHandle(self.next_shader);
        self.next_shader += 1;
        self.shaders.insert((desc.shader_id, desc.option_id), shader);
        self.calls.push(BackendCall::CreateShader(*desc, shader));
        shader
    }

    fn load_shader(&mut self, shader: ShaderHandle) {
        self.calls.push(BackendCall::LoadShader(shader));
    }

    fn unload_shader(&mut self, shader: ShaderHandle) {
        self.calls.push(BackendCall::UnloadShader(shader));
    }

    fn set_depth_test_and_mask(&mut self, depth_test: bool, depth_mask: bool) {
        self.calls.push(BackendCall::SetDepth {
            test: depth_test,
            mask: depth_mask,
        });
    }

    fn set_zmode_decal(&mut self, decal: bool) {
        self.calls.push(BackendCall::SetZmodeDecal(decal));
    }

    fn set_viewport(&mut self, rect: Rect) {
        self.calls.push(BackendCall::SetViewport(rect));
    }

    fn set_scissor(&mut self, rect: Rect) {
        self.calls.push(BackendCall::SetScissor(rect));
    }

    fn set_use_alpha(&mut self, use_alpha: bool) {
        self.calls.push(BackendCall::SetUseAlpha(use_alpha));
    }

    fn draw_triangles(&mut self, buf: &[f32], num_tris: usize) {
        self.calls.push(BackendCall::DrawTriangles {
            num_tris,
            buf: buf.to_vec(),
        });
    }

    fn create_framebuffer(&mut self) -> FramebufferId {
        let fb = FramebufferId(self.next_framebuffer);
        self.next_framebuffer += 1;
        self.calls.push(BackendCall::CreateFramebuffer(fb));
        fb
    }

    fn update_framebuffer_parameters(
        &mut self,
        fb: FramebufferId,
        width: u32,
        height: u32,
        msaa_level: u32,
    ) {
        self.calls.push(BackendCall::UpdateFramebuffer {
            fb,
            width,
            height,
            msaa_level,
        });
    }

    fn start_draw_to_framebuffer(&mut self, fb: FramebufferId) {
        self.calls.push(BackendCall::StartDrawToFramebuffer(fb));
    }

    fn clear_framebuffer(&mut self) {
        self.calls.push(BackendCall::ClearFramebuffer);
    }

    fn resolve_msaa(&mut self, dst: FramebufferId, src: FramebufferId) {
        self.calls.push(BackendCall::ResolveMsaa { dst, src });
    }

    fn copy_framebuffer(
        &mut self,
        dst: FramebufferId,
        src: FramebufferId,
        _src_rect: Rect,
        _dst_rect: Rect,
    ) {
        self.calls.push(BackendCall::CopyFramebuffer { dst, src });
    }

    fn read_framebuffer_to_cpu(&mut self, fb: FramebufferId, width: u32, height: u32) -> Vec<u16> {
        self.calls.push(BackendCall::ReadFramebuffer(fb));
        vec![0; (width * height) as usize]
    }

    fn select_texture_fb(&mut self, slot: usize, fb: FramebufferId) {
        self.calls.push(BackendCall::SelectTextureFb { slot, fb });
    }

    fn get_pixel_depth(&mut self, _fb: FramebufferId, coords: &[(f32, f32)]) -> Vec<f32> {
        self.calls.push(BackendCall::GetPixelDepth(coords.to_vec()));
        vec![self.depth_value; coords.len()]
    }
}
