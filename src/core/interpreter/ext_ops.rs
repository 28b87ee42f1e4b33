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

//! Extension command handlers
//!
//! Commands in the 0x20..0x40 range address resources by hash or path
//! instead of console memory, and drive render targets and post effects.
//! Hash operands sit in the record after the command:
//!
//! ```text
//! w0 = opcode | params     w1 = params
//! w0 = hash >> 32          w1 = hash & 0xFFFFFFFF
//! ```
//!
//! A resource that cannot be resolved turns the command into a no-op.

use std::sync::Arc;

use super::rsp_ops::vertex_range;
use super::{BlendedTexture, Flow, Interpreter};
use crate::core::backend::{FramebufferId, RenderingBackend};
use crate::core::dlist::Cursor;
use crate::core::error::GfxError;
use crate::core::gbi::{get_cmd, unpack_rgba, ExtOp, ExtraGeometryMode, Gfx, Ucode};
use crate::core::rdp::TexAddr;
use crate::core::resource::{
    DisplayListResource, Resource, ResourceProvider, TextureResource, VertexResource,
};

fn not_found(what: impl std::fmt::Display) -> GfxError {
    GfxError::ResourceNotFound(what.to_string())
}

impl<B: RenderingBackend> Interpreter<B> {
    pub(in crate::core::interpreter) fn ext_op(
        &mut self,
        provider: &dyn ResourceProvider,
        op: ExtOp,
        cmd: Gfx,
    ) -> Flow {
        let Gfx { w0, w1 } = cmd;
        match op {
            ExtOp::SetTimgHash => {
                let texture = self.next_hash(provider).and_then(|hash| {
                    resolve_texture(provider.resolve_hash(hash), || format!("{:016X}", hash))
                });
                if let Some(texture) = texture {
                    self.set_texture_resource(w0, texture);
                }
            }
            ExtOp::SetTimgPath => {
                let texture = self
                    .read_path(provider, w1)
                    .and_then(|path| resolve_texture(provider.resolve_path(&path), || path));
                if let Some(texture) = texture {
                    self.set_texture_resource(w0, texture);
                }
            }
            ExtOp::SetTimgFb => {
                self.batch.flush(&mut self.backend);
                self.rdp.fb_textures[0] = Some(FramebufferId(w1));
                self.rdp.textures_changed[0] = true;
            }
            ExtOp::VtxHash => {
                let vertices = self.next_hash(provider).and_then(|hash| {
                    resolve_vertices(provider.resolve_hash(hash), || format!("{:016X}", hash))
                });
                if let Some(vertices) = vertices {
                    self.load_vertex_resource(w0, &vertices, w1 as usize);
                }
            }
            ExtOp::VtxPath => {
                let vertices = self
                    .read_path(provider, w1)
                    .and_then(|path| resolve_vertices(provider.resolve_path(&path), || path));
                if let Some(vertices) = vertices {
                    self.load_vertex_resource(w0, &vertices, 0);
                }
            }
            ExtOp::DlHash => {
                let list = self.next_hash(provider).and_then(|hash| {
                    resolve_list(provider.resolve_hash(hash), || format!("{:016X}", hash))
                });
                if let Some(list) = list {
                    return self.enter_list(w0, list);
                }
            }
            ExtOp::DlPath => {
                let list = self
                    .read_path(provider, w1)
                    .and_then(|path| resolve_list(provider.resolve_path(&path), || path));
                if let Some(list) = list {
                    return self.enter_list(w0, list);
                }
            }
            ExtOp::SetFb => {
                self.batch.flush(&mut self.backend);
                if self
                    .framebuffers
                    .set_target(&mut self.backend, FramebufferId(w1))
                {
                    self.backend.clear_framebuffer();
                    self.target_switched();
                }
            }
            ExtOp::ResetFb => {
                self.batch.flush(&mut self.backend);
                self.framebuffers.reset_target(&mut self.backend);
                self.target_switched();
            }
            ExtOp::CopyFb => {
                self.batch.flush(&mut self.backend);
                let dst = FramebufferId(w0 & 0xFFFF);
                self.framebuffers
                    .copy(&mut self.backend, dst, FramebufferId(w1));
            }
            ExtOp::ReadFb => {
                self.batch.flush(&mut self.backend);
                let pixels = self
                    .framebuffers
                    .read(&mut self.backend, FramebufferId(w0 & 0xFFFF));
                self.readbacks.insert(w1, pixels);
            }
            ExtOp::Marker => {
                if let Some(label) = self.read_path(provider, w1) {
                    log::trace!("Marker: {}", label);
                }
            }
            ExtOp::InvalidateTexCache => {
                if w1 == 0 {
                    self.textures.clear();
                } else {
                    let addr = TexAddr::Raw(self.rsp.segmented(w1));
                    let removed = self.textures.delete_by_address(addr);
                    log::trace!("Invalidated {} textures at {:?}", removed, addr);
                }
                self.rdp.textures_changed = [true; 2];
            }
            ExtOp::LoadShader => {
                self.custom_shader = (w0 & 1 != 0).then_some((w1 & 0xFF) as u8);
            }
            ExtOp::SetGrayscale => self.grayscale = w1 != 0,
            ExtOp::SetIntensity => self.grayscale_color = unpack_rgba(w1),
            ExtOp::ExtraGeometryMode => {
                let clear = ExtraGeometryMode::from_bits_truncate(w0 & 0x00FF_FFFF);
                let set = ExtraGeometryMode::from_bits_truncate(w1);
                self.rsp.extra_geometry_mode.remove(clear);
                self.rsp.extra_geometry_mode.insert(set);
            }
            ExtOp::RegisterBlendedTexture => {
                let key = self.rsp.segmented(w1);
                let mask = self.next_hash(provider);
                let blend = self.next_hash(provider);
                if let (Some(mask), Some(blend)) = (mask, blend) {
                    self.blended.insert(key, BlendedTexture { mask, blend });
                    self.textures.delete_by_address(TexAddr::Raw(key));
                    self.rdp.textures_changed = [true; 2];
                }
            }
            ExtOp::SetUcode => match Ucode::from_index(w1) {
                Some(ucode) => self.set_ucode(ucode),
                None => log::warn!("Unknown microcode index {}", w1),
            },
        }
        Flow::Continue
    }

    /// Path string stored at segmented address `addr`
    fn read_path(&self, provider: &dyn ResourceProvider, addr: u32) -> Option<String> {
        let addr = self.rsp.segmented(addr);
        let path = provider.read_path(addr);
        if path.is_none() {
            log::warn!(
                "{}",
                GfxError::MalformedRecord {
                    addr,
                    what: "path string",
                }
            );
        }
        path
    }

    fn set_texture_resource(&mut self, w0: u32, texture: Arc<TextureResource>) {
        let fmt = get_cmd(w0, 21, 3) as u8;
        let siz = get_cmd(w0, 19, 2) as u8;
        let width = get_cmd(w0, 0, 12) + 1;
        let addr = TexAddr::Resource {
            hash: texture.id,
            offset: 0,
        };
        self.rdp
            .set_texture_image(fmt, siz, width, addr, Some(texture));
    }

    /// Load vertices starting `offset` entries into a resource array
    fn load_vertex_resource(&mut self, w0: u32, vertices: &VertexResource, offset: usize) {
        let (count, dest) = vertex_range(w0, Ucode::F3dex2);
        match vertices.vertices.get(offset..offset + count) {
            Some(slice) => self.rsp.load_vertices(slice, dest),
            None => log::warn!(
                "Vertex resource {:016X} holds {} vertices, {} requested from {}",
                vertices.id,
                vertices.vertices.len(),
                count,
                offset
            ),
        }
    }

    /// Call (push flag 0) or branch to a resource display list
    fn enter_list(&mut self, w0: u32, list: Arc<DisplayListResource>) -> Flow {
        let dest = Cursor::resource(list);
        if get_cmd(w0, 16, 8) == 0 {
            self.stack.call(dest);
        } else {
            self.stack.branch(dest);
        }
        Flow::Jumped
    }

    /// Drawing moved to another target; rectangles must be resent
    fn target_switched(&mut self) {
        self.bound.invalidate_rects();
        self.rdp.viewport_or_scissor_changed = true;
    }
}

fn resolve_texture(
    resource: Option<Resource>,
    name: impl FnOnce() -> String,
) -> Option<Arc<TextureResource>> {
    let texture = resource.and_then(|res| res.as_texture().cloned());
    if texture.is_none() {
        log::warn!("{}", not_found(format!("texture {}", name())));
    }
    texture
}

fn resolve_vertices(
    resource: Option<Resource>,
    name: impl FnOnce() -> String,
) -> Option<Arc<VertexResource>> {
    let vertices = resource.and_then(|res| res.as_vertices().cloned());
    if vertices.is_none() {
        log::warn!("{}", not_found(format!("vertex array {}", name())));
    }
    vertices
}

fn resolve_list(
    resource: Option<Resource>,
    name: impl FnOnce() -> String,
) -> Option<Arc<DisplayListResource>> {
    let list = resource.and_then(|res| res.as_display_list().cloned());
    if list.is_none() {
        log::warn!("{}", not_found(format!("display list {}", name())));
    }
    list
}
