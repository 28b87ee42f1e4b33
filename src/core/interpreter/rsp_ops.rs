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

//! RSP command handlers
//!
//! Operand layouts differ between microcode generations; each handler
//! decodes its fields for the active [`Ucode`] and then drives
//! [`RspState`](crate::core::rsp::RspState).

use super::{Flow, Interpreter};
use crate::core::backend::RenderingBackend;
use crate::core::dlist::Cursor;
use crate::core::error::GfxError;
use crate::core::gbi::{
    decode_fixed_matrix, decode_float_matrix, get_cmd, unpack_rgba, ExtraGeometryMode, GeometryMode,
    Gfx, RawLight, RspOp, Ucode, Viewport, Vtx, MTX_SIZE,
};
use crate::core::resource::ResourceProvider;
use crate::core::rsp::{MtxParams, POPMTX_ENTRY_SIZE, VERTEX_BUFFER_SIZE};

// Move-word indices
const G_MW_MATRIX: u32 = 0x00;
const G_MW_NUMLIGHT: u32 = 0x02;
const G_MW_CLIP: u32 = 0x04;
const G_MW_SEGMENT: u32 = 0x06;
const G_MW_FOG: u32 = 0x08;
const G_MW_LIGHTCOL: u32 = 0x0A;
const G_MW_FORCEMTX: u32 = 0x0C;
const G_MW_PERSPNORM: u32 = 0x0E;

// First-generation move-mem indices
const F3D_G_MV_VIEWPORT: u32 = 0x80;
const F3D_G_MV_LOOKATY: u32 = 0x82;
const F3D_G_MV_LOOKATX: u32 = 0x84;
const F3D_G_MV_L0: u32 = 0x86;
const F3D_G_MV_L7: u32 = 0x94;

// Second-generation move-mem indices
const F3DEX2_G_MV_VIEWPORT: u32 = 8;
const F3DEX2_G_MV_LIGHT: u32 = 10;

// Modify-vertex targets
const G_MWO_POINT_RGBA: u32 = 0x10;
const G_MWO_POINT_ST: u32 = 0x14;

/// Size of one vertex in first-generation DMEM, used by cull-DL operands
const F3D_DMEM_VERTEX_SIZE: u32 = 40;

/// Vertex count and destination index of a vertex-load command
pub(in crate::core::interpreter) fn vertex_range(w0: u32, ucode: Ucode) -> (usize, usize) {
    match ucode {
        Ucode::F3d => {
            let n = get_cmd(w0, 20, 4) + 1;
            let v0 = get_cmd(w0, 16, 4);
            (n as usize, v0 as usize)
        }
        Ucode::F3dex => {
            let n = get_cmd(w0, 10, 6);
            let v0 = get_cmd(w0, 16, 8) / 2;
            (n as usize, v0 as usize)
        }
        Ucode::F3dex2 => {
            let n = get_cmd(w0, 12, 8);
            let end = get_cmd(w0, 1, 7);
            (n as usize, end.saturating_sub(n) as usize)
        }
    }
}

/// Read `count` vertices from console memory
pub(in crate::core::interpreter) fn read_vertices(
    provider: &dyn ResourceProvider,
    addr: u32,
    count: usize,
) -> Option<Vec<Vtx>> {
    let bytes = provider.read_bytes(addr, count * Vtx::SIZE)?;
    Some(bytes.chunks_exact(Vtx::SIZE).map(Vtx::from_be_bytes).collect())
}

impl<B: RenderingBackend> Interpreter<B> {
    pub(in crate::core::interpreter) fn rsp_op(
        &mut self,
        provider: &dyn ResourceProvider,
        op: RspOp,
        cmd: Gfx,
    ) -> Flow {
        let Gfx { w0, w1 } = cmd;
        match op {
            // The second half word is read directly by the commands that need it
            RspOp::Noop | RspOp::SpNoop | RspOp::RdpHalf2 => {}
            RspOp::Mtx => self.sp_matrix(provider, w0, w1),
            RspOp::PopMtx => {
                let count = match self.ucode {
                    Ucode::F3dex2 => (w1 / POPMTX_ENTRY_SIZE) as usize,
                    Ucode::F3d | Ucode::F3dex => 1,
                };
                self.rsp.pop_matrices(count);
            }
            RspOp::MoveMem => self.sp_movemem(provider, w0, w1),
            RspOp::MoveWord => self.sp_moveword(w0, w1),
            RspOp::Vtx => {
                let (count, dest) = vertex_range(w0, self.ucode);
                let addr = self.rsp.segmented(w1);
                match read_vertices(provider, addr, count) {
                    Some(vertices) => self.rsp.load_vertices(&vertices, dest),
                    None => log::warn!(
                        "{}",
                        GfxError::MalformedRecord {
                            addr,
                            what: "vertex array",
                        }
                    ),
                }
            }
            RspOp::ModifyVtx => self.sp_modify_vertex(w0, w1),
            RspOp::CullDl => {
                let (first, last) = match self.ucode {
                    Ucode::F3d => (
                        (w0 & 0x00FF_FFFF) / F3D_DMEM_VERTEX_SIZE,
                        w1 / F3D_DMEM_VERTEX_SIZE,
                    ),
                    Ucode::F3dex | Ucode::F3dex2 => ((w0 & 0xFFFF) / 2, (w1 & 0xFFFF) / 2),
                };
                if self.rsp.vertices_rejected(first as usize, last as usize) {
                    log::trace!("Culled display list on vertices {}..={}", first, last);
                    self.stack.ret();
                    return Flow::Jumped;
                }
            }
            RspOp::BranchZ => return self.sp_branch_z(w0, w1),
            RspOp::Tri1 => {
                let tri = match self.ucode {
                    Ucode::F3d => [
                        get_cmd(w1, 16, 8) / 10,
                        get_cmd(w1, 8, 8) / 10,
                        get_cmd(w1, 0, 8) / 10,
                    ],
                    Ucode::F3dex => [
                        get_cmd(w1, 16, 8) / 2,
                        get_cmd(w1, 8, 8) / 2,
                        get_cmd(w1, 0, 8) / 2,
                    ],
                    Ucode::F3dex2 => [
                        get_cmd(w0, 16, 8) / 2,
                        get_cmd(w0, 8, 8) / 2,
                        get_cmd(w0, 0, 8) / 2,
                    ],
                };
                self.sp_triangle(provider, tri);
            }
            RspOp::Tri2 => {
                self.sp_triangle(provider, word_triangle(w0));
                self.sp_triangle(provider, word_triangle(w1));
            }
            RspOp::Quad => match self.ucode {
                Ucode::F3dex2 => {
                    self.sp_triangle(provider, word_triangle(w0));
                    self.sp_triangle(provider, word_triangle(w1));
                }
                Ucode::F3d | Ucode::F3dex => {
                    let v = [
                        get_cmd(w1, 24, 8) / 2,
                        get_cmd(w1, 16, 8) / 2,
                        get_cmd(w1, 8, 8) / 2,
                        get_cmd(w1, 0, 8) / 2,
                    ];
                    self.sp_triangle(provider, [v[0], v[1], v[2]]);
                    self.sp_triangle(provider, [v[0], v[2], v[3]]);
                }
            },
            RspOp::Texture => {
                let on = match self.ucode {
                    Ucode::F3dex2 => get_cmd(w0, 1, 7),
                    Ucode::F3d | Ucode::F3dex => get_cmd(w0, 0, 8),
                };
                self.rsp.texture_on = on != 0;
                self.rsp.texture_level = get_cmd(w0, 11, 3) as u8;
                self.set_first_tile(get_cmd(w0, 8, 3) as u8);
                self.rsp.texture_scale = [(w1 >> 16) as u16, w1 as u16];
                self.rdp.textures_changed = [true; 2];
            }
            RspOp::GeometryMode => {
                let keep = (w0 & 0x00FF_FFFF) | 0xFF00_0000;
                let mode = (self.rsp.geometry_mode.bits() & keep) | w1;
                self.rsp.geometry_mode = GeometryMode::from_bits_truncate(mode);
            }
            RspOp::SetGeometryMode => {
                self.rsp.geometry_mode |= GeometryMode::from_ucode(w1, self.ucode);
            }
            RspOp::ClearGeometryMode => {
                self.rsp.geometry_mode -= GeometryMode::from_ucode(w1, self.ucode);
            }
            RspOp::SetOtherModeL | RspOp::SetOtherModeH => {
                let (shift, len) = match self.ucode {
                    Ucode::F3dex2 => {
                        let len = get_cmd(w0, 0, 8) + 1;
                        (32u32.saturating_sub(get_cmd(w0, 8, 8) + len), len)
                    }
                    Ucode::F3d | Ucode::F3dex => (get_cmd(w0, 8, 8), get_cmd(w0, 0, 8)),
                };
                if op == RspOp::SetOtherModeL {
                    self.rdp.set_other_mode_l(shift, len, w1);
                } else {
                    self.rdp.set_other_mode_h(shift, len, w1);
                }
            }
            RspOp::Dl => {
                let dest = Cursor::memory(self.rsp.segmented(w1));
                if get_cmd(w0, 16, 8) == 0 {
                    self.stack.call(dest);
                } else {
                    self.stack.branch(dest);
                }
                return Flow::Jumped;
            }
            RspOp::EndDl => {
                self.stack.ret();
                return Flow::Jumped;
            }
            RspOp::LoadUcode => {
                log::debug!("Microcode reload");
                self.textures.clear();
                self.rsp.fog_mul = 0;
                self.rsp.fog_offset = 0;
            }
            RspOp::RdpHalf1 => self.rdp_half_1 = w1,
        }
        Flow::Continue
    }

    /// Select the tile used by texture slot 0 (slot 1 uses the next one)
    pub(in crate::core::interpreter) fn set_first_tile(&mut self, tile: u8) {
        let tile = tile & 7;
        if tile != self.rsp.texture_tile {
            self.rsp.texture_tile = tile;
            self.rdp.textures_changed = [true; 2];
        }
    }

    fn sp_matrix(&mut self, provider: &dyn ResourceProvider, w0: u32, w1: u32) {
        let addr = self.rsp.segmented(w1);
        let Some(bytes) = provider.read_bytes(addr, MTX_SIZE) else {
            log::warn!("{}", GfxError::MalformedRecord { addr, what: "matrix" });
            return;
        };
        let matrix = if self.config.gbi_floats {
            decode_float_matrix(bytes)
        } else {
            decode_fixed_matrix(bytes)
        };
        let params = MtxParams::decode(w0, self.ucode);
        if self.rsp.matrices.apply(matrix, params) {
            self.rsp.lights.mark_dirty();
        }
    }

    fn sp_movemem(&mut self, provider: &dyn ResourceProvider, w0: u32, w1: u32) {
        let addr = self.rsp.segmented(w1);
        let Some(bytes) = provider.read_bytes(addr, RawLight::SIZE) else {
            log::warn!("{}", GfxError::MalformedRecord { addr, what: "move-mem source" });
            return;
        };

        match self.ucode {
            Ucode::F3d | Ucode::F3dex => match get_cmd(w0, 16, 8) {
                F3D_G_MV_VIEWPORT => self.set_viewport(bytes),
                F3D_G_MV_LOOKATY => self.set_lookat(1, bytes),
                F3D_G_MV_LOOKATX => self.set_lookat(0, bytes),
                index @ F3D_G_MV_L0..=F3D_G_MV_L7 if index % 2 == 0 => {
                    let light = ((index - F3D_G_MV_L0) / 2) as usize;
                    self.rsp.lights.set_light(light, RawLight::from_be_bytes(bytes));
                }
                index => log::debug!("Ignoring move-mem index 0x{:02X}", index),
            },
            Ucode::F3dex2 => {
                let offset = get_cmd(w0, 8, 8) * 8;
                match get_cmd(w0, 0, 8) {
                    F3DEX2_G_MV_VIEWPORT => self.set_viewport(bytes),
                    F3DEX2_G_MV_LIGHT => match offset / 24 {
                        0 => self.set_lookat(0, bytes),
                        1 => self.set_lookat(1, bytes),
                        slot => {
                            let light = (slot - 2) as usize;
                            self.rsp.lights.set_light(light, RawLight::from_be_bytes(bytes));
                        }
                    },
                    index => log::debug!("Ignoring move-mem index 0x{:02X}", index),
                }
            }
        }
    }

    fn set_viewport(&mut self, bytes: &[u8]) {
        let vp = Viewport::from_be_bytes(bytes);
        self.rdp.set_viewport(vp.vscale, vp.vtrans);
    }

    fn set_lookat(&mut self, axis: usize, bytes: &[u8]) {
        let light = RawLight::from_be_bytes(bytes);
        self.rsp.lights.set_lookat(axis, light.dir);
    }

    fn sp_moveword(&mut self, w0: u32, w1: u32) {
        let (index, offset) = match self.ucode {
            Ucode::F3dex2 => (get_cmd(w0, 16, 8), get_cmd(w0, 0, 16)),
            Ucode::F3d | Ucode::F3dex => (get_cmd(w0, 0, 8), get_cmd(w0, 8, 16)),
        };

        match index {
            G_MW_NUMLIGHT => {
                let count = match self.ucode {
                    Ucode::F3dex2 => w1 / 24 + 1,
                    Ucode::F3d | Ucode::F3dex => w1.wrapping_sub(0x8000_0000) / 32,
                };
                self.rsp.lights.set_num_lights(count as usize);
            }
            G_MW_SEGMENT => self.rsp.set_segment((offset / 4) as usize, w1),
            G_MW_FOG => {
                self.rsp.fog_mul = (w1 >> 16) as i16;
                self.rsp.fog_offset = w1 as i16;
            }
            G_MW_LIGHTCOL => {
                let light = match self.ucode {
                    Ucode::F3dex2 => offset / 24,
                    Ucode::F3d | Ucode::F3dex => offset / 32,
                };
                let [r, g, b, _] = unpack_rgba(w1);
                self.rsp.lights.set_light_color(light as usize, [r, g, b]);
            }
            G_MW_MATRIX | G_MW_CLIP | G_MW_FORCEMTX | G_MW_PERSPNORM => {
                log::trace!("Ignoring move-word 0x{:02X}", index);
            }
            _ => log::debug!("Unknown move-word index 0x{:02X}", index),
        }
    }

    fn sp_modify_vertex(&mut self, w0: u32, w1: u32) {
        let index = (get_cmd(w0, 0, 16) / 2) as usize;
        if index >= VERTEX_BUFFER_SIZE {
            log::warn!("Modify-vertex of index {} outside the buffer", index);
            return;
        }
        let vertex = &mut self.rsp.vertices[index];
        match get_cmd(w0, 16, 8) {
            G_MWO_POINT_RGBA => vertex.color = unpack_rgba(w1),
            G_MWO_POINT_ST => {
                vertex.u = (w1 >> 16) as i16 as f32;
                vertex.v = w1 as i16 as f32;
            }
            target => log::debug!("Unsupported modify-vertex target 0x{:02X}", target),
        }
    }

    fn sp_branch_z(&mut self, w0: u32, w1: u32) -> Flow {
        let index = (get_cmd(w0, 0, 12) / 2) as usize;
        let Some(vertex) = self.rsp.vertices.get(index) else {
            return Flow::Continue;
        };
        let always = self
            .rsp
            .extra_geometry_mode
            .contains(ExtraGeometryMode::ALWAYS_EXECUTE_BRANCH);
        if always || vertex.z <= w1 as i32 as f32 {
            let dest = Cursor::memory(self.rsp.segmented(self.rdp_half_1));
            self.stack.branch(dest);
            return Flow::Jumped;
        }
        Flow::Continue
    }

    fn sp_triangle(&mut self, provider: &dyn ResourceProvider, tri: [u32; 3]) {
        if tri.iter().any(|&v| v as usize >= VERTEX_BUFFER_SIZE) {
            log::warn!("Triangle {:?} indexes past the vertex buffer", tri);
            return;
        }
        self.draw_triangle(provider, [tri[0] as usize, tri[1] as usize, tri[2] as usize], false);
    }
}

/// Second-generation triangle: three vertex indices (times two) in one word
fn word_triangle(word: u32) -> [u32; 3] {
    [
        get_cmd(word, 16, 8) / 2,
        get_cmd(word, 8, 8) / 2,
        get_cmd(word, 0, 8) / 2,
    ]
}
