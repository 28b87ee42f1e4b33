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

//! RDP command handlers
//!
//! These are shared by every microcode generation. Coordinates arrive in
//! 10.2 fixed point and texture coordinates in S10.5.

use super::{Flow, Interpreter};
use crate::core::backend::RenderingBackend;
use crate::core::cache::{alpha_comb, color_comb, combine_from_words, combine_mode};
use crate::core::gbi::{
    get_cmd, unpack_rgba, Gfx, RdpOp, G_ACMUX_SHADE, G_CCMUX_SHADE, G_CYC_COPY, G_CYC_FILL,
};
use crate::core::rdp::{SetTileParams, TexAddr};
use crate::core::resource::ResourceProvider;

/// Corners of a rectangle command, 10.2 fixed point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(in crate::core::interpreter) struct RectCorners {
    pub ulx: i32,
    pub uly: i32,
    pub lrx: i32,
    pub lry: i32,
}

impl RectCorners {
    /// Lower-right corner in w0, upper-left in w1
    fn decode(w0: u32, w1: u32) -> Self {
        Self {
            ulx: get_cmd(w1, 12, 12) as i32,
            uly: get_cmd(w1, 0, 12) as i32,
            lrx: get_cmd(w0, 12, 12) as i32,
            lry: get_cmd(w0, 0, 12) as i32,
        }
    }
}

impl<B: RenderingBackend> Interpreter<B> {
    pub(in crate::core::interpreter) fn rdp_op(
        &mut self,
        provider: &dyn ResourceProvider,
        op: RdpOp,
        cmd: Gfx,
    ) -> Flow {
        let Gfx { w0, w1 } = cmd;
        match op {
            RdpOp::TexRect | RdpOp::TexRectFlip => {
                return self.dp_texture_rectangle(provider, w0, w1, op == RdpOp::TexRectFlip);
            }
            RdpOp::FillRect => self.dp_fill_rectangle(provider, RectCorners::decode(w0, w1)),

            RdpOp::LoadSync | RdpOp::PipeSync | RdpOp::TileSync | RdpOp::FullSync => {}
            RdpOp::SetKeyGb | RdpOp::SetKeyR | RdpOp::SetConvert => {
                log::trace!("Ignoring {:?}", op);
            }

            RdpOp::SetScissor => self.rdp.set_scissor(
                get_cmd(w0, 12, 12),
                get_cmd(w0, 0, 12),
                get_cmd(w1, 12, 12),
                get_cmd(w1, 0, 12),
            ),
            RdpOp::SetPrimDepth => {
                self.rdp.prim_depth = ((w1 >> 16) as u16, w1 as u16);
            }
            RdpOp::SetOtherMode => {
                self.rdp.set_other_mode_h(0, 24, w0);
                self.rdp.set_other_mode_l(0, 32, w1);
            }

            RdpOp::LoadTlut => {
                self.rdp
                    .load_tlut(get_cmd(w1, 24, 3) as usize, get_cmd(w1, 14, 10));
            }
            RdpOp::SetTileSize => self.rdp.set_tile_size(
                get_cmd(w1, 24, 3) as usize,
                get_cmd(w0, 12, 12) as u16,
                get_cmd(w0, 0, 12) as u16,
                get_cmd(w1, 12, 12) as u16,
                get_cmd(w1, 0, 12) as u16,
            ),
            RdpOp::LoadBlock => {
                self.rdp
                    .load_block(get_cmd(w1, 24, 3) as usize, get_cmd(w1, 12, 12));
            }
            RdpOp::LoadTile => self.rdp.load_tile(
                get_cmd(w1, 24, 3) as usize,
                get_cmd(w0, 12, 12) as u16,
                get_cmd(w0, 0, 12) as u16,
                get_cmd(w1, 12, 12) as u16,
                get_cmd(w1, 0, 12) as u16,
            ),
            RdpOp::SetTile => self.rdp.set_tile(SetTileParams::decode(w0, w1)),

            RdpOp::SetFillColor => self.rdp.fill_color = w1,
            RdpOp::SetFogColor => self.rdp.fog_color = unpack_rgba(w1),
            RdpOp::SetBlendColor => self.rdp.blend_color = unpack_rgba(w1),
            RdpOp::SetPrimColor => {
                self.rdp.prim_lod_fraction = get_cmd(w0, 0, 8) as u8;
                self.rdp.prim_color = unpack_rgba(w1);
            }
            RdpOp::SetEnvColor => self.rdp.env_color = unpack_rgba(w1),
            RdpOp::SetCombine => self.rdp.combine_mode = combine_from_words(w0, w1),

            RdpOp::SetTimg => {
                let addr = self.rsp.segmented(w1);
                self.rdp.set_texture_image(
                    get_cmd(w0, 21, 3) as u8,
                    get_cmd(w0, 19, 2) as u8,
                    get_cmd(w0, 0, 12) + 1,
                    TexAddr::Raw(addr),
                    None,
                );
            }
            RdpOp::SetZImg => self.rdp.depth_image = self.rsp.segmented(w1),
            RdpOp::SetCImg => self.rdp.color_image = self.rsp.segmented(w1),
        }
        Flow::Continue
    }

    /// Textured rectangle; the next two records carry the texture
    /// coordinates and their per-pixel steps in their w1
    fn dp_texture_rectangle(
        &mut self,
        provider: &dyn ResourceProvider,
        w0: u32,
        w1: u32,
        flip: bool,
    ) -> Flow {
        let mut rect = RectCorners::decode(w0, w1);
        let tile = get_cmd(w1, 24, 3) as u8;

        let Some(coords) = self.next_record(provider) else {
            return Flow::Continue;
        };
        let Some(steps) = self.next_record(provider) else {
            return Flow::Continue;
        };
        let uls = (coords.w1 >> 16) as i16 as i32;
        let ult = coords.w1 as i16 as i32;
        let mut dsdx = (steps.w1 >> 16) as i16 as i32;
        let dtdy = steps.w1 as i16 as i32;

        let cycle = self.rdp.cycle_type();
        if cycle == G_CYC_COPY {
            // Copy mode steps four texels per pixel
            dsdx >>= 2;
        }
        if cycle == G_CYC_COPY || cycle == G_CYC_FILL {
            rect.lrx += 1 << 2;
            rect.lry += 1 << 2;
        }

        // S10.5 start plus S5.10 step times a 10.2 extent, kept in S10.5
        let (width, height) = if flip {
            (rect.lry - rect.uly, rect.lrx - rect.ulx)
        } else {
            (rect.lrx - rect.ulx, rect.lry - rect.uly)
        };
        let lrs = ((uls << 7) + dsdx * width) >> 7;
        let lrt = ((ult << 7) + dtdy * height) >> 7;

        let corners = if flip {
            [(uls, ult), (lrs, ult), (lrs, lrt), (uls, lrt)]
        } else {
            [(uls, ult), (uls, lrt), (lrs, lrt), (lrs, ult)]
        };
        self.set_first_tile(tile);
        self.draw_rectangle(provider, rect, Some(corners));
        self.stats.rectangles += 1;

        // Both operand records were consumed; continue after the last one
        Flow::Continue
    }

    fn dp_fill_rectangle(&mut self, provider: &dyn ResourceProvider, mut rect: RectCorners) {
        if self.rdp.color_image == self.rdp.depth_image {
            // Depth clears already happen at the start of the frame
            return;
        }

        let cycle = self.rdp.cycle_type();
        if cycle == G_CYC_COPY || cycle == G_CYC_FILL {
            rect.lrx += 1 << 2;
            rect.lry += 1 << 2;
        }

        let saved_combine = self.rdp.combine_mode;
        if cycle == G_CYC_FILL {
            self.rdp.combine_mode = combine_mode(
                color_comb(0, 0, 0, G_CCMUX_SHADE),
                alpha_comb(0, 0, 0, G_ACMUX_SHADE),
                0,
                0,
            );
        }
        self.draw_rectangle(provider, rect, None);
        self.rdp.combine_mode = saved_combine;
        self.stats.rectangles += 1;
    }
}
