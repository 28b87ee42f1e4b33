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

//! RDP tile, texture and render-mode state
//!
//! The rasterizer-facing registers: eight tile descriptors, the texture
//! image pointer, color registers, the combiner and other-mode words,
//! scissor and viewport.
//!
//! # Texture memory
//!
//! Real tmem is 4KB of addressable storage. Here it is reduced to two
//! slots; a tile uses slot 1 when its tmem offset is nonzero and slot 0
//! otherwise. Loads record *where* texels come from (source identity,
//! offsets and line sizes), and decoding happens lazily at draw time.
//!
//! Palettes live in two 128-entry banks. A TLUT load at tmem 256 fills
//! bank 0 (and bank 1 when all 256 entries are loaded); a load anywhere
//! else fills bank 1.

mod texture;
mod tile;

pub use texture::*;
pub use tile::*;

use std::sync::Arc;

use crate::core::backend::FramebufferId;
use crate::core::gbi::{
    G_AC_DITHER, G_AC_THRESHOLD, G_BL_0, G_BL_A_MEM, G_BL_CLR_FOG, G_BL_CLR_MEM, G_CYC_2CYCLE,
    G_CYC_COPY, G_CYC_FILL, G_MDSFT_CYCLETYPE, G_TF_POINT, G_TT_IA16, CVG_X_ALPHA, ZMODE_DEC,
    Z_UPD,
};
use crate::core::resource::TextureResource;

/// Number of tile descriptors
pub const TILE_COUNT: usize = 8;

/// Number of emulated tmem slots
pub const TMEM_SLOTS: usize = 2;

/// Source identity of texel data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TexAddr {
    /// Console memory address
    Raw(u32),
    /// Byte offset into a hash-identified resource
    Resource { hash: u64, offset: u32 },
}

impl TexAddr {
    /// Same source moved forward by `bytes`
    pub fn offset(self, bytes: u32) -> Self {
        match self {
            TexAddr::Raw(addr) => TexAddr::Raw(addr.wrapping_add(bytes)),
            TexAddr::Resource { hash, offset } => TexAddr::Resource {
                hash,
                offset: offset + bytes,
            },
        }
    }
}

/// Rectangle in console-native coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NativeRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Pointer set by set-texture-image
#[derive(Debug, Clone)]
pub struct TextureImage {
    pub fmt: u8,
    pub siz: u8,
    /// Width in texels
    pub width: u32,
    pub addr: TexAddr,
    pub resource: Option<Arc<TextureResource>>,
}

impl Default for TextureImage {
    fn default() -> Self {
        Self {
            fmt: 0,
            siz: 0,
            width: 1,
            addr: TexAddr::Raw(0),
            resource: None,
        }
    }
}

/// Palette bank source
#[derive(Debug, Clone)]
pub struct PaletteRef {
    pub addr: TexAddr,
    pub resource: Option<Arc<TextureResource>>,
}

/// Rasterizer state
#[derive(Debug, Clone)]
pub struct RdpState {
    pub tiles: [TileDescriptor; TILE_COUNT],
    pub loaded: [Option<LoadedTexture>; TMEM_SLOTS],
    pub texture_image: TextureImage,
    pub palettes: [Option<PaletteRef>; 2],

    /// Framebuffers bound as textures, per slot
    pub fb_textures: [Option<FramebufferId>; TMEM_SLOTS],

    pub other_mode_l: u32,
    pub other_mode_h: u32,
    /// Combiner in the packed internal layout (see `cache::combiner`)
    pub combine_mode: u64,

    pub env_color: [u8; 4],
    pub prim_color: [u8; 4],
    pub fog_color: [u8; 4],
    pub blend_color: [u8; 4],
    pub fill_color: u32,
    pub prim_lod_fraction: u8,
    pub prim_depth: (u16, u16),

    pub scissor: NativeRect,
    pub viewport: NativeRect,
    pub viewport_or_scissor_changed: bool,

    /// Slots whose texture must be re-resolved before the next draw
    pub textures_changed: [bool; TMEM_SLOTS],

    pub color_image: u32,
    pub depth_image: u32,
}

impl Default for RdpState {
    fn default() -> Self {
        Self::new()
    }
}

impl RdpState {
    pub fn new() -> Self {
        Self {
            tiles: [TileDescriptor::default(); TILE_COUNT],
            loaded: [None, None],
            texture_image: TextureImage::default(),
            palettes: [None, None],
            fb_textures: [None, None],
            other_mode_l: 0,
            other_mode_h: 0,
            combine_mode: 0,
            env_color: [0; 4],
            prim_color: [0; 4],
            fog_color: [0; 4],
            blend_color: [0; 4],
            fill_color: 0,
            prim_lod_fraction: 0,
            prim_depth: (0, 0),
            scissor: NativeRect::default(),
            viewport: NativeRect::default(),
            viewport_or_scissor_changed: true,
            textures_changed: [true; TMEM_SLOTS],
            color_image: 0,
            depth_image: 0,
        }
    }

    /// Replace bits `[shift, shift+len)` of the high other-mode word
    pub fn set_other_mode_h(&mut self, shift: u32, len: u32, data: u32) {
        let mask = field_mask(shift, len);
        self.other_mode_h = (self.other_mode_h & !mask) | (data & mask);
        self.textures_changed = [true; TMEM_SLOTS];
    }

    /// Replace bits `[shift, shift+len)` of the low other-mode word
    pub fn set_other_mode_l(&mut self, shift: u32, len: u32, data: u32) {
        let mask = field_mask(shift, len);
        self.other_mode_l = (self.other_mode_l & !mask) | (data & mask);
    }

    pub fn cycle_type(&self) -> u32 {
        self.other_mode_h & (3 << G_MDSFT_CYCLETYPE)
    }

    pub fn is_two_cycle(&self) -> bool {
        self.cycle_type() == G_CYC_2CYCLE
    }

    /// Fill or copy mode, where rectangles cover their last row and column
    pub fn is_fill_or_copy(&self) -> bool {
        matches!(self.cycle_type(), G_CYC_FILL | G_CYC_COPY)
    }

    pub fn is_copy(&self) -> bool {
        self.cycle_type() == G_CYC_COPY
    }

    pub fn linear_filter(&self) -> bool {
        self.other_mode_h & (3 << 12) != G_TF_POINT
    }

    pub fn tlut_ia16(&self) -> bool {
        self.other_mode_h & (3 << 14) == G_TT_IA16
    }

    pub fn depth_update(&self) -> bool {
        self.other_mode_l & Z_UPD != 0
    }

    pub fn zmode_decal(&self) -> bool {
        self.other_mode_l & ZMODE_DEC == ZMODE_DEC
    }

    /// Blender reads framebuffer alpha, i.e. the draw is alpha blended
    pub fn use_alpha(&self) -> bool {
        (self.other_mode_l & (G_BL_A_MEM << 18)) == 0 || self.texture_edge()
    }

    pub fn use_fog(&self) -> bool {
        (self.other_mode_l >> 30) == G_BL_CLR_FOG
    }

    pub fn texture_edge(&self) -> bool {
        self.other_mode_l & CVG_X_ALPHA == CVG_X_ALPHA
    }

    pub fn use_noise(&self) -> bool {
        self.other_mode_l & G_AC_DITHER == G_AC_DITHER
    }

    pub fn alpha_threshold(&self) -> bool {
        self.other_mode_l & (G_AC_THRESHOLD | G_AC_DITHER) == G_AC_THRESHOLD
    }

    /// Blender keeps the framebuffer color, so nothing visible is drawn
    pub fn invisible(&self) -> bool {
        (self.other_mode_l & (3 << 24)) == (G_BL_0 << 24)
            && (self.other_mode_l & (3 << 20)) == (G_BL_CLR_MEM << 20)
    }

    /// Set the scissor from raw 10.2 fixed-point corners
    pub fn set_scissor(&mut self, ulx: u32, uly: u32, lrx: u32, lry: u32) {
        let rect = NativeRect {
            x: ulx as f32 / 4.0,
            y: uly as f32 / 4.0,
            width: (lrx as f32 - ulx as f32) / 4.0,
            height: (lry as f32 - uly as f32) / 4.0,
        };
        if rect != self.scissor {
            self.scissor = rect;
            self.viewport_or_scissor_changed = true;
        }
    }

    /// Set the viewport from a viewport record
    pub fn set_viewport(&mut self, vscale: [i16; 4], vtrans: [i16; 4]) {
        let width = 2.0 * vscale[0] as f32 / 4.0;
        let height = 2.0 * vscale[1] as f32 / 4.0;
        let rect = NativeRect {
            x: vtrans[0] as f32 / 4.0 - width / 2.0,
            y: vtrans[1] as f32 / 4.0 - height / 2.0,
            width,
            height,
        };
        if rect != self.viewport {
            self.viewport = rect;
            self.viewport_or_scissor_changed = true;
        }
    }
}

fn field_mask(shift: u32, len: u32) -> u32 {
    if len >= 32 {
        u32::MAX << shift.min(31)
    } else {
        ((1u32 << len) - 1) << shift
    }
}

#[cfg(test)]
mod tests;
