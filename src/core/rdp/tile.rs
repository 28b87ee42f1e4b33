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

//! Tile descriptors and texture loads

use std::sync::Arc;

use super::{PaletteRef, RdpState, TexAddr, TMEM_SLOTS};
use crate::core::gbi::{G_IM_SIZ_16B, G_IM_SIZ_32B, G_IM_SIZ_4B, G_IM_SIZ_8B};
use crate::core::resource::TextureResource;

/// tmem word address of the first palette bank
pub const TLUT_TMEM_BASE: u16 = 256;

/// Palette entries in one bank
pub const PALETTE_BANK_ENTRIES: usize = 128;

/// Bytes in one palette bank (16-bit entries)
pub const PALETTE_BANK_BYTES: u32 = (PALETTE_BANK_ENTRIES * 2) as u32;

/// One of the eight tile descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileDescriptor {
    pub fmt: u8,
    pub siz: u8,
    /// Row pitch in bytes
    pub line_size_bytes: u32,
    /// tmem word offset
    pub tmem: u16,
    /// Emulated slot derived from `tmem`
    pub tmem_index: usize,
    pub palette: u8,
    /// S/T clamp and mirror bits
    pub cms: u8,
    pub cmt: u8,
    pub masks: u8,
    pub maskt: u8,
    pub shifts: u8,
    pub shiftt: u8,
    /// Bounds in 10.2 fixed point
    pub uls: u16,
    pub ult: u16,
    pub lrs: u16,
    pub lrt: u16,
}

impl TileDescriptor {
    /// Declared width in texels
    pub fn width(&self) -> u32 {
        ((self.lrs as u32).saturating_sub(self.uls as u32) + 4) / 4
    }

    /// Declared height in texels
    pub fn height(&self) -> u32 {
        ((self.lrt as u32).saturating_sub(self.ult as u32) + 4) / 4
    }
}

/// Record of what a load placed into a tmem slot
#[derive(Debug, Clone)]
pub struct LoadedTexture {
    /// First texel of the loaded region
    pub addr: TexAddr,
    pub resource: Option<Arc<TextureResource>>,
    /// Size set by the load command itself
    pub orig_size_bytes: u32,
    pub size_bytes: u32,
    /// Bytes per row actually copied; zero for block loads
    pub line_size_bytes: u32,
    /// Row pitch of the source image
    pub full_image_line_size_bytes: u32,
    /// Loaded with a block load (row pitch comes from the tile)
    pub block: bool,
}

impl LoadedTexture {
    /// Bytes per decoded row given the tile used for drawing
    pub fn row_bytes(&self, tile: &TileDescriptor) -> u32 {
        let row = if self.block {
            tile.line_size_bytes
        } else {
            self.line_size_bytes
        };
        if row == 0 {
            self.size_bytes
        } else {
            row
        }
    }
}

/// Bytes occupied by `texels` texels of size `siz`
pub fn texels_to_bytes(texels: u32, siz: u8) -> u32 {
    match siz {
        G_IM_SIZ_4B => texels.div_ceil(2),
        G_IM_SIZ_8B => texels,
        G_IM_SIZ_16B => texels * 2,
        G_IM_SIZ_32B => texels * 4,
        _ => texels * 2,
    }
}

/// Texels contained in `bytes` bytes of size `siz`
pub fn bytes_to_texels(bytes: u32, siz: u8) -> u32 {
    match siz {
        G_IM_SIZ_4B => bytes * 2,
        G_IM_SIZ_8B => bytes,
        G_IM_SIZ_16B => bytes / 2,
        G_IM_SIZ_32B => bytes / 4,
        _ => bytes / 2,
    }
}

/// Parameters of a set-tile command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetTileParams {
    pub tile: usize,
    pub fmt: u8,
    pub siz: u8,
    /// Row pitch in 64-bit words
    pub line: u32,
    pub tmem: u16,
    pub palette: u8,
    pub cmt: u8,
    pub maskt: u8,
    pub shiftt: u8,
    pub cms: u8,
    pub masks: u8,
    pub shifts: u8,
}

impl SetTileParams {
    pub fn decode(w0: u32, w1: u32) -> Self {
        Self {
            fmt: ((w0 >> 21) & 0x07) as u8,
            siz: ((w0 >> 19) & 0x03) as u8,
            line: (w0 >> 9) & 0x1FF,
            tmem: (w0 & 0x1FF) as u16,
            tile: ((w1 >> 24) & 0x07) as usize,
            palette: ((w1 >> 20) & 0x0F) as u8,
            cmt: ((w1 >> 18) & 0x03) as u8,
            maskt: ((w1 >> 14) & 0x0F) as u8,
            shiftt: ((w1 >> 10) & 0x0F) as u8,
            cms: ((w1 >> 8) & 0x03) as u8,
            masks: ((w1 >> 4) & 0x0F) as u8,
            shifts: (w1 & 0x0F) as u8,
        }
    }
}

impl RdpState {
    pub fn set_texture_image(
        &mut self,
        fmt: u8,
        siz: u8,
        width: u32,
        addr: TexAddr,
        resource: Option<Arc<TextureResource>>,
    ) {
        self.texture_image.fmt = fmt;
        self.texture_image.siz = siz;
        self.texture_image.width = width.max(1);
        self.texture_image.addr = addr;
        self.texture_image.resource = resource;
    }

    pub fn set_tile(&mut self, params: SetTileParams) {
        let line_size_bytes = if params.siz == G_IM_SIZ_32B {
            // 32-bit texels are split across the low and high tmem halves
            params.line * 16
        } else {
            params.line * 8
        };
        let tile = &mut self.tiles[params.tile & 7];
        tile.fmt = params.fmt;
        tile.siz = params.siz;
        tile.line_size_bytes = line_size_bytes;
        tile.tmem = params.tmem;
        tile.tmem_index = usize::from(params.tmem != 0);
        tile.palette = params.palette;
        tile.cms = params.cms;
        tile.cmt = params.cmt;
        tile.masks = params.masks;
        tile.maskt = params.maskt;
        tile.shifts = params.shifts;
        tile.shiftt = params.shiftt;
        self.textures_changed = [true; TMEM_SLOTS];
    }

    pub fn set_tile_size(&mut self, tile: usize, uls: u16, ult: u16, lrs: u16, lrt: u16) {
        let tile = &mut self.tiles[tile & 7];
        tile.uls = uls;
        tile.ult = ult;
        tile.lrs = lrs;
        tile.lrt = lrt;
        self.textures_changed[tile.tmem_index] = true;
    }

    /// Load `lrs + 1` texels as one contiguous block
    pub fn load_block(&mut self, tile: usize, lrs: u32) {
        let slot = self.tiles[tile & 7].tmem_index;
        let size_bytes = texels_to_bytes(lrs + 1, self.texture_image.siz);
        self.loaded[slot] = Some(LoadedTexture {
            addr: self.texture_image.addr,
            resource: self.texture_image.resource.clone(),
            orig_size_bytes: size_bytes,
            size_bytes,
            line_size_bytes: 0,
            full_image_line_size_bytes: size_bytes,
            block: true,
        });
        self.fb_textures[slot] = None;
        self.textures_changed[slot] = true;
    }

    /// Load a rectangle of the texture image; bounds in 10.2 fixed point
    pub fn load_tile(&mut self, tile: usize, uls: u16, ult: u16, lrs: u16, lrt: u16) {
        let siz = self.texture_image.siz;
        let offset_x = (uls >> 2) as u32;
        let offset_y = (ult >> 2) as u32;
        let tile_width = ((lrs >> 2) as u32).saturating_sub(offset_x) + 1;
        let tile_height = ((lrt >> 2) as u32).saturating_sub(offset_y) + 1;

        let full_line = texels_to_bytes(self.texture_image.width, siz);
        let line = texels_to_bytes(tile_width, siz);
        let start = full_line * offset_y + texels_to_bytes(offset_x, siz);
        let size_bytes = line * tile_height;

        let descriptor = &mut self.tiles[tile & 7];
        descriptor.uls = uls;
        descriptor.ult = ult;
        descriptor.lrs = lrs;
        descriptor.lrt = lrt;
        let slot = descriptor.tmem_index;

        self.loaded[slot] = Some(LoadedTexture {
            addr: self.texture_image.addr.offset(start),
            resource: self.texture_image.resource.clone(),
            orig_size_bytes: size_bytes,
            size_bytes,
            line_size_bytes: line,
            full_image_line_size_bytes: full_line,
            block: false,
        });
        self.fb_textures[slot] = None;
        self.textures_changed[slot] = true;
    }

    /// Point palette banks at the current texture image
    pub fn load_tlut(&mut self, tile: usize, high_index: u32) {
        let tmem = self.tiles[tile & 7].tmem;
        let addr = self.texture_image.addr;
        let resource = self.texture_image.resource.clone();
        if tmem == TLUT_TMEM_BASE {
            self.palettes[0] = Some(PaletteRef {
                addr,
                resource: resource.clone(),
            });
            if high_index == 255 {
                self.palettes[1] = Some(PaletteRef {
                    addr: addr.offset(PALETTE_BANK_BYTES),
                    resource,
                });
            }
        } else {
            self.palettes[1] = Some(PaletteRef { addr, resource });
        }
        self.textures_changed = [true; TMEM_SLOTS];
    }
}
