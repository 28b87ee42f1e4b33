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

//! Texel decoder
//!
//! Every console texel format is expanded to RGBA8, four bytes per texel,
//! rows top to bottom. 4-bit formats store the left texel in the high
//! nibble.
//!
//! | fmt  | 4b   | 8b   | 16b    | 32b    |
//! |------|------|------|--------|--------|
//! | RGBA | -    | -    | 5551   | 8888   |
//! | CI   | pal  | pal  | -      | -      |
//! | IA   | 3+1  | 4+4  | 8+8    | -      |
//! | I    | 4    | 8    | -      | -      |

use super::tile::{texels_to_bytes, PALETTE_BANK_ENTRIES};
use crate::core::error::{GfxError, Result};
use crate::core::gbi::{
    rgba5551_to_rgba8, G_IM_FMT_CI, G_IM_FMT_I, G_IM_FMT_IA, G_IM_FMT_RGBA, G_IM_SIZ_16B,
    G_IM_SIZ_32B, G_IM_SIZ_4B, G_IM_SIZ_8B,
};

/// RGBA8 image ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTexture {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Palette banks visible to a color-indexed decode
#[derive(Debug, Clone, Copy)]
pub struct Palette<'a> {
    /// Big-endian 16-bit entries, up to 128 per bank
    pub banks: [&'a [u8]; 2],
    /// Tile palette number (CI4 only)
    pub index: u8,
    /// Entries are IA16 rather than RGBA5551
    pub ia16: bool,
}

impl Palette<'_> {
    fn entry(&self, bank: usize, entry: usize) -> [u8; 4] {
        let data = self.banks[bank & 1];
        let offset = entry * 2;
        let Some(bytes) = data.get(offset..offset + 2) else {
            return [0, 0, 0, 0];
        };
        if self.ia16 {
            let i = bytes[0];
            [i, i, i, bytes[1]]
        } else {
            rgba5551_to_rgba8(u16::from_be_bytes([bytes[0], bytes[1]]))
        }
    }

    /// Color of a CI4 texel
    fn ci4(&self, texel: u8) -> [u8; 4] {
        let bank = (self.index / 8) as usize;
        let base = (self.index % 8) as usize * 16;
        self.entry(bank, base + texel as usize)
    }

    /// Color of a CI8 texel
    fn ci8(&self, texel: u8) -> [u8; 4] {
        let index = texel as usize;
        self.entry(index / PALETTE_BANK_ENTRIES, index % PALETTE_BANK_ENTRIES)
    }
}

/// Decode `width * height` texels of the given format
///
/// Color-indexed formats need a palette; without one they decode to
/// transparent black.
///
/// # Examples
///
/// ```
/// use ultragfx::core::gbi::{G_IM_FMT_I, G_IM_SIZ_8B};
/// use ultragfx::core::rdp::decode_texture;
///
/// let tex = decode_texture(G_IM_FMT_I, G_IM_SIZ_8B, &[0x00, 0x80], 2, 1, None).unwrap();
/// assert_eq!(tex.rgba, vec![0, 0, 0, 0, 0x80, 0x80, 0x80, 0x80]);
/// ```
pub fn decode_texture(
    fmt: u8,
    siz: u8,
    data: &[u8],
    width: u32,
    height: u32,
    palette: Option<&Palette<'_>>,
) -> Result<DecodedTexture> {
    let texels = (width * height) as usize;
    let needed = texels_to_bytes(width * height, siz) as usize;
    if data.len() < needed {
        return Err(GfxError::TextureDataTooShort {
            needed,
            got: data.len(),
        });
    }

    let mut rgba = Vec::with_capacity(texels * 4);
    match (fmt, siz) {
        (G_IM_FMT_RGBA, G_IM_SIZ_16B) => {
            for texel in data[..needed].chunks_exact(2) {
                rgba.extend_from_slice(&rgba5551_to_rgba8(u16::from_be_bytes([
                    texel[0], texel[1],
                ])));
            }
        }
        (G_IM_FMT_RGBA, G_IM_SIZ_32B) => rgba.extend_from_slice(&data[..needed]),
        (G_IM_FMT_IA, G_IM_SIZ_4B) => {
            for_each_nibble(data, texels, |n| {
                let i = ((n >> 1) & 0x07) * 0x24;
                let a = if n & 1 != 0 { 0xFF } else { 0 };
                rgba.extend_from_slice(&[i, i, i, a]);
            });
        }
        (G_IM_FMT_IA, G_IM_SIZ_8B) => {
            for &b in &data[..needed] {
                let i = (b >> 4) * 0x11;
                let a = (b & 0x0F) * 0x11;
                rgba.extend_from_slice(&[i, i, i, a]);
            }
        }
        (G_IM_FMT_IA, G_IM_SIZ_16B) => {
            for texel in data[..needed].chunks_exact(2) {
                rgba.extend_from_slice(&[texel[0], texel[0], texel[0], texel[1]]);
            }
        }
        (G_IM_FMT_I, G_IM_SIZ_4B) => {
            for_each_nibble(data, texels, |n| {
                let i = n * 0x11;
                rgba.extend_from_slice(&[i, i, i, i]);
            });
        }
        (G_IM_FMT_I, G_IM_SIZ_8B) => {
            for &i in &data[..needed] {
                rgba.extend_from_slice(&[i, i, i, i]);
            }
        }
        (G_IM_FMT_CI, G_IM_SIZ_4B) => {
            for_each_nibble(data, texels, |n| {
                rgba.extend_from_slice(&palette.map_or([0; 4], |p| p.ci4(n)));
            });
        }
        (G_IM_FMT_CI, G_IM_SIZ_8B) => {
            for &b in &data[..needed] {
                rgba.extend_from_slice(&palette.map_or([0; 4], |p| p.ci8(b)));
            }
        }
        _ => {
            return Err(GfxError::UnsupportedTexture {
                format: fmt,
                size: siz,
            })
        }
    }

    Ok(DecodedTexture {
        width,
        height,
        rgba,
    })
}

fn for_each_nibble(data: &[u8], texels: usize, mut f: impl FnMut(u8)) {
    for i in 0..texels {
        let byte = data[i / 2];
        f(if i % 2 == 0 { byte >> 4 } else { byte & 0x0F });
    }
}

/// Nearest-neighbour rescale of an RGBA8 image
///
/// Returns the input unchanged when the sizes already match.
pub fn rescale_nearest(rgba: &[u8], src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> Vec<u8> {
    if src_w == dst_w && src_h == dst_h {
        return rgba.to_vec();
    }
    if src_w == 0 || src_h == 0 {
        return vec![0; (dst_w * dst_h * 4) as usize];
    }

    let mut out = Vec::with_capacity((dst_w * dst_h * 4) as usize);
    for y in 0..dst_h {
        let sy = (y as u64 * src_h as u64 / dst_h as u64) as usize;
        for x in 0..dst_w {
            let sx = (x as u64 * src_w as u64 / dst_w as u64) as usize;
            let offset = (sy * src_w as usize + sx) * 4;
            match rgba.get(offset..offset + 4) {
                Some(px) => out.extend_from_slice(px),
                None => out.extend_from_slice(&[0; 4]),
            }
        }
    }
    out
}
