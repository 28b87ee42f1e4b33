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

//! Graphics binary interface (GBI) wire format
//!
//! A display list is a sequence of 8-byte records. Each record is two
//! big-endian 32-bit words; the signed top byte of the first word is the
//! opcode and the remaining 56 bits are operands whose layout depends on the
//! opcode and on the active microcode generation.
//!
//! ```text
//!  63      56 55                    32 31                              0
//! +----------+------------------------+--------------------------------+
//! |  opcode  |      w0 operands       |          w1 operands           |
//! +----------+------------------------+--------------------------------+
//! ```
//!
//! This module holds the record type, the bit-field helpers, the opcode
//! tables and the in-memory layouts (vertices, lights, viewports, matrices)
//! that commands point at.
//!
//! # References
//!
//! - [N64 Programming Manual: GBI](https://ultra64.ca/files/documentation/online-manuals/man/pro-man/pro13/index.html)

mod layout;
mod opcodes;

pub use layout::*;
pub use opcodes::*;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// One display-list record
///
/// # Examples
///
/// ```
/// use ultragfx::core::gbi::Gfx;
///
/// let gfx = Gfx::new(0xDF00_0000, 0);
/// assert_eq!(gfx.opcode(), -33);
/// assert_eq!(gfx.opcode_byte(), 0xDF);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Gfx {
    pub w0: u32,
    pub w1: u32,
}

impl Gfx {
    /// Size of one record in memory
    pub const SIZE: usize = 8;

    pub const fn new(w0: u32, w1: u32) -> Self {
        Self { w0, w1 }
    }

    /// Decode a record from its big-endian memory image
    pub fn from_be_bytes(bytes: &[u8; 8]) -> Self {
        Self {
            w0: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            w1: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    /// Encode the record as it appears in memory
    pub fn to_be_bytes(self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out[..4].copy_from_slice(&self.w0.to_be_bytes());
        out[4..].copy_from_slice(&self.w1.to_be_bytes());
        out
    }

    /// Signed opcode (top byte of w0)
    #[inline(always)]
    pub fn opcode(self) -> i8 {
        (self.w0 >> 24) as u8 as i8
    }

    /// Opcode as an unsigned table index
    #[inline(always)]
    pub fn opcode_byte(self) -> u8 {
        (self.w0 >> 24) as u8
    }

    /// Build a record from an opcode byte and the low 24 bits of w0
    pub const fn with_opcode(opcode: u8, w0_low: u32, w1: u32) -> Self {
        Self {
            w0: ((opcode as u32) << 24) | (w0_low & 0x00FF_FFFF),
            w1,
        }
    }
}

/// Extract `width` bits of `word` starting at bit `pos`
///
/// # Examples
///
/// ```
/// use ultragfx::core::gbi::get_cmd;
///
/// assert_eq!(get_cmd(0xDA38_0003, 0, 8), 0x03);
/// assert_eq!(get_cmd(0xDA38_0003, 16, 8), 0x38);
/// ```
#[inline(always)]
pub const fn get_cmd(word: u32, pos: u32, width: u32) -> u32 {
    if width >= 32 {
        word >> pos
    } else {
        (word >> pos) & ((1u32 << width) - 1)
    }
}

/// Microcode generation driving the RSP opcode table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ucode {
    /// Fast3D
    F3d,
    /// Fast3D extended (64-vertex buffer, TRI2)
    F3dex,
    /// Second-generation Fast3D extended
    F3dex2,
}

impl Ucode {
    pub fn name(self) -> &'static str {
        match self {
            Ucode::F3d => "F3D",
            Ucode::F3dex => "F3DEX",
            Ucode::F3dex2 => "F3DEX2",
        }
    }

    /// Map the operand of the set-ucode extension command
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Ucode::F3d),
            1 => Some(Ucode::F3dex),
            2 => Some(Ucode::F3dex2),
            _ => None,
        }
    }
}

impl std::fmt::Display for Ucode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// Texture image formats
pub const G_IM_FMT_RGBA: u8 = 0;
pub const G_IM_FMT_YUV: u8 = 1;
pub const G_IM_FMT_CI: u8 = 2;
pub const G_IM_FMT_IA: u8 = 3;
pub const G_IM_FMT_I: u8 = 4;

// Texel sizes
pub const G_IM_SIZ_4B: u8 = 0;
pub const G_IM_SIZ_8B: u8 = 1;
pub const G_IM_SIZ_16B: u8 = 2;
pub const G_IM_SIZ_32B: u8 = 3;

// Tile clamp/mirror flags
pub const G_TX_NOMIRROR: u8 = 0;
pub const G_TX_WRAP: u8 = 0;
pub const G_TX_MIRROR: u8 = 1;
pub const G_TX_CLAMP: u8 = 2;

/// Tile descriptor index used for loads
pub const G_TX_LOADTILE: u8 = 7;

// Other-mode H shifts and values
pub const G_MDSFT_TEXTFILT: u32 = 12;
pub const G_MDSFT_TEXTLUT: u32 = 14;
pub const G_MDSFT_CYCLETYPE: u32 = 20;

pub const G_TF_POINT: u32 = 0 << G_MDSFT_TEXTFILT;
pub const G_TF_BILERP: u32 = 2 << G_MDSFT_TEXTFILT;
pub const G_TF_AVERAGE: u32 = 3 << G_MDSFT_TEXTFILT;

pub const G_TT_NONE: u32 = 0 << G_MDSFT_TEXTLUT;
pub const G_TT_RGBA16: u32 = 2 << G_MDSFT_TEXTLUT;
pub const G_TT_IA16: u32 = 3 << G_MDSFT_TEXTLUT;

pub const G_CYC_1CYCLE: u32 = 0 << G_MDSFT_CYCLETYPE;
pub const G_CYC_2CYCLE: u32 = 1 << G_MDSFT_CYCLETYPE;
pub const G_CYC_COPY: u32 = 2 << G_MDSFT_CYCLETYPE;
pub const G_CYC_FILL: u32 = 3 << G_MDSFT_CYCLETYPE;

// Other-mode L
pub const G_AC_NONE: u32 = 0;
pub const G_AC_THRESHOLD: u32 = 1;
pub const G_AC_DITHER: u32 = 3;

pub const Z_CMP: u32 = 0x10;
pub const Z_UPD: u32 = 0x20;
pub const ZMODE_DEC: u32 = 0xC00;
pub const CVG_X_ALPHA: u32 = 0x1000;

// Blender operand encodings
pub const G_BL_CLR_MEM: u32 = 1;
pub const G_BL_CLR_FOG: u32 = 3;
pub const G_BL_A_MEM: u32 = 1;
pub const G_BL_0: u32 = 3;

// Color combiner inputs; meaning of 6 and up depends on the operand
pub const G_CCMUX_COMBINED: u32 = 0;
pub const G_CCMUX_TEXEL0: u32 = 1;
pub const G_CCMUX_TEXEL1: u32 = 2;
pub const G_CCMUX_PRIMITIVE: u32 = 3;
pub const G_CCMUX_SHADE: u32 = 4;
pub const G_CCMUX_ENVIRONMENT: u32 = 5;
pub const G_CCMUX_1: u32 = 6;
pub const G_CCMUX_CENTER: u32 = 6;
pub const G_CCMUX_SCALE: u32 = 6;
pub const G_CCMUX_NOISE: u32 = 7;
pub const G_CCMUX_K4: u32 = 7;
pub const G_CCMUX_COMBINED_ALPHA: u32 = 7;
pub const G_CCMUX_TEXEL0_ALPHA: u32 = 8;
pub const G_CCMUX_TEXEL1_ALPHA: u32 = 9;
pub const G_CCMUX_PRIMITIVE_ALPHA: u32 = 10;
pub const G_CCMUX_SHADE_ALPHA: u32 = 11;
pub const G_CCMUX_ENV_ALPHA: u32 = 12;
pub const G_CCMUX_LOD_FRACTION: u32 = 13;
pub const G_CCMUX_PRIM_LOD_FRAC: u32 = 14;
pub const G_CCMUX_K5: u32 = 15;
pub const G_CCMUX_0: u32 = 31;

// Alpha combiner inputs
pub const G_ACMUX_COMBINED: u32 = 0;
pub const G_ACMUX_LOD_FRACTION: u32 = 0;
pub const G_ACMUX_TEXEL0: u32 = 1;
pub const G_ACMUX_TEXEL1: u32 = 2;
pub const G_ACMUX_PRIMITIVE: u32 = 3;
pub const G_ACMUX_SHADE: u32 = 4;
pub const G_ACMUX_ENVIRONMENT: u32 = 5;
pub const G_ACMUX_1: u32 = 6;
pub const G_ACMUX_PRIM_LOD_FRAC: u32 = 6;
pub const G_ACMUX_0: u32 = 7;

bitflags! {
    /// RSP geometry mode, stored in the second-generation bit layout
    ///
    /// First-generation microcodes use different positions for the culling
    /// and smooth-shading bits; [`GeometryMode::from_f3d`] translates them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct GeometryMode: u32 {
        const ZBUFFER = 0x0000_0001;
        const SHADE = 0x0000_0004;
        const CULL_FRONT = 0x0000_0200;
        const CULL_BACK = 0x0000_0400;
        const CULL_BOTH = Self::CULL_FRONT.bits() | Self::CULL_BACK.bits();
        const FOG = 0x0001_0000;
        const LIGHTING = 0x0002_0000;
        const TEXTURE_GEN = 0x0004_0000;
        const TEXTURE_GEN_LINEAR = 0x0008_0000;
        const LOD = 0x0010_0000;
        const SHADING_SMOOTH = 0x0020_0000;
    }
}

impl GeometryMode {
    const F3D_SHADING_SMOOTH: u32 = 0x0000_0200;
    const F3D_CULL_FRONT: u32 = 0x0000_1000;
    const F3D_CULL_BACK: u32 = 0x0000_2000;

    /// Translate a first-generation geometry word
    ///
    /// # Examples
    ///
    /// ```
    /// use ultragfx::core::gbi::GeometryMode;
    ///
    /// let mode = GeometryMode::from_f3d(0x0000_2205);
    /// assert!(mode.contains(GeometryMode::CULL_BACK));
    /// assert!(mode.contains(GeometryMode::SHADING_SMOOTH));
    /// assert!(mode.contains(GeometryMode::ZBUFFER | GeometryMode::SHADE));
    /// ```
    pub fn from_f3d(word: u32) -> Self {
        let shared = Self::ZBUFFER.bits()
            | Self::SHADE.bits()
            | Self::FOG.bits()
            | Self::LIGHTING.bits()
            | Self::TEXTURE_GEN.bits()
            | Self::TEXTURE_GEN_LINEAR.bits()
            | Self::LOD.bits();
        let mut mode = Self::from_bits_truncate(word & shared);
        mode.set(Self::SHADING_SMOOTH, word & Self::F3D_SHADING_SMOOTH != 0);
        mode.set(Self::CULL_FRONT, word & Self::F3D_CULL_FRONT != 0);
        mode.set(Self::CULL_BACK, word & Self::F3D_CULL_BACK != 0);
        mode
    }

    /// Translate a raw geometry word for the given microcode
    pub fn from_ucode(word: u32, ucode: Ucode) -> Self {
        match ucode {
            Ucode::F3d | Ucode::F3dex => Self::from_f3d(word),
            Ucode::F3dex2 => Self::from_bits_truncate(word),
        }
    }
}

bitflags! {
    /// Extension geometry flags with no hardware counterpart
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ExtraGeometryMode: u32 {
        /// Flip the winding used by back-face culling
        const INVERT_CULLING = 0x0000_0001;
        /// Take every depth-conditional branch
        const ALWAYS_EXECUTE_BRANCH = 0x0000_0002;
    }
}

/// Split a packed RGBA8888 word
#[inline]
pub const fn unpack_rgba(word: u32) -> [u8; 4] {
    [
        (word >> 24) as u8,
        (word >> 16) as u8,
        (word >> 8) as u8,
        word as u8,
    ]
}

/// Expand an RGBA5551 texel to RGBA8
///
/// # Examples
///
/// ```
/// use ultragfx::core::gbi::rgba5551_to_rgba8;
///
/// assert_eq!(rgba5551_to_rgba8(0xFFFF), [255, 255, 255, 255]);
/// assert_eq!(rgba5551_to_rgba8(0xF800), [255, 0, 0, 0]);
/// ```
#[inline]
pub const fn rgba5551_to_rgba8(texel: u16) -> [u8; 4] {
    let r = ((texel >> 11) & 0x1F) as u32;
    let g = ((texel >> 6) & 0x1F) as u32;
    let b = ((texel >> 1) & 0x1F) as u32;
    let a = (texel & 1) as u8;
    [
        (r * 255 / 31) as u8,
        (g * 255 / 31) as u8,
        (b * 255 / 31) as u8,
        a * 255,
    ]
}
