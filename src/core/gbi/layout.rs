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

//! Big-endian memory layouts referenced by commands

use glam::Mat4;
use serde::{Deserialize, Serialize};

#[inline]
fn be_i16(bytes: &[u8], at: usize) -> i16 {
    i16::from_be_bytes([bytes[at], bytes[at + 1]])
}

#[inline]
fn be_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([bytes[at], bytes[at + 1]])
}

#[inline]
fn be_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Object-space vertex as stored in memory (16 bytes)
///
/// ```text
/// 0x00  i16 x, y, z
/// 0x06  u16 flag
/// 0x08  i16 s, t     (S10.5)
/// 0x0C  u8  r, g, b, a   or   i8 nx, ny, nz, u8 a
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Vtx {
    pub ob: [i16; 3],
    pub flag: u16,
    pub tc: [i16; 2],
    pub cn: [u8; 4],
}

impl Vtx {
    pub const SIZE: usize = 16;

    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        Self {
            ob: [be_i16(bytes, 0), be_i16(bytes, 2), be_i16(bytes, 4)],
            flag: be_u16(bytes, 6),
            tc: [be_i16(bytes, 8), be_i16(bytes, 10)],
            cn: [bytes[12], bytes[13], bytes[14], bytes[15]],
        }
    }

    pub fn to_be_bytes(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        for (i, v) in self.ob.iter().enumerate() {
            out[i * 2..i * 2 + 2].copy_from_slice(&v.to_be_bytes());
        }
        out[6..8].copy_from_slice(&self.flag.to_be_bytes());
        out[8..10].copy_from_slice(&self.tc[0].to_be_bytes());
        out[10..12].copy_from_slice(&self.tc[1].to_be_bytes());
        out[12..16].copy_from_slice(&self.cn);
        out
    }

    /// Color bytes reinterpreted as a signed normal
    #[inline]
    pub fn normal(&self) -> [i8; 3] {
        [self.cn[0] as i8, self.cn[1] as i8, self.cn[2] as i8]
    }
}

/// Light record as stored in memory (16 bytes)
///
/// A nonzero byte 3 marks a positional light, whose bytes 8..14 hold an
/// `i16` position instead of an `i8` direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawLight {
    pub col: [u8; 3],
    pub kc: u8,
    pub colc: [u8; 3],
    pub kl: u8,
    pub dir: [i8; 3],
    pub pos: [i16; 3],
    pub kq: u8,
}

impl RawLight {
    pub const SIZE: usize = 16;

    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        Self {
            col: [bytes[0], bytes[1], bytes[2]],
            kc: bytes[3],
            colc: [bytes[4], bytes[5], bytes[6]],
            kl: bytes[7],
            dir: [bytes[8] as i8, bytes[9] as i8, bytes[10] as i8],
            pos: [be_i16(bytes, 8), be_i16(bytes, 10), be_i16(bytes, 12)],
            kq: bytes[14],
        }
    }

    #[inline]
    pub fn is_positional(&self) -> bool {
        self.kc != 0
    }
}

/// Viewport record (16 bytes, quarter-pixel units)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub vscale: [i16; 4],
    pub vtrans: [i16; 4],
}

impl Viewport {
    pub const SIZE: usize = 16;

    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let mut vp = Viewport::default();
        for i in 0..4 {
            vp.vscale[i] = be_i16(bytes, i * 2);
            vp.vtrans[i] = be_i16(bytes, 8 + i * 2);
        }
        vp
    }
}

/// Size of a fixed-point or float matrix in memory
pub const MTX_SIZE: usize = 64;

/// Decode an S15.16 fixed-point matrix
///
/// The integer halves of all sixteen elements come first (two per word),
/// followed by the fractional halves in the same order. Row `i` of the
/// console matrix becomes column `i` of the returned [`Mat4`], so the
/// console's row-vector products map onto glam's column-vector products.
pub fn decode_fixed_matrix(bytes: &[u8]) -> Mat4 {
    let mut m = [[0.0f32; 4]; 4];
    for (i, row) in m.iter_mut().enumerate() {
        for j in (0..4).step_by(2) {
            let word = i * 2 + j / 2;
            let int_part = be_u32(bytes, word * 4);
            let frac_part = be_u32(bytes, (8 + word) * 4);
            row[j] = ((int_part & 0xFFFF_0000) | (frac_part >> 16)) as i32 as f32 / 65536.0;
            row[j + 1] = ((int_part << 16) | (frac_part & 0xFFFF)) as i32 as f32 / 65536.0;
        }
    }
    Mat4::from_cols_array_2d(&m)
}

/// Decode a matrix stored as sixteen big-endian floats (row major)
pub fn decode_float_matrix(bytes: &[u8]) -> Mat4 {
    let mut m = [[0.0f32; 4]; 4];
    for (i, row) in m.iter_mut().enumerate() {
        for (j, value) in row.iter_mut().enumerate() {
            *value = f32::from_bits(be_u32(bytes, (i * 4 + j) * 4));
        }
    }
    Mat4::from_cols_array_2d(&m)
}

/// Encode a matrix into the fixed-point memory layout
pub fn encode_fixed_matrix(matrix: &Mat4) -> [u8; MTX_SIZE] {
    let m = matrix.to_cols_array_2d();
    let mut out = [0u8; MTX_SIZE];
    for (i, row) in m.iter().enumerate() {
        for j in (0..4).step_by(2) {
            let word = i * 2 + j / 2;
            let a = (row[j] * 65536.0) as i32 as u32;
            let b = (row[j + 1] * 65536.0) as i32 as u32;
            let int_part = (a & 0xFFFF_0000) | (b >> 16);
            let frac_part = (a << 16) | (b & 0xFFFF);
            out[word * 4..word * 4 + 4].copy_from_slice(&int_part.to_be_bytes());
            out[(8 + word) * 4..(8 + word) * 4 + 4].copy_from_slice(&frac_part.to_be_bytes());
        }
    }
    out
}
