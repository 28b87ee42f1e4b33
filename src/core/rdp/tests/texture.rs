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

//! Texel decoder tests

use super::super::*;
use crate::core::error::GfxError;
use crate::core::gbi::{
    rgba5551_to_rgba8, G_IM_FMT_CI, G_IM_FMT_I, G_IM_FMT_IA, G_IM_FMT_RGBA, G_IM_FMT_YUV,
    G_IM_SIZ_16B, G_IM_SIZ_32B, G_IM_SIZ_4B, G_IM_SIZ_8B,
};

/// Two 128-entry banks where entry `n` of the whole table is `n * 0x101`
fn palette_table() -> (Vec<u8>, Vec<u8>) {
    let entry = |n: usize| ((n as u16).wrapping_mul(0x0101) | 1).to_be_bytes();
    let low: Vec<u8> = (0..128).flat_map(entry).collect();
    let high: Vec<u8> = (128..256).flat_map(entry).collect();
    (low, high)
}

#[test]
fn test_ci8_matches_manual_palette_lookup() {
    let (low, high) = palette_table();
    let palette = Palette {
        banks: [&low, &high],
        index: 0,
        ia16: false,
    };
    let indices = [0u8, 1, 127, 128, 200, 255, 17, 64];

    let tex = decode_texture(G_IM_FMT_CI, G_IM_SIZ_8B, &indices, 4, 2, Some(&palette)).unwrap();

    let expected: Vec<u8> = indices
        .iter()
        .flat_map(|&i| {
            let n = i as usize;
            let word = (n as u16).wrapping_mul(0x0101) | 1;
            rgba5551_to_rgba8(word)
        })
        .collect();
    assert_eq!(tex.width, 4);
    assert_eq!(tex.height, 2);
    assert_eq!(tex.rgba, expected);
}

#[test]
fn test_ci4_uses_palette_index_bank() {
    let (low, high) = palette_table();
    // Palette 9: bank 1, entries 16..32
    let palette = Palette {
        banks: [&low, &high],
        index: 9,
        ia16: false,
    };
    let tex = decode_texture(G_IM_FMT_CI, G_IM_SIZ_4B, &[0x0F], 2, 1, Some(&palette)).unwrap();

    let table_entry = |n: usize| rgba5551_to_rgba8((n as u16).wrapping_mul(0x0101) | 1);
    assert_eq!(&tex.rgba[0..4], &table_entry(128 + 16));
    assert_eq!(&tex.rgba[4..8], &table_entry(128 + 31));
}

#[test]
fn test_ci_with_ia16_palette() {
    let bank = [0x80u8, 0x40];
    let palette = Palette {
        banks: [&bank, &[]],
        index: 0,
        ia16: true,
    };
    let tex = decode_texture(G_IM_FMT_CI, G_IM_SIZ_8B, &[0], 1, 1, Some(&palette)).unwrap();
    assert_eq!(tex.rgba, vec![0x80, 0x80, 0x80, 0x40]);
}

#[test]
fn test_ci_without_palette_is_transparent() {
    let tex = decode_texture(G_IM_FMT_CI, G_IM_SIZ_8B, &[5, 6], 2, 1, None).unwrap();
    assert_eq!(tex.rgba, vec![0; 8]);
}

#[test]
fn test_rgba16() {
    let tex = decode_texture(G_IM_FMT_RGBA, G_IM_SIZ_16B, &[0xF8, 0x01, 0x07, 0xC0], 2, 1, None)
        .unwrap();
    assert_eq!(tex.rgba, vec![255, 0, 0, 255, 0, 255, 0, 0]);
}

#[test]
fn test_rgba32_passthrough() {
    let data = [1, 2, 3, 4, 5, 6, 7, 8];
    let tex = decode_texture(G_IM_FMT_RGBA, G_IM_SIZ_32B, &data, 1, 2, None).unwrap();
    assert_eq!(tex.rgba, data.to_vec());
}

#[test]
fn test_ia4() {
    // 0xF: intensity 7, alpha set; 0x2: intensity 1, alpha clear
    let tex = decode_texture(G_IM_FMT_IA, G_IM_SIZ_4B, &[0xF2], 2, 1, None).unwrap();
    assert_eq!(tex.rgba, vec![0xFC, 0xFC, 0xFC, 0xFF, 0x24, 0x24, 0x24, 0x00]);
}

#[test]
fn test_ia8() {
    let tex = decode_texture(G_IM_FMT_IA, G_IM_SIZ_8B, &[0xA5], 1, 1, None).unwrap();
    assert_eq!(tex.rgba, vec![0xAA, 0xAA, 0xAA, 0x55]);
}

#[test]
fn test_ia16() {
    let tex = decode_texture(G_IM_FMT_IA, G_IM_SIZ_16B, &[0x12, 0x34], 1, 1, None).unwrap();
    assert_eq!(tex.rgba, vec![0x12, 0x12, 0x12, 0x34]);
}

#[test]
fn test_i4_odd_width() {
    let tex = decode_texture(G_IM_FMT_I, G_IM_SIZ_4B, &[0x1F, 0x80], 3, 1, None).unwrap();
    assert_eq!(
        tex.rgba,
        vec![0x11, 0x11, 0x11, 0x11, 0xFF, 0xFF, 0xFF, 0xFF, 0x88, 0x88, 0x88, 0x88]
    );
}

#[test]
fn test_short_data_is_error() {
    let err = decode_texture(G_IM_FMT_RGBA, G_IM_SIZ_16B, &[0; 6], 2, 2, None).unwrap_err();
    assert!(matches!(
        err,
        GfxError::TextureDataTooShort { needed: 8, got: 6 }
    ));
}

#[test]
fn test_unsupported_format() {
    let err = decode_texture(G_IM_FMT_YUV, G_IM_SIZ_16B, &[0; 8], 2, 2, None).unwrap_err();
    assert!(matches!(err, GfxError::UnsupportedTexture { .. }));
    let err = decode_texture(G_IM_FMT_I, G_IM_SIZ_16B, &[0; 8], 2, 2, None).unwrap_err();
    assert!(matches!(err, GfxError::UnsupportedTexture { .. }));
}

#[test]
fn test_rescale_nearest() {
    // 2x1 red/blue doubled horizontally and vertically
    let src = [255, 0, 0, 255, 0, 0, 255, 255];
    let out = rescale_nearest(&src, 2, 1, 4, 2);
    let row = [
        255, 0, 0, 255, 255, 0, 0, 255, 0, 0, 255, 255, 0, 0, 255, 255,
    ];
    assert_eq!(&out[..16], &row);
    assert_eq!(&out[16..], &row);
}

#[test]
fn test_rescale_same_size_is_identity() {
    let src = vec![9u8; 16];
    assert_eq!(rescale_nearest(&src, 2, 2, 2, 2), src);
}
