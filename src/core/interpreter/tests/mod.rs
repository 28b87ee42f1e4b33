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

//! Interpreter tests
//!
//! Tests are organized into the following modules:
//! - `dispatch`: Call/branch/return, segments, unknown opcodes, microcode switches
//! - `draw`: Batching, culling, rectangles and vertex layout
//! - `texture`: Texture loads, the cache and framebuffer textures
//! - `ext`: Resource-addressed commands, render targets and post effects
//! - `debugger`: Breakpoints, pause and resume

mod draw;
mod ext;

use super::*;
pub(super) use crate::core::backend::{BackendCall, RecordingBackend};
pub(super) use crate::core::debugger::NoDebugger;
pub(super) use crate::core::gbi::{
    ExtOp, Vtx, G_ACMUX_TEXEL0, G_CCMUX_TEXEL0, G_IM_FMT_RGBA, G_IM_SIZ_16B,
};
pub(super) use crate::core::resource::ResourceStore;

pub(super) const ROOT: u32 = 0x1000;
pub(super) const VERTICES: u32 = 0x3000;
pub(super) const TEXELS: u32 = 0x4000;

pub(super) fn interpreter() -> Interpreter<RecordingBackend> {
    Interpreter::new(RecordingBackend::new(), InterpreterConfig::default())
}

/// Run `list` from memory at [`ROOT`] and expect it to finish
pub(super) fn run(gfx: &mut Interpreter<RecordingBackend>, store: &ResourceStore) {
    assert_eq!(gfx.run(store, &NoDebugger, ROOT), RunOutcome::Finished);
}

pub(super) fn vtx(x: i16, y: i16, z: i16, color: [u8; 4]) -> Vtx {
    Vtx {
        ob: [x, y, z],
        flag: 0,
        tc: [0, 0],
        cn: color,
    }
}

/// Three on-screen vertices at [`VERTICES`]
pub(super) fn store_with_triangle() -> ResourceStore {
    let mut store = ResourceStore::new();
    store.insert_vertices(
        VERTICES,
        &[
            vtx(0, 0, 0, [255, 0, 0, 255]),
            vtx(1, 0, 0, [0, 255, 0, 255]),
            vtx(0, 1, 0, [0, 0, 255, 255]),
        ],
    );
    store
}

// Second-generation command builders

pub(super) fn end_dl() -> Gfx {
    Gfx::with_opcode(0xDF, 0, 0)
}

pub(super) fn dl(addr: u32, branch: bool) -> Gfx {
    Gfx::with_opcode(0xDE, if branch { 1 << 16 } else { 0 }, addr)
}

pub(super) fn load_vertices(addr: u32, count: u32, dest: u32) -> Gfx {
    Gfx::with_opcode(0x01, (count << 12) | ((dest + count) << 1), addr)
}

pub(super) fn tri1(a: u32, b: u32, c: u32) -> Gfx {
    Gfx::with_opcode(0x05, (a * 2) << 16 | (b * 2) << 8 | (c * 2), 0)
}

pub(super) fn geometry_mode(clear: u32, set: u32) -> Gfx {
    Gfx::with_opcode(0xD9, !clear & 0x00FF_FFFF, set)
}

pub(super) fn segment(index: u32, base: u32) -> Gfx {
    Gfx::with_opcode(0xDB, (0x06 << 16) | (index * 4), base)
}

pub(super) fn prim_color(rgba: u32) -> Gfx {
    Gfx::with_opcode(0xFA, 0, rgba)
}

pub(super) fn env_color(rgba: u32) -> Gfx {
    Gfx::with_opcode(0xFB, 0, rgba)
}

pub(super) fn color_image(addr: u32) -> Gfx {
    Gfx::with_opcode(0xFF, 0, addr)
}

pub(super) fn fill_rect(ulx: u32, uly: u32, lrx: u32, lry: u32) -> Gfx {
    Gfx::with_opcode(0xF6, (lrx << 14) | (lry << 2), (ulx << 14) | (uly << 2))
}

pub(super) fn set_timg(fmt: u8, siz: u8, width: u32, addr: u32) -> Gfx {
    Gfx::with_opcode(0xFD, (fmt as u32) << 21 | (siz as u32) << 19 | (width - 1), addr)
}

pub(super) fn set_tile(tile: u32, fmt: u8, siz: u8, line: u32, tmem: u32, cms: u8) -> Gfx {
    Gfx::with_opcode(
        0xF5,
        (fmt as u32) << 21 | (siz as u32) << 19 | line << 9 | tmem,
        tile << 24 | (cms as u32) << 8,
    )
}

pub(super) fn load_block(tile: u32, texels: u32) -> Gfx {
    Gfx::with_opcode(0xF3, 0, tile << 24 | (texels - 1) << 12)
}

pub(super) fn set_tile_size(tile: u32, width: u32, height: u32) -> Gfx {
    Gfx::with_opcode(0xF2, 0, tile << 24 | ((width - 1) << 2) << 12 | ((height - 1) << 2))
}

/// Combiner whose color and alpha are both the D operand of cycle 0
pub(super) fn combine_d(rgb: u32, alpha: u32) -> Gfx {
    Gfx::with_opcode(0xFC, 0, (rgb << 15) | (alpha << 9))
}

/// Textured-triangle setup: 4x4 RGBA16 block load into tile 0
pub(super) fn rgba16_setup(declared_width: u32, cms: u8) -> Vec<Gfx> {
    vec![
        combine_d(G_CCMUX_TEXEL0, G_ACMUX_TEXEL0),
        set_timg(G_IM_FMT_RGBA, G_IM_SIZ_16B, 4, TEXELS),
        set_tile(0, G_IM_FMT_RGBA, G_IM_SIZ_16B, 1, 0, cms),
        load_block(0, 16),
        set_tile_size(0, declared_width, 4),
        load_vertices(VERTICES, 3, 0),
    ]
}

pub(super) fn store_with_texels() -> ResourceStore {
    let mut store = store_with_triangle();
    // Opaque red in RGBA5551
    let texels = [0xF8u8, 0x01].repeat(16);
    store.insert_region(TEXELS, texels);
    store
}

pub(super) fn ext(op: ExtOp, w0_low: u32, w1: u32) -> Gfx {
    Gfx::with_opcode(op as u8, w0_low, w1)
}

pub(super) fn hash_record(hash: u64) -> Gfx {
    Gfx::new((hash >> 32) as u32, hash as u32)
}
