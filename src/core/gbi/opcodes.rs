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

//! Opcode tables
//!
//! Three disjoint opcode spaces share the top byte of w0:
//!
//! | Range        | Table            | Selected by            |
//! |--------------|------------------|------------------------|
//! | 0x20..=0x40  | [`ExtOp`]        | always                 |
//! | 0xE4..=0xFF  | [`RdpOp`]        | always                 |
//! | rest         | [`RspOp`] tables | active [`Ucode`]       |
//!
//! Lookup tries them in that order. The RSP tables are 256-entry arrays
//! built at compile time, one per microcode generation.

use strum::FromRepr;

use super::Ucode;

/// Library extension commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr)]
#[repr(u8)]
pub enum ExtOp {
    /// Set texture image from a content hash (hash in the next record)
    SetTimgHash = 0x20,
    /// Redirect rendering to an auxiliary framebuffer
    SetFb = 0x21,
    /// Return rendering to the primary target
    ResetFb = 0x22,
    /// Bind a framebuffer as the texture of a tile
    SetTimgFb = 0x23,
    /// Load vertices from a path-addressed resource
    VtxPath = 0x24,
    /// Set texture image from a path-addressed resource
    SetTimgPath = 0x25,
    /// Call or branch to a path-addressed display list
    DlPath = 0x26,
    /// Call or branch to a hash-addressed display list (hash in next record)
    DlHash = 0x27,
    /// Load vertices from a hash-addressed resource (hash in next record)
    VtxHash = 0x28,
    /// Debug label
    Marker = 0x29,
    /// Drop cached textures for one source address, or all of them
    InvalidateTexCache = 0x2A,
    /// Select or clear a host-supplied shader
    LoadShader = 0x2B,
    /// Toggle the grayscale post-process
    SetGrayscale = 0x2C,
    /// Set the grayscale tint color
    SetIntensity = 0x2D,
    /// Modify the extension geometry flags
    ExtraGeometryMode = 0x2E,
    /// Copy one framebuffer into another
    CopyFb = 0x2F,
    /// Read a framebuffer back to the CPU
    ReadFb = 0x30,
    /// Attach mask/blend textures to a texture source
    RegisterBlendedTexture = 0x31,
    /// Switch the active microcode table
    SetUcode = 0x32,
}

/// RDP immediate commands, shared by every microcode generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr)]
#[repr(u8)]
pub enum RdpOp {
    TexRect = 0xE4,
    TexRectFlip = 0xE5,
    LoadSync = 0xE6,
    PipeSync = 0xE7,
    TileSync = 0xE8,
    FullSync = 0xE9,
    SetKeyGb = 0xEA,
    SetKeyR = 0xEB,
    SetConvert = 0xEC,
    SetScissor = 0xED,
    SetPrimDepth = 0xEE,
    SetOtherMode = 0xEF,
    LoadTlut = 0xF0,
    SetTileSize = 0xF2,
    LoadBlock = 0xF3,
    LoadTile = 0xF4,
    SetTile = 0xF5,
    FillRect = 0xF6,
    SetFillColor = 0xF7,
    SetFogColor = 0xF8,
    SetBlendColor = 0xF9,
    SetPrimColor = 0xFA,
    SetEnvColor = 0xFB,
    SetCombine = 0xFC,
    SetTimg = 0xFD,
    SetZImg = 0xFE,
    SetCImg = 0xFF,
}

/// RSP commands, independent of their per-generation encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RspOp {
    Noop,
    SpNoop,
    Mtx,
    PopMtx,
    MoveMem,
    MoveWord,
    Vtx,
    ModifyVtx,
    CullDl,
    BranchZ,
    Tri1,
    Tri2,
    Quad,
    Texture,
    GeometryMode,
    SetGeometryMode,
    ClearGeometryMode,
    SetOtherModeL,
    SetOtherModeH,
    Dl,
    EndDl,
    LoadUcode,
    RdpHalf1,
    RdpHalf2,
}

/// A decoded opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Ext(ExtOp),
    Rdp(RdpOp),
    Rsp(RspOp),
}

/// Fast3D opcode bytes
pub mod f3d {
    pub const G_SPNOOP: u8 = 0x00;
    pub const G_MTX: u8 = 0x01;
    pub const G_MOVEMEM: u8 = 0x03;
    pub const G_VTX: u8 = 0x04;
    pub const G_DL: u8 = 0x06;
    pub const G_RDPHALF_2: u8 = 0xB3;
    pub const G_RDPHALF_1: u8 = 0xB4;
    pub const G_CLEARGEOMETRYMODE: u8 = 0xB6;
    pub const G_SETGEOMETRYMODE: u8 = 0xB7;
    pub const G_ENDDL: u8 = 0xB8;
    pub const G_SETOTHERMODE_L: u8 = 0xB9;
    pub const G_SETOTHERMODE_H: u8 = 0xBA;
    pub const G_TEXTURE: u8 = 0xBB;
    pub const G_MOVEWORD: u8 = 0xBC;
    pub const G_POPMTX: u8 = 0xBD;
    pub const G_CULLDL: u8 = 0xBE;
    pub const G_TRI1: u8 = 0xBF;
    pub const G_NOOP: u8 = 0xC0;
}

/// Fast3D extended opcode bytes (on top of [`f3d`])
pub mod f3dex {
    pub use super::f3d::*;

    pub const G_LOAD_UCODE: u8 = 0xAF;
    pub const G_BRANCH_Z: u8 = 0xB0;
    pub const G_TRI2: u8 = 0xB1;
    pub const G_MODIFYVTX: u8 = 0xB2;
    pub const G_QUAD: u8 = 0xB5;
}

/// Second-generation opcode bytes
pub mod f3dex2 {
    pub const G_NOOP: u8 = 0x00;
    pub const G_VTX: u8 = 0x01;
    pub const G_MODIFYVTX: u8 = 0x02;
    pub const G_CULLDL: u8 = 0x03;
    pub const G_BRANCH_Z: u8 = 0x04;
    pub const G_TRI1: u8 = 0x05;
    pub const G_TRI2: u8 = 0x06;
    pub const G_QUAD: u8 = 0x07;
    pub const G_TEXTURE: u8 = 0xD7;
    pub const G_POPMTX: u8 = 0xD8;
    pub const G_GEOMETRYMODE: u8 = 0xD9;
    pub const G_MTX: u8 = 0xDA;
    pub const G_MOVEWORD: u8 = 0xDB;
    pub const G_MOVEMEM: u8 = 0xDC;
    pub const G_LOAD_UCODE: u8 = 0xDD;
    pub const G_DL: u8 = 0xDE;
    pub const G_ENDDL: u8 = 0xDF;
    pub const G_SPNOOP: u8 = 0xE0;
    pub const G_RDPHALF_1: u8 = 0xE1;
    pub const G_SETOTHERMODE_L: u8 = 0xE2;
    pub const G_SETOTHERMODE_H: u8 = 0xE3;
    pub const G_RDPHALF_2: u8 = 0xF1;
}

type RspTable = [Option<RspOp>; 256];

const fn build_table(entries: &[(u8, RspOp)]) -> RspTable {
    let mut table = [None; 256];
    let mut i = 0;
    while i < entries.len() {
        table[entries[i].0 as usize] = Some(entries[i].1);
        i += 1;
    }
    table
}

const F3D_COMMON: [(u8, RspOp); 18] = [
    (f3d::G_SPNOOP, RspOp::SpNoop),
    (f3d::G_MTX, RspOp::Mtx),
    (f3d::G_MOVEMEM, RspOp::MoveMem),
    (f3d::G_VTX, RspOp::Vtx),
    (f3d::G_DL, RspOp::Dl),
    (f3d::G_RDPHALF_2, RspOp::RdpHalf2),
    (f3d::G_RDPHALF_1, RspOp::RdpHalf1),
    (f3d::G_CLEARGEOMETRYMODE, RspOp::ClearGeometryMode),
    (f3d::G_SETGEOMETRYMODE, RspOp::SetGeometryMode),
    (f3d::G_ENDDL, RspOp::EndDl),
    (f3d::G_SETOTHERMODE_L, RspOp::SetOtherModeL),
    (f3d::G_SETOTHERMODE_H, RspOp::SetOtherModeH),
    (f3d::G_TEXTURE, RspOp::Texture),
    (f3d::G_MOVEWORD, RspOp::MoveWord),
    (f3d::G_POPMTX, RspOp::PopMtx),
    (f3d::G_CULLDL, RspOp::CullDl),
    (f3d::G_TRI1, RspOp::Tri1),
    (f3d::G_NOOP, RspOp::Noop),
];

const fn build_f3dex_table() -> RspTable {
    let mut table = build_table(&F3D_COMMON);
    table[f3dex::G_LOAD_UCODE as usize] = Some(RspOp::LoadUcode);
    table[f3dex::G_BRANCH_Z as usize] = Some(RspOp::BranchZ);
    table[f3dex::G_TRI2 as usize] = Some(RspOp::Tri2);
    table[f3dex::G_MODIFYVTX as usize] = Some(RspOp::ModifyVtx);
    table[f3dex::G_QUAD as usize] = Some(RspOp::Quad);
    table
}

static F3D_TABLE: RspTable = build_table(&F3D_COMMON);

static F3DEX_TABLE: RspTable = build_f3dex_table();

static F3DEX2_TABLE: RspTable = build_table(&[
    (f3dex2::G_NOOP, RspOp::Noop),
    (f3dex2::G_VTX, RspOp::Vtx),
    (f3dex2::G_MODIFYVTX, RspOp::ModifyVtx),
    (f3dex2::G_CULLDL, RspOp::CullDl),
    (f3dex2::G_BRANCH_Z, RspOp::BranchZ),
    (f3dex2::G_TRI1, RspOp::Tri1),
    (f3dex2::G_TRI2, RspOp::Tri2),
    (f3dex2::G_QUAD, RspOp::Quad),
    (f3dex2::G_TEXTURE, RspOp::Texture),
    (f3dex2::G_POPMTX, RspOp::PopMtx),
    (f3dex2::G_GEOMETRYMODE, RspOp::GeometryMode),
    (f3dex2::G_MTX, RspOp::Mtx),
    (f3dex2::G_MOVEWORD, RspOp::MoveWord),
    (f3dex2::G_MOVEMEM, RspOp::MoveMem),
    (f3dex2::G_LOAD_UCODE, RspOp::LoadUcode),
    (f3dex2::G_DL, RspOp::Dl),
    (f3dex2::G_ENDDL, RspOp::EndDl),
    (f3dex2::G_SPNOOP, RspOp::SpNoop),
    (f3dex2::G_RDPHALF_1, RspOp::RdpHalf1),
    (f3dex2::G_SETOTHERMODE_L, RspOp::SetOtherModeL),
    (f3dex2::G_SETOTHERMODE_H, RspOp::SetOtherModeH),
    (f3dex2::G_RDPHALF_2, RspOp::RdpHalf2),
]);

/// RSP table for a microcode generation
#[inline(always)]
pub fn rsp_table(ucode: Ucode) -> &'static [Option<RspOp>; 256] {
    match ucode {
        Ucode::F3d => &F3D_TABLE,
        Ucode::F3dex => &F3DEX_TABLE,
        Ucode::F3dex2 => &F3DEX2_TABLE,
    }
}

/// Resolve an opcode byte against the three tables
///
/// # Examples
///
/// ```
/// use ultragfx::core::gbi::{decode_opcode, Command, RdpOp, RspOp, Ucode};
///
/// assert_eq!(decode_opcode(0xDE, Ucode::F3dex2), Some(Command::Rsp(RspOp::Dl)));
/// assert_eq!(decode_opcode(0x06, Ucode::F3d), Some(Command::Rsp(RspOp::Dl)));
/// assert_eq!(decode_opcode(0xFC, Ucode::F3d), Some(Command::Rdp(RdpOp::SetCombine)));
/// assert_eq!(decode_opcode(0x55, Ucode::F3dex2), None);
/// ```
#[inline(always)]
pub fn decode_opcode(opcode: u8, ucode: Ucode) -> Option<Command> {
    if let Some(op) = ExtOp::from_repr(opcode) {
        return Some(Command::Ext(op));
    }
    if let Some(op) = RdpOp::from_repr(opcode) {
        return Some(Command::Rdp(op));
    }
    rsp_table(ucode)[opcode as usize].map(Command::Rsp)
}
