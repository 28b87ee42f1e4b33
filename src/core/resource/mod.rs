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

//! Resource provider contract
//!
//! The interpreter never owns game memory or asset files. Everything a
//! command points at is reached through [`ResourceProvider`]:
//!
//! - raw console memory, read as big-endian bytes by address
//! - display lists, vertex arrays and textures resolved by 64-bit content
//!   hash or by path string
//!
//! [`ResourceStore`] is a self-contained in-memory implementation used by
//! the CLI and the tests; [`Scene`] loads one from JSON.

mod scene;
mod store;

pub use scene::*;
pub use store::ResourceStore;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::gbi::{Gfx, Vtx};

/// Longest path string read from memory
pub const MAX_PATH_LEN: usize = 256;

/// A display list resolved from a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayListResource {
    pub id: u64,
    pub commands: Vec<Gfx>,
}

/// A vertex array resolved from a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexResource {
    pub id: u64,
    pub vertices: Vec<Vtx>,
}

/// How a texture resource's bytes must be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureKind {
    /// Console texel data, decoded by the tile's format and size
    Native,
    /// RGBA8 data pre-scaled by the resource layer
    Raw,
    /// RGBA8 data uploaded as-is
    Decoded,
}

/// A texture resolved from a resource
#[derive(Debug, Clone, PartialEq)]
pub struct TextureResource {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    pub kind: TextureKind,
    /// Horizontal scale of the stored data relative to the console texture
    pub h_byte_scale: f32,
    /// Vertical scale of the stored data relative to the console texture
    pub v_pixel_scale: f32,
    pub data: Vec<u8>,
}

impl TextureResource {
    /// Whether the bytes bypass the console texel decoder
    pub fn is_externally_decoded(&self) -> bool {
        self.kind != TextureKind::Native
    }
}

/// A resolved resource
#[derive(Debug, Clone)]
pub enum Resource {
    DisplayList(Arc<DisplayListResource>),
    Vertices(Arc<VertexResource>),
    Texture(Arc<TextureResource>),
}

impl Resource {
    pub fn as_display_list(&self) -> Option<&Arc<DisplayListResource>> {
        match self {
            Resource::DisplayList(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_vertices(&self) -> Option<&Arc<VertexResource>> {
        match self {
            Resource::Vertices(vertices) => Some(vertices),
            _ => None,
        }
    }

    pub fn as_texture(&self) -> Option<&Arc<TextureResource>> {
        match self {
            Resource::Texture(texture) => Some(texture),
            _ => None,
        }
    }
}

/// Source of memory and resources for one interpreter run
pub trait ResourceProvider {
    /// Borrow `len` bytes of console memory at `addr`
    fn read_bytes(&self, addr: u32, len: usize) -> Option<&[u8]>;

    /// Resolve a content hash
    fn resolve_hash(&self, hash: u64) -> Option<Resource>;

    /// Resolve a path string
    fn resolve_path(&self, path: &str) -> Option<Resource>;

    /// Read a NUL-terminated path string from memory
    fn read_path(&self, addr: u32) -> Option<String> {
        let mut bytes = Vec::new();
        for offset in 0..MAX_PATH_LEN as u32 {
            let byte = self.read_bytes(addr.wrapping_add(offset), 1)?[0];
            if byte == 0 {
                return String::from_utf8(bytes).ok();
            }
            bytes.push(byte);
        }
        None
    }
}

#[cfg(test)]
mod tests;
