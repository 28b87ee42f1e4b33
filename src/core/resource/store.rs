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

//! In-memory resource provider

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::{
    DisplayListResource, Resource, ResourceProvider, TextureResource, VertexResource,
};
use crate::core::gbi::{Gfx, Vtx};

/// Memory regions plus hash- and path-addressed resources
///
/// Regions are kept sorted by base address; a read must fall entirely
/// inside one region.
///
/// # Examples
///
/// ```
/// use ultragfx::core::resource::{ResourceProvider, ResourceStore};
///
/// let mut store = ResourceStore::new();
/// store.insert_words(0x8000_0000, &[0xDF00_0000, 0]);
/// assert_eq!(store.read_bytes(0x8000_0000, 4), Some(&[0xDF, 0, 0, 0][..]));
/// assert_eq!(store.read_bytes(0x8000_0006, 4), None);
/// ```
#[derive(Debug, Default)]
pub struct ResourceStore {
    regions: BTreeMap<u32, Vec<u8>>,
    by_hash: HashMap<u64, Resource>,
    by_path: HashMap<String, Resource>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map raw bytes at `addr`, replacing any region with the same base
    pub fn insert_region(&mut self, addr: u32, bytes: Vec<u8>) {
        self.regions.insert(addr, bytes);
    }

    /// Map 32-bit words (stored big-endian) at `addr`
    pub fn insert_words(&mut self, addr: u32, words: &[u32]) {
        let bytes = words.iter().flat_map(|w| w.to_be_bytes()).collect();
        self.insert_region(addr, bytes);
    }

    /// Map a display list at `addr`
    pub fn insert_display_list(&mut self, addr: u32, commands: &[Gfx]) {
        let bytes = commands.iter().flat_map(|g| g.to_be_bytes()).collect();
        self.insert_region(addr, bytes);
    }

    /// Map a vertex array at `addr`
    pub fn insert_vertices(&mut self, addr: u32, vertices: &[Vtx]) {
        let bytes = vertices.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.insert_region(addr, bytes);
    }

    /// Map a NUL-terminated string at `addr`
    pub fn insert_path(&mut self, addr: u32, path: &str) {
        let mut bytes = path.as_bytes().to_vec();
        bytes.push(0);
        self.insert_region(addr, bytes);
    }

    /// Overwrite bytes inside an existing region
    ///
    /// Returns `false` if the range is not fully mapped.
    pub fn write_bytes(&mut self, addr: u32, data: &[u8]) -> bool {
        match self.region_mut(addr, data.len()) {
            Some(slice) => {
                slice.copy_from_slice(data);
                true
            }
            None => false,
        }
    }

    pub fn register_hash(&mut self, hash: u64, resource: Resource) {
        self.by_hash.insert(hash, resource);
    }

    pub fn register_path(&mut self, path: impl Into<String>, resource: Resource) {
        self.by_path.insert(path.into(), resource);
    }

    /// Register a display list under `hash`
    pub fn register_display_list(&mut self, hash: u64, commands: Vec<Gfx>) {
        let list = DisplayListResource { id: hash, commands };
        self.register_hash(hash, Resource::DisplayList(Arc::new(list)));
    }

    /// Register a vertex array under `hash`
    pub fn register_vertices(&mut self, hash: u64, vertices: Vec<Vtx>) {
        let vertices = VertexResource { id: hash, vertices };
        self.register_hash(hash, Resource::Vertices(Arc::new(vertices)));
    }

    /// Register a texture under its own id
    pub fn register_texture(&mut self, texture: TextureResource) {
        let hash = texture.id;
        self.register_hash(hash, Resource::Texture(Arc::new(texture)));
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    fn locate(&self, addr: u32, len: usize) -> Option<(u32, usize)> {
        let (&base, bytes) = self.regions.range(..=addr).next_back()?;
        let offset = (addr - base) as usize;
        if offset.checked_add(len)? <= bytes.len() {
            Some((base, offset))
        } else {
            None
        }
    }

    fn region_mut(&mut self, addr: u32, len: usize) -> Option<&mut [u8]> {
        let (base, offset) = self.locate(addr, len)?;
        let bytes = self.regions.get_mut(&base)?;
        Some(&mut bytes[offset..offset + len])
    }
}

impl ResourceProvider for ResourceStore {
    fn read_bytes(&self, addr: u32, len: usize) -> Option<&[u8]> {
        let (base, offset) = self.locate(addr, len)?;
        let bytes = self.regions.get(&base)?;
        Some(&bytes[offset..offset + len])
    }

    fn resolve_hash(&self, hash: u64) -> Option<Resource> {
        self.by_hash.get(&hash).cloned()
    }

    fn resolve_path(&self, path: &str) -> Option<Resource> {
        self.by_path.get(path).cloned()
    }
}
