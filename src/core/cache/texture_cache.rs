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

//! Decoded texture cache
//!
//! Maps the identity of some texel data to the backend texture it was
//! uploaded into.
//!
//! # Organization
//!
//! - **Key**: source address, palette sources (color-indexed formats only),
//!   format, size, palette index and the byte size the load declared
//! - **Capacity**: fixed at construction; inserting into a full cache
//!   first evicts the single least-recently-used entry
//! - **Recency**: a monotonic tick per access, indexed by a `BTreeMap` so
//!   the oldest entry is always the first one
//! - **Handles**: evicted or invalidated textures go onto a free list and
//!   are re-uploaded in place; only [`TextureCache::release`] destroys them
//!
//! # Example
//!
//! ```
//! use ultragfx::core::backend::RecordingBackend;
//! use ultragfx::core::cache::{TextureCache, TextureCacheKey};
//! use ultragfx::core::rdp::{DecodedTexture, TexAddr};
//!
//! let mut backend = RecordingBackend::new();
//! let mut cache = TextureCache::new(500);
//! let key = TextureCacheKey::new(TexAddr::Raw(0x1000), 0, 2, 32);
//! let decode = || Ok(DecodedTexture { width: 4, height: 4, rgba: vec![0; 64] });
//!
//! assert!(!cache.lookup_or_insert(&mut backend, 0, key, decode).unwrap().hit);
//! assert!(cache.lookup_or_insert(&mut backend, 0, key, decode).unwrap().hit);
//! assert_eq!(cache.len(), 1);
//! ```

use std::collections::{BTreeMap, HashMap};

use crate::core::backend::{RenderingBackend, TextureHandle};
use crate::core::error::Result;
use crate::core::rdp::{DecodedTexture, TexAddr};

/// Identity of one decoded texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureCacheKey {
    pub addr: TexAddr,
    /// Palette bank sources at decode time
    pub palettes: [Option<TexAddr>; 2],
    pub fmt: u8,
    pub siz: u8,
    pub palette_index: u8,
    pub orig_size_bytes: u32,
}

impl TextureCacheKey {
    pub fn new(addr: TexAddr, fmt: u8, siz: u8, orig_size_bytes: u32) -> Self {
        Self {
            addr,
            palettes: [None, None],
            fmt,
            siz,
            palette_index: 0,
            orig_size_bytes,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    texture: TextureHandle,
    width: u32,
    height: u32,
    tick: u64,
}

/// Result of a lookup: the bound texture and whether it was already cached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedTexture {
    pub texture: TextureHandle,
    /// Uploaded size in pixels
    pub width: u32,
    pub height: u32,
    pub hit: bool,
}

/// Bounded LRU cache of backend textures
#[derive(Debug)]
pub struct TextureCache {
    capacity: usize,
    entries: HashMap<TextureCacheKey, CacheEntry>,
    lru: BTreeMap<u64, TextureCacheKey>,
    free_handles: Vec<TextureHandle>,
    tick: u64,
}

impl TextureCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::with_capacity(capacity),
            lru: BTreeMap::new(),
            free_handles: Vec::new(),
            tick: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &TextureCacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Bind the texture for `key` to `slot`, decoding and uploading on a miss
    ///
    /// `decode` runs only on a miss. If it fails nothing is evicted and
    /// the previous binding of `slot` is left alone.
    pub fn lookup_or_insert<B, F>(
        &mut self,
        backend: &mut B,
        slot: usize,
        key: TextureCacheKey,
        decode: F,
    ) -> Result<CachedTexture>
    where
        B: RenderingBackend + ?Sized,
        F: FnOnce() -> Result<DecodedTexture>,
    {
        self.tick += 1;
        let tick = self.tick;

        if let Some(entry) = self.entries.get_mut(&key) {
            self.lru.remove(&entry.tick);
            entry.tick = tick;
            self.lru.insert(tick, key);
            backend.select_texture(slot, entry.texture);
            return Ok(CachedTexture {
                texture: entry.texture,
                width: entry.width,
                height: entry.height,
                hit: true,
            });
        }

        let decoded = decode()?;

        if self.entries.len() >= self.capacity {
            self.evict_oldest();
        }

        let texture = match self.free_handles.pop() {
            Some(texture) => texture,
            None => backend.new_texture(),
        };
        backend.select_texture(slot, texture);
        backend.upload_texture(&decoded.rgba, decoded.width, decoded.height);
        log::debug!(
            "Uploaded {}x{} texture {:?} into {:?}",
            decoded.width,
            decoded.height,
            key.addr,
            texture
        );

        self.entries.insert(
            key,
            CacheEntry {
                texture,
                width: decoded.width,
                height: decoded.height,
                tick,
            },
        );
        self.lru.insert(tick, key);

        Ok(CachedTexture {
            texture,
            width: decoded.width,
            height: decoded.height,
            hit: false,
        })
    }

    /// Remove every entry whose source is `addr`, whatever its other fields
    ///
    /// Returns the number of entries removed.
    pub fn delete_by_address(&mut self, addr: TexAddr) -> usize {
        let doomed: Vec<TextureCacheKey> = self
            .entries
            .keys()
            .filter(|key| key.addr == addr)
            .copied()
            .collect();
        for key in &doomed {
            self.remove(key);
        }
        doomed.len()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.free_handles
            .extend(self.entries.drain().map(|(_, entry)| entry.texture));
        self.lru.clear();
    }

    /// Drop every entry and destroy every backend texture the cache owns
    pub fn release<B>(&mut self, backend: &mut B)
    where
        B: RenderingBackend + ?Sized,
    {
        self.clear();
        log::debug!("Releasing {} textures", self.free_handles.len());
        for texture in self.free_handles.drain(..) {
            backend.delete_texture(texture);
        }
    }

    /// Key that would be evicted next
    pub fn least_recently_used(&self) -> Option<&TextureCacheKey> {
        self.lru.values().next()
    }

    fn evict_oldest(&mut self) {
        if let Some((_, key)) = self.lru.pop_first() {
            if let Some(entry) = self.entries.remove(&key) {
                log::trace!("Evicting texture {:?}", key.addr);
                self.free_handles.push(entry.texture);
            }
        }
    }

    fn remove(&mut self, key: &TextureCacheKey) {
        if let Some(entry) = self.entries.remove(key) {
            self.lru.remove(&entry.tick);
            self.free_handles.push(entry.texture);
        }
    }
}
