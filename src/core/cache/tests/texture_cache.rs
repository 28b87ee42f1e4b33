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

//! Texture cache tests

use super::super::*;
use crate::core::backend::{BackendCall, RecordingBackend};
use crate::core::error::{GfxError, Result};
use crate::core::rdp::{DecodedTexture, TexAddr};
use proptest::prelude::*;

fn key(addr: u32) -> TextureCacheKey {
    TextureCacheKey::new(TexAddr::Raw(addr), 0, 2, 32)
}

fn texture() -> Result<DecodedTexture> {
    Ok(DecodedTexture {
        width: 4,
        height: 2,
        rgba: vec![0xAB; 32],
    })
}

#[test]
fn test_hit_does_not_upload() {
    let mut backend = RecordingBackend::new();
    let mut cache = TextureCache::new(8);

    let first = cache.lookup_or_insert(&mut backend, 0, key(0x100), texture).unwrap();
    let second = cache.lookup_or_insert(&mut backend, 1, key(0x100), texture).unwrap();

    assert!(!first.hit);
    assert!(second.hit);
    assert_eq!(first.texture, second.texture);
    assert_eq!((second.width, second.height), (4, 2));
    assert_eq!(backend.textures_created(), 1);
    assert_eq!(backend.texture_uploads(), 1);
}

#[test]
fn test_hit_skips_decode() {
    let mut backend = RecordingBackend::new();
    let mut cache = TextureCache::new(8);
    cache.lookup_or_insert(&mut backend, 0, key(0x100), texture).unwrap();

    let result = cache.lookup_or_insert(&mut backend, 0, key(0x100), || {
        panic!("decode must not run on a hit")
    });
    assert!(result.unwrap().hit);
}

#[test]
fn test_distinct_palettes_are_distinct_entries() {
    let mut backend = RecordingBackend::new();
    let mut cache = TextureCache::new(8);
    let mut a = key(0x100);
    a.palettes[0] = Some(TexAddr::Raw(0x9000));
    let mut b = a;
    b.palettes[0] = Some(TexAddr::Raw(0xA000));

    cache.lookup_or_insert(&mut backend, 0, a, texture).unwrap();
    cache.lookup_or_insert(&mut backend, 0, b, texture).unwrap();
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_evicts_least_recently_used() {
    let mut backend = RecordingBackend::new();
    let mut cache = TextureCache::new(3);
    for addr in [1, 2, 3] {
        cache.lookup_or_insert(&mut backend, 0, key(addr), texture).unwrap();
    }
    // Touch 1 so 2 becomes the oldest
    cache.lookup_or_insert(&mut backend, 0, key(1), texture).unwrap();
    cache.lookup_or_insert(&mut backend, 0, key(4), texture).unwrap();

    assert_eq!(cache.len(), 3);
    assert!(cache.contains(&key(1)));
    assert!(!cache.contains(&key(2)));
    assert!(cache.contains(&key(3)));
    assert!(cache.contains(&key(4)));
    // Evicted handle is reused, not recreated
    assert_eq!(backend.textures_created(), 3);
}

#[test]
fn test_failed_decode_evicts_nothing() {
    let mut backend = RecordingBackend::new();
    let mut cache = TextureCache::new(1);
    cache.lookup_or_insert(&mut backend, 0, key(1), texture).unwrap();

    let result = cache.lookup_or_insert(&mut backend, 0, key(2), || {
        Err(GfxError::UnsupportedTexture { format: 1, size: 2 })
    });

    assert!(result.is_err());
    assert!(cache.contains(&key(1)));
    assert_eq!(backend.texture_uploads(), 1);
}

#[test]
fn test_delete_by_address_ignores_other_fields() {
    let mut backend = RecordingBackend::new();
    let mut cache = TextureCache::new(16);
    let mut ci = key(0x100);
    ci.fmt = 2;
    ci.palette_index = 3;
    let mut bigger = key(0x100);
    bigger.orig_size_bytes = 4096;

    for k in [key(0x100), ci, bigger, key(0x200), key(0x300)] {
        cache.lookup_or_insert(&mut backend, 0, k, texture).unwrap();
    }

    assert_eq!(cache.delete_by_address(TexAddr::Raw(0x100)), 3);
    assert_eq!(cache.len(), 2);
    assert!(cache.contains(&key(0x200)));
    assert!(cache.contains(&key(0x300)));
}

#[test]
fn test_clear_recycles_handles() {
    let mut backend = RecordingBackend::new();
    let mut cache = TextureCache::new(16);
    cache.lookup_or_insert(&mut backend, 0, key(1), texture).unwrap();
    cache.lookup_or_insert(&mut backend, 0, key(2), texture).unwrap();
    cache.clear();

    assert!(cache.is_empty());
    assert!(cache.least_recently_used().is_none());
    cache.lookup_or_insert(&mut backend, 0, key(3), texture).unwrap();
    assert_eq!(backend.textures_created(), 2);
}

#[test]
fn test_release_destroys_live_and_free_handles() {
    let mut backend = RecordingBackend::new();
    let mut cache = TextureCache::new(16);
    cache.lookup_or_insert(&mut backend, 0, key(1), texture).unwrap();
    cache.lookup_or_insert(&mut backend, 0, key(2), texture).unwrap();
    cache.delete_by_address(TexAddr::Raw(1));
    cache.release(&mut backend);

    let deleted = backend
        .calls()
        .iter()
        .filter(|call| matches!(call, BackendCall::DeleteTexture(_)))
        .count();
    assert_eq!(deleted, 2);
    assert!(cache.is_empty());

    // Nothing left to recycle
    cache.lookup_or_insert(&mut backend, 0, key(3), texture).unwrap();
    assert_eq!(backend.textures_created(), 3);
}

#[test]
fn test_resource_addresses_keyed_by_hash_and_offset() {
    let mut backend = RecordingBackend::new();
    let mut cache = TextureCache::new(16);
    let a = TextureCacheKey::new(TexAddr::Resource { hash: 1, offset: 0 }, 0, 2, 32);
    let b = TextureCacheKey::new(TexAddr::Resource { hash: 1, offset: 64 }, 0, 2, 32);
    cache.lookup_or_insert(&mut backend, 0, a, texture).unwrap();
    cache.lookup_or_insert(&mut backend, 0, b, texture).unwrap();

    assert_eq!(cache.delete_by_address(TexAddr::Resource { hash: 1, offset: 0 }), 1);
    assert!(cache.contains(&b));
}

proptest! {
    #[test]
    fn prop_size_never_exceeds_capacity(
        capacity in 1usize..16,
        addrs in proptest::collection::vec(0u32..64, 1..200),
    ) {
        let mut backend = RecordingBackend::new();
        let mut cache = TextureCache::new(capacity);
        for addr in addrs {
            cache.lookup_or_insert(&mut backend, 0, key(addr), texture).unwrap();
            prop_assert!(cache.len() <= capacity);
        }
    }

    #[test]
    fn prop_overflow_evicts_exactly_the_oldest(capacity in 1usize..32) {
        let mut backend = RecordingBackend::new();
        let mut cache = TextureCache::new(capacity);
        for addr in 0..capacity as u32 {
            cache.lookup_or_insert(&mut backend, 0, key(addr), texture).unwrap();
        }
        let oldest = *cache.least_recently_used().unwrap();
        prop_assert_eq!(oldest, key(0));

        cache.lookup_or_insert(&mut backend, 0, key(1000), texture).unwrap();
        prop_assert_eq!(cache.len(), capacity);
        prop_assert!(!cache.contains(&oldest));
        for addr in 1..capacity as u32 {
            prop_assert!(cache.contains(&key(addr)));
        }
    }
}
