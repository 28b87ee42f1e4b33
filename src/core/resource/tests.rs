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

//! Resource store and scene tests

use super::*;
use std::io::Write;

#[test]
fn test_read_spanning_regions_fails() {
    let mut store = ResourceStore::new();
    store.insert_region(0x1000, vec![1, 2, 3, 4]);
    store.insert_region(0x1004, vec![5, 6, 7, 8]);

    assert_eq!(store.read_bytes(0x1002, 2), Some(&[3, 4][..]));
    assert_eq!(store.read_bytes(0x1004, 4), Some(&[5, 6, 7, 8][..]));
    assert_eq!(store.read_bytes(0x1002, 4), None);
    assert_eq!(store.read_bytes(0x0FFF, 1), None);
}

#[test]
fn test_write_bytes_in_place() {
    let mut store = ResourceStore::new();
    store.insert_region(0x2000, vec![0; 8]);
    assert!(store.write_bytes(0x2004, &[9, 9]));
    assert_eq!(store.read_bytes(0x2004, 2), Some(&[9, 9][..]));
    assert!(!store.write_bytes(0x2007, &[1, 2]));
}

#[test]
fn test_read_path_string() {
    let mut store = ResourceStore::new();
    store.insert_path(0x3000, "objects/box/dl");
    assert_eq!(store.read_path(0x3000).as_deref(), Some("objects/box/dl"));
    assert_eq!(store.read_path(0x4000), None);
}

#[test]
fn test_unterminated_path_rejected() {
    let mut store = ResourceStore::new();
    store.insert_region(0x3000, vec![b'a'; 4]);
    assert_eq!(store.read_path(0x3000), None);
}

#[test]
fn test_resolve_by_hash_and_path() {
    let mut store = ResourceStore::new();
    store.register_display_list(0xABCD, vec![Gfx::new(0xDF00_0000, 0)]);
    let list = store.resolve_hash(0xABCD).unwrap();
    assert_eq!(list.as_display_list().unwrap().commands.len(), 1);
    assert!(list.as_texture().is_none());

    store.register_path("dl/root", list);
    assert!(store.resolve_path("dl/root").is_some());
    assert!(store.resolve_path("dl/missing").is_none());
    assert!(store.resolve_hash(1).is_none());
}

#[test]
fn test_texture_kind_flags_external_decoding() {
    let texture = TextureResource {
        id: 1,
        width: 1,
        height: 1,
        kind: TextureKind::Native,
        h_byte_scale: 1.0,
        v_pixel_scale: 1.0,
        data: vec![0, 0],
    };
    assert!(!texture.is_externally_decoded());
    let decoded = TextureResource {
        kind: TextureKind::Decoded,
        ..texture
    };
    assert!(decoded.is_externally_decoded());
}

#[test]
fn test_scene_into_store() {
    let json = r#"{
        "root": 4096,
        "regions": [{ "address": 4096, "words": [3741319168, 0] }],
        "display_lists": [{ "hash": 7, "path": "dl/seven", "commands": [[3741319168, 0]] }],
        "vertices": [{ "hash": 8, "vertices": [{ "ob": [1, 2, 3], "flag": 0, "tc": [0, 0], "cn": [255, 0, 0, 255] }] }],
        "textures": [{ "hash": 9, "width": 1, "height": 1, "kind": "decoded", "data": [1, 2, 3, 4] }]
    }"#;
    let scene = Scene::from_json_str(json).unwrap();
    assert_eq!(scene.root, 4096);

    let store = scene.into_store();
    assert_eq!(store.read_bytes(4096, 1), Some(&[0xDF][..]));
    assert!(store.resolve_path("dl/seven").is_some());
    assert_eq!(
        store.resolve_hash(8).unwrap().as_vertices().unwrap().vertices[0].ob,
        [1, 2, 3]
    );
    let texture = store.resolve_hash(9).unwrap();
    let texture = texture.as_texture().unwrap();
    assert_eq!(texture.kind, TextureKind::Decoded);
    assert_eq!(texture.h_byte_scale, 1.0);
}

#[test]
fn test_scene_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "root": 16 }}"#).unwrap();
    let scene = Scene::load(file.path()).unwrap();
    assert_eq!(scene.root, 16);
    assert!(scene.regions.is_empty());
}

#[test]
fn test_scene_rejects_bad_json() {
    assert!(matches!(
        Scene::from_json_str("{ root: }"),
        Err(crate::core::error::GfxError::Json(_))
    ));
}
