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

//! JSON scene files
//!
//! A scene bundles the root display-list address, memory regions and
//! resources into one file that can be replayed headlessly:
//!
//! ```json
//! {
//!   "root": 2147483648,
//!   "regions": [{ "address": 2147483648, "words": [3724541952, 0] }],
//!   "display_lists": [{ "hash": 17, "commands": [[3724541952, 0]] }]
//! }
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{
    DisplayListResource, Resource, ResourceStore, TextureKind, TextureResource, VertexResource,
};
use crate::core::error::Result;
use crate::core::gbi::{Gfx, Vtx};

/// Memory region given as big-endian words
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneRegion {
    pub address: u32,
    #[serde(default)]
    pub words: Vec<u32>,
    #[serde(default)]
    pub bytes: Vec<u8>,
}

/// Display list addressable by hash and/or path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDisplayList {
    pub hash: u64,
    #[serde(default)]
    pub path: Option<String>,
    pub commands: Vec<[u32; 2]>,
}

/// Vertex array addressable by hash and/or path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneVertices {
    pub hash: u64,
    #[serde(default)]
    pub path: Option<String>,
    pub vertices: Vec<Vtx>,
}

/// Texture addressable by hash and/or path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneTexture {
    pub hash: u64,
    #[serde(default)]
    pub path: Option<String>,
    pub width: u32,
    pub height: u32,
    pub kind: TextureKind,
    #[serde(default = "unit_scale")]
    pub h_byte_scale: f32,
    #[serde(default = "unit_scale")]
    pub v_pixel_scale: f32,
    pub data: Vec<u8>,
}

fn unit_scale() -> f32 {
    1.0
}

/// A replayable frame description
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    /// Address of the root display list
    pub root: u32,
    #[serde(default)]
    pub regions: Vec<SceneRegion>,
    #[serde(default)]
    pub display_lists: Vec<SceneDisplayList>,
    #[serde(default)]
    pub vertices: Vec<SceneVertices>,
    #[serde(default)]
    pub textures: Vec<SceneTexture>,
}

impl Scene {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Build a resource store holding everything the scene describes
    pub fn into_store(self) -> ResourceStore {
        let mut store = ResourceStore::new();

        for region in self.regions {
            let mut bytes: Vec<u8> = region.words.iter().flat_map(|w| w.to_be_bytes()).collect();
            bytes.extend_from_slice(&region.bytes);
            store.insert_region(region.address, bytes);
        }

        for list in self.display_lists {
            let commands = list.commands.iter().map(|&[w0, w1]| Gfx::new(w0, w1)).collect();
            let resource = Resource::DisplayList(Arc::new(DisplayListResource {
                id: list.hash,
                commands,
            }));
            register(&mut store, list.hash, list.path, resource);
        }

        for vertices in self.vertices {
            let resource = Resource::Vertices(Arc::new(VertexResource {
                id: vertices.hash,
                vertices: vertices.vertices,
            }));
            register(&mut store, vertices.hash, vertices.path, resource);
        }

        for texture in self.textures {
            let resource = Resource::Texture(Arc::new(TextureResource {
                id: texture.hash,
                width: texture.width,
                height: texture.height,
                kind: texture.kind,
                h_byte_scale: texture.h_byte_scale,
                v_pixel_scale: texture.v_pixel_scale,
                data: texture.data,
            }));
            register(&mut store, texture.hash, texture.path, resource);
        }

        store
    }
}

fn register(store: &mut ResourceStore, hash: u64, path: Option<String>, resource: Resource) {
    if let Some(path) = path {
        store.register_path(path, resource.clone());
    }
    store.register_hash(hash, resource);
}
