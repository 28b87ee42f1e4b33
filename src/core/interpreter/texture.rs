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

//! Texture import for the draw path

use super::{BlendedTexture, Interpreter};
use crate::core::backend::RenderingBackend;
use crate::core::cache::{CombinerMapping, ShaderOpts, TextureCacheKey};
use crate::core::error::{GfxError, Result};
use crate::core::gbi::{G_IM_FMT_CI, G_IM_SIZ_4B};
use crate::core::rdp::{
    bytes_to_texels, decode_texture, rescale_nearest, DecodedTexture, LoadedTexture, Palette,
    PaletteRef, RdpState, TexAddr, TileDescriptor, PALETTE_BANK_BYTES,
};
use crate::core::resource::{ResourceProvider, TextureKind, TextureResource};

const TEXTURE_MASK: [ShaderOpts; 2] = [ShaderOpts::TEXTURE_MASK0, ShaderOpts::TEXTURE_MASK1];
const TEXTURE_BLEND: [ShaderOpts; 2] = [ShaderOpts::TEXTURE_BLEND0, ShaderOpts::TEXTURE_BLEND1];

/// Backend unit of the mask overlay for `slot`; blends sit two units later
const OVERLAY_UNIT_BASE: usize = 2;

impl<B: RenderingBackend> Interpreter<B> {
    /// Bind the texture sampled through `slot` and record its size
    ///
    /// Failures are logged and leave the previous binding in place.
    pub(in crate::core::interpreter) fn import_texture(
        &mut self,
        provider: &dyn ResourceProvider,
        slot: usize,
    ) {
        let tile = self.rdp.tiles[(self.rsp.texture_tile as usize + slot) & 7];

        if let Some(fb) = self.rdp.fb_textures[slot] {
            self.backend.select_texture_fb(slot, fb);
            let size = match self.framebuffers.get(fb) {
                Some(aux) => (aux.orig_width, aux.orig_height),
                None => (self.view.native_width, self.view.native_height),
            };
            self.bound.texture_rebound(slot);
            self.texture_sizes[slot] = size;
            return;
        }

        let Some(loaded) = self.rdp.loaded[tile.tmem_index].clone() else {
            log::trace!("Slot {} sampled before any load", slot);
            return;
        };

        let row_bytes = loaded.row_bytes(&tile).max(1);
        let width = bytes_to_texels(row_bytes, tile.siz).max(1);
        let height = (loaded.size_bytes / row_bytes).max(1);

        let key = cache_key(&self.rdp, &loaded, &tile);
        let rdp = &self.rdp;
        let result = self.textures.lookup_or_insert(&mut self.backend, slot, key, || {
            decode_loaded(provider, rdp, &loaded, &tile, width, height)
        });

        match result {
            Ok(cached) => {
                if cached.hit {
                    self.stats.texture_hits += 1;
                } else {
                    self.stats.texture_misses += 1;
                }
                self.bound.texture_rebound(slot);
                self.texture_sizes[slot] = (width, height);
            }
            Err(e) => {
                log::warn!("Texture {:?} not imported: {}", loaded.addr, e);
                return;
            }
        }

        if let Some(blended) = self.blended_for(slot) {
            self.import_overlay(provider, OVERLAY_UNIT_BASE + slot, blended.mask);
            self.import_overlay(provider, OVERLAY_UNIT_BASE + 2 + slot, blended.blend);
        }
    }

    /// Mask/blend option bits for the textures the combiner samples
    pub(in crate::core::interpreter) fn blend_options(
        &self,
        mapping: &CombinerMapping,
    ) -> ShaderOpts {
        let mut options = ShaderOpts::empty();
        for slot in 0..2 {
            if mapping.used_textures[slot] && self.blended_for(slot).is_some() {
                options |= TEXTURE_MASK[slot] | TEXTURE_BLEND[slot];
            }
        }
        options
    }

    fn blended_for(&self, slot: usize) -> Option<BlendedTexture> {
        if self.blended.is_empty() || self.rdp.fb_textures[slot].is_some() {
            return None;
        }
        let tile = &self.rdp.tiles[(self.rsp.texture_tile as usize + slot) & 7];
        match self.rdp.loaded[tile.tmem_index].as_ref()?.addr {
            TexAddr::Raw(addr) => self.blended.get(&addr).copied(),
            TexAddr::Resource { .. } => None,
        }
    }

    /// Upload a pre-decoded overlay texture to backend unit `unit`
    fn import_overlay(&mut self, provider: &dyn ResourceProvider, unit: usize, hash: u64) {
        let Some(texture) = provider
            .resolve_hash(hash)
            .and_then(|res| res.as_texture().cloned())
        else {
            log::warn!("Overlay texture {:016X} not found", hash);
            return;
        };

        let key = TextureCacheKey::new(
            TexAddr::Resource { hash, offset: 0 },
            0,
            0,
            texture.data.len() as u32,
        );
        let result = self.textures.lookup_or_insert(&mut self.backend, unit, key, || {
            Ok(DecodedTexture {
                width: texture.width,
                height: texture.height,
                rgba: texture.data.clone(),
            })
        });
        if let Err(e) = result {
            log::warn!("Overlay texture {:016X} not imported: {}", hash, e);
        }
    }
}

fn cache_key(rdp: &RdpState, loaded: &LoadedTexture, tile: &TileDescriptor) -> TextureCacheKey {
    let mut key = TextureCacheKey::new(loaded.addr, tile.fmt, tile.siz, loaded.orig_size_bytes);
    if tile.fmt == G_IM_FMT_CI {
        key.palettes = [0, 1].map(|bank| rdp.palettes[bank].as_ref().map(|p| p.addr));
        if tile.siz == G_IM_SIZ_4B {
            key.palette_index = tile.palette;
        }
    }
    key
}

/// Bytes at `offset` from the start of a loaded texture's source
fn source_bytes<'a>(
    provider: &'a dyn ResourceProvider,
    addr: TexAddr,
    resource: Option<&'a TextureResource>,
    offset: u32,
    len: usize,
) -> Option<&'a [u8]> {
    match (addr, resource) {
        (TexAddr::Resource { offset: base, .. }, Some(res)) => {
            let start = (base + offset) as usize;
            res.data.get(start..start + len)
        }
        (TexAddr::Raw(base), _) => provider.read_bytes(base.wrapping_add(offset), len),
        (TexAddr::Resource { .. }, None) => None,
    }
}

fn palette_bank(provider: &dyn ResourceProvider, palette: Option<&PaletteRef>) -> Vec<u8> {
    palette
        .and_then(|p| {
            source_bytes(
                provider,
                p.addr,
                p.resource.as_deref(),
                0,
                PALETTE_BANK_BYTES as usize,
            )
        })
        .map(<[u8]>::to_vec)
        .unwrap_or_default()
}

/// Produce RGBA8 for a tmem slot
fn decode_loaded(
    provider: &dyn ResourceProvider,
    rdp: &RdpState,
    loaded: &LoadedTexture,
    tile: &TileDescriptor,
    width: u32,
    height: u32,
) -> Result<DecodedTexture> {
    let resource = loaded.resource.as_deref();
    match resource.map(|res| res.kind) {
        Some(TextureKind::Raw) => {
            let res = resource.ok_or_else(|| missing(loaded.addr))?;
            return Ok(DecodedTexture {
                width,
                height,
                rgba: rescale_nearest(&res.data, res.width, res.height, width, height),
            });
        }
        Some(TextureKind::Decoded) => {
            let res = resource.ok_or_else(|| missing(loaded.addr))?;
            return Ok(DecodedTexture {
                width: res.width,
                height: res.height,
                rgba: res.data.clone(),
            });
        }
        Some(TextureKind::Native) | None => {}
    }

    let row_bytes = loaded.row_bytes(tile).max(1);
    let stride = if loaded.block {
        row_bytes
    } else {
        loaded.full_image_line_size_bytes
    };

    let mut data = Vec::with_capacity((row_bytes * height) as usize);
    for row in 0..height {
        let bytes = source_bytes(provider, loaded.addr, resource, row * stride, row_bytes as usize)
            .ok_or_else(|| missing(loaded.addr))?;
        data.extend_from_slice(bytes);
    }

    if tile.fmt != G_IM_FMT_CI {
        return decode_texture(tile.fmt, tile.siz, &data, width, height, None);
    }

    let banks = [
        palette_bank(provider, rdp.palettes[0].as_ref()),
        palette_bank(provider, rdp.palettes[1].as_ref()),
    ];
    let palette = Palette {
        banks: [&banks[0], &banks[1]],
        index: tile.palette,
        ia16: rdp.tlut_ia16(),
    };
    decode_texture(tile.fmt, tile.siz, &data, width, height, Some(&palette))
}

fn missing(addr: TexAddr) -> GfxError {
    GfxError::ResourceNotFound(format!("texel data at {:?}", addr))
}
