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

//! Extension command tests

use super::*;
use crate::core::backend::FramebufferId;
use crate::core::cache::ShaderOpts;
use crate::core::gbi::{ExtraGeometryMode, GeometryMode, G_ACMUX_SHADE, G_CCMUX_SHADE};
use crate::core::resource::{Resource, TextureKind, TextureResource, VertexResource};

fn texture(id: u64, kind: TextureKind, width: u32, height: u32) -> TextureResource {
    TextureResource {
        id,
        width,
        height,
        kind,
        h_byte_scale: 1.0,
        v_pixel_scale: 1.0,
        data: vec![0x80; (width * height * 4) as usize],
    }
}

/// Texture image from a hash resource, then a 4x4 RGBA16 block draw
fn hashed_texture_list(hash: u64) -> Vec<Gfx> {
    let timg = (G_IM_FMT_RGBA as u32) << 21 | (G_IM_SIZ_16B as u32) << 19 | 3;
    vec![
        combine_d(G_CCMUX_TEXEL0, G_ACMUX_TEXEL0),
        ext(ExtOp::SetTimgHash, timg, 0),
        hash_record(hash),
        set_tile(0, G_IM_FMT_RGBA, G_IM_SIZ_16B, 1, 0, 0),
        load_block(0, 16),
        set_tile_size(0, 4, 4),
        load_vertices(VERTICES, 3, 0),
        tri1(0, 1, 2),
        end_dl(),
    ]
}

fn shader_options(gfx: &Interpreter<RecordingBackend>) -> Vec<u32> {
    gfx.backend()
        .calls()
        .iter()
        .filter_map(|call| match call {
            BackendCall::CreateShader(desc, _) => Some(desc.option_id),
            _ => None,
        })
        .collect()
}

#[test]
fn test_hash_call_returns_after_hash_record() {
    let mut store = ResourceStore::new();
    store.register_display_list(0xABCD_0000_1234, vec![env_color(0x0102_0304), end_dl()]);
    store.insert_display_list(
        ROOT,
        &[
            ext(ExtOp::DlHash, 0, 0),
            hash_record(0xABCD_0000_1234),
            prim_color(0x0506_0708),
            end_dl(),
        ],
    );

    let mut gfx = interpreter();
    run(&mut gfx, &store);

    assert_eq!(gfx.rdp().env_color, [1, 2, 3, 4]);
    assert_eq!(gfx.rdp().prim_color, [5, 6, 7, 8]);
    assert_eq!(gfx.stats().commands, 5);
}

#[test]
fn test_unresolved_hash_is_a_noop() {
    let mut store = ResourceStore::new();
    store.insert_display_list(
        ROOT,
        &[
            ext(ExtOp::DlHash, 0, 0),
            hash_record(0xDEAD),
            prim_color(0x0506_0708),
            end_dl(),
        ],
    );

    let mut gfx = interpreter();
    run(&mut gfx, &store);

    assert_eq!(gfx.rdp().prim_color, [5, 6, 7, 8]);
    assert_eq!(gfx.stats().commands, 3);
}

#[test]
fn test_path_branch() {
    let mut store = ResourceStore::new();
    store.insert_path(0x8000, "scene/sky");
    store.register_path(
        "scene/sky",
        Resource::DisplayList(Arc::new(DisplayListResource {
            id: 7,
            commands: vec![env_color(0xFF00_00FF), end_dl()],
        })),
    );
    store.insert_display_list(
        ROOT,
        &[ext(ExtOp::DlPath, 1 << 16, 0x8000), prim_color(0xFFFF_FFFF), end_dl()],
    );

    let mut gfx = interpreter();
    run(&mut gfx, &store);

    assert_eq!(gfx.rdp().env_color, [0xFF, 0, 0, 0xFF]);
    assert_eq!(gfx.rdp().prim_color, [0; 4]);
}

#[test]
fn test_vertex_hash_with_offset() {
    let mut store = ResourceStore::new();
    let vertices: Vec<Vtx> = (0..5).map(|i| vtx(i, 0, 0, [0; 4])).collect();
    store.register_vertices(0x55, vertices);
    store.insert_display_list(
        ROOT,
        &[ext(ExtOp::VtxHash, (2 << 12) | (2 << 1), 3), hash_record(0x55), end_dl()],
    );

    let mut gfx = interpreter();
    run(&mut gfx, &store);

    assert_eq!(gfx.rsp().vertices[0].x, 3.0);
    assert_eq!(gfx.rsp().vertices[1].x, 4.0);
}

#[test]
fn test_vertex_path() {
    let mut store = ResourceStore::new();
    store.insert_path(0x8000, "actors/box.vtx");
    store.register_path(
        "actors/box.vtx",
        Resource::Vertices(Arc::new(VertexResource {
            id: 9,
            vertices: vec![vtx(-1, 0, 0, [0; 4]), vtx(0, -1, 0, [0; 4])],
        })),
    );
    store.insert_display_list(
        ROOT,
        &[ext(ExtOp::VtxPath, (2 << 12) | (6 << 1), 0x8000), end_dl()],
    );

    let mut gfx = interpreter();
    run(&mut gfx, &store);

    // Two vertices ending at index 6
    assert_eq!(gfx.rsp().vertices[4].x, -1.0);
    assert_eq!(gfx.rsp().vertices[5].y, -1.0);
}

#[test]
fn test_decoded_texture_uploads_as_is() {
    let mut store = store_with_triangle();
    store.register_texture(texture(0x77, TextureKind::Decoded, 16, 16));
    store.insert_display_list(ROOT, &hashed_texture_list(0x77));

    let mut gfx = interpreter();
    run(&mut gfx, &store);

    let (width, height, _) = gfx.backend().last_upload().unwrap();
    assert_eq!((width, height), (16, 16));
    // Coordinates stay normalized to the console size
    assert_eq!(gfx.texture_sizes[0], (4, 4));
}

#[test]
fn test_raw_texture_is_rescaled() {
    let mut store = store_with_triangle();
    store.register_texture(texture(0x78, TextureKind::Raw, 8, 8));
    store.insert_display_list(ROOT, &hashed_texture_list(0x78));

    let mut gfx = interpreter();
    run(&mut gfx, &store);

    let (width, height, rgba) = gfx.backend().last_upload().unwrap();
    assert_eq!((width, height), (4, 4));
    assert_eq!(rgba.len(), 4 * 4 * 4);
}

#[test]
fn test_native_texture_resource_decodes() {
    let mut store = store_with_triangle();
    let mut native = texture(0x79, TextureKind::Native, 4, 4);
    native.data = [0x07u8, 0xC1].repeat(16);
    store.register_texture(native);
    store.insert_display_list(ROOT, &hashed_texture_list(0x79));

    let mut gfx = interpreter();
    run(&mut gfx, &store);

    let (_, _, rgba) = gfx.backend().last_upload().unwrap();
    assert_eq!(&rgba[..4], &[0, 255, 0, 255]);
}

#[test]
fn test_grayscale_adds_tint_attributes() {
    let mut store = store_with_triangle();
    store.insert_display_list(
        ROOT,
        &[
            ext(ExtOp::SetGrayscale, 0, 1),
            ext(ExtOp::SetIntensity, 0, 0xFF00_00FF),
            load_vertices(VERTICES, 3, 0),
            tri1(0, 1, 2),
            end_dl(),
        ],
    );

    let mut gfx = interpreter();
    run(&mut gfx, &store);

    let buf = gfx
        .backend()
        .calls()
        .iter()
        .find_map(|call| match call {
            BackendCall::DrawTriangles { buf, .. } => Some(buf.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(buf.len(), 3 * 8);
    assert_eq!(&buf[4..8], &[1.0, 0.0, 0.0, 1.0]);
    assert_ne!(shader_options(&gfx)[0] & ShaderOpts::GRAYSCALE.bits(), 0);
}

#[test]
fn test_custom_shader_option_bits() {
    let mut store = store_with_triangle();
    store.insert_display_list(
        ROOT,
        &[
            ext(ExtOp::LoadShader, 1, 5),
            load_vertices(VERTICES, 3, 0),
            tri1(0, 1, 2),
            ext(ExtOp::LoadShader, 0, 0),
            tri1(0, 1, 2),
            end_dl(),
        ],
    );

    let mut gfx = interpreter();
    run(&mut gfx, &store);

    let options = shader_options(&gfx);
    assert_eq!(options.len(), 2);
    assert_eq!(options[0] >> 24, 5);
    assert_ne!(options[0] & ShaderOpts::CUSTOM_SHADER.bits(), 0);
    assert_eq!(options[1] & ShaderOpts::CUSTOM_SHADER.bits(), 0);
}

#[test]
fn test_extra_geometry_mode_inverts_culling() {
    let mut store = store_with_triangle();
    store.insert_display_list(
        ROOT,
        &[
            geometry_mode(0, GeometryMode::CULL_BACK.bits()),
            ext(
                ExtOp::ExtraGeometryMode,
                0,
                ExtraGeometryMode::INVERT_CULLING.bits(),
            ),
            load_vertices(VERTICES, 3, 0),
            tri1(0, 1, 2),
            ext(
                ExtOp::ExtraGeometryMode,
                ExtraGeometryMode::INVERT_CULLING.bits(),
                0,
            ),
            tri1(0, 1, 2),
            end_dl(),
        ],
    );

    let mut gfx = interpreter();
    run(&mut gfx, &store);

    assert_eq!(gfx.stats().triangles, 1);
    assert_eq!(gfx.stats().culled, 1);
    assert!(gfx.rsp().extra_geometry_mode.is_empty());
}

#[test]
fn test_framebuffer_redirect_and_reset() {
    let mut store = store_with_triangle();
    let mut gfx = interpreter();
    let fb = gfx.create_framebuffer(80, 60, false);
    store.insert_display_list(
        ROOT,
        &[
            ext(ExtOp::SetFb, 0, fb.0),
            load_vertices(VERTICES, 3, 0),
            tri1(0, 1, 2),
            ext(ExtOp::ResetFb, 0, 0),
            tri1(0, 1, 2),
            end_dl(),
        ],
    );
    run(&mut gfx, &store);

    let calls = gfx.backend().calls();
    let redirect = calls
        .iter()
        .position(|call| *call == BackendCall::StartDrawToFramebuffer(fb))
        .unwrap();
    assert_eq!(calls[redirect + 1], BackendCall::ClearFramebuffer);
    assert_eq!(calls.last(), Some(&BackendCall::EndFrame));
    // One draw per target
    assert_eq!(gfx.backend().draw_batches(), vec![1, 1]);
    assert!(!gfx.framebuffers().is_redirected());
}

#[test]
fn test_unknown_framebuffer_is_ignored() {
    let mut store = ResourceStore::new();
    store.insert_display_list(ROOT, &[ext(ExtOp::SetFb, 0, 42), end_dl()]);

    let mut gfx = interpreter();
    run(&mut gfx, &store);

    assert!(!gfx
        .backend()
        .calls()
        .contains(&BackendCall::StartDrawToFramebuffer(FramebufferId(42))));
}

#[test]
fn test_copy_and_read_back() {
    let mut store = ResourceStore::new();
    let mut gfx = interpreter();
    let src = gfx.create_framebuffer(16, 8, false);
    let dst = gfx.create_framebuffer(16, 8, false);
    store.insert_display_list(
        ROOT,
        &[
            ext(ExtOp::CopyFb, dst.0, src.0),
            ext(ExtOp::ReadFb, dst.0, 0x99),
            end_dl(),
        ],
    );
    run(&mut gfx, &store);

    let calls = gfx.backend().calls();
    assert!(calls.contains(&BackendCall::CopyFramebuffer { dst, src }));
    assert!(calls.contains(&BackendCall::ReadFramebuffer(dst)));
    assert_eq!(gfx.readback(0x99).map(<[u16]>::len), Some(16 * 8));
    assert!(gfx.readback(0x98).is_none());
}

#[test]
fn test_blended_texture_binds_overlays() {
    let mut store = store_with_texels();
    store.register_texture(texture(0xA1, TextureKind::Decoded, 4, 4));
    store.register_texture(texture(0xA2, TextureKind::Decoded, 4, 4));

    let mut list = vec![
        ext(ExtOp::RegisterBlendedTexture, 0, TEXELS),
        hash_record(0xA1),
        hash_record(0xA2),
    ];
    list.extend(rgba16_setup(4, 0));
    list.extend([tri1(0, 1, 2), end_dl()]);
    store.insert_display_list(ROOT, &list);

    let mut gfx = interpreter();
    run(&mut gfx, &store);

    assert_eq!(gfx.backend().texture_uploads(), 3);
    let calls = gfx.backend().calls();
    for slot in [0, 2, 4] {
        assert!(calls
            .iter()
            .any(|call| matches!(call, BackendCall::SelectTexture { slot: s, .. } if *s == slot)));
    }
    let mask = ShaderOpts::TEXTURE_MASK0 | ShaderOpts::TEXTURE_BLEND0;
    assert_eq!(shader_options(&gfx)[0] & mask.bits(), mask.bits());
}

#[test]
fn test_shade_alpha_reads_one_under_fog() {
    let mut store = store_with_triangle();
    store.insert_display_list(
        ROOT,
        &[
            combine_d(G_CCMUX_SHADE, G_ACMUX_SHADE),
            // Blender uses the fog color in cycle 0
            Gfx::with_opcode(0xE2, 31, 3 << 30),
            load_vertices(VERTICES, 3, 0),
            tri1(0, 1, 2),
            end_dl(),
        ],
    );

    let mut gfx = interpreter();
    run(&mut gfx, &store);

    let buf = gfx
        .backend()
        .calls()
        .iter()
        .find_map(|call| match call {
            BackendCall::DrawTriangles { buf, .. } => Some(buf.clone()),
            _ => None,
        })
        .unwrap();
    // x y z w, fog rgb + factor, shade rgb + alpha
    assert_eq!(buf.len(), 3 * 12);
    assert_eq!(buf[11], 1.0);
}
