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

//! Triangle batching, culling and rectangle tests

use super::*;
use crate::core::gbi::{GeometryMode, G_ACMUX_SHADE, G_CCMUX_SHADE};
use crate::core::rdp::NativeRect;

fn triangle_list(count: usize) -> Vec<Gfx> {
    let mut list = vec![load_vertices(VERTICES, 3, 0)];
    list.extend(std::iter::repeat(tri1(0, 1, 2)).take(count));
    list.push(end_dl());
    list
}

#[test]
fn test_triangles_flush_when_batch_fills() {
    let mut store = store_with_triangle();
    store.insert_display_list(ROOT, &triangle_list(600));

    let mut gfx = interpreter();
    run(&mut gfx, &store);

    assert_eq!(gfx.backend().draw_batches(), vec![256, 256, 88]);
    assert_eq!(gfx.stats().triangles, 600);
    assert_eq!(gfx.stats().draw_calls, 3);
}

#[test]
fn test_state_change_flushes_pending_triangles() {
    let mut store = store_with_triangle();
    store.insert_display_list(
        ROOT,
        &[
            load_vertices(VERTICES, 3, 0),
            tri1(0, 1, 2),
            tri1(0, 1, 2),
            combine_d(G_CCMUX_SHADE, G_ACMUX_SHADE),
            tri1(0, 1, 2),
            end_dl(),
        ],
    );

    let mut gfx = interpreter();
    run(&mut gfx, &store);

    assert_eq!(gfx.backend().draw_batches(), vec![2, 1]);
    assert_eq!(gfx.combiner_cache().len(), 2);
}

#[test]
fn test_back_face_culling() {
    let mut store = store_with_triangle();
    store.insert_display_list(
        ROOT,
        &[
            geometry_mode(0, GeometryMode::CULL_BACK.bits()),
            load_vertices(VERTICES, 3, 0),
            tri1(0, 1, 2),
            tri1(0, 2, 1),
            end_dl(),
        ],
    );

    let mut gfx = interpreter();
    run(&mut gfx, &store);

    // (0,0) (1,0) (0,1) has positive area and counts as back-facing
    assert_eq!(gfx.stats().triangles, 1);
    assert_eq!(gfx.stats().culled, 1);
}

#[test]
fn test_cull_both_drops_everything() {
    let mut store = store_with_triangle();
    store.insert_display_list(
        ROOT,
        &[
            geometry_mode(0, GeometryMode::CULL_BOTH.bits()),
            load_vertices(VERTICES, 3, 0),
            tri1(0, 1, 2),
            tri1(0, 2, 1),
            end_dl(),
        ],
    );

    let mut gfx = interpreter();
    run(&mut gfx, &store);

    assert_eq!(gfx.stats().triangles, 0);
    assert_eq!(gfx.backend().draw_calls(), 0);
}

#[test]
fn test_shade_vertex_layout() {
    let mut store = store_with_triangle();
    store.insert_display_list(
        ROOT,
        &[
            combine_d(G_CCMUX_SHADE, G_ACMUX_SHADE),
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

    // x y z w, then one input slot with alpha
    assert_eq!(buf.len(), 3 * 8);
    assert_eq!(&buf[0..4], &[0.0, 0.0, 0.0, 1.0]);
    assert_eq!(&buf[4..8], &[1.0, 0.0, 0.0, 1.0]);
    assert_eq!(&buf[8..12], &[1.0, 0.0, 0.0, 1.0]);
    assert_eq!(&buf[12..16], &[0.0, 1.0, 0.0, 1.0]);
}

#[test]
fn test_depth_range_remap() {
    let mut store = store_with_triangle();
    store.insert_display_list(ROOT, &triangle_list(1));

    let backend = RecordingBackend::new().with_z_range_0_to_1(true);
    let mut gfx = Interpreter::new(backend, InterpreterConfig::default());
    run(&mut gfx, &store);

    let z = gfx
        .backend()
        .calls()
        .iter()
        .find_map(|call| match call {
            BackendCall::DrawTriangles { buf, .. } => Some(buf[2]),
            _ => None,
        })
        .unwrap();
    // (z + w) / 2 with z = 0, w = 1
    assert_eq!(z, 0.5);
}

#[test]
fn test_fill_rect_into_depth_buffer_is_skipped() {
    let mut store = ResourceStore::new();
    store.insert_display_list(ROOT, &[fill_rect(0, 0, 320, 240), end_dl()]);

    let mut gfx = interpreter();
    run(&mut gfx, &store);

    assert_eq!(gfx.stats().rectangles, 0);
    assert_eq!(gfx.backend().draw_calls(), 0);
}

#[test]
fn test_fill_rect_draws_two_triangles() {
    let mut store = ResourceStore::new();
    store.insert_display_list(
        ROOT,
        &[
            color_image(0x0010_0000),
            Gfx::with_opcode(0xF7, 0, 0xF801_F801),
            fill_rect(10, 10, 20, 20),
            end_dl(),
        ],
    );

    let mut gfx = interpreter();
    run(&mut gfx, &store);

    assert_eq!(gfx.stats().rectangles, 1);
    assert_eq!(gfx.stats().triangles, 2);
    assert_eq!(gfx.backend().draw_batches(), vec![2]);
    // Geometry mode and viewport are restored afterwards
    assert!(gfx.rsp().geometry_mode.is_empty());
    assert_eq!(gfx.rdp().viewport, NativeRect::default());
}

#[test]
fn test_texture_rectangle_consumes_operand_records() {
    let mut store = ResourceStore::new();
    store.insert_display_list(
        ROOT,
        &[
            Gfx::with_opcode(0xE4, (40 << 14) | (40 << 2), (8 << 14) | (8 << 2)),
            Gfx::with_opcode(0xE1, 0, 0),
            Gfx::with_opcode(0xF1, 0, (1 << 26) | (1 << 10)),
            prim_color(0x0102_0304),
            end_dl(),
        ],
    );

    let mut gfx = interpreter();
    run(&mut gfx, &store);

    assert_eq!(gfx.stats().rectangles, 1);
    assert_eq!(gfx.stats().triangles, 2);
    assert_eq!(gfx.stats().commands, 3);
    assert_eq!(gfx.rdp().prim_color, [1, 2, 3, 4]);
}

#[test]
fn test_rectangle_vertices_span_native_screen() {
    let mut store = ResourceStore::new();
    store.insert_display_list(
        ROOT,
        &[color_image(0x0010_0000), fill_rect(0, 0, 320, 240), end_dl()],
    );

    let mut gfx = interpreter();
    run(&mut gfx, &store);

    let ul = gfx.rsp().vertices[64];
    let lr = gfx.rsp().vertices[66];
    assert_eq!((ul.x, ul.y), (-1.0, 1.0));
    assert_eq!((lr.x, lr.y), (1.0, -1.0));
}
