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

//! Culling tests

use super::super::*;
use crate::core::gbi::{ExtraGeometryMode, GeometryMode};
use crate::core::rsp::{clip_codes, Vertex, CLIP_X_POS, CLIP_Y_NEG};

fn vtx(x: f32, y: f32, w: f32) -> Vertex {
    Vertex {
        x,
        y,
        z: 0.0,
        w,
        clip_rej: clip_codes(x, y, 0.0, w),
        ..Vertex::default()
    }
}

/// Triangle with positive signed area
fn positive() -> [Vertex; 3] {
    [vtx(0.0, 0.0, 1.0), vtx(0.5, 0.0, 1.0), vtx(0.0, 0.5, 1.0)]
}

fn refs(v: &[Vertex; 3]) -> [&Vertex; 3] {
    [&v[0], &v[1], &v[2]]
}

#[test]
fn test_shared_clip_bit_rejects() {
    let v = [vtx(2.0, 0.0, 1.0), vtx(3.0, 0.5, 1.0), vtx(2.5, -0.5, 1.0)];
    assert!(v.iter().all(|v| v.clip_rej & CLIP_X_POS != 0));
    assert_eq!(
        cull_triangle(refs(&v), GeometryMode::empty(), ExtraGeometryMode::empty()),
        Some(Culled::Rejected)
    );
}

#[test]
fn test_straddling_triangle_accepted() {
    // Outside on different planes only
    let v = [vtx(2.0, 0.0, 1.0), vtx(0.0, -2.0, 1.0), vtx(0.0, 0.0, 1.0)];
    assert_ne!(v[1].clip_rej & CLIP_Y_NEG, 0);
    assert_eq!(
        cull_triangle(refs(&v), GeometryMode::empty(), ExtraGeometryMode::empty()),
        None
    );
}

#[test]
fn test_cull_back_drops_positive_area() {
    let pos = positive();
    let neg = [pos[0], pos[2], pos[1]];

    let mode = GeometryMode::CULL_BACK;
    assert_eq!(
        cull_triangle(refs(&pos), mode, ExtraGeometryMode::empty()),
        Some(Culled::Facing)
    );
    assert_eq!(cull_triangle(refs(&neg), mode, ExtraGeometryMode::empty()), None);
}

#[test]
fn test_cull_front_drops_negative_area() {
    let pos = positive();
    let neg = [pos[0], pos[2], pos[1]];

    let mode = GeometryMode::CULL_FRONT;
    assert_eq!(cull_triangle(refs(&pos), mode, ExtraGeometryMode::empty()), None);
    assert_eq!(
        cull_triangle(refs(&neg), mode, ExtraGeometryMode::empty()),
        Some(Culled::Facing)
    );
}

#[test]
fn test_cull_both_drops_everything() {
    let v = positive();
    assert_eq!(
        cull_triangle(refs(&v), GeometryMode::CULL_BOTH, ExtraGeometryMode::empty()),
        Some(Culled::Facing)
    );
}

#[test]
fn test_invert_culling_flips_winding() {
    let v = positive();
    assert_eq!(
        cull_triangle(
            refs(&v),
            GeometryMode::CULL_FRONT,
            ExtraGeometryMode::INVERT_CULLING
        ),
        Some(Culled::Facing)
    );
    assert_eq!(
        cull_triangle(
            refs(&v),
            GeometryMode::CULL_BACK,
            ExtraGeometryMode::INVERT_CULLING
        ),
        None
    );
}

#[test]
fn test_vertex_behind_eye_flips_sign() {
    let v = positive();
    let area = signed_area(refs(&v));
    assert!(area > 0.0);

    // Negating x, y and w of one vertex keeps its projected position but
    // puts it behind the eye
    let mut behind = v;
    behind[0] = vtx(-0.0, -0.0, -1.0);
    assert!(signed_area(refs(&behind)) < 0.0);
}

#[test]
fn test_degenerate_triangle_culled_either_way() {
    let v = [vtx(0.0, 0.0, 1.0), vtx(0.5, 0.5, 1.0), vtx(1.0, 1.0, 1.0)];
    let none = ExtraGeometryMode::empty();
    assert!(cull_triangle(refs(&v), GeometryMode::CULL_BACK, none).is_some());
    assert!(cull_triangle(refs(&v), GeometryMode::CULL_FRONT, none).is_some());
}
