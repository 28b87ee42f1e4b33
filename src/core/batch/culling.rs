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

//! Trivial rejection and back-face culling

use crate::core::gbi::{ExtraGeometryMode, GeometryMode};
use crate::core::rsp::Vertex;

/// Why a triangle never reached the batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Culled {
    /// All three vertices lie outside one common clip plane
    Rejected,
    /// Facing away under the active cull mode
    Facing,
}

/// Signed area of a triangle after the perspective divide
///
/// Positive for counter-clockwise winding. The sign is flipped when an
/// odd number of vertices lie behind the eye.
pub fn signed_area(v: [&Vertex; 3]) -> f32 {
    let [x0, y0] = [v[0].x / v[0].w, v[0].y / v[0].w];
    let [x1, y1] = [v[1].x / v[1].w, v[1].y / v[1].w];
    let [x2, y2] = [v[2].x / v[2].w, v[2].y / v[2].w];

    let (dx1, dy1) = (x1 - x0, y1 - y0);
    let (dx2, dy2) = (x2 - x0, y2 - y0);
    let cross = dx1 * dy2 - dy1 * dx2;

    if (v[0].w < 0.0) ^ (v[1].w < 0.0) ^ (v[2].w < 0.0) {
        -cross
    } else {
        cross
    }
}

/// Decide whether a triangle is dropped before batching
///
/// # Examples
///
/// ```
/// use ultragfx::core::batch::{cull_triangle, Culled};
/// use ultragfx::core::gbi::{ExtraGeometryMode, GeometryMode};
/// use ultragfx::core::rsp::{Vertex, CLIP_X_POS};
///
/// let off = Vertex { w: 1.0, clip_rej: CLIP_X_POS, ..Vertex::default() };
/// let tri = [&off, &off, &off];
/// assert_eq!(
///     cull_triangle(tri, GeometryMode::empty(), ExtraGeometryMode::empty()),
///     Some(Culled::Rejected)
/// );
/// ```
pub fn cull_triangle(
    v: [&Vertex; 3],
    mode: GeometryMode,
    extra: ExtraGeometryMode,
) -> Option<Culled> {
    if v[0].clip_rej & v[1].clip_rej & v[2].clip_rej != 0 {
        return Some(Culled::Rejected);
    }

    let cull = mode & GeometryMode::CULL_BOTH;
    if cull.is_empty() {
        return None;
    }
    if cull == GeometryMode::CULL_BOTH {
        return Some(Culled::Facing);
    }

    let mut cross = signed_area(v);
    if extra.contains(ExtraGeometryMode::INVERT_CULLING) {
        cross = -cross;
    }

    let facing_away = if cull == GeometryMode::CULL_FRONT {
        cross <= 0.0
    } else {
        cross >= 0.0
    };
    facing_away.then_some(Culled::Facing)
}
