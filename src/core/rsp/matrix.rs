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

//! Modelview stack and projection
//!
//! Matrices are held transposed relative to the console (console row `i`
//! is glam column `i`), which turns the console's `v * M` row-vector
//! convention into glam's `M * v`:
//!
//! ```text
//! console              glam
//! top' = in * top      top' = top * in
//! mvp  = mv * proj     mvp  = proj * mv
//! clip = v * mvp       clip = mvp * v
//! ```

use glam::Mat4;

use crate::core::gbi::{get_cmd, Ucode};

/// Deepest modelview stack the microcode supports
pub const MAX_MATRIX_STACK_DEPTH: usize = 11;

/// Size of one stack entry as counted by the second-generation pop command
pub const POPMTX_ENTRY_SIZE: u32 = 64;

/// Decoded operand bits of a matrix command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MtxParams {
    /// Target the projection instead of the modelview
    pub projection: bool,
    /// Replace instead of multiply
    pub load: bool,
    /// Push the modelview before applying
    pub push: bool,
}

impl MtxParams {
    /// Decode the parameter byte of a matrix command
    ///
    /// First generation: byte 2 of w0, PROJECTION=1 LOAD=2 PUSH=4.
    /// Second generation: byte 0 of w0 with the push bit inverted,
    /// PUSH=1 LOAD=2 PROJECTION=4.
    pub fn decode(w0: u32, ucode: Ucode) -> Self {
        match ucode {
            Ucode::F3d | Ucode::F3dex => {
                let params = get_cmd(w0, 16, 8);
                Self {
                    projection: params & 0x01 != 0,
                    load: params & 0x02 != 0,
                    push: params & 0x04 != 0,
                }
            }
            Ucode::F3dex2 => {
                let params = get_cmd(w0, 0, 8) ^ 0x01;
                Self {
                    push: params & 0x01 != 0,
                    load: params & 0x02 != 0,
                    projection: params & 0x04 != 0,
                }
            }
        }
    }
}

/// Modelview stack, projection and their cached product
#[derive(Debug, Clone)]
pub struct MatrixStack {
    stack: Vec<Mat4>,
    projection: Mat4,
    mvp: Mat4,
}

impl Default for MatrixStack {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixStack {
    pub fn new() -> Self {
        let mut stack = Vec::with_capacity(MAX_MATRIX_STACK_DEPTH);
        stack.push(Mat4::IDENTITY);
        Self {
            stack,
            projection: Mat4::IDENTITY,
            mvp: Mat4::IDENTITY,
        }
    }

    /// Back to a single identity modelview
    pub fn reset(&mut self) {
        self.stack.clear();
        self.stack.push(Mat4::IDENTITY);
        self.projection = Mat4::IDENTITY;
        self.mvp = Mat4::IDENTITY;
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn modelview(&self) -> &Mat4 {
        // The stack is never empty: pop stops at depth 1
        &self.stack[self.stack.len() - 1]
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    pub fn mvp(&self) -> &Mat4 {
        &self.mvp
    }

    /// Apply a matrix command
    ///
    /// Returns `true` when the modelview changed. A push at full depth is
    /// dropped but the matrix is still applied to the top.
    pub fn apply(&mut self, matrix: Mat4, params: MtxParams) -> bool {
        if params.projection {
            self.projection = if params.load {
                matrix
            } else {
                self.projection * matrix
            };
            self.recompute();
            return false;
        }

        if params.push && self.stack.len() < MAX_MATRIX_STACK_DEPTH {
            let top = *self.modelview();
            self.stack.push(top);
        }

        let top = self.stack.len() - 1;
        self.stack[top] = if params.load {
            matrix
        } else {
            self.stack[top] * matrix
        };
        self.recompute();
        true
    }

    /// Pop up to `count` entries, never below depth 1
    ///
    /// Returns `true` when at least one entry was popped.
    pub fn pop(&mut self, count: usize) -> bool {
        let mut popped = false;
        for _ in 0..count {
            if self.stack.len() <= 1 {
                break;
            }
            self.stack.pop();
            popped = true;
        }
        self.recompute();
        popped
    }

    fn recompute(&mut self) {
        self.mvp = self.projection * *self.modelview();
    }
}
