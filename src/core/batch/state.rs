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

//! Backend state mirror

use super::TriangleBatch;
use crate::core::backend::{Rect, RenderingBackend, ShaderHandle};

/// Sampler parameters of one texture slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerState {
    pub linear: bool,
    pub cms: u8,
    pub cmt: u8,
}

/// Last render state sent to the backend
///
/// Every setter compares against the mirror and, on a change, flushes the
/// batch before forwarding the new value. Unset entries always count as
/// changed.
#[derive(Debug, Default)]
pub struct BoundState {
    depth: Option<(bool, bool)>,
    decal: Option<bool>,
    viewport: Option<Rect>,
    scissor: Option<Rect>,
    shader: Option<ShaderHandle>,
    use_alpha: Option<bool>,
    samplers: [Option<SamplerState>; 2],
}

fn update<T: PartialEq + Copy>(slot: &mut Option<T>, value: T) -> bool {
    if *slot == Some(value) {
        false
    } else {
        *slot = Some(value);
        true
    }
}

impl BoundState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything so the next setters resend their values
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn shader(&self) -> Option<ShaderHandle> {
        self.shader
    }

    pub fn set_depth<B: RenderingBackend + ?Sized>(
        &mut self,
        batch: &mut TriangleBatch,
        backend: &mut B,
        test: bool,
        mask: bool,
    ) {
        if update(&mut self.depth, (test, mask)) {
            batch.flush(backend);
            backend.set_depth_test_and_mask(test, mask);
        }
    }

    pub fn set_decal<B: RenderingBackend + ?Sized>(
        &mut self,
        batch: &mut TriangleBatch,
        backend: &mut B,
        decal: bool,
    ) {
        if update(&mut self.decal, decal) {
            batch.flush(backend);
            backend.set_zmode_decal(decal);
        }
    }

    pub fn set_viewport<B: RenderingBackend + ?Sized>(
        &mut self,
        batch: &mut TriangleBatch,
        backend: &mut B,
        rect: Rect,
    ) {
        if update(&mut self.viewport, rect) {
            batch.flush(backend);
            backend.set_viewport(rect);
        }
    }

    pub fn set_scissor<B: RenderingBackend + ?Sized>(
        &mut self,
        batch: &mut TriangleBatch,
        backend: &mut B,
        rect: Rect,
    ) {
        if update(&mut self.scissor, rect) {
            batch.flush(backend);
            backend.set_scissor(rect);
        }
    }

    pub fn set_use_alpha<B: RenderingBackend + ?Sized>(
        &mut self,
        batch: &mut TriangleBatch,
        backend: &mut B,
        use_alpha: bool,
    ) {
        if update(&mut self.use_alpha, use_alpha) {
            batch.flush(backend);
            backend.set_use_alpha(use_alpha);
        }
    }

    /// Make `shader` current; returns whether it changed
    pub fn set_shader<B: RenderingBackend + ?Sized>(
        &mut self,
        batch: &mut TriangleBatch,
        backend: &mut B,
        shader: ShaderHandle,
    ) -> bool {
        let previous = self.shader;
        if !update(&mut self.shader, shader) {
            return false;
        }
        batch.flush(backend);
        if let Some(previous) = previous {
            backend.unload_shader(previous);
        }
        backend.load_shader(shader);
        true
    }

    pub fn set_sampler<B: RenderingBackend + ?Sized>(
        &mut self,
        batch: &mut TriangleBatch,
        backend: &mut B,
        slot: usize,
        sampler: SamplerState,
    ) {
        if update(&mut self.samplers[slot & 1], sampler) {
            batch.flush(backend);
            backend.set_sampler_parameters(slot, sampler.linear, sampler.cms, sampler.cmt);
        }
    }

    /// A new texture was bound to `slot`; its sampler must be resent
    pub fn texture_rebound(&mut self, slot: usize) {
        self.samplers[slot & 1] = None;
    }

    /// Viewport and scissor must be resent, e.g. after a target switch
    pub fn invalidate_rects(&mut self) {
        self.viewport = None;
        self.scissor = None;
    }
}
