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

//! Render targets and coordinate remapping
//!
//! # Targets
//!
//! - **Swap target** (`FramebufferId::PRIMARY`): what the window shows
//! - **Game target**: an offscreen target the whole frame is drawn into,
//!   created when rendering to a framebuffer is requested or multisampling
//!   is on. It is the only multisampled target and is resolved before it
//!   is shown, copied or read back
//! - **Auxiliary targets**: created on request with a native size; with
//!   the resize policy their applied size follows the ratio of output
//!   height to native height
//!
//! # Coordinates
//!
//! Viewport and scissor rectangles arrive in native coordinates with the
//! origin at the top left. Drawing into the game or swap target scales
//! them uniformly by output height over native height and centres them
//! horizontally (letterboxing); drawing into the swap target also adds the
//! window-chrome offset. Auxiliary targets scale each axis by applied over
//! native size. Backends whose row 0 is the bottom row get y flipped.

use std::collections::BTreeMap;

use crate::core::backend::{FrameView, FramebufferId, Rect, RenderingBackend};
use crate::core::rdp::NativeRect;

/// An auxiliary render target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuxFramebuffer {
    pub id: FramebufferId,
    pub orig_width: u32,
    pub orig_height: u32,
    pub applied_width: u32,
    pub applied_height: u32,
    /// Applied size follows the output resolution
    pub resize: bool,
}

/// Owner of every render target the interpreter draws into
#[derive(Debug)]
pub struct FramebufferManager {
    view: FrameView,
    msaa_level: u32,
    render_to_framebuffer: bool,
    game: Option<FramebufferId>,
    /// Plain target the multisampled game target resolves into
    game_resolved: Option<FramebufferId>,
    aux: BTreeMap<FramebufferId, AuxFramebuffer>,
    active: Option<FramebufferId>,
}

impl FramebufferManager {
    pub fn new(view: FrameView, msaa_level: u32, render_to_framebuffer: bool) -> Self {
        Self {
            view,
            msaa_level: msaa_level.max(1),
            render_to_framebuffer,
            game: None,
            game_resolved: None,
            aux: BTreeMap::new(),
            active: None,
        }
    }

    pub fn view(&self) -> &FrameView {
        &self.view
    }

    pub fn msaa_level(&self) -> u32 {
        self.msaa_level
    }

    /// Target the frame is drawn into when nothing is redirected
    pub fn primary_target(&self) -> FramebufferId {
        self.game.unwrap_or(FramebufferId::PRIMARY)
    }

    /// Redirected auxiliary target, if any
    pub fn active(&self) -> Option<FramebufferId> {
        self.active
    }

    pub fn is_redirected(&self) -> bool {
        self.active.is_some()
    }

    pub fn get(&self, fb: FramebufferId) -> Option<&AuxFramebuffer> {
        self.aux.get(&fb)
    }

    pub fn aux_count(&self) -> usize {
        self.aux.len()
    }

    /// Start-of-frame sizing
    ///
    /// Creates the game target on first use and recomputes applied sizes
    /// only when the output or native resolution changed.
    pub fn begin_frame<B>(&mut self, backend: &mut B, view: FrameView)
    where
        B: RenderingBackend + ?Sized,
    {
        let dims_changed = (view.width, view.height, view.native_width, view.native_height)
            != (
                self.view.width,
                self.view.height,
                self.view.native_width,
                self.view.native_height,
            );
        self.view = view;

        let needs_game = self.render_to_framebuffer || self.msaa_level > 1;
        if needs_game && self.game.is_none() {
            let fb = backend.create_framebuffer();
            log::debug!("Created game target {:?} (msaa {})", fb, self.msaa_level);
            backend.update_framebuffer_parameters(fb, view.width, view.height, self.msaa_level);
            self.game = Some(fb);
        } else if dims_changed {
            if let Some(fb) = self.game {
                backend.update_framebuffer_parameters(fb, view.width, view.height, self.msaa_level);
            }
        }

        let needs_resolved = self.render_to_framebuffer && self.msaa_level > 1;
        if needs_resolved && self.game_resolved.is_none() {
            let fb = backend.create_framebuffer();
            backend.update_framebuffer_parameters(fb, view.width, view.height, 1);
            self.game_resolved = Some(fb);
        } else if dims_changed {
            if let Some(fb) = self.game_resolved {
                backend.update_framebuffer_parameters(fb, view.width, view.height, 1);
            }
        }

        if dims_changed {
            let scaled: Vec<AuxFramebuffer> = self
                .aux
                .values_mut()
                .filter(|fb| fb.resize)
                .map(|fb| {
                    (fb.applied_width, fb.applied_height) =
                        applied_size(&view, fb.orig_width, fb.orig_height);
                    *fb
                })
                .collect();
            for fb in scaled {
                log::debug!(
                    "Resized {:?} to {}x{}",
                    fb.id,
                    fb.applied_width,
                    fb.applied_height
                );
                backend.update_framebuffer_parameters(
                    fb.id,
                    fb.applied_width,
                    fb.applied_height,
                    1,
                );
            }
        }
    }

    /// Create an auxiliary target of native size `width` x `height`
    pub fn create<B>(
        &mut self,
        backend: &mut B,
        width: u32,
        height: u32,
        resize: bool,
    ) -> FramebufferId
    where
        B: RenderingBackend + ?Sized,
    {
        let id = backend.create_framebuffer();
        let (applied_width, applied_height) = if resize {
            applied_size(&self.view, width, height)
        } else {
            (width, height)
        };
        backend.update_framebuffer_parameters(id, applied_width, applied_height, 1);
        self.aux.insert(
            id,
            AuxFramebuffer {
                id,
                orig_width: width,
                orig_height: height,
                applied_width,
                applied_height,
                resize,
            },
        );
        log::debug!(
            "Created framebuffer {:?} {}x{} (applied {}x{})",
            id,
            width,
            height,
            applied_width,
            applied_height
        );
        id
    }

    /// Redirect drawing into an auxiliary target
    pub fn set_target<B>(&mut self, backend: &mut B, fb: FramebufferId) -> bool
    where
        B: RenderingBackend + ?Sized,
    {
        if !self.aux.contains_key(&fb) {
            log::warn!("Drawing redirected to unknown framebuffer {:?}", fb);
            return false;
        }
        backend.start_draw_to_framebuffer(fb);
        self.active = Some(fb);
        true
    }

    /// Return drawing to the primary target; no-op when not redirected
    pub fn reset_target<B>(&mut self, backend: &mut B) -> bool
    where
        B: RenderingBackend + ?Sized,
    {
        if self.active.take().is_none() {
            return false;
        }
        backend.start_draw_to_framebuffer(self.primary_target());
        true
    }

    /// Native rectangle to backend pixels for the current target
    pub fn remap(&self, rect: NativeRect, origin_bottom_left: bool) -> Rect {
        let target = self.active.and_then(|fb| self.aux.get(&fb));
        let (x, y, width, height, target_height) = match target {
            Some(fb) => {
                let sx = fb.applied_width as f32 / fb.orig_width.max(1) as f32;
                let sy = fb.applied_height as f32 / fb.orig_height.max(1) as f32;
                (
                    rect.x * sx,
                    rect.y * sy,
                    rect.width * sx,
                    rect.height * sy,
                    fb.applied_height as f32,
                )
            }
            None => {
                let scale = self.view.height as f32 / self.view.native_height.max(1) as f32;
                let letterbox =
                    (self.view.width as f32 - self.view.native_width as f32 * scale) / 2.0;
                (
                    rect.x * scale + letterbox,
                    rect.y * scale,
                    rect.width * scale,
                    rect.height * scale,
                    self.view.height as f32,
                )
            }
        };

        let y = if origin_bottom_left {
            target_height - (y + height)
        } else {
            y
        };

        let mut out = Rect::new(
            x.round() as i32,
            y.round() as i32,
            width.round() as i32,
            height.round() as i32,
        );
        if self.active.is_none() && self.game.is_none() {
            out.x += self.view.offset_x;
            out.y += self.view.offset_y;
        }
        out
    }

    /// Resolve the multisampled game target for presentation
    ///
    /// Returns the target that now holds the visible frame.
    pub fn resolve_msaa<B>(&mut self, backend: &mut B) -> FramebufferId
    where
        B: RenderingBackend + ?Sized,
    {
        match self.game {
            Some(game) if self.msaa_level > 1 => {
                let dst = self.game_resolved.unwrap_or(FramebufferId::PRIMARY);
                backend.resolve_msaa(dst, game);
                dst
            }
            Some(game) => game,
            None => FramebufferId::PRIMARY,
        }
    }

    /// Target that can be sampled or read, resolving multisampling first
    fn readable<B>(&mut self, backend: &mut B, fb: FramebufferId) -> FramebufferId
    where
        B: RenderingBackend + ?Sized,
    {
        if fb == FramebufferId::PRIMARY || Some(fb) == self.game {
            self.resolve_msaa(backend)
        } else {
            fb
        }
    }

    fn size_of(&self, fb: FramebufferId) -> (u32, u32) {
        match self.aux.get(&fb) {
            Some(aux) => (aux.applied_width, aux.applied_height),
            None => (self.view.width, self.view.height),
        }
    }

    /// Copy one target into another, scaling to fit
    pub fn copy<B>(&mut self, backend: &mut B, dst: FramebufferId, src: FramebufferId)
    where
        B: RenderingBackend + ?Sized,
    {
        let (src_w, src_h) = self.size_of(src);
        let (dst_w, dst_h) = self.size_of(dst);
        let src = self.readable(backend, src);
        backend.copy_framebuffer(
            dst,
            src,
            Rect::new(0, 0, src_w as i32, src_h as i32),
            Rect::new(0, 0, dst_w as i32, dst_h as i32),
        );
    }

    /// Read a target back as RGBA5551 at its native size
    pub fn read<B>(&mut self, backend: &mut B, fb: FramebufferId) -> Vec<u16>
    where
        B: RenderingBackend + ?Sized,
    {
        let (width, height) = match self.aux.get(&fb) {
            Some(aux) => (aux.orig_width, aux.orig_height),
            None => (self.view.native_width, self.view.native_height),
        };
        let src = self.readable(backend, fb);
        backend.read_framebuffer_to_cpu(src, width, height)
    }
}

/// Size of a resizable target under the current output
fn applied_size(view: &FrameView, width: u32, height: u32) -> (u32, u32) {
    let native = view.native_height.max(1) as u64;
    (
        (width as u64 * view.height as u64 / native) as u32,
        (height as u64 * view.height as u64 / native) as u32,
    )
}

#[cfg(test)]
mod tests;
