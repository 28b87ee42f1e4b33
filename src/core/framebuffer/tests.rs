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

//! Framebuffer manager tests

use super::*;
use crate::core::backend::{BackendCall, RecordingBackend};

fn native_view() -> FrameView {
    FrameView::new(320, 240, 320, 240)
}

fn rect(x: f32, y: f32, width: f32, height: f32) -> NativeRect {
    NativeRect {
        x,
        y,
        width,
        height,
    }
}

#[test]
fn test_no_game_target_by_default() {
    let mut backend = RecordingBackend::new();
    let mut fbs = FramebufferManager::new(native_view(), 1, false);
    fbs.begin_frame(&mut backend, native_view());

    assert_eq!(fbs.primary_target(), FramebufferId::PRIMARY);
    assert!(backend.calls().is_empty());
}

#[test]
fn test_msaa_creates_multisampled_game_target() {
    let mut backend = RecordingBackend::new();
    let mut fbs = FramebufferManager::new(native_view(), 4, false);
    fbs.begin_frame(&mut backend, native_view());

    let game = fbs.primary_target();
    assert_ne!(game, FramebufferId::PRIMARY);
    assert!(backend.calls().contains(&BackendCall::UpdateFramebuffer {
        fb: game,
        width: 320,
        height: 240,
        msaa_level: 4
    }));

    // Resolves straight into the swap target
    assert_eq!(fbs.resolve_msaa(&mut backend), FramebufferId::PRIMARY);
    assert_eq!(
        backend.calls().last(),
        Some(&BackendCall::ResolveMsaa {
            dst: FramebufferId::PRIMARY,
            src: game
        })
    );
}

#[test]
fn test_render_to_framebuffer_with_msaa_resolves_offscreen() {
    let mut backend = RecordingBackend::new();
    let mut fbs = FramebufferManager::new(native_view(), 2, true);
    fbs.begin_frame(&mut backend, native_view());

    let shown = fbs.resolve_msaa(&mut backend);
    assert_ne!(shown, FramebufferId::PRIMARY);
    assert_ne!(shown, fbs.primary_target());
}

#[test]
fn test_aux_resize_follows_output_height() {
    let mut backend = RecordingBackend::new();
    let mut fbs = FramebufferManager::new(native_view(), 1, false);
    let scaled = fbs.create(&mut backend, 64, 32, true);
    let fixed = fbs.create(&mut backend, 64, 32, false);

    backend.clear_calls();
    fbs.begin_frame(&mut backend, FrameView::new(1280, 960, 320, 240));

    let aux = fbs.get(scaled).unwrap();
    assert_eq!((aux.applied_width, aux.applied_height), (256, 128));
    let aux = fbs.get(fixed).unwrap();
    assert_eq!((aux.applied_width, aux.applied_height), (64, 32));
    assert_eq!(backend.calls().len(), 1);

    // Same dimensions again: nothing recomputed
    backend.clear_calls();
    fbs.begin_frame(&mut backend, FrameView::new(1280, 960, 320, 240));
    assert!(backend.calls().is_empty());
}

#[test]
fn test_set_and_reset_target() {
    let mut backend = RecordingBackend::new();
    let mut fbs = FramebufferManager::new(native_view(), 1, false);
    let fb = fbs.create(&mut backend, 64, 64, false);

    assert!(!fbs.set_target(&mut backend, FramebufferId(99)));
    assert!(fbs.set_target(&mut backend, fb));
    assert_eq!(fbs.active(), Some(fb));

    assert!(fbs.reset_target(&mut backend));
    assert!(!fbs.is_redirected());
    assert_eq!(
        backend.calls().last(),
        Some(&BackendCall::StartDrawToFramebuffer(FramebufferId::PRIMARY))
    );
    assert!(!fbs.reset_target(&mut backend));
}

#[test]
fn test_remap_primary_letterboxed_and_flipped() {
    let mut fbs = FramebufferManager::new(native_view(), 1, false);
    let mut backend = RecordingBackend::new();
    // 16:9 output, 4:3 native: 2x scale, 160 px bars each side
    fbs.begin_frame(&mut backend, FrameView::new(960, 480, 320, 240));

    let full = fbs.remap(rect(0.0, 0.0, 320.0, 240.0), false);
    assert_eq!(full, Rect::new(160, 0, 640, 480));

    let top = fbs.remap(rect(0.0, 0.0, 320.0, 40.0), true);
    assert_eq!(top, Rect::new(160, 400, 640, 80));
}

#[test]
fn test_remap_adds_chrome_offset_on_swap_target() {
    let mut fbs = FramebufferManager::new(native_view(), 1, false);
    let mut backend = RecordingBackend::new();
    let mut view = native_view();
    view.offset_x = 5;
    view.offset_y = 7;
    fbs.begin_frame(&mut backend, view);

    assert_eq!(
        fbs.remap(rect(10.0, 10.0, 20.0, 20.0), false),
        Rect::new(15, 17, 20, 20)
    );
}

#[test]
fn test_remap_aux_target_scales_per_axis() {
    let mut backend = RecordingBackend::new();
    let mut fbs = FramebufferManager::new(FrameView::new(640, 480, 320, 240), 1, false);
    let fb = fbs.create(&mut backend, 100, 50, true);
    fbs.set_target(&mut backend, fb);

    assert_eq!(
        fbs.remap(rect(10.0, 5.0, 50.0, 20.0), false),
        Rect::new(20, 10, 100, 40)
    );
    // Flip uses the aux target's own height
    assert_eq!(
        fbs.remap(rect(0.0, 0.0, 100.0, 10.0), true),
        Rect::new(0, 80, 200, 20)
    );
}

#[test]
fn test_read_resolves_game_target_first() {
    let mut backend = RecordingBackend::new();
    let mut fbs = FramebufferManager::new(native_view(), 4, false);
    fbs.begin_frame(&mut backend, native_view());
    backend.clear_calls();

    let pixels = fbs.read(&mut backend, FramebufferId::PRIMARY);
    assert_eq!(pixels.len(), 320 * 240);
    assert!(matches!(backend.calls()[0], BackendCall::ResolveMsaa { .. }));
    assert_eq!(
        backend.calls()[1],
        BackendCall::ReadFramebuffer(FramebufferId::PRIMARY)
    );
}

#[test]
fn test_copy_between_aux_targets_needs_no_resolve() {
    let mut backend = RecordingBackend::new();
    let mut fbs = FramebufferManager::new(native_view(), 4, false);
    let a = fbs.create(&mut backend, 32, 32, false);
    let b = fbs.create(&mut backend, 32, 32, false);
    backend.clear_calls();

    fbs.copy(&mut backend, b, a);
    assert_eq!(backend.calls(), &[BackendCall::CopyFramebuffer { dst: b, src: a }]);
}
