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

//! Custom assertions over recorded backend calls

use ultragfx::core::backend::BackendCall;
use ultragfx::core::RecordingBackend;

/// Assert the backend saw exactly one frame, opened and closed in order
#[allow(dead_code)]
pub fn assert_single_frame(backend: &RecordingBackend) {
    let calls = backend.calls();
    let starts = calls
        .iter()
        .filter(|call| matches!(call, BackendCall::StartFrame(_)))
        .count();
    assert_eq!(starts, 1, "expected one StartFrame, got {}", starts);
    assert!(
        matches!(calls.first(), Some(BackendCall::StartFrame(_))),
        "first call was {:?}",
        calls.first()
    );
    assert_eq!(
        calls.last(),
        Some(&BackendCall::EndFrame),
        "last call was {:?}",
        calls.last()
    );
}

/// Assert the triangle counts of every draw call, in order
#[allow(dead_code)]
pub fn assert_draw_batches(backend: &RecordingBackend, expected: &[usize]) {
    let actual = backend.draw_batches();
    assert_eq!(
        actual, expected,
        "draw batches mismatch: expected {:?}, got {:?}",
        expected, actual
    );
}
