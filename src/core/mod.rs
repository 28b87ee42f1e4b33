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

//! Core interpreter components
//!
//! This module contains everything needed to turn a display list into
//! backend draw calls:
//! - GBI command decoding (`gbi`)
//! - Display-list cursors and the execution stack (`dlist`)
//! - RSP transform and lighting state (`rsp`)
//! - RDP tiles, texture loads and render modes (`rdp`)
//! - Texture and combiner caches (`cache`)
//! - Triangle batching (`batch`)
//! - Render-target management (`framebuffer`)
//! - The command interpreter itself (`interpreter`)

pub mod backend;
pub mod batch;
pub mod cache;
pub mod config;
pub mod debugger;
pub mod dlist;
pub mod error;
pub mod framebuffer;
pub mod gbi;
pub mod interpreter;
pub mod rdp;
pub mod resource;
pub mod rsp;

// Re-export commonly used types
pub use backend::{FrameView, FramebufferId, RecordingBackend, RenderingBackend};
pub use config::InterpreterConfig;
pub use debugger::{BreakpointDebugger, Debugger, NoDebugger};
pub use error::{GfxError, Result};
pub use gbi::{Gfx, Ucode};
pub use interpreter::{FrameStats, Interpreter, RunOutcome};
pub use resource::{ResourceProvider, ResourceStore, Scene};
