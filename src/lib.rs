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

//! N64 Fast3D display-list interpreter library
//!
//! This library walks the display lists a Nintendo 64 game submits to its
//! graphics microcode and turns them into draw calls against a pluggable
//! [`RenderingBackend`](core::RenderingBackend). It covers the F3D, F3DEX and
//! F3DEX2 command sets plus a set of extension commands for replacement
//! assets and offscreen render targets.
//!
//! # Example
//!
//! ```
//! use ultragfx::core::{
//!     Gfx, Interpreter, InterpreterConfig, NoDebugger, RecordingBackend, ResourceStore,
//!     RunOutcome,
//! };
//!
//! let mut store = ResourceStore::new();
//! store.insert_display_list(
//!     0x1000,
//!     &[
//!         Gfx::new(0xFA00_0000, 0xFF00_00FF), // primitive color
//!         Gfx::new(0xDF00_0000, 0),           // end of list
//!     ],
//! );
//!
//! let mut gfx = Interpreter::new(RecordingBackend::new(), InterpreterConfig::default());
//! assert_eq!(gfx.run(&store, &NoDebugger, 0x1000), RunOutcome::Finished);
//! assert_eq!(gfx.rdp().prim_color, [0xFF, 0, 0, 0xFF]);
//! ```

pub mod core;
