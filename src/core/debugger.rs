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

//! Display-list debugger hooks

use super::dlist::CommandPos;

/// Queried by the run loop before every command
pub trait Debugger {
    /// Whether breakpoints should be checked at all
    fn is_debugging(&self) -> bool;

    /// Whether `path` (open call sites, then the current command) matches a breakpoint
    fn has_breakpoint(&self, path: &[CommandPos]) -> bool;
}

/// Debugger that never pauses
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDebugger;

impl Debugger for NoDebugger {
    fn is_debugging(&self) -> bool {
        false
    }

    fn has_breakpoint(&self, _path: &[CommandPos]) -> bool {
        false
    }
}

/// Debugger holding a list of breakpoint paths
///
/// A breakpoint matches when it equals the full call path, so the same
/// command reached through a different chain of calls does not pause.
#[derive(Debug, Default, Clone)]
pub struct BreakpointDebugger {
    pub enabled: bool,
    breakpoints: Vec<Vec<CommandPos>>,
}

impl BreakpointDebugger {
    pub fn new() -> Self {
        Self {
            enabled: true,
            breakpoints: Vec::new(),
        }
    }

    pub fn add_breakpoint(&mut self, path: Vec<CommandPos>) {
        if !self.breakpoints.contains(&path) {
            self.breakpoints.push(path);
        }
    }

    pub fn remove_breakpoint(&mut self, path: &[CommandPos]) {
        self.breakpoints.retain(|bp| bp.as_slice() != path);
    }

    pub fn breakpoints(&self) -> &[Vec<CommandPos>] {
        &self.breakpoints
    }
}

impl Debugger for BreakpointDebugger {
    fn is_debugging(&self) -> bool {
        self.enabled
    }

    fn has_breakpoint(&self, path: &[CommandPos]) -> bool {
        self.breakpoints.iter().any(|bp| bp.as_slice() == path)
    }
}
