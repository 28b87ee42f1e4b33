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

//! Display-list execution stack
//!
//! Tracks where the interpreter is reading and how it got there. A list may
//! live in console memory (addressed by a 32-bit address) or in a resource
//! resolved by hash or path; [`Cursor`] covers both.
//!
//! # Call / branch / return
//!
//! ```text
//! call(dest)    push Call{return_to: next}, continue at dest
//! branch(dest)  push BranchMarker,          continue at dest
//! ret()         pop markers until a Call, continue at its return_to;
//!               an empty stack ends the run
//! ```
//!
//! A branch never returns to its own site: the `ret()` that ends the
//! branched-to list unwinds through the marker to the enclosing call.

use std::sync::Arc;

use super::gbi::Gfx;
use super::resource::{DisplayListResource, ResourceProvider};

/// Backing storage of a display list
#[derive(Debug, Clone)]
pub enum ListSource {
    /// Big-endian records in console memory starting at this address
    Memory(u32),
    /// Records owned by a resolved resource
    Resource(Arc<DisplayListResource>),
}

/// Stable identity of a list, used for breakpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListId {
    Memory(u32),
    Resource(u64),
}

/// Identifies one command: the list it lives in and its record index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandPos {
    pub list: ListId,
    pub index: usize,
}

/// Read position inside a display list
#[derive(Debug, Clone)]
pub struct Cursor {
    source: ListSource,
    index: usize,
}

impl Cursor {
    /// Cursor at the first record of a list in memory
    pub fn memory(addr: u32) -> Self {
        Self {
            source: ListSource::Memory(addr),
            index: 0,
        }
    }

    /// Cursor at the first record of a resource list
    pub fn resource(list: Arc<DisplayListResource>) -> Self {
        Self {
            source: ListSource::Resource(list),
            index: 0,
        }
    }

    pub fn source(&self) -> &ListSource {
        &self.source
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Move forward by `records`
    #[inline]
    pub fn advance(&mut self, records: usize) {
        self.index += records;
    }

    /// Copy of this cursor moved forward by `records`
    pub fn advanced(&self, records: usize) -> Self {
        let mut next = self.clone();
        next.advance(records);
        next
    }

    /// Memory address of the current record, if the list lives in memory
    pub fn address(&self) -> Option<u32> {
        match self.source {
            ListSource::Memory(base) => {
                Some(base.wrapping_add((self.index * Gfx::SIZE) as u32))
            }
            ListSource::Resource(_) => None,
        }
    }

    pub fn position(&self) -> CommandPos {
        let list = match &self.source {
            ListSource::Memory(base) => ListId::Memory(*base),
            ListSource::Resource(res) => ListId::Resource(res.id),
        };
        CommandPos {
            list,
            index: self.index,
        }
    }

    /// Read the record under the cursor
    ///
    /// Returns `None` when the cursor ran past the end of a resource list
    /// or points at unmapped memory.
    pub fn fetch(&self, provider: &dyn ResourceProvider) -> Option<Gfx> {
        match &self.source {
            ListSource::Memory(_) => {
                let addr = self.address()?;
                let bytes = provider.read_bytes(addr, Gfx::SIZE)?;
                let record: &[u8; 8] = bytes.try_into().ok()?;
                Some(Gfx::from_be_bytes(record))
            }
            ListSource::Resource(list) => list.commands.get(self.index).copied(),
        }
    }
}

/// Entry of the execution stack
#[derive(Debug, Clone)]
pub enum StackEntry {
    /// Pushed by a call; `ret()` resumes here
    Call { return_to: Cursor },
    /// Pushed by a branch; skipped by `ret()`
    BranchMarker,
}

/// Call/branch/return bookkeeping for one run
#[derive(Debug, Default)]
pub struct ExecutionStack {
    current: Option<Cursor>,
    entries: Vec<StackEntry>,
}

impl ExecutionStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to a single frame at `root`
    pub fn start(&mut self, root: Cursor) {
        self.entries.clear();
        self.current = Some(root);
    }

    /// Drop all frames; the run is over
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current = None;
    }

    pub fn current(&self) -> Option<&Cursor> {
        self.current.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.current.is_none()
    }

    /// Number of stacked entries (calls and branch markers)
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// Step past the current record
    #[inline]
    pub fn advance(&mut self) {
        if let Some(cursor) = self.current.as_mut() {
            cursor.advance(1);
        }
    }

    /// Step past the current record and read the one after it
    ///
    /// Used by commands whose operands span several records.
    pub fn next_record(&mut self, provider: &dyn ResourceProvider) -> Option<Gfx> {
        let cursor = self.current.as_mut()?;
        cursor.advance(1);
        cursor.fetch(provider)
    }

    /// Continue at `dest`, returning to the record after the current one
    pub fn call(&mut self, dest: Cursor) {
        if let Some(cursor) = self.current.take() {
            self.entries.push(StackEntry::Call {
                return_to: cursor.advanced(1),
            });
        }
        self.current = Some(dest);
    }

    /// Continue at `dest` without a way back to the current list
    pub fn branch(&mut self, dest: Cursor) {
        if self.current.is_some() {
            self.entries.push(StackEntry::BranchMarker);
        }
        self.current = Some(dest);
    }

    /// Return from the innermost call
    ///
    /// Returns `false` when no call remains, which ends the run.
    pub fn ret(&mut self) -> bool {
        while let Some(entry) = self.entries.pop() {
            if let StackEntry::Call { return_to } = entry {
                self.current = Some(return_to);
                return true;
            }
        }
        self.current = None;
        false
    }

    /// Positions of every open call site, outermost first, then the current command
    pub fn call_path(&self) -> Vec<CommandPos> {
        let mut path: Vec<CommandPos> = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                StackEntry::Call { return_to } => {
                    let mut pos = return_to.position();
                    pos.index = pos.index.saturating_sub(1);
                    Some(pos)
                }
                StackEntry::BranchMarker => None,
            })
            .collect();
        if let Some(cursor) = &self.current {
            path.push(cursor.position());
        }
        path
    }
}
