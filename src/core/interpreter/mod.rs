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

//! Display-list interpreter
//!
//! [`Interpreter`] walks one display list per frame and turns it into
//! [`RenderingBackend`] calls. It owns every piece of emulated state:
//! - the execution stack (call / branch / return)
//! - RSP matrices, lights and the vertex buffer
//! - RDP tiles, color registers and render modes
//! - the texture and combiner caches
//! - the triangle batch and the mirror of bound backend state
//! - render targets
//!
//! Memory and resources come from a [`ResourceProvider`] passed to each run,
//! and a [`Debugger`] may pause the walk before any command.
//!
//! # Dispatch
//!
//! Each record's opcode byte is resolved by [`decode_opcode`] against the
//! extension, RDP and active-microcode tables. Handlers return [`Flow`]:
//! `Continue` lets the loop step to the next record, `Jumped` means the
//! handler already moved the cursor (call, branch, return, or a command
//! that consumed following records).
//!
//! Nothing in the stream can abort a frame. Unknown opcodes, missing
//! resources and undecodable textures are logged and skipped.
//!
//! # Frame lifecycle
//!
//! ```text
//! run()      reset RSP, clear depth cache, start backend frame,
//!            bind + clear primary target, walk the list
//! pause      flush, drop any framebuffer redirection, return Paused
//! resume()   restore the redirection, continue after the paused command
//! end        flush, resolve MSAA, end backend frame
//! ```

mod draw;
mod ext_ops;
mod rdp_ops;
mod rsp_ops;
mod texture;

use std::collections::HashMap;
use std::sync::Arc;

use super::backend::{FrameView, FramebufferId, RenderingBackend};
use super::batch::{BoundState, DepthQueries, TriangleBatch};
use super::cache::{CombinerCache, TextureCache};
use super::config::InterpreterConfig;
use super::debugger::Debugger;
use super::dlist::{Cursor, ExecutionStack};
use super::error::GfxError;
use super::framebuffer::FramebufferManager;
use super::gbi::{decode_opcode, Command, Gfx, Ucode};
use super::rdp::RdpState;
use super::resource::{DisplayListResource, ResourceProvider};
use super::rsp::{Attenuation, RspState};

/// What the run loop does after a handler returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Step to the next record
    Continue,
    /// The handler already moved the cursor
    Jumped,
}

/// Interpreter lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpreterState {
    #[default]
    Idle,
    Running,
    /// Stopped at a breakpoint; the frame is still open
    Paused,
}

/// How a call to [`Interpreter::run`] or [`Interpreter::resume`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The list ended and the frame was presented
    Finished,
    /// A breakpoint matched; call [`Interpreter::resume`] to continue
    Paused,
}

/// Counters for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub commands: u64,
    pub triangles: u64,
    pub culled: u64,
    pub rectangles: u64,
    pub draw_calls: u64,
    pub texture_hits: u64,
    pub texture_misses: u64,
}

/// Mask and blend overlays attached to a texture source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendedTexture {
    pub mask: u64,
    pub blend: u64,
}

/// Fast3D display-list interpreter
///
/// # Examples
///
/// ```
/// use ultragfx::core::backend::RecordingBackend;
/// use ultragfx::core::config::InterpreterConfig;
/// use ultragfx::core::debugger::NoDebugger;
/// use ultragfx::core::gbi::Gfx;
/// use ultragfx::core::interpreter::{Interpreter, RunOutcome};
/// use ultragfx::core::resource::ResourceStore;
///
/// let mut store = ResourceStore::new();
/// store.insert_display_list(0x1000, &[Gfx::new(0xDF00_0000, 0)]);
///
/// let mut gfx = Interpreter::new(RecordingBackend::new(), InterpreterConfig::default());
/// assert_eq!(gfx.run(&store, &NoDebugger, 0x1000), RunOutcome::Finished);
/// assert_eq!(gfx.stats().commands, 1);
/// ```
pub struct Interpreter<B: RenderingBackend> {
    backend: B,
    config: InterpreterConfig,
    ucode: Ucode,
    view: FrameView,

    rsp: RspState,
    rdp: RdpState,
    stack: ExecutionStack,

    textures: TextureCache,
    combiners: CombinerCache,
    batch: TriangleBatch,
    bound: BoundState,
    framebuffers: FramebufferManager,
    depth: DepthQueries,

    state: InterpreterState,
    /// Skip the breakpoint check once, for the command a pause stopped at
    resuming: bool,
    /// Redirection dropped by a pause, restored on resume
    paused_target: Option<FramebufferId>,

    stats: FrameStats,
    draw_calls_at_start: u64,

    /// Word latched by the first RDP-half command
    rdp_half_1: u32,

    grayscale: bool,
    grayscale_color: [u8; 4],
    custom_shader: Option<u8>,
    blended: HashMap<u32, BlendedTexture>,
    readbacks: HashMap<u32, Vec<u16>>,

    /// Vertex size of each used texture slot, in texels
    texture_sizes: [(u32, u32); 2],
    scratch: Vec<f32>,
}

impl<B: RenderingBackend> Interpreter<B> {
    /// Create an interpreter drawing through `backend`
    ///
    /// The output size starts at the native size; see
    /// [`Interpreter::set_frame_view`].
    pub fn new(backend: B, config: InterpreterConfig) -> Self {
        let view = FrameView::new(
            config.native_width,
            config.native_height,
            config.native_width,
            config.native_height,
        );
        let attenuation = Attenuation {
            linear: config.point_light_linear,
            quadratic: config.point_light_quadratic,
        };
        log::info!(
            "Interpreter on {} backend, {} microcode, {}x{} native",
            backend.name(),
            config.ucode,
            config.native_width,
            config.native_height
        );

        Self {
            backend,
            ucode: config.ucode,
            view,
            rsp: RspState::new(attenuation),
            rdp: RdpState::new(),
            stack: ExecutionStack::new(),
            textures: TextureCache::new(config.texture_cache_capacity),
            combiners: CombinerCache::new(),
            batch: TriangleBatch::new(config.max_buffered_triangles),
            bound: BoundState::new(),
            framebuffers: FramebufferManager::new(
                view,
                config.msaa_level,
                config.render_to_framebuffer,
            ),
            depth: DepthQueries::new(),
            state: InterpreterState::Idle,
            resuming: false,
            paused_target: None,
            stats: FrameStats::default(),
            draw_calls_at_start: 0,
            rdp_half_1: 0,
            grayscale: false,
            grayscale_color: [255, 255, 255, 255],
            custom_shader: None,
            blended: HashMap::new(),
            readbacks: HashMap::new(),
            texture_sizes: [(1, 1); 2],
            scratch: Vec::with_capacity(3 * 64),
            config,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Hand the backend back after destroying the cached textures
    pub fn into_backend(mut self) -> B {
        self.textures.release(&mut self.backend);
        self.backend
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn state(&self) -> InterpreterState {
        self.state
    }

    pub fn ucode(&self) -> Ucode {
        self.ucode
    }

    pub fn rsp(&self) -> &RspState {
        &self.rsp
    }

    pub fn rdp(&self) -> &RdpState {
        &self.rdp
    }

    pub fn texture_cache(&self) -> &TextureCache {
        &self.textures
    }

    pub fn combiner_cache(&self) -> &CombinerCache {
        &self.combiners
    }

    pub fn framebuffers(&self) -> &FramebufferManager {
        &self.framebuffers
    }

    /// Counters of the current (or last finished) frame
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Pixels saved by a framebuffer read-back command under `key`
    pub fn readback(&self, key: u32) -> Option<&[u16]> {
        self.readbacks.get(&key).map(Vec::as_slice)
    }

    /// Output size and chrome offset used from the next frame on
    pub fn set_frame_view(&mut self, view: FrameView) {
        self.view = view;
    }

    /// Switch the microcode table and drop every cached texture
    pub fn set_ucode(&mut self, ucode: Ucode) {
        if ucode != self.ucode {
            log::debug!("Microcode {} -> {}", self.ucode, ucode);
        }
        self.ucode = ucode;
        self.textures.clear();
    }

    /// Create an auxiliary render target of native size `width` x `height`
    pub fn create_framebuffer(&mut self, width: u32, height: u32, resize: bool) -> FramebufferId {
        self.framebuffers
            .create(&mut self.backend, width, height, resize)
    }

    /// Queue a depth read at window coordinate (x, y)
    pub fn request_pixel_depth(&mut self, x: f32, y: f32) {
        self.depth.request(x, y);
    }

    /// Depth at window coordinate (x, y) of the current target
    ///
    /// Pending requests are read back together with this one.
    pub fn pixel_depth(&mut self, x: f32, y: f32) -> f32 {
        self.batch.flush(&mut self.backend);
        let fb = self
            .framebuffers
            .active()
            .unwrap_or_else(|| self.framebuffers.primary_target());
        self.depth.depth_at(&mut self.backend, fb, x, y)
    }

    // =========================================================================
    // Run loop
    // =========================================================================

    /// Render one frame from the display list at memory address `root`
    pub fn run(
        &mut self,
        provider: &dyn ResourceProvider,
        debugger: &dyn Debugger,
        root: u32,
    ) -> RunOutcome {
        self.begin_frame();
        self.stack.start(Cursor::memory(root));
        self.execute(provider, debugger)
    }

    /// Render one frame from a resolved display-list resource
    pub fn run_list(
        &mut self,
        provider: &dyn ResourceProvider,
        debugger: &dyn Debugger,
        list: Arc<DisplayListResource>,
    ) -> RunOutcome {
        self.begin_frame();
        self.stack.start(Cursor::resource(list));
        self.execute(provider, debugger)
    }

    /// Continue a paused frame from the command it stopped at
    pub fn resume(
        &mut self,
        provider: &dyn ResourceProvider,
        debugger: &dyn Debugger,
    ) -> RunOutcome {
        if self.state != InterpreterState::Paused {
            log::warn!("Resume requested while {:?}", self.state);
            return RunOutcome::Finished;
        }
        if let Some(fb) = self.paused_target.take() {
            self.framebuffers.set_target(&mut self.backend, fb);
            self.bound.invalidate_rects();
            self.rdp.viewport_or_scissor_changed = true;
        }
        self.resuming = true;
        self.execute(provider, debugger)
    }

    fn begin_frame(&mut self) {
        if self.state == InterpreterState::Paused {
            log::warn!("Abandoning paused frame");
            self.paused_target = None;
            self.end_frame();
        }

        self.stats = FrameStats::default();
        self.draw_calls_at_start = self.batch.draw_calls();
        self.ucode = self.config.ucode;
        self.rsp.reset();
        self.depth.clear();
        self.bound.reset();
        self.rdp.viewport_or_scissor_changed = true;
        self.rdp.textures_changed = [true; 2];

        self.backend.start_frame(&self.view);
        self.framebuffers.begin_frame(&mut self.backend, self.view);
        let target = self.framebuffers.primary_target();
        self.backend.start_draw_to_framebuffer(target);
        self.backend.clear_framebuffer();
    }

    fn end_frame(&mut self) {
        self.batch.flush(&mut self.backend);
        assert!(
            !self.framebuffers.is_redirected(),
            "frame ended while drawing into {:?}",
            self.framebuffers.active()
        );
        self.framebuffers.resolve_msaa(&mut self.backend);
        self.backend.end_frame();
        self.stats.draw_calls = self.batch.draw_calls() - self.draw_calls_at_start;
        self.state = InterpreterState::Idle;
        log::debug!("Frame done: {:?}", self.stats);
    }

    fn pause(&mut self) {
        self.batch.flush(&mut self.backend);
        if let Some(fb) = self.framebuffers.active() {
            self.framebuffers.reset_target(&mut self.backend);
            self.paused_target = Some(fb);
        }
        self.state = InterpreterState::Paused;
        log::info!("Paused at {:?}", self.stack.current().map(Cursor::position));
    }

    fn execute(&mut self, provider: &dyn ResourceProvider, debugger: &dyn Debugger) -> RunOutcome {
        self.state = InterpreterState::Running;
        loop {
            let Some(cursor) = self.stack.current() else {
                self.end_frame();
                return RunOutcome::Finished;
            };

            let resuming = std::mem::take(&mut self.resuming);
            if !resuming
                && debugger.is_debugging()
                && debugger.has_breakpoint(&self.stack.call_path())
            {
                self.pause();
                return RunOutcome::Paused;
            }

            let Some(cmd) = cursor.fetch(provider) else {
                log::warn!(
                    "Display list ran off its end at {:?}",
                    cursor.position()
                );
                self.stack.ret();
                continue;
            };

            self.stats.commands += 1;
            if self.step(provider, cmd) == Flow::Continue {
                self.stack.advance();
            }
        }
    }

    /// Execute one record
    pub(in crate::core::interpreter) fn step(
        &mut self,
        provider: &dyn ResourceProvider,
        cmd: Gfx,
    ) -> Flow {
        let opcode = cmd.opcode_byte();
        log::trace!("{:08X} {:08X}", cmd.w0, cmd.w1);
        match decode_opcode(opcode, self.ucode) {
            Some(Command::Ext(op)) => self.ext_op(provider, op, cmd),
            Some(Command::Rdp(op)) => self.rdp_op(provider, op, cmd),
            Some(Command::Rsp(op)) => self.rsp_op(provider, op, cmd),
            None => {
                log::error!(
                    "{}",
                    GfxError::UnknownOpcode {
                        opcode,
                        ucode: self.ucode.name(),
                    }
                );
                Flow::Continue
            }
        }
    }

    /// Read the record after the current one, for multi-record commands
    pub(in crate::core::interpreter) fn next_record(
        &mut self,
        provider: &dyn ResourceProvider,
    ) -> Option<Gfx> {
        let record = self.stack.next_record(provider);
        if record.is_none() {
            log::warn!("Command operands run past the end of the list");
        }
        record
    }

    /// 64-bit hash carried by the record after the current one
    pub(in crate::core::interpreter) fn next_hash(
        &mut self,
        provider: &dyn ResourceProvider,
    ) -> Option<u64> {
        self.next_record(provider)
            .map(|gfx| ((gfx.w0 as u64) << 32) | gfx.w1 as u64)
    }
}

#[cfg(test)]
mod tests;
