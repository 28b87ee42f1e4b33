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

//! Headless display-list player
//!
//! Loads a JSON scene, replays its root display list for a number of
//! frames through the recording backend and reports per-frame counters.

use clap::{Parser, ValueEnum};
use log::{error, info};
use ultragfx::core::backend::FrameView;
use ultragfx::core::{
    BreakpointDebugger, InterpreterConfig, Interpreter, RecordingBackend, Result, RunOutcome,
    Scene, Ucode,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum UcodeArg {
    F3d,
    F3dex,
    F3dex2,
}

impl From<UcodeArg> for Ucode {
    fn from(arg: UcodeArg) -> Self {
        match arg {
            UcodeArg::F3d => Ucode::F3d,
            UcodeArg::F3dex => Ucode::F3dex,
            UcodeArg::F3dex2 => Ucode::F3dex2,
        }
    }
}

/// N64 display-list player
#[derive(Parser)]
#[command(name = "ultragfx")]
#[command(about = "Replay N64 display lists headlessly", long_about = None)]
struct Args {
    /// Path to a JSON scene file
    scene: String,

    /// Path to a TOML interpreter configuration
    #[arg(short = 'c', long)]
    config: Option<String>,

    /// Microcode to interpret the scene with (overrides the configuration)
    #[arg(short = 'u', long, value_enum)]
    ucode: Option<UcodeArg>,

    /// Number of frames to render
    #[arg(short = 'n', long, default_value = "1")]
    frames: usize,

    /// Output size as WIDTHxHEIGHT (defaults to the native size)
    #[arg(short = 's', long)]
    size: Option<String>,

    /// Pause before the first command of the root list, then resume
    #[arg(long)]
    break_at_start: bool,
}

fn parse_size(text: &str) -> Option<(u32, u32)> {
    let (w, h) = text.split_once(['x', 'X'])?;
    let size = (w.trim().parse().ok()?, h.trim().parse().ok()?);
    (size.0 > 0 && size.1 > 0).then_some(size)
}

fn main() -> Result<()> {
    // Optional .env with RUST_LOG and friends
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize logger with default level INFO
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("ultragfx v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            InterpreterConfig::load(path).inspect_err(|e| {
                error!("Failed to load configuration: {}", e);
            })?
        }
        None => InterpreterConfig::default(),
    };
    if let Some(ucode) = args.ucode {
        config.ucode = ucode.into();
    }

    info!("Loading scene from: {}", args.scene);
    let scene = Scene::load(&args.scene).inspect_err(|e| {
        error!("Failed to load scene: {}", e);
    })?;
    let root = scene.root;
    let store = scene.into_store();

    let native = (config.native_width, config.native_height);
    let mut gfx = Interpreter::new(RecordingBackend::new(), config);
    if let Some(text) = &args.size {
        match parse_size(text) {
            Some((width, height)) => {
                gfx.set_frame_view(FrameView::new(width, height, native.0, native.1));
            }
            None => error!("Ignoring malformed size {:?}", text),
        }
    }

    let mut debugger = BreakpointDebugger::new();
    if args.break_at_start {
        let pos = ultragfx::core::dlist::CommandPos {
            list: ultragfx::core::dlist::ListId::Memory(root),
            index: 0,
        };
        debugger.add_breakpoint(vec![pos]);
    }

    info!("Rendering {} frame(s) from 0x{:08X}", args.frames, root);
    for frame in 0..args.frames {
        let mut outcome = gfx.run(&store, &debugger, root);
        while outcome == RunOutcome::Paused {
            info!("Frame {}: paused at breakpoint, resuming", frame);
            outcome = gfx.resume(&store, &debugger);
        }

        let stats = gfx.stats();
        info!(
            "Frame {}: {} commands | {} triangles ({} culled) | {} rects | {} draw calls",
            frame,
            stats.commands,
            stats.triangles,
            stats.culled,
            stats.rectangles,
            stats.draw_calls
        );
        info!(
            "Frame {}: textures {} hit / {} miss",
            frame,
            stats.texture_hits,
            stats.texture_misses
        );
    }

    let backend = gfx.backend();
    info!(
        "Done: {} draw calls, {} texture uploads, {} shaders",
        backend.draw_calls(),
        backend.texture_uploads(),
        backend.shaders_created()
    );
    Ok(())
}
