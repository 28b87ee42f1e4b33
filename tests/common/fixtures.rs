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

//! Scene builders for common test scenarios

use ultragfx::core::gbi::{Gfx, Vtx};
use ultragfx::core::resource::{Scene, SceneRegion};
use ultragfx::core::{InterpreterConfig, Interpreter, RecordingBackend};

pub const ROOT: u32 = 0x8000_1000;
pub const VERTICES: u32 = 0x8000_3000;

/// Interpreter with the default configuration and a fresh recording backend
#[allow(dead_code)]
pub fn create_interpreter() -> Interpreter<RecordingBackend> {
    Interpreter::new(RecordingBackend::new(), InterpreterConfig::default())
}

/// Memory image of a vertex array
#[allow(dead_code)]
pub fn vertex_words(vertices: &[Vtx]) -> Vec<u32> {
    vertices
        .iter()
        .flat_map(|v| {
            [
                (v.ob[0] as u16 as u32) << 16 | v.ob[1] as u16 as u32,
                (v.ob[2] as u16 as u32) << 16 | v.flag as u32,
                (v.tc[0] as u16 as u32) << 16 | v.tc[1] as u16 as u32,
                u32::from_be_bytes(v.cn),
            ]
        })
        .collect()
}

/// Memory image of a display list
#[allow(dead_code)]
pub fn list_words(commands: &[Gfx]) -> Vec<u32> {
    commands.iter().flat_map(|cmd| [cmd.w0, cmd.w1]).collect()
}

/// A scene whose root list loads three colored vertices and draws them
#[allow(dead_code)]
pub fn triangle_scene() -> Scene {
    let vertex = |x, y, cn| Vtx {
        ob: [x, y, 0],
        flag: 0,
        tc: [0, 0],
        cn,
    };
    let vertices = [
        vertex(0, 0, [255, 0, 0, 255]),
        vertex(0, 1, [0, 255, 0, 255]),
        vertex(1, 0, [0, 0, 255, 255]),
    ];
    let list = [
        Gfx::with_opcode(0x01, (3 << 12) | (3 << 1), VERTICES),
        Gfx::with_opcode(0x05, (2 << 8) | 4, 0),
        Gfx::with_opcode(0xDF, 0, 0),
    ];

    Scene {
        root: ROOT,
        regions: vec![
            SceneRegion {
                address: ROOT,
                words: list_words(&list),
                bytes: Vec::new(),
            },
            SceneRegion {
                address: VERTICES,
                words: vertex_words(&vertices),
                bytes: Vec::new(),
            },
        ],
        ..Scene::default()
    }
}
