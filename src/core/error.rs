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

/// Interpreter error types
use thiserror::Error;

/// Result type for interpreter operations
pub type Result<T> = std::result::Result<T, GfxError>;

/// Main error type for the display-list interpreter
///
/// Most in-stream problems never leave the run loop as an `Err`: they are
/// formatted into a log record and the interpreter keeps going. The variants
/// still exist so that those log lines, the decoder and the loaders share
/// one vocabulary.
#[derive(Error, Debug)]
pub enum GfxError {
    #[error("Unknown opcode 0x{opcode:02X} for microcode {ucode}")]
    UnknownOpcode { opcode: u8, ucode: &'static str },

    #[error("Unsupported texture format {format} with size {size}")]
    UnsupportedTexture { format: u8, size: u8 },

    #[error("Texture data too short: need {needed} bytes, got {got}")]
    TextureDataTooShort { needed: usize, got: usize },

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Malformed {what} at 0x{addr:08X}")]
    MalformedRecord { addr: u32, what: &'static str },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}
