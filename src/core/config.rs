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

//! Interpreter configuration
//!
//! Settings are plain data with defaults for every field, so a TOML file
//! only needs to name what it overrides:
//!
//! ```toml
//! ucode = "f3d"
//! msaa_level = 4
//! texture_cache_capacity = 256
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{GfxError, Result};
use super::gbi::Ucode;

/// Default number of decoded textures kept resident
pub const DEFAULT_TEXTURE_CACHE_CAPACITY: usize = 500;

/// Default triangle batch capacity
pub const DEFAULT_MAX_BUFFERED_TRIANGLES: usize = 256;

/// Interpreter settings
///
/// # Examples
///
/// ```
/// use ultragfx::core::config::InterpreterConfig;
/// use ultragfx::core::gbi::Ucode;
///
/// let config = InterpreterConfig::from_toml_str("ucode = \"f3dex\"\nmsaa_level = 2").unwrap();
/// assert_eq!(config.ucode, Ucode::F3dex);
/// assert_eq!(config.msaa_level, 2);
/// assert_eq!(config.texture_cache_capacity, 500);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Microcode generation active at the start of every frame
    pub ucode: Ucode,

    /// Width of the console's native output
    pub native_width: u32,

    /// Height of the console's native output
    pub native_height: u32,

    /// Maximum number of decoded textures kept by the texture cache
    pub texture_cache_capacity: usize,

    /// Triangles accumulated before a draw call is forced
    pub max_buffered_triangles: usize,

    /// Sample count of the primary target (1 disables multisampling)
    pub msaa_level: u32,

    /// Render the game into an offscreen target instead of the swap target
    pub render_to_framebuffer: bool,

    /// Matrices in memory are 16 big-endian floats instead of fixed point
    pub gbi_floats: bool,

    /// Linear attenuation coefficient for positional lights
    pub point_light_linear: f32,

    /// Quadratic attenuation coefficient for positional lights
    pub point_light_quadratic: f32,

    /// Distance used to derive the LOD fraction combiner input
    pub lod_distance: f32,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            ucode: Ucode::F3dex2,
            native_width: 320,
            native_height: 240,
            texture_cache_capacity: DEFAULT_TEXTURE_CACHE_CAPACITY,
            max_buffered_triangles: DEFAULT_MAX_BUFFERED_TRIANGLES,
            msaa_level: 1,
            render_to_framebuffer: false,
            gbi_floats: false,
            point_light_linear: 0.0,
            point_light_quadratic: 0.0004,
            lod_distance: 3000.0,
        }
    }
}

impl InterpreterConfig {
    /// Parse and validate a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check that every size and count is usable
    pub fn validate(&self) -> Result<()> {
        if self.texture_cache_capacity == 0 {
            return Err(GfxError::Config(
                "texture_cache_capacity must be at least 1".to_string(),
            ));
        }
        if self.max_buffered_triangles == 0 {
            return Err(GfxError::Config(
                "max_buffered_triangles must be at least 1".to_string(),
            ));
        }
        if self.native_width == 0 || self.native_height == 0 {
            return Err(GfxError::Config(format!(
                "native resolution {}x{} is empty",
                self.native_width, self.native_height
            )));
        }
        if self.msaa_level == 0 {
            return Err(GfxError::Config("msaa_level must be at least 1".to_string()));
        }
        if self.lod_distance <= 0.0 {
            return Err(GfxError::Config("lod_distance must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = InterpreterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.texture_cache_capacity, 500);
        assert_eq!(config.max_buffered_triangles, 256);
        assert_eq!(config.ucode, Ucode::F3dex2);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = InterpreterConfig::from_toml_str("gbi_floats = true").unwrap();
        assert!(config.gbi_floats);
        assert_eq!(config.native_width, 320);
        assert_eq!(config.native_height, 240);
    }

    #[test]
    fn test_zero_cache_capacity_rejected() {
        let err = InterpreterConfig::from_toml_str("texture_cache_capacity = 0").unwrap_err();
        assert!(matches!(err, GfxError::Config(_)));
    }

    #[test]
    fn test_zero_msaa_rejected() {
        assert!(InterpreterConfig::from_toml_str("msaa_level = 0").is_err());
    }

    #[test]
    fn test_unknown_ucode_is_parse_error() {
        let err = InterpreterConfig::from_toml_str("ucode = \"s2dex\"").unwrap_err();
        assert!(matches!(err, GfxError::Toml(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ucode = \"f3d\"").unwrap();
        writeln!(file, "native_width = 640").unwrap();
        writeln!(file, "native_height = 480").unwrap();

        let config = InterpreterConfig::load(file.path()).unwrap();
        assert_eq!(config.ucode, Ucode::F3d);
        assert_eq!(config.native_width, 640);
        assert_eq!(config.native_height, 480);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = InterpreterConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, GfxError::Io(_)));
    }
}
