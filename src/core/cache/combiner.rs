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

//! Color combiner canonicalization and program cache
//!
//! The combiner computes `(A - B) * C + D` per cycle, once for color and
//! once for alpha. Its register is held in a packed form:
//!
//! ```text
//! bits  0..16  cycle 0 color   a:4 b:4 c:5 d:3
//! bits 16..28  cycle 0 alpha   a:3 b:3 c:3 d:3
//! bits 28..44  cycle 1 color
//! bits 44..56  cycle 1 alpha
//! ```
//!
//! Canonicalization turns that into a 64-bit shader id of 4-bit codes,
//! `code << (cycle * 32 + channel * 16 + operand * 4)`:
//!
//! | code | meaning |
//! |------|---------|
//! | 0    | zero |
//! | 1-7  | per-vertex input slot |
//! | 8/9  | texel 0 color / alpha |
//! | 10/11| texel 1 color / alpha |
//! | 12   | one |
//! | 13/14| combined color / alpha |
//! | 15   | noise |
//!
//! Constant colors (primitive, shade, environment and friends) become input
//! slots so that formulas differing only in which constant they read
//! share one program.

use std::collections::HashMap;

use bitflags::bitflags;

use crate::core::backend::{RenderingBackend, ShaderDesc, ShaderHandle};
use crate::core::gbi::{
    G_ACMUX_0, G_ACMUX_1, G_ACMUX_COMBINED, G_ACMUX_ENVIRONMENT, G_ACMUX_PRIMITIVE,
    G_ACMUX_PRIM_LOD_FRAC, G_ACMUX_SHADE, G_ACMUX_TEXEL0, G_ACMUX_TEXEL1, G_CCMUX_COMBINED,
    G_CCMUX_COMBINED_ALPHA, G_CCMUX_ENVIRONMENT, G_CCMUX_ENV_ALPHA, G_CCMUX_K5,
    G_CCMUX_LOD_FRACTION, G_CCMUX_PRIMITIVE, G_CCMUX_PRIMITIVE_ALPHA, G_CCMUX_PRIM_LOD_FRAC,
    G_CCMUX_SHADE, G_CCMUX_SHADE_ALPHA, G_CCMUX_TEXEL0, G_CCMUX_TEXEL0_ALPHA, G_CCMUX_TEXEL1,
    G_CCMUX_TEXEL1_ALPHA,
};

/// Per-vertex input slots available to one channel
pub const MAX_INPUTS: usize = 7;

/// Program variants per combiner, one per clamp-bit combination
pub const CLAMP_VARIANTS: usize = 16;

/// Canonical operand codes
pub const SHADER_0: u64 = 0;
pub const SHADER_INPUT_1: u64 = 1;
pub const SHADER_TEXEL0: u64 = 8;
pub const SHADER_TEXEL0A: u64 = 9;
pub const SHADER_TEXEL1: u64 = 10;
pub const SHADER_TEXEL1A: u64 = 11;
pub const SHADER_1: u64 = 12;
pub const SHADER_COMBINED: u64 = 13;
pub const SHADER_COMBINEDA: u64 = 14;
pub const SHADER_NOISE: u64 = 15;

bitflags! {
    /// Render options folded into the program's option id
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShaderOpts: u32 {
        const USE_ALPHA = 1 << 0;
        const USE_FOG = 1 << 1;
        const TEXTURE_EDGE = 1 << 2;
        const USE_NOISE = 1 << 3;
        const TWO_CYCLE = 1 << 4;
        const ALPHA_THRESHOLD = 1 << 5;
        const GRAYSCALE = 1 << 6;
        const INVISIBLE = 1 << 7;
        const CLAMP_S0 = 1 << 8;
        const CLAMP_T0 = 1 << 9;
        const CLAMP_S1 = 1 << 10;
        const CLAMP_T1 = 1 << 11;
        const TEXTURE_MASK0 = 1 << 12;
        const TEXTURE_MASK1 = 1 << 13;
        const TEXTURE_BLEND0 = 1 << 14;
        const TEXTURE_BLEND1 = 1 << 15;
        const CUSTOM_SHADER = 1 << 16;
        /// Custom shader index occupies bits 24..32
        const CUSTOM_INDEX = 0xFF << 24;
    }
}

impl ShaderOpts {
    pub const CLAMP_MASK: ShaderOpts = ShaderOpts::CLAMP_S0
        .union(ShaderOpts::CLAMP_T0)
        .union(ShaderOpts::CLAMP_S1)
        .union(ShaderOpts::CLAMP_T1);

    pub fn with_custom_shader(self, index: u8) -> Self {
        self | ShaderOpts::CUSTOM_SHADER | ShaderOpts::from_bits_retain((index as u32) << 24)
    }

    /// Index into a combiner's program variants
    pub fn clamp_variant(self) -> usize {
        ((self.bits() >> 8) & 0x0F) as usize
    }
}

/// Pack a color stage
pub const fn color_comb(a: u32, b: u32, c: u32, d: u32) -> u32 {
    (a & 0x0F) | ((b & 0x0F) << 4) | ((c & 0x1F) << 8) | ((d & 0x07) << 13)
}

/// Pack an alpha stage
pub const fn alpha_comb(a: u32, b: u32, c: u32, d: u32) -> u32 {
    (a & 0x07) | ((b & 0x07) << 3) | ((c & 0x07) << 6) | ((d & 0x07) << 9)
}

/// Pack both cycles into the combine register
///
/// # Examples
///
/// ```
/// use ultragfx::core::cache::{alpha_comb, color_comb, combine_mode};
/// use ultragfx::core::gbi::{G_ACMUX_0, G_ACMUX_SHADE, G_CCMUX_0, G_CCMUX_SHADE};
///
/// let rgb = color_comb(G_CCMUX_0, G_CCMUX_0, G_CCMUX_0, G_CCMUX_SHADE);
/// let alpha = alpha_comb(G_ACMUX_0, G_ACMUX_0, G_ACMUX_0, G_ACMUX_SHADE);
/// let mode = combine_mode(rgb, alpha, rgb, alpha);
/// assert_eq!(mode & 0xFFFF, rgb as u64);
/// ```
pub const fn combine_mode(rgb0: u32, alpha0: u32, rgb1: u32, alpha1: u32) -> u64 {
    (rgb0 as u64) | ((alpha0 as u64) << 16) | ((rgb1 as u64) << 28) | ((alpha1 as u64) << 44)
}

/// Unpack the two words of a set-combine command
pub fn combine_from_words(w0: u32, w1: u32) -> u64 {
    let rgb0 = color_comb(
        (w0 >> 20) & 0x0F,
        (w1 >> 28) & 0x0F,
        (w0 >> 15) & 0x1F,
        (w1 >> 15) & 0x07,
    );
    let alpha0 = alpha_comb(
        (w0 >> 12) & 0x07,
        (w1 >> 12) & 0x07,
        (w0 >> 9) & 0x07,
        (w1 >> 9) & 0x07,
    );
    let rgb1 = color_comb((w0 >> 5) & 0x0F, (w1 >> 24) & 0x0F, w0 & 0x1F, w1 & 0x07);
    let alpha1 = alpha_comb(
        (w1 >> 21) & 0x07,
        (w1 >> 6) & 0x07,
        (w1 >> 18) & 0x07,
        (w1 >> 3) & 0x07,
    );
    combine_mode(rgb0, alpha0, rgb1, alpha1)
}

/// What a combiner operand reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CombinerInput {
    #[default]
    Zero,
    One,
    Combined,
    CombinedAlpha,
    Texel0,
    Texel0Alpha,
    Texel1,
    Texel1Alpha,
    Noise,
    Prim,
    PrimAlpha,
    Shade,
    ShadeAlpha,
    Env,
    EnvAlpha,
    LodFraction,
    PrimLodFraction,
    /// Constants of the YUV conversion and chroma key units
    K4,
    K5,
    Center,
    Scale,
}

impl CombinerInput {
    /// Decode a color operand; `operand` is 0..4 for A, B, C, D
    pub fn from_color(operand: usize, raw: u32) -> Self {
        use CombinerInput::*;
        match raw {
            G_CCMUX_COMBINED => return Combined,
            G_CCMUX_TEXEL0 => return Texel0,
            G_CCMUX_TEXEL1 => return Texel1,
            G_CCMUX_PRIMITIVE => return Prim,
            G_CCMUX_SHADE => return Shade,
            G_CCMUX_ENVIRONMENT => return Env,
            _ => {}
        }
        match (operand, raw) {
            (0, 6) => One,
            (0, 7) => Noise,
            (1, 6) => Center,
            (1, 7) => K4,
            (2, 6) => Scale,
            (2, G_CCMUX_COMBINED_ALPHA) => CombinedAlpha,
            (2, G_CCMUX_TEXEL0_ALPHA) => Texel0Alpha,
            (2, G_CCMUX_TEXEL1_ALPHA) => Texel1Alpha,
            (2, G_CCMUX_PRIMITIVE_ALPHA) => PrimAlpha,
            (2, G_CCMUX_SHADE_ALPHA) => ShadeAlpha,
            (2, G_CCMUX_ENV_ALPHA) => EnvAlpha,
            (2, G_CCMUX_LOD_FRACTION) => LodFraction,
            (2, G_CCMUX_PRIM_LOD_FRAC) => PrimLodFraction,
            (2, G_CCMUX_K5) => K5,
            (3, 6) => One,
            _ => Zero,
        }
    }

    /// Decode an alpha operand
    pub fn from_alpha(operand: usize, raw: u32) -> Self {
        use CombinerInput::*;
        match (operand, raw) {
            (2, G_ACMUX_COMBINED) => LodFraction,
            (2, G_ACMUX_PRIM_LOD_FRAC) => PrimLodFraction,
            (_, G_ACMUX_COMBINED) => Combined,
            (_, G_ACMUX_TEXEL0) => Texel0,
            (_, G_ACMUX_TEXEL1) => Texel1,
            (_, G_ACMUX_PRIMITIVE) => Prim,
            (_, G_ACMUX_SHADE) => Shade,
            (_, G_ACMUX_ENVIRONMENT) => Env,
            (_, G_ACMUX_1) => One,
            (_, G_ACMUX_0) => Zero,
            _ => Zero,
        }
    }

    /// Operand that needs a per-vertex input slot
    pub fn is_input(self) -> bool {
        !matches!(
            self,
            CombinerInput::Zero
                | CombinerInput::One
                | CombinerInput::Combined
                | CombinerInput::CombinedAlpha
                | CombinerInput::Texel0
                | CombinerInput::Texel0Alpha
                | CombinerInput::Texel1
                | CombinerInput::Texel1Alpha
                | CombinerInput::Noise
        )
    }

    fn fixed_code(self) -> u64 {
        match self {
            CombinerInput::One => SHADER_1,
            CombinerInput::Combined => SHADER_COMBINED,
            CombinerInput::CombinedAlpha => SHADER_COMBINEDA,
            CombinerInput::Texel0 => SHADER_TEXEL0,
            CombinerInput::Texel0Alpha => SHADER_TEXEL0A,
            CombinerInput::Texel1 => SHADER_TEXEL1,
            CombinerInput::Texel1Alpha => SHADER_TEXEL1A,
            CombinerInput::Noise => SHADER_NOISE,
            _ => SHADER_0,
        }
    }

    fn reads_combined(self) -> bool {
        matches!(self, CombinerInput::Combined)
    }
}

/// Canonical form of one combine register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CombinerMapping {
    pub shader_id: u64,
    /// Source of each input slot, per channel (0 color, 1 alpha)
    pub inputs: [[CombinerInput; MAX_INPUTS]; 2],
    pub num_inputs: u8,
    pub used_textures: [bool; 2],
}

impl CombinerMapping {
    /// Canonicalize a packed combine register
    ///
    /// # Examples
    ///
    /// ```
    /// use ultragfx::core::cache::{alpha_comb, color_comb, combine_mode, CombinerMapping};
    /// use ultragfx::core::gbi::{G_ACMUX_0, G_ACMUX_SHADE, G_CCMUX_0, G_CCMUX_SHADE};
    ///
    /// let rgb = color_comb(G_CCMUX_0, G_CCMUX_0, G_CCMUX_0, G_CCMUX_SHADE);
    /// let alpha = alpha_comb(G_ACMUX_0, G_ACMUX_0, G_ACMUX_0, G_ACMUX_SHADE);
    /// let mapping = CombinerMapping::from_combine_mode(combine_mode(rgb, alpha, 0, 0), false);
    /// assert_eq!(mapping.shader_id, 0x1000_1000);
    /// assert_eq!(mapping.num_inputs, 1);
    /// ```
    pub fn from_combine_mode(combine_mode: u64, two_cycle: bool) -> Self {
        let cycles = if two_cycle { 2 } else { 1 };
        // [cycle][channel][operand]
        let mut ops = [[[CombinerInput::Zero; 4]; 2]; 2];

        for (cycle, stages) in ops.iter_mut().enumerate().take(cycles) {
            let rgb = (combine_mode >> (cycle * 28)) as u32 & 0xFFFF;
            let alpha = (combine_mode >> (cycle * 28 + 16)) as u32 & 0x0FFF;
            let rgb_fields = [
                rgb & 0x0F,
                (rgb >> 4) & 0x0F,
                (rgb >> 8) & 0x1F,
                (rgb >> 13) & 0x07,
            ];
            let alpha_fields = [
                alpha & 0x07,
                (alpha >> 3) & 0x07,
                (alpha >> 6) & 0x07,
                (alpha >> 9) & 0x07,
            ];

            for k in 0..4 {
                stages[0][k] = CombinerInput::from_color(k, rgb_fields[k]);
                stages[1][k] = CombinerInput::from_alpha(k, alpha_fields[k]);
            }
            for stage in stages.iter_mut() {
                if cycle == 0 {
                    // Nothing has been combined before the first cycle
                    for op in stage.iter_mut() {
                        if matches!(op, CombinerInput::Combined | CombinerInput::CombinedAlpha) {
                            *op = CombinerInput::Zero;
                        }
                    }
                }
                if stage[0] == stage[1] || stage[2] == CombinerInput::Zero {
                    stage[0] = CombinerInput::Zero;
                    stage[1] = CombinerInput::Zero;
                    stage[2] = CombinerInput::Zero;
                }
            }
        }

        if two_cycle {
            let [second_rgb, second_alpha] = ops[1];
            let rgb_live = second_rgb.iter().any(|op| op.reads_combined());
            let alpha_live = second_rgb.contains(&CombinerInput::CombinedAlpha)
                || second_alpha.iter().any(|op| op.reads_combined());
            if !rgb_live {
                ops[0][0] = [CombinerInput::Zero; 4];
            }
            if !alpha_live {
                ops[0][1] = [CombinerInput::Zero; 4];
            }
        }

        let mut mapping = CombinerMapping::default();
        let mut counts = [0usize; 2];
        for (cycle, stages) in ops.iter().enumerate().take(cycles) {
            for (channel, stage) in stages.iter().enumerate() {
                for (k, &op) in stage.iter().enumerate() {
                    let code = if op.is_input() {
                        mapping.slot_for(channel, op, &mut counts[channel])
                    } else {
                        op.fixed_code()
                    };
                    match op {
                        CombinerInput::Texel0 | CombinerInput::Texel0Alpha => {
                            mapping.used_textures[0] = true
                        }
                        CombinerInput::Texel1 | CombinerInput::Texel1Alpha => {
                            mapping.used_textures[1] = true
                        }
                        _ => {}
                    }
                    mapping.shader_id |= code << (cycle * 32 + channel * 16 + k * 4);
                }
            }
        }
        mapping.num_inputs = counts[0].max(counts[1]) as u8;
        mapping
    }

    fn slot_for(&mut self, channel: usize, op: CombinerInput, count: &mut usize) -> u64 {
        let inputs = &mut self.inputs[channel];
        if let Some(slot) = inputs[..*count].iter().position(|&input| input == op) {
            return SHADER_INPUT_1 + slot as u64;
        }
        if *count == MAX_INPUTS {
            log::warn!("Combiner needs more than {} inputs, reading zero", MAX_INPUTS);
            return SHADER_0;
        }
        inputs[*count] = op;
        *count += 1;
        SHADER_INPUT_1 + (*count - 1) as u64
    }
}

/// Program variants for one (shader id, options) pair
#[derive(Debug, Clone)]
pub struct ColorCombiner {
    pub shader_id: u64,
    /// Option id with the clamp bits cleared
    pub option_id: u32,
    pub programs: [Option<ShaderHandle>; CLAMP_VARIANTS],
}

/// Lazily populated combiner program cache
#[derive(Debug, Default)]
pub struct CombinerCache {
    mappings: HashMap<(u64, bool), CombinerMapping>,
    combiners: HashMap<(u64, u32), ColorCombiner>,
    programs_created: usize,
}

impl CombinerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical form of a raw combine register, memoized
    pub fn mapping(&mut self, combine_mode: u64, two_cycle: bool) -> CombinerMapping {
        *self
            .mappings
            .entry((combine_mode, two_cycle))
            .or_insert_with(|| CombinerMapping::from_combine_mode(combine_mode, two_cycle))
    }

    /// Program for a mapping under the given options
    ///
    /// Asks the backend for an existing program first and only compiles a
    /// new one when it has none.
    pub fn program<B>(
        &mut self,
        backend: &mut B,
        mapping: &CombinerMapping,
        options: ShaderOpts,
    ) -> ShaderHandle
    where
        B: RenderingBackend + ?Sized,
    {
        let base = options.difference(ShaderOpts::CLAMP_MASK).bits();
        let combiner = self
            .combiners
            .entry((mapping.shader_id, base))
            .or_insert_with(|| ColorCombiner {
                shader_id: mapping.shader_id,
                option_id: base,
                programs: [None; CLAMP_VARIANTS],
            });

        let variant = options.clamp_variant();
        if let Some(program) = combiner.programs[variant] {
            return program;
        }

        let option_id = options.bits();
        let program = match backend.lookup_shader(mapping.shader_id, option_id) {
            Some(program) => program,
            None => {
                log::debug!(
                    "Compiling combiner {:016X} options {:08X}",
                    mapping.shader_id,
                    option_id
                );
                self.programs_created += 1;
                backend.create_shader(&ShaderDesc {
                    shader_id: mapping.shader_id,
                    option_id,
                    num_inputs: mapping.num_inputs,
                    used_textures: mapping.used_textures,
                })
            }
        };
        combiner.programs[variant] = Some(program);
        program
    }

    pub fn len(&self) -> usize {
        self.combiners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combiners.is_empty()
    }

    /// Programs this cache asked the backend to compile
    pub fn programs_created(&self) -> usize {
        self.programs_created
    }

    pub fn clear(&mut self) {
        self.mappings.clear();
        self.combiners.clear();
    }
}
