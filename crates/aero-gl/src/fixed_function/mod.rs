//! Fixed-function emulation: the synthesizer contract and its default WGSL
//! implementation.
//!
//! Synthesis runs before every draw that lacks a user program for at least
//! one stage. Nothing is cached; the generator is a pure function of the
//! snapshot, so identical snapshots always produce identical programs.

pub mod shader_gen;

use crate::device::{ShaderCode, ShaderLanguage, ShaderStage};
use crate::error::Result;
use crate::objects::texture::{BaseFormat, TextureTarget};
use crate::state::fixed_function::FixedFunctionState;
use crate::state::matrix::MatrixStackGroup;
use crate::texture_unit::TextureUnit;

use shader_gen::{generate_fixed_function_shaders, FixedFunctionGlobals, FixedFunctionShaderDesc};

/// Upper bound on texture units the synthesized programs address.
pub const MAX_TEXTURE_STAGES: usize = 16;

/// Everything the synthesizer may read at draw time.
#[derive(Clone, Copy, Debug)]
pub struct FixedFunctionSnapshot<'a> {
    pub state: &'a FixedFunctionState,
    pub units: &'a [TextureUnit],
    /// Per unit: the active target and the base format of the texture bound
    /// to it, or `None` when texturing is off for the unit.
    pub active: &'a [Option<(TextureTarget, BaseFormat)>],
    pub matrices: &'a MatrixStackGroup,
    /// Number of texture coordinate vertex inputs.
    pub texcoord_inputs: u8,
}

/// Programs for the stages without a user program, plus the texture units
/// the fragment program samples.
#[derive(Clone, Debug, PartialEq)]
pub struct SynthesizedShaders {
    pub hash: u64,
    pub vertex: Option<ShaderCode>,
    pub fragment: Option<ShaderCode>,
    pub texture_units: Vec<(u32, TextureTarget)>,
}

pub trait ShaderSynthesizer {
    fn synthesize(&self, snapshot: &FixedFunctionSnapshot<'_>) -> Result<SynthesizedShaders>;
}

/// Generates WGSL with the state baked into the program text and the
/// numeric values in a shared uniform block.
#[derive(Clone, Copy, Debug, Default)]
pub struct WgslSynthesizer;

impl ShaderSynthesizer for WgslSynthesizer {
    fn synthesize(&self, snapshot: &FixedFunctionSnapshot<'_>) -> Result<SynthesizedShaders> {
        let desc = FixedFunctionShaderDesc::from_snapshot(snapshot);
        let globals = FixedFunctionGlobals::from_snapshot(snapshot);
        let generated = generate_fixed_function_shaders(&desc);
        let uniforms = bytemuck::bytes_of(&globals).to_vec();
        let programs = snapshot.state.programs;

        let vertex = (!programs.vertex).then(|| ShaderCode {
            stage: ShaderStage::Vertex,
            language: ShaderLanguage::Wgsl,
            source: generated.vertex_wgsl,
            entry_point: "vs_main".to_owned(),
            uniforms: uniforms.clone(),
        });
        let (fragment, texture_units) = if programs.fragment {
            (None, Vec::new())
        } else {
            (
                Some(ShaderCode {
                    stage: ShaderStage::Fragment,
                    language: ShaderLanguage::Wgsl,
                    source: generated.fragment_wgsl,
                    entry_point: "fs_main".to_owned(),
                    uniforms,
                }),
                generated.texture_units,
            )
        };
        Ok(SynthesizedShaders {
            hash: generated.hash,
            vertex,
            fragment,
            texture_units,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::fixed_function::ProgramFlags;

    #[test]
    fn only_stages_without_user_programs_are_synthesized() {
        let mut state = FixedFunctionState::new(8);
        let units = vec![TextureUnit::default(); 2];
        let active = vec![Some((TextureTarget::Texture2D, BaseFormat::Rgba)), None];
        let matrices = MatrixStackGroup::new(4, 2, 32);
        let snapshot = |state: &FixedFunctionState| {
            WgslSynthesizer
                .synthesize(&FixedFunctionSnapshot {
                    state,
                    units: &units,
                    active: &active,
                    matrices: &matrices,
                    texcoord_inputs: 2,
                })
                .unwrap()
        };

        let both = snapshot(&state);
        assert!(both.vertex.is_some() && both.fragment.is_some());
        assert_eq!(both.texture_units, vec![(0, TextureTarget::Texture2D)]);
        assert_eq!(
            both.vertex.as_ref().unwrap().uniforms.len(),
            std::mem::size_of::<FixedFunctionGlobals>()
        );

        state.programs = ProgramFlags {
            vertex: false,
            fragment: true,
        };
        let vertex_only = snapshot(&state);
        assert!(vertex_only.vertex.is_some());
        assert!(vertex_only.fragment.is_none());
        assert!(vertex_only.texture_units.is_empty());
    }
}
