//! The replay context: one explicit handle owning every piece of legacy
//! state, with one method per supported entry point.
//!
//! Methods take raw enumerators exactly as they appear in decoded trace
//! records and translate them at the call boundary, so every unsupported
//! value is reported before any state or device resource is touched.

mod arrays;
mod attrib;
mod lighting;
mod objects;
mod raster;
mod texturing;
mod transform;

use tracing::debug;

use crate::config::ContextConfig;
use crate::device::Device;
use crate::draw::{DrawInputs, DrawOrchestrator, DrawRequest, DrawSource};
use crate::error::{GlError, Result};
use crate::fixed_function::{ShaderSynthesizer, WgslSynthesizer};
use crate::gl;
use crate::objects::buffer::BufferObjects;
use crate::objects::texture::{PassthroughConverter, PixelConverter, TextureObjects};
use crate::program::{AssemblyPassthrough, ProgramCompiler, ProgramManager};
use crate::slots::SlotPools;
use crate::state::attrib::AttribStack;
use crate::state::fixed_function::{FixedFunctionState, MAX_LIGHTS};
use crate::state::matrix::MatrixStackGroup;
use crate::state::render::RenderState;
use crate::state::translate::{self, MatrixMode};
use crate::texture_unit::{TargetMask, TextureUnit};
use crate::vertex::immediate::{CurrentValues, ImmediateBlock, DEFAULT_TEXCOORD};
use crate::vertex::{ArrayPointer, AttributeSlot, VertexArrays};

use attrib::SavedAttribs;

pub const VENDOR: &str = "aero";
pub const RENDERER: &str = "aero-gl fixed-function translator";
pub const VERSION: &str = "1.5 aero-gl";
pub const EXTENSIONS: &str = "GL_ARB_multitexture GL_ARB_texture_env_combine GL_ARB_texture_env_dot3 \
GL_ARB_texture_cube_map GL_ARB_texture_rectangle GL_ARB_vertex_buffer_object GL_ARB_vertex_program \
GL_ARB_fragment_program GL_EXT_texture_filter_anisotropic GL_EXT_texture_compression_s3tc \
GL_NV_texture_env_combine4 GL_ATI_texture_env_combine3";

/// Values written by `Clear`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearValues {
    pub color: [f32; 4],
    pub depth: f32,
    pub stencil: u32,
}

impl Default for ClearValues {
    fn default() -> Self {
        Self {
            color: [0.0; 4],
            depth: 1.0,
            stencil: 0,
        }
    }
}

/// Legacy context state bound to one device.
pub struct GlContext<D: Device> {
    config: ContextConfig,
    device: D,
    orchestrator: DrawOrchestrator,
    arrays: VertexArrays,
    current: CurrentValues,
    immediate: Option<ImmediateBlock>,
    fixed: FixedFunctionState,
    render: RenderState,
    clear_values: ClearValues,
    units: Vec<TextureUnit>,
    active_unit: u32,
    client_active_unit: u32,
    matrices: MatrixStackGroup,
    matrix_mode: MatrixMode,
    attrib_stack: AttribStack<SavedAttribs>,
    buffers: BufferObjects,
    textures: TextureObjects,
    programs: ProgramManager,
    converter: Box<dyn PixelConverter>,
    compiler: Box<dyn ProgramCompiler>,
    synthesizer: Box<dyn ShaderSynthesizer>,
    draws: u64,
}

impl<D: Device> std::fmt::Debug for GlContext<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlContext")
            .field("config", &self.config)
            .field("draws", &self.draws)
            .field("in_begin_end", &self.immediate.is_some())
            .field("active_unit", &self.active_unit)
            .field("matrix_mode", &self.matrix_mode)
            .finish_non_exhaustive()
    }
}

impl<D: Device> GlContext<D> {
    pub fn new(device: D, config: ContextConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            device,
            orchestrator: DrawOrchestrator::new(SlotPools::new(config.stream_slots, config.sampler_slots)),
            arrays: VertexArrays::new(config.client_texcoord_units as u8, config.generic_attributes as u8),
            current: CurrentValues::new(config.client_texcoord_units as usize),
            immediate: None,
            fixed: FixedFunctionState::new(config.lights as usize),
            render: RenderState::default(),
            clear_values: ClearValues::default(),
            units: vec![TextureUnit::default(); config.texture_units as usize],
            active_unit: 0,
            client_active_unit: 0,
            matrices: MatrixStackGroup::new(
                config.modelview_matrices as usize,
                config.texture_units as usize,
                config.matrix_stack_depth as usize,
            ),
            matrix_mode: MatrixMode::Modelview(0),
            attrib_stack: AttribStack::new(config.attrib_stack_depth as usize),
            buffers: BufferObjects::new(),
            textures: TextureObjects::new(),
            programs: ProgramManager::new(config.program_parameters),
            converter: Box::new(PassthroughConverter),
            compiler: Box::new(AssemblyPassthrough {
                texture_units: config.texture_units,
            }),
            synthesizer: Box::new(WgslSynthesizer),
            draws: 0,
            config,
        })
    }

    pub fn with_synthesizer(mut self, synthesizer: Box<dyn ShaderSynthesizer>) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn with_compiler(mut self, compiler: Box<dyn ProgramCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_converter(mut self, converter: Box<dyn PixelConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }

    pub fn slots(&self) -> &SlotPools {
        self.orchestrator.slots()
    }

    pub fn fixed_function(&self) -> &FixedFunctionState {
        &self.fixed
    }

    pub fn render_state(&self) -> &RenderState {
        &self.render
    }

    pub fn clear_values(&self) -> &ClearValues {
        &self.clear_values
    }

    pub fn texture_units(&self) -> &[TextureUnit] {
        &self.units
    }

    pub fn active_texture_unit(&self) -> u32 {
        self.active_unit
    }

    pub fn matrices(&self) -> &MatrixStackGroup {
        &self.matrices
    }

    pub fn current_matrix_mode(&self) -> MatrixMode {
        self.matrix_mode
    }

    pub fn current_values(&self) -> &CurrentValues {
        &self.current
    }

    pub fn vertex_arrays(&self) -> &VertexArrays {
        &self.arrays
    }

    pub fn textures(&self) -> &TextureObjects {
        &self.textures
    }

    pub fn buffers(&self) -> &BufferObjects {
        &self.buffers
    }

    pub fn programs(&self) -> &ProgramManager {
        &self.programs
    }

    /// Draws issued so far, immediate blocks included.
    pub fn draw_count(&self) -> u64 {
        self.draws
    }

    pub fn in_begin_end(&self) -> bool {
        self.immediate.is_some()
    }

    fn outside_begin_end(&self, call: &'static str) -> Result<()> {
        if self.immediate.is_some() {
            return Err(GlError::InsideBeginEnd { call });
        }
        Ok(())
    }

    fn active_unit_mut(&mut self) -> &mut TextureUnit {
        &mut self.units[self.active_unit as usize]
    }

    fn light_index(&self, call: &'static str, light: u32) -> Result<usize> {
        let index = light.wrapping_sub(gl::LIGHT0);
        if index as usize >= self.fixed.lights.len() {
            return Err(GlError::CapabilityOutOfRange {
                call,
                what: "light",
                index,
                limit: self.fixed.lights.len() as u32,
            });
        }
        Ok(index as usize)
    }

    pub fn get_string(&self, name: u32) -> Result<&'static str> {
        Ok(match name {
            gl::VENDOR => VENDOR,
            gl::RENDERER => RENDERER,
            gl::VERSION => VERSION,
            gl::EXTENSIONS => EXTENSIONS,
            other => return Err(GlError::unsupported("glGetString", "string name", other)),
        })
    }

    pub fn enable(&mut self, cap: u32) -> Result<()> {
        self.set_capability("glEnable", cap, true)
    }

    pub fn disable(&mut self, cap: u32) -> Result<()> {
        self.set_capability("glDisable", cap, false)
    }

    fn set_capability(&mut self, call: &'static str, cap: u32, on: bool) -> Result<()> {
        self.outside_begin_end(call)?;
        match cap {
            gl::DEPTH_TEST => self.render.depth.test_enabled = on,
            gl::STENCIL_TEST => self.render.stencil.enabled = on,
            gl::BLEND => self.render.blend.enabled = on,
            gl::CULL_FACE => self.render.raster.cull_enabled = on,
            gl::POLYGON_OFFSET_FILL => self.render.raster.polygon_offset_fill = on,
            gl::SCISSOR_TEST => self.render.scissor_enabled = on,
            gl::LIGHTING => self.fixed.lighting = on,
            gl::FOG => self.fixed.fog.enabled = on,
            gl::NORMALIZE => self.fixed.normalize = on,
            gl::ALPHA_TEST => self.fixed.alpha_test.enabled = on,
            gl::COLOR_MATERIAL => self.fixed.color_material.enabled = on,
            gl::VERTEX_PROGRAM_ARB => self.fixed.programs.vertex = on,
            gl::FRAGMENT_PROGRAM_ARB => self.fixed.programs.fragment = on,
            v if (gl::LIGHT0..gl::LIGHT0 + MAX_LIGHTS as u32).contains(&v) => {
                let index = self.light_index(call, v)?;
                self.fixed.lights[index].enabled = on;
            }
            gl::TEXTURE_GEN_S..=gl::TEXTURE_GEN_Q => {
                let coord = (cap - gl::TEXTURE_GEN_S) as usize;
                self.active_unit_mut().texgen[coord].enabled = on;
            }
            gl::TEXTURE_1D | gl::TEXTURE_2D | gl::TEXTURE_3D | gl::TEXTURE_CUBE_MAP | gl::TEXTURE_RECTANGLE => {
                let target = translate::texture_target(call, cap)?;
                self.active_unit_mut().set_target_enabled(target, on);
            }
            gl::DITHER | gl::POINT_SMOOTH | gl::LINE_SMOOTH | gl::POLYGON_SMOOTH | gl::MULTISAMPLE
            | gl::RESCALE_NORMAL => {
                debug!(call, cap, on, "ignoring capability with no device effect");
            }
            other => return Err(GlError::unsupported(call, "capability", other)),
        }
        Ok(())
    }

    pub fn is_enabled(&self, cap: u32) -> Result<bool> {
        let call = "glIsEnabled";
        let unit = &self.units[self.active_unit as usize];
        Ok(match cap {
            gl::DEPTH_TEST => self.render.depth.test_enabled,
            gl::STENCIL_TEST => self.render.stencil.enabled,
            gl::BLEND => self.render.blend.enabled,
            gl::CULL_FACE => self.render.raster.cull_enabled,
            gl::POLYGON_OFFSET_FILL => self.render.raster.polygon_offset_fill,
            gl::SCISSOR_TEST => self.render.scissor_enabled,
            gl::LIGHTING => self.fixed.lighting,
            gl::FOG => self.fixed.fog.enabled,
            gl::NORMALIZE => self.fixed.normalize,
            gl::ALPHA_TEST => self.fixed.alpha_test.enabled,
            gl::COLOR_MATERIAL => self.fixed.color_material.enabled,
            gl::VERTEX_PROGRAM_ARB => self.fixed.programs.vertex,
            gl::FRAGMENT_PROGRAM_ARB => self.fixed.programs.fragment,
            v if (gl::LIGHT0..gl::LIGHT0 + MAX_LIGHTS as u32).contains(&v) => {
                self.fixed.lights[self.light_index(call, v)?].enabled
            }
            gl::TEXTURE_GEN_S..=gl::TEXTURE_GEN_Q => unit.texgen[(cap - gl::TEXTURE_GEN_S) as usize].enabled,
            gl::TEXTURE_1D | gl::TEXTURE_2D | gl::TEXTURE_3D | gl::TEXTURE_CUBE_MAP | gl::TEXTURE_RECTANGLE => {
                let target = translate::texture_target(call, cap)?;
                unit.enabled.contains(TargetMask::of(target))
            }
            other => return Err(GlError::unsupported(call, "capability", other)),
        })
    }

    // Immediate mode.

    pub fn begin(&mut self, mode: u32) -> Result<()> {
        let call = "glBegin";
        self.outside_begin_end(call)?;
        let primitive = translate::primitive(call, mode)?;
        let block = ImmediateBlock::begin(&mut self.device, primitive, self.current.texcoord_extent)?;
        self.immediate = Some(block);
        Ok(())
    }

    /// Draws the vertices accumulated since `Begin`, then frees the block's
    /// buffers whether or not the draw succeeded.
    pub fn end(&mut self) -> Result<()> {
        let call = "glEnd";
        let block = self.immediate.take().ok_or(GlError::OutsideBeginEnd { call })?;
        let result = if block.vertex_count() == 0 {
            Ok(())
        } else {
            let request = DrawRequest {
                call,
                primitive: block.primitive(),
                source: DrawSource::Immediate(&block),
                instances: 1,
            };
            self.run_draw(&request, block.texcoord_units())
        };
        let released = block.release(&mut self.device);
        result.and(released)
    }

    pub fn vertex2f(&mut self, x: f32, y: f32) -> Result<()> {
        self.vertex("glVertex2f", [x, y, 0.0, 1.0])
    }

    pub fn vertex3f(&mut self, x: f32, y: f32, z: f32) -> Result<()> {
        self.vertex("glVertex3f", [x, y, z, 1.0])
    }

    pub fn vertex4f(&mut self, x: f32, y: f32, z: f32, w: f32) -> Result<()> {
        self.vertex("glVertex4f", [x, y, z, w])
    }

    fn vertex(&mut self, call: &'static str, position: [f32; 4]) -> Result<()> {
        let block = self.immediate.as_mut().ok_or(GlError::OutsideBeginEnd { call })?;
        block.append(&mut self.device, position, &self.current)
    }

    pub fn color3f(&mut self, r: f32, g: f32, b: f32) {
        self.current.color = [r, g, b, 1.0];
    }

    pub fn color4f(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.current.color = [r, g, b, a];
    }

    pub fn color3ub(&mut self, r: u8, g: u8, b: u8) {
        self.color4ub(r, g, b, u8::MAX);
    }

    pub fn color4ub(&mut self, r: u8, g: u8, b: u8, a: u8) {
        self.current.color = [r, g, b, a].map(|c| f32::from(c) / 255.0);
    }

    pub fn normal3f(&mut self, x: f32, y: f32, z: f32) {
        self.current.normal = [x, y, z];
    }

    /// `TexCoord1..4` for unit 0.
    pub fn tex_coord(&mut self, coords: &[f32]) -> Result<()> {
        self.set_tex_coord("glTexCoord", 0, coords)
    }

    pub fn multi_tex_coord(&mut self, texture: u32, coords: &[f32]) -> Result<()> {
        let call = "glMultiTexCoord";
        let unit = texture.wrapping_sub(gl::TEXTURE0);
        self.set_tex_coord(call, unit, coords)
    }

    fn set_tex_coord(&mut self, call: &'static str, unit: u32, coords: &[f32]) -> Result<()> {
        let limit = self.current.texcoords.len() as u32;
        if unit >= limit {
            return Err(GlError::CapabilityOutOfRange {
                call,
                what: "texture coordinate unit",
                index: unit,
                limit,
            });
        }
        if coords.is_empty() || coords.len() > 4 {
            return Err(GlError::UnsupportedValue {
                call,
                param: "coordinate count",
                value: coords.len() as i64,
            });
        }
        let mut value = DEFAULT_TEXCOORD;
        value[..coords.len()].copy_from_slice(coords);
        self.current.set_texcoord(unit as u8, value);
        Ok(())
    }

    // Array draws.

    pub fn draw_arrays(&mut self, mode: u32, first: i32, count: i32) -> Result<()> {
        let call = "glDrawArrays";
        self.outside_begin_end(call)?;
        let primitive = translate::primitive(call, mode)?;
        let first = non_negative(call, "first", first)?;
        let count = non_negative(call, "count", count)?;
        if count == 0 {
            return Ok(());
        }
        let request = DrawRequest {
            call,
            primitive,
            source: DrawSource::Arrays { first, count },
            instances: 1,
        };
        self.run_draw(&request, self.texcoord_array_inputs())
    }

    pub fn draw_elements(&mut self, mode: u32, count: i32, ty: u32, indices: &ArrayPointer) -> Result<()> {
        self.draw_indexed("glDrawElements", mode, count, ty, indices)
    }

    pub fn draw_range_elements(
        &mut self,
        mode: u32,
        start: u32,
        end: u32,
        count: i32,
        ty: u32,
        indices: &ArrayPointer,
    ) -> Result<()> {
        let call = "glDrawRangeElements";
        if start > end {
            return Err(GlError::InvalidRange { call, start, end });
        }
        self.draw_indexed(call, mode, count, ty, indices)
    }

    fn draw_indexed(
        &mut self,
        call: &'static str,
        mode: u32,
        count: i32,
        ty: u32,
        indices: &ArrayPointer,
    ) -> Result<()> {
        self.outside_begin_end(call)?;
        let primitive = translate::primitive(call, mode)?;
        let ty = translate::index_type(call, ty)?;
        let count = non_negative(call, "count", count)?;
        if count == 0 {
            return Ok(());
        }
        let request = DrawRequest {
            call,
            primitive,
            source: DrawSource::Elements { count, ty, indices },
            instances: 1,
        };
        self.run_draw(&request, self.texcoord_array_inputs())
    }

    /// Texture coordinate inputs fed by client arrays: up to the highest
    /// enabled texcoord array.
    fn texcoord_array_inputs(&self) -> u8 {
        (0..self.config.client_texcoord_units as u8)
            .rev()
            .find(|&unit| self.arrays.is_enabled(AttributeSlot::TexCoord(unit)))
            .map_or(0, |unit| unit + 1)
    }

    fn run_draw(&mut self, request: &DrawRequest<'_>, texcoord_inputs: u8) -> Result<()> {
        let Self {
            device,
            orchestrator,
            arrays,
            current,
            fixed,
            render,
            units,
            matrices,
            buffers,
            textures,
            programs,
            compiler,
            synthesizer,
            ..
        } = self;
        let inputs = DrawInputs {
            arrays,
            buffers,
            textures,
            units,
            fixed,
            matrices,
            render,
            programs,
            compiler: compiler.as_ref(),
            synthesizer: synthesizer.as_ref(),
            current_color: current.color,
            texcoord_inputs,
        };
        orchestrator.execute(device, &inputs, request)?;
        self.draws += 1;
        Ok(())
    }
}

fn non_negative(call: &'static str, param: &'static str, value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| GlError::UnsupportedValue {
        call,
        param,
        value: i64::from(value),
    })
}

/// Leading `N` values of a parameter vector.
fn leading<const N: usize>(call: &'static str, param: &'static str, values: &[f32]) -> Result<[f32; N]> {
    values
        .get(..N)
        .and_then(|head| <[f32; N]>::try_from(head).ok())
        .ok_or(GlError::UnsupportedValue {
            call,
            param,
            value: values.len() as i64,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DrawCall, RecordingDevice};

    fn context() -> GlContext<RecordingDevice> {
        GlContext::new(RecordingDevice::new(31, 16), ContextConfig::default()).unwrap()
    }

    #[test]
    fn unknown_capability_is_fatal_and_harmless_ones_are_ignored() {
        let mut ctx = context();
        ctx.enable(gl::DITHER).unwrap();
        assert!(matches!(
            ctx.enable(0x1234),
            Err(GlError::UnsupportedEnum { call: "glEnable", param: "capability", value: 0x1234 })
        ));
    }

    #[test]
    fn capability_round_trip() {
        let mut ctx = context();
        for cap in [gl::DEPTH_TEST, gl::LIGHTING, gl::LIGHT0 + 3, gl::TEXTURE_2D, gl::TEXTURE_GEN_R] {
            assert!(!ctx.is_enabled(cap).unwrap());
            ctx.enable(cap).unwrap();
            assert!(ctx.is_enabled(cap).unwrap());
            ctx.disable(cap).unwrap();
            assert!(!ctx.is_enabled(cap).unwrap());
        }
    }

    #[test]
    fn light_beyond_configured_count_is_a_capability_error() {
        let config = ContextConfig {
            lights: 2,
            ..ContextConfig::default()
        };
        let mut ctx = GlContext::new(RecordingDevice::new(31, 16), config).unwrap();
        assert!(matches!(
            ctx.enable(gl::LIGHT0 + 2),
            Err(GlError::CapabilityOutOfRange { what: "light", index: 2, limit: 2, .. })
        ));
    }

    #[test]
    fn begin_end_nesting_is_enforced() {
        let mut ctx = context();
        assert!(matches!(ctx.end(), Err(GlError::OutsideBeginEnd { call: "glEnd" })));
        assert!(matches!(
            ctx.vertex3f(0.0, 0.0, 0.0),
            Err(GlError::OutsideBeginEnd { .. })
        ));
        ctx.begin(gl::TRIANGLES).unwrap();
        assert!(matches!(ctx.begin(gl::TRIANGLES), Err(GlError::InsideBeginEnd { call: "glBegin" })));
        assert!(matches!(
            ctx.draw_arrays(gl::TRIANGLES, 0, 3),
            Err(GlError::InsideBeginEnd { .. })
        ));
        ctx.end().unwrap();
        assert_eq!(ctx.draw_count(), 0);
        assert_eq!(ctx.device().stats().snapshot().live_buffers, 0);
    }

    #[test]
    fn immediate_block_draws_accumulated_vertices() {
        let mut ctx = context();
        ctx.begin(gl::TRIANGLES).unwrap();
        ctx.color4ub(255, 0, 0, 255);
        ctx.vertex2f(0.0, 0.0).unwrap();
        ctx.vertex2f(1.0, 0.0).unwrap();
        ctx.vertex2f(0.0, 1.0).unwrap();
        ctx.end().unwrap();

        let draws = ctx.device().draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(
            draws[0].call,
            DrawCall::NonIndexed {
                start: 0,
                count: 3,
                instances: 1
            }
        );
        let color = draws[0].attribute(AttributeSlot::Color.attribute_index()).unwrap();
        assert_eq!(color.vertex_f32(2).unwrap(), vec![1.0, 0.0, 0.0, 1.0]);
        assert!(ctx.slots().all_free());
        assert_eq!(ctx.device().stats().snapshot().live_buffers, 0);
        assert_eq!(ctx.device().stats().snapshot().live_programs, 0);
    }

    #[test]
    fn texcoord_defaults_fill_missing_components() {
        let mut ctx = context();
        ctx.tex_coord(&[0.25, 0.5]).unwrap();
        assert_eq!(ctx.current_values().texcoords[0], [0.25, 0.5, 0.0, 1.0]);
        ctx.multi_tex_coord(gl::TEXTURE0 + 3, &[0.5]).unwrap();
        assert_eq!(ctx.current_values().texcoords[3], [0.5, 0.0, 0.0, 1.0]);
        assert!(matches!(
            ctx.multi_tex_coord(gl::TEXTURE0 + 8, &[0.5]),
            Err(GlError::CapabilityOutOfRange { .. })
        ));
        assert!(ctx.tex_coord(&[]).is_err());
    }

    #[test]
    fn get_string_returns_fixed_values() {
        let ctx = context();
        assert_eq!(ctx.get_string(gl::VENDOR).unwrap(), VENDOR);
        assert!(ctx.get_string(gl::EXTENSIONS).unwrap().contains("GL_ARB_vertex_program"));
        assert!(ctx.get_string(0x1F04).is_err());
    }
}
