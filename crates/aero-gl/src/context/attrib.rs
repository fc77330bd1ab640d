use tracing::trace;

use crate::device::Device;
use crate::error::Result;
use crate::state::attrib::AttribMask;
use crate::state::fixed_function::FixedFunctionState;
use crate::state::render::RenderState;
use crate::state::translate::MatrixMode;
use crate::texture_unit::TextureUnit;
use crate::vertex::immediate::CurrentValues;

use super::{ClearValues, GlContext};

/// Snapshot taken by `PushAttrib`. The whole state is cloned; `PopAttrib`
/// copies back only the fields of the groups that were pushed.
#[derive(Clone, Debug)]
pub(super) struct SavedAttribs {
    current: CurrentValues,
    fixed: FixedFunctionState,
    render: RenderState,
    clear_values: ClearValues,
    units: Vec<TextureUnit>,
    active_unit: u32,
    matrix_mode: MatrixMode,
}

impl<D: Device> GlContext<D> {
    pub fn push_attrib(&mut self, mask: u32) -> Result<()> {
        let call = "glPushAttrib";
        self.outside_begin_end(call)?;
        let mask = AttribMask::from_gl(call, mask)?;
        let saved = SavedAttribs {
            current: self.current.clone(),
            fixed: self.fixed.clone(),
            render: self.render.clone(),
            clear_values: self.clear_values,
            units: self.units.clone(),
            active_unit: self.active_unit,
            matrix_mode: self.matrix_mode,
        };
        self.attrib_stack.push(call, mask, saved)?;
        trace!(?mask, depth = self.attrib_stack.depth(), "push attrib");
        Ok(())
    }

    pub fn pop_attrib(&mut self) -> Result<()> {
        let call = "glPopAttrib";
        self.outside_begin_end(call)?;
        let (mask, saved) = self.attrib_stack.pop(call)?;
        trace!(?mask, depth = self.attrib_stack.depth(), "pop attrib");

        if mask.contains(AttribMask::CURRENT) {
            self.current = saved.current.clone();
        }
        if mask.contains(AttribMask::ENABLE) {
            self.restore_enables(&saved);
        }
        if mask.contains(AttribMask::LIGHTING) {
            let fixed = &mut self.fixed;
            fixed.lighting = saved.fixed.lighting;
            fixed.lights.clone_from(&saved.fixed.lights);
            fixed.materials = saved.fixed.materials;
            fixed.light_model = saved.fixed.light_model;
            fixed.color_material = saved.fixed.color_material;
            fixed.shade_model = saved.fixed.shade_model;
        }
        if mask.contains(AttribMask::FOG) {
            self.fixed.fog = saved.fixed.fog;
        }
        if mask.contains(AttribMask::COLOR_BUFFER) {
            self.fixed.alpha_test = saved.fixed.alpha_test;
            self.render.blend = saved.render.blend;
            self.render.color_mask = saved.render.color_mask;
            self.clear_values.color = saved.clear_values.color;
        }
        if mask.contains(AttribMask::DEPTH_BUFFER) {
            let range = self.render.depth.range;
            self.render.depth = saved.render.depth;
            self.render.depth.range = range;
            self.clear_values.depth = saved.clear_values.depth;
        }
        if mask.contains(AttribMask::STENCIL_BUFFER) {
            self.render.stencil = saved.render.stencil;
            self.clear_values.stencil = saved.clear_values.stencil;
        }
        if mask.contains(AttribMask::VIEWPORT) {
            self.render.viewport = saved.render.viewport;
            self.render.depth.range = saved.render.depth.range;
        }
        if mask.contains(AttribMask::SCISSOR) {
            self.render.scissor_enabled = saved.render.scissor_enabled;
            self.render.scissor = saved.render.scissor;
        }
        if mask.contains(AttribMask::POLYGON) {
            self.render.raster = saved.render.raster;
        }
        if mask.contains(AttribMask::TEXTURE) {
            self.units.clone_from(&saved.units);
            self.active_unit = saved.active_unit;
        }
        if mask.contains(AttribMask::TRANSFORM) {
            self.matrix_mode = saved.matrix_mode;
            self.fixed.normalize = saved.fixed.normalize;
        }
        Ok(())
    }

    fn restore_enables(&mut self, saved: &SavedAttribs) {
        let fixed = &mut self.fixed;
        fixed.lighting = saved.fixed.lighting;
        for (light, old) in fixed.lights.iter_mut().zip(&saved.fixed.lights) {
            light.enabled = old.enabled;
        }
        fixed.normalize = saved.fixed.normalize;
        fixed.fog.enabled = saved.fixed.fog.enabled;
        fixed.alpha_test.enabled = saved.fixed.alpha_test.enabled;
        fixed.color_material.enabled = saved.fixed.color_material.enabled;
        fixed.programs = saved.fixed.programs;

        let render = &mut self.render;
        render.raster.cull_enabled = saved.render.raster.cull_enabled;
        render.raster.polygon_offset_fill = saved.render.raster.polygon_offset_fill;
        render.depth.test_enabled = saved.render.depth.test_enabled;
        render.stencil.enabled = saved.render.stencil.enabled;
        render.blend.enabled = saved.render.blend.enabled;
        render.scissor_enabled = saved.render.scissor_enabled;

        for (unit, old) in self.units.iter_mut().zip(&saved.units) {
            unit.enabled = old.enabled;
            for (gen, old_gen) in unit.texgen.iter_mut().zip(&old.texgen) {
                gen.enabled = old_gen.enabled;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::config::ContextConfig;
    use crate::context::GlContext;
    use crate::device::RecordingDevice;
    use crate::error::GlError;
    use crate::gl;
    use crate::state::translate::MatrixMode;
    use crate::texture_unit::TexEnvMode;
    use crate::objects::ParamValue;

    fn context() -> GlContext<RecordingDevice> {
        GlContext::new(RecordingDevice::new(31, 16), ContextConfig::default()).unwrap()
    }

    #[test]
    fn pop_restores_only_pushed_groups() {
        let mut ctx = context();
        ctx.push_attrib(gl::FOG_BIT | gl::ENABLE_BIT).unwrap();
        ctx.enable(gl::FOG).unwrap();
        ctx.enable(gl::DEPTH_TEST).unwrap();
        ctx.fog_f(gl::FOG_DENSITY, 0.5).unwrap();
        ctx.depth_func(gl::LEQUAL).unwrap();
        ctx.pop_attrib().unwrap();

        assert!(!ctx.is_enabled(gl::FOG).unwrap());
        assert!(!ctx.is_enabled(gl::DEPTH_TEST).unwrap());
        assert_eq!(ctx.fixed_function().fog.density, 1.0);
        // DEPTH_BUFFER was not pushed.
        assert_eq!(ctx.render_state().depth.compare, wgpu::CompareFunction::LessEqual);
    }

    #[test]
    fn viewport_group_carries_depth_range() {
        let mut ctx = context();
        ctx.viewport(0, 0, 100, 100).unwrap();
        ctx.push_attrib(gl::VIEWPORT_BIT).unwrap();
        ctx.viewport(0, 0, 10, 10).unwrap();
        ctx.depth_range(0.25, 0.5).unwrap();
        ctx.depth_mask(false).unwrap();
        ctx.pop_attrib().unwrap();

        let render = ctx.render_state();
        assert_eq!(render.viewport.map(|v| v.width), Some(100));
        assert_eq!(render.depth.range, [0.0, 1.0]);
        assert!(!render.depth.write_enabled);
    }

    #[test]
    fn texture_and_transform_groups() {
        let mut ctx = context();
        ctx.push_attrib(gl::ALL_ATTRIB_BITS).unwrap();
        ctx.active_texture(gl::TEXTURE0 + 2).unwrap();
        ctx.tex_env(gl::TEXTURE_ENV, gl::TEXTURE_ENV_MODE, ParamValue::Int(gl::REPLACE as i32))
            .unwrap();
        ctx.matrix_mode(gl::PROJECTION).unwrap();
        ctx.color3f(0.0, 0.0, 0.0);
        ctx.pop_attrib().unwrap();

        assert_eq!(ctx.active_texture_unit(), 0);
        assert_eq!(ctx.texture_units()[2].env.mode, TexEnvMode::Modulate);
        assert_eq!(ctx.current_values().color, [1.0; 4]);
        assert_eq!(ctx.current_matrix_mode(), MatrixMode::Modelview(0));
    }

    #[test]
    fn underflow_and_unsupported_groups_are_fatal() {
        let mut ctx = context();
        assert!(matches!(ctx.pop_attrib(), Err(GlError::AttribStackUnderflow { .. })));
        assert!(matches!(
            ctx.push_attrib(gl::HINT_BIT),
            Err(GlError::UnsupportedEnum { .. })
        ));
    }
}
