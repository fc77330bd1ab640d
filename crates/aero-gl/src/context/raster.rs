use tracing::trace;

use crate::device::{ClearRequest, Device};
use crate::error::{GlError, Result};
use crate::gl;
use crate::state::render::{color_writes, Rect, StencilFace};
use crate::state::translate;

use super::GlContext;

/// Faces addressed by the `*Separate` calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Faces {
    Front,
    Back,
    Both,
}

impl Faces {
    fn parse(call: &'static str, value: u32) -> Result<Self> {
        Ok(match value {
            gl::FRONT => Faces::Front,
            gl::BACK => Faces::Back,
            gl::FRONT_AND_BACK => Faces::Both,
            other => return Err(GlError::unsupported(call, "face", other)),
        })
    }

    fn front(self) -> bool {
        matches!(self, Faces::Front | Faces::Both)
    }

    fn back(self) -> bool {
        matches!(self, Faces::Back | Faces::Both)
    }
}

fn extent(call: &'static str, param: &'static str, value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| GlError::UnsupportedValue {
        call,
        param,
        value: i64::from(value),
    })
}

impl<D: Device> GlContext<D> {
    fn stencil_faces(
        &mut self,
        call: &'static str,
        face: u32,
        mut update: impl FnMut(&mut StencilFace),
    ) -> Result<()> {
        self.outside_begin_end(call)?;
        let faces = Faces::parse(call, face)?;
        if faces.front() {
            update(&mut self.render.stencil.front);
        }
        if faces.back() {
            update(&mut self.render.stencil.back);
        }
        Ok(())
    }

    pub fn depth_func(&mut self, func: u32) -> Result<()> {
        let call = "glDepthFunc";
        self.outside_begin_end(call)?;
        self.render.depth.compare = translate::compare_func(call, func)?;
        Ok(())
    }

    pub fn depth_mask(&mut self, enabled: bool) -> Result<()> {
        self.outside_begin_end("glDepthMask")?;
        self.render.depth.write_enabled = enabled;
        Ok(())
    }

    pub fn depth_range(&mut self, near: f64, far: f64) -> Result<()> {
        self.outside_begin_end("glDepthRange")?;
        self.render.depth.range = [near.clamp(0.0, 1.0) as f32, far.clamp(0.0, 1.0) as f32];
        Ok(())
    }

    pub fn stencil_func(&mut self, func: u32, reference: i32, mask: u32) -> Result<()> {
        self.stencil_func_separate_impl("glStencilFunc", gl::FRONT_AND_BACK, func, reference, mask)
    }

    pub fn stencil_func_separate(&mut self, face: u32, func: u32, reference: i32, mask: u32) -> Result<()> {
        self.stencil_func_separate_impl("glStencilFuncSeparate", face, func, reference, mask)
    }

    fn stencil_func_separate_impl(
        &mut self,
        call: &'static str,
        face: u32,
        func: u32,
        reference: i32,
        mask: u32,
    ) -> Result<()> {
        let compare = translate::compare_func(call, func)?;
        let reference = reference.max(0) as u32;
        self.stencil_faces(call, face, |f| {
            f.ops.compare = compare;
            f.reference = reference;
            f.read_mask = mask;
        })
    }

    pub fn stencil_op(&mut self, fail: u32, depth_fail: u32, pass: u32) -> Result<()> {
        self.stencil_op_separate_impl("glStencilOp", gl::FRONT_AND_BACK, fail, depth_fail, pass)
    }

    pub fn stencil_op_separate(&mut self, face: u32, fail: u32, depth_fail: u32, pass: u32) -> Result<()> {
        self.stencil_op_separate_impl("glStencilOpSeparate", face, fail, depth_fail, pass)
    }

    fn stencil_op_separate_impl(
        &mut self,
        call: &'static str,
        face: u32,
        fail: u32,
        depth_fail: u32,
        pass: u32,
    ) -> Result<()> {
        let fail = translate::stencil_op(call, fail)?;
        let depth_fail = translate::stencil_op(call, depth_fail)?;
        let pass = translate::stencil_op(call, pass)?;
        self.stencil_faces(call, face, |f| {
            f.ops.fail_op = fail;
            f.ops.depth_fail_op = depth_fail;
            f.ops.pass_op = pass;
        })
    }

    pub fn stencil_mask(&mut self, mask: u32) -> Result<()> {
        self.stencil_faces("glStencilMask", gl::FRONT_AND_BACK, |f| f.write_mask = mask)
    }

    pub fn blend_func(&mut self, src: u32, dst: u32) -> Result<()> {
        let call = "glBlendFunc";
        let src = translate::blend_factor(call, src)?;
        let dst = translate::blend_factor(call, dst)?;
        self.outside_begin_end(call)?;
        let blend = &mut self.render.blend;
        blend.color.src_factor = src;
        blend.color.dst_factor = dst;
        blend.alpha.src_factor = src;
        blend.alpha.dst_factor = dst;
        Ok(())
    }

    pub fn blend_func_separate(&mut self, src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32) -> Result<()> {
        let call = "glBlendFuncSeparate";
        let factors = [
            translate::blend_factor(call, src_rgb)?,
            translate::blend_factor(call, dst_rgb)?,
            translate::blend_factor(call, src_alpha)?,
            translate::blend_factor(call, dst_alpha)?,
        ];
        self.outside_begin_end(call)?;
        let blend = &mut self.render.blend;
        blend.color.src_factor = factors[0];
        blend.color.dst_factor = factors[1];
        blend.alpha.src_factor = factors[2];
        blend.alpha.dst_factor = factors[3];
        Ok(())
    }

    pub fn blend_equation(&mut self, mode: u32) -> Result<()> {
        let call = "glBlendEquation";
        let operation = translate::blend_equation(call, mode)?;
        self.outside_begin_end(call)?;
        self.render.blend.color.operation = operation;
        self.render.blend.alpha.operation = operation;
        Ok(())
    }

    pub fn blend_equation_separate(&mut self, rgb: u32, alpha: u32) -> Result<()> {
        let call = "glBlendEquationSeparate";
        let rgb = translate::blend_equation(call, rgb)?;
        let alpha = translate::blend_equation(call, alpha)?;
        self.outside_begin_end(call)?;
        self.render.blend.color.operation = rgb;
        self.render.blend.alpha.operation = alpha;
        Ok(())
    }

    pub fn blend_color(&mut self, r: f32, g: f32, b: f32, a: f32) -> Result<()> {
        self.outside_begin_end("glBlendColor")?;
        self.render.blend.constant = [r, g, b, a].map(|c| c.clamp(0.0, 1.0));
        Ok(())
    }

    pub fn color_mask(&mut self, red: bool, green: bool, blue: bool, alpha: bool) -> Result<()> {
        self.outside_begin_end("glColorMask")?;
        self.render.color_mask = color_writes(red, green, blue, alpha);
        Ok(())
    }

    pub fn cull_face(&mut self, face: u32) -> Result<()> {
        let call = "glCullFace";
        self.outside_begin_end(call)?;
        self.render.raster.cull_face = translate::cull_face(call, face)?;
        Ok(())
    }

    pub fn front_face(&mut self, winding: u32) -> Result<()> {
        let call = "glFrontFace";
        self.outside_begin_end(call)?;
        self.render.raster.front_face = translate::front_face(call, winding)?;
        Ok(())
    }

    pub fn polygon_offset(&mut self, factor: f32, units: f32) -> Result<()> {
        self.outside_begin_end("glPolygonOffset")?;
        self.render.raster.polygon_offset = [factor, units];
        Ok(())
    }

    /// Only `FILL` is accepted, for any face.
    pub fn polygon_mode(&mut self, face: u32, mode: u32) -> Result<()> {
        let call = "glPolygonMode";
        self.outside_begin_end(call)?;
        Faces::parse(call, face)?;
        translate::polygon_mode(call, mode)
    }

    pub fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) -> Result<()> {
        let call = "glViewport";
        self.outside_begin_end(call)?;
        self.render.viewport = Some(Rect {
            x,
            y,
            width: extent(call, "width", width)?,
            height: extent(call, "height", height)?,
        });
        Ok(())
    }

    pub fn scissor(&mut self, x: i32, y: i32, width: i32, height: i32) -> Result<()> {
        let call = "glScissor";
        self.outside_begin_end(call)?;
        self.render.scissor = Some(Rect {
            x,
            y,
            width: extent(call, "width", width)?,
            height: extent(call, "height", height)?,
        });
        Ok(())
    }

    pub fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) -> Result<()> {
        self.outside_begin_end("glClearColor")?;
        self.clear_values.color = [r, g, b, a].map(|c| c.clamp(0.0, 1.0));
        Ok(())
    }

    pub fn clear_depth(&mut self, depth: f64) -> Result<()> {
        self.outside_begin_end("glClearDepth")?;
        self.clear_values.depth = depth.clamp(0.0, 1.0) as f32;
        Ok(())
    }

    pub fn clear_stencil(&mut self, stencil: i32) -> Result<()> {
        self.outside_begin_end("glClearStencil")?;
        self.clear_values.stencil = stencil as u32;
        Ok(())
    }

    pub fn clear(&mut self, mask: u32) -> Result<()> {
        let call = "glClear";
        self.outside_begin_end(call)?;
        let known = gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT | gl::STENCIL_BUFFER_BIT;
        if mask & !known != 0 {
            return Err(GlError::unsupported(call, "mask", mask));
        }
        let values = self.clear_values;
        let request = ClearRequest {
            color: (mask & gl::COLOR_BUFFER_BIT != 0).then(|| values.color.map(|c| (c * 255.0) as u8)),
            depth: (mask & gl::DEPTH_BUFFER_BIT != 0).then_some(values.depth),
            stencil: (mask & gl::STENCIL_BUFFER_BIT != 0).then_some(values.stencil),
        };
        trace!(?request, "clear");
        self.device.clear(&request);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::config::ContextConfig;
    use crate::context::GlContext;
    use crate::device::{ClearRequest, RecordingDevice};
    use crate::error::GlError;
    use crate::gl;
    use crate::state::render::Rect;

    fn context() -> GlContext<RecordingDevice> {
        GlContext::new(RecordingDevice::new(31, 16), ContextConfig::default()).unwrap()
    }

    #[test]
    fn separate_stencil_updates_only_the_named_face() {
        let mut ctx = context();
        ctx.stencil_func_separate(gl::BACK, gl::EQUAL, 3, 0x0F).unwrap();
        ctx.stencil_op_separate(gl::FRONT, gl::KEEP, gl::INCR, gl::REPLACE).unwrap();

        let stencil = &ctx.render_state().stencil;
        assert_eq!(stencil.back.ops.compare, wgpu::CompareFunction::Equal);
        assert_eq!(stencil.back.reference, 3);
        assert_eq!(stencil.back.read_mask, 0x0F);
        assert_eq!(stencil.front.ops.compare, wgpu::CompareFunction::Always);
        assert_eq!(stencil.front.ops.depth_fail_op, wgpu::StencilOperation::IncrementClamp);
        assert_eq!(stencil.front.ops.pass_op, wgpu::StencilOperation::Replace);
        assert_eq!(stencil.back.ops.pass_op, wgpu::StencilOperation::Keep);

        assert!(matches!(
            ctx.stencil_func_separate(gl::CCW, gl::EQUAL, 0, 0),
            Err(GlError::UnsupportedEnum { param: "face", .. })
        ));
    }

    #[test]
    fn blend_func_sets_both_components() {
        let mut ctx = context();
        ctx.blend_func(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA).unwrap();
        let blend = &ctx.render_state().blend;
        assert_eq!(blend.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(blend.alpha.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
    }

    #[test]
    fn clear_converts_color_by_truncation() {
        let mut ctx = context();
        ctx.clear_color(0.5, 2.0, -1.0, 1.0).unwrap();
        ctx.clear_depth(0.25).unwrap();
        ctx.clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT).unwrap();
        assert_eq!(
            ctx.device().clears(),
            &[ClearRequest {
                color: Some([127, 255, 0, 255]),
                depth: Some(0.25),
                stencil: None,
            }]
        );
        assert!(matches!(ctx.clear(0x1), Err(GlError::UnsupportedEnum { .. })));
    }

    #[test]
    fn viewport_rejects_negative_extent() {
        let mut ctx = context();
        ctx.viewport(0, 0, 640, 480).unwrap();
        assert_eq!(
            ctx.render_state().viewport,
            Some(Rect { x: 0, y: 0, width: 640, height: 480 })
        );
        assert!(matches!(
            ctx.viewport(0, 0, -1, 480),
            Err(GlError::UnsupportedValue { param: "width", value: -1, .. })
        ));
    }

    #[test]
    fn polygon_mode_accepts_fill_only() {
        let mut ctx = context();
        ctx.polygon_mode(gl::FRONT_AND_BACK, gl::FILL).unwrap();
        assert!(ctx.polygon_mode(gl::FRONT, gl::LINE).is_err());
    }
}
