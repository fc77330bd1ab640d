use crate::device::Device;
use crate::error::{GlError, Result};
use crate::state::matrix::{Mat4, MatrixStack};
use crate::state::translate;

use super::GlContext;

impl<D: Device> GlContext<D> {
    /// The selected stack must exist; modelview units beyond the configured
    /// count are capability errors.
    pub fn matrix_mode(&mut self, mode: u32) -> Result<()> {
        let call = "glMatrixMode";
        self.outside_begin_end(call)?;
        let mode = translate::matrix_mode(call, mode)?;
        self.matrices.stack_mut(call, mode, self.active_unit as usize)?;
        self.matrix_mode = mode;
        Ok(())
    }

    /// The stack selected by the matrix mode; texture mode follows the
    /// active texture unit.
    fn current_stack(&mut self, call: &'static str) -> Result<&mut MatrixStack> {
        self.outside_begin_end(call)?;
        self.matrices
            .stack_mut(call, self.matrix_mode, self.active_unit as usize)
    }

    pub fn push_matrix(&mut self) -> Result<()> {
        let call = "glPushMatrix";
        self.current_stack(call)?.push(call)
    }

    pub fn pop_matrix(&mut self) -> Result<()> {
        let call = "glPopMatrix";
        self.current_stack(call)?.pop(call)
    }

    pub fn load_identity(&mut self) -> Result<()> {
        *self.current_stack("glLoadIdentity")?.top_mut() = Mat4::IDENTITY;
        Ok(())
    }

    /// Column-major, as the legacy API passes it.
    pub fn load_matrix_f(&mut self, m: &[f32; 16]) -> Result<()> {
        *self.current_stack("glLoadMatrixf")?.top_mut() = Mat4::from_column_major(m);
        Ok(())
    }

    pub fn mult_matrix_f(&mut self, m: &[f32; 16]) -> Result<()> {
        self.current_stack("glMultMatrixf")?
            .multiply(Mat4::from_column_major(m));
        Ok(())
    }

    pub fn translate_f(&mut self, x: f32, y: f32, z: f32) -> Result<()> {
        self.current_stack("glTranslatef")?
            .multiply(Mat4::translation(x, y, z));
        Ok(())
    }

    pub fn scale_f(&mut self, x: f32, y: f32, z: f32) -> Result<()> {
        self.current_stack("glScalef")?.multiply(Mat4::scaling(x, y, z));
        Ok(())
    }

    pub fn rotate_f(&mut self, degrees: f32, x: f32, y: f32, z: f32) -> Result<()> {
        self.current_stack("glRotatef")?
            .multiply(Mat4::rotation(degrees, x, y, z));
        Ok(())
    }

    pub fn ortho(&mut self, left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> Result<()> {
        let call = "glOrtho";
        if left == right || bottom == top || near == far {
            return Err(GlError::UnsupportedValue {
                call,
                param: "clip volume",
                value: 0,
            });
        }
        let m = Mat4::ortho(
            left as f32,
            right as f32,
            bottom as f32,
            top as f32,
            near as f32,
            far as f32,
        );
        self.current_stack(call)?.multiply(m);
        Ok(())
    }

    pub fn frustum(&mut self, left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> Result<()> {
        let call = "glFrustum";
        if near <= 0.0 || far <= 0.0 || left == right || bottom == top || near == far {
            return Err(GlError::UnsupportedValue {
                call,
                param: "clip volume",
                value: 0,
            });
        }
        let m = Mat4::frustum(
            left as f32,
            right as f32,
            bottom as f32,
            top as f32,
            near as f32,
            far as f32,
        );
        self.current_stack(call)?.multiply(m);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ContextConfig;
    use crate::context::GlContext;
    use crate::device::RecordingDevice;
    use crate::error::GlError;
    use crate::gl;
    use crate::state::matrix::Mat4;

    fn context() -> GlContext<RecordingDevice> {
        GlContext::new(RecordingDevice::new(31, 16), ContextConfig::default()).unwrap()
    }

    #[test]
    fn each_mode_addresses_its_own_stack() {
        let mut ctx = context();
        ctx.matrix_mode(gl::PROJECTION).unwrap();
        ctx.translate_f(1.0, 0.0, 0.0).unwrap();
        ctx.matrix_mode(gl::MODELVIEW).unwrap();
        ctx.scale_f(2.0, 2.0, 2.0).unwrap();
        ctx.active_texture(gl::TEXTURE0 + 1).unwrap();
        ctx.matrix_mode(gl::TEXTURE).unwrap();
        ctx.translate_f(0.0, 0.5, 0.0).unwrap();

        let m = ctx.matrices();
        assert_eq!(*m.projection(), Mat4::translation(1.0, 0.0, 0.0));
        assert_eq!(*m.modelview(), Mat4::scaling(2.0, 2.0, 2.0));
        assert_eq!(m.texture(0), Mat4::IDENTITY);
        assert_eq!(m.texture(1), Mat4::translation(0.0, 0.5, 0.0));
    }

    #[test]
    fn push_pop_restores_the_top() {
        let mut ctx = context();
        ctx.push_matrix().unwrap();
        ctx.rotate_f(90.0, 0.0, 0.0, 1.0).unwrap();
        assert_ne!(*ctx.matrices().modelview(), Mat4::IDENTITY);
        ctx.pop_matrix().unwrap();
        assert_eq!(*ctx.matrices().modelview(), Mat4::IDENTITY);
        assert!(matches!(
            ctx.pop_matrix(),
            Err(GlError::MatrixStackUnderflow { call: "glPopMatrix" })
        ));
    }

    #[test]
    fn stack_depth_is_bounded() {
        let config = ContextConfig {
            matrix_stack_depth: 2,
            ..ContextConfig::default()
        };
        let mut ctx = GlContext::new(RecordingDevice::new(31, 16), config).unwrap();
        ctx.push_matrix().unwrap();
        assert!(matches!(
            ctx.push_matrix(),
            Err(GlError::MatrixStackOverflow { depth: 2, .. })
        ));
    }

    #[test]
    fn modelview_units_are_bounded_by_config() {
        let mut ctx = context();
        ctx.matrix_mode(gl::MODELVIEW1_ARB).unwrap();
        assert!(matches!(
            ctx.matrix_mode(gl::MODELVIEW2_ARB + 5),
            Err(GlError::CapabilityOutOfRange { what: "modelview matrix", index: 7, limit: 4, .. })
        ));
    }

    #[test]
    fn load_matrix_is_column_major() {
        let mut ctx = context();
        let mut m = [0.0f32; 16];
        m[0] = 1.0;
        m[5] = 1.0;
        m[10] = 1.0;
        m[15] = 1.0;
        m[12] = 7.0;
        ctx.load_matrix_f(&m).unwrap();
        assert_eq!(*ctx.matrices().modelview(), Mat4::translation(7.0, 0.0, 0.0));
        ctx.load_identity().unwrap();
        assert_eq!(*ctx.matrices().modelview(), Mat4::IDENTITY);
    }
}
