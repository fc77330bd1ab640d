use crate::device::Device;
use crate::error::{GlError, Result};
use crate::gl;
use crate::state::fixed_function::spot_cos_cutoff;
use crate::state::translate;

use super::{leading, GlContext};

impl<D: Device> GlContext<D> {
    pub fn light_f(&mut self, light: u32, pname: u32, value: f32) -> Result<()> {
        self.light("glLightf", light, pname, &[value])
    }

    pub fn light_fv(&mut self, light: u32, pname: u32, params: &[f32]) -> Result<()> {
        self.light("glLightfv", light, pname, params)
    }

    /// Positions and spot directions are stored in eye space, transformed by
    /// the modelview matrix current at call time.
    fn light(&mut self, call: &'static str, light: u32, pname: u32, params: &[f32]) -> Result<()> {
        self.outside_begin_end(call)?;
        let index = self.light_index(call, light)?;
        let modelview = *self.matrices.modelview();
        let target = &mut self.fixed.lights[index];
        match pname {
            gl::AMBIENT => target.ambient = leading(call, "ambient", params)?,
            gl::DIFFUSE => target.diffuse = leading(call, "diffuse", params)?,
            gl::SPECULAR => target.specular = leading(call, "specular", params)?,
            gl::POSITION => target.position = modelview.transform(leading(call, "position", params)?),
            gl::SPOT_DIRECTION => {
                let [x, y, z] = leading::<3>(call, "spot direction", params)?;
                let [ex, ey, ez, _] = modelview.transform([x, y, z, 0.0]);
                target.spot_direction = [ex, ey, ez];
            }
            gl::SPOT_EXPONENT => {
                let [exponent] = leading::<1>(call, "spot exponent", params)?;
                if !(0.0..=128.0).contains(&exponent) {
                    return Err(GlError::UnsupportedValue {
                        call,
                        param: "spot exponent",
                        value: exponent as i64,
                    });
                }
                target.spot_exponent = exponent;
            }
            gl::SPOT_CUTOFF => {
                let [cutoff] = leading::<1>(call, "spot cutoff", params)?;
                if !((0.0..=90.0).contains(&cutoff) || cutoff == 180.0) {
                    return Err(GlError::UnsupportedValue {
                        call,
                        param: "spot cutoff",
                        value: cutoff as i64,
                    });
                }
                target.spot_cos_cutoff = spot_cos_cutoff(cutoff);
            }
            gl::CONSTANT_ATTENUATION => target.attenuation[0] = leading::<1>(call, "attenuation", params)?[0],
            gl::LINEAR_ATTENUATION => target.attenuation[1] = leading::<1>(call, "attenuation", params)?[0],
            gl::QUADRATIC_ATTENUATION => target.attenuation[2] = leading::<1>(call, "attenuation", params)?[0],
            other => return Err(GlError::unsupported(call, "light parameter", other)),
        }
        Ok(())
    }

    pub fn light_model_f(&mut self, pname: u32, value: f32) -> Result<()> {
        self.light_model("glLightModelf", pname, &[value])
    }

    pub fn light_model_fv(&mut self, pname: u32, params: &[f32]) -> Result<()> {
        self.light_model("glLightModelfv", pname, params)
    }

    fn light_model(&mut self, call: &'static str, pname: u32, params: &[f32]) -> Result<()> {
        self.outside_begin_end(call)?;
        let model = &mut self.fixed.light_model;
        match pname {
            gl::LIGHT_MODEL_AMBIENT => model.ambient = leading(call, "light model ambient", params)?,
            gl::LIGHT_MODEL_LOCAL_VIEWER => model.local_viewer = leading::<1>(call, "local viewer", params)?[0] != 0.0,
            gl::LIGHT_MODEL_TWO_SIDE => model.two_side = leading::<1>(call, "two side", params)?[0] != 0.0,
            gl::LIGHT_MODEL_COLOR_CONTROL => {
                model.separate_specular = match leading::<1>(call, "color control", params)?[0] as u32 {
                    gl::SEPARATE_SPECULAR_COLOR => true,
                    gl::SINGLE_COLOR => false,
                    other => return Err(GlError::unsupported(call, "color control", other)),
                };
            }
            other => return Err(GlError::unsupported(call, "light model parameter", other)),
        }
        Ok(())
    }

    pub fn material_f(&mut self, face: u32, pname: u32, value: f32) -> Result<()> {
        self.material("glMaterialf", face, pname, &[value])
    }

    /// Allowed between `Begin` and `End`.
    pub fn material_fv(&mut self, face: u32, pname: u32, params: &[f32]) -> Result<()> {
        self.material("glMaterialfv", face, pname, params)
    }

    fn material(&mut self, call: &'static str, face: u32, pname: u32, params: &[f32]) -> Result<()> {
        let face = translate::material_face(call, face)?;
        match pname {
            gl::AMBIENT => {
                let value = leading::<4>(call, "ambient", params)?;
                self.fixed.update_materials(face, |m| m.ambient = value);
            }
            gl::DIFFUSE => {
                let value = leading::<4>(call, "diffuse", params)?;
                self.fixed.update_materials(face, |m| m.diffuse = value);
            }
            gl::AMBIENT_AND_DIFFUSE => {
                let value = leading::<4>(call, "ambient and diffuse", params)?;
                self.fixed.update_materials(face, |m| {
                    m.ambient = value;
                    m.diffuse = value;
                });
            }
            gl::SPECULAR => {
                let value = leading::<4>(call, "specular", params)?;
                self.fixed.update_materials(face, |m| m.specular = value);
            }
            gl::EMISSION => {
                let value = leading::<4>(call, "emission", params)?;
                self.fixed.update_materials(face, |m| m.emission = value);
            }
            gl::SHININESS => {
                let [shininess] = leading::<1>(call, "shininess", params)?;
                if !(0.0..=128.0).contains(&shininess) {
                    return Err(GlError::UnsupportedValue {
                        call,
                        param: "shininess",
                        value: shininess as i64,
                    });
                }
                self.fixed.update_materials(face, |m| m.shininess = shininess);
            }
            // Color-index lighting has no device equivalent.
            other => return Err(GlError::unsupported(call, "material parameter", other)),
        }
        Ok(())
    }

    pub fn color_material(&mut self, face: u32, mode: u32) -> Result<()> {
        let call = "glColorMaterial";
        self.outside_begin_end(call)?;
        let face = translate::material_face(call, face)?;
        let mode = translate::color_material_mode(call, mode)?;
        self.fixed.color_material.face = face;
        self.fixed.color_material.mode = mode;
        Ok(())
    }

    pub fn shade_model(&mut self, mode: u32) -> Result<()> {
        let call = "glShadeModel";
        self.outside_begin_end(call)?;
        self.fixed.shade_model = translate::shade_model(call, mode)?;
        Ok(())
    }

    pub fn fog_f(&mut self, pname: u32, value: f32) -> Result<()> {
        self.fog("glFogf", pname, &[value])
    }

    pub fn fog_fv(&mut self, pname: u32, params: &[f32]) -> Result<()> {
        self.fog("glFogfv", pname, params)
    }

    fn fog(&mut self, call: &'static str, pname: u32, params: &[f32]) -> Result<()> {
        self.outside_begin_end(call)?;
        let fog = &mut self.fixed.fog;
        match pname {
            gl::FOG_MODE => fog.mode = translate::fog_mode(call, leading::<1>(call, "fog mode", params)?[0] as u32)?,
            gl::FOG_COORDINATE_SOURCE => {
                fog.coord_source =
                    translate::fog_coord_source(call, leading::<1>(call, "fog coordinate source", params)?[0] as u32)?
            }
            gl::FOG_DENSITY => {
                let [density] = leading::<1>(call, "fog density", params)?;
                if density < 0.0 {
                    return Err(GlError::UnsupportedValue {
                        call,
                        param: "fog density",
                        value: density as i64,
                    });
                }
                fog.density = density;
            }
            gl::FOG_START => fog.start = leading::<1>(call, "fog start", params)?[0],
            gl::FOG_END => fog.end = leading::<1>(call, "fog end", params)?[0],
            gl::FOG_COLOR => fog.color = leading::<4>(call, "fog color", params)?.map(|c| c.clamp(0.0, 1.0)),
            other => return Err(GlError::unsupported(call, "fog parameter", other)),
        }
        Ok(())
    }

    pub fn alpha_func(&mut self, func: u32, reference: f32) -> Result<()> {
        let call = "glAlphaFunc";
        self.outside_begin_end(call)?;
        self.fixed.alpha_test.func = translate::compare_func(call, func)?;
        self.fixed.alpha_test.reference = reference.clamp(0.0, 1.0);
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
    use crate::state::fixed_function::{ColorMaterialMode, FogMode, LightType, MaterialFace};

    fn context() -> GlContext<RecordingDevice> {
        GlContext::new(RecordingDevice::new(31, 16), ContextConfig::default()).unwrap()
    }

    #[test]
    fn light_position_is_stored_in_eye_space() {
        let mut ctx = context();
        ctx.translate_f(1.0, 2.0, 3.0).unwrap();
        ctx.light_fv(gl::LIGHT0 + 1, gl::POSITION, &[0.0, 0.0, 0.0, 1.0]).unwrap();
        ctx.light_fv(gl::LIGHT0 + 1, gl::SPOT_DIRECTION, &[0.0, 0.0, -1.0]).unwrap();
        let light = &ctx.fixed_function().lights[1];
        assert_eq!(light.position, [1.0, 2.0, 3.0, 1.0]);
        // Directions ignore translation.
        assert_eq!(light.spot_direction, [0.0, 0.0, -1.0]);
        assert_eq!(light.light_type(), LightType::Point);
    }

    #[test]
    fn spot_cutoff_is_stored_as_cosine() {
        let mut ctx = context();
        ctx.light_f(gl::LIGHT0, gl::SPOT_CUTOFF, 60.0).unwrap();
        assert!((ctx.fixed_function().lights[0].spot_cos_cutoff - 0.5).abs() < 1e-6);
        ctx.light_f(gl::LIGHT0, gl::SPOT_CUTOFF, 180.0).unwrap();
        assert_eq!(ctx.fixed_function().lights[0].spot_cos_cutoff, -1.0);
        assert!(matches!(
            ctx.light_f(gl::LIGHT0, gl::SPOT_CUTOFF, 120.0),
            Err(GlError::UnsupportedValue { param: "spot cutoff", .. })
        ));
    }

    #[test]
    fn color_control_only_separates_for_separate_specular() {
        let mut ctx = context();
        ctx.light_model_f(gl::LIGHT_MODEL_COLOR_CONTROL, gl::SEPARATE_SPECULAR_COLOR as f32)
            .unwrap();
        assert!(ctx.fixed_function().light_model.separate_specular);
        ctx.light_model_f(gl::LIGHT_MODEL_COLOR_CONTROL, gl::SINGLE_COLOR as f32)
            .unwrap();
        assert!(!ctx.fixed_function().light_model.separate_specular);
        assert!(ctx
            .light_model_f(gl::LIGHT_MODEL_COLOR_CONTROL, gl::FLAT as f32)
            .is_err());
    }

    #[test]
    fn materials_honor_face_and_reject_color_indexes() {
        let mut ctx = context();
        ctx.material_fv(gl::BACK, gl::AMBIENT_AND_DIFFUSE, &[0.1, 0.2, 0.3, 1.0])
            .unwrap();
        let state = ctx.fixed_function();
        assert_eq!(state.back_material().diffuse, [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(state.front_material().diffuse, [0.8, 0.8, 0.8, 1.0]);
        assert!(matches!(
            ctx.material_fv(gl::FRONT, gl::COLOR_INDEXES, &[0.0, 1.0, 2.0]),
            Err(GlError::UnsupportedEnum { param: "material parameter", .. })
        ));
        assert!(ctx.material_fv(gl::FRONT, gl::SPECULAR, &[1.0]).is_err());
    }

    #[test]
    fn color_material_and_fog_translate_tokens() {
        let mut ctx = context();
        ctx.color_material(gl::FRONT, gl::EMISSION).unwrap();
        assert_eq!(ctx.fixed_function().color_material.face, MaterialFace::Front);
        assert_eq!(ctx.fixed_function().color_material.mode, ColorMaterialMode::Emission);

        ctx.fog_f(gl::FOG_MODE, gl::LINEAR as f32).unwrap();
        ctx.fog_fv(gl::FOG_COLOR, &[2.0, 0.5, -1.0, 1.0]).unwrap();
        let fog = ctx.fixed_function().fog;
        assert_eq!(fog.mode, FogMode::Linear);
        assert_eq!(fog.color, [1.0, 0.5, 0.0, 1.0]);
        assert!(ctx.fog_f(gl::FOG_DENSITY, -1.0).is_err());
    }
}
