use tracing::debug;

use crate::device::Device;
use crate::error::{GlError, Result};
use crate::gl;
use crate::objects::texture::{ImageUpload, RegionUpload, TextureTarget};
use crate::objects::ParamValue;
use crate::state::translate;

use super::{leading, non_negative, GlContext};

/// Dimensionality of an image specification call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ImageDims {
    One,
    Two,
    Three,
}

impl ImageDims {
    fn accepts(self, target: TextureTarget) -> bool {
        match self {
            ImageDims::One => target == TextureTarget::Texture1D,
            ImageDims::Two => matches!(
                target,
                TextureTarget::Texture2D | TextureTarget::Rectangle | TextureTarget::CubeMap
            ),
            ImageDims::Three => target == TextureTarget::Texture3D,
        }
    }
}

/// Arguments shared by the `TexImage*` calls.
struct ImageSpec<'a> {
    target: u32,
    level: i32,
    internal_format: u32,
    size: [i32; 3],
    border: i32,
    layout: Option<(u32, u32)>,
    data: Option<&'a [u8]>,
}

fn scale(call: &'static str, param: &'static str, value: f32) -> Result<f32> {
    match value {
        v if v == 1.0 || v == 2.0 || v == 4.0 => Ok(v),
        v => Err(GlError::UnsupportedValue {
            call,
            param,
            value: v as i64,
        }),
    }
}

impl<D: Device> GlContext<D> {
    pub fn active_texture(&mut self, texture: u32) -> Result<()> {
        let call = "glActiveTexture";
        self.outside_begin_end(call)?;
        self.active_unit = self.unit_index(call, texture, self.config.texture_units)?;
        Ok(())
    }

    pub fn client_active_texture(&mut self, texture: u32) -> Result<()> {
        let call = "glClientActiveTexture";
        self.outside_begin_end(call)?;
        self.client_active_unit = self.unit_index(call, texture, self.config.client_texcoord_units)?;
        Ok(())
    }

    fn unit_index(&self, call: &'static str, texture: u32, limit: u32) -> Result<u32> {
        let index = texture.wrapping_sub(gl::TEXTURE0);
        if index >= limit {
            return Err(GlError::CapabilityOutOfRange {
                call,
                what: "texture unit",
                index,
                limit,
            });
        }
        Ok(index)
    }

    /// Scalar texture environment parameters of the active unit.
    pub fn tex_env(&mut self, target: u32, pname: u32, value: ParamValue) -> Result<()> {
        let call = "glTexEnv";
        self.outside_begin_end(call)?;
        let texture_units = self.config.texture_units;
        match target {
            gl::TEXTURE_FILTER_CONTROL => {
                if pname != gl::TEXTURE_LOD_BIAS {
                    return Err(GlError::unsupported(call, "texture filter parameter", pname));
                }
                self.active_unit_mut().lod_bias = value.as_f32();
                return Ok(());
            }
            gl::TEXTURE_ENV => {}
            other => return Err(GlError::unsupported(call, "texture environment target", other)),
        }

        let env = &mut self.units[self.active_unit as usize].env;
        match pname {
            gl::TEXTURE_ENV_MODE => env.mode = translate::tex_env_mode(call, value.as_enum())?,
            gl::COMBINE_RGB => env.combine_rgb = translate::combine_func(call, value.as_enum(), false)?,
            gl::COMBINE_ALPHA => env.combine_alpha = translate::combine_func(call, value.as_enum(), true)?,
            gl::RGB_SCALE => env.rgb_scale = scale(call, "rgb scale", value.as_f32())?,
            gl::ALPHA_SCALE => env.alpha_scale = scale(call, "alpha scale", value.as_f32())?,
            p if (gl::SOURCE0_RGB..=gl::SOURCE3_RGB_NV).contains(&p) => {
                env.sources_rgb[(p - gl::SOURCE0_RGB) as usize] =
                    translate::combine_source(call, value.as_enum(), texture_units)?;
            }
            p if (gl::SOURCE0_ALPHA..=gl::SOURCE3_ALPHA_NV).contains(&p) => {
                env.sources_alpha[(p - gl::SOURCE0_ALPHA) as usize] =
                    translate::combine_source(call, value.as_enum(), texture_units)?;
            }
            p if (gl::OPERAND0_RGB..=gl::OPERAND3_RGB_NV).contains(&p) => {
                env.operands_rgb[(p - gl::OPERAND0_RGB) as usize] =
                    translate::combine_operand(call, value.as_enum(), false)?;
            }
            p if (gl::OPERAND0_ALPHA..=gl::OPERAND3_ALPHA_NV).contains(&p) => {
                env.operands_alpha[(p - gl::OPERAND0_ALPHA) as usize] =
                    translate::combine_operand(call, value.as_enum(), true)?;
            }
            other => return Err(GlError::unsupported(call, "texture environment parameter", other)),
        }
        Ok(())
    }

    /// Vector form; only `TEXTURE_ENV_COLOR` takes more than one value.
    pub fn tex_env_fv(&mut self, target: u32, pname: u32, values: &[f32]) -> Result<()> {
        let call = "glTexEnvfv";
        if target == gl::TEXTURE_ENV && pname == gl::TEXTURE_ENV_COLOR {
            self.outside_begin_end(call)?;
            let color = leading::<4>(call, "color", values)?;
            self.active_unit_mut().env.color = color.map(|c| c.clamp(0.0, 1.0));
            return Ok(());
        }
        let [value] = leading::<1>(call, "value", values)?;
        self.tex_env(target, pname, ParamValue::Float(value))
    }

    pub fn tex_gen(&mut self, coord: u32, pname: u32, value: ParamValue) -> Result<()> {
        let call = "glTexGen";
        self.outside_begin_end(call)?;
        let coord = translate::texgen_coord(call, coord)?;
        if pname != gl::TEXTURE_GEN_MODE {
            return Err(GlError::unsupported(call, "texgen parameter", pname));
        }
        let mode = translate::texgen_mode(call, coord, value.as_enum())?;
        self.active_unit_mut().texgen[coord].mode = mode;
        Ok(())
    }

    /// Plane equations. Eye planes are stored premultiplied by the inverse of
    /// the current modelview matrix, i.e. `p * M^-1`.
    pub fn tex_gen_fv(&mut self, coord: u32, pname: u32, values: &[f32]) -> Result<()> {
        let call = "glTexGenfv";
        self.outside_begin_end(call)?;
        if pname == gl::TEXTURE_GEN_MODE {
            let [mode] = leading::<1>(call, "mode", values)?;
            return self.tex_gen(coord, pname, ParamValue::Float(mode));
        }
        let coord = translate::texgen_coord(call, coord)?;
        let plane = leading::<4>(call, "plane", values)?;
        match pname {
            gl::OBJECT_PLANE => self.active_unit_mut().texgen[coord].object_plane = plane,
            gl::EYE_PLANE => {
                let inverse = self
                    .matrices
                    .modelview()
                    .inverse()
                    .ok_or(GlError::SingularMatrix { call, matrix: "modelview" })?;
                let eye = inverse.transpose().transform(plane);
                self.active_unit_mut().texgen[coord].eye_plane = eye;
            }
            other => return Err(GlError::unsupported(call, "texgen parameter", other)),
        }
        Ok(())
    }

    pub fn gen_textures(&mut self, names: &[u32]) -> Result<()> {
        self.outside_begin_end("glGenTextures")?;
        self.textures.generate(names);
        Ok(())
    }

    pub fn bind_texture(&mut self, target: u32, name: u32) -> Result<()> {
        let call = "glBindTexture";
        self.outside_begin_end(call)?;
        let target = translate::texture_target(call, target)?;
        self.textures.bind(call, target, name)?;
        self.active_unit_mut().bind(target, name);
        Ok(())
    }

    /// Deleted names are unbound from every unit first.
    pub fn delete_textures(&mut self, names: &[u32]) -> Result<()> {
        let call = "glDeleteTextures";
        self.outside_begin_end(call)?;
        for unit in &mut self.units {
            for binding in &mut unit.bindings {
                if names.contains(binding) {
                    *binding = 0;
                }
            }
        }
        self.textures.delete(&mut self.device, names)
    }

    pub fn tex_parameter(&mut self, target: u32, pname: u32, value: ParamValue) -> Result<()> {
        let call = "glTexParameter";
        self.outside_begin_end(call)?;
        let target = translate::texture_target(call, target)?;
        let name = self.units[self.active_unit as usize].binding(target);
        self.textures
            .get_mut(name, target)
            .ok_or(GlError::UnknownObject {
                call,
                kind: "texture",
                name,
            })?
            .set_parameter(call, pname, value)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn tex_image_1d(
        &mut self,
        target: u32,
        level: i32,
        internal_format: u32,
        width: i32,
        border: i32,
        format: u32,
        ty: u32,
        data: Option<&[u8]>,
    ) -> Result<()> {
        self.specify_image(
            "glTexImage1D",
            ImageDims::One,
            ImageSpec {
                target,
                level,
                internal_format,
                size: [width, 1, 1],
                border,
                layout: Some((format, ty)),
                data,
            },
        )
    }

    /// Also accepts the six cube map faces.
    #[allow(clippy::too_many_arguments)]
    pub fn tex_image_2d(
        &mut self,
        target: u32,
        level: i32,
        internal_format: u32,
        width: i32,
        height: i32,
        border: i32,
        format: u32,
        ty: u32,
        data: Option<&[u8]>,
    ) -> Result<()> {
        self.specify_image(
            "glTexImage2D",
            ImageDims::Two,
            ImageSpec {
                target,
                level,
                internal_format,
                size: [width, height, 1],
                border,
                layout: Some((format, ty)),
                data,
            },
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn tex_image_3d(
        &mut self,
        target: u32,
        level: i32,
        internal_format: u32,
        width: i32,
        height: i32,
        depth: i32,
        border: i32,
        format: u32,
        ty: u32,
        data: Option<&[u8]>,
    ) -> Result<()> {
        self.specify_image(
            "glTexImage3D",
            ImageDims::Three,
            ImageSpec {
                target,
                level,
                internal_format,
                size: [width, height, depth],
                border,
                layout: Some((format, ty)),
                data,
            },
        )
    }

    /// Block-compressed data is uploaded as is.
    #[allow(clippy::too_many_arguments)]
    pub fn compressed_tex_image_2d(
        &mut self,
        target: u32,
        level: i32,
        internal_format: u32,
        width: i32,
        height: i32,
        border: i32,
        data: &[u8],
    ) -> Result<()> {
        let call = "glCompressedTexImage2D";
        let info = translate::internal_format(call, internal_format)?;
        if !info.compressed {
            return Err(GlError::UnsupportedTextureFormat {
                call,
                internal_format,
                format: 0,
                ty: 0,
            });
        }
        self.specify_image(
            call,
            ImageDims::Two,
            ImageSpec {
                target,
                level,
                internal_format,
                size: [width, height, 1],
                border,
                layout: None,
                data: Some(data),
            },
        )
    }

    fn specify_image(&mut self, call: &'static str, dims: ImageDims, spec: ImageSpec<'_>) -> Result<()> {
        self.outside_begin_end(call)?;
        let (target, layer) = translate::image_target(call, spec.target)?;
        if !dims.accepts(target) {
            return Err(GlError::unsupported(call, "image target", spec.target));
        }
        if spec.border != 0 {
            return Err(GlError::UnsupportedValue {
                call,
                param: "border",
                value: i64::from(spec.border),
            });
        }
        let format_info = translate::internal_format(call, spec.internal_format)?;
        let [width, height, depth] = spec.size;
        let upload = ImageUpload {
            target,
            layer,
            level: non_negative(call, "level", spec.level)?,
            internal_format: spec.internal_format,
            format_info,
            width: non_negative(call, "width", width)?,
            height: non_negative(call, "height", height)?,
            depth: non_negative(call, "depth", depth)?,
            layout: spec.layout,
            data: spec.data,
        };
        let name = self.units[self.active_unit as usize].binding(target);
        debug!(call, texture = name, level = upload.level, layer, "texture image");
        let Self {
            device,
            textures,
            converter,
            ..
        } = self;
        textures.upload(device, converter.as_ref(), call, name, &upload)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn tex_sub_image_2d(
        &mut self,
        target: u32,
        level: i32,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        data: &[u8],
    ) -> Result<()> {
        let call = "glTexSubImage2D";
        self.outside_begin_end(call)?;
        let (texture_target, layer) = translate::image_target(call, target)?;
        if !ImageDims::Two.accepts(texture_target) {
            return Err(GlError::unsupported(call, "image target", target));
        }
        let region = RegionUpload {
            target: texture_target,
            layer,
            level: non_negative(call, "level", level)?,
            origin: [non_negative(call, "xoffset", x)?, non_negative(call, "yoffset", y)?, 0],
            size: [non_negative(call, "width", width)?, non_negative(call, "height", height)?, 1],
            format,
            ty,
            data,
        };
        let name = self.units[self.active_unit as usize].binding(texture_target);
        let Self {
            device,
            textures,
            converter,
            ..
        } = self;
        textures.upload_region(device, converter.as_ref(), call, name, &region)
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
    use crate::objects::texture::TextureTarget;
    use crate::objects::ParamValue;
    use crate::texture_unit::{CombineFunc, CombineOperand, CombineSource, TexEnvMode, TexGenMode};

    fn context() -> GlContext<RecordingDevice> {
        GlContext::new(RecordingDevice::new(31, 16), ContextConfig::default()).unwrap()
    }

    fn env(ctx: &mut GlContext<RecordingDevice>, pname: u32, value: u32) {
        ctx.tex_env(gl::TEXTURE_ENV, pname, ParamValue::Int(value as i32)).unwrap();
    }

    #[test]
    fn active_texture_is_bounded() {
        let mut ctx = context();
        ctx.active_texture(gl::TEXTURE0 + 15).unwrap();
        assert_eq!(ctx.active_texture_unit(), 15);
        assert!(matches!(
            ctx.active_texture(gl::TEXTURE0 + 16),
            Err(GlError::CapabilityOutOfRange { what: "texture unit", index: 16, limit: 16, .. })
        ));
        assert!(ctx.client_active_texture(gl::TEXTURE0 + 8).is_err());
    }

    #[test]
    fn tex_env_combiner_setup() {
        let mut ctx = context();
        ctx.active_texture(gl::TEXTURE0 + 1).unwrap();
        env(&mut ctx, gl::TEXTURE_ENV_MODE, gl::COMBINE4_NV);
        env(&mut ctx, gl::COMBINE_RGB, gl::ADD);
        env(&mut ctx, gl::SOURCE3_RGB_NV, gl::TEXTURE0 + 2);
        env(&mut ctx, gl::OPERAND0_ALPHA + 1, gl::ONE_MINUS_SRC_ALPHA);
        ctx.tex_env(gl::TEXTURE_ENV, gl::RGB_SCALE, ParamValue::Float(2.0)).unwrap();

        let unit = &ctx.texture_units()[1];
        assert_eq!(unit.env.mode, TexEnvMode::Combine4);
        assert_eq!(unit.env.combine_rgb, CombineFunc::Add);
        assert_eq!(unit.env.sources_rgb[3], CombineSource::TextureUnit(2));
        assert_eq!(unit.env.operands_alpha[1], CombineOperand::OneMinusSrcAlpha);
        assert_eq!(unit.env.rgb_scale, 2.0);
        assert_eq!(ctx.texture_units()[0].env.mode, TexEnvMode::Modulate);
    }

    #[test]
    fn tex_env_rejects_bad_values() {
        let mut ctx = context();
        assert!(matches!(
            ctx.tex_env(gl::TEXTURE_ENV, gl::ALPHA_SCALE, ParamValue::Float(3.0)),
            Err(GlError::UnsupportedValue { param: "alpha scale", value: 3, .. })
        ));
        assert!(ctx
            .tex_env(gl::TEXTURE_ENV, gl::COMBINE_ALPHA, ParamValue::Int(gl::DOT3_RGB as i32))
            .is_err());
        assert!(ctx
            .tex_env(gl::TEXTURE_ENV, gl::OPERAND0_ALPHA, ParamValue::Int(gl::SRC_COLOR as i32))
            .is_err());
        assert!(ctx
            .tex_env(gl::TEXTURE_ENV, gl::SOURCE0_RGB, ParamValue::Int((gl::TEXTURE0 + 16) as i32))
            .is_err());
    }

    #[test]
    fn mult_behaves_as_modulate() {
        let mut ctx = context();
        env(&mut ctx, gl::TEXTURE_ENV_MODE, gl::DECAL);
        env(&mut ctx, gl::TEXTURE_ENV_MODE, gl::MULT);
        assert_eq!(ctx.texture_units()[0].env.mode, TexEnvMode::Modulate);
    }

    #[test]
    fn lod_bias_through_filter_control() {
        let mut ctx = context();
        ctx.tex_env(gl::TEXTURE_FILTER_CONTROL, gl::TEXTURE_LOD_BIAS, ParamValue::Float(-0.5))
            .unwrap();
        assert_eq!(ctx.texture_units()[0].lod_bias, -0.5);
        ctx.tex_env_fv(gl::TEXTURE_ENV, gl::TEXTURE_ENV_COLOR, &[0.5, 2.0, 0.0, 1.0])
            .unwrap();
        assert_eq!(ctx.texture_units()[0].env.color, [0.5, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn eye_plane_is_premultiplied_by_modelview_inverse() {
        let mut ctx = context();
        ctx.translate_f(1.0, 2.0, 3.0).unwrap();
        ctx.tex_gen_fv(gl::S, gl::EYE_PLANE, &[1.0, 0.0, 0.0, 0.0]).unwrap();
        ctx.tex_gen_fv(gl::T, gl::OBJECT_PLANE, &[0.0, 0.0, 1.0, 0.0]).unwrap();
        ctx.tex_gen(gl::R, gl::TEXTURE_GEN_MODE, ParamValue::Int(gl::REFLECTION_MAP as i32))
            .unwrap();

        let texgen = &ctx.texture_units()[0].texgen;
        assert_eq!(texgen[0].eye_plane, [1.0, 0.0, 0.0, -1.0]);
        assert_eq!(texgen[1].object_plane, [0.0, 0.0, 1.0, 0.0]);
        assert_eq!(texgen[2].mode, TexGenMode::ReflectionMap);
        assert!(ctx
            .tex_gen(gl::Q, gl::TEXTURE_GEN_MODE, ParamValue::Int(gl::SPHERE_MAP as i32))
            .is_err());
    }

    #[test]
    fn eye_plane_through_singular_modelview_is_fatal() {
        let mut ctx = context();
        ctx.scale_f(1.0, 0.0, 1.0).unwrap();
        assert!(matches!(
            ctx.tex_gen_fv(gl::S, gl::EYE_PLANE, &[1.0, 0.0, 0.0, 0.0]),
            Err(GlError::SingularMatrix { matrix: "modelview", .. })
        ));
    }

    #[test]
    fn tex_image_creates_storage_for_bound_texture() {
        let mut ctx = context();
        ctx.gen_textures(&[5]).unwrap();
        ctx.bind_texture(gl::TEXTURE_2D, 5).unwrap();
        ctx.tex_image_2d(gl::TEXTURE_2D, 0, gl::RGBA, 2, 2, 0, gl::RGBA, gl::UNSIGNED_BYTE, Some(&[0u8; 16]))
            .unwrap();
        let object = ctx.textures().get(5, TextureTarget::Texture2D).unwrap();
        assert!(object.device.is_some());
        assert_eq!(object.images.len(), 1);

        ctx.tex_sub_image_2d(gl::TEXTURE_2D, 0, 1, 1, 1, 1, gl::RGBA, gl::UNSIGNED_BYTE, &[255u8; 4])
            .unwrap();
        assert_eq!(ctx.device().stats().snapshot().live_textures, 1);
    }

    #[test]
    fn tex_image_rejects_border_and_wrong_dimension() {
        let mut ctx = context();
        ctx.bind_texture(gl::TEXTURE_2D, 1).unwrap();
        assert!(matches!(
            ctx.tex_image_2d(gl::TEXTURE_2D, 0, gl::RGBA, 2, 2, 1, gl::RGBA, gl::UNSIGNED_BYTE, None),
            Err(GlError::UnsupportedValue { param: "border", value: 1, .. })
        ));
        assert!(ctx
            .tex_image_1d(gl::TEXTURE_2D, 0, gl::RGBA, 2, 0, gl::RGBA, gl::UNSIGNED_BYTE, None)
            .is_err());
        assert!(matches!(
            ctx.compressed_tex_image_2d(gl::TEXTURE_2D, 0, gl::RGBA, 4, 4, 0, &[0u8; 64]),
            Err(GlError::UnsupportedTextureFormat { .. })
        ));
    }

    #[test]
    fn cube_faces_address_their_layer() {
        let mut ctx = context();
        ctx.bind_texture(gl::TEXTURE_CUBE_MAP, 9).unwrap();
        ctx.tex_image_2d(
            gl::TEXTURE_CUBE_MAP_NEGATIVE_Y,
            0,
            gl::RGBA,
            1,
            1,
            0,
            gl::RGBA,
            gl::UNSIGNED_BYTE,
            Some(&[0u8; 4]),
        )
        .unwrap();
        let object = ctx.textures().get(9, TextureTarget::CubeMap).unwrap();
        assert!(object.images.contains_key(&(3, 0)));
    }

    #[test]
    fn deleting_unbinds_from_every_unit() {
        let mut ctx = context();
        ctx.bind_texture(gl::TEXTURE_2D, 3).unwrap();
        ctx.active_texture(gl::TEXTURE0 + 4).unwrap();
        ctx.bind_texture(gl::TEXTURE_2D, 3).unwrap();
        ctx.delete_textures(&[3]).unwrap();
        assert!(ctx
            .texture_units()
            .iter()
            .all(|unit| unit.binding(TextureTarget::Texture2D) == 0));
        assert!(ctx.textures().get(3, TextureTarget::Texture2D).is_none());
    }

    #[test]
    fn tex_parameter_applies_anisotropy_quirk() {
        let mut ctx = context();
        ctx.bind_texture(gl::TEXTURE_2D, 2).unwrap();
        ctx.tex_parameter(gl::TEXTURE_2D, gl::TEXTURE_MAX_ANISOTROPY_EXT, ParamValue::Float(8.0))
            .unwrap();
        let object = ctx.textures().get(2, TextureTarget::Texture2D).unwrap();
        assert_eq!(object.params.max_anisotropy, 16);
    }
}
