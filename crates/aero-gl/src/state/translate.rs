//! Legacy enumerator → device token translation.
//!
//! Every function is total over its documented input domain and returns
//! [`GlError::UnsupportedEnum`] naming the call and parameter for anything
//! outside it. There is deliberately no fallback arm that maps to a default.

use super::fixed_function::{ColorMaterialMode, FogCoordSource, FogMode, MaterialFace};
use super::render::ShadeModel;
use super::topology::GlPrimitive;
use crate::error::{GlError, Result};
use crate::gl;
use crate::objects::texture::{BaseFormat, MinFilter, TextureFormatInfo, TextureTarget};
use crate::texture_unit::{CombineFunc, CombineOperand, CombineSource, TexEnvMode, TexGenMode};
use crate::vertex::{ComponentType, IndexType};

pub fn primitive(call: &'static str, value: u32) -> Result<GlPrimitive> {
    Ok(match value {
        gl::POINTS => GlPrimitive::Points,
        gl::LINES => GlPrimitive::Lines,
        gl::LINE_LOOP => GlPrimitive::LineLoop,
        gl::LINE_STRIP => GlPrimitive::LineStrip,
        gl::TRIANGLES => GlPrimitive::Triangles,
        gl::TRIANGLE_STRIP => GlPrimitive::TriangleStrip,
        gl::TRIANGLE_FAN => GlPrimitive::TriangleFan,
        gl::QUADS => GlPrimitive::Quads,
        gl::QUAD_STRIP => GlPrimitive::QuadStrip,
        gl::POLYGON => GlPrimitive::Polygon,
        other => return Err(GlError::unsupported(call, "primitive mode", other)),
    })
}

pub fn shade_model(call: &'static str, value: u32) -> Result<ShadeModel> {
    Ok(match value {
        gl::FLAT => ShadeModel::Flat,
        gl::SMOOTH => ShadeModel::Smooth,
        other => return Err(GlError::unsupported(call, "shade model", other)),
    })
}

/// `FRONT_AND_BACK` culling has no device equivalent.
pub fn cull_face(call: &'static str, value: u32) -> Result<wgpu::Face> {
    Ok(match value {
        gl::FRONT => wgpu::Face::Front,
        gl::BACK => wgpu::Face::Back,
        other => return Err(GlError::unsupported(call, "cull face", other)),
    })
}

pub fn front_face(call: &'static str, value: u32) -> Result<wgpu::FrontFace> {
    Ok(match value {
        gl::CW => wgpu::FrontFace::Cw,
        gl::CCW => wgpu::FrontFace::Ccw,
        other => return Err(GlError::unsupported(call, "front face", other)),
    })
}

pub fn compare_func(call: &'static str, value: u32) -> Result<wgpu::CompareFunction> {
    Ok(match value {
        gl::NEVER => wgpu::CompareFunction::Never,
        gl::LESS => wgpu::CompareFunction::Less,
        gl::EQUAL => wgpu::CompareFunction::Equal,
        gl::LEQUAL => wgpu::CompareFunction::LessEqual,
        gl::GREATER => wgpu::CompareFunction::Greater,
        gl::NOTEQUAL => wgpu::CompareFunction::NotEqual,
        gl::GEQUAL => wgpu::CompareFunction::GreaterEqual,
        gl::ALWAYS => wgpu::CompareFunction::Always,
        other => return Err(GlError::unsupported(call, "compare function", other)),
    })
}

pub fn stencil_op(call: &'static str, value: u32) -> Result<wgpu::StencilOperation> {
    Ok(match value {
        gl::KEEP => wgpu::StencilOperation::Keep,
        gl::ZERO => wgpu::StencilOperation::Zero,
        gl::REPLACE => wgpu::StencilOperation::Replace,
        gl::INCR => wgpu::StencilOperation::IncrementClamp,
        gl::DECR => wgpu::StencilOperation::DecrementClamp,
        gl::INVERT => wgpu::StencilOperation::Invert,
        gl::INCR_WRAP => wgpu::StencilOperation::IncrementWrap,
        gl::DECR_WRAP => wgpu::StencilOperation::DecrementWrap,
        other => return Err(GlError::unsupported(call, "stencil operation", other)),
    })
}

/// The device has a single blend constant, so the alpha-only constant
/// factors cannot be expressed.
pub fn blend_factor(call: &'static str, value: u32) -> Result<wgpu::BlendFactor> {
    Ok(match value {
        gl::ZERO => wgpu::BlendFactor::Zero,
        gl::ONE => wgpu::BlendFactor::One,
        gl::SRC_COLOR => wgpu::BlendFactor::Src,
        gl::ONE_MINUS_SRC_COLOR => wgpu::BlendFactor::OneMinusSrc,
        gl::SRC_ALPHA => wgpu::BlendFactor::SrcAlpha,
        gl::ONE_MINUS_SRC_ALPHA => wgpu::BlendFactor::OneMinusSrcAlpha,
        gl::DST_ALPHA => wgpu::BlendFactor::DstAlpha,
        gl::ONE_MINUS_DST_ALPHA => wgpu::BlendFactor::OneMinusDstAlpha,
        gl::DST_COLOR => wgpu::BlendFactor::Dst,
        gl::ONE_MINUS_DST_COLOR => wgpu::BlendFactor::OneMinusDst,
        gl::SRC_ALPHA_SATURATE => wgpu::BlendFactor::SrcAlphaSaturated,
        gl::CONSTANT_COLOR => wgpu::BlendFactor::Constant,
        gl::ONE_MINUS_CONSTANT_COLOR => wgpu::BlendFactor::OneMinusConstant,
        other => return Err(GlError::unsupported(call, "blend factor", other)),
    })
}

pub fn blend_equation(call: &'static str, value: u32) -> Result<wgpu::BlendOperation> {
    Ok(match value {
        gl::FUNC_ADD => wgpu::BlendOperation::Add,
        gl::FUNC_SUBTRACT => wgpu::BlendOperation::Subtract,
        gl::FUNC_REVERSE_SUBTRACT => wgpu::BlendOperation::ReverseSubtract,
        gl::MIN => wgpu::BlendOperation::Min,
        gl::MAX => wgpu::BlendOperation::Max,
        other => return Err(GlError::unsupported(call, "blend equation", other)),
    })
}

pub fn min_filter(call: &'static str, value: u32) -> Result<MinFilter> {
    use wgpu::FilterMode::{Linear, Nearest};
    let (filter, mipmap) = match value {
        gl::NEAREST => (Nearest, None),
        gl::LINEAR => (Linear, None),
        gl::NEAREST_MIPMAP_NEAREST => (Nearest, Some(Nearest)),
        gl::LINEAR_MIPMAP_NEAREST => (Linear, Some(Nearest)),
        gl::NEAREST_MIPMAP_LINEAR => (Nearest, Some(Linear)),
        gl::LINEAR_MIPMAP_LINEAR => (Linear, Some(Linear)),
        other => return Err(GlError::unsupported(call, "minification filter", other)),
    };
    Ok(MinFilter { filter, mipmap })
}

pub fn mag_filter(call: &'static str, value: u32) -> Result<wgpu::FilterMode> {
    Ok(match value {
        gl::NEAREST => wgpu::FilterMode::Nearest,
        gl::LINEAR => wgpu::FilterMode::Linear,
        other => return Err(GlError::unsupported(call, "magnification filter", other)),
    })
}

/// Legacy `CLAMP` samples the border texels in half the cases; edge
/// clamping is the closest device mode.
pub fn address_mode(call: &'static str, value: u32) -> Result<wgpu::AddressMode> {
    Ok(match value {
        gl::REPEAT => wgpu::AddressMode::Repeat,
        gl::CLAMP | gl::CLAMP_TO_EDGE => wgpu::AddressMode::ClampToEdge,
        gl::CLAMP_TO_BORDER => wgpu::AddressMode::ClampToBorder,
        gl::MIRRORED_REPEAT => wgpu::AddressMode::MirrorRepeat,
        other => return Err(GlError::unsupported(call, "wrap mode", other)),
    })
}

/// Targets accepted by bind, enable and parameter calls.
pub fn texture_target(call: &'static str, value: u32) -> Result<TextureTarget> {
    Ok(match value {
        gl::TEXTURE_1D => TextureTarget::Texture1D,
        gl::TEXTURE_2D => TextureTarget::Texture2D,
        gl::TEXTURE_3D => TextureTarget::Texture3D,
        gl::TEXTURE_CUBE_MAP => TextureTarget::CubeMap,
        gl::TEXTURE_RECTANGLE => TextureTarget::Rectangle,
        other => return Err(GlError::unsupported(call, "texture target", other)),
    })
}

/// Cube face → array layer, in +X, -X, +Y, -Y, +Z, -Z order.
pub fn cube_face(call: &'static str, value: u32) -> Result<u32> {
    Ok(match value {
        gl::TEXTURE_CUBE_MAP_POSITIVE_X => 0,
        gl::TEXTURE_CUBE_MAP_NEGATIVE_X => 1,
        gl::TEXTURE_CUBE_MAP_POSITIVE_Y => 2,
        gl::TEXTURE_CUBE_MAP_NEGATIVE_Y => 3,
        gl::TEXTURE_CUBE_MAP_POSITIVE_Z => 4,
        gl::TEXTURE_CUBE_MAP_NEGATIVE_Z => 5,
        other => return Err(GlError::unsupported(call, "cube map face", other)),
    })
}

/// Targets accepted by image specification calls: plain 2D-style targets
/// address layer 0, cube faces address their own layer.
pub fn image_target(call: &'static str, value: u32) -> Result<(TextureTarget, u32)> {
    match value {
        gl::TEXTURE_1D | gl::TEXTURE_2D | gl::TEXTURE_3D | gl::TEXTURE_RECTANGLE => {
            Ok((texture_target(call, value)?, 0))
        }
        _ => Ok((TextureTarget::CubeMap, cube_face(call, value)?)),
    }
}

pub fn internal_format(call: &'static str, value: u32) -> Result<TextureFormatInfo> {
    use wgpu::TextureFormat as F;
    let (format, base, compressed) = match value {
        gl::RGBA | gl::RGBA8 | 4 => (F::Rgba8Unorm, BaseFormat::Rgba, false),
        gl::RGB | gl::RGB8 | 3 => (F::Rgba8Unorm, BaseFormat::Rgb, false),
        gl::BGRA => (F::Bgra8Unorm, BaseFormat::Rgba, false),
        gl::ALPHA | gl::ALPHA8 => (F::R8Unorm, BaseFormat::Alpha, false),
        gl::LUMINANCE | gl::LUMINANCE8 | 1 => (F::R8Unorm, BaseFormat::Luminance, false),
        gl::LUMINANCE_ALPHA | gl::LUMINANCE8_ALPHA8 | 2 => {
            (F::Rg8Unorm, BaseFormat::LuminanceAlpha, false)
        }
        gl::INTENSITY | gl::INTENSITY8 => (F::R8Unorm, BaseFormat::Intensity, false),
        gl::DEPTH_COMPONENT16 => (F::Depth16Unorm, BaseFormat::Depth, false),
        gl::DEPTH_COMPONENT | gl::DEPTH_COMPONENT24 => (F::Depth24Plus, BaseFormat::Depth, false),
        gl::DEPTH_COMPONENT32 => (F::Depth32Float, BaseFormat::Depth, false),
        gl::COMPRESSED_RGB_S3TC_DXT1_EXT => (F::Bc1RgbaUnorm, BaseFormat::Rgb, true),
        gl::COMPRESSED_RGBA_S3TC_DXT1_EXT => (F::Bc1RgbaUnorm, BaseFormat::Rgba, true),
        gl::COMPRESSED_RGBA_S3TC_DXT3_EXT => (F::Bc2RgbaUnorm, BaseFormat::Rgba, true),
        gl::COMPRESSED_RGBA_S3TC_DXT5_EXT => (F::Bc3RgbaUnorm, BaseFormat::Rgba, true),
        gl::COMPRESSED_LUMINANCE_LATC1_EXT => (F::Bc4RUnorm, BaseFormat::Luminance, true),
        gl::COMPRESSED_SIGNED_LUMINANCE_LATC1_EXT => (F::Bc4RSnorm, BaseFormat::Luminance, true),
        gl::COMPRESSED_LUMINANCE_ALPHA_LATC2_EXT => {
            (F::Bc5RgUnorm, BaseFormat::LuminanceAlpha, true)
        }
        gl::COMPRESSED_SIGNED_LUMINANCE_ALPHA_LATC2_EXT => {
            (F::Bc5RgSnorm, BaseFormat::LuminanceAlpha, true)
        }
        other => return Err(GlError::unsupported(call, "internal format", other)),
    };
    Ok(TextureFormatInfo {
        format,
        base,
        compressed,
    })
}

pub fn index_type(call: &'static str, value: u32) -> Result<IndexType> {
    Ok(match value {
        gl::UNSIGNED_BYTE => IndexType::U8,
        gl::UNSIGNED_SHORT => IndexType::U16,
        gl::UNSIGNED_INT => IndexType::U32,
        other => return Err(GlError::unsupported(call, "index type", other)),
    })
}

pub fn component_type(call: &'static str, value: u32) -> Result<ComponentType> {
    Ok(match value {
        gl::BYTE => ComponentType::Byte,
        gl::UNSIGNED_BYTE => ComponentType::UnsignedByte,
        gl::SHORT => ComponentType::Short,
        gl::UNSIGNED_SHORT => ComponentType::UnsignedShort,
        gl::INT => ComponentType::Int,
        gl::UNSIGNED_INT => ComponentType::UnsignedInt,
        gl::HALF_FLOAT => ComponentType::HalfFloat,
        gl::FLOAT => ComponentType::Float,
        gl::DOUBLE => ComponentType::Double,
        other => return Err(GlError::unsupported(call, "component type", other)),
    })
}

pub fn fog_mode(call: &'static str, value: u32) -> Result<FogMode> {
    Ok(match value {
        gl::LINEAR => FogMode::Linear,
        gl::EXP => FogMode::Exp,
        gl::EXP2 => FogMode::Exp2,
        other => return Err(GlError::unsupported(call, "fog mode", other)),
    })
}

pub fn fog_coord_source(call: &'static str, value: u32) -> Result<FogCoordSource> {
    Ok(match value {
        gl::FOG_COORDINATE => FogCoordSource::FogCoordinate,
        gl::FRAGMENT_DEPTH => FogCoordSource::FragmentDepth,
        other => return Err(GlError::unsupported(call, "fog coordinate source", other)),
    })
}

pub fn tex_env_mode(call: &'static str, value: u32) -> Result<TexEnvMode> {
    Ok(match value {
        gl::MODULATE | gl::MULT => TexEnvMode::Modulate,
        gl::DECAL => TexEnvMode::Decal,
        gl::REPLACE => TexEnvMode::Replace,
        gl::BLEND => TexEnvMode::Blend,
        gl::ADD => TexEnvMode::Add,
        gl::COMBINE => TexEnvMode::Combine,
        gl::COMBINE4_NV => TexEnvMode::Combine4,
        other => return Err(GlError::unsupported(call, "texture environment mode", other)),
    })
}

/// The dot-product combiners are only valid for the RGB function.
pub fn combine_func(call: &'static str, value: u32, alpha: bool) -> Result<CombineFunc> {
    let param = if alpha { "alpha combiner" } else { "rgb combiner" };
    Ok(match value {
        gl::REPLACE => CombineFunc::Replace,
        gl::MODULATE => CombineFunc::Modulate,
        gl::ADD => CombineFunc::Add,
        gl::ADD_SIGNED => CombineFunc::AddSigned,
        gl::INTERPOLATE => CombineFunc::Interpolate,
        gl::SUBTRACT => CombineFunc::Subtract,
        gl::MODULATE_ADD_ATI => CombineFunc::ModulateAdd,
        gl::MODULATE_SIGNED_ADD_ATI => CombineFunc::ModulateSignedAdd,
        gl::MODULATE_SUBTRACT_ATI => CombineFunc::ModulateSubtract,
        gl::DOT3_RGB if !alpha => CombineFunc::Dot3Rgb,
        gl::DOT3_RGBA if !alpha => CombineFunc::Dot3Rgba,
        other => return Err(GlError::unsupported(call, param, other)),
    })
}

/// `TEXTUREn` crossbar sources must name an existing unit.
pub fn combine_source(call: &'static str, value: u32, texture_units: u32) -> Result<CombineSource> {
    Ok(match value {
        gl::TEXTURE => CombineSource::Texture,
        gl::CONSTANT => CombineSource::Constant,
        gl::PRIMARY_COLOR => CombineSource::PrimaryColor,
        gl::PREVIOUS => CombineSource::Previous,
        gl::ZERO => CombineSource::Zero,
        gl::ONE => CombineSource::One,
        v if (gl::TEXTURE0..gl::TEXTURE0 + 32).contains(&v) => {
            let unit = v - gl::TEXTURE0;
            if unit >= texture_units {
                return Err(GlError::CapabilityOutOfRange {
                    call,
                    what: "texture unit",
                    index: unit,
                    limit: texture_units,
                });
            }
            CombineSource::TextureUnit(unit as u8)
        }
        other => return Err(GlError::unsupported(call, "combiner source", other)),
    })
}

/// Alpha operands only accept the alpha variants.
pub fn combine_operand(call: &'static str, value: u32, alpha: bool) -> Result<CombineOperand> {
    Ok(match value {
        gl::SRC_COLOR if !alpha => CombineOperand::SrcColor,
        gl::ONE_MINUS_SRC_COLOR if !alpha => CombineOperand::OneMinusSrcColor,
        gl::SRC_ALPHA => CombineOperand::SrcAlpha,
        gl::ONE_MINUS_SRC_ALPHA => CombineOperand::OneMinusSrcAlpha,
        other => return Err(GlError::unsupported(call, "combiner operand", other)),
    })
}

/// Sphere mapping only generates S and T; the cube-map modes only S, T and R.
pub fn texgen_mode(call: &'static str, coord: usize, value: u32) -> Result<TexGenMode> {
    Ok(match value {
        gl::EYE_LINEAR => TexGenMode::EyeLinear,
        gl::OBJECT_LINEAR => TexGenMode::ObjectLinear,
        gl::SPHERE_MAP if coord < 2 => TexGenMode::SphereMap,
        gl::NORMAL_MAP if coord < 3 => TexGenMode::NormalMap,
        gl::REFLECTION_MAP if coord < 3 => TexGenMode::ReflectionMap,
        other => return Err(GlError::unsupported(call, "texgen mode", other)),
    })
}

pub fn texgen_coord(call: &'static str, value: u32) -> Result<usize> {
    Ok(match value {
        gl::S => 0,
        gl::T => 1,
        gl::R => 2,
        gl::Q => 3,
        other => return Err(GlError::unsupported(call, "texture coordinate", other)),
    })
}

pub fn material_face(call: &'static str, value: u32) -> Result<MaterialFace> {
    Ok(match value {
        gl::FRONT => MaterialFace::Front,
        gl::BACK => MaterialFace::Back,
        gl::FRONT_AND_BACK => MaterialFace::FrontAndBack,
        other => return Err(GlError::unsupported(call, "face", other)),
    })
}

pub fn color_material_mode(call: &'static str, value: u32) -> Result<ColorMaterialMode> {
    Ok(match value {
        gl::EMISSION => ColorMaterialMode::Emission,
        gl::AMBIENT => ColorMaterialMode::Ambient,
        gl::DIFFUSE => ColorMaterialMode::Diffuse,
        gl::SPECULAR => ColorMaterialMode::Specular,
        gl::AMBIENT_AND_DIFFUSE => ColorMaterialMode::AmbientAndDiffuse,
        other => return Err(GlError::unsupported(call, "color material mode", other)),
    })
}

/// Which matrix stack a `MatrixMode` value selects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatrixMode {
    Projection,
    /// Vertex-blend unit; `MODELVIEW` is unit 0.
    Modelview(u32),
    Texture,
}

pub fn matrix_mode(call: &'static str, value: u32) -> Result<MatrixMode> {
    Ok(match value {
        gl::MODELVIEW => MatrixMode::Modelview(0),
        gl::MODELVIEW1_ARB => MatrixMode::Modelview(1),
        v if (gl::MODELVIEW2_ARB..=gl::MODELVIEW31_ARB).contains(&v) => {
            MatrixMode::Modelview(v - gl::MODELVIEW2_ARB + 2)
        }
        gl::PROJECTION => MatrixMode::Projection,
        gl::TEXTURE => MatrixMode::Texture,
        other => return Err(GlError::unsupported(call, "matrix mode", other)),
    })
}

/// Only filled polygons are rasterized.
pub fn polygon_mode(call: &'static str, value: u32) -> Result<()> {
    match value {
        gl::FILL => Ok(()),
        other => Err(GlError::unsupported(call, "polygon mode", other)),
    }
}
