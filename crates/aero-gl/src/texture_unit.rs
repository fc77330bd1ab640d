//! Per-unit texture environment, bindings and coordinate generation.

use bitflags::bitflags;

use crate::objects::texture::TextureTarget;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TexEnvMode {
    #[default]
    Modulate,
    Decal,
    Replace,
    Blend,
    Add,
    Combine,
    /// Four-argument combiner (`COMBINE4_NV`).
    Combine4,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CombineFunc {
    Replace,
    #[default]
    Modulate,
    Add,
    AddSigned,
    Interpolate,
    Subtract,
    Dot3Rgb,
    Dot3Rgba,
    ModulateAdd,
    ModulateSignedAdd,
    ModulateSubtract,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CombineSource {
    /// This unit's texture.
    Texture,
    /// Another unit's texture (crossbar).
    TextureUnit(u8),
    Constant,
    PrimaryColor,
    Previous,
    Zero,
    One,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CombineOperand {
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TexEnv {
    pub mode: TexEnvMode,
    pub color: [f32; 4],
    pub combine_rgb: CombineFunc,
    pub combine_alpha: CombineFunc,
    pub sources_rgb: [CombineSource; 4],
    pub sources_alpha: [CombineSource; 4],
    pub operands_rgb: [CombineOperand; 4],
    pub operands_alpha: [CombineOperand; 4],
    pub rgb_scale: f32,
    pub alpha_scale: f32,
}

impl Default for TexEnv {
    fn default() -> Self {
        use CombineOperand::*;
        use CombineSource::*;
        Self {
            mode: TexEnvMode::Modulate,
            color: [0.0; 4],
            combine_rgb: CombineFunc::Modulate,
            combine_alpha: CombineFunc::Modulate,
            sources_rgb: [Texture, Previous, Constant, Zero],
            sources_alpha: [Texture, Previous, Constant, Zero],
            operands_rgb: [SrcColor, SrcColor, SrcAlpha, OneMinusSrcColor],
            operands_alpha: [SrcAlpha, SrcAlpha, SrcAlpha, OneMinusSrcAlpha],
            rgb_scale: 1.0,
            alpha_scale: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TexGenMode {
    #[default]
    EyeLinear,
    ObjectLinear,
    SphereMap,
    NormalMap,
    ReflectionMap,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TexGen {
    pub enabled: bool,
    pub mode: TexGenMode,
    pub object_plane: [f32; 4],
    /// Stored premultiplied by the inverse modelview current at set time.
    pub eye_plane: [f32; 4],
}

impl TexGen {
    fn new(coord: usize) -> Self {
        let mut plane = [0.0; 4];
        if coord < 2 {
            plane[coord] = 1.0;
        }
        Self {
            enabled: false,
            mode: TexGenMode::EyeLinear,
            object_plane: plane,
            eye_plane: plane,
        }
    }
}

bitflags! {
    /// Texture targets enabled on a unit.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TargetMask: u8 {
        const TEXTURE_1D = 1 << 0;
        const TEXTURE_2D = 1 << 1;
        const TEXTURE_3D = 1 << 2;
        const CUBE_MAP = 1 << 3;
        const RECTANGLE = 1 << 4;
    }
}

impl TargetMask {
    pub fn of(target: TextureTarget) -> Self {
        match target {
            TextureTarget::Texture1D => TargetMask::TEXTURE_1D,
            TextureTarget::Texture2D => TargetMask::TEXTURE_2D,
            TextureTarget::Texture3D => TargetMask::TEXTURE_3D,
            TextureTarget::CubeMap => TargetMask::CUBE_MAP,
            TextureTarget::Rectangle => TargetMask::RECTANGLE,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextureUnit {
    pub enabled: TargetMask,
    /// Bound texture object name per target, indexed by `TextureTarget::index`.
    pub bindings: [u32; TextureTarget::COUNT],
    pub env: TexEnv,
    pub lod_bias: f32,
    /// S, T, R, Q.
    pub texgen: [TexGen; 4],
}

impl Default for TextureUnit {
    fn default() -> Self {
        Self {
            enabled: TargetMask::empty(),
            bindings: [0; TextureTarget::COUNT],
            env: TexEnv::default(),
            lod_bias: 0.0,
            texgen: [TexGen::new(0), TexGen::new(1), TexGen::new(2), TexGen::new(3)],
        }
    }
}

impl TextureUnit {
    /// The enabled target with the highest precedence:
    /// cube map, 3D, rectangle, 2D, then 1D.
    pub fn active_target(&self) -> Option<TextureTarget> {
        [
            TextureTarget::CubeMap,
            TextureTarget::Texture3D,
            TextureTarget::Rectangle,
            TextureTarget::Texture2D,
            TextureTarget::Texture1D,
        ]
        .into_iter()
        .find(|&target| self.enabled.contains(TargetMask::of(target)))
    }

    pub fn binding(&self, target: TextureTarget) -> u32 {
        self.bindings[target.index()]
    }

    pub fn bind(&mut self, target: TextureTarget, name: u32) {
        self.bindings[target.index()] = name;
    }

    pub fn set_target_enabled(&mut self, target: TextureTarget, enabled: bool) {
        self.enabled.set(TargetMask::of(target), enabled);
    }
}
