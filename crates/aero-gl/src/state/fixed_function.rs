//! The emulated fixed-function state store.
//!
//! Mutators are plain field writes. The legacy API allows any intermediate
//! combination of these values, so nothing here cross-validates fields; the
//! shader synthesizer consumes whatever snapshot exists at draw time.

use super::render::ShadeModel;

pub const MAX_LIGHTS: usize = 8;

const BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LightType {
    Directional,
    Point,
    Spot,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub enabled: bool,
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    /// Eye-space position; `w == 0` marks a directional light.
    pub position: [f32; 4],
    /// Eye-space spot direction.
    pub spot_direction: [f32; 3],
    pub spot_exponent: f32,
    /// Cosine of the cutoff angle; -1 (180 degrees) disables the cone.
    pub spot_cos_cutoff: f32,
    /// (constant, linear, quadratic).
    pub attenuation: [f32; 3],
}

impl Light {
    pub fn new(index: usize) -> Self {
        let primary = if index == 0 { WHITE } else { BLACK };
        Self {
            enabled: false,
            ambient: BLACK,
            diffuse: primary,
            specular: primary,
            position: [0.0, 0.0, 1.0, 0.0],
            spot_direction: [0.0, 0.0, -1.0],
            spot_exponent: 0.0,
            spot_cos_cutoff: -1.0,
            attenuation: [1.0, 0.0, 0.0],
        }
    }

    pub fn light_type(&self) -> LightType {
        if self.position[3] == 0.0 {
            LightType::Directional
        } else if self.spot_cos_cutoff > -1.0 {
            LightType::Spot
        } else {
            LightType::Point
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub emission: [f32; 4],
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: [0.2, 0.2, 0.2, 1.0],
            diffuse: [0.8, 0.8, 0.8, 1.0],
            specular: BLACK,
            emission: BLACK,
            shininess: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightModel {
    pub ambient: [f32; 4],
    pub local_viewer: bool,
    pub two_side: bool,
    pub separate_specular: bool,
}

impl Default for LightModel {
    fn default() -> Self {
        Self {
            ambient: [0.2, 0.2, 0.2, 1.0],
            local_viewer: false,
            two_side: false,
            separate_specular: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaterialFace {
    Front,
    Back,
    FrontAndBack,
}

impl MaterialFace {
    pub fn includes_front(self) -> bool {
        matches!(self, MaterialFace::Front | MaterialFace::FrontAndBack)
    }

    pub fn includes_back(self) -> bool {
        matches!(self, MaterialFace::Back | MaterialFace::FrontAndBack)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorMaterialMode {
    Emission,
    Ambient,
    Diffuse,
    Specular,
    AmbientAndDiffuse,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColorMaterial {
    pub enabled: bool,
    pub face: MaterialFace,
    pub mode: ColorMaterialMode,
}

impl Default for ColorMaterial {
    fn default() -> Self {
        Self {
            enabled: false,
            face: MaterialFace::FrontAndBack,
            mode: ColorMaterialMode::AmbientAndDiffuse,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FogMode {
    Linear,
    #[default]
    Exp,
    Exp2,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FogCoordSource {
    #[default]
    FragmentDepth,
    FogCoordinate,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fog {
    pub enabled: bool,
    pub mode: FogMode,
    pub coord_source: FogCoordSource,
    pub color: [f32; 4],
    pub density: f32,
    pub start: f32,
    pub end: f32,
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: FogMode::Exp,
            coord_source: FogCoordSource::FragmentDepth,
            color: [0.0; 4],
            density: 1.0,
            start: 0.0,
            end: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlphaTest {
    pub enabled: bool,
    pub func: wgpu::CompareFunction,
    pub reference: f32,
}

impl Default for AlphaTest {
    fn default() -> Self {
        Self {
            enabled: false,
            func: wgpu::CompareFunction::Always,
            reference: 0.0,
        }
    }
}

/// Which stages run a user-supplied program instead of a synthesized one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ProgramFlags {
    pub vertex: bool,
    pub fragment: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FixedFunctionState {
    pub lighting: bool,
    pub lights: Vec<Light>,
    /// Front and back materials.
    pub materials: [Material; 2],
    pub light_model: LightModel,
    pub color_material: ColorMaterial,
    pub fog: Fog,
    pub alpha_test: AlphaTest,
    pub normalize: bool,
    pub shade_model: ShadeModel,
    pub programs: ProgramFlags,
}

impl FixedFunctionState {
    pub fn new(lights: usize) -> Self {
        Self {
            lighting: false,
            lights: (0..lights.min(MAX_LIGHTS)).map(Light::new).collect(),
            materials: [Material::default(); 2],
            light_model: LightModel::default(),
            color_material: ColorMaterial::default(),
            fog: Fog::default(),
            alpha_test: AlphaTest::default(),
            normalize: false,
            shade_model: ShadeModel::Smooth,
            programs: ProgramFlags::default(),
        }
    }

    pub fn front_material(&self) -> &Material {
        &self.materials[0]
    }

    pub fn back_material(&self) -> &Material {
        &self.materials[1]
    }

    /// Applies `update` to every material selected by `face`.
    pub fn update_materials(&mut self, face: MaterialFace, mut update: impl FnMut(&mut Material)) {
        if face.includes_front() {
            update(&mut self.materials[0]);
        }
        if face.includes_back() {
            update(&mut self.materials[1]);
        }
    }
}

/// Cosine of a spot cutoff in degrees; 180 maps to exactly -1.
pub fn spot_cos_cutoff(degrees: f32) -> f32 {
    if degrees >= 180.0 {
        -1.0
    } else {
        degrees.to_radians().cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_zero_defaults_to_white() {
        let state = FixedFunctionState::new(8);
        assert_eq!(state.lights[0].diffuse, WHITE);
        assert_eq!(state.lights[1].diffuse, BLACK);
        assert_eq!(state.lights[0].light_type(), LightType::Directional);
    }

    #[test]
    fn light_type_follows_position_and_cutoff() {
        let mut light = Light::new(1);
        light.position = [1.0, 2.0, 3.0, 1.0];
        assert_eq!(light.light_type(), LightType::Point);
        light.spot_cos_cutoff = spot_cos_cutoff(45.0);
        assert_eq!(light.light_type(), LightType::Spot);
        light.spot_cos_cutoff = spot_cos_cutoff(180.0);
        assert_eq!(light.light_type(), LightType::Point);
    }

    #[test]
    fn material_updates_honor_face() {
        let mut state = FixedFunctionState::new(8);
        state.update_materials(MaterialFace::Back, |m| m.shininess = 12.0);
        assert_eq!(state.front_material().shininess, 0.0);
        assert_eq!(state.back_material().shininess, 12.0);
        state.update_materials(MaterialFace::FrontAndBack, |m| m.emission = WHITE);
        assert_eq!(state.front_material().emission, WHITE);
        assert_eq!(state.back_material().emission, WHITE);
    }
}
