use std::fmt::Write;
use std::hash::{Hash, Hasher};

use bytemuck::{Pod, Zeroable};

use super::{FixedFunctionSnapshot, MAX_TEXTURE_STAGES};
use crate::objects::texture::{BaseFormat, TextureTarget};
use crate::state::fixed_function::{
    ColorMaterialMode, FogCoordSource, FogMode, LightType, MaterialFace, MAX_LIGHTS,
};
use crate::state::matrix::Mat4;
use crate::state::render::ShadeModel;
use crate::texture_unit::{CombineFunc, CombineOperand, CombineSource, TexEnvMode, TexGenMode};

const FNV1A_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV1A_PRIME: u64 = 0x00000100000001B3;

/// FNV-1a over the `Hash` stream; stable across runs and platforms.
struct Fnv1a(u64);

impl Hasher for Fnv1a {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= u64::from(b);
            self.0 = self.0.wrapping_mul(FNV1A_PRIME);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LightingDesc {
    /// (light index, type) for every enabled light.
    pub lights: Vec<(u8, LightType)>,
    pub two_side: bool,
    pub local_viewer: bool,
    pub separate_specular: bool,
    pub color_material: Option<(MaterialFace, ColorMaterialMode)>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StageDesc {
    pub target: TextureTarget,
    pub base: BaseFormat,
    pub mode: TexEnvMode,
    pub combine_rgb: CombineFunc,
    pub combine_alpha: CombineFunc,
    pub sources_rgb: [CombineSource; 4],
    pub sources_alpha: [CombineSource; 4],
    pub operands_rgb: [CombineOperand; 4],
    pub operands_alpha: [CombineOperand; 4],
    /// S, T, R, Q; `None` when generation is off for the coordinate.
    pub texgen: [Option<TexGenMode>; 4],
}

/// The structural part of the fixed-function state: everything that changes
/// program text. Numeric values travel in [`FixedFunctionGlobals`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FixedFunctionShaderDesc {
    pub texcoord_inputs: u8,
    pub lighting: Option<LightingDesc>,
    pub normalize: bool,
    pub flat: bool,
    pub fog: Option<(FogMode, FogCoordSource)>,
    /// `None` when alpha testing is off or would always pass.
    pub alpha_test: Option<wgpu::CompareFunction>,
    /// One entry per texture unit; `None` for units with texturing off.
    pub stages: Vec<Option<StageDesc>>,
}

impl FixedFunctionShaderDesc {
    pub fn from_snapshot(snapshot: &FixedFunctionSnapshot<'_>) -> Self {
        let state = snapshot.state;
        let lighting = state.lighting.then(|| LightingDesc {
            lights: state
                .lights
                .iter()
                .enumerate()
                .filter(|(_, light)| light.enabled)
                .map(|(i, light)| (i as u8, light.light_type()))
                .collect(),
            two_side: state.light_model.two_side,
            local_viewer: state.light_model.local_viewer,
            separate_specular: state.light_model.separate_specular,
            color_material: state
                .color_material
                .enabled
                .then_some((state.color_material.face, state.color_material.mode)),
        });

        let stages = snapshot
            .units
            .iter()
            .take(MAX_TEXTURE_STAGES)
            .enumerate()
            .map(|(i, unit)| {
                let (target, base) = snapshot.active.get(i).copied().flatten()?;
                let env = &unit.env;
                Some(StageDesc {
                    target,
                    base,
                    mode: env.mode,
                    combine_rgb: env.combine_rgb,
                    combine_alpha: env.combine_alpha,
                    sources_rgb: env.sources_rgb,
                    sources_alpha: env.sources_alpha,
                    operands_rgb: env.operands_rgb,
                    operands_alpha: env.operands_alpha,
                    texgen: unit.texgen.map(|gen| gen.enabled.then_some(gen.mode)),
                })
            })
            .collect();

        let alpha = state.alpha_test;
        Self {
            texcoord_inputs: snapshot.texcoord_inputs,
            lighting,
            normalize: state.normalize,
            flat: state.shade_model == ShadeModel::Flat,
            fog: state.fog.enabled.then_some((state.fog.mode, state.fog.coord_source)),
            alpha_test: (alpha.enabled && alpha.func != wgpu::CompareFunction::Always).then_some(alpha.func),
            stages,
        }
    }

    pub fn state_hash(&self) -> u64 {
        let mut hasher = Fnv1a(FNV1A_OFFSET_BASIS);
        self.hash(&mut hasher);
        hasher.finish()
    }

    fn active_stages(&self) -> impl Iterator<Item = (usize, &StageDesc)> + '_ {
        self.stages
            .iter()
            .enumerate()
            .filter_map(|(unit, stage)| stage.as_ref().map(|stage| (unit, stage)))
    }

    fn two_side(&self) -> bool {
        self.lighting.as_ref().is_some_and(|l| l.two_side)
    }

    fn needs_eye_normal(&self) -> bool {
        self.lighting.is_some()
            || self.active_stages().any(|(_, stage)| {
                stage.texgen.iter().flatten().any(|mode| {
                    matches!(
                        mode,
                        TexGenMode::SphereMap | TexGenMode::NormalMap | TexGenMode::ReflectionMap
                    )
                })
            })
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct LightParams {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub position: [f32; 4],
    /// xyz: direction, w: exponent.
    pub spot: [f32; 4],
    /// x: cos(cutoff), yzw: constant, linear, quadratic.
    pub attenuation: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct MaterialParams {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub emission: [f32; 4],
    /// x: shininess.
    pub shininess: [f32; 4],
}

/// Uniform block shared by both synthesized stages. Mirrors `Globals` in
/// [`WGSL_SHARED`]; every member is 16-byte aligned so the layouts agree.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FixedFunctionGlobals {
    pub modelview: Mat4,
    pub mvp: Mat4,
    pub normal_matrix: Mat4,
    pub texture_matrices: [Mat4; MAX_TEXTURE_STAGES],
    pub lights: [LightParams; MAX_LIGHTS],
    /// Front, back.
    pub materials: [MaterialParams; 2],
    pub light_model_ambient: [f32; 4],
    pub fog_color: [f32; 4],
    /// density, start, end, 1 / (end - start).
    pub fog_params: [f32; 4],
    /// x: reference.
    pub alpha_test: [f32; 4],
    pub env_colors: [[f32; 4]; MAX_TEXTURE_STAGES],
    /// x: rgb scale, y: alpha scale.
    pub env_scales: [[f32; 4]; MAX_TEXTURE_STAGES],
    /// Indexed by `unit * 4 + coord`.
    pub texgen_object: [[f32; 4]; MAX_TEXTURE_STAGES * 4],
    pub texgen_eye: [[f32; 4]; MAX_TEXTURE_STAGES * 4],
}

impl FixedFunctionGlobals {
    pub fn from_snapshot(snapshot: &FixedFunctionSnapshot<'_>) -> Self {
        let state = snapshot.state;
        let mut g = Self::zeroed();

        let modelview = *snapshot.matrices.modelview();
        g.modelview = modelview;
        g.mvp = *snapshot.matrices.projection() * modelview;
        g.normal_matrix = modelview.normal_matrix();
        for (unit, m) in g.texture_matrices.iter_mut().enumerate() {
            *m = snapshot.matrices.texture(unit);
        }

        for (dst, light) in g.lights.iter_mut().zip(&state.lights) {
            let [dx, dy, dz] = light.spot_direction;
            let [c, l, q] = light.attenuation;
            *dst = LightParams {
                ambient: light.ambient,
                diffuse: light.diffuse,
                specular: light.specular,
                position: light.position,
                spot: [dx, dy, dz, light.spot_exponent],
                attenuation: [light.spot_cos_cutoff, c, l, q],
            };
        }
        for (dst, material) in g.materials.iter_mut().zip(&state.materials) {
            *dst = MaterialParams {
                ambient: material.ambient,
                diffuse: material.diffuse,
                specular: material.specular,
                emission: material.emission,
                shininess: [material.shininess, 0.0, 0.0, 0.0],
            };
        }
        g.light_model_ambient = state.light_model.ambient;

        let fog = &state.fog;
        let range = fog.end - fog.start;
        let scale = if range != 0.0 { 1.0 / range } else { 0.0 };
        g.fog_color = fog.color;
        g.fog_params = [fog.density, fog.start, fog.end, scale];
        g.alpha_test = [state.alpha_test.reference, 0.0, 0.0, 0.0];

        for (unit, tex) in snapshot.units.iter().take(MAX_TEXTURE_STAGES).enumerate() {
            g.env_colors[unit] = tex.env.color;
            g.env_scales[unit] = [tex.env.rgb_scale, tex.env.alpha_scale, 0.0, 0.0];
            for (coord, gen) in tex.texgen.iter().enumerate() {
                g.texgen_object[unit * 4 + coord] = gen.object_plane;
                g.texgen_eye[unit * 4 + coord] = gen.eye_plane;
            }
        }
        g
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFixedFunctionShaders {
    pub hash: u64,
    pub vertex_wgsl: String,
    pub fragment_wgsl: String,
    /// Units the fragment program samples, with the target each one reads.
    pub texture_units: Vec<(u32, TextureTarget)>,
}

pub fn generate_fixed_function_shaders(desc: &FixedFunctionShaderDesc) -> GeneratedFixedFunctionShaders {
    GeneratedFixedFunctionShaders {
        hash: desc.state_hash(),
        vertex_wgsl: generate_vertex_wgsl(desc),
        fragment_wgsl: generate_fragment_wgsl(desc),
        texture_units: desc
            .active_stages()
            .map(|(unit, stage)| (unit as u32, stage.target))
            .collect(),
    }
}

const WGSL_SHARED: &str = r#"
struct Light {
  ambient: vec4<f32>,
  diffuse: vec4<f32>,
  specular: vec4<f32>,
  position: vec4<f32>,
  spot: vec4<f32>,
  attenuation: vec4<f32>,
};

struct Material {
  ambient: vec4<f32>,
  diffuse: vec4<f32>,
  specular: vec4<f32>,
  emission: vec4<f32>,
  shininess: vec4<f32>,
};

struct Globals {
  modelview: mat4x4<f32>,
  mvp: mat4x4<f32>,
  normal_matrix: mat4x4<f32>,
  texture_matrices: array<mat4x4<f32>, 16>,
  lights: array<Light, 8>,
  materials: array<Material, 2>,
  light_model_ambient: vec4<f32>,
  fog_color: vec4<f32>,
  fog_params: vec4<f32>,
  alpha_test: vec4<f32>,
  env_colors: array<vec4<f32>, 16>,
  env_scales: array<vec4<f32>, 16>,
  texgen_object: array<vec4<f32>, 64>,
  texgen_eye: array<vec4<f32>, 64>,
};

@group(0) @binding(0) var<uniform> globals: Globals;
"#;

const COLOR_LOCATION: u32 = 0;
const SECONDARY_LOCATION: u32 = 1;
const BACK_COLOR_LOCATION: u32 = 2;
const BACK_SECONDARY_LOCATION: u32 = 3;
const FOG_LOCATION: u32 = 4;
const FIRST_TEXCOORD_LOCATION: u32 = 5;

/// Writes the members shared by `VertexOut` and `FragmentIn`.
fn emit_varyings(wgsl: &mut String, desc: &FixedFunctionShaderDesc) {
    let interp = if desc.flat { "@interpolate(flat) " } else { "" };
    let _ = writeln!(wgsl, "  @location({COLOR_LOCATION}) {interp}color: vec4<f32>,");
    let _ = writeln!(wgsl, "  @location({SECONDARY_LOCATION}) {interp}secondary: vec4<f32>,");
    if desc.two_side() {
        let _ = writeln!(wgsl, "  @location({BACK_COLOR_LOCATION}) {interp}back_color: vec4<f32>,");
        let _ = writeln!(
            wgsl,
            "  @location({BACK_SECONDARY_LOCATION}) {interp}back_secondary: vec4<f32>,"
        );
    }
    if desc.fog.is_some() {
        let _ = writeln!(wgsl, "  @location({FOG_LOCATION}) fog_factor: f32,");
    }
    for (unit, _) in desc.active_stages() {
        let location = FIRST_TEXCOORD_LOCATION + unit as u32;
        let _ = writeln!(wgsl, "  @location({location}) tex{unit}: vec4<f32>,");
    }
}

fn generate_vertex_wgsl(desc: &FixedFunctionShaderDesc) -> String {
    let mut wgsl = String::new();
    wgsl.push_str(WGSL_SHARED);

    // Input locations follow the conventional attribute aliasing: position 0,
    // normal 2, color 3, fog coordinate 5, texture coordinates 8 and up.
    wgsl.push_str("struct VertexIn {\n");
    wgsl.push_str("  @location(0) position: vec4<f32>,\n");
    wgsl.push_str("  @location(2) normal: vec3<f32>,\n");
    wgsl.push_str("  @location(3) color: vec4<f32>,\n");
    if matches!(desc.fog, Some((_, FogCoordSource::FogCoordinate))) {
        wgsl.push_str("  @location(5) fog_coord: f32,\n");
    }
    for (unit, _) in desc.active_stages() {
        if unit < usize::from(desc.texcoord_inputs) {
            let _ = writeln!(wgsl, "  @location({}) tex{unit}: vec4<f32>,", 8 + unit);
        }
    }
    wgsl.push_str("};\n\n");

    wgsl.push_str("struct VertexOut {\n");
    wgsl.push_str("  @builtin(position) position: vec4<f32>,\n");
    emit_varyings(&mut wgsl, desc);
    wgsl.push_str("};\n\n");

    wgsl.push_str("@vertex\nfn vs_main(input: VertexIn) -> VertexOut {\n");
    wgsl.push_str("  var out: VertexOut;\n");
    wgsl.push_str("  let eye_pos = globals.modelview * input.position;\n");
    wgsl.push_str("  out.position = globals.mvp * input.position;\n");
    if desc.needs_eye_normal() {
        if desc.normalize {
            wgsl.push_str("  let n = normalize((globals.normal_matrix * vec4<f32>(input.normal, 0.0)).xyz);\n");
        } else {
            wgsl.push_str("  let n = (globals.normal_matrix * vec4<f32>(input.normal, 0.0)).xyz;\n");
        }
    }

    match &desc.lighting {
        Some(lighting) => emit_lighting(&mut wgsl, lighting),
        None => {
            wgsl.push_str("  out.color = input.color;\n");
            wgsl.push_str("  out.secondary = vec4<f32>(0.0, 0.0, 0.0, 0.0);\n");
        }
    }

    for (unit, stage) in desc.active_stages() {
        emit_texcoord(&mut wgsl, desc, unit, stage);
    }

    if let Some((mode, source)) = desc.fog {
        match source {
            FogCoordSource::FragmentDepth => wgsl.push_str("  let fog_c = abs(eye_pos.z);\n"),
            FogCoordSource::FogCoordinate => wgsl.push_str("  let fog_c = abs(input.fog_coord);\n"),
        }
        let factor = match mode {
            FogMode::Linear => "(globals.fog_params.z - fog_c) * globals.fog_params.w",
            FogMode::Exp => "exp(-globals.fog_params.x * fog_c)",
            FogMode::Exp2 => "exp(-(globals.fog_params.x * fog_c) * (globals.fog_params.x * fog_c))",
        };
        let _ = writeln!(wgsl, "  out.fog_factor = clamp({factor}, 0.0, 1.0);");
    }

    wgsl.push_str("  return out;\n}\n");
    wgsl
}

fn material_term(lighting: &LightingDesc, face: usize, term: ColorMaterialMode) -> String {
    let tracked = lighting.color_material.is_some_and(|(mat_face, mode)| {
        let face_matches = if face == 0 {
            mat_face.includes_front()
        } else {
            mat_face.includes_back()
        };
        face_matches
            && (mode == term
                || (mode == ColorMaterialMode::AmbientAndDiffuse
                    && matches!(term, ColorMaterialMode::Ambient | ColorMaterialMode::Diffuse)))
    });
    if tracked {
        return "input.color".to_owned();
    }
    let field = match term {
        ColorMaterialMode::Emission => "emission",
        ColorMaterialMode::Ambient | ColorMaterialMode::AmbientAndDiffuse => "ambient",
        ColorMaterialMode::Diffuse => "diffuse",
        ColorMaterialMode::Specular => "specular",
    };
    format!("globals.materials[{face}].{field}")
}

fn emit_lighting(wgsl: &mut String, lighting: &LightingDesc) {
    if lighting.local_viewer {
        wgsl.push_str("  let view_dir = normalize(-eye_pos.xyz);\n");
    } else {
        wgsl.push_str("  let view_dir = vec3<f32>(0.0, 0.0, 1.0);\n");
    }

    let faces: &[(usize, &str, &str, &str)] = if lighting.two_side {
        &[
            (0, "n", "color", "secondary"),
            (1, "-n", "back_color", "back_secondary"),
        ]
    } else {
        &[(0, "n", "color", "secondary")]
    };

    for &(face, normal, color_out, secondary_out) in faces {
        wgsl.push_str("  {\n");
        let _ = writeln!(wgsl, "    let nf = {normal};");
        let _ = writeln!(
            wgsl,
            "    let mat_ambient = {};",
            material_term(lighting, face, ColorMaterialMode::Ambient)
        );
        let _ = writeln!(
            wgsl,
            "    let mat_diffuse = {};",
            material_term(lighting, face, ColorMaterialMode::Diffuse)
        );
        let _ = writeln!(
            wgsl,
            "    let mat_specular = {};",
            material_term(lighting, face, ColorMaterialMode::Specular)
        );
        let _ = writeln!(
            wgsl,
            "    let mat_emission = {};",
            material_term(lighting, face, ColorMaterialMode::Emission)
        );
        let _ = writeln!(wgsl, "    let shininess = globals.materials[{face}].shininess.x;");
        wgsl.push_str(
            "    var primary = mat_emission.rgb + mat_ambient.rgb * globals.light_model_ambient.rgb;\n",
        );
        wgsl.push_str("    var specular = vec3<f32>(0.0, 0.0, 0.0);\n");

        for &(index, ty) in &lighting.lights {
            wgsl.push_str("    {\n");
            let _ = writeln!(wgsl, "      let light = globals.lights[{index}];");
            wgsl.push_str("      var atten = 1.0;\n");
            match ty {
                LightType::Directional => {
                    wgsl.push_str("      let l = normalize(light.position.xyz);\n");
                }
                LightType::Point | LightType::Spot => {
                    wgsl.push_str("      let to_light = light.position.xyz - eye_pos.xyz;\n");
                    wgsl.push_str("      let dist = length(to_light);\n");
                    wgsl.push_str("      let l = to_light / max(dist, 1e-6);\n");
                    wgsl.push_str(
                        "      atten = 1.0 / max(light.attenuation.y + light.attenuation.z * dist + light.attenuation.w * dist * dist, 1e-6);\n",
                    );
                }
            }
            if ty == LightType::Spot {
                wgsl.push_str("      let spot_dot = dot(-l, normalize(light.spot.xyz));\n");
                wgsl.push_str(
                    "      atten = atten * select(0.0, pow(max(spot_dot, 1e-6), light.spot.w), spot_dot >= light.attenuation.x);\n",
                );
            }
            wgsl.push_str("      let ndotl = max(dot(nf, l), 0.0);\n");
            wgsl.push_str("      let ndoth = max(dot(nf, normalize(l + view_dir)), 0.0);\n");
            wgsl.push_str("      let spec = select(0.0, pow(ndoth, shininess), ndotl > 0.0 && ndoth > 0.0);\n");
            wgsl.push_str(
                "      primary = primary + atten * (mat_ambient.rgb * light.ambient.rgb + ndotl * mat_diffuse.rgb * light.diffuse.rgb);\n",
            );
            wgsl.push_str(
                "      specular = specular + atten * spec * mat_specular.rgb * light.specular.rgb;\n",
            );
            wgsl.push_str("    }\n");
        }

        if lighting.separate_specular {
            let _ = writeln!(
                wgsl,
                "    out.{color_out} = vec4<f32>(clamp(primary, vec3<f32>(0.0), vec3<f32>(1.0)), mat_diffuse.a);"
            );
            let _ = writeln!(
                wgsl,
                "    out.{secondary_out} = vec4<f32>(clamp(specular, vec3<f32>(0.0), vec3<f32>(1.0)), 0.0);"
            );
        } else {
            let _ = writeln!(
                wgsl,
                "    out.{color_out} = vec4<f32>(clamp(primary + specular, vec3<f32>(0.0), vec3<f32>(1.0)), mat_diffuse.a);"
            );
            let _ = writeln!(wgsl, "    out.{secondary_out} = vec4<f32>(0.0, 0.0, 0.0, 0.0);");
        }
        wgsl.push_str("  }\n");
    }
}

fn emit_texcoord(wgsl: &mut String, desc: &FixedFunctionShaderDesc, unit: usize, stage: &StageDesc) {
    wgsl.push_str("  {\n");
    if unit < usize::from(desc.texcoord_inputs) {
        let _ = writeln!(wgsl, "    var tc = input.tex{unit};");
    } else {
        wgsl.push_str("    var tc = vec4<f32>(0.0, 0.0, 0.0, 1.0);\n");
    }

    let needs_reflection = stage
        .texgen
        .iter()
        .flatten()
        .any(|mode| matches!(mode, TexGenMode::SphereMap | TexGenMode::ReflectionMap));
    if needs_reflection {
        wgsl.push_str("    let r = reflect(normalize(eye_pos.xyz), n);\n");
    }
    if stage.texgen.iter().flatten().any(|mode| *mode == TexGenMode::SphereMap) {
        wgsl.push_str("    let m = 2.0 * sqrt(r.x * r.x + r.y * r.y + (r.z + 1.0) * (r.z + 1.0));\n");
    }

    for (coord, mode) in stage.texgen.iter().enumerate() {
        let Some(mode) = mode else { continue };
        let component = ["x", "y", "z", "w"][coord];
        let plane = unit * 4 + coord;
        let expr = match mode {
            TexGenMode::ObjectLinear => format!("dot(input.position, globals.texgen_object[{plane}])"),
            TexGenMode::EyeLinear => format!("dot(eye_pos, globals.texgen_eye[{plane}])"),
            TexGenMode::SphereMap => format!("r.{component} / m + 0.5"),
            TexGenMode::ReflectionMap => format!("r.{component}"),
            TexGenMode::NormalMap => format!("n.{component}"),
        };
        let _ = writeln!(wgsl, "    tc.{component} = {expr};");
    }
    let _ = writeln!(wgsl, "    out.tex{unit} = globals.texture_matrices[{unit}] * tc;");
    wgsl.push_str("  }\n");
}

fn texture_type(target: TextureTarget) -> &'static str {
    match target {
        TextureTarget::Texture1D => "texture_1d<f32>",
        TextureTarget::Texture2D | TextureTarget::Rectangle => "texture_2d<f32>",
        TextureTarget::Texture3D => "texture_3d<f32>",
        TextureTarget::CubeMap => "texture_cube<f32>",
    }
}

fn sample_coords(unit: usize, target: TextureTarget) -> String {
    let q = format!("select(1.0, input.tex{unit}.w, input.tex{unit}.w != 0.0)");
    match target {
        TextureTarget::Texture1D => format!("input.tex{unit}.x / {q}"),
        TextureTarget::Texture2D => format!("input.tex{unit}.xy / {q}"),
        // Rectangle coordinates are in texels; WGSL samplers always take
        // normalized coordinates.
        TextureTarget::Rectangle => {
            format!("(input.tex{unit}.xy / {q}) / vec2<f32>(textureDimensions(tex{unit}, 0))")
        }
        TextureTarget::Texture3D => format!("input.tex{unit}.xyz / {q}"),
        TextureTarget::CubeMap => format!("input.tex{unit}.xyz"),
    }
}

/// Expands a raw texel to RGBA the way the base format is defined to read.
fn expand_texel(base: BaseFormat, raw: &str) -> String {
    match base {
        BaseFormat::Alpha => format!("vec4<f32>(0.0, 0.0, 0.0, {raw}.r)"),
        BaseFormat::Luminance | BaseFormat::Depth => format!("vec4<f32>(vec3<f32>({raw}.r), 1.0)"),
        BaseFormat::LuminanceAlpha => format!("vec4<f32>(vec3<f32>({raw}.r), {raw}.g)"),
        BaseFormat::Intensity => format!("vec4<f32>({raw}.r)"),
        BaseFormat::Rgb => format!("vec4<f32>({raw}.rgb, 1.0)"),
        BaseFormat::Rgba => raw.to_owned(),
    }
}

fn generate_fragment_wgsl(desc: &FixedFunctionShaderDesc) -> String {
    let mut wgsl = String::new();
    wgsl.push_str(WGSL_SHARED);

    for (unit, stage) in desc.active_stages() {
        let texture_binding = unit * 2;
        let sampler_binding = texture_binding + 1;
        let _ = writeln!(
            wgsl,
            "@group(1) @binding({texture_binding}) var tex{unit}: {};",
            texture_type(stage.target)
        );
        let _ = writeln!(wgsl, "@group(1) @binding({sampler_binding}) var samp{unit}: sampler;");
    }
    wgsl.push('\n');

    wgsl.push_str("struct FragmentIn {\n");
    emit_varyings(&mut wgsl, desc);
    if desc.two_side() {
        wgsl.push_str("  @builtin(front_facing) front_facing: bool,\n");
    }
    wgsl.push_str("};\n\n");

    wgsl.push_str("@fragment\nfn fs_main(input: FragmentIn) -> @location(0) vec4<f32> {\n");
    if desc.two_side() {
        wgsl.push_str("  let primary = select(input.back_color, input.color, input.front_facing);\n");
        wgsl.push_str("  let secondary = select(input.back_secondary, input.secondary, input.front_facing);\n");
    } else {
        wgsl.push_str("  let primary = input.color;\n");
        wgsl.push_str("  let secondary = input.secondary;\n");
    }
    wgsl.push_str("  var current = primary;\n");

    // Sample everything up front: textureSample needs uniform control flow
    // and the alpha test below introduces a discard.
    for (unit, stage) in desc.active_stages() {
        let raw = format!("textureSample(tex{unit}, samp{unit}, {})", sample_coords(unit, stage.target));
        let _ = writeln!(wgsl, "  let tex{unit}_raw = {raw};");
        let _ = writeln!(
            wgsl,
            "  let tex{unit}_color = {};",
            expand_texel(stage.base, &format!("tex{unit}_raw"))
        );
    }

    for (unit, stage) in desc.active_stages() {
        emit_tex_env_stage(&mut wgsl, desc, unit, stage);
    }

    if desc.lighting.as_ref().is_some_and(|l| l.separate_specular) {
        wgsl.push_str(
            "  current = vec4<f32>(clamp(current.rgb + secondary.rgb, vec3<f32>(0.0), vec3<f32>(1.0)), current.a);\n",
        );
    }

    if let Some(func) = desc.alpha_test {
        let cond = wgsl_compare_func(func, "current.a", "globals.alpha_test.x");
        let _ = writeln!(wgsl, "  if (!({cond})) {{\n    discard;\n  }}");
    }

    if desc.fog.is_some() {
        wgsl.push_str(
            "  current = vec4<f32>(mix(globals.fog_color.rgb, current.rgb, input.fog_factor), current.a);\n",
        );
    }

    wgsl.push_str("  return current;\n}\n");
    wgsl
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Component {
    Rgb,
    Alpha,
}

fn emit_tex_env_stage(wgsl: &mut String, desc: &FixedFunctionShaderDesc, unit: usize, stage: &StageDesc) {
    let (rgb, alpha) = match stage.mode {
        TexEnvMode::Combine | TexEnvMode::Combine4 => {
            let four = stage.mode == TexEnvMode::Combine4;
            let rgb = wgsl_combine_expr(desc, unit, stage, Component::Rgb, four);
            let alpha = if stage.combine_rgb == CombineFunc::Dot3Rgba {
                // DOT3_RGBA writes the dot product to alpha as well.
                format!("({rgb}).x")
            } else {
                wgsl_combine_expr(desc, unit, stage, Component::Alpha, four)
            };
            (
                format!("({rgb}) * globals.env_scales[{unit}].x"),
                format!("({alpha}) * globals.env_scales[{unit}].y"),
            )
        }
        mode => wgsl_classic_env(mode, stage.base, unit),
    };

    wgsl.push_str("  {\n");
    let _ = writeln!(wgsl, "    let rgb_raw = {rgb};");
    let _ = writeln!(wgsl, "    let a_raw = {alpha};");
    wgsl.push_str("    let rgb = clamp(rgb_raw, vec3<f32>(0.0), vec3<f32>(1.0));\n");
    wgsl.push_str("    let a = clamp(a_raw, 0.0, 1.0);\n");
    wgsl.push_str("    current = vec4<f32>(rgb, a);\n");
    wgsl.push_str("  }\n");
}

/// REPLACE, MODULATE, DECAL, BLEND and ADD as defined per base format.
fn wgsl_classic_env(mode: TexEnvMode, base: BaseFormat, unit: usize) -> (String, String) {
    let cf = "current.rgb".to_owned();
    let af = "current.a".to_owned();
    let ct = format!("tex{unit}_color.rgb");
    let at = format!("tex{unit}_color.a");
    let cc = format!("globals.env_colors[{unit}].rgb");
    let ac = format!("globals.env_colors[{unit}].a");
    let color = base.has_color();
    let alpha = base.has_alpha();

    match mode {
        TexEnvMode::Replace => (
            if color { ct } else { cf },
            if alpha { at } else { af },
        ),
        TexEnvMode::Modulate => (
            if color { format!("{cf} * {ct}") } else { cf },
            if alpha { format!("{af} * {at}") } else { af },
        ),
        TexEnvMode::Decal => match base {
            BaseFormat::Rgb => (ct, af),
            BaseFormat::Rgba => (format!("mix({cf}, {ct}, vec3<f32>({at}))"), af),
            _ => (cf, af),
        },
        TexEnvMode::Blend => (
            if color { format!("mix({cf}, {cc}, {ct})") } else { cf },
            match base {
                BaseFormat::Intensity => format!("mix({af}, {ac}, {at})"),
                _ if alpha => format!("{af} * {at}"),
                _ => af,
            },
        ),
        TexEnvMode::Add => (
            if color { format!("{cf} + {ct}") } else { cf },
            match base {
                BaseFormat::Intensity => format!("{af} + {at}"),
                _ if alpha => format!("{af} * {at}"),
                _ => af,
            },
        ),
        TexEnvMode::Combine | TexEnvMode::Combine4 => (cf, af),
    }
}

fn wgsl_source(desc: &FixedFunctionShaderDesc, unit: usize, source: CombineSource) -> String {
    match source {
        CombineSource::Texture => format!("tex{unit}_color"),
        CombineSource::TextureUnit(other) => {
            let other = usize::from(other);
            if desc.stages.get(other).is_some_and(Option::is_some) {
                format!("tex{other}_color")
            } else {
                // Crossbar reads of a unit with texturing off read white.
                "vec4<f32>(1.0)".to_owned()
            }
        }
        CombineSource::Constant => format!("globals.env_colors[{unit}]"),
        CombineSource::PrimaryColor => "primary".to_owned(),
        CombineSource::Previous => "current".to_owned(),
        CombineSource::Zero => "vec4<f32>(0.0)".to_owned(),
        CombineSource::One => "vec4<f32>(1.0)".to_owned(),
    }
}

fn wgsl_arg_component(
    desc: &FixedFunctionShaderDesc,
    unit: usize,
    source: CombineSource,
    operand: CombineOperand,
    component: Component,
) -> String {
    let value = wgsl_source(desc, unit, source);
    match (component, operand) {
        (Component::Rgb, CombineOperand::SrcColor) => format!("{value}.rgb"),
        (Component::Rgb, CombineOperand::OneMinusSrcColor) => format!("(vec3<f32>(1.0) - {value}.rgb)"),
        (Component::Rgb, CombineOperand::SrcAlpha) => format!("vec3<f32>({value}.a)"),
        (Component::Rgb, CombineOperand::OneMinusSrcAlpha) => format!("vec3<f32>(1.0 - {value}.a)"),
        (Component::Alpha, CombineOperand::SrcColor | CombineOperand::SrcAlpha) => format!("{value}.a"),
        (Component::Alpha, CombineOperand::OneMinusSrcColor | CombineOperand::OneMinusSrcAlpha) => {
            format!("(1.0 - {value}.a)")
        }
    }
}

fn wgsl_combine_expr(
    desc: &FixedFunctionShaderDesc,
    unit: usize,
    stage: &StageDesc,
    component: Component,
    four: bool,
) -> String {
    let (func, sources, operands, one, half) = match component {
        Component::Rgb => (
            stage.combine_rgb,
            &stage.sources_rgb,
            &stage.operands_rgb,
            "vec3<f32>(1.0)",
            "vec3<f32>(0.5)",
        ),
        Component::Alpha => (
            stage.combine_alpha,
            &stage.sources_alpha,
            &stage.operands_alpha,
            "1.0",
            "0.5",
        ),
    };
    let arg = |i: usize| wgsl_arg_component(desc, unit, sources[i], operands[i], component);
    let (a0, a1, a2) = (arg(0), arg(1), arg(2));

    if four {
        match func {
            CombineFunc::Add => return format!("({a0} * {a1} + {a2} * {})", arg(3)),
            CombineFunc::AddSigned => return format!("({a0} * {a1} + {a2} * {} - {half})", arg(3)),
            _ => {}
        }
    }

    match func {
        CombineFunc::Replace => a0,
        CombineFunc::Modulate => format!("({a0} * {a1})"),
        CombineFunc::Add => format!("({a0} + {a1})"),
        CombineFunc::AddSigned => format!("({a0} + {a1} - {half})"),
        CombineFunc::Interpolate => format!("({a0} * {a2} + {a1} * ({one} - {a2}))"),
        CombineFunc::Subtract => format!("({a0} - {a1})"),
        CombineFunc::Dot3Rgb | CombineFunc::Dot3Rgba => match component {
            Component::Rgb => format!(
                "vec3<f32>(4.0 * dot({a0} - vec3<f32>(0.5), {a1} - vec3<f32>(0.5)))"
            ),
            // Not reachable through the translator; alpha never selects DOT3.
            Component::Alpha => a0,
        },
        CombineFunc::ModulateAdd => format!("({a0} * {a2} + {a1})"),
        CombineFunc::ModulateSignedAdd => format!("({a0} * {a2} + {a1} - {half})"),
        CombineFunc::ModulateSubtract => format!("({a0} * {a2} - {a1})"),
    }
}

fn wgsl_compare_func(func: wgpu::CompareFunction, lhs: &str, rhs: &str) -> String {
    match func {
        wgpu::CompareFunction::Never => "false".to_owned(),
        wgpu::CompareFunction::Less => format!("{lhs} < {rhs}"),
        wgpu::CompareFunction::Equal => format!("{lhs} == {rhs}"),
        wgpu::CompareFunction::LessEqual => format!("{lhs} <= {rhs}"),
        wgpu::CompareFunction::Greater => format!("{lhs} > {rhs}"),
        wgpu::CompareFunction::NotEqual => format!("{lhs} != {rhs}"),
        wgpu::CompareFunction::GreaterEqual => format!("{lhs} >= {rhs}"),
        wgpu::CompareFunction::Always => "true".to_owned(),
    }
}
