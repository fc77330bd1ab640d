use aero_gl::device::RecordingDevice;
use aero_gl::gl;
use aero_gl::objects::texture::TextureTarget;
use aero_gl::state::topology::{expand_nonindexed, TopologyEmulation};
use aero_gl::state::translate;
use aero_gl::state::{translate_primitive_topology, GlPrimitive, MatrixMode};
use aero_gl::vertex::{ComponentType, IndexType};
use aero_gl::{ContextConfig, GlContext, GlError, ParamValue};
use pretty_assertions::assert_eq;

const CALL: &str = "test";

fn context() -> GlContext<RecordingDevice> {
    GlContext::new(RecordingDevice::new(31, 16), ContextConfig::default()).unwrap()
}

fn validate_wgsl(wgsl: &str) {
    let module = naga::front::wgsl::parse_str(wgsl).expect("wgsl parse");
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .expect("wgsl validate");
}

#[test]
fn compare_functions() {
    assert_eq!(
        translate::compare_func(CALL, gl::LEQUAL).unwrap(),
        wgpu::CompareFunction::LessEqual
    );
    assert_eq!(
        translate::compare_func(CALL, gl::NOTEQUAL).unwrap(),
        wgpu::CompareFunction::NotEqual
    );
    assert_eq!(
        translate::compare_func(CALL, gl::ALWAYS).unwrap(),
        wgpu::CompareFunction::Always
    );
}

#[test]
fn blend_factors_and_equations() {
    assert_eq!(
        translate::blend_factor(CALL, gl::ONE_MINUS_DST_COLOR).unwrap(),
        wgpu::BlendFactor::OneMinusDst
    );
    assert_eq!(
        translate::blend_factor(CALL, gl::CONSTANT_COLOR).unwrap(),
        wgpu::BlendFactor::Constant
    );
    assert_eq!(
        translate::blend_factor(CALL, gl::SRC_ALPHA_SATURATE).unwrap(),
        wgpu::BlendFactor::SrcAlphaSaturated
    );
    assert_eq!(
        translate::blend_equation(CALL, gl::FUNC_REVERSE_SUBTRACT).unwrap(),
        wgpu::BlendOperation::ReverseSubtract
    );
    assert_eq!(translate::blend_equation(CALL, gl::MAX).unwrap(), wgpu::BlendOperation::Max);
}

#[test]
fn stencil_wrap_operations_are_distinct_from_clamping() {
    assert_eq!(
        translate::stencil_op(CALL, gl::INCR).unwrap(),
        wgpu::StencilOperation::IncrementClamp
    );
    assert_eq!(
        translate::stencil_op(CALL, gl::INCR_WRAP).unwrap(),
        wgpu::StencilOperation::IncrementWrap
    );
    assert_eq!(
        translate::stencil_op(CALL, gl::DECR_WRAP).unwrap(),
        wgpu::StencilOperation::DecrementWrap
    );
}

#[test]
fn sampler_state() {
    let min = translate::min_filter(CALL, gl::LINEAR_MIPMAP_NEAREST).unwrap();
    assert_eq!(min.filter, wgpu::FilterMode::Linear);
    assert_eq!(min.mipmap, Some(wgpu::FilterMode::Nearest));
    assert_eq!(translate::min_filter(CALL, gl::NEAREST).unwrap().mipmap, None);
    assert_eq!(
        translate::address_mode(CALL, gl::CLAMP).unwrap(),
        wgpu::AddressMode::ClampToEdge
    );
    assert_eq!(
        translate::address_mode(CALL, gl::MIRRORED_REPEAT).unwrap(),
        wgpu::AddressMode::MirrorRepeat
    );
}

#[test]
fn targets_formats_and_types() {
    assert_eq!(
        translate::texture_target(CALL, gl::TEXTURE_RECTANGLE).unwrap(),
        TextureTarget::Rectangle
    );
    assert_eq!(
        translate::image_target(CALL, gl::TEXTURE_CUBE_MAP_NEGATIVE_Y).unwrap(),
        (TextureTarget::CubeMap, 3)
    );
    let dxt5 = translate::internal_format(CALL, gl::COMPRESSED_RGBA_S3TC_DXT5_EXT).unwrap();
    assert_eq!(dxt5.format, wgpu::TextureFormat::Bc3RgbaUnorm);
    assert!(dxt5.compressed);
    // Legacy component-count formats.
    assert_eq!(
        translate::internal_format(CALL, 3).unwrap().format,
        wgpu::TextureFormat::Rgba8Unorm
    );
    assert_eq!(translate::index_type(CALL, gl::UNSIGNED_BYTE).unwrap(), IndexType::U8);
    assert_eq!(
        translate::component_type(CALL, gl::HALF_FLOAT).unwrap(),
        ComponentType::HalfFloat
    );
}

#[test]
fn matrix_modes_cover_vertex_blend_units() {
    assert_eq!(translate::matrix_mode(CALL, gl::MODELVIEW).unwrap(), MatrixMode::Modelview(0));
    assert_eq!(
        translate::matrix_mode(CALL, gl::MODELVIEW1_ARB).unwrap(),
        MatrixMode::Modelview(1)
    );
    assert_eq!(
        translate::matrix_mode(CALL, gl::MODELVIEW2_ARB + 3).unwrap(),
        MatrixMode::Modelview(5)
    );
    assert_eq!(translate::matrix_mode(CALL, gl::TEXTURE).unwrap(), MatrixMode::Texture);
}

#[test]
fn unknown_enumerators_name_the_call() {
    let err = translate::cull_face("glCullFace", gl::FRONT_AND_BACK).unwrap_err();
    assert!(matches!(
        err,
        GlError::UnsupportedEnum {
            call: "glCullFace",
            param: "cull face",
            value: gl::FRONT_AND_BACK
        }
    ));
    assert!(translate::texgen_mode(CALL, 3, gl::SPHERE_MAP).is_err());
    assert!(translate::combine_func(CALL, gl::DOT3_RGB, true).is_err());
    assert!(translate::combine_source(CALL, gl::TEXTURE0 + 4, 4).is_err());
}

#[test]
fn primitive_topologies() {
    let cases = [
        (gl::POINTS, wgpu::PrimitiveTopology::PointList, None),
        (gl::LINES, wgpu::PrimitiveTopology::LineList, None),
        (
            gl::LINE_LOOP,
            wgpu::PrimitiveTopology::LineStrip,
            Some(TopologyEmulation::LineLoop),
        ),
        (gl::TRIANGLE_STRIP, wgpu::PrimitiveTopology::TriangleStrip, None),
        (
            gl::TRIANGLE_FAN,
            wgpu::PrimitiveTopology::TriangleList,
            Some(TopologyEmulation::TriangleFan),
        ),
        (
            gl::POLYGON,
            wgpu::PrimitiveTopology::TriangleList,
            Some(TopologyEmulation::TriangleFan),
        ),
        (
            gl::QUAD_STRIP,
            wgpu::PrimitiveTopology::TriangleList,
            Some(TopologyEmulation::QuadStrip),
        ),
    ];
    for (mode, topology, emulation) in cases {
        let translated = translate_primitive_topology(translate::primitive(CALL, mode).unwrap());
        assert_eq!(translated.topology, topology, "mode {mode:#x}");
        assert_eq!(translated.emulation, emulation, "mode {mode:#x}");
    }
    assert_eq!(
        translate_primitive_topology(GlPrimitive::Quads).emulation,
        Some(TopologyEmulation::Quads)
    );
}

#[test]
fn emulated_index_lists() {
    assert_eq!(
        expand_nonindexed(TopologyEmulation::LineLoop, 3),
        vec![0, 1, 2, 0]
    );
    assert_eq!(
        expand_nonindexed(TopologyEmulation::TriangleFan, 5),
        vec![0, 1, 2, 0, 2, 3, 0, 3, 4]
    );
    assert_eq!(
        expand_nonindexed(TopologyEmulation::QuadStrip, 6),
        vec![0, 1, 2, 2, 1, 3, 2, 3, 4, 4, 3, 5]
    );
    // An incomplete trailing quad is dropped.
    assert_eq!(
        expand_nonindexed(TopologyEmulation::Quads, 6),
        vec![0, 1, 2, 0, 2, 3]
    );
}

/// Lighting, fog, texgen and a combiner stage on a single draw.
fn configure_fixed_function(ctx: &mut GlContext<RecordingDevice>) {
    ctx.enable(gl::LIGHTING).unwrap();
    ctx.enable(gl::LIGHT0).unwrap();
    ctx.light_fv(gl::LIGHT0, gl::POSITION, &[0.0, 0.0, 1.0, 0.0]).unwrap();
    ctx.light_fv(gl::LIGHT0, gl::DIFFUSE, &[1.0, 0.8, 0.6, 1.0]).unwrap();
    ctx.light_model_f(gl::LIGHT_MODEL_COLOR_CONTROL, gl::SEPARATE_SPECULAR_COLOR as f32)
        .unwrap();
    ctx.enable(gl::FOG).unwrap();
    ctx.fog_f(gl::FOG_MODE, gl::EXP2 as f32).unwrap();
    ctx.fog_f(gl::FOG_DENSITY, 0.25).unwrap();
    ctx.enable(gl::ALPHA_TEST).unwrap();
    ctx.alpha_func(gl::GREATER, 0.5).unwrap();

    ctx.bind_texture(gl::TEXTURE_2D, 1).unwrap();
    ctx.tex_image_2d(
        gl::TEXTURE_2D,
        0,
        gl::RGBA,
        1,
        1,
        0,
        gl::RGBA,
        gl::UNSIGNED_BYTE,
        Some(&[255, 255, 255, 255]),
    )
    .unwrap();
    ctx.enable(gl::TEXTURE_2D).unwrap();
    ctx.tex_env(gl::TEXTURE_ENV, gl::TEXTURE_ENV_MODE, ParamValue::Int(gl::COMBINE as i32))
        .unwrap();
    ctx.tex_env(gl::TEXTURE_ENV, gl::COMBINE_RGB, ParamValue::Int(gl::DOT3_RGBA as i32))
        .unwrap();
    ctx.tex_gen(gl::S, gl::TEXTURE_GEN_MODE, ParamValue::Int(gl::SPHERE_MAP as i32))
        .unwrap();
    ctx.enable(gl::TEXTURE_GEN_S).unwrap();
}

fn draw_triangle(ctx: &mut GlContext<RecordingDevice>) {
    ctx.begin(gl::TRIANGLES).unwrap();
    ctx.normal3f(0.0, 0.0, 1.0);
    ctx.vertex3f(0.0, 0.0, 0.0).unwrap();
    ctx.vertex3f(1.0, 0.0, 0.0).unwrap();
    ctx.vertex3f(0.0, 1.0, 0.0).unwrap();
    ctx.end().unwrap();
}

#[test]
fn synthesized_programs_validate() {
    let mut ctx = context();
    configure_fixed_function(&mut ctx);
    draw_triangle(&mut ctx);

    let draws = ctx.device().draws();
    assert_eq!(draws.len(), 1);
    validate_wgsl(&draws[0].vertex_shader.source);
    validate_wgsl(&draws[0].fragment_shader.source);
    assert_eq!(draws[0].samplers.len(), 1);
    assert_eq!(draws[0].samplers[0].1.unit, 0);
}

#[test]
fn identical_state_synthesizes_identical_programs() {
    let mut ctx = context();
    configure_fixed_function(&mut ctx);
    draw_triangle(&mut ctx);
    draw_triangle(&mut ctx);
    ctx.disable(gl::FOG).unwrap();
    draw_triangle(&mut ctx);

    let draws = ctx.device_mut().take_draws();
    assert_eq!(draws.len(), 3);
    assert_eq!(draws[0].vertex_shader, draws[1].vertex_shader);
    assert_eq!(draws[0].fragment_shader, draws[1].fragment_shader);
    assert_ne!(draws[1].fragment_shader.source, draws[2].fragment_shader.source);
    // Programs only live for the duration of their draw.
    assert_eq!(ctx.device().stats().snapshot().live_programs, 0);
}

#[test]
fn unlit_untextured_programs_validate() {
    let mut ctx = context();
    ctx.color3f(0.25, 0.5, 1.0);
    draw_triangle(&mut ctx);
    let draw = &ctx.device().draws()[0];
    validate_wgsl(&draw.vertex_shader.source);
    validate_wgsl(&draw.fragment_shader.source);
    assert!(draw.samplers.is_empty());
}
