use std::io::BufRead;

use aero_gl::device::RecordingDevice;
use aero_gl::{Device, DeviceStatsSnapshot, GlContext, GlError};
use serde::Serialize;
use tracing::{debug, info};

use crate::trace::TraceCall;

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("line {line}: failed to read trace: {source}")]
    Io {
        line: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: malformed trace record: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: {source}")]
    Call {
        line: usize,
        #[source]
        source: GlError,
    },
}

impl ReplayError {
    pub fn line(&self) -> usize {
        match self {
            ReplayError::Io { line, .. } | ReplayError::Parse { line, .. } | ReplayError::Call { line, .. } => *line,
        }
    }
}

/// One decoded record and the 1-based line it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceRecord {
    pub line: usize,
    pub call: TraceCall,
}

/// Device counters at the end of a replay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DeviceSummary {
    pub buffers_created: u64,
    pub textures_created: u64,
    pub programs_created: u64,
    pub live_buffers: u64,
    pub live_textures: u64,
    pub live_programs: u64,
    pub draws: u64,
    pub indexed_draws: u64,
    pub bytes_uploaded: u64,
}

impl From<DeviceStatsSnapshot> for DeviceSummary {
    fn from(stats: DeviceStatsSnapshot) -> Self {
        Self {
            buffers_created: stats.buffers_created,
            textures_created: stats.textures_created,
            programs_created: stats.programs_created,
            live_buffers: stats.live_buffers,
            live_textures: stats.live_textures,
            live_programs: stats.live_programs,
            draws: stats.draws,
            indexed_draws: stats.indexed_draws,
            bytes_uploaded: stats.bytes_uploaded,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub calls: usize,
    pub draws: u64,
    pub device: DeviceSummary,
}

/// Decodes a JSON-lines trace. Blank lines and lines starting with `#` are
/// skipped.
pub fn parse_trace<R: BufRead>(reader: R) -> Result<Vec<TraceRecord>, ReplayError> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let text = line.map_err(|source| ReplayError::Io { line: line_no, source })?;
        let text = text.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let call = serde_json::from_str(text).map_err(|source| ReplayError::Parse { line: line_no, source })?;
        records.push(TraceRecord { line: line_no, call });
    }
    Ok(records)
}

/// Feeds every record to `ctx`, stopping at the first fatal error.
pub fn replay_calls<I>(ctx: &mut GlContext<RecordingDevice>, records: I) -> Result<ReplaySummary, ReplayError>
where
    I: IntoIterator<Item = TraceRecord>,
{
    let mut calls = 0;
    for record in records {
        apply(ctx, &record.call).map_err(|source| ReplayError::Call {
            line: record.line,
            source,
        })?;
        calls += 1;
    }
    let summary = ReplaySummary {
        calls,
        draws: ctx.draw_count(),
        device: ctx.device().stats().snapshot().into(),
    };
    info!(calls, draws = summary.draws, "replay finished");
    Ok(summary)
}

/// Dispatches one record to the matching context entry point.
pub fn apply<D: Device>(ctx: &mut GlContext<D>, call: &TraceCall) -> aero_gl::Result<()> {
    debug!(?call, "replay call");
    match call {
        TraceCall::Enable { cap } => ctx.enable(*cap),
        TraceCall::Disable { cap } => ctx.disable(*cap),
        TraceCall::EnableClientState { array } => ctx.enable_client_state(*array),
        TraceCall::DisableClientState { array } => ctx.disable_client_state(*array),
        TraceCall::EnableVertexAttribArray { index } => ctx.enable_vertex_attrib_array(*index),
        TraceCall::DisableVertexAttribArray { index } => ctx.disable_vertex_attrib_array(*index),

        TraceCall::Begin { mode } => ctx.begin(*mode),
        TraceCall::End => ctx.end(),
        TraceCall::Vertex { coords } => match coords.as_slice() {
            [x, y] => ctx.vertex2f(*x, *y),
            [x, y, z] => ctx.vertex3f(*x, *y, *z),
            [x, y, z, w] => ctx.vertex4f(*x, *y, *z, *w),
            other => Err(GlError::UnsupportedValue {
                call: "glVertex",
                param: "coordinate count",
                value: other.len() as i64,
            }),
        },
        TraceCall::Color { rgba } => match rgba.as_slice() {
            [r, g, b] => {
                ctx.color3f(*r, *g, *b);
                Ok(())
            }
            [r, g, b, a] => {
                ctx.color4f(*r, *g, *b, *a);
                Ok(())
            }
            other => Err(GlError::UnsupportedValue {
                call: "glColor",
                param: "component count",
                value: other.len() as i64,
            }),
        },
        TraceCall::ColorUb { rgba } => match rgba.as_slice() {
            [r, g, b] => {
                ctx.color3ub(*r, *g, *b);
                Ok(())
            }
            [r, g, b, a] => {
                ctx.color4ub(*r, *g, *b, *a);
                Ok(())
            }
            other => Err(GlError::UnsupportedValue {
                call: "glColorub",
                param: "component count",
                value: other.len() as i64,
            }),
        },
        TraceCall::Normal { x, y, z } => {
            ctx.normal3f(*x, *y, *z);
            Ok(())
        }
        TraceCall::TexCoord { coords } => ctx.tex_coord(coords),
        TraceCall::MultiTexCoord { texture, coords } => ctx.multi_tex_coord(*texture, coords),

        TraceCall::VertexPointer {
            size,
            ty,
            stride,
            pointer,
        } => ctx.vertex_pointer(*size, *ty, *stride, pointer.to_array_pointer()),
        TraceCall::ColorPointer {
            size,
            ty,
            stride,
            pointer,
        } => ctx.color_pointer(*size, *ty, *stride, pointer.to_array_pointer()),
        TraceCall::NormalPointer { ty, stride, pointer } => {
            ctx.normal_pointer(*ty, *stride, pointer.to_array_pointer())
        }
        TraceCall::TexCoordPointer {
            size,
            ty,
            stride,
            pointer,
        } => ctx.tex_coord_pointer(*size, *ty, *stride, pointer.to_array_pointer()),
        TraceCall::VertexAttribPointer {
            index,
            size,
            ty,
            normalized,
            stride,
            pointer,
        } => ctx.vertex_attrib_pointer(*index, *size, *ty, *normalized, *stride, pointer.to_array_pointer()),
        TraceCall::InterleavedArrays {
            format,
            stride,
            pointer,
        } => ctx.interleaved_arrays(*format, *stride, pointer.to_array_pointer()),
        TraceCall::DrawArrays { mode, first, count } => ctx.draw_arrays(*mode, *first, *count),
        TraceCall::DrawElements {
            mode,
            count,
            ty,
            indices,
        } => ctx.draw_elements(*mode, *count, *ty, &indices.to_array_pointer()),
        TraceCall::DrawRangeElements {
            mode,
            start,
            end,
            count,
            ty,
            indices,
        } => ctx.draw_range_elements(*mode, *start, *end, *count, *ty, &indices.to_array_pointer()),

        TraceCall::MatrixMode { mode } => ctx.matrix_mode(*mode),
        TraceCall::PushMatrix => ctx.push_matrix(),
        TraceCall::PopMatrix => ctx.pop_matrix(),
        TraceCall::LoadIdentity => ctx.load_identity(),
        TraceCall::LoadMatrix { m } => ctx.load_matrix_f(m),
        TraceCall::MultMatrix { m } => ctx.mult_matrix_f(m),
        TraceCall::Translate { x, y, z } => ctx.translate_f(*x, *y, *z),
        TraceCall::Scale { x, y, z } => ctx.scale_f(*x, *y, *z),
        TraceCall::Rotate { angle, x, y, z } => ctx.rotate_f(*angle, *x, *y, *z),
        TraceCall::Ortho {
            left,
            right,
            bottom,
            top,
            near,
            far,
        } => ctx.ortho(*left, *right, *bottom, *top, *near, *far),
        TraceCall::Frustum {
            left,
            right,
            bottom,
            top,
            near,
            far,
        } => ctx.frustum(*left, *right, *bottom, *top, *near, *far),
        TraceCall::PushAttrib { mask } => ctx.push_attrib(*mask),
        TraceCall::PopAttrib => ctx.pop_attrib(),

        TraceCall::Light { light, pname, params } => ctx.light_fv(*light, *pname, params),
        TraceCall::LightModel { pname, params } => ctx.light_model_fv(*pname, params),
        TraceCall::Material { face, pname, params } => ctx.material_fv(*face, *pname, params),
        TraceCall::ColorMaterial { face, mode } => ctx.color_material(*face, *mode),
        TraceCall::ShadeModel { mode } => ctx.shade_model(*mode),
        TraceCall::Fog { pname, params } => ctx.fog_fv(*pname, params),
        TraceCall::AlphaFunc { func, reference } => ctx.alpha_func(*func, *reference),

        TraceCall::DepthFunc { func } => ctx.depth_func(*func),
        TraceCall::DepthMask { flag } => ctx.depth_mask(*flag),
        TraceCall::DepthRange { near, far } => ctx.depth_range(*near, *far),
        TraceCall::StencilFunc { func, reference, mask } => ctx.stencil_func(*func, *reference, *mask),
        TraceCall::StencilFuncSeparate {
            face,
            func,
            reference,
            mask,
        } => ctx.stencil_func_separate(*face, *func, *reference, *mask),
        TraceCall::StencilOp { fail, depth_fail, pass } => ctx.stencil_op(*fail, *depth_fail, *pass),
        TraceCall::StencilOpSeparate {
            face,
            fail,
            depth_fail,
            pass,
        } => ctx.stencil_op_separate(*face, *fail, *depth_fail, *pass),
        TraceCall::StencilMask { mask } => ctx.stencil_mask(*mask),
        TraceCall::BlendFunc { src, dst } => ctx.blend_func(*src, *dst),
        TraceCall::BlendFuncSeparate {
            src_rgb,
            dst_rgb,
            src_alpha,
            dst_alpha,
        } => ctx.blend_func_separate(*src_rgb, *dst_rgb, *src_alpha, *dst_alpha),
        TraceCall::BlendEquation { mode } => ctx.blend_equation(*mode),
        TraceCall::BlendEquationSeparate { rgb, alpha } => ctx.blend_equation_separate(*rgb, *alpha),
        TraceCall::BlendColor { rgba: [r, g, b, a] } => ctx.blend_color(*r, *g, *b, *a),
        TraceCall::ColorMask {
            red,
            green,
            blue,
            alpha,
        } => ctx.color_mask(*red, *green, *blue, *alpha),
        TraceCall::CullFace { face } => ctx.cull_face(*face),
        TraceCall::FrontFace { winding } => ctx.front_face(*winding),
        TraceCall::PolygonOffset { factor, units } => ctx.polygon_offset(*factor, *units),
        TraceCall::PolygonMode { face, mode } => ctx.polygon_mode(*face, *mode),
        TraceCall::Viewport { x, y, width, height } => ctx.viewport(*x, *y, *width, *height),
        TraceCall::Scissor { x, y, width, height } => ctx.scissor(*x, *y, *width, *height),
        TraceCall::ClearColor { rgba: [r, g, b, a] } => ctx.clear_color(*r, *g, *b, *a),
        TraceCall::ClearDepth { depth } => ctx.clear_depth(*depth),
        TraceCall::ClearStencil { stencil } => ctx.clear_stencil(*stencil),
        TraceCall::Clear { mask } => ctx.clear(*mask),

        TraceCall::ActiveTexture { texture } => ctx.active_texture(*texture),
        TraceCall::ClientActiveTexture { texture } => ctx.client_active_texture(*texture),
        TraceCall::TexEnv { target, pname, params } => ctx.tex_env_fv(*target, *pname, params),
        TraceCall::TexGen { coord, pname, params } => ctx.tex_gen_fv(*coord, *pname, params),
        TraceCall::GenTextures { names } => ctx.gen_textures(names),
        TraceCall::BindTexture { target, texture } => ctx.bind_texture(*target, *texture),
        TraceCall::DeleteTextures { names } => ctx.delete_textures(names),
        TraceCall::TexParameter { target, pname, value } => ctx.tex_parameter(*target, *pname, (*value).into()),
        TraceCall::TexImage1D {
            target,
            level,
            internal_format,
            width,
            border,
            format,
            ty,
            data,
        } => {
            let bytes = data.as_ref().map(|d| d.to_bytes());
            ctx.tex_image_1d(*target, *level, *internal_format, *width, *border, *format, *ty, bytes.as_deref())
        }
        TraceCall::TexImage2D {
            target,
            level,
            internal_format,
            width,
            height,
            border,
            format,
            ty,
            data,
        } => {
            let bytes = data.as_ref().map(|d| d.to_bytes());
            ctx.tex_image_2d(
                *target,
                *level,
                *internal_format,
                *width,
                *height,
                *border,
                *format,
                *ty,
                bytes.as_deref(),
            )
        }
        TraceCall::TexImage3D {
            target,
            level,
            internal_format,
            width,
            height,
            depth,
            border,
            format,
            ty,
            data,
        } => {
            let bytes = data.as_ref().map(|d| d.to_bytes());
            ctx.tex_image_3d(
                *target,
                *level,
                *internal_format,
                *width,
                *height,
                *depth,
                *border,
                *format,
                *ty,
                bytes.as_deref(),
            )
        }
        TraceCall::CompressedTexImage2D {
            target,
            level,
            internal_format,
            width,
            height,
            border,
            data,
        } => ctx.compressed_tex_image_2d(
            *target,
            *level,
            *internal_format,
            *width,
            *height,
            *border,
            &data.to_bytes(),
        ),
        TraceCall::TexSubImage2D {
            target,
            level,
            x,
            y,
            width,
            height,
            format,
            ty,
            data,
        } => ctx.tex_sub_image_2d(*target, *level, *x, *y, *width, *height, *format, *ty, &data.to_bytes()),

        TraceCall::GenBuffers { names } => ctx.gen_buffers(names),
        TraceCall::BindBuffer { target, buffer } => ctx.bind_buffer(*target, *buffer),
        TraceCall::DeleteBuffers { names } => ctx.delete_buffers(names),
        TraceCall::BufferData { target, size, data } => {
            let bytes = data.as_ref().map(|d| d.to_bytes());
            ctx.buffer_data(*target, *size, bytes.as_deref())
        }
        TraceCall::BufferSubData { target, offset, data } => ctx.buffer_sub_data(*target, *offset, &data.to_bytes()),

        TraceCall::GenPrograms { names } => ctx.gen_programs(names),
        TraceCall::BindProgram { target, program } => ctx.bind_program(*target, *program),
        TraceCall::DeletePrograms { names } => ctx.delete_programs(names),
        TraceCall::ProgramString { target, format, text } => ctx.program_string(*target, *format, text),
        TraceCall::ProgramEnvParameter { target, index, params } => {
            ctx.program_env_parameter4fv(*target, *index, params)
        }
        TraceCall::ProgramLocalParameter { target, index, params } => {
            ctx.program_local_parameter4fv(*target, *index, params)
        }
        TraceCall::ProgramEnvParameters { target, index, params } => {
            ctx.program_env_parameters4fv(*target, *index, params)
        }
        TraceCall::ProgramLocalParameters { target, index, params } => {
            ctx.program_local_parameters4fv(*target, *index, params)
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use aero_gl::ContextConfig;

    use super::*;

    const TRIANGLE: &str = r#"
# immediate-mode triangle
{"call":"Begin","mode":4}
{"call":"Color","rgba":[1.0,0.0,0.0]}
{"call":"Vertex","coords":[0.0,0.0]}
{"call":"Vertex","coords":[1.0,0.0]}
{"call":"Vertex","coords":[0.0,1.0]}
{"call":"End"}
"#;

    fn context() -> GlContext<RecordingDevice> {
        GlContext::new(RecordingDevice::new(31, 16), ContextConfig::default()).unwrap()
    }

    #[test]
    fn comments_and_blank_lines_keep_line_numbers() {
        let records = parse_trace(TRIANGLE.as_bytes()).unwrap();
        assert_eq!(records.len(), 6);
        assert_eq!(records[0].line, 3);
        assert_eq!(records[5].call, TraceCall::End);
    }

    #[test]
    fn replays_an_immediate_mode_draw() {
        let mut ctx = context();
        let summary = replay_calls(&mut ctx, parse_trace(TRIANGLE.as_bytes()).unwrap()).unwrap();
        assert_eq!(summary.calls, 6);
        assert_eq!(summary.draws, 1);
        assert_eq!(summary.device.draws, 1);
        assert_eq!(summary.device.live_buffers, 0);
        assert_eq!(summary.device.live_programs, 0);
    }

    #[test]
    fn first_fatal_error_reports_its_line() {
        let trace = "{\"call\":\"MatrixMode\",\"mode\":5888}\n{\"call\":\"PopMatrix\"}\n{\"call\":\"LoadIdentity\"}\n";
        let mut ctx = context();
        let err = replay_calls(&mut ctx, parse_trace(trace.as_bytes()).unwrap()).unwrap_err();
        assert_eq!(err.line(), 2);
        assert!(matches!(
            err,
            ReplayError::Call {
                source: GlError::MatrixStackUnderflow { .. },
                ..
            }
        ));
    }

    #[test]
    fn malformed_records_report_their_line() {
        let err = parse_trace("{\"call\":\"End\"}\nnot json\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ReplayError::Parse { line: 2, .. }));
    }
}
