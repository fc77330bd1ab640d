//! The programmable-device contract the core drives.

pub mod arena;
pub mod recording;

use thiserror::Error;

pub use arena::{Arena, Handle};
pub use recording::{
    BoundAttribute, DeviceStats, DeviceStatsSnapshot, DrawCall, DrawRecord, PipelineRecord,
    RecordingDevice,
};

use crate::objects::texture::TextureTarget;
use crate::state::render::RenderState;
use crate::vertex::StreamDescriptor;

/// Handle tag for device buffers.
#[derive(Debug)]
pub enum Buffer {}
/// Handle tag for device textures.
#[derive(Debug)]
pub enum Texture {}
/// Handle tag for device shader programs.
#[derive(Debug)]
pub enum Program {}

pub type BufferHandle = Handle<Buffer>;
pub type TextureHandle = Handle<Texture>;
pub type ProgramHandle = Handle<Program>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("stale or unknown {kind} handle #{index}v{generation}")]
    StaleHandle {
        kind: &'static str,
        index: u32,
        generation: u32,
    },
    #[error("stream {0} out of range")]
    InvalidStream(u32),
    #[error("sampler {0} out of range")]
    InvalidSampler(u32),
    #[error("vertex attribute {0} out of range")]
    InvalidAttribute(u32),
    #[error("buffer write out of bounds (buffer size {buffer_size}, write end {write_end})")]
    BufferWriteOutOfBounds { buffer_size: usize, write_end: usize },
    #[error("texture write out of bounds (level {level}, layer {layer})")]
    TextureWriteOutOfBounds { level: u32, layer: u32 },
    #[error("vertex attribute {attribute} enabled on stream {stream} with no descriptor")]
    UnboundStream { attribute: u32, stream: u32 },
    #[error("index buffer read out of bounds (buffer size {buffer_size}, read end {read_end})")]
    IndexReadOutOfBounds { buffer_size: usize, read_end: usize },
    #[error("draw issued without {0}")]
    IncompleteDraw(&'static str),
}

impl DeviceError {
    pub(crate) fn stale<T>(kind: &'static str, handle: Handle<T>) -> Self {
        Self::StaleHandle {
            kind,
            index: handle.index(),
            generation: handle.generation(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderLanguage {
    Wgsl,
    /// Assembly-dialect program text with its constant banks resolved.
    ArbAssembly,
}

/// Device-ready program: source plus the uniform block it expects.
#[derive(Clone, Debug, PartialEq)]
pub struct ShaderCode {
    pub stage: ShaderStage,
    pub language: ShaderLanguage,
    pub source: String,
    pub entry_point: String,
    /// Bytes for the program's uniform block at group 0, binding 0.
    pub uniforms: Vec<u8>,
}

/// Full configuration of one enabled sampler slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplerConfig {
    /// Texture unit the fragment program addresses this sampler as.
    pub unit: u32,
    pub texture: TextureHandle,
    pub min_filter: wgpu::FilterMode,
    /// `None` disables mipmapping.
    pub mipmap_filter: Option<wgpu::FilterMode>,
    pub mag_filter: wgpu::FilterMode,
    /// (s, t, r).
    pub address_modes: [wgpu::AddressMode; 3],
    pub min_lod: f32,
    pub max_lod: f32,
    pub lod_bias: f32,
    pub max_anisotropy: u16,
    pub non_normalized_coordinates: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureDesc {
    pub target: TextureTarget,
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
    /// Depth for 3D textures, six faces for cube maps, one otherwise.
    pub depth_or_layers: u32,
    pub mip_levels: u32,
}

#[derive(Clone, Copy, Debug)]
pub struct TextureWrite<'a> {
    pub level: u32,
    pub layer: u32,
    pub origin: [u32; 3],
    pub size: [u32; 3],
    pub data: &'a [u8],
}

/// Which buffers a clear touches, with their clear values.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClearRequest {
    pub color: Option<[u8; 4]>,
    pub depth: Option<f32>,
    pub stencil: Option<u32>,
}

/// Operations a programmable device exposes to the translation core.
///
/// One implementation exists per target device. Every call is synchronous;
/// handles are generation-checked so a destroyed resource can never be
/// reached through an old handle.
pub trait Device {
    fn create_buffer(&mut self, size: usize, data: Option<&[u8]>) -> Result<BufferHandle, DeviceError>;
    fn destroy_buffer(&mut self, buffer: BufferHandle) -> Result<(), DeviceError>;
    /// Grows or shrinks the buffer, keeping the common prefix.
    fn resize_buffer(&mut self, buffer: BufferHandle, size: usize) -> Result<(), DeviceError>;
    fn clear_buffer(&mut self, buffer: BufferHandle) -> Result<(), DeviceError>;
    /// Appends to the end of the buffer.
    fn push_data(&mut self, buffer: BufferHandle, data: &[u8]) -> Result<(), DeviceError>;
    fn update_data(&mut self, buffer: BufferHandle, offset: usize, data: &[u8]) -> Result<(), DeviceError>;

    fn set_stream(&mut self, stream: u32, descriptor: &StreamDescriptor) -> Result<(), DeviceError>;
    fn enable_vertex_attribute(&mut self, attribute: u32, stream: u32) -> Result<(), DeviceError>;
    fn disable_vertex_attribute(&mut self, attribute: u32) -> Result<(), DeviceError>;
    fn disable_vertex_attributes(&mut self);

    /// `Some` enables the sampler with the given configuration, `None` disables it.
    fn set_sampler(&mut self, sampler: u32, config: Option<&SamplerConfig>) -> Result<(), DeviceError>;

    fn set_index_buffer(
        &mut self,
        buffer: BufferHandle,
        offset: u64,
        format: wgpu::IndexFormat,
    ) -> Result<(), DeviceError>;
    fn draw(&mut self, start: u32, count: u32, instances: u32) -> Result<(), DeviceError>;
    fn draw_indexed(
        &mut self,
        start_index: u32,
        index_count: u32,
        min_index: u32,
        max_index: u32,
        base_vertex: i32,
        instances: u32,
    ) -> Result<(), DeviceError>;

    fn create_shader_program(&mut self, code: ShaderCode) -> Result<ProgramHandle, DeviceError>;
    fn destroy_program(&mut self, program: ProgramHandle) -> Result<(), DeviceError>;
    fn set_vertex_shader(&mut self, program: ProgramHandle) -> Result<(), DeviceError>;
    fn set_fragment_shader(&mut self, program: ProgramHandle) -> Result<(), DeviceError>;
    /// Value read by vertex inputs with no enabled attribute.
    fn set_vertex_default_value(&mut self, color: [f32; 4]);

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureHandle, DeviceError>;
    fn write_texture(&mut self, texture: TextureHandle, write: &TextureWrite<'_>) -> Result<(), DeviceError>;
    fn destroy_texture(&mut self, texture: TextureHandle) -> Result<(), DeviceError>;

    fn set_render_state(&mut self, state: &RenderState, topology: wgpu::PrimitiveTopology);
    fn clear(&mut self, request: &ClearRequest);
    fn resolution(&self) -> Option<(u32, u32)>;
    fn set_resolution(&mut self, width: u32, height: u32);
}
