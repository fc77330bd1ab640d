//! In-memory device that validates every call and records each draw.
//!
//! Used by the replay driver when no hardware backend is attached and by the
//! tests: every draw is captured together with the vertex data, indices,
//! samplers and programs it would have consumed.

use std::sync::atomic::{AtomicU64, Ordering};

use hashbrown::HashMap;
use tracing::trace;
use xxhash_rust::xxh3::xxh3_64;

use super::{
    Arena, Buffer, BufferHandle, ClearRequest, Device, DeviceError, Program, ProgramHandle,
    SamplerConfig, ShaderCode, Texture, TextureDesc, TextureHandle, TextureWrite,
};
use crate::objects::texture::TextureTarget;
use crate::state::render::RenderState;
use crate::vertex::{ComponentType, StreamDescriptor};

/// Attachment formats the recorded pipelines are resolved against.
pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// Number of device vertex attribute indices.
pub const MAX_VERTEX_ATTRIBUTES: u32 = 16;

/// Counters for device object lifetimes and submitted work.
#[derive(Debug, Default)]
pub struct DeviceStats {
    buffers_created: AtomicU64,
    buffers_destroyed: AtomicU64,
    textures_created: AtomicU64,
    textures_destroyed: AtomicU64,
    programs_created: AtomicU64,
    programs_destroyed: AtomicU64,
    draws: AtomicU64,
    indexed_draws: AtomicU64,
    bytes_uploaded: AtomicU64,
}

impl DeviceStats {
    pub fn inc_buffers_created(&self) {
        self.buffers_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_buffers_destroyed(&self) {
        self.buffers_destroyed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_textures_created(&self) {
        self.textures_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_textures_destroyed(&self) {
        self.textures_destroyed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_programs_created(&self) {
        self.programs_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_programs_destroyed(&self) {
        self.programs_destroyed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_draws(&self) {
        self.draws.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_indexed_draws(&self) {
        self.indexed_draws.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_bytes_uploaded(&self, bytes: usize) {
        self.bytes_uploaded.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DeviceStatsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        DeviceStatsSnapshot {
            buffers_created: load(&self.buffers_created),
            textures_created: load(&self.textures_created),
            programs_created: load(&self.programs_created),
            live_buffers: load(&self.buffers_created) - load(&self.buffers_destroyed),
            live_textures: load(&self.textures_created) - load(&self.textures_destroyed),
            live_programs: load(&self.programs_created) - load(&self.programs_destroyed),
            draws: load(&self.draws),
            indexed_draws: load(&self.indexed_draws),
            bytes_uploaded: load(&self.bytes_uploaded),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceStatsSnapshot {
    pub buffers_created: u64,
    pub textures_created: u64,
    pub programs_created: u64,
    pub live_buffers: u64,
    pub live_textures: u64,
    pub live_programs: u64,
    /// Every draw, indexed or not.
    pub draws: u64,
    pub indexed_draws: u64,
    pub bytes_uploaded: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawCall {
    NonIndexed {
        start: u32,
        count: u32,
        instances: u32,
    },
    Indexed {
        start_index: u32,
        index_count: u32,
        min_index: u32,
        max_index: u32,
        base_vertex: i32,
        instances: u32,
    },
}

/// One enabled vertex attribute as seen by a draw, with a copy of the
/// buffer contents at draw time.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundAttribute {
    pub attribute: u32,
    pub stream: u32,
    pub descriptor: StreamDescriptor,
    pub data: Vec<u8>,
}

impl BoundAttribute {
    /// Components of `vertex`, for float streams only.
    pub fn vertex_f32(&self, vertex: u32) -> Option<Vec<f32>> {
        if self.descriptor.ty != ComponentType::Float {
            return None;
        }
        let stride = if self.descriptor.stride == 0 {
            usize::from(self.descriptor.components) * 4
        } else {
            self.descriptor.stride as usize
        };
        let start = self.descriptor.offset as usize + vertex as usize * stride;
        let end = start + usize::from(self.descriptor.components) * 4;
        let bytes = self.data.get(start..end)?;
        Some(
            bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        )
    }
}

/// Pipeline state a draw resolves to on the default attachments.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineRecord {
    pub primitive: wgpu::PrimitiveState,
    pub depth_stencil: wgpu::DepthStencilState,
    pub color_target: wgpu::ColorTargetState,
}

impl PipelineRecord {
    fn resolve(state: &RenderState, topology: wgpu::PrimitiveTopology) -> Self {
        Self {
            primitive: state.primitive_state(topology),
            depth_stencil: state.depth_stencil_state(DEPTH_FORMAT),
            color_target: state.color_target_state(COLOR_FORMAT),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DrawRecord {
    pub call: DrawCall,
    pub topology: wgpu::PrimitiveTopology,
    pub render_state: RenderState,
    pub pipeline: PipelineRecord,
    /// Sorted by attribute index.
    pub attributes: Vec<BoundAttribute>,
    /// Indices read by an indexed draw, before `base_vertex` is applied.
    pub indices: Option<Vec<u32>>,
    pub samplers: Vec<(u32, SamplerConfig)>,
    pub vertex_shader: ShaderCode,
    pub fragment_shader: ShaderCode,
    pub vertex_default: [f32; 4],
}

impl DrawRecord {
    pub fn attribute(&self, attribute: u32) -> Option<&BoundAttribute> {
        self.attributes.iter().find(|a| a.attribute == attribute)
    }

    /// Vertex numbers fetched by the draw, in submission order.
    pub fn vertices(&self) -> Vec<u32> {
        match (self.call, &self.indices) {
            (DrawCall::NonIndexed { start, count, .. }, _) => (start..start + count).collect(),
            (DrawCall::Indexed { base_vertex, .. }, Some(indices)) => indices
                .iter()
                .map(|&i| (i as i64 + i64::from(base_vertex)) as u32)
                .collect(),
            (DrawCall::Indexed { .. }, None) => Vec::new(),
        }
    }
}

#[derive(Debug)]
struct TextureRecord {
    desc: TextureDesc,
    /// Keyed by (layer, level).
    levels: HashMap<(u32, u32), Vec<u8>>,
}

#[derive(Debug)]
struct ProgramRecord {
    code: ShaderCode,
    hash: u64,
}

#[derive(Clone, Copy, Debug)]
struct IndexBinding {
    buffer: BufferHandle,
    offset: u64,
    format: wgpu::IndexFormat,
}

#[derive(Debug)]
pub struct RecordingDevice {
    buffers: Arena<Buffer, Vec<u8>>,
    textures: Arena<Texture, TextureRecord>,
    programs: Arena<Program, ProgramRecord>,
    streams: Vec<Option<StreamDescriptor>>,
    attributes: [Option<u32>; MAX_VERTEX_ATTRIBUTES as usize],
    samplers: Vec<Option<SamplerConfig>>,
    index_buffer: Option<IndexBinding>,
    vertex_shader: Option<ProgramHandle>,
    fragment_shader: Option<ProgramHandle>,
    vertex_default: [f32; 4],
    render_state: Option<(RenderState, wgpu::PrimitiveTopology)>,
    resolution: Option<(u32, u32)>,
    clears: Vec<ClearRequest>,
    draws: Vec<DrawRecord>,
    stats: DeviceStats,
}

impl RecordingDevice {
    pub fn new(stream_slots: u32, sampler_slots: u32) -> Self {
        Self {
            buffers: Arena::new(),
            textures: Arena::new(),
            programs: Arena::new(),
            streams: vec![None; stream_slots as usize],
            attributes: [None; MAX_VERTEX_ATTRIBUTES as usize],
            samplers: vec![None; sampler_slots as usize],
            index_buffer: None,
            vertex_shader: None,
            fragment_shader: None,
            vertex_default: [0.0, 0.0, 0.0, 1.0],
            render_state: None,
            resolution: None,
            clears: Vec::new(),
            draws: Vec::new(),
            stats: DeviceStats::default(),
        }
    }

    pub fn stats(&self) -> &DeviceStats {
        &self.stats
    }

    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    pub fn take_draws(&mut self) -> Vec<DrawRecord> {
        std::mem::take(&mut self.draws)
    }

    pub fn clears(&self) -> &[ClearRequest] {
        &self.clears
    }

    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(buffer).map(Vec::as_slice)
    }

    pub fn texture_desc(&self, texture: TextureHandle) -> Option<&TextureDesc> {
        self.textures.get(texture).map(|record| &record.desc)
    }

    pub fn texture_level(&self, texture: TextureHandle, layer: u32, level: u32) -> Option<&[u8]> {
        self.textures
            .get(texture)
            .and_then(|record| record.levels.get(&(layer, level)))
            .map(Vec::as_slice)
    }

    pub fn program(&self, program: ProgramHandle) -> Option<&ShaderCode> {
        self.programs.get(program).map(|record| &record.code)
    }

    /// Programs alive on the device with their source hashes.
    pub fn programs(&self) -> impl Iterator<Item = (u64, &ShaderCode)> {
        self.programs.iter().map(|(_, record)| (record.hash, &record.code))
    }

    pub fn bound_stream_count(&self) -> usize {
        self.streams.iter().filter(|s| s.is_some()).count()
    }

    pub fn enabled_attribute_count(&self) -> usize {
        self.attributes.iter().filter(|a| a.is_some()).count()
    }

    pub fn enabled_sampler_count(&self) -> usize {
        self.samplers.iter().filter(|s| s.is_some()).count()
    }

    pub fn vertex_default_value(&self) -> [f32; 4] {
        self.vertex_default
    }

    fn buffer_mut(&mut self, buffer: BufferHandle) -> Result<&mut Vec<u8>, DeviceError> {
        self.buffers
            .get_mut(buffer)
            .ok_or_else(|| DeviceError::stale("buffer", buffer))
    }

    fn check_stream(&self, stream: u32) -> Result<(), DeviceError> {
        if (stream as usize) < self.streams.len() {
            Ok(())
        } else {
            Err(DeviceError::InvalidStream(stream))
        }
    }

    fn shader(&self, program: Option<ProgramHandle>, what: &'static str) -> Result<ShaderCode, DeviceError> {
        let program = program.ok_or(DeviceError::IncompleteDraw(what))?;
        self.programs
            .get(program)
            .map(|record| record.code.clone())
            .ok_or_else(|| DeviceError::stale("program", program))
    }

    fn bound_attributes(&self) -> Result<Vec<BoundAttribute>, DeviceError> {
        let mut out = Vec::new();
        for (attribute, stream) in self.attributes.iter().enumerate() {
            let Some(stream) = *stream else { continue };
            let descriptor = self.streams[stream as usize].ok_or(DeviceError::UnboundStream {
                attribute: attribute as u32,
                stream,
            })?;
            let data = self
                .buffers
                .get(descriptor.buffer)
                .ok_or_else(|| DeviceError::stale("buffer", descriptor.buffer))?;
            out.push(BoundAttribute {
                attribute: attribute as u32,
                stream,
                descriptor,
                data: data.clone(),
            });
        }
        Ok(out)
    }

    fn bound_samplers(&self) -> Result<Vec<(u32, SamplerConfig)>, DeviceError> {
        let mut out = Vec::new();
        for (id, config) in self.samplers.iter().enumerate() {
            let Some(config) = config else { continue };
            if !self.textures.contains(config.texture) {
                return Err(DeviceError::stale("texture", config.texture));
            }
            out.push((id as u32, *config));
        }
        Ok(out)
    }

    fn record_draw(&mut self, call: DrawCall, indices: Option<Vec<u32>>) -> Result<(), DeviceError> {
        let (render_state, topology) = self
            .render_state
            .clone()
            .ok_or(DeviceError::IncompleteDraw("render state"))?;
        let record = DrawRecord {
            call,
            topology,
            pipeline: PipelineRecord::resolve(&render_state, topology),
            render_state,
            attributes: self.bound_attributes()?,
            indices,
            samplers: self.bound_samplers()?,
            vertex_shader: self.shader(self.vertex_shader, "vertex shader")?,
            fragment_shader: self.shader(self.fragment_shader, "fragment shader")?,
            vertex_default: self.vertex_default,
        };
        trace!(?call, attributes = record.attributes.len(), samplers = record.samplers.len(), "draw recorded");
        self.stats.inc_draws();
        if matches!(call, DrawCall::Indexed { .. }) {
            self.stats.inc_indexed_draws();
        }
        self.draws.push(record);
        Ok(())
    }
}

fn texel_size(format: wgpu::TextureFormat) -> Option<u32> {
    match format {
        wgpu::TextureFormat::Depth24Plus => Some(4),
        other => other.block_copy_size(None),
    }
}

impl Device for RecordingDevice {
    fn create_buffer(&mut self, size: usize, data: Option<&[u8]>) -> Result<BufferHandle, DeviceError> {
        let mut contents = vec![0u8; size];
        if let Some(data) = data {
            if data.len() > size {
                return Err(DeviceError::BufferWriteOutOfBounds {
                    buffer_size: size,
                    write_end: data.len(),
                });
            }
            contents[..data.len()].copy_from_slice(data);
            self.stats.add_bytes_uploaded(data.len());
        }
        self.stats.inc_buffers_created();
        Ok(self.buffers.insert(contents))
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) -> Result<(), DeviceError> {
        self.buffers
            .remove(buffer)
            .ok_or_else(|| DeviceError::stale("buffer", buffer))?;
        self.stats.inc_buffers_destroyed();
        Ok(())
    }

    fn resize_buffer(&mut self, buffer: BufferHandle, size: usize) -> Result<(), DeviceError> {
        self.buffer_mut(buffer)?.resize(size, 0);
        Ok(())
    }

    fn clear_buffer(&mut self, buffer: BufferHandle) -> Result<(), DeviceError> {
        self.buffer_mut(buffer)?.clear();
        Ok(())
    }

    fn push_data(&mut self, buffer: BufferHandle, data: &[u8]) -> Result<(), DeviceError> {
        self.buffer_mut(buffer)?.extend_from_slice(data);
        self.stats.add_bytes_uploaded(data.len());
        Ok(())
    }

    fn update_data(&mut self, buffer: BufferHandle, offset: usize, data: &[u8]) -> Result<(), DeviceError> {
        let contents = self.buffer_mut(buffer)?;
        let write_end = offset + data.len();
        if write_end > contents.len() {
            return Err(DeviceError::BufferWriteOutOfBounds {
                buffer_size: contents.len(),
                write_end,
            });
        }
        contents[offset..write_end].copy_from_slice(data);
        self.stats.add_bytes_uploaded(data.len());
        Ok(())
    }

    fn set_stream(&mut self, stream: u32, descriptor: &StreamDescriptor) -> Result<(), DeviceError> {
        self.check_stream(stream)?;
        if !self.buffers.contains(descriptor.buffer) {
            return Err(DeviceError::stale("buffer", descriptor.buffer));
        }
        self.streams[stream as usize] = Some(*descriptor);
        Ok(())
    }

    fn enable_vertex_attribute(&mut self, attribute: u32, stream: u32) -> Result<(), DeviceError> {
        if attribute >= MAX_VERTEX_ATTRIBUTES {
            return Err(DeviceError::InvalidAttribute(attribute));
        }
        self.check_stream(stream)?;
        self.attributes[attribute as usize] = Some(stream);
        Ok(())
    }

    fn disable_vertex_attribute(&mut self, attribute: u32) -> Result<(), DeviceError> {
        let slot = self
            .attributes
            .get_mut(attribute as usize)
            .ok_or(DeviceError::InvalidAttribute(attribute))?;
        if let Some(stream) = slot.take() {
            self.streams[stream as usize] = None;
        }
        Ok(())
    }

    fn disable_vertex_attributes(&mut self) {
        self.attributes = [None; MAX_VERTEX_ATTRIBUTES as usize];
        self.streams.iter_mut().for_each(|s| *s = None);
    }

    fn set_sampler(&mut self, sampler: u32, config: Option<&SamplerConfig>) -> Result<(), DeviceError> {
        let slot = self
            .samplers
            .get_mut(sampler as usize)
            .ok_or(DeviceError::InvalidSampler(sampler))?;
        if let Some(config) = config {
            if !self.textures.contains(config.texture) {
                return Err(DeviceError::stale("texture", config.texture));
            }
        }
        *slot = config.copied();
        Ok(())
    }

    fn set_index_buffer(
        &mut self,
        buffer: BufferHandle,
        offset: u64,
        format: wgpu::IndexFormat,
    ) -> Result<(), DeviceError> {
        if !self.buffers.contains(buffer) {
            return Err(DeviceError::stale("buffer", buffer));
        }
        self.index_buffer = Some(IndexBinding {
            buffer,
            offset,
            format,
        });
        Ok(())
    }

    fn draw(&mut self, start: u32, count: u32, instances: u32) -> Result<(), DeviceError> {
        self.record_draw(
            DrawCall::NonIndexed {
                start,
                count,
                instances,
            },
            None,
        )
    }

    fn draw_indexed(
        &mut self,
        start_index: u32,
        index_count: u32,
        min_index: u32,
        max_index: u32,
        base_vertex: i32,
        instances: u32,
    ) -> Result<(), DeviceError> {
        let binding = self
            .index_buffer
            .ok_or(DeviceError::IncompleteDraw("index buffer"))?;
        let bytes = self
            .buffers
            .get(binding.buffer)
            .ok_or_else(|| DeviceError::stale("buffer", binding.buffer))?;
        let size = match binding.format {
            wgpu::IndexFormat::Uint16 => 2,
            wgpu::IndexFormat::Uint32 => 4,
        };
        let start = binding.offset as usize + start_index as usize * size;
        let read_end = start + index_count as usize * size;
        let window = bytes.get(start..read_end).ok_or(DeviceError::IndexReadOutOfBounds {
            buffer_size: bytes.len(),
            read_end,
        })?;
        let indices: Vec<u32> = match binding.format {
            wgpu::IndexFormat::Uint16 => window
                .chunks_exact(2)
                .map(|c| u32::from(u16::from_le_bytes([c[0], c[1]])))
                .collect(),
            wgpu::IndexFormat::Uint32 => window
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        };
        self.record_draw(
            DrawCall::Indexed {
                start_index,
                index_count,
                min_index,
                max_index,
                base_vertex,
                instances,
            },
            Some(indices),
        )
    }

    fn create_shader_program(&mut self, code: ShaderCode) -> Result<ProgramHandle, DeviceError> {
        let hash = xxh3_64(code.source.as_bytes());
        self.stats.inc_programs_created();
        Ok(self.programs.insert(ProgramRecord { code, hash }))
    }

    fn destroy_program(&mut self, program: ProgramHandle) -> Result<(), DeviceError> {
        self.programs
            .remove(program)
            .ok_or_else(|| DeviceError::stale("program", program))?;
        if self.vertex_shader == Some(program) {
            self.vertex_shader = None;
        }
        if self.fragment_shader == Some(program) {
            self.fragment_shader = None;
        }
        self.stats.inc_programs_destroyed();
        Ok(())
    }

    fn set_vertex_shader(&mut self, program: ProgramHandle) -> Result<(), DeviceError> {
        if !self.programs.contains(program) {
            return Err(DeviceError::stale("program", program));
        }
        self.vertex_shader = Some(program);
        Ok(())
    }

    fn set_fragment_shader(&mut self, program: ProgramHandle) -> Result<(), DeviceError> {
        if !self.programs.contains(program) {
            return Err(DeviceError::stale("program", program));
        }
        self.fragment_shader = Some(program);
        Ok(())
    }

    fn set_vertex_default_value(&mut self, color: [f32; 4]) {
        self.vertex_default = color;
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureHandle, DeviceError> {
        self.stats.inc_textures_created();
        Ok(self.textures.insert(TextureRecord {
            desc: *desc,
            levels: HashMap::new(),
        }))
    }

    fn write_texture(&mut self, texture: TextureHandle, write: &TextureWrite<'_>) -> Result<(), DeviceError> {
        let record = self
            .textures
            .get_mut(texture)
            .ok_or_else(|| DeviceError::stale("texture", texture))?;
        let desc = record.desc;
        let layers = if desc.target == TextureTarget::CubeMap {
            desc.depth_or_layers
        } else {
            1
        };
        let out_of_bounds = DeviceError::TextureWriteOutOfBounds {
            level: write.level,
            layer: write.layer,
        };
        if write.level >= desc.mip_levels || write.layer >= layers {
            return Err(out_of_bounds);
        }
        let level_w = (desc.width >> write.level).max(1);
        let level_h = (desc.height >> write.level).max(1);
        let level_d = if desc.target == TextureTarget::Texture3D {
            (desc.depth_or_layers >> write.level).max(1)
        } else {
            1
        };
        let [x, y, z] = write.origin;
        let [w, h, d] = write.size;
        if x + w > level_w || y + h > level_h || z + d > level_d {
            return Err(out_of_bounds);
        }

        let (bw, bh) = desc.format.block_dimensions();
        let full = write.origin == [0, 0, 0] && [w, h, d] == [level_w, level_h, level_d];
        if full || (bw, bh) != (1, 1) {
            // Block-compressed data is only ever written whole.
            if !full {
                return Err(out_of_bounds);
            }
            record.levels.insert((write.layer, write.level), write.data.to_vec());
        } else {
            let texel = texel_size(desc.format).ok_or(out_of_bounds.clone())? as usize;
            let level_len = (level_w * level_h * level_d) as usize * texel;
            let row_len = w as usize * texel;
            if write.data.len() < row_len * (h * d) as usize {
                return Err(out_of_bounds);
            }
            let level = record
                .levels
                .entry((write.layer, write.level))
                .or_insert_with(|| vec![0; level_len]);
            for slice in 0..d as usize {
                for row in 0..h as usize {
                    let src = (slice * h as usize + row) * row_len;
                    let dst = (((z as usize + slice) * level_h as usize + y as usize + row)
                        * level_w as usize
                        + x as usize)
                        * texel;
                    level[dst..dst + row_len].copy_from_slice(&write.data[src..src + row_len]);
                }
            }
        }
        self.stats.add_bytes_uploaded(write.data.len());
        Ok(())
    }

    fn destroy_texture(&mut self, texture: TextureHandle) -> Result<(), DeviceError> {
        self.textures
            .remove(texture)
            .ok_or_else(|| DeviceError::stale("texture", texture))?;
        self.stats.inc_textures_destroyed();
        Ok(())
    }

    fn set_render_state(&mut self, state: &RenderState, topology: wgpu::PrimitiveTopology) {
        self.render_state = Some((state.clone(), topology));
    }

    fn clear(&mut self, request: &ClearRequest) {
        self.clears.push(*request);
    }

    fn resolution(&self) -> Option<(u32, u32)> {
        self.resolution
    }

    fn set_resolution(&mut self, width: u32, height: u32) {
        self.resolution = Some((width, height));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{ShaderLanguage, ShaderStage};

    fn code(stage: ShaderStage, source: &str) -> ShaderCode {
        ShaderCode {
            stage,
            language: ShaderLanguage::Wgsl,
            source: source.to_owned(),
            entry_point: "main".to_owned(),
            uniforms: Vec::new(),
        }
    }

    fn ready_device() -> RecordingDevice {
        let mut device = RecordingDevice::new(4, 2);
        let vs = device.create_shader_program(code(ShaderStage::Vertex, "vs")).unwrap();
        let fs = device.create_shader_program(code(ShaderStage::Fragment, "fs")).unwrap();
        device.set_vertex_shader(vs).unwrap();
        device.set_fragment_shader(fs).unwrap();
        device.set_render_state(&RenderState::default(), wgpu::PrimitiveTopology::TriangleList);
        device
    }

    #[test]
    fn destroyed_buffer_handle_is_stale() {
        let mut device = RecordingDevice::new(4, 2);
        let buffer = device.create_buffer(4, None).unwrap();
        device.destroy_buffer(buffer).unwrap();
        assert!(matches!(
            device.destroy_buffer(buffer),
            Err(DeviceError::StaleHandle { kind: "buffer", .. })
        ));
        assert!(device.update_data(buffer, 0, &[1]).is_err());
        assert_eq!(device.stats().snapshot().live_buffers, 0);
    }

    #[test]
    fn draw_requires_shaders_and_render_state() {
        let mut device = RecordingDevice::new(4, 2);
        assert_eq!(
            device.draw(0, 3, 1),
            Err(DeviceError::IncompleteDraw("render state"))
        );
        device.set_render_state(&RenderState::default(), wgpu::PrimitiveTopology::TriangleList);
        assert_eq!(
            device.draw(0, 3, 1),
            Err(DeviceError::IncompleteDraw("vertex shader"))
        );
    }

    #[test]
    fn attribute_without_stream_descriptor_fails_the_draw() {
        let mut device = ready_device();
        device.enable_vertex_attribute(0, 1).unwrap();
        assert_eq!(
            device.draw(0, 3, 1),
            Err(DeviceError::UnboundStream {
                attribute: 0,
                stream: 1
            })
        );
    }

    #[test]
    fn indexed_draw_records_decoded_indices() {
        let mut device = ready_device();
        let data: Vec<u8> = [2u16, 0, 1].iter().flat_map(|i| i.to_le_bytes()).collect();
        let indices = device.create_buffer(data.len(), Some(&data)).unwrap();
        device
            .set_index_buffer(indices, 2, wgpu::IndexFormat::Uint16)
            .unwrap();
        device.draw_indexed(0, 2, 0, 1, 5, 1).unwrap();
        let record = &device.draws()[0];
        assert_eq!(record.indices, Some(vec![0, 1]));
        assert_eq!(record.vertices(), vec![5, 6]);

        assert_eq!(
            device.draw_indexed(1, 2, 0, 2, 0, 1),
            Err(DeviceError::IndexReadOutOfBounds {
                buffer_size: 6,
                read_end: 8
            })
        );
        assert_eq!(device.stats().snapshot().indexed_draws, 1);
    }

    #[test]
    fn sub_region_texture_write_patches_rows() {
        let mut device = RecordingDevice::new(4, 2);
        let texture = device
            .create_texture(&TextureDesc {
                target: TextureTarget::Texture2D,
                format: wgpu::TextureFormat::R8Unorm,
                width: 4,
                height: 2,
                depth_or_layers: 1,
                mip_levels: 3,
            })
            .unwrap();
        device
            .write_texture(
                texture,
                &TextureWrite {
                    level: 0,
                    layer: 0,
                    origin: [1, 1, 0],
                    size: [2, 1, 1],
                    data: &[7, 8],
                },
            )
            .unwrap();
        assert_eq!(
            device.texture_level(texture, 0, 0).unwrap(),
            &[0, 0, 0, 0, 0, 7, 8, 0]
        );
        assert!(matches!(
            device.write_texture(
                texture,
                &TextureWrite {
                    level: 3,
                    layer: 0,
                    origin: [0, 0, 0],
                    size: [1, 1, 1],
                    data: &[0],
                },
            ),
            Err(DeviceError::TextureWriteOutOfBounds { level: 3, .. })
        ));
    }
}
