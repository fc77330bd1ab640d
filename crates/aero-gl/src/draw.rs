//! The draw orchestrator.
//!
//! One call to [`DrawOrchestrator::execute`] walks a draw through topology
//! resolution, shader resolution, attribute and sampler binding, the device
//! draw, and teardown. Everything that can fail on input is checked before
//! the first slot is leased; once leasing starts, teardown runs on every
//! path so the pools are always fully free when `execute` returns.

use tracing::debug;

use crate::device::{BufferHandle, Device, ProgramHandle, SamplerConfig, ShaderCode};
use crate::error::{GlError, Result};
use crate::fixed_function::{FixedFunctionSnapshot, ShaderSynthesizer};
use crate::objects::buffer::{BufferObjects, BufferTarget};
use crate::objects::texture::{BaseFormat, TextureObjects, TextureTarget};
use crate::program::{ProgramCompiler, ProgramManager, ProgramTarget};
use crate::slots::SlotPools;
use crate::state::fixed_function::FixedFunctionState;
use crate::state::matrix::MatrixStackGroup;
use crate::state::render::RenderState;
use crate::state::topology::{
    expand_indices, expand_nonindexed, translate_primitive_topology, GlPrimitive, TopologyEmulation,
};
use crate::texture_unit::TextureUnit;
use crate::vertex::compact::compact_indices;
use crate::vertex::convert::{convert_vertices, SourceLayout};
use crate::vertex::immediate::ImmediateBlock;
use crate::vertex::{
    encode_indices, ArrayPointer, ArraySource, AttributeSlot, ClientArray, ComponentType, IndexType,
    StreamDescriptor, VertexArrays,
};

/// Where a draw's vertices come from.
#[derive(Clone, Copy, Debug)]
pub enum DrawSource<'a> {
    /// `DrawArrays`: vertices `[first, first + count)`.
    Arrays { first: u32, count: u32 },
    /// `DrawElements` and `DrawRangeElements`.
    Elements {
        count: u32,
        ty: IndexType,
        indices: &'a ArrayPointer,
    },
    /// The block closed by `End`.
    Immediate(&'a ImmediateBlock),
}

#[derive(Clone, Copy, Debug)]
pub struct DrawRequest<'a> {
    pub call: &'static str,
    pub primitive: GlPrimitive,
    pub source: DrawSource<'a>,
    pub instances: u32,
}

/// Read-only view of the context state a draw consumes.
#[derive(Clone, Copy)]
pub struct DrawInputs<'a> {
    pub arrays: &'a VertexArrays,
    pub buffers: &'a BufferObjects,
    pub textures: &'a TextureObjects,
    pub units: &'a [TextureUnit],
    pub fixed: &'a FixedFunctionState,
    pub matrices: &'a MatrixStackGroup,
    pub render: &'a RenderState,
    pub programs: &'a ProgramManager,
    pub compiler: &'a dyn ProgramCompiler,
    pub synthesizer: &'a dyn ShaderSynthesizer,
    pub current_color: [f32; 4],
    pub texcoord_inputs: u8,
}

/// Where one attribute's device data comes from.
#[derive(Clone, Debug)]
enum AttributeData {
    /// An existing device buffer (buffer object or immediate accumulation).
    Resident(StreamDescriptor),
    /// Converted client memory to upload into a transient buffer.
    Upload { components: u8, floats: Vec<f32> },
}

/// The bound element buffer, read in place by the device.
#[derive(Clone, Copy, Debug)]
struct ResidentIndices {
    buffer: BufferHandle,
    offset: u64,
    format: wgpu::IndexFormat,
}

#[derive(Clone, Debug)]
enum DrawKind {
    NonIndexed {
        start: u32,
        count: u32,
    },
    /// `indices` is always the decoded list; it is uploaded into a transient
    /// buffer unless `resident` names a buffer the device can read directly.
    Indexed {
        indices: Vec<u32>,
        resident: Option<ResidentIndices>,
    },
}

/// Validated vertex-side work: what to bind and how to draw.
#[derive(Clone, Debug)]
struct VertexPlan {
    attributes: Vec<(AttributeSlot, AttributeData)>,
    kind: DrawKind,
}

/// Validated shader-side work.
#[derive(Clone, Debug)]
struct ShaderPlan {
    vertex: ShaderCode,
    fragment: ShaderCode,
    samplers: Vec<SamplerConfig>,
}

/// Everything acquired for one draw, released by [`DrawResources::teardown`].
#[derive(Debug, Default)]
struct DrawResources {
    streams: Vec<(u32, u32)>,
    samplers: Vec<u32>,
    buffers: Vec<BufferHandle>,
    programs: Vec<ProgramHandle>,
}

impl DrawResources {
    /// Releases every lease and transient resource, reporting the first
    /// failure after attempting all of them.
    fn teardown<D: Device>(self, device: &mut D, slots: &mut SlotPools) -> Result<()> {
        let mut first: Option<GlError> = None;
        let mut note = |result: Result<()>| {
            if let Err(err) = result {
                first.get_or_insert(err);
            }
        };
        for (attribute, stream) in self.streams {
            note(device.disable_vertex_attribute(attribute).map_err(Into::into));
            note(slots.streams.release(stream));
        }
        for sampler in self.samplers {
            note(device.set_sampler(sampler, None).map_err(Into::into));
            note(slots.samplers.release(sampler));
        }
        for buffer in self.buffers {
            note(device.destroy_buffer(buffer).map_err(Into::into));
        }
        for program in self.programs {
            note(device.destroy_program(program).map_err(Into::into));
        }
        first.map_or(Ok(()), Err)
    }
}

/// Owns the slot pools and sequences every draw.
#[derive(Debug)]
pub struct DrawOrchestrator {
    slots: SlotPools,
}

impl DrawOrchestrator {
    pub fn new(slots: SlotPools) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &SlotPools {
        &self.slots
    }

    pub fn execute<D: Device>(
        &mut self,
        device: &mut D,
        inputs: &DrawInputs<'_>,
        request: &DrawRequest<'_>,
    ) -> Result<()> {
        let translation = translate_primitive_topology(request.primitive);
        let plan = plan_vertices(inputs, request)?;
        let plan = match translation.emulation {
            Some(emulation) => emulate_topology(plan, emulation),
            None => plan,
        };
        let shaders = resolve_shaders(inputs, request.call)?;

        self.slots.streams.ensure_available(plan.attributes.len())?;
        self.slots.samplers.ensure_available(shaders.samplers.len())?;

        debug!(
            call = request.call,
            primitive = %request.primitive,
            topology = ?translation.topology,
            attributes = plan.attributes.len(),
            samplers = shaders.samplers.len(),
            indexed = matches!(plan.kind, DrawKind::Indexed { .. }),
            "draw"
        );

        let mut resources = DrawResources::default();
        let result = self.issue(device, inputs, request, translation.topology, plan, shaders, &mut resources);
        let teardown = resources.teardown(device, &mut self.slots);
        result.and(teardown)
    }

    #[allow(clippy::too_many_arguments)]
    fn issue<D: Device>(
        &mut self,
        device: &mut D,
        inputs: &DrawInputs<'_>,
        request: &DrawRequest<'_>,
        topology: wgpu::PrimitiveTopology,
        plan: VertexPlan,
        shaders: ShaderPlan,
        resources: &mut DrawResources,
    ) -> Result<()> {
        let vertex = device.create_shader_program(shaders.vertex)?;
        resources.programs.push(vertex);
        let fragment = device.create_shader_program(shaders.fragment)?;
        resources.programs.push(fragment);

        for (slot, data) in plan.attributes {
            let descriptor = match data {
                AttributeData::Resident(descriptor) => descriptor,
                AttributeData::Upload { components, floats } => {
                    let buffer = device.create_buffer(floats.len() * 4, Some(bytemuck::cast_slice(&floats)))?;
                    resources.buffers.push(buffer);
                    float_stream(buffer, components)
                }
            };
            let stream = self.slots.streams.lease()?;
            let attribute = slot.attribute_index();
            resources.streams.push((attribute, stream));
            device.set_stream(stream, &descriptor)?;
            device.enable_vertex_attribute(attribute, stream)?;
        }

        for config in &shaders.samplers {
            let sampler = self.slots.samplers.lease()?;
            resources.samplers.push(sampler);
            device.set_sampler(sampler, Some(config))?;
        }

        device.set_vertex_default_value(inputs.current_color);
        device.set_vertex_shader(vertex)?;
        device.set_fragment_shader(fragment)?;
        device.set_render_state(inputs.render, topology);

        match plan.kind {
            DrawKind::NonIndexed { start, count } => device.draw(start, count, request.instances)?,
            DrawKind::Indexed { indices, resident } => {
                match resident {
                    Some(resident) => device.set_index_buffer(resident.buffer, resident.offset, resident.format)?,
                    None => {
                        let (bytes, format) = encode_indices(&indices);
                        let buffer = device.create_buffer(bytes.len(), Some(&bytes))?;
                        resources.buffers.push(buffer);
                        device.set_index_buffer(buffer, 0, format)?;
                    }
                }
                let (min_index, max_index) = index_range(&indices);
                device.draw_indexed(0, indices.len() as u32, min_index, max_index, 0, request.instances)?;
            }
        }
        Ok(())
    }
}

fn float_stream(buffer: BufferHandle, components: u8) -> StreamDescriptor {
    StreamDescriptor {
        buffer,
        offset: 0,
        components,
        ty: ComponentType::Float,
        normalized: false,
        stride: u32::from(components) * 4,
        frequency: 0,
    }
}

fn index_range(indices: &[u32]) -> (u32, u32) {
    let min = indices.iter().copied().min().unwrap_or(0);
    let max = indices.iter().copied().max().unwrap_or(0);
    (min, max)
}

fn uploaded(indices: Vec<u32>) -> DrawKind {
    DrawKind::Indexed {
        indices,
        resident: None,
    }
}

/// Rewrites a plan for a primitive the device lacks by expanding its index
/// list on the CPU. Resident element buffers are dropped in favor of the
/// expanded upload.
fn emulate_topology(plan: VertexPlan, emulation: TopologyEmulation) -> VertexPlan {
    let kind = match plan.kind {
        DrawKind::NonIndexed { start, count } => uploaded(
            expand_nonindexed(emulation, count)
                .into_iter()
                .map(|i| i + start)
                .collect(),
        ),
        DrawKind::Indexed { indices, .. } => uploaded(expand_indices(emulation, &indices)),
    };
    VertexPlan {
        attributes: plan.attributes,
        kind,
    }
}

fn client_array<'a>(call: &'static str, slot: AttributeSlot, array: &'a ClientArray) -> Result<&'a ArraySource> {
    array.source.as_ref().ok_or(GlError::UninitializedArray {
        call,
        array: slot.name(),
    })
}

fn convert_client(
    call: &'static str,
    slot: AttributeSlot,
    array: &ClientArray,
    bytes: &[u8],
    vertices: impl IntoIterator<Item = u32>,
) -> Result<AttributeData> {
    let mut floats = Vec::new();
    convert_vertices(
        array.ty,
        array.normalized,
        SourceLayout {
            data: bytes,
            components: usize::from(array.components),
            stride: array.effective_stride(),
        },
        vertices,
        &mut floats,
    )
    .map_err(|oob| GlError::ClientArrayOutOfBounds {
        call,
        array: slot.name(),
        offset: oob.offset,
        len: oob.len,
        available: oob.available,
    })?;
    Ok(AttributeData::Upload {
        components: array.components,
        floats,
    })
}

fn resident_stream(
    inputs: &DrawInputs<'_>,
    call: &'static str,
    array: &ClientArray,
    name: u32,
    offset: usize,
    first: u32,
) -> Result<StreamDescriptor> {
    let buffer = inputs
        .buffers
        .get(name)
        .and_then(|object| object.device)
        .ok_or(GlError::UnknownObject {
            call,
            kind: "buffer",
            name,
        })?;
    let stride = array.effective_stride();
    Ok(StreamDescriptor {
        buffer,
        offset: (offset + first as usize * stride) as u64,
        components: array.components,
        ty: array.ty,
        normalized: array.normalized,
        stride: stride as u32,
        frequency: 0,
    })
}

fn plan_vertices(inputs: &DrawInputs<'_>, request: &DrawRequest<'_>) -> Result<VertexPlan> {
    let call = request.call;
    match request.source {
        DrawSource::Immediate(block) => Ok(VertexPlan {
            attributes: block
                .streams()
                .map(|(slot, descriptor)| (slot, AttributeData::Resident(descriptor)))
                .collect(),
            kind: DrawKind::NonIndexed {
                start: 0,
                count: block.vertex_count(),
            },
        }),
        DrawSource::Arrays { first, count } => plan_arrays(inputs, call, first, count),
        DrawSource::Elements { count, ty, indices } => plan_elements(inputs, call, count, ty, indices),
    }
}

/// Non-indexed draws. With any client array present every attribute is
/// rebased so vertex `first` lands at device vertex 0.
fn plan_arrays(inputs: &DrawInputs<'_>, call: &'static str, first: u32, count: u32) -> Result<VertexPlan> {
    let active = inputs.arrays.active();
    let mut sources = Vec::with_capacity(active.len());
    for (slot, array) in &active {
        sources.push(client_array(call, *slot, array)?);
    }
    let any_client = sources.iter().any(|source| matches!(source, ArraySource::Client(_)));
    let base = if any_client { first } else { 0 };

    let mut attributes = Vec::with_capacity(active.len());
    for ((slot, array), source) in active.iter().zip(sources) {
        let data = match source {
            ArraySource::Client(memory) => convert_client(call, *slot, array, memory.bytes(), first..first + count)?,
            ArraySource::Buffer { name, offset } => {
                AttributeData::Resident(resident_stream(inputs, call, array, *name, *offset, base)?)
            }
        };
        attributes.push((*slot, data));
    }
    Ok(VertexPlan {
        attributes,
        kind: DrawKind::NonIndexed {
            start: first - base,
            count,
        },
    })
}

fn plan_elements(
    inputs: &DrawInputs<'_>,
    call: &'static str,
    count: u32,
    ty: IndexType,
    pointer: &ArrayPointer,
) -> Result<VertexPlan> {
    let element_buffer = inputs.buffers.bound(BufferTarget::ElementArray);
    let (index_bytes, resident): (&[u8], Option<(BufferHandle, usize)>) = match (pointer, element_buffer) {
        (ArrayPointer::Client(memory), 0) => (memory.bytes(), None),
        (ArrayPointer::Offset(offset), name) if name != 0 => {
            let object = inputs.buffers.get(name).ok_or(GlError::UnknownObject {
                call,
                kind: "buffer",
                name,
            })?;
            let handle = object.device.ok_or(GlError::UnknownObject {
                call,
                kind: "buffer",
                name,
            })?;
            let bytes = object.data.get(*offset..).unwrap_or(&[]);
            (bytes, Some((handle, *offset)))
        }
        (ArrayPointer::Client(_), _) => {
            return Err(GlError::PointerKind {
                call,
                param: "indices",
                expected: "a buffer offset",
                state: "an element array buffer is bound",
            })
        }
        (ArrayPointer::Offset(_), _) => {
            return Err(GlError::PointerKind {
                call,
                param: "indices",
                expected: "client memory",
                state: "no element array buffer is bound",
            })
        }
    };
    let indices = ty.decode(call, index_bytes, count as usize)?;

    let active = inputs.arrays.active();
    let mut sources = Vec::with_capacity(active.len());
    for (slot, array) in &active {
        sources.push(client_array(call, *slot, array)?);
    }
    let client = sources.iter().filter(|s| matches!(s, ArraySource::Client(_))).count();

    if client == 0 {
        let mut attributes = Vec::with_capacity(active.len());
        for ((slot, array), source) in active.iter().zip(&sources) {
            if let ArraySource::Buffer { name, offset } = source {
                attributes.push((
                    *slot,
                    AttributeData::Resident(resident_stream(inputs, call, array, *name, *offset, 0)?),
                ));
            }
        }
        // Byte indices cannot be read in place; they are widened on upload.
        let resident = resident
            .filter(|_| ty != IndexType::U8)
            .map(|(buffer, offset)| ResidentIndices {
                buffer,
                offset: offset as u64,
                format: ty.device_format(),
            });
        let kind = DrawKind::Indexed { indices, resident };
        return Ok(VertexPlan { attributes, kind });
    }

    if client != sources.len() {
        return Err(GlError::MixedVertexArrays { call });
    }
    if resident.is_some() {
        return Err(GlError::ElementBufferWithClientArrays { call });
    }

    let compacted = compact_indices(&indices);
    let mut attributes = Vec::with_capacity(active.len());
    for ((slot, array), source) in active.iter().zip(&sources) {
        if let ArraySource::Client(memory) = source {
            attributes.push((
                *slot,
                convert_client(call, *slot, array, memory.bytes(), compacted.used.iter().copied())?,
            ));
        }
    }
    Ok(VertexPlan {
        attributes,
        kind: uploaded(compacted.remapped),
    })
}

/// Per-unit active target and the bound texture's base format.
fn active_textures(inputs: &DrawInputs<'_>) -> Vec<Option<(TextureTarget, BaseFormat)>> {
    inputs
        .units
        .iter()
        .map(|unit| {
            let target = unit.active_target()?;
            let base = inputs
                .textures
                .get(unit.binding(target), target)
                .map(|object| object.base_format())
                .unwrap_or_default();
            Some((target, base))
        })
        .collect()
}

fn sampler_config(inputs: &DrawInputs<'_>, call: &'static str, unit: u32, target: TextureTarget) -> Result<SamplerConfig> {
    let tex_unit = inputs
        .units
        .get(unit as usize)
        .ok_or(GlError::CapabilityOutOfRange {
            call,
            what: "texture unit",
            index: unit,
            limit: inputs.units.len() as u32,
        })?;
    let object = inputs.textures.get(tex_unit.binding(target), target);
    let (object, texture) = match object.and_then(|o| o.device.map(|handle| (o, handle))) {
        Some(found) => found,
        None => return Err(GlError::MissingTexture { call, unit }),
    };
    let params = &object.params;
    Ok(SamplerConfig {
        unit,
        texture,
        min_filter: params.min_filter.filter,
        mipmap_filter: params.min_filter.mipmap,
        mag_filter: params.mag_filter,
        address_modes: params.wrap,
        min_lod: params.min_lod,
        max_lod: params.max_lod,
        lod_bias: params.lod_bias + tex_unit.lod_bias,
        max_anisotropy: params.max_anisotropy,
        non_normalized_coordinates: target == TextureTarget::Rectangle,
    })
}

/// Synthesizes the stages without a user program and compiles the others.
fn resolve_shaders(inputs: &DrawInputs<'_>, call: &'static str) -> Result<ShaderPlan> {
    let flags = inputs.fixed.programs;
    let synthesized = if flags.vertex && flags.fragment {
        None
    } else {
        let active = active_textures(inputs);
        Some(inputs.synthesizer.synthesize(&FixedFunctionSnapshot {
            state: inputs.fixed,
            units: inputs.units,
            active: &active,
            matrices: inputs.matrices,
            texcoord_inputs: inputs.texcoord_inputs,
        })?)
    };

    let vertex = match synthesized.as_ref().and_then(|s| s.vertex.clone()) {
        Some(code) => code,
        None => {
            inputs
                .programs
                .compile(inputs.compiler, call, ProgramTarget::Vertex)?
                .code
        }
    };
    let (fragment, texture_units) = match synthesized.and_then(|s| s.fragment.map(|code| (code, s.texture_units))) {
        Some(found) => found,
        None => {
            let compiled = inputs
                .programs
                .compile(inputs.compiler, call, ProgramTarget::Fragment)?;
            (compiled.code, compiled.texture_units)
        }
    };

    let samplers = texture_units
        .into_iter()
        .map(|(unit, target)| sampler_config(inputs, call, unit, target))
        .collect::<Result<Vec<_>>>()?;
    Ok(ShaderPlan {
        vertex,
        fragment,
        samplers,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::device::{DrawCall, RecordingDevice, ShaderLanguage, ShaderStage};
    use crate::fixed_function::SynthesizedShaders;
    use crate::gl;
    use crate::objects::texture::{ImageUpload, PassthroughConverter};
    use crate::program::AssemblyPassthrough;
    use crate::slots::SlotKind;
    use crate::state::translate;
    use crate::vertex::ClientMemory;

    /// Returns fixed programs sampling `texture_units`, or fails outright.
    struct StubSynthesizer {
        texture_units: Vec<(u32, TextureTarget)>,
        fail: bool,
    }

    fn code(stage: ShaderStage) -> ShaderCode {
        ShaderCode {
            stage,
            language: ShaderLanguage::Wgsl,
            source: String::new(),
            entry_point: "main".into(),
            uniforms: Vec::new(),
        }
    }

    impl ShaderSynthesizer for StubSynthesizer {
        fn synthesize(&self, _: &FixedFunctionSnapshot<'_>) -> Result<SynthesizedShaders> {
            if self.fail {
                return Err(GlError::ProgramCompile {
                    call: "synthesize",
                    message: "stub failure".into(),
                });
            }
            Ok(SynthesizedShaders {
                hash: 0,
                vertex: Some(code(ShaderStage::Vertex)),
                fragment: Some(code(ShaderStage::Fragment)),
                texture_units: self.texture_units.clone(),
            })
        }
    }

    struct Fixture {
        device: RecordingDevice,
        orchestrator: DrawOrchestrator,
        arrays: VertexArrays,
        buffers: BufferObjects,
        textures: TextureObjects,
        units: Vec<TextureUnit>,
        fixed: FixedFunctionState,
        matrices: MatrixStackGroup,
        render: RenderState,
        programs: ProgramManager,
        compiler: AssemblyPassthrough,
        synthesizer: StubSynthesizer,
    }

    impl Fixture {
        fn new(sampler_slots: u32) -> Self {
            Self {
                device: RecordingDevice::new(31, sampler_slots),
                orchestrator: DrawOrchestrator::new(SlotPools::new(31, sampler_slots)),
                arrays: VertexArrays::new(8, 16),
                buffers: BufferObjects::new(),
                textures: TextureObjects::new(),
                units: vec![TextureUnit::default(); 4],
                fixed: FixedFunctionState::new(8),
                matrices: MatrixStackGroup::new(4, 4, 32),
                render: RenderState::default(),
                programs: ProgramManager::new(16),
                compiler: AssemblyPassthrough { texture_units: 4 },
                synthesizer: StubSynthesizer {
                    texture_units: Vec::new(),
                    fail: false,
                },
            }
        }

        fn draw(&mut self, primitive: GlPrimitive, source: DrawSource<'_>) -> Result<()> {
            let inputs = DrawInputs {
                arrays: &self.arrays,
                buffers: &self.buffers,
                textures: &self.textures,
                units: &self.units,
                fixed: &self.fixed,
                matrices: &self.matrices,
                render: &self.render,
                programs: &self.programs,
                compiler: &self.compiler,
                synthesizer: &self.synthesizer,
                current_color: [1.0, 0.5, 0.25, 1.0],
                texcoord_inputs: 0,
            };
            let request = DrawRequest {
                call: "glDraw",
                primitive,
                source,
                instances: 1,
            };
            self.orchestrator.execute(&mut self.device, &inputs, &request)
        }

        fn position_array(&mut self, source: ArraySource) {
            self.arrays
                .set_pointer(
                    "test",
                    AttributeSlot::Position,
                    ClientArray {
                        components: 3,
                        ty: ComponentType::Float,
                        stride: 0,
                        source: Some(source),
                        normalized: false,
                    },
                )
                .unwrap();
            self.arrays.set_enabled("test", AttributeSlot::Position, true).unwrap();
        }

        fn buffer(&mut self, target: BufferTarget, name: u32, bytes: &[u8]) {
            self.buffers.bind(target, name);
            self.buffers
                .buffer_data(&mut self.device, "test", target, bytes.len(), Some(bytes))
                .unwrap();
        }

        /// Binds a 1x1 RGBA texture with device storage on `unit`.
        fn texture(&mut self, unit: usize, name: u32) {
            self.textures.bind("test", TextureTarget::Texture2D, name).unwrap();
            self.textures
                .upload(
                    &mut self.device,
                    &PassthroughConverter,
                    "test",
                    name,
                    &ImageUpload {
                        target: TextureTarget::Texture2D,
                        layer: 0,
                        level: 0,
                        internal_format: gl::RGBA,
                        format_info: translate::internal_format("test", gl::RGBA).unwrap(),
                        width: 1,
                        height: 1,
                        depth: 1,
                        layout: Some((gl::RGBA, gl::UNSIGNED_BYTE)),
                        data: Some(&[255; 4]),
                    },
                )
                .unwrap();
            self.units[unit].bind(TextureTarget::Texture2D, name);
            self.units[unit].set_target_enabled(TextureTarget::Texture2D, true);
        }

        fn assert_clean(&self) {
            assert!(self.orchestrator.slots().all_free());
            assert_eq!(self.device.stats().snapshot().live_programs, 0);
        }
    }

    fn floats(values: &[f32]) -> ClientMemory {
        ClientMemory::new(bytemuck::cast_slice::<f32, u8>(values).to_vec())
    }

    #[test]
    fn client_arrays_are_rebased_to_vertex_zero() {
        let mut fx = Fixture::new(16);
        fx.position_array(ArraySource::Client(floats(&[
            0.0, 0.0, 0.0, //
            1.0, 2.0, 3.0, //
            4.0, 5.0, 6.0,
        ])));
        fx.draw(GlPrimitive::Points, DrawSource::Arrays { first: 1, count: 2 }).unwrap();

        let draw = &fx.device.draws()[0];
        assert_eq!(
            draw.call,
            DrawCall::NonIndexed {
                start: 0,
                count: 2,
                instances: 1
            }
        );
        let position = draw.attribute(AttributeSlot::Position.attribute_index()).unwrap();
        assert_eq!(position.vertex_f32(0), Some(vec![1.0, 2.0, 3.0]));
        assert_eq!(position.vertex_f32(1), Some(vec![4.0, 5.0, 6.0]));
        assert_eq!(draw.vertex_default, [1.0, 0.5, 0.25, 1.0]);
        fx.assert_clean();
        assert_eq!(fx.device.stats().snapshot().live_buffers, 0);
    }

    #[test]
    fn quads_from_a_resident_element_buffer_are_expanded() {
        let mut fx = Fixture::new(16);
        fx.buffer(BufferTarget::Array, 1, &[0u8; 48]);
        fx.position_array(ArraySource::Buffer { name: 1, offset: 0 });
        fx.buffer(BufferTarget::ElementArray, 2, bytemuck::cast_slice::<u16, u8>(&[3, 2, 1, 0]));

        let pointer = ArrayPointer::Offset(0);
        fx.draw(
            GlPrimitive::Quads,
            DrawSource::Elements {
                count: 4,
                ty: IndexType::U16,
                indices: &pointer,
            },
        )
        .unwrap();

        let draw = &fx.device.draws()[0];
        assert_eq!(draw.topology, wgpu::PrimitiveTopology::TriangleList);
        assert_eq!(draw.indices.as_deref(), Some(&[3, 2, 1, 3, 1, 0][..]));
        fx.assert_clean();
        // Only the two buffer objects survive the draw.
        assert_eq!(fx.device.stats().snapshot().live_buffers, 2);
    }

    #[test]
    fn mixed_arrays_are_rejected_before_any_lease() {
        let mut fx = Fixture::new(16);
        fx.buffer(BufferTarget::Array, 1, &[0u8; 48]);
        fx.position_array(ArraySource::Buffer { name: 1, offset: 0 });
        fx.buffers.bind(BufferTarget::Array, 0);
        fx.arrays
            .set_pointer(
                "test",
                AttributeSlot::Color,
                ClientArray {
                    components: 4,
                    ty: ComponentType::Float,
                    stride: 0,
                    source: Some(ArraySource::Client(floats(&[1.0; 16]))),
                    normalized: false,
                },
            )
            .unwrap();
        fx.arrays.set_enabled("test", AttributeSlot::Color, true).unwrap();

        let pointer = ArrayPointer::Client(ClientMemory::new(vec![0u8, 1, 2]));
        let err = fx
            .draw(
                GlPrimitive::Triangles,
                DrawSource::Elements {
                    count: 3,
                    ty: IndexType::U8,
                    indices: &pointer,
                },
            )
            .unwrap_err();
        assert!(matches!(err, GlError::MixedVertexArrays { call: "glDraw" }));
        assert!(fx.device.draws().is_empty());
        fx.assert_clean();
    }

    #[test]
    fn sampler_exhaustion_is_fatal_and_leases_nothing() {
        let mut fx = Fixture::new(2);
        for unit in 0..3 {
            fx.texture(unit, unit as u32 + 1);
        }
        fx.synthesizer.texture_units = (0..3).map(|u| (u, TextureTarget::Texture2D)).collect();
        fx.position_array(ArraySource::Client(floats(&[0.0; 9])));

        let err = fx
            .draw(GlPrimitive::Triangles, DrawSource::Arrays { first: 0, count: 3 })
            .unwrap_err();
        assert!(matches!(
            err,
            GlError::SlotPoolExhausted {
                pool: SlotKind::Sampler,
                capacity: 2,
                requested: 3
            }
        ));
        assert!(fx.device.draws().is_empty());
        fx.assert_clean();
    }

    #[test]
    fn sampler_bias_adds_unit_bias_and_rectangles_are_unnormalized() {
        let mut fx = Fixture::new(16);
        fx.texture(1, 7);
        fx.units[1].lod_bias = 0.5;
        fx.textures
            .get_mut(7, TextureTarget::Texture2D)
            .unwrap()
            .params
            .lod_bias = 0.25;
        fx.synthesizer.texture_units = vec![(1, TextureTarget::Texture2D)];
        fx.position_array(ArraySource::Client(floats(&[0.0; 9])));
        fx.draw(GlPrimitive::Triangles, DrawSource::Arrays { first: 0, count: 3 }).unwrap();

        let (_, config) = fx.device.draws()[0].samplers[0];
        assert_eq!(config.unit, 1);
        assert_eq!(config.lod_bias, 0.75);
        assert!(!config.non_normalized_coordinates);
        fx.assert_clean();
    }

    #[test]
    fn unbound_sampled_unit_is_fatal() {
        let mut fx = Fixture::new(16);
        fx.synthesizer.texture_units = vec![(2, TextureTarget::Texture2D)];
        fx.position_array(ArraySource::Client(floats(&[0.0; 9])));
        let err = fx
            .draw(GlPrimitive::Triangles, DrawSource::Arrays { first: 0, count: 3 })
            .unwrap_err();
        assert!(matches!(err, GlError::MissingTexture { unit: 2, .. }));
        fx.assert_clean();
    }

    #[test]
    fn synthesis_failure_leaves_no_trace() {
        let mut fx = Fixture::new(16);
        fx.synthesizer.fail = true;
        fx.position_array(ArraySource::Client(floats(&[0.0; 9])));
        assert!(fx
            .draw(GlPrimitive::Triangles, DrawSource::Arrays { first: 0, count: 3 })
            .is_err());
        assert!(fx.device.draws().is_empty());
        fx.assert_clean();
        assert_eq!(fx.device.stats().snapshot().live_buffers, 0);
    }
}
