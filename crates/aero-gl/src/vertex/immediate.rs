//! Begin/End accumulation.

use crate::device::{BufferHandle, Device};
use crate::error::Result;
use crate::state::topology::GlPrimitive;

use super::{AttributeSlot, ComponentType, StreamDescriptor};

pub const DEFAULT_TEXCOORD: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Current per-vertex values latched by the `Color*`, `Normal*` and
/// `TexCoord*` calls.
#[derive(Clone, Debug, PartialEq)]
pub struct CurrentValues {
    pub color: [f32; 4],
    pub normal: [f32; 3],
    /// One entry per client texture coordinate unit.
    pub texcoords: Vec<[f32; 4]>,
    /// Units below this have been written at least once; the rest still hold
    /// [`DEFAULT_TEXCOORD`].
    pub texcoord_extent: u8,
}

impl CurrentValues {
    pub fn new(texcoord_units: usize) -> Self {
        Self {
            color: [1.0; 4],
            normal: [0.0, 0.0, 1.0],
            texcoords: vec![DEFAULT_TEXCOORD; texcoord_units],
            texcoord_extent: 0,
        }
    }

    pub fn set_texcoord(&mut self, unit: u8, value: [f32; 4]) {
        self.texcoords[usize::from(unit)] = value;
        self.texcoord_extent = self.texcoord_extent.max(unit + 1);
    }
}

#[derive(Clone, Copy, Debug)]
struct Accumulator {
    slot: AttributeSlot,
    buffer: BufferHandle,
    components: u8,
}

/// Device buffers owning exactly the vertices pushed since `Begin`.
///
/// Position, normal and color are always accumulated. Texture coordinates
/// are accumulated only for units below the current texcoord extent; a unit
/// first written mid-block gets a buffer back-filled with the default for the
/// vertices already pushed. Every buffer holds `vertex_count` elements.
#[derive(Debug)]
pub struct ImmediateBlock {
    primitive: GlPrimitive,
    accumulators: Vec<Accumulator>,
    texcoord_units: u8,
    vertex_count: u32,
}

impl ImmediateBlock {
    pub fn begin<D: Device>(device: &mut D, primitive: GlPrimitive, texcoord_units: u8) -> Result<Self> {
        let mut layout = vec![
            (AttributeSlot::Position, 4),
            (AttributeSlot::Normal, 3),
            (AttributeSlot::Color, 4),
        ];
        layout.extend((0..texcoord_units).map(|unit| (AttributeSlot::TexCoord(unit), 4)));

        let mut accumulators: Vec<Accumulator> = Vec::with_capacity(layout.len());
        for (slot, components) in layout {
            let buffer = match device.create_buffer(0, None) {
                Ok(buffer) => buffer,
                Err(err) => {
                    for created in &accumulators {
                        device.destroy_buffer(created.buffer)?;
                    }
                    return Err(err.into());
                }
            };
            accumulators.push(Accumulator {
                slot,
                buffer,
                components,
            });
        }
        Ok(Self {
            primitive,
            accumulators,
            texcoord_units,
            vertex_count: 0,
        })
    }

    /// Number of texture coordinate units accumulated, as a prefix from unit 0.
    pub fn texcoord_units(&self) -> u8 {
        self.texcoord_units
    }

    fn grow_texcoords<D: Device>(&mut self, device: &mut D, units: u8) -> Result<()> {
        while self.texcoord_units < units {
            let fill: Vec<f32> = (0..self.vertex_count).flat_map(|_| DEFAULT_TEXCOORD).collect();
            let buffer = device.create_buffer(fill.len() * 4, Some(bytemuck::cast_slice(&fill)))?;
            self.accumulators.push(Accumulator {
                slot: AttributeSlot::TexCoord(self.texcoord_units),
                buffer,
                components: 4,
            });
            self.texcoord_units += 1;
        }
        Ok(())
    }

    pub fn primitive(&self) -> GlPrimitive {
        self.primitive
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Appends one vertex: `position` plus the current values of every other
    /// attribute.
    pub fn append<D: Device>(&mut self, device: &mut D, position: [f32; 4], current: &CurrentValues) -> Result<()> {
        self.grow_texcoords(device, current.texcoord_extent)?;
        for acc in &self.accumulators {
            let values: &[f32] = match acc.slot {
                AttributeSlot::Position => &position,
                AttributeSlot::Normal => &current.normal,
                AttributeSlot::Color => &current.color,
                AttributeSlot::TexCoord(unit) => &current.texcoords[usize::from(unit)],
                AttributeSlot::Generic(_) => continue,
            };
            device.push_data(acc.buffer, bytemuck::cast_slice(values))?;
        }
        self.vertex_count += 1;
        Ok(())
    }

    /// Stream descriptors for every accumulated attribute.
    pub fn streams(&self) -> impl Iterator<Item = (AttributeSlot, StreamDescriptor)> + '_ {
        self.accumulators.iter().map(|acc| {
            (
                acc.slot,
                StreamDescriptor {
                    buffer: acc.buffer,
                    offset: 0,
                    components: acc.components,
                    ty: ComponentType::Float,
                    normalized: false,
                    stride: u32::from(acc.components) * 4,
                    frequency: 0,
                },
            )
        })
    }

    /// Destroys the accumulation buffers.
    pub fn release<D: Device>(self, device: &mut D) -> Result<()> {
        for acc in self.accumulators {
            device.destroy_buffer(acc.buffer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::RecordingDevice;

    fn read_floats(bytes: &[u8]) -> Vec<f32> {
        bytes.chunks_exact(4).map(bytemuck::pod_read_unaligned).collect()
    }

    #[test]
    fn pushed_vertices_round_trip_through_device_buffers() {
        let mut device = RecordingDevice::new(31, 16);
        let mut block = ImmediateBlock::begin(&mut device, GlPrimitive::Triangles, 2).unwrap();
        let mut current = CurrentValues::new(2);
        let positions = [[1.0, 2.0, 3.0, 1.0], [4.0, 5.0, 6.0, 1.0], [7.0, 8.0, 9.0, 1.0]];
        for (i, position) in positions.iter().enumerate() {
            current.texcoords[1] = [i as f32, 0.5, 0.0, 1.0];
            block.append(&mut device, *position, &current).unwrap();
        }
        assert_eq!(block.vertex_count(), 3);

        let streams: Vec<_> = block.streams().collect();
        let (_, position) = streams[0];
        let floats: Vec<f32> = read_floats(device.buffer_contents(position.buffer).unwrap());
        assert_eq!(floats.len(), 3 * 4);
        assert_eq!(&floats[4..8], &[4.0, 5.0, 6.0, 1.0]);

        let (slot, texcoord1) = streams[4];
        assert_eq!(slot, AttributeSlot::TexCoord(1));
        let floats: Vec<f32> = read_floats(device.buffer_contents(texcoord1.buffer).unwrap());
        assert_eq!(floats[8], 2.0);

        block.release(&mut device).unwrap();
        assert_eq!(device.stats().snapshot().live_buffers, 0);
    }

    #[test]
    fn texcoord_written_mid_block_is_back_filled() {
        let mut device = RecordingDevice::new(31, 16);
        let mut current = CurrentValues::new(4);
        let mut block = ImmediateBlock::begin(&mut device, GlPrimitive::Points, current.texcoord_extent).unwrap();
        assert_eq!(block.streams().count(), 3);
        block.append(&mut device, [0.0; 4], &current).unwrap();
        current.set_texcoord(2, [1.0, 2.0, 3.0, 4.0]);
        block.append(&mut device, [0.0; 4], &current).unwrap();

        assert_eq!(block.texcoord_units(), 3);
        let streams: Vec<_> = block.streams().collect();
        assert_eq!(streams.len(), 6);
        let (slot, unit2) = streams[5];
        assert_eq!(slot, AttributeSlot::TexCoord(2));
        let floats = read_floats(device.buffer_contents(unit2.buffer).unwrap());
        assert_eq!(floats, vec![0.0, 0.0, 0.0, 1.0, 1.0, 2.0, 3.0, 4.0]);
        block.release(&mut device).unwrap();
        assert_eq!(device.stats().snapshot().live_buffers, 0);
    }

    #[test]
    fn every_accumulator_holds_the_same_vertex_count() {
        let mut device = RecordingDevice::new(31, 16);
        let mut block = ImmediateBlock::begin(&mut device, GlPrimitive::Points, 8).unwrap();
        let current = CurrentValues::new(8);
        block.append(&mut device, [0.0; 4], &current).unwrap();
        block.append(&mut device, [0.0; 4], &current).unwrap();
        for (_, stream) in block.streams() {
            let len = device.buffer_contents(stream.buffer).unwrap().len();
            assert_eq!(len, 2 * stream.stride as usize);
        }
    }
}
