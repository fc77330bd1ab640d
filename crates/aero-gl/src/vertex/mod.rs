//! Vertex attribute descriptors and the client-array table.

pub mod compact;
pub mod convert;
pub mod immediate;

use std::fmt;
use std::sync::Arc;

use crate::device::BufferHandle;
use crate::error::{GlError, Result};

/// Closed set of component types the vertex pipeline accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    HalfFloat,
    Float,
    Double,
}

impl ComponentType {
    pub fn size(self) -> usize {
        match self {
            ComponentType::Byte | ComponentType::UnsignedByte => 1,
            ComponentType::Short | ComponentType::UnsignedShort | ComponentType::HalfFloat => 2,
            ComponentType::Int | ComponentType::UnsignedInt | ComponentType::Float => 4,
            ComponentType::Double => 8,
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(
            self,
            ComponentType::HalfFloat | ComponentType::Float | ComponentType::Double
        )
    }
}

/// Index element types accepted by the indexed draw calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexType {
    U8,
    U16,
    U32,
}

impl IndexType {
    pub fn size(self) -> usize {
        match self {
            IndexType::U8 => 1,
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }

    /// The device has no 8-bit index format; byte indices are widened.
    pub fn device_format(self) -> wgpu::IndexFormat {
        match self {
            IndexType::U8 | IndexType::U16 => wgpu::IndexFormat::Uint16,
            IndexType::U32 => wgpu::IndexFormat::Uint32,
        }
    }

    /// Decodes `count` little-endian indices from `bytes`.
    pub fn decode(self, call: &'static str, bytes: &[u8], count: usize) -> Result<Vec<u32>> {
        let len = count * self.size();
        let bytes = bytes
            .get(..len)
            .ok_or(GlError::ClientArrayOutOfBounds {
                call,
                array: "index",
                offset: 0,
                len,
                available: bytes.len(),
            })?;
        Ok(match self {
            IndexType::U8 => bytes.iter().map(|&b| u32::from(b)).collect(),
            IndexType::U16 => bytes
                .chunks_exact(2)
                .map(|c| u32::from(u16::from_le_bytes([c[0], c[1]])))
                .collect(),
            IndexType::U32 => bytes
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        })
    }
}

/// Encodes indices in the narrowest device format that holds them.
pub fn encode_indices(indices: &[u32]) -> (Vec<u8>, wgpu::IndexFormat) {
    if indices.iter().all(|&i| i <= u32::from(u16::MAX)) {
        let narrow: Vec<u16> = indices.iter().map(|&i| i as u16).collect();
        (
            bytemuck::cast_slice::<u16, u8>(&narrow[..]).to_vec(),
            wgpu::IndexFormat::Uint16,
        )
    } else {
        (
            bytemuck::cast_slice::<u32, u8>(indices).to_vec(),
            wgpu::IndexFormat::Uint32,
        )
    }
}

/// Logical vertex attribute, mapped onto the 16 device attribute indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeSlot {
    Position,
    Normal,
    Color,
    TexCoord(u8),
    Generic(u8),
}

impl AttributeSlot {
    pub fn attribute_index(self) -> u32 {
        match self {
            AttributeSlot::Position => 0,
            AttributeSlot::Normal => 2,
            AttributeSlot::Color => 3,
            AttributeSlot::TexCoord(unit) => 8 + u32::from(unit),
            AttributeSlot::Generic(index) => u32::from(index),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AttributeSlot::Position => "position",
            AttributeSlot::Normal => "normal",
            AttributeSlot::Color => "color",
            AttributeSlot::TexCoord(_) => "texcoord",
            AttributeSlot::Generic(_) => "generic",
        }
    }
}

impl fmt::Display for AttributeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeSlot::TexCoord(unit) => write!(f, "texcoord{unit}"),
            AttributeSlot::Generic(index) => write!(f, "generic{index}"),
            other => f.write_str(other.name()),
        }
    }
}

/// Immutable client memory captured by the trace decoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientMemory(Arc<[u8]>);

impl ClientMemory {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }

    pub fn from_pod<T: bytemuck::Pod>(values: &[T]) -> Self {
        Self(Arc::from(bytemuck::cast_slice::<T, u8>(values)))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Pointer argument of the array calls: client memory, or a byte offset into
/// the buffer object bound at call time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArrayPointer {
    Client(ClientMemory),
    Offset(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArraySource {
    Client(ClientMemory),
    Buffer { name: u32, offset: usize },
}

/// One persistent descriptor per logical attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientArray {
    pub components: u8,
    pub ty: ComponentType,
    /// Stride as given by the caller; zero means tightly packed.
    pub stride: usize,
    pub source: Option<ArraySource>,
    pub normalized: bool,
}

impl Default for ClientArray {
    fn default() -> Self {
        Self {
            components: 4,
            ty: ComponentType::Float,
            stride: 0,
            source: None,
            normalized: false,
        }
    }
}

impl ClientArray {
    pub fn initialized(&self) -> bool {
        self.source.is_some()
    }

    pub fn element_size(&self) -> usize {
        usize::from(self.components) * self.ty.size()
    }

    pub fn effective_stride(&self) -> usize {
        if self.stride == 0 {
            self.element_size()
        } else {
            self.stride
        }
    }
}

/// Device-facing layout of one bound attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub buffer: BufferHandle,
    pub offset: u64,
    pub components: u8,
    pub ty: ComponentType,
    pub normalized: bool,
    pub stride: u32,
    /// Zero for per-vertex data.
    pub frequency: u32,
}

#[derive(Clone, Debug, PartialEq)]
struct ArrayEntry {
    array: ClientArray,
    enabled: bool,
}

/// Client-array descriptors and enable bits for every logical attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexArrays {
    texcoord_units: u8,
    generic_attributes: u8,
    entries: Vec<ArrayEntry>,
}

impl VertexArrays {
    pub fn new(texcoord_units: u8, generic_attributes: u8) -> Self {
        let count = 3 + usize::from(texcoord_units) + usize::from(generic_attributes);
        Self {
            texcoord_units,
            generic_attributes,
            entries: vec![
                ArrayEntry {
                    array: ClientArray::default(),
                    enabled: false,
                };
                count
            ],
        }
    }

    fn index(&self, call: &'static str, slot: AttributeSlot) -> Result<usize> {
        match slot {
            AttributeSlot::Position => Ok(0),
            AttributeSlot::Normal => Ok(1),
            AttributeSlot::Color => Ok(2),
            AttributeSlot::TexCoord(unit) if unit < self.texcoord_units => {
                Ok(3 + usize::from(unit))
            }
            AttributeSlot::Generic(index) if index < self.generic_attributes => {
                Ok(3 + usize::from(self.texcoord_units) + usize::from(index))
            }
            AttributeSlot::TexCoord(unit) => Err(GlError::CapabilityOutOfRange {
                call,
                what: "texture coordinate unit",
                index: u32::from(unit),
                limit: u32::from(self.texcoord_units),
            }),
            AttributeSlot::Generic(index) => Err(GlError::CapabilityOutOfRange {
                call,
                what: "generic attribute",
                index: u32::from(index),
                limit: u32::from(self.generic_attributes),
            }),
        }
    }

    fn slot_at(&self, index: usize) -> AttributeSlot {
        match index {
            0 => AttributeSlot::Position,
            1 => AttributeSlot::Normal,
            2 => AttributeSlot::Color,
            i if i < 3 + usize::from(self.texcoord_units) => AttributeSlot::TexCoord((i - 3) as u8),
            i => AttributeSlot::Generic((i - 3 - usize::from(self.texcoord_units)) as u8),
        }
    }

    pub fn get(&self, call: &'static str, slot: AttributeSlot) -> Result<&ClientArray> {
        let index = self.index(call, slot)?;
        Ok(&self.entries[index].array)
    }

    /// Records a pointer call. The stride must be a whole number of components.
    pub fn set_pointer(
        &mut self,
        call: &'static str,
        slot: AttributeSlot,
        array: ClientArray,
    ) -> Result<()> {
        if array.stride % array.ty.size() != 0 {
            return Err(GlError::UnalignedStride {
                call,
                stride: array.stride,
                component_size: array.ty.size(),
            });
        }
        let index = self.index(call, slot)?;
        self.entries[index].array = array;
        Ok(())
    }

    pub fn set_enabled(&mut self, call: &'static str, slot: AttributeSlot, enabled: bool) -> Result<()> {
        let index = self.index(call, slot)?;
        self.entries[index].enabled = enabled;
        Ok(())
    }

    pub fn is_enabled(&self, slot: AttributeSlot) -> bool {
        self.index("", slot)
            .map(|index| self.entries[index].enabled)
            .unwrap_or(false)
    }

    /// Enabled attributes in device attribute order. An enabled generic
    /// attribute takes precedence over the conventional array aliased to the
    /// same device index.
    pub fn active(&self) -> Vec<(AttributeSlot, &ClientArray)> {
        let mut out: Vec<(AttributeSlot, &ClientArray)> = Vec::new();
        let mut claimed = [false; 16];
        for generic in 0..self.generic_attributes {
            let slot = AttributeSlot::Generic(generic);
            if self.is_enabled(slot) {
                claimed[usize::from(generic)] = true;
            }
        }
        for (index, entry) in self.entries.iter().enumerate() {
            if !entry.enabled {
                continue;
            }
            let slot = self.slot_at(index);
            let aliased = !matches!(slot, AttributeSlot::Generic(_))
                && claimed[slot.attribute_index() as usize];
            if !aliased {
                out.push((slot, &entry.array));
            }
        }
        out.sort_by_key(|(slot, _)| slot.attribute_index());
        out
    }

    /// Buffer objects referenced by any descriptor; deleting one of these
    /// leaves the descriptor pointing at an unknown name.
    pub fn forget_buffer(&mut self, name: u32) {
        for entry in &mut self.entries {
            if matches!(entry.array.source, Some(ArraySource::Buffer { name: n, .. }) if n == name)
            {
                entry.array.source = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_slots_use_fixed_device_indices() {
        assert_eq!(AttributeSlot::Position.attribute_index(), 0);
        assert_eq!(AttributeSlot::Normal.attribute_index(), 2);
        assert_eq!(AttributeSlot::Color.attribute_index(), 3);
        assert_eq!(AttributeSlot::TexCoord(3).attribute_index(), 11);
        assert_eq!(AttributeSlot::Generic(5).attribute_index(), 5);
    }

    #[test]
    fn unaligned_stride_is_rejected() {
        let mut arrays = VertexArrays::new(8, 16);
        let err = arrays
            .set_pointer(
                "glVertexPointer",
                AttributeSlot::Position,
                ClientArray {
                    components: 3,
                    ty: ComponentType::Float,
                    stride: 14,
                    source: Some(ArraySource::Buffer { name: 1, offset: 0 }),
                    normalized: false,
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            GlError::UnalignedStride {
                stride: 14,
                component_size: 4,
                ..
            }
        ));
    }

    #[test]
    fn generic_attribute_overrides_aliased_texcoord() {
        let mut arrays = VertexArrays::new(8, 16);
        arrays.set_enabled("t", AttributeSlot::Position, true).unwrap();
        arrays.set_enabled("t", AttributeSlot::TexCoord(1), true).unwrap();
        arrays.set_enabled("t", AttributeSlot::Generic(9), true).unwrap();
        let active: Vec<AttributeSlot> = arrays.active().into_iter().map(|(s, _)| s).collect();
        assert_eq!(
            active,
            vec![AttributeSlot::Position, AttributeSlot::Generic(9)]
        );
    }

    #[test]
    fn texcoord_unit_out_of_range_is_capability_error() {
        let mut arrays = VertexArrays::new(8, 16);
        assert!(matches!(
            arrays.set_enabled("glEnableClientState", AttributeSlot::TexCoord(8), true),
            Err(GlError::CapabilityOutOfRange { index: 8, limit: 8, .. })
        ));
    }

    #[test]
    fn byte_indices_widen_to_u16() {
        assert_eq!(IndexType::U8.device_format(), wgpu::IndexFormat::Uint16);
        let decoded = IndexType::U8.decode("glDrawElements", &[3, 1, 2], 3).unwrap();
        assert_eq!(decoded, vec![3, 1, 2]);
    }

    #[test]
    fn encode_picks_narrowest_format() {
        let (bytes, format) = encode_indices(&[0, 1, 65535]);
        assert_eq!(format, wgpu::IndexFormat::Uint16);
        assert_eq!(bytes.len(), 6);
        let (bytes, format) = encode_indices(&[0, 65536]);
        assert_eq!(format, wgpu::IndexFormat::Uint32);
        assert_eq!(bytes.len(), 8);
    }
}
