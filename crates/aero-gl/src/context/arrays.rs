use crate::device::Device;
use crate::error::{GlError, Result};
use crate::gl;
use crate::objects::buffer::BufferTarget;
use crate::state::translate;
use crate::vertex::{ArrayPointer, ArraySource, AttributeSlot, ClientArray, ClientMemory};

use super::GlContext;

/// Byte layout of `C4F_N3F_V3F`: color at 0, normal at 16, position at 28.
const C4F_N3F_V3F_STRIDE: usize = 40;
const C4F_N3F_V3F_NORMAL: usize = 16;
const C4F_N3F_V3F_POSITION: usize = 28;

impl<D: Device> GlContext<D> {
    pub fn enable_client_state(&mut self, array: u32) -> Result<()> {
        self.set_client_state("glEnableClientState", array, true)
    }

    pub fn disable_client_state(&mut self, array: u32) -> Result<()> {
        self.set_client_state("glDisableClientState", array, false)
    }

    fn set_client_state(&mut self, call: &'static str, array: u32, enabled: bool) -> Result<()> {
        self.outside_begin_end(call)?;
        let slot = self.client_slot(call, array)?;
        self.arrays.set_enabled(call, slot, enabled)
    }

    fn client_slot(&self, call: &'static str, array: u32) -> Result<AttributeSlot> {
        Ok(match array {
            gl::VERTEX_ARRAY => AttributeSlot::Position,
            gl::NORMAL_ARRAY => AttributeSlot::Normal,
            gl::COLOR_ARRAY => AttributeSlot::Color,
            gl::TEXTURE_COORD_ARRAY => AttributeSlot::TexCoord(self.client_active_unit as u8),
            other => return Err(GlError::unsupported(call, "client array", other)),
        })
    }

    pub fn enable_vertex_attrib_array(&mut self, index: u32) -> Result<()> {
        let call = "glEnableVertexAttribArray";
        self.outside_begin_end(call)?;
        let slot = self.generic_slot(call, index)?;
        self.arrays.set_enabled(call, slot, true)
    }

    pub fn disable_vertex_attrib_array(&mut self, index: u32) -> Result<()> {
        let call = "glDisableVertexAttribArray";
        self.outside_begin_end(call)?;
        let slot = self.generic_slot(call, index)?;
        self.arrays.set_enabled(call, slot, false)
    }

    fn generic_slot(&self, call: &'static str, index: u32) -> Result<AttributeSlot> {
        if index >= self.config.generic_attributes {
            return Err(GlError::CapabilityOutOfRange {
                call,
                what: "generic attribute",
                index,
                limit: self.config.generic_attributes,
            });
        }
        Ok(AttributeSlot::Generic(index as u8))
    }

    /// Resolves a pointer argument against the array buffer binding: an
    /// offset needs a bound buffer, client memory needs none.
    fn array_source(&self, call: &'static str, pointer: ArrayPointer) -> Result<ArraySource> {
        let bound = self.buffers.bound(BufferTarget::Array);
        match (pointer, bound) {
            (ArrayPointer::Client(memory), 0) => Ok(ArraySource::Client(memory)),
            (ArrayPointer::Offset(offset), name) if name != 0 => Ok(ArraySource::Buffer { name, offset }),
            (ArrayPointer::Client(_), _) => Err(GlError::PointerKind {
                call,
                param: "pointer",
                expected: "a buffer offset",
                state: "an array buffer is bound",
            }),
            (ArrayPointer::Offset(_), _) => Err(GlError::PointerKind {
                call,
                param: "pointer",
                expected: "client memory",
                state: "no array buffer is bound",
            }),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn set_pointer(
        &mut self,
        call: &'static str,
        slot: AttributeSlot,
        size: i32,
        allowed: std::ops::RangeInclusive<i32>,
        ty: u32,
        normalized: bool,
        stride: i32,
        pointer: ArrayPointer,
    ) -> Result<()> {
        self.outside_begin_end(call)?;
        if !allowed.contains(&size) {
            return Err(GlError::UnsupportedValue {
                call,
                param: "size",
                value: i64::from(size),
            });
        }
        let stride = usize::try_from(stride).map_err(|_| GlError::UnsupportedValue {
            call,
            param: "stride",
            value: i64::from(stride),
        })?;
        let ty = translate::component_type(call, ty)?;
        let source = self.array_source(call, pointer)?;
        self.arrays.set_pointer(
            call,
            slot,
            ClientArray {
                components: size as u8,
                ty,
                stride,
                source: Some(source),
                normalized: normalized && ty.is_integer(),
            },
        )
    }

    pub fn vertex_pointer(&mut self, size: i32, ty: u32, stride: i32, pointer: ArrayPointer) -> Result<()> {
        self.set_pointer("glVertexPointer", AttributeSlot::Position, size, 2..=4, ty, false, stride, pointer)
    }

    /// Integer colors are normalized to [0, 1] (unsigned) or [-1, 1] (signed).
    pub fn color_pointer(&mut self, size: i32, ty: u32, stride: i32, pointer: ArrayPointer) -> Result<()> {
        self.set_pointer("glColorPointer", AttributeSlot::Color, size, 3..=4, ty, true, stride, pointer)
    }

    pub fn normal_pointer(&mut self, ty: u32, stride: i32, pointer: ArrayPointer) -> Result<()> {
        self.set_pointer("glNormalPointer", AttributeSlot::Normal, 3, 3..=3, ty, true, stride, pointer)
    }

    /// Targets the current client texture unit.
    pub fn tex_coord_pointer(&mut self, size: i32, ty: u32, stride: i32, pointer: ArrayPointer) -> Result<()> {
        let slot = AttributeSlot::TexCoord(self.client_active_unit as u8);
        self.set_pointer("glTexCoordPointer", slot, size, 1..=4, ty, false, stride, pointer)
    }

    pub fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        ty: u32,
        normalized: bool,
        stride: i32,
        pointer: ArrayPointer,
    ) -> Result<()> {
        let call = "glVertexAttribPointer";
        let slot = self.generic_slot(call, index)?;
        self.set_pointer(call, slot, size, 1..=4, ty, normalized, stride, pointer)
    }

    /// Only `C4F_N3F_V3F` is supported. It enables the color, normal and
    /// vertex arrays and disables the current unit's texcoord array.
    pub fn interleaved_arrays(&mut self, format: u32, stride: i32, pointer: ArrayPointer) -> Result<()> {
        let call = "glInterleavedArrays";
        self.outside_begin_end(call)?;
        if format != gl::C4F_N3F_V3F {
            return Err(GlError::unsupported(call, "interleaved format", format));
        }
        let stride = match stride {
            0 => C4F_N3F_V3F_STRIDE as i32,
            s => s,
        };
        let at = |offset: usize| match &pointer {
            ArrayPointer::Offset(base) => ArrayPointer::Offset(base + offset),
            ArrayPointer::Client(memory) => {
                ArrayPointer::Client(ClientMemory::new(memory.bytes().get(offset..).unwrap_or(&[]).to_vec()))
            }
        };
        self.set_pointer(call, AttributeSlot::Color, 4, 4..=4, gl::FLOAT, false, stride, at(0))?;
        self.set_pointer(call, AttributeSlot::Normal, 3, 3..=3, gl::FLOAT, false, stride, at(C4F_N3F_V3F_NORMAL))?;
        self.set_pointer(call, AttributeSlot::Position, 3, 3..=3, gl::FLOAT, false, stride, at(C4F_N3F_V3F_POSITION))?;

        let texcoord = AttributeSlot::TexCoord(self.client_active_unit as u8);
        for (slot, enabled) in [
            (AttributeSlot::Color, true),
            (AttributeSlot::Normal, true),
            (AttributeSlot::Position, true),
            (texcoord, false),
        ] {
            self.arrays.set_enabled(call, slot, enabled)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ContextConfig;
    use crate::context::GlContext;
    use crate::device::RecordingDevice;
    use crate::error::GlError;
    use crate::gl;
    use crate::vertex::{ArrayPointer, ArraySource, AttributeSlot, ClientMemory, ComponentType};

    fn context() -> GlContext<RecordingDevice> {
        GlContext::new(RecordingDevice::new(31, 16), ContextConfig::default()).unwrap()
    }

    #[test]
    fn offsets_require_a_bound_array_buffer() {
        let mut ctx = context();
        assert!(matches!(
            ctx.vertex_pointer(3, gl::FLOAT, 0, ArrayPointer::Offset(0)),
            Err(GlError::PointerKind { expected: "client memory", .. })
        ));
        ctx.bind_buffer(gl::ARRAY_BUFFER, 4).unwrap();
        ctx.vertex_pointer(3, gl::FLOAT, 0, ArrayPointer::Offset(12)).unwrap();
        let array = ctx.vertex_arrays().get("test", AttributeSlot::Position).unwrap();
        assert_eq!(array.source, Some(ArraySource::Buffer { name: 4, offset: 12 }));
    }

    #[test]
    fn color_pointer_validates_size_and_normalizes_integers() {
        let mut ctx = context();
        let memory = ClientMemory::new(vec![0u8; 16]);
        assert!(matches!(
            ctx.color_pointer(2, gl::UNSIGNED_BYTE, 0, ArrayPointer::Client(memory.clone())),
            Err(GlError::UnsupportedValue { param: "size", value: 2, .. })
        ));
        ctx.color_pointer(4, gl::UNSIGNED_BYTE, 0, ArrayPointer::Client(memory)).unwrap();
        let array = ctx.vertex_arrays().get("test", AttributeSlot::Color).unwrap();
        assert!(array.normalized);
        assert_eq!(array.ty, ComponentType::UnsignedByte);
    }

    #[test]
    fn unaligned_stride_is_fatal() {
        let mut ctx = context();
        let memory = ClientMemory::new(vec![0u8; 64]);
        assert!(matches!(
            ctx.vertex_pointer(3, gl::FLOAT, 6, ArrayPointer::Client(memory)),
            Err(GlError::UnalignedStride { stride: 6, component_size: 4, .. })
        ));
    }

    #[test]
    fn texcoord_pointer_follows_client_active_unit() {
        let mut ctx = context();
        ctx.client_active_texture(gl::TEXTURE0 + 2).unwrap();
        ctx.enable_client_state(gl::TEXTURE_COORD_ARRAY).unwrap();
        ctx.tex_coord_pointer(2, gl::FLOAT, 0, ArrayPointer::Client(ClientMemory::new(vec![0u8; 8])))
            .unwrap();
        assert!(ctx.vertex_arrays().is_enabled(AttributeSlot::TexCoord(2)));
        assert!(!ctx.vertex_arrays().is_enabled(AttributeSlot::TexCoord(0)));
        assert!(ctx.vertex_arrays().get("test", AttributeSlot::TexCoord(2)).unwrap().initialized());
    }

    #[test]
    fn interleaved_c4f_n3f_v3f_sets_three_arrays() {
        let mut ctx = context();
        ctx.bind_buffer(gl::ARRAY_BUFFER, 1).unwrap();
        ctx.interleaved_arrays(gl::C4F_N3F_V3F, 0, ArrayPointer::Offset(8)).unwrap();
        let arrays = ctx.vertex_arrays();
        for (slot, offset) in [
            (AttributeSlot::Color, 8),
            (AttributeSlot::Normal, 24),
            (AttributeSlot::Position, 36),
        ] {
            assert!(arrays.is_enabled(slot));
            let array = arrays.get("test", slot).unwrap();
            assert_eq!(array.stride, 40);
            assert_eq!(array.source, Some(ArraySource::Buffer { name: 1, offset }));
        }
        assert!(matches!(
            ctx.interleaved_arrays(0x2A20, 0, ArrayPointer::Offset(0)),
            Err(GlError::UnsupportedEnum { .. })
        ));
    }

    #[test]
    fn generic_attribute_index_is_bounded() {
        let mut ctx = context();
        assert!(matches!(
            ctx.enable_vertex_attrib_array(16),
            Err(GlError::CapabilityOutOfRange { what: "generic attribute", .. })
        ));
    }
}
