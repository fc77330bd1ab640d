//! Buffer objects bound to the array and element-array targets.

use hashbrown::HashMap;
use tracing::debug;

use crate::device::{BufferHandle, Device, DeviceError};
use crate::error::{GlError, Result};
use crate::gl;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Array,
    ElementArray,
}

impl BufferTarget {
    pub fn from_gl(call: &'static str, target: u32) -> Result<Self> {
        match target {
            gl::ARRAY_BUFFER => Ok(BufferTarget::Array),
            gl::ELEMENT_ARRAY_BUFFER => Ok(BufferTarget::ElementArray),
            other => Err(GlError::unsupported(call, "buffer target", other)),
        }
    }

    fn gl(self) -> u32 {
        match self {
            BufferTarget::Array => gl::ARRAY_BUFFER,
            BufferTarget::ElementArray => gl::ELEMENT_ARRAY_BUFFER,
        }
    }
}

/// A named buffer. The contents are shadowed on the CPU so indexed draws
/// can rewrite element data the device cannot consume directly.
#[derive(Debug, Default)]
pub struct BufferObject {
    pub device: Option<BufferHandle>,
    pub data: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct BufferObjects {
    objects: HashMap<u32, BufferObject>,
    array: u32,
    element_array: u32,
}

impl BufferObjects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate(&mut self, names: &[u32]) {
        for &name in names {
            if name != 0 {
                self.objects.entry(name).or_default();
            }
        }
    }

    pub fn bound(&self, target: BufferTarget) -> u32 {
        match target {
            BufferTarget::Array => self.array,
            BufferTarget::ElementArray => self.element_array,
        }
    }

    pub fn get(&self, name: u32) -> Option<&BufferObject> {
        self.objects.get(&name)
    }

    /// Binding 0 unbinds; unknown names are created implicitly.
    pub fn bind(&mut self, target: BufferTarget, name: u32) {
        if name != 0 {
            self.objects.entry(name).or_default();
        }
        match target {
            BufferTarget::Array => self.array = name,
            BufferTarget::ElementArray => self.element_array = name,
        }
    }

    fn bound_object(&mut self, call: &'static str, target: BufferTarget) -> Result<(u32, &mut BufferObject)> {
        let name = self.bound(target);
        match self.objects.get_mut(&name) {
            Some(object) if name != 0 => Ok((name, object)),
            _ => Err(GlError::NoBufferBound {
                call,
                target: target.gl(),
            }),
        }
    }

    /// Replaces the whole store of the buffer bound to `target`.
    pub fn buffer_data<D: Device>(
        &mut self,
        device: &mut D,
        call: &'static str,
        target: BufferTarget,
        size: usize,
        data: Option<&[u8]>,
    ) -> Result<()> {
        let (name, object) = self.bound_object(call, target)?;
        let mut contents = vec![0u8; size];
        if let Some(data) = data {
            let len = data.len().min(size);
            contents[..len].copy_from_slice(&data[..len]);
        }
        match object.device {
            Some(handle) => {
                device.resize_buffer(handle, size)?;
                device.update_data(handle, 0, &contents)?;
            }
            None => {
                object.device = Some(device.create_buffer(size, Some(&contents))?);
            }
        }
        debug!(buffer = name, size, "buffer data");
        object.data = contents;
        Ok(())
    }

    pub fn buffer_sub_data<D: Device>(
        &mut self,
        device: &mut D,
        call: &'static str,
        target: BufferTarget,
        offset: usize,
        data: &[u8],
    ) -> Result<()> {
        let (_, object) = self.bound_object(call, target)?;
        let write_end = offset + data.len();
        if write_end > object.data.len() {
            return Err(DeviceError::BufferWriteOutOfBounds {
                buffer_size: object.data.len(),
                write_end,
            }
            .into());
        }
        let handle = object.device.ok_or(GlError::NoBufferBound {
            call,
            target: target.gl(),
        })?;
        device.update_data(handle, offset, data)?;
        object.data[offset..write_end].copy_from_slice(data);
        Ok(())
    }

    /// Deletes the named buffers and unbinds them. Returns the names that
    /// actually existed.
    pub fn delete<D: Device>(&mut self, device: &mut D, names: &[u32]) -> Result<Vec<u32>> {
        let mut deleted = Vec::new();
        for &name in names {
            let Some(object) = self.objects.remove(&name) else {
                continue;
            };
            if let Some(handle) = object.device {
                device.destroy_buffer(handle)?;
            }
            if self.array == name {
                self.array = 0;
            }
            if self.element_array == name {
                self.element_array = 0;
            }
            deleted.push(name);
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::RecordingDevice;

    #[test]
    fn data_requires_a_bound_buffer() {
        let mut device = RecordingDevice::new(31, 16);
        let mut buffers = BufferObjects::new();
        let err = buffers
            .buffer_data(&mut device, "glBufferData", BufferTarget::Array, 4, None)
            .unwrap_err();
        assert!(matches!(
            err,
            GlError::NoBufferBound {
                target: gl::ARRAY_BUFFER,
                ..
            }
        ));
    }

    #[test]
    fn data_and_sub_data_update_device_and_shadow() {
        let mut device = RecordingDevice::new(31, 16);
        let mut buffers = BufferObjects::new();
        buffers.generate(&[1]);
        buffers.bind(BufferTarget::Array, 1);
        buffers
            .buffer_data(&mut device, "glBufferData", BufferTarget::Array, 8, Some(&[1, 2, 3, 4]))
            .unwrap();
        buffers
            .buffer_sub_data(&mut device, "glBufferSubData", BufferTarget::Array, 6, &[9, 9])
            .unwrap();

        let object = buffers.get(1).unwrap();
        assert_eq!(object.data, vec![1, 2, 3, 4, 0, 0, 9, 9]);
        assert_eq!(device.buffer_contents(object.device.unwrap()).unwrap(), &object.data[..]);

        let err = buffers
            .buffer_sub_data(&mut device, "glBufferSubData", BufferTarget::Array, 7, &[1, 1])
            .unwrap_err();
        assert!(matches!(
            err,
            GlError::Device(DeviceError::BufferWriteOutOfBounds {
                buffer_size: 8,
                write_end: 9
            })
        ));
    }

    #[test]
    fn delete_unbinds_and_destroys() {
        let mut device = RecordingDevice::new(31, 16);
        let mut buffers = BufferObjects::new();
        buffers.bind(BufferTarget::ElementArray, 4);
        buffers
            .buffer_data(&mut device, "glBufferData", BufferTarget::ElementArray, 2, None)
            .unwrap();
        assert_eq!(buffers.delete(&mut device, &[4, 5]).unwrap(), vec![4]);
        assert_eq!(buffers.bound(BufferTarget::ElementArray), 0);
        assert_eq!(device.stats().snapshot().live_buffers, 0);
    }
}
