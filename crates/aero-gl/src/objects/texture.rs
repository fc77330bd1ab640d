//! Texture objects: sampling parameters, per-level images, device storage.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use tracing::debug;

use super::ParamValue;
use crate::device::{Device, TextureDesc, TextureHandle, TextureWrite};
use crate::error::{GlError, Result};
use crate::gl;
use crate::state::translate;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureTarget {
    Texture1D,
    Texture2D,
    Texture3D,
    CubeMap,
    Rectangle,
}

impl TextureTarget {
    pub const COUNT: usize = 5;

    pub fn index(self) -> usize {
        match self {
            TextureTarget::Texture1D => 0,
            TextureTarget::Texture2D => 1,
            TextureTarget::Texture3D => 2,
            TextureTarget::CubeMap => 3,
            TextureTarget::Rectangle => 4,
        }
    }

    pub fn all() -> [TextureTarget; Self::COUNT] {
        [
            TextureTarget::Texture1D,
            TextureTarget::Texture2D,
            TextureTarget::Texture3D,
            TextureTarget::CubeMap,
            TextureTarget::Rectangle,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            TextureTarget::Texture1D => "1d",
            TextureTarget::Texture2D => "2d",
            TextureTarget::Texture3D => "3d",
            TextureTarget::CubeMap => "cube",
            TextureTarget::Rectangle => "rectangle",
        }
    }
}

/// Legacy base internal format; drives texture-environment semantics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BaseFormat {
    Alpha,
    Luminance,
    LuminanceAlpha,
    Intensity,
    Rgb,
    #[default]
    Rgba,
    Depth,
}

impl BaseFormat {
    /// Whether the format supplies color channels to the environment.
    pub fn has_color(self) -> bool {
        !matches!(self, BaseFormat::Alpha)
    }

    /// Whether the format supplies an alpha channel to the environment.
    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            BaseFormat::Alpha | BaseFormat::LuminanceAlpha | BaseFormat::Intensity | BaseFormat::Rgba
        )
    }
}

/// Device storage chosen for a legacy internal format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureFormatInfo {
    pub format: wgpu::TextureFormat,
    pub base: BaseFormat,
    pub compressed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MinFilter {
    pub filter: wgpu::FilterMode,
    /// `None` when the filter ignores mipmaps.
    pub mipmap: Option<wgpu::FilterMode>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureParams {
    /// (s, t, r).
    pub wrap: [wgpu::AddressMode; 3],
    pub min_filter: MinFilter,
    pub mag_filter: wgpu::FilterMode,
    pub max_anisotropy: u16,
    pub min_lod: f32,
    pub max_lod: f32,
    pub lod_bias: f32,
    pub base_level: u32,
    pub max_level: u32,
}

impl Default for TextureParams {
    fn default() -> Self {
        Self {
            wrap: [wgpu::AddressMode::Repeat; 3],
            min_filter: MinFilter {
                filter: wgpu::FilterMode::Nearest,
                mipmap: Some(wgpu::FilterMode::Linear),
            },
            mag_filter: wgpu::FilterMode::Linear,
            max_anisotropy: 1,
            min_lod: -1000.0,
            max_lod: 1000.0,
            lod_bias: 0.0,
            base_level: 0,
            max_level: 1000,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub format: TextureFormatInfo,
}

#[derive(Debug)]
pub struct TextureObject {
    pub name: u32,
    pub target: Option<TextureTarget>,
    pub params: TextureParams,
    /// Keyed by (layer, level).
    pub images: BTreeMap<(u32, u32), ImageInfo>,
    pub device: Option<TextureHandle>,
    device_desc: Option<TextureDesc>,
}

impl TextureObject {
    fn new(name: u32, target: Option<TextureTarget>) -> Self {
        Self {
            name,
            target,
            params: TextureParams::default(),
            images: BTreeMap::new(),
            device: None,
            device_desc: None,
        }
    }

    /// Base format of the level-0 image; RGBA when nothing is defined.
    pub fn base_format(&self) -> BaseFormat {
        self.images
            .iter()
            .find(|((_, level), _)| *level == 0)
            .map(|(_, info)| info.format.base)
            .unwrap_or_default()
    }

    pub fn set_parameter(&mut self, call: &'static str, pname: u32, value: ParamValue) -> Result<()> {
        let params = &mut self.params;
        match pname {
            gl::TEXTURE_WRAP_S => params.wrap[0] = translate::address_mode(call, value.as_enum())?,
            gl::TEXTURE_WRAP_T => params.wrap[1] = translate::address_mode(call, value.as_enum())?,
            gl::TEXTURE_WRAP_R => params.wrap[2] = translate::address_mode(call, value.as_enum())?,
            gl::TEXTURE_MIN_FILTER => params.min_filter = translate::min_filter(call, value.as_enum())?,
            gl::TEXTURE_MAG_FILTER => params.mag_filter = translate::mag_filter(call, value.as_enum())?,
            gl::TEXTURE_MAX_ANISOTROPY_EXT => {
                params.max_anisotropy = match value.as_f32() as u16 {
                    // Traces captured against drivers capping at 8 replay at the device maximum.
                    8 => 16,
                    n => n.clamp(1, 16),
                };
            }
            gl::TEXTURE_BASE_LEVEL => params.base_level = value.as_i64().max(0) as u32,
            gl::TEXTURE_MAX_LEVEL => params.max_level = value.as_i64().max(0) as u32,
            gl::TEXTURE_MIN_LOD => params.min_lod = value.as_f32(),
            gl::TEXTURE_MAX_LOD => params.max_lod = value.as_f32(),
            gl::TEXTURE_LOD_BIAS => params.lod_bias = value.as_f32(),
            other => return Err(GlError::unsupported(call, "texture parameter", other)),
        }
        Ok(())
    }
}

/// Source pixels handed to a [`PixelConverter`].
#[derive(Clone, Copy, Debug)]
pub struct PixelTransfer<'a> {
    pub call: &'static str,
    pub internal_format: u32,
    pub target_format: TextureFormatInfo,
    pub format: u32,
    pub ty: u32,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub data: &'a [u8],
}

impl PixelTransfer<'_> {
    fn unsupported(&self) -> GlError {
        GlError::UnsupportedTextureFormat {
            call: self.call,
            internal_format: self.internal_format,
            format: self.format,
            ty: self.ty,
        }
    }

    /// Byte size of the image in the device format.
    pub fn device_size(&self) -> Result<usize> {
        let format = self.target_format.format;
        let block_size = format.block_copy_size(None).ok_or_else(|| self.unsupported())?;
        let (bw, bh) = format.block_dimensions();
        let blocks_x = self.width.div_ceil(bw) as usize;
        let blocks_y = self.height.div_ceil(bh) as usize;
        Ok(blocks_x * blocks_y * self.depth as usize * block_size as usize)
    }
}

/// Conversion from client pixel layouts to device texture layouts.
pub trait PixelConverter {
    fn convert(&self, transfer: &PixelTransfer<'_>) -> Result<Vec<u8>>;
}

/// Accepts only client layouts that already match the device format byte
/// for byte; anything needing arithmetic is an unsupported format.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassthroughConverter;

impl PixelConverter for PassthroughConverter {
    fn convert(&self, transfer: &PixelTransfer<'_>) -> Result<Vec<u8>> {
        use wgpu::TextureFormat as F;
        let matches = match transfer.target_format.format {
            F::Rgba8Unorm => {
                transfer.format == gl::RGBA
                    && matches!(transfer.ty, gl::UNSIGNED_BYTE | gl::UNSIGNED_INT_8_8_8_8_REV)
            }
            F::Bgra8Unorm => {
                transfer.format == gl::BGRA
                    && matches!(transfer.ty, gl::UNSIGNED_BYTE | gl::UNSIGNED_INT_8_8_8_8_REV)
            }
            F::R8Unorm => {
                matches!(transfer.format, gl::ALPHA | gl::LUMINANCE | gl::INTENSITY)
                    && transfer.ty == gl::UNSIGNED_BYTE
            }
            F::Rg8Unorm => transfer.format == gl::LUMINANCE_ALPHA && transfer.ty == gl::UNSIGNED_BYTE,
            F::Depth16Unorm => {
                transfer.format == gl::DEPTH_COMPONENT && transfer.ty == gl::UNSIGNED_SHORT
            }
            F::Depth32Float => transfer.format == gl::DEPTH_COMPONENT && transfer.ty == gl::FLOAT,
            _ => false,
        };
        if !matches {
            return Err(transfer.unsupported());
        }
        let expected = transfer.device_size()?;
        if transfer.data.len() < expected {
            return Err(GlError::TextureDataSize {
                call: transfer.call,
                expected,
                actual: transfer.data.len(),
            });
        }
        Ok(transfer.data[..expected].to_vec())
    }
}

/// An image specification call after enum translation.
#[derive(Clone, Copy, Debug)]
pub struct ImageUpload<'a> {
    pub target: TextureTarget,
    pub layer: u32,
    pub level: u32,
    pub internal_format: u32,
    pub format_info: TextureFormatInfo,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    /// Client format/type, or `None` for pre-compressed data.
    pub layout: Option<(u32, u32)>,
    pub data: Option<&'a [u8]>,
}

/// A sub-image replacement call after enum translation.
#[derive(Clone, Copy, Debug)]
pub struct RegionUpload<'a> {
    pub target: TextureTarget,
    pub layer: u32,
    pub level: u32,
    pub origin: [u32; 3],
    pub size: [u32; 3],
    pub format: u32,
    pub ty: u32,
    pub data: &'a [u8],
}

/// Name table for texture objects, including the per-target defaults
/// bound as name 0.
#[derive(Debug)]
pub struct TextureObjects {
    objects: HashMap<u32, TextureObject>,
    defaults: Vec<TextureObject>,
}

impl Default for TextureObjects {
    fn default() -> Self {
        Self {
            objects: HashMap::new(),
            defaults: TextureTarget::all()
                .into_iter()
                .map(|target| TextureObject::new(0, Some(target)))
                .collect(),
        }
    }
}

impl TextureObjects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate(&mut self, names: &[u32]) {
        for &name in names {
            if name != 0 {
                self.objects
                    .entry(name)
                    .or_insert_with(|| TextureObject::new(name, None));
            }
        }
    }

    pub fn get(&self, name: u32, target: TextureTarget) -> Option<&TextureObject> {
        if name == 0 {
            self.defaults.get(target.index())
        } else {
            self.objects.get(&name)
        }
    }

    pub fn get_mut(&mut self, name: u32, target: TextureTarget) -> Option<&mut TextureObject> {
        if name == 0 {
            self.defaults.get_mut(target.index())
        } else {
            self.objects.get_mut(&name)
        }
    }

    /// Binding fixes an object's target on first use; names bound without a
    /// prior generate are created implicitly.
    pub fn bind(&mut self, call: &'static str, target: TextureTarget, name: u32) -> Result<()> {
        if name == 0 {
            return Ok(());
        }
        let object = self
            .objects
            .entry(name)
            .or_insert_with(|| TextureObject::new(name, None));
        match object.target {
            None => object.target = Some(target),
            Some(existing) if existing == target => {}
            Some(_) => {
                return Err(GlError::UnsupportedEnum {
                    call,
                    param: "texture target for an object bound elsewhere",
                    value: name,
                })
            }
        }
        Ok(())
    }

    /// Deletes the named objects, destroying their device textures.
    pub fn delete<D: Device>(&mut self, device: &mut D, names: &[u32]) -> Result<()> {
        for name in names {
            if let Some(object) = self.objects.remove(name) {
                if let Some(handle) = object.device {
                    device.destroy_texture(handle)?;
                }
            }
        }
        Ok(())
    }

    /// Defines one image of the object bound as `name`, (re)creating device
    /// storage when the level-0 shape or format changes.
    pub fn upload<D: Device>(
        &mut self,
        device: &mut D,
        converter: &dyn PixelConverter,
        call: &'static str,
        name: u32,
        upload: &ImageUpload<'_>,
    ) -> Result<()> {
        let object = self
            .get_mut(name, upload.target)
            .ok_or(GlError::UnknownObject {
                call,
                kind: "texture",
                name,
            })?;

        let bytes = match (upload.data, upload.layout) {
            (None, _) => None,
            (Some(data), None) => Some(data.to_vec()),
            (Some(data), Some((format, ty))) => Some(converter.convert(&PixelTransfer {
                call,
                internal_format: upload.internal_format,
                target_format: upload.format_info,
                format,
                ty,
                width: upload.width,
                height: upload.height,
                depth: upload.depth,
                data,
            })?),
        };

        let base_width = upload.width.checked_shl(upload.level).unwrap_or(u32::MAX).max(1);
        let base_height = upload.height.checked_shl(upload.level).unwrap_or(u32::MAX).max(1);
        let depth_or_layers = match upload.target {
            TextureTarget::CubeMap => 6,
            TextureTarget::Texture3D => upload.depth.checked_shl(upload.level).unwrap_or(u32::MAX).max(1),
            _ => 1,
        };
        let desc = TextureDesc {
            target: upload.target,
            format: upload.format_info.format,
            width: base_width,
            height: base_height,
            depth_or_layers,
            mip_levels: 32 - base_width.max(base_height).leading_zeros(),
        };

        let needs_storage = match object.device_desc {
            None => true,
            Some(existing) => upload.level == 0 && upload.layer == 0 && existing != desc,
        };
        if needs_storage {
            if let Some(old) = object.device.take() {
                device.destroy_texture(old)?;
                object.images.clear();
            }
            debug!(
                texture = name,
                target = upload.target.name(),
                width = desc.width,
                height = desc.height,
                format = ?desc.format,
                "creating texture storage"
            );
            object.device = Some(device.create_texture(&desc)?);
            object.device_desc = Some(desc);
        }

        object.images.insert(
            (upload.layer, upload.level),
            ImageInfo {
                width: upload.width,
                height: upload.height,
                depth: upload.depth,
                format: upload.format_info,
            },
        );

        if let (Some(bytes), Some(handle)) = (bytes, object.device) {
            device.write_texture(
                handle,
                &TextureWrite {
                    level: upload.level,
                    layer: upload.layer,
                    origin: [0, 0, 0],
                    size: [upload.width, upload.height, upload.depth],
                    data: &bytes,
                },
            )?;
        }
        Ok(())
    }

    /// Replaces a region of an existing image.
    pub fn upload_region<D: Device>(
        &mut self,
        device: &mut D,
        converter: &dyn PixelConverter,
        call: &'static str,
        name: u32,
        region: &RegionUpload<'_>,
    ) -> Result<()> {
        let object = self.get(name, region.target).ok_or(GlError::UnknownObject {
            call,
            kind: "texture",
            name,
        })?;
        let missing = GlError::MissingImage {
            call,
            level: region.level,
            layer: region.layer,
        };
        let Some(info) = object.images.get(&(region.layer, region.level)).copied() else {
            return Err(missing);
        };
        let Some(handle) = object.device else {
            return Err(missing);
        };
        let bytes = converter.convert(&PixelTransfer {
            call,
            internal_format: 0,
            target_format: info.format,
            format: region.format,
            ty: region.ty,
            width: region.size[0],
            height: region.size[1],
            depth: region.size[2],
            data: region.data,
        })?;
        device.write_texture(
            handle,
            &TextureWrite {
                level: region.level,
                layer: region.layer,
                origin: region.origin,
                size: region.size,
                data: &bytes,
            },
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::RecordingDevice;

    fn rgba_upload(width: u32, height: u32, level: u32, data: Option<&[u8]>) -> ImageUpload<'_> {
        ImageUpload {
            target: TextureTarget::Texture2D,
            layer: 0,
            level,
            internal_format: gl::RGBA,
            format_info: translate::internal_format("glTexImage2D", gl::RGBA).unwrap(),
            width,
            height,
            depth: 1,
            layout: Some((gl::RGBA, gl::UNSIGNED_BYTE)),
            data,
        }
    }

    #[test]
    fn parameters_default_and_update() {
        let mut object = TextureObject::new(1, Some(TextureTarget::Texture2D));
        assert_eq!(object.params.wrap, [wgpu::AddressMode::Repeat; 3]);
        assert_eq!(object.params.min_filter.mipmap, Some(wgpu::FilterMode::Linear));

        object
            .set_parameter("glTexParameteri", gl::TEXTURE_WRAP_S, ParamValue::Int(gl::CLAMP_TO_EDGE as i32))
            .unwrap();
        object
            .set_parameter("glTexParameterf", gl::TEXTURE_MAX_ANISOTROPY_EXT, ParamValue::Float(8.0))
            .unwrap();
        assert_eq!(object.params.wrap[0], wgpu::AddressMode::ClampToEdge);
        assert_eq!(object.params.max_anisotropy, 16);

        let err = object
            .set_parameter("glTexParameteri", gl::TEXTURE_MIN_FILTER, ParamValue::Int(0x1234))
            .unwrap_err();
        assert!(matches!(err, GlError::UnsupportedEnum { value: 0x1234, .. }));
    }

    #[test]
    fn upload_creates_storage_and_writes_level() {
        let mut device = RecordingDevice::new(31, 16);
        let mut objects = TextureObjects::new();
        objects.generate(&[5]);
        objects.bind("glBindTexture", TextureTarget::Texture2D, 5).unwrap();

        let pixels = [0xffu8; 4 * 4 * 4];
        objects
            .upload(&mut device, &PassthroughConverter, "glTexImage2D", 5, &rgba_upload(4, 4, 0, Some(&pixels)))
            .unwrap();
        let object = objects.get(5, TextureTarget::Texture2D).unwrap();
        let handle = object.device.unwrap();
        assert_eq!(device.texture_desc(handle).unwrap().mip_levels, 3);
        assert_eq!(device.texture_level(handle, 0, 0).unwrap().len(), 64);
        assert_eq!(object.base_format(), BaseFormat::Rgba);
    }

    #[test]
    fn conversion_requiring_arithmetic_is_rejected() {
        let mut device = RecordingDevice::new(31, 16);
        let mut objects = TextureObjects::new();
        let pixels = [0u8; 12];
        let mut upload = rgba_upload(2, 2, 0, None);
        upload.layout = Some((gl::RGB, gl::UNSIGNED_BYTE));
        upload.data = Some(&pixels);
        let err = objects
            .upload(&mut device, &PassthroughConverter, "glTexImage2D", 0, &upload)
            .unwrap_err();
        assert!(matches!(
            err,
            GlError::UnsupportedTextureFormat { format: gl::RGB, .. }
        ));
    }

    #[test]
    fn rebinding_to_another_target_is_rejected() {
        let mut objects = TextureObjects::new();
        objects.bind("glBindTexture", TextureTarget::Texture2D, 3).unwrap();
        assert!(objects.bind("glBindTexture", TextureTarget::CubeMap, 3).is_err());
    }

    #[test]
    fn delete_destroys_device_storage() {
        let mut device = RecordingDevice::new(31, 16);
        let mut objects = TextureObjects::new();
        objects.bind("glBindTexture", TextureTarget::Texture2D, 9).unwrap();
        objects
            .upload(&mut device, &PassthroughConverter, "glTexImage2D", 9, &rgba_upload(2, 2, 0, None))
            .unwrap();
        assert_eq!(device.stats().snapshot().live_textures, 1);
        objects.delete(&mut device, &[9]).unwrap();
        assert_eq!(device.stats().snapshot().live_textures, 0);
        assert!(objects.get(9, TextureTarget::Texture2D).is_none());
    }
}
