//! Promotion of client-array components to 32-bit floats.

use half::f16;

use super::ComponentType;

/// A source component type with its promotion rules.
pub trait Component: bytemuck::Pod {
    fn to_f32(self) -> f32;
    /// Normalized value: `v / max` for unsigned types and `(2v + 1) / max`
    /// for signed ones, where `max = 2^bits - 1`. Floats pass through.
    fn normalize(self) -> f32;
}

macro_rules! unsigned_component {
    ($ty:ty) => {
        impl Component for $ty {
            fn to_f32(self) -> f32 {
                self as f32
            }

            fn normalize(self) -> f32 {
                self as f32 / <$ty>::MAX as f32
            }
        }
    };
}

macro_rules! signed_component {
    ($ty:ty, $unsigned:ty) => {
        impl Component for $ty {
            fn to_f32(self) -> f32 {
                self as f32
            }

            fn normalize(self) -> f32 {
                (2.0 * self as f32 + 1.0) / <$unsigned>::MAX as f32
            }
        }
    };
}

unsigned_component!(u8);
unsigned_component!(u16);
unsigned_component!(u32);
signed_component!(i8, u8);
signed_component!(i16, u16);
signed_component!(i32, u32);

impl Component for f16 {
    fn to_f32(self) -> f32 {
        f16::to_f32(self)
    }

    fn normalize(self) -> f32 {
        f16::to_f32(self)
    }
}

impl Component for f32 {
    fn to_f32(self) -> f32 {
        self
    }

    fn normalize(self) -> f32 {
        self
    }
}

impl Component for f64 {
    fn to_f32(self) -> f32 {
        self as f32
    }

    fn normalize(self) -> f32 {
        self as f32
    }
}

/// Where one attribute's vertices live in client memory.
#[derive(Clone, Copy, Debug)]
pub struct SourceLayout<'a> {
    pub data: &'a [u8],
    pub components: usize,
    /// Byte distance between consecutive vertices (never zero).
    pub stride: usize,
}

/// A vertex read would run past the end of client memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutOfBounds {
    pub offset: usize,
    pub len: usize,
    pub available: usize,
}

/// Appends `components` floats per listed vertex to `out`.
pub fn convert_vertices<I>(
    ty: ComponentType,
    normalize: bool,
    layout: SourceLayout<'_>,
    vertices: I,
    out: &mut Vec<f32>,
) -> Result<(), OutOfBounds>
where
    I: IntoIterator<Item = u32>,
{
    match ty {
        ComponentType::Byte => convert::<i8, _>(normalize, layout, vertices, out),
        ComponentType::UnsignedByte => convert::<u8, _>(normalize, layout, vertices, out),
        ComponentType::Short => convert::<i16, _>(normalize, layout, vertices, out),
        ComponentType::UnsignedShort => convert::<u16, _>(normalize, layout, vertices, out),
        ComponentType::Int => convert::<i32, _>(normalize, layout, vertices, out),
        ComponentType::UnsignedInt => convert::<u32, _>(normalize, layout, vertices, out),
        ComponentType::HalfFloat => convert::<f16, _>(normalize, layout, vertices, out),
        ComponentType::Float => convert::<f32, _>(normalize, layout, vertices, out),
        ComponentType::Double => convert::<f64, _>(normalize, layout, vertices, out),
    }
}

fn convert<C, I>(
    normalize: bool,
    layout: SourceLayout<'_>,
    vertices: I,
    out: &mut Vec<f32>,
) -> Result<(), OutOfBounds>
where
    C: Component,
    I: IntoIterator<Item = u32>,
{
    let size = std::mem::size_of::<C>();
    let element = layout.components * size;
    for vertex in vertices {
        let start = vertex as usize * layout.stride;
        let bytes = layout
            .data
            .get(start..start + element)
            .ok_or(OutOfBounds {
                offset: start,
                len: element,
                available: layout.data.len(),
            })?;
        for raw in bytes.chunks_exact(size) {
            let value: C = bytemuck::pod_read_unaligned(raw);
            out.push(if normalize {
                value.normalize()
            } else {
                value.to_f32()
            });
        }
    }
    Ok(())
}
