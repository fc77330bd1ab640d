//! Named buffer and texture objects.

pub mod buffer;
pub mod texture;

/// Scalar argument of the `*Parameter{i,f}` calls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamValue {
    Int(i32),
    Float(f32),
}

impl ParamValue {
    pub fn as_f32(self) -> f32 {
        match self {
            ParamValue::Int(v) => v as f32,
            ParamValue::Float(v) => v,
        }
    }

    /// Enumerator interpretation; float arguments are truncated.
    pub fn as_enum(self) -> u32 {
        match self {
            ParamValue::Int(v) => v as u32,
            ParamValue::Float(v) => v as u32,
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            ParamValue::Int(v) => i64::from(v),
            ParamValue::Float(v) => v as i64,
        }
    }
}
