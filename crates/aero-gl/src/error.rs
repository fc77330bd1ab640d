use thiserror::Error;

use crate::device::DeviceError;
use crate::slots::SlotKind;

pub type Result<T, E = GlError> = std::result::Result<T, E>;

/// Fatal replay errors.
///
/// Every variant means the trace left the supported subset; none is retryable.
/// Configuration and capability errors name the call and the offending
/// parameter so the replay can abort with a precise diagnostic.
#[derive(Debug, Error)]
pub enum GlError {
    #[error("{call}: unsupported {param} {value:#06x}")]
    UnsupportedEnum {
        call: &'static str,
        param: &'static str,
        value: u32,
    },
    #[error("{call}: unsupported {param} value {value}")]
    UnsupportedValue {
        call: &'static str,
        param: &'static str,
        value: i64,
    },
    #[error("{call}: stride {stride} is not a multiple of the {component_size}-byte component size")]
    UnalignedStride {
        call: &'static str,
        stride: usize,
        component_size: usize,
    },
    #[error("{call}: indexed draw mixes buffer-object and client-memory vertex arrays")]
    MixedVertexArrays { call: &'static str },
    #[error("{call}: element array buffer bound while vertex arrays live in client memory")]
    ElementBufferWithClientArrays { call: &'static str },
    #[error("{call}: {param} must be {expected} while {state}")]
    PointerKind {
        call: &'static str,
        param: &'static str,
        expected: &'static str,
        state: &'static str,
    },
    #[error("{call}: {what} {index} out of range (limit {limit})")]
    CapabilityOutOfRange {
        call: &'static str,
        what: &'static str,
        index: u32,
        limit: u32,
    },
    #[error("{pool} slot pool exhausted ({capacity} slots, {requested} requested)")]
    SlotPoolExhausted {
        pool: SlotKind,
        capacity: u32,
        requested: usize,
    },
    #[error("{pool} slot {id} out of range (pool size {capacity})")]
    SlotOutOfRange {
        pool: SlotKind,
        id: u32,
        capacity: u32,
    },
    #[error("{pool} slot {id} released while not leased")]
    SlotNotLeased { pool: SlotKind, id: u32 },
    #[error("{call}: matrix stack overflow (depth {depth})")]
    MatrixStackOverflow { call: &'static str, depth: usize },
    #[error("{call}: matrix stack underflow")]
    MatrixStackUnderflow { call: &'static str },
    #[error("{call}: {matrix} matrix is singular")]
    SingularMatrix {
        call: &'static str,
        matrix: &'static str,
    },
    #[error("{call}: attribute stack overflow (depth {depth})")]
    AttribStackOverflow { call: &'static str, depth: usize },
    #[error("{call}: attribute stack underflow")]
    AttribStackUnderflow { call: &'static str },
    #[error("{call}: unsupported texture format (internal {internal_format:#06x}, format {format:#06x}, type {ty:#06x})")]
    UnsupportedTextureFormat {
        call: &'static str,
        internal_format: u32,
        format: u32,
        ty: u32,
    },
    #[error("{call}: texture image data is {actual} bytes, expected {expected}")]
    TextureDataSize {
        call: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{call}: {array} array enabled but never configured")]
    UninitializedArray {
        call: &'static str,
        array: &'static str,
    },
    #[error("{call}: {array} array read of {len} bytes at offset {offset} exceeds {available} available bytes")]
    ClientArrayOutOfBounds {
        call: &'static str,
        array: &'static str,
        offset: usize,
        len: usize,
        available: usize,
    },
    #[error("{call}: not allowed between Begin and End")]
    InsideBeginEnd { call: &'static str },
    #[error("{call}: only allowed between Begin and End")]
    OutsideBeginEnd { call: &'static str },
    #[error("{call}: no buffer object bound to {target:#06x}")]
    NoBufferBound { call: &'static str, target: u32 },
    #[error("{call}: unknown {kind} object {name}")]
    UnknownObject {
        call: &'static str,
        kind: &'static str,
        name: u32,
    },
    #[error("{call}: texture unit {unit} is sampled but has no texture image")]
    MissingTexture { call: &'static str, unit: u32 },
    #[error("{call}: texture level {level} layer {layer} has no image")]
    MissingImage { call: &'static str, level: u32, layer: u32 },
    #[error("{call}: {target} program {name} has no program string")]
    EmptyProgram {
        call: &'static str,
        target: &'static str,
        name: u32,
    },
    #[error("{call}: program compilation failed: {message}")]
    ProgramCompile { call: &'static str, message: String },
    #[error("{call}: element range [{start}, {end}] is empty")]
    InvalidRange { call: &'static str, start: u32, end: u32 },
    #[error("invalid context configuration: {0}")]
    Config(&'static str),
    #[error(transparent)]
    Device(#[from] DeviceError),
}

impl GlError {
    pub(crate) fn unsupported(call: &'static str, param: &'static str, value: u32) -> Self {
        Self::UnsupportedEnum { call, param, value }
    }
}
