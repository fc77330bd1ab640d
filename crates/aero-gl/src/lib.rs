//! Legacy fixed-function GL translation core for trace replay.
//!
//! A [`GlContext`] consumes decoded GL calls one at a time and drives a
//! programmable [`Device`]: it keeps the legacy state store, emulates the
//! primitives the device lacks, packs vertex data into device streams and
//! synthesizes the vertex/fragment programs that stand in for the
//! fixed-function pipeline at every draw.
//!
//! Every error is fatal; a trace that leaves the supported subset aborts the
//! replay with a [`GlError`] naming the offending call.

pub mod config;
pub mod context;
pub mod device;
pub mod draw;
pub mod error;
pub mod fixed_function;
pub mod gl;
pub mod objects;
pub mod program;
pub mod slots;
pub mod state;
pub mod texture_unit;
pub mod vertex;

pub use config::ContextConfig;
pub use context::{ClearValues, GlContext};
pub use device::{Device, DeviceError, DeviceStatsSnapshot, RecordingDevice, ShaderCode, ShaderStage};
pub use error::{GlError, Result};
pub use fixed_function::{ShaderSynthesizer, WgslSynthesizer};
pub use objects::texture::{PassthroughConverter, PixelConverter};
pub use objects::ParamValue;
pub use program::{AssemblyPassthrough, ProgramCompiler};
pub use vertex::{ArrayPointer, ClientMemory};
