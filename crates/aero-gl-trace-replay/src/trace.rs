//! JSON-lines trace records.
//!
//! One object per line, tagged by the entry point name without its `gl`
//! prefix, e.g. `{"call":"DrawArrays","mode":4,"first":0,"count":3}`.
//! Enumerants are plain numbers. Client memory is carried as a typed array
//! (`{"type":"f32","data":[...]}`) and reinterpreted as little-endian bytes.

use aero_gl::{ArrayPointer, ClientMemory, ParamValue};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ClientData {
    U8(Vec<u8>),
    I8(Vec<i8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    U32(Vec<u32>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl ClientData {
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            ClientData::U8(v) => v.clone(),
            ClientData::I8(v) => bytemuck::cast_slice(v).to_vec(),
            ClientData::U16(v) => bytemuck::cast_slice(v).to_vec(),
            ClientData::I16(v) => bytemuck::cast_slice(v).to_vec(),
            ClientData::U32(v) => bytemuck::cast_slice(v).to_vec(),
            ClientData::I32(v) => bytemuck::cast_slice(v).to_vec(),
            ClientData::F32(v) => bytemuck::cast_slice(v).to_vec(),
            ClientData::F64(v) => bytemuck::cast_slice(v).to_vec(),
        }
    }

    pub fn to_memory(&self) -> ClientMemory {
        ClientMemory::new(self.to_bytes())
    }
}

/// A pointer argument: an offset into the bound buffer object, or client
/// memory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pointer {
    Offset(usize),
    Client(ClientData),
}

impl Pointer {
    pub fn to_array_pointer(&self) -> ArrayPointer {
        match self {
            Pointer::Offset(offset) => ArrayPointer::Offset(*offset),
            Pointer::Client(data) => ArrayPointer::Client(data.to_memory()),
        }
    }
}

/// Scalar parameter of the `i`/`f` call variants. Integers are tried first so
/// enumerants survive unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Param {
    Int(i32),
    Float(f32),
}

impl From<Param> for ParamValue {
    fn from(value: Param) -> Self {
        match value {
            Param::Int(v) => ParamValue::Int(v),
            Param::Float(v) => ParamValue::Float(v),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "call")]
pub enum TraceCall {
    // Capabilities and client state.
    Enable { cap: u32 },
    Disable { cap: u32 },
    EnableClientState { array: u32 },
    DisableClientState { array: u32 },
    EnableVertexAttribArray { index: u32 },
    DisableVertexAttribArray { index: u32 },

    // Immediate mode.
    Begin { mode: u32 },
    End,
    Vertex { coords: Vec<f32> },
    Color { rgba: Vec<f32> },
    ColorUb { rgba: Vec<u8> },
    Normal { x: f32, y: f32, z: f32 },
    TexCoord { coords: Vec<f32> },
    MultiTexCoord { texture: u32, coords: Vec<f32> },

    // Arrays and draws.
    VertexPointer { size: i32, ty: u32, stride: i32, pointer: Pointer },
    ColorPointer { size: i32, ty: u32, stride: i32, pointer: Pointer },
    NormalPointer { ty: u32, stride: i32, pointer: Pointer },
    TexCoordPointer { size: i32, ty: u32, stride: i32, pointer: Pointer },
    VertexAttribPointer {
        index: u32,
        size: i32,
        ty: u32,
        normalized: bool,
        stride: i32,
        pointer: Pointer,
    },
    InterleavedArrays { format: u32, stride: i32, pointer: Pointer },
    DrawArrays { mode: u32, first: i32, count: i32 },
    DrawElements { mode: u32, count: i32, ty: u32, indices: Pointer },
    DrawRangeElements {
        mode: u32,
        start: u32,
        end: u32,
        count: i32,
        ty: u32,
        indices: Pointer,
    },

    // Transform.
    MatrixMode { mode: u32 },
    PushMatrix,
    PopMatrix,
    LoadIdentity,
    LoadMatrix { m: [f32; 16] },
    MultMatrix { m: [f32; 16] },
    Translate { x: f32, y: f32, z: f32 },
    Scale { x: f32, y: f32, z: f32 },
    Rotate { angle: f32, x: f32, y: f32, z: f32 },
    Ortho { left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64 },
    Frustum { left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64 },
    PushAttrib { mask: u32 },
    PopAttrib,

    // Lighting, fog, alpha test.
    Light { light: u32, pname: u32, params: Vec<f32> },
    LightModel { pname: u32, params: Vec<f32> },
    Material { face: u32, pname: u32, params: Vec<f32> },
    ColorMaterial { face: u32, mode: u32 },
    ShadeModel { mode: u32 },
    Fog { pname: u32, params: Vec<f32> },
    AlphaFunc { func: u32, reference: f32 },

    // Render state.
    DepthFunc { func: u32 },
    DepthMask { flag: bool },
    DepthRange { near: f64, far: f64 },
    StencilFunc { func: u32, reference: i32, mask: u32 },
    StencilFuncSeparate { face: u32, func: u32, reference: i32, mask: u32 },
    StencilOp { fail: u32, depth_fail: u32, pass: u32 },
    StencilOpSeparate { face: u32, fail: u32, depth_fail: u32, pass: u32 },
    StencilMask { mask: u32 },
    BlendFunc { src: u32, dst: u32 },
    BlendFuncSeparate { src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32 },
    BlendEquation { mode: u32 },
    BlendEquationSeparate { rgb: u32, alpha: u32 },
    BlendColor { rgba: [f32; 4] },
    ColorMask { red: bool, green: bool, blue: bool, alpha: bool },
    CullFace { face: u32 },
    FrontFace { winding: u32 },
    PolygonOffset { factor: f32, units: f32 },
    PolygonMode { face: u32, mode: u32 },
    Viewport { x: i32, y: i32, width: i32, height: i32 },
    Scissor { x: i32, y: i32, width: i32, height: i32 },
    ClearColor { rgba: [f32; 4] },
    ClearDepth { depth: f64 },
    ClearStencil { stencil: i32 },
    Clear { mask: u32 },

    // Texturing.
    ActiveTexture { texture: u32 },
    ClientActiveTexture { texture: u32 },
    TexEnv { target: u32, pname: u32, params: Vec<f32> },
    TexGen { coord: u32, pname: u32, params: Vec<f32> },
    GenTextures { names: Vec<u32> },
    BindTexture { target: u32, texture: u32 },
    DeleteTextures { names: Vec<u32> },
    TexParameter { target: u32, pname: u32, value: Param },
    TexImage1D {
        target: u32,
        level: i32,
        internal_format: u32,
        width: i32,
        border: i32,
        format: u32,
        ty: u32,
        data: Option<ClientData>,
    },
    TexImage2D {
        target: u32,
        level: i32,
        internal_format: u32,
        width: i32,
        height: i32,
        border: i32,
        format: u32,
        ty: u32,
        data: Option<ClientData>,
    },
    TexImage3D {
        target: u32,
        level: i32,
        internal_format: u32,
        width: i32,
        height: i32,
        depth: i32,
        border: i32,
        format: u32,
        ty: u32,
        data: Option<ClientData>,
    },
    CompressedTexImage2D {
        target: u32,
        level: i32,
        internal_format: u32,
        width: i32,
        height: i32,
        border: i32,
        data: ClientData,
    },
    TexSubImage2D {
        target: u32,
        level: i32,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        data: ClientData,
    },

    // Buffer objects.
    GenBuffers { names: Vec<u32> },
    BindBuffer { target: u32, buffer: u32 },
    DeleteBuffers { names: Vec<u32> },
    BufferData { target: u32, size: i64, data: Option<ClientData> },
    BufferSubData { target: u32, offset: i64, data: ClientData },

    // Assembly programs.
    GenPrograms { names: Vec<u32> },
    BindProgram { target: u32, program: u32 },
    DeletePrograms { names: Vec<u32> },
    ProgramString { target: u32, format: u32, text: String },
    ProgramEnvParameter { target: u32, index: u32, params: [f32; 4] },
    ProgramLocalParameter { target: u32, index: u32, params: [f32; 4] },
    ProgramEnvParameters { target: u32, index: u32, params: Vec<[f32; 4]> },
    ProgramLocalParameters { target: u32, index: u32, params: Vec<[f32; 4]> },
}

impl TraceCall {
    /// Calls that submit geometry to the device.
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            TraceCall::End
                | TraceCall::DrawArrays { .. }
                | TraceCall::DrawElements { .. }
                | TraceCall::DrawRangeElements { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn records_are_tagged_by_call_name() {
        let call: TraceCall =
            serde_json::from_str(r#"{"call":"DrawArrays","mode":4,"first":0,"count":3}"#).unwrap();
        assert_eq!(
            call,
            TraceCall::DrawArrays {
                mode: 4,
                first: 0,
                count: 3
            }
        );
        let call: TraceCall = serde_json::from_str(r#"{"call":"End"}"#).unwrap();
        assert!(call.is_draw());
    }

    #[test]
    fn typed_client_arrays_become_little_endian_bytes() {
        let pointer: Pointer =
            serde_json::from_str(r#"{"client":{"type":"u16","data":[1,258]}}"#).unwrap();
        match pointer.to_array_pointer() {
            ArrayPointer::Client(memory) => assert_eq!(memory.bytes(), &[1, 0, 2, 1]),
            other => panic!("unexpected pointer {other:?}"),
        }
        let pointer: Pointer = serde_json::from_str(r#"{"offset":16}"#).unwrap();
        assert_eq!(pointer.to_array_pointer(), ArrayPointer::Offset(16));
    }

    #[test]
    fn integer_params_keep_enumerant_values() {
        let param: Param = serde_json::from_str("9729").unwrap();
        assert_eq!(param, Param::Int(9729));
        let param: Param = serde_json::from_str("0.5").unwrap();
        assert_eq!(param, Param::Float(0.5));
    }

    #[test]
    fn unknown_calls_are_rejected() {
        assert!(serde_json::from_str::<TraceCall>(r#"{"call":"Accum","op":0}"#).is_err());
    }
}
