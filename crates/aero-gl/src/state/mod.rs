//! Legacy state: translation, matrices, the fixed-function store and the
//! device pipeline state derived from it.

pub mod attrib;
pub mod fixed_function;
pub mod matrix;
pub mod render;
pub mod topology;
pub mod translate;

pub use matrix::{Mat4, MatrixStack, MatrixStackGroup};
pub use render::RenderState;
pub use topology::{translate_primitive_topology, GlPrimitive, PrimitiveTopologyTranslation};
pub use translate::MatrixMode;
