use std::fmt;

/// Legacy primitive kinds accepted by `Begin` and the array draw calls.
///
/// This is a semantic enum; raw enumerators are mapped by
/// [`crate::state::translate::primitive`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GlPrimitive {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
    Quads,
    QuadStrip,
    Polygon,
}

impl fmt::Display for GlPrimitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GlPrimitive::Points => "points",
            GlPrimitive::Lines => "lines",
            GlPrimitive::LineLoop => "line_loop",
            GlPrimitive::LineStrip => "line_strip",
            GlPrimitive::Triangles => "triangles",
            GlPrimitive::TriangleStrip => "triangle_strip",
            GlPrimitive::TriangleFan => "triangle_fan",
            GlPrimitive::Quads => "quads",
            GlPrimitive::QuadStrip => "quad_strip",
            GlPrimitive::Polygon => "polygon",
        };
        f.write_str(s)
    }
}

/// CPU index rewrite required because the device has no native equivalent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TopologyEmulation {
    /// Fans and convex polygons: triangle(i) = (0, i, i+1).
    TriangleFan,
    /// Quad(i) = (4i, 4i+1, 4i+2, 4i+3) split into two triangles.
    Quads,
    /// Quad(i) = (2i, 2i+1, 2i+3, 2i+2) split into two triangles.
    QuadStrip,
    /// Line strip closed by repeating the first vertex.
    LineLoop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrimitiveTopologyTranslation {
    pub topology: wgpu::PrimitiveTopology,
    pub emulation: Option<TopologyEmulation>,
}

pub fn translate_primitive_topology(primitive: GlPrimitive) -> PrimitiveTopologyTranslation {
    let (topology, emulation) = match primitive {
        GlPrimitive::Points => (wgpu::PrimitiveTopology::PointList, None),
        GlPrimitive::Lines => (wgpu::PrimitiveTopology::LineList, None),
        GlPrimitive::LineStrip => (wgpu::PrimitiveTopology::LineStrip, None),
        GlPrimitive::LineLoop => (
            wgpu::PrimitiveTopology::LineStrip,
            Some(TopologyEmulation::LineLoop),
        ),
        GlPrimitive::Triangles => (wgpu::PrimitiveTopology::TriangleList, None),
        GlPrimitive::TriangleStrip => (wgpu::PrimitiveTopology::TriangleStrip, None),
        GlPrimitive::TriangleFan | GlPrimitive::Polygon => (
            wgpu::PrimitiveTopology::TriangleList,
            Some(TopologyEmulation::TriangleFan),
        ),
        GlPrimitive::Quads => (
            wgpu::PrimitiveTopology::TriangleList,
            Some(TopologyEmulation::Quads),
        ),
        GlPrimitive::QuadStrip => (
            wgpu::PrimitiveTopology::TriangleList,
            Some(TopologyEmulation::QuadStrip),
        ),
    };
    PrimitiveTopologyTranslation {
        topology,
        emulation,
    }
}

/// Rewrites an index list for an emulated primitive. Incomplete trailing
/// primitives are dropped.
pub fn expand_indices(emulation: TopologyEmulation, indices: &[u32]) -> Vec<u32> {
    match emulation {
        TopologyEmulation::TriangleFan => expand_triangle_fan(indices),
        TopologyEmulation::Quads => expand_quads(indices),
        TopologyEmulation::QuadStrip => expand_quad_strip(indices),
        TopologyEmulation::LineLoop => expand_line_loop(indices),
    }
}

/// Index list for a non-indexed draw of `vertex_count` vertices.
pub fn expand_nonindexed(emulation: TopologyEmulation, vertex_count: u32) -> Vec<u32> {
    let sequential: Vec<u32> = (0..vertex_count).collect();
    expand_indices(emulation, &sequential)
}

fn expand_triangle_fan(indices: &[u32]) -> Vec<u32> {
    if indices.len() < 3 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity((indices.len() - 2) * 3);
    for i in 1..(indices.len() - 1) {
        out.push(indices[0]);
        out.push(indices[i]);
        out.push(indices[i + 1]);
    }
    out
}

fn expand_quads(indices: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(indices.len() / 4 * 6);
    for quad in indices.chunks_exact(4) {
        out.extend_from_slice(&[quad[0], quad[1], quad[2], quad[0], quad[2], quad[3]]);
    }
    out
}

fn expand_quad_strip(indices: &[u32]) -> Vec<u32> {
    if indices.len() < 4 {
        return Vec::new();
    }
    let quads = (indices.len() - 2) / 2;
    let mut out = Vec::with_capacity(quads * 6);
    for q in 0..quads {
        let v0 = indices[2 * q];
        let v1 = indices[2 * q + 1];
        let v2 = indices[2 * q + 2];
        let v3 = indices[2 * q + 3];
        // Same winding as the equivalent triangle strip.
        out.extend_from_slice(&[v0, v1, v2, v2, v1, v3]);
    }
    out
}

fn expand_line_loop(indices: &[u32]) -> Vec<u32> {
    if indices.len() < 2 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(indices.len() + 1);
    out.extend_from_slice(indices);
    out.push(indices[0]);
    out
}
