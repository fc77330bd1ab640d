//! Device pipeline state mirrored from the legacy raster/depth/stencil/blend
//! toggles. Flushed to the device before every draw.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ShadeModel {
    Flat,
    #[default]
    Smooth,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthState {
    pub test_enabled: bool,
    pub write_enabled: bool,
    pub compare: wgpu::CompareFunction,
    /// `DepthRange` near/far, clamped to [0, 1].
    pub range: [f32; 2],
}

impl Default for DepthState {
    fn default() -> Self {
        Self {
            test_enabled: false,
            write_enabled: true,
            compare: wgpu::CompareFunction::Less,
            range: [0.0, 1.0],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StencilFace {
    pub ops: wgpu::StencilFaceState,
    pub reference: u32,
    pub read_mask: u32,
    pub write_mask: u32,
}

impl Default for StencilFace {
    fn default() -> Self {
        Self {
            ops: wgpu::StencilFaceState {
                compare: wgpu::CompareFunction::Always,
                fail_op: wgpu::StencilOperation::Keep,
                depth_fail_op: wgpu::StencilOperation::Keep,
                pass_op: wgpu::StencilOperation::Keep,
            },
            reference: 0,
            read_mask: u32::MAX,
            write_mask: u32::MAX,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StencilState {
    pub enabled: bool,
    pub front: StencilFace,
    pub back: StencilFace,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendState {
    pub enabled: bool,
    pub color: wgpu::BlendComponent,
    pub alpha: wgpu::BlendComponent,
    pub constant: [f32; 4],
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            enabled: false,
            color: wgpu::BlendComponent::REPLACE,
            alpha: wgpu::BlendComponent::REPLACE,
            constant: [0.0; 4],
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterState {
    pub cull_enabled: bool,
    pub cull_face: wgpu::Face,
    pub front_face: wgpu::FrontFace,
    pub polygon_offset_fill: bool,
    /// (factor, units).
    pub polygon_offset: [f32; 2],
}

impl Default for RasterState {
    fn default() -> Self {
        Self {
            cull_enabled: false,
            cull_face: wgpu::Face::Back,
            front_face: wgpu::FrontFace::Ccw,
            polygon_offset_fill: false,
            polygon_offset: [0.0, 0.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderState {
    pub raster: RasterState,
    pub depth: DepthState,
    pub stencil: StencilState,
    pub blend: BlendState,
    pub color_mask: wgpu::ColorWrites,
    pub viewport: Option<Rect>,
    pub scissor_enabled: bool,
    pub scissor: Option<Rect>,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            raster: RasterState::default(),
            depth: DepthState::default(),
            stencil: StencilState::default(),
            blend: BlendState::default(),
            color_mask: wgpu::ColorWrites::ALL,
            viewport: None,
            scissor_enabled: false,
            scissor: None,
        }
    }
}

impl RenderState {
    pub fn cull_mode(&self) -> Option<wgpu::Face> {
        self.raster.cull_enabled.then_some(self.raster.cull_face)
    }

    pub fn primitive_state(&self, topology: wgpu::PrimitiveTopology) -> wgpu::PrimitiveState {
        wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: self.raster.front_face,
            cull_mode: self.cull_mode(),
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        }
    }

    /// Depth/stencil pipeline state for an attachment of `format`.
    ///
    /// Disabled tests become `Always` comparisons with writes suppressed, the
    /// way the legacy API behaves when the test is off.
    pub fn depth_stencil_state(&self, format: wgpu::TextureFormat) -> wgpu::DepthStencilState {
        let (depth_compare, depth_write_enabled) = if self.depth.test_enabled {
            (self.depth.compare, self.depth.write_enabled)
        } else {
            (wgpu::CompareFunction::Always, false)
        };
        let stencil = if self.stencil.enabled {
            wgpu::StencilState {
                front: self.stencil.front.ops,
                back: self.stencil.back.ops,
                read_mask: self.stencil.front.read_mask,
                write_mask: self.stencil.front.write_mask,
            }
        } else {
            wgpu::StencilState::default()
        };
        let bias = if self.raster.polygon_offset_fill {
            wgpu::DepthBiasState {
                constant: self.raster.polygon_offset[1] as i32,
                slope_scale: self.raster.polygon_offset[0],
                clamp: 0.0,
            }
        } else {
            wgpu::DepthBiasState::default()
        };
        wgpu::DepthStencilState {
            format,
            depth_write_enabled,
            depth_compare,
            stencil,
            bias,
        }
    }

    pub fn blend_state(&self) -> Option<wgpu::BlendState> {
        self.blend.enabled.then_some(wgpu::BlendState {
            color: self.blend.color,
            alpha: self.blend.alpha,
        })
    }

    pub fn color_target_state(&self, format: wgpu::TextureFormat) -> wgpu::ColorTargetState {
        wgpu::ColorTargetState {
            format,
            blend: self.blend_state(),
            write_mask: self.color_mask,
        }
    }
}

pub fn color_writes(red: bool, green: bool, blue: bool, alpha: bool) -> wgpu::ColorWrites {
    let mut writes = wgpu::ColorWrites::empty();
    writes.set(wgpu::ColorWrites::RED, red);
    writes.set(wgpu::ColorWrites::GREEN, green);
    writes.set(wgpu::ColorWrites::BLUE, blue);
    writes.set(wgpu::ColorWrites::ALPHA, alpha);
    writes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_depth_test_never_writes() {
        let mut state = RenderState::default();
        let ds = state.depth_stencil_state(wgpu::TextureFormat::Depth24PlusStencil8);
        assert_eq!(ds.depth_compare, wgpu::CompareFunction::Always);
        assert!(!ds.depth_write_enabled);

        state.depth.test_enabled = true;
        state.depth.compare = wgpu::CompareFunction::LessEqual;
        let ds = state.depth_stencil_state(wgpu::TextureFormat::Depth24PlusStencil8);
        assert_eq!(ds.depth_compare, wgpu::CompareFunction::LessEqual);
        assert!(ds.depth_write_enabled);
    }

    #[test]
    fn cull_mode_requires_enable() {
        let mut state = RenderState::default();
        assert_eq!(state.cull_mode(), None);
        state.raster.cull_enabled = true;
        state.raster.cull_face = wgpu::Face::Front;
        let primitive = state.primitive_state(wgpu::PrimitiveTopology::TriangleList);
        assert_eq!(primitive.cull_mode, Some(wgpu::Face::Front));
        assert_eq!(primitive.front_face, wgpu::FrontFace::Ccw);
    }

    #[test]
    fn blend_state_is_absent_when_disabled() {
        let mut state = RenderState::default();
        assert!(state.blend_state().is_none());
        state.blend.enabled = true;
        state.blend.color = wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        };
        let blend = state.blend_state().unwrap();
        assert_eq!(blend.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(blend.alpha, wgpu::BlendComponent::REPLACE);
    }

    #[test]
    fn color_writes_build_mask() {
        let writes = color_writes(true, false, true, false);
        assert!(writes.contains(wgpu::ColorWrites::RED));
        assert!(!writes.contains(wgpu::ColorWrites::GREEN));
        assert!(writes.contains(wgpu::ColorWrites::BLUE));
        assert!(!writes.contains(wgpu::ColorWrites::ALPHA));
    }
}
