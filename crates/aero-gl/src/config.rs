use crate::error::{GlError, Result};

/// Static capability sizes for one replay context.
///
/// Every per-unit or per-slot table in the context is sized from these values
/// once at construction; indices outside them are capability errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextConfig {
    /// Size of the device stream-slot pool.
    pub stream_slots: u32,
    /// Size of the device sampler-slot pool.
    pub sampler_slots: u32,
    /// Server-side texture units (`glActiveTexture`).
    pub texture_units: u32,
    /// Client-side texture coordinate arrays (`glClientActiveTexture`).
    pub client_texcoord_units: u32,
    pub generic_attributes: u32,
    pub lights: u32,
    /// Vertex blend modelview matrices (`GL_MODELVIEWn_ARB`).
    pub modelview_matrices: u32,
    pub matrix_stack_depth: u32,
    pub attrib_stack_depth: u32,
    /// Local and environment registers per program target.
    pub program_parameters: u32,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            stream_slots: 31,
            sampler_slots: 16,
            texture_units: 16,
            client_texcoord_units: 8,
            generic_attributes: 16,
            lights: 8,
            modelview_matrices: 4,
            matrix_stack_depth: 32,
            attrib_stack_depth: 16,
            program_parameters: 256,
        }
    }
}

impl ContextConfig {
    pub fn validate(&self) -> Result<()> {
        if self.stream_slots == 0 || self.sampler_slots == 0 {
            return Err(GlError::Config("slot pools must not be empty"));
        }
        if self.texture_units == 0 || self.client_texcoord_units > self.texture_units {
            return Err(GlError::Config(
                "client texture coordinate units must not exceed texture units",
            ));
        }
        // Texcoord arrays feed attributes 8.. and must not collide with generic 16+.
        if self.client_texcoord_units > 8 || self.generic_attributes > 16 {
            return Err(GlError::Config("attribute index space is 16 wide"));
        }
        if self.lights == 0 || self.lights > crate::state::fixed_function::MAX_LIGHTS as u32 {
            return Err(GlError::Config("light count outside the supported range"));
        }
        if self.modelview_matrices == 0 || self.modelview_matrices > 32 {
            return Err(GlError::Config("modelview matrix count must be within 1..=32"));
        }
        if self.texture_units > crate::fixed_function::MAX_TEXTURE_STAGES as u32 {
            return Err(GlError::Config("texture unit count exceeds synthesizer stages"));
        }
        if self.matrix_stack_depth == 0 || self.attrib_stack_depth == 0 {
            return Err(GlError::Config("stack depths must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        ContextConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_empty_pools() {
        let config = ContextConfig {
            sampler_slots: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(GlError::Config(_))));
    }

    #[test]
    fn rejects_texcoord_units_beyond_texture_units() {
        let config = ContextConfig {
            texture_units: 4,
            client_texcoord_units: 8,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
