//! Attribute-group push/pop.

use bitflags::bitflags;

use crate::error::{GlError, Result};
use crate::gl;

bitflags! {
    /// Attribute groups that can be saved. Bit values match the legacy
    /// `*_BIT` tokens.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct AttribMask: u32 {
        const CURRENT = gl::CURRENT_BIT;
        const POLYGON = gl::POLYGON_BIT;
        const LIGHTING = gl::LIGHTING_BIT;
        const FOG = gl::FOG_BIT;
        const DEPTH_BUFFER = gl::DEPTH_BUFFER_BIT;
        const STENCIL_BUFFER = gl::STENCIL_BUFFER_BIT;
        const VIEWPORT = gl::VIEWPORT_BIT;
        const TRANSFORM = gl::TRANSFORM_BIT;
        const ENABLE = gl::ENABLE_BIT;
        const COLOR_BUFFER = gl::COLOR_BUFFER_BIT;
        const TEXTURE = gl::TEXTURE_BIT;
        const SCISSOR = gl::SCISSOR_BIT;
    }
}

impl AttribMask {
    /// `ALL_ATTRIB_BITS` selects every supported group; any other bit outside
    /// the supported set is rejected.
    pub fn from_gl(call: &'static str, bits: u32) -> Result<Self> {
        if bits == gl::ALL_ATTRIB_BITS {
            return Ok(AttribMask::all());
        }
        let unsupported = bits & !AttribMask::all().bits();
        if unsupported != 0 {
            return Err(GlError::unsupported(call, "attribute group", unsupported));
        }
        Ok(AttribMask::from_bits_truncate(bits))
    }
}

/// Bounded stack of saved attribute snapshots.
#[derive(Clone, Debug)]
pub struct AttribStack<T> {
    entries: Vec<(AttribMask, T)>,
    max_depth: usize,
}

impl<T> AttribStack<T> {
    pub fn new(max_depth: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_depth,
        }
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn push(&mut self, call: &'static str, mask: AttribMask, saved: T) -> Result<()> {
        if self.entries.len() >= self.max_depth {
            return Err(GlError::AttribStackOverflow {
                call,
                depth: self.max_depth,
            });
        }
        self.entries.push((mask, saved));
        Ok(())
    }

    pub fn pop(&mut self, call: &'static str) -> Result<(AttribMask, T)> {
        self.entries.pop().ok_or(GlError::AttribStackUnderflow { call })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_attrib_bits_selects_every_group() {
        assert_eq!(
            AttribMask::from_gl("glPushAttrib", gl::ALL_ATTRIB_BITS).unwrap(),
            AttribMask::all()
        );
        assert_eq!(
            AttribMask::from_gl("glPushAttrib", gl::FOG_BIT | gl::ENABLE_BIT).unwrap(),
            AttribMask::FOG | AttribMask::ENABLE
        );
    }

    #[test]
    fn unsupported_groups_are_rejected() {
        let err = AttribMask::from_gl("glPushAttrib", gl::FOG_BIT | gl::ACCUM_BUFFER_BIT).unwrap_err();
        assert!(matches!(
            err,
            GlError::UnsupportedEnum { value, .. } if value == gl::ACCUM_BUFFER_BIT
        ));
    }

    #[test]
    fn stack_is_bounded() {
        let mut stack = AttribStack::new(1);
        stack.push("glPushAttrib", AttribMask::FOG, 1u8).unwrap();
        assert!(matches!(
            stack.push("glPushAttrib", AttribMask::FOG, 2),
            Err(GlError::AttribStackOverflow { depth: 1, .. })
        ));
        assert_eq!(stack.pop("glPopAttrib").unwrap(), (AttribMask::FOG, 1));
        assert!(matches!(
            stack.pop("glPopAttrib"),
            Err(GlError::AttribStackUnderflow { .. })
        ));
    }
}
