//! Bounded pools of hardware-visible binding slots.

use std::collections::BTreeSet;
use std::fmt;

use tracing::trace;

use crate::error::{GlError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Stream,
    Sampler,
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SlotKind::Stream => "stream",
            SlotKind::Sampler => "sampler",
        };
        f.write_str(name)
    }
}

/// A fixed range of ids `0..capacity` handed out lowest-free-first.
///
/// `free_count() + leased_count() == capacity()` holds after every operation
/// and no id is ever leased twice.
#[derive(Debug, Clone)]
pub struct SlotPool {
    kind: SlotKind,
    capacity: u32,
    free: BTreeSet<u32>,
}

impl SlotPool {
    pub fn new(kind: SlotKind, capacity: u32) -> Self {
        Self {
            kind,
            capacity,
            free: (0..capacity).collect(),
        }
    }

    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn leased_count(&self) -> usize {
        self.capacity as usize - self.free.len()
    }

    pub fn lease(&mut self) -> Result<u32> {
        let id = self.free.pop_first().ok_or(GlError::SlotPoolExhausted {
            pool: self.kind,
            capacity: self.capacity,
            requested: 1,
        })?;
        trace!(pool = %self.kind, id, "slot leased");
        Ok(id)
    }

    /// Fails without side effects when fewer than `count` ids are free.
    pub fn ensure_available(&self, count: usize) -> Result<()> {
        if count > self.free.len() {
            return Err(GlError::SlotPoolExhausted {
                pool: self.kind,
                capacity: self.capacity,
                requested: count,
            });
        }
        Ok(())
    }

    pub fn release(&mut self, id: u32) -> Result<()> {
        if id >= self.capacity {
            return Err(GlError::SlotOutOfRange {
                pool: self.kind,
                id,
                capacity: self.capacity,
            });
        }
        if !self.free.insert(id) {
            return Err(GlError::SlotNotLeased {
                pool: self.kind,
                id,
            });
        }
        trace!(pool = %self.kind, id, "slot released");
        Ok(())
    }
}

/// The two disjoint pools owned by one draw orchestrator.
#[derive(Debug, Clone)]
pub struct SlotPools {
    pub streams: SlotPool,
    pub samplers: SlotPool,
}

impl SlotPools {
    pub fn new(stream_slots: u32, sampler_slots: u32) -> Self {
        Self {
            streams: SlotPool::new(SlotKind::Stream, stream_slots),
            samplers: SlotPool::new(SlotKind::Sampler, sampler_slots),
        }
    }

    pub fn all_free(&self) -> bool {
        self.streams.leased_count() == 0 && self.samplers.leased_count() == 0
    }
}
