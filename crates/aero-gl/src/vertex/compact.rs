//! Used-index compaction for indexed draws over client memory.

use std::collections::BTreeSet;

use hashbrown::HashMap;

/// Dense re-encoding of an index list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompactedIndices {
    /// Distinct original indices in ascending order; position `n` holds the
    /// original vertex now stored at dense index `n`.
    pub used: Vec<u32>,
    /// The input index list rewritten into the dense space.
    pub remapped: Vec<u32>,
}

impl CompactedIndices {
    pub fn vertex_count(&self) -> u32 {
        self.used.len() as u32
    }
}

pub fn compact_indices(indices: &[u32]) -> CompactedIndices {
    let used: Vec<u32> = indices
        .iter()
        .copied()
        .collect::<BTreeSet<u32>>()
        .into_iter()
        .collect();
    let dense: HashMap<u32, u32> = used
        .iter()
        .enumerate()
        .map(|(new, &old)| (old, new as u32))
        .collect();
    let remapped = indices.iter().map(|old| dense[old]).collect();
    CompactedIndices { used, remapped }
}
