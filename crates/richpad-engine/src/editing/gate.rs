//! Block-count gate.
//!
//! Saving is allowed only while the number of significant top-level blocks
//! stays within the configured limit. The signal is recomputed synchronously
//! with every document change and every limit change; there is no debounce.

use serde::{Deserialize, Serialize};

use crate::document::Snapshot;

/// Configured ceiling on significant block count. Unbounded by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlockLimit {
    #[default]
    Unbounded,
    AtMost(usize),
}

impl BlockLimit {
    pub fn allows(&self, count: usize) -> bool {
        match self {
            BlockLimit::Unbounded => true,
            BlockLimit::AtMost(max) => count <= *max,
        }
    }
}

impl std::fmt::Display for BlockLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockLimit::Unbounded => write!(f, "unbounded"),
            BlockLimit::AtMost(max) => write!(f, "{max}"),
        }
    }
}

/// Top-level blocks that count toward the limit: everything except
/// empty-text paragraphs.
pub fn count_significant_blocks(snapshot: &Snapshot) -> usize {
    snapshot.roots().filter(|b| !b.is_empty_paragraph()).count()
}

/// The gate contract: `save_allowed == (count <= limit)`.
pub fn save_allowed(snapshot: &Snapshot, limit: BlockLimit) -> bool {
    limit.allows(count_significant_blocks(snapshot))
}
