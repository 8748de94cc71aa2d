//! Document model: an immutable, versioned tree of blocks with marked text
//! leaves.
//!
//! The editing layer never mutates a document in place. It reads structural
//! queries (`parent`, siblings, `depth`, `closest_ancestor_of_type`) against
//! one [`Snapshot`] and requests structural mutations (`set_block_type`,
//! `wrap_blocks`, `unwrap_blocks`, `insert_block`, `select`) that each return
//! a new, fully-normalized snapshot. Blocks are identified by stable
//! [`BlockKey`]s that survive mutations, so references held by a UI stay
//! valid from one version to the next.

pub mod block;
pub mod snapshot;

pub use block::{Block, BlockKey, BlockKind, Leaf, Mark};
pub use snapshot::{Selection, Snapshot};
