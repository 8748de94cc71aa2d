//! Shared fixtures for engine tests.

use crate::document::{Block, Selection, Snapshot};
use crate::editing::indent;

/// Select a single top-level block by index.
pub fn select_root(snapshot: &Snapshot, index: usize) -> Snapshot {
    let key = snapshot.root_keys()[index];
    snapshot.select(Selection::single(key))
}

/// Build a document whose selection anchor is a list item at the given
/// nesting depth, constructed through the public editing API: indent the
/// seed block, then repeatedly insert a sibling and indent it.
pub fn doc_with_item_at_depth(target_depth: usize) -> Snapshot {
    let mut snapshot = select_root(&Snapshot::from_paragraphs(&["intro", "seed"]), 1);
    for level in 0..target_depth {
        if level > 0 {
            snapshot = snapshot.insert_block(Block::paragraph("next"), None);
        }
        snapshot = indent(&snapshot).expect("fixture indent should apply");
    }
    snapshot
}
