//! List/indent state machine.
//!
//! Indent and Outdent interpret the current selection against one snapshot
//! and either produce a mutated successor or decline. A decline returns
//! `None` and nothing else: the caller forwards the raw key event unhandled,
//! so an illegal transition never corrupts nesting state and never surfaces
//! an error.

use log::debug;

use crate::document::{BlockKind, Snapshot};

/// Maximum nesting depth an indent may push a block past. A product choice
/// carried over as-is, not derived from any structural invariant.
pub const MAX_NEST_DEPTH: usize = 3;

/// List family used when indenting outside any existing list.
pub const DEFAULT_LIST_KIND: BlockKind = BlockKind::BulletedList;

/// Nest the selected blocks one level deeper, wrapping them in a list.
///
/// Declines when the anchor has nothing to nest under, when any selected
/// block would pass the depth ceiling, or when an adjacent sibling is
/// already a list container (adjacent-list merge is unsupported).
pub fn indent(snapshot: &Snapshot) -> Option<Snapshot> {
    let selection = snapshot.selection().clone();
    let anchor = selection.anchor();

    let Some(prev) = snapshot.previous_sibling(anchor) else {
        debug!("indent declined: anchor has no previous sibling");
        return None;
    };
    if snapshot.depth(anchor) > MAX_NEST_DEPTH {
        debug!("indent declined: anchor past depth ceiling");
        return None;
    }
    if selection
        .blocks()
        .iter()
        .any(|k| snapshot.depth(*k) > MAX_NEST_DEPTH)
    {
        debug!("indent declined: selected block past depth ceiling");
        return None;
    }
    if is_list_container(snapshot, prev) {
        debug!("indent declined: previous sibling is a list container");
        return None;
    }
    if let Some(next) = snapshot.next_sibling(anchor)
        && is_list_container(snapshot, next)
    {
        debug!("indent declined: next sibling is a list container");
        return None;
    }

    // Inherit the surrounding list family; default to bulleted outside one.
    let list_kind = snapshot
        .parent(anchor)
        .and_then(|p| snapshot.block(p))
        .filter(|b| b.kind.is_list_container())
        .map(|b| b.kind.clone())
        .unwrap_or(DEFAULT_LIST_KIND);

    let keys = selection.blocks().to_vec();
    Some(
        snapshot
            .set_block_type(&keys, BlockKind::ListItem)
            .wrap_blocks(&keys, list_kind),
    )
}

/// Lift the selected blocks one nesting level.
///
/// Declines only when the selection spans blocks at differing depths. A
/// list item nested in a same-family list stays a list item one level up;
/// everything else converts back to a paragraph. Unwrapping a container
/// kind that is not present is a no-op, so both list kinds are always
/// unwrapped.
pub fn outdent(snapshot: &Snapshot) -> Option<Snapshot> {
    let selection = snapshot.selection().clone();
    let anchor = selection.anchor();
    let keys = selection.blocks().to_vec();

    let anchor_depth = snapshot.depth(anchor);
    if keys.iter().any(|k| snapshot.depth(*k) != anchor_depth) {
        debug!("outdent declined: selection spans mixed depths");
        return None;
    }

    let parent = snapshot.parent(anchor);
    let parent_kind = parent
        .and_then(|p| snapshot.block(p))
        .map(|b| b.kind.clone());
    let grandparent_kind = parent
        .and_then(|p| snapshot.parent(p))
        .and_then(|g| snapshot.block(g))
        .map(|b| b.kind.clone());
    let anchor_is_item =
        snapshot.block(anchor).map(|b| b.kind == BlockKind::ListItem) == Some(true);

    let retyped = match parent_kind {
        Some(pk) if pk.is_list_container() => {
            if anchor_is_item && grandparent_kind.as_ref() == Some(&pk) {
                // Moving up within a same-family list: stay a list item.
                snapshot.set_block_type(&keys, BlockKind::ListItem)
            } else {
                snapshot.set_block_type(&keys, BlockKind::Paragraph)
            }
        }
        _ => snapshot.set_block_type(&keys, BlockKind::Paragraph),
    };

    Some(
        retyped
            .unwrap_blocks(&keys, BlockKind::BulletedList)
            .unwrap_blocks(&keys, BlockKind::NumberedList),
    )
}

/// Toolbar block-type toggle. Unlike indent/outdent this never declines.
pub fn toggle_block(snapshot: &Snapshot, target: &BlockKind) -> Snapshot {
    let selection = snapshot.selection().clone();
    let keys = selection.blocks().to_vec();

    let has_kind = |kind: &BlockKind| {
        keys.iter()
            .filter_map(|k| snapshot.block(*k))
            .any(|b| b.kind == *kind)
    };

    if !target.is_list_container() {
        let is_active = has_kind(target);
        let new_kind = if is_active {
            BlockKind::Paragraph
        } else {
            target.clone()
        };
        let retyped = snapshot.set_block_type(&keys, new_kind);
        if has_kind(&BlockKind::ListItem) {
            retyped
                .unwrap_blocks(&keys, BlockKind::BulletedList)
                .unwrap_blocks(&keys, BlockKind::NumberedList)
        } else {
            retyped
        }
    } else {
        let is_list = has_kind(&BlockKind::ListItem);
        let is_type = keys.iter().any(|k| {
            snapshot
                .closest_ancestor_of_type(*k, |b| b.kind == *target)
                .is_some()
        });
        if is_list && is_type {
            // Toggling the list we are already in: back to paragraphs.
            snapshot
                .set_block_type(&keys, BlockKind::Paragraph)
                .unwrap_blocks(&keys, BlockKind::BulletedList)
                .unwrap_blocks(&keys, BlockKind::NumberedList)
        } else if is_list {
            // Same items, other family: switch containers in place.
            let opposite = target.opposite_list().unwrap_or(DEFAULT_LIST_KIND);
            snapshot
                .unwrap_blocks(&keys, opposite)
                .wrap_blocks(&keys, target.clone())
        } else {
            snapshot
                .set_block_type(&keys, BlockKind::ListItem)
                .wrap_blocks(&keys, target.clone())
        }
    }
}

fn is_list_container(snapshot: &Snapshot, key: crate::document::BlockKey) -> bool {
    snapshot.block(key).map(|b| b.kind.is_list_container()) == Some(true)
}
