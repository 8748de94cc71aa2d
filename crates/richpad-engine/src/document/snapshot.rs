use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::document::{Block, BlockKey, BlockKind, Leaf};

/// The set of currently selected blocks. The anchor is the block that
/// keyboard commands are interpreted against; it is always a member of
/// `blocks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    anchor: BlockKey,
    blocks: Vec<BlockKey>,
}

impl Selection {
    pub fn single(key: BlockKey) -> Self {
        Self {
            anchor: key,
            blocks: vec![key],
        }
    }

    pub fn new(anchor: BlockKey, blocks: Vec<BlockKey>) -> Self {
        let mut deduped = Vec::with_capacity(blocks.len());
        for key in blocks {
            if !deduped.contains(&key) {
                deduped.push(key);
            }
        }
        if !deduped.contains(&anchor) {
            deduped.insert(0, anchor);
        }
        Self {
            anchor,
            blocks: deduped,
        }
    }

    pub fn anchor(&self) -> BlockKey {
        self.anchor
    }

    pub fn blocks(&self) -> &[BlockKey] {
        &self.blocks
    }

    pub fn contains(&self, key: BlockKey) -> bool {
        self.blocks.contains(&key)
    }
}

/// A fully-normalized, immutable version of the document tree.
///
/// Blocks live in an arena keyed by stable `BlockKey`s; top-level order is
/// held in `roots`. The snapshot is never mutated in place: every structural
/// mutation clones, re-normalizes, bumps the version and returns the new
/// value. Callers holding an old snapshot keep a consistent view.
///
/// Normalization invariants:
/// - the last top-level block is always a plain paragraph,
/// - void blocks (images) carry no children and no leaves,
/// - empty list containers do not exist,
/// - the selection only references blocks that exist, and is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    blocks: HashMap<BlockKey, Block>,
    roots: Vec<BlockKey>,
    selection: Selection,
    version: u64,
}

impl Snapshot {
    /// An empty document, normalized to a single empty paragraph.
    pub fn new() -> Self {
        Self::from_paragraphs(&[])
    }

    /// Build a document of top-level paragraphs. The last one is selected.
    pub fn from_paragraphs(texts: &[&str]) -> Self {
        let mut blocks = HashMap::new();
        let mut roots = Vec::new();
        for text in texts {
            let para = Block::paragraph(*text);
            roots.push(para.key);
            blocks.insert(para.key, para);
        }
        // Placeholder selection, fixed up by normalize below.
        let placeholder = BlockKey::new();
        let mut snapshot = Self {
            blocks,
            roots,
            selection: Selection::single(placeholder),
            version: 0,
        };
        snapshot.normalize();
        if let Some(&last) = snapshot.roots.last() {
            snapshot.selection = Selection::single(last);
        }
        snapshot
    }

    /// The bundled fallback document used when no persisted content exists.
    pub fn default_document() -> Self {
        Self::from_paragraphs(&["A line of text in a paragraph."])
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn block(&self, key: BlockKey) -> Option<&Block> {
        self.blocks.get(&key)
    }

    pub fn contains(&self, key: BlockKey) -> bool {
        self.blocks.contains_key(&key)
    }

    pub fn root_keys(&self) -> &[BlockKey] {
        &self.roots
    }

    pub fn roots(&self) -> impl Iterator<Item = &Block> {
        self.roots.iter().filter_map(|k| self.blocks.get(k))
    }

    // ---- structural queries ----

    pub fn parent(&self, key: BlockKey) -> Option<BlockKey> {
        self.blocks
            .values()
            .find(|b| b.children.contains(&key))
            .map(|b| b.key)
    }

    /// Sibling list the block lives in: a parent's children or the roots.
    fn sibling_list(&self, key: BlockKey) -> Option<&[BlockKey]> {
        match self.parent(key) {
            Some(p) => self.blocks.get(&p).map(|b| b.children.as_slice()),
            None if self.roots.contains(&key) => Some(&self.roots),
            None => None,
        }
    }

    pub fn previous_sibling(&self, key: BlockKey) -> Option<BlockKey> {
        let list = self.sibling_list(key)?;
        let pos = list.iter().position(|k| *k == key)?;
        pos.checked_sub(1).map(|i| list[i])
    }

    pub fn next_sibling(&self, key: BlockKey) -> Option<BlockKey> {
        let list = self.sibling_list(key)?;
        let pos = list.iter().position(|k| *k == key)?;
        list.get(pos + 1).copied()
    }

    /// Distance from the top level; root blocks have depth 0.
    pub fn depth(&self, key: BlockKey) -> usize {
        let mut depth = 0;
        let mut cur = key;
        while let Some(p) = self.parent(cur) {
            depth += 1;
            cur = p;
        }
        depth
    }

    /// Walk from the block itself up through its ancestors and return the
    /// first one matching the predicate.
    pub fn closest_ancestor_of_type(
        &self,
        key: BlockKey,
        pred: impl Fn(&Block) -> bool,
    ) -> Option<BlockKey> {
        let mut cur = Some(key);
        while let Some(k) = cur {
            if let Some(block) = self.blocks.get(&k)
                && pred(block)
            {
                return Some(k);
            }
            cur = self.parent(k);
        }
        None
    }

    /// Depth-first walk in document order, yielding each block with its depth.
    pub fn traverse(&self) -> Vec<(usize, &Block)> {
        fn walk<'a>(
            snapshot: &'a Snapshot,
            key: BlockKey,
            depth: usize,
            out: &mut Vec<(usize, &'a Block)>,
        ) {
            if let Some(block) = snapshot.blocks.get(&key) {
                out.push((depth, block));
                for &child in &block.children {
                    walk(snapshot, child, depth + 1, out);
                }
            }
        }
        let mut out = Vec::new();
        for &root in &self.roots {
            walk(self, root, 0, &mut out);
        }
        out
    }

    // ---- structural mutations, each returning a new snapshot ----

    fn finish(mut self) -> Snapshot {
        self.normalize();
        self.version += 1;
        self
    }

    /// Retype the given blocks. Retyping to a void kind strips children and
    /// leaves (void invariant).
    pub fn set_block_type(&self, keys: &[BlockKey], kind: BlockKind) -> Snapshot {
        let mut next = self.clone();
        for key in keys {
            if let Some(block) = next.blocks.get_mut(key) {
                block.kind = kind.clone();
            }
        }
        next.finish()
    }

    /// Replace the selected run of siblings with one new container block
    /// holding them. Keys outside the anchor's sibling list are ignored.
    pub fn wrap_blocks(&self, keys: &[BlockKey], container: BlockKind) -> Snapshot {
        let mut next = self.clone();
        let Some(&first) = keys.iter().find(|k| next.contains(**k)) else {
            return next.finish();
        };
        let parent = next.parent(first);
        let list: Vec<BlockKey> = match parent {
            Some(p) => match next.blocks.get(&p) {
                Some(b) => b.children.clone(),
                None => return next.finish(),
            },
            None => next.roots.clone(),
        };
        let wrapped: Vec<BlockKey> = list.iter().copied().filter(|k| keys.contains(k)).collect();
        if wrapped.is_empty() {
            return next.finish();
        }

        let mut container_block = Block::new(container);
        container_block.children = wrapped.clone();
        let container_key = container_block.key;

        // Rebuild the sibling list with the container standing where the
        // first wrapped block was.
        let mut new_list = Vec::with_capacity(list.len() - wrapped.len() + 1);
        for key in &list {
            if *key == wrapped[0] {
                new_list.push(container_key);
            }
            if !wrapped.contains(key) {
                new_list.push(*key);
            }
        }

        match parent {
            Some(p) => {
                if let Some(b) = next.blocks.get_mut(&p) {
                    b.children = new_list;
                }
            }
            None => next.roots = new_list,
        }
        next.blocks.insert(container_key, container_block);
        next.finish()
    }

    /// For each selected block with an ancestor container of the given kind,
    /// splice that container's children into its parent and delete it.
    /// Unwrapping a kind that is not present is a no-op.
    pub fn unwrap_blocks(&self, keys: &[BlockKey], container: BlockKind) -> Snapshot {
        let mut next = self.clone();
        let mut containers: Vec<BlockKey> = Vec::new();
        for &key in keys {
            let mut cur = next.parent(key);
            while let Some(k) = cur {
                if next.blocks.get(&k).map(|b| b.kind == container) == Some(true) {
                    if !containers.contains(&k) {
                        containers.push(k);
                    }
                    break;
                }
                cur = next.parent(k);
            }
        }

        for container_key in containers {
            let Some(children) = next.blocks.get(&container_key).map(|b| b.children.clone())
            else {
                continue;
            };
            match next.parent(container_key) {
                Some(p) => {
                    if let Some(b) = next.blocks.get_mut(&p) {
                        splice(&mut b.children, container_key, &children);
                    }
                }
                None => splice(&mut next.roots, container_key, &children),
            }
            next.blocks.remove(&container_key);
        }
        next.finish()
    }

    /// Insert a block after the selection anchor. If a target is supplied
    /// and still resolves, selection moves there first; a stale target
    /// degrades to the current selection. The inserted block is selected.
    pub fn insert_block(&self, block: Block, target: Option<BlockKey>) -> Snapshot {
        let mut next = self.clone();
        if let Some(t) = target
            && next.contains(t)
        {
            next.selection = Selection::single(t);
        }
        let anchor = next.selection.anchor();
        let key = block.key;
        next.blocks.insert(key, block);

        match next.parent(anchor) {
            Some(p) => {
                let pos = next
                    .blocks
                    .get(&p)
                    .and_then(|b| b.children.iter().position(|k| *k == anchor));
                if let (Some(b), Some(pos)) = (next.blocks.get_mut(&p), pos) {
                    b.children.insert(pos + 1, key);
                }
            }
            None => match next.roots.iter().position(|k| *k == anchor) {
                Some(pos) => next.roots.insert(pos + 1, key),
                None => next.roots.push(key),
            },
        }
        next.selection = Selection::single(key);
        next.finish()
    }

    /// Default text insertion: append to the anchor block's trailing leaf.
    /// Void blocks and list containers take no text.
    pub fn insert_text(&self, text: &str) -> Snapshot {
        let mut next = self.clone();
        let anchor = next.selection.anchor();
        if let Some(block) = next.blocks.get_mut(&anchor)
            && !block.kind.is_void()
            && !block.kind.is_list_container()
        {
            match block.leaves.last_mut() {
                Some(leaf) => leaf.text.push_str(text),
                None => block.leaves.push(Leaf::plain(text)),
            }
        }
        next.finish()
    }

    /// Toggle a mark over every leaf of the given blocks: removed when all
    /// leaves already carry it, added everywhere otherwise.
    pub fn toggle_mark(&self, keys: &[BlockKey], mark: crate::document::Mark) -> Snapshot {
        let mut next = self.clone();
        let mut any_leaf = false;
        let mut all_marked = true;
        for key in keys {
            if let Some(block) = next.blocks.get(key) {
                for leaf in &block.leaves {
                    any_leaf = true;
                    if !leaf.marks.contains(&mark) {
                        all_marked = false;
                    }
                }
            }
        }
        let remove = any_leaf && all_marked;
        for key in keys {
            if let Some(block) = next.blocks.get_mut(key) {
                for leaf in &mut block.leaves {
                    if remove {
                        leaf.marks.remove(&mark);
                    } else {
                        leaf.marks.insert(mark);
                    }
                }
            }
        }
        next.finish()
    }

    /// Replace the selection. Keys are re-validated during normalization.
    pub fn select(&self, selection: Selection) -> Snapshot {
        let mut next = self.clone();
        next.selection = selection;
        next.finish()
    }

    // ---- normalization ----

    fn normalize(&mut self) {
        // Drop dangling child keys.
        let valid: HashSet<BlockKey> = self.blocks.keys().copied().collect();
        for block in self.blocks.values_mut() {
            block.children.retain(|k| valid.contains(k));
        }
        self.roots.retain(|k| valid.contains(k));

        // Void blocks carry no children and no leaves; orphaned subtrees
        // fall out in the reachability pass below.
        for block in self.blocks.values_mut() {
            if block.kind.is_void() {
                block.children.clear();
                block.leaves.clear();
            }
        }

        // Remove empty list containers, repeating since a removal may empty
        // the container above it.
        loop {
            let empty: Vec<BlockKey> = self
                .blocks
                .values()
                .filter(|b| b.kind.is_list_container() && b.children.is_empty())
                .map(|b| b.key)
                .collect();
            if empty.is_empty() {
                break;
            }
            for key in empty {
                self.blocks.remove(&key);
                for block in self.blocks.values_mut() {
                    block.children.retain(|k| *k != key);
                }
                self.roots.retain(|k| *k != key);
            }
        }

        // The last top-level block is always a plain paragraph.
        let last_is_paragraph = self
            .roots
            .last()
            .and_then(|k| self.blocks.get(k))
            .map(|b| b.kind == BlockKind::Paragraph)
            .unwrap_or(false);
        if !last_is_paragraph {
            let para = Block::paragraph("");
            self.roots.push(para.key);
            self.blocks.insert(para.key, para);
        }

        // Garbage-collect blocks no longer reachable from the roots.
        let mut reachable = HashSet::new();
        let mut stack: Vec<BlockKey> = self.roots.clone();
        while let Some(key) = stack.pop() {
            if reachable.insert(key)
                && let Some(block) = self.blocks.get(&key)
            {
                stack.extend(block.children.iter().copied());
            }
        }
        self.blocks.retain(|k, _| reachable.contains(k));

        // The selection only references live blocks and is never empty.
        let live: Vec<BlockKey> = self
            .selection
            .blocks()
            .iter()
            .copied()
            .filter(|k| self.blocks.contains_key(k))
            .collect();
        if live.is_empty() {
            if let Some(&last) = self.roots.last() {
                self.selection = Selection::single(last);
            }
        } else {
            let anchor = if live.contains(&self.selection.anchor()) {
                self.selection.anchor()
            } else {
                live[0]
            };
            self.selection = Selection::new(anchor, live);
        }
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}

fn splice(list: &mut Vec<BlockKey>, at: BlockKey, replacement: &[BlockKey]) {
    if let Some(pos) = list.iter().position(|k| *k == at) {
        list.splice(pos..pos + 1, replacement.iter().copied());
    }
}
