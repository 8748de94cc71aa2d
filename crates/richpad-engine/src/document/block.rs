use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a block within a document.
///
/// Keys survive mutations: a successor snapshot keeps the keys of every block
/// it carried over, so UI references stay valid across edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockKey(Uuid);

impl BlockKey {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlockKey {
    fn default() -> Self {
        Self::new()
    }
}

/// Inline style annotation applied to a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Mark {
    Bold,
    Italic,
}

/// A run of text carrying a set of marks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaf {
    pub text: String,
    pub marks: BTreeSet<Mark>,
}

impl Leaf {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: BTreeSet::new(),
        }
    }
}

/// Structural kind of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    Paragraph,
    BulletedList,
    NumberedList,
    ListItem,
    /// Void block: carries a source URI and never any children or leaves.
    Image {
        src: String,
    },
}

impl BlockKind {
    /// True for the two list container kinds.
    pub fn is_list_container(&self) -> bool {
        matches!(self, BlockKind::BulletedList | BlockKind::NumberedList)
    }

    /// Void blocks have no editable text children.
    pub fn is_void(&self) -> bool {
        matches!(self, BlockKind::Image { .. })
    }

    /// The other list family, for family-switch toggles.
    pub fn opposite_list(&self) -> Option<BlockKind> {
        match self {
            BlockKind::BulletedList => Some(BlockKind::NumberedList),
            BlockKind::NumberedList => Some(BlockKind::BulletedList),
            _ => None,
        }
    }
}

/// A structural unit of the document: paragraph, list container, list item
/// or image. Children are held by key; the arena lives on the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub key: BlockKey,
    pub kind: BlockKind,
    pub leaves: Vec<Leaf>,
    pub children: Vec<BlockKey>,
}

impl Block {
    pub fn new(kind: BlockKind) -> Self {
        Self {
            key: BlockKey::new(),
            kind,
            leaves: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        let mut block = Self::new(BlockKind::Paragraph);
        let text = text.into();
        if !text.is_empty() {
            block.leaves.push(Leaf::plain(text));
        }
        block
    }

    pub fn image(src: impl Into<String>) -> Self {
        Self::new(BlockKind::Image { src: src.into() })
    }

    /// Concatenated text of all leaves.
    pub fn text(&self) -> String {
        self.leaves.iter().map(|l| l.text.as_str()).collect()
    }

    /// Empty-text paragraphs do not count toward the block limit.
    pub fn is_empty_paragraph(&self) -> bool {
        self.kind == BlockKind::Paragraph && self.leaves.iter().all(|l| l.text.is_empty())
    }
}
