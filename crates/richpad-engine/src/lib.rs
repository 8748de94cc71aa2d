pub mod document;
pub mod editing;
pub mod media;
pub mod store;

#[cfg(test)]
pub(crate) mod tests;

// Re-export key types for easier usage
pub use document::{Block, BlockKey, BlockKind, Leaf, Mark, Selection, Snapshot};
pub use editing::{
    BlockLimit, Command, EditorState, Transition, count_significant_blocks, indent, outdent,
    save_allowed, toggle_block,
};
pub use media::{FileInput, ImageInsert, MediaReader};
pub use store::{
    CONTENT_KEY, ContentStore, FileStore, MemoryStore, StoreError, load_document, save_document,
};
