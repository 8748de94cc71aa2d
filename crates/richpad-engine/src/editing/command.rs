use crate::document::{BlockKey, BlockKind, Mark, Selection};
use crate::editing::BlockLimit;

/// One editor command, carrying only the data it needs. Dispatch is an
/// exhaustive match in [`EditorState::apply`](crate::editing::EditorState).
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Nest the selection one level deeper (Tab).
    Indent,
    /// Lift the selection one nesting level (Shift+Tab).
    Outdent,
    /// Toolbar block-type toggle.
    ToggleBlock(BlockKind),
    /// Inline mark toggle (Ctrl+B / Ctrl+I).
    ToggleMark(Mark),
    /// Insert a void image block, optionally at a remembered target.
    InsertImage {
        src: String,
        target: Option<BlockKey>,
    },
    /// Default text insertion at the anchor.
    InsertText(String),
    /// Move the selection.
    Select(Selection),
    /// Reconfigure the block-count gate.
    SetBlockLimit(BlockLimit),
    /// Persist the current snapshot; declined while the gate is closed.
    Save,
    /// Discard uncommitted edits, reverting to the saved baseline.
    Cancel,
}
