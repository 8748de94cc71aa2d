use log::debug;

use crate::document::Snapshot;
use crate::editing::{BlockLimit, Command, gate, indent, outdent, toggle_block};
use crate::media::ImageInsert;
use crate::store::{ContentStore, StoreError, load_document, save_document};

/// Outcome of applying a command.
///
/// `Declined` means the transition was illegal or gated: nothing changed and
/// the caller should forward the raw input event unhandled. Declines are
/// never errors and never leave a partial mutation behind.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Applied(EditorState),
    Declined,
}

/// The whole editor state as an explicit value: current snapshot, gate
/// configuration, the derived save signal and the saved baseline. All
/// transitions are pure functions returning a new state; the only side
/// effect is `Save` writing through the content store.
///
/// Invariant, re-established on every transition:
/// `save_enabled == (count_significant_blocks(current) <= block_limit)`.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    current: Snapshot,
    block_limit: BlockLimit,
    save_enabled: bool,
    last_saved: Snapshot,
}

impl EditorState {
    pub fn new(snapshot: Snapshot, block_limit: BlockLimit) -> Self {
        let save_enabled = gate::save_allowed(&snapshot, block_limit);
        Self {
            last_saved: snapshot.clone(),
            current: snapshot,
            block_limit,
            save_enabled,
        }
    }

    /// Load the persisted document (or the bundled default) as both the
    /// live snapshot and the cancel baseline.
    pub fn load(store: &dyn ContentStore) -> Result<Self, StoreError> {
        Ok(Self::new(load_document(store)?, BlockLimit::default()))
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.current
    }

    pub fn block_limit(&self) -> BlockLimit {
        self.block_limit
    }

    pub fn save_enabled(&self) -> bool {
        self.save_enabled
    }

    pub fn last_saved(&self) -> &Snapshot {
        &self.last_saved
    }

    fn with_snapshot(&self, snapshot: Snapshot) -> EditorState {
        let save_enabled = gate::save_allowed(&snapshot, self.block_limit);
        EditorState {
            current: snapshot,
            block_limit: self.block_limit,
            save_enabled,
            last_saved: self.last_saved.clone(),
        }
    }

    /// Apply one command. Errors can only come from the store on `Save`;
    /// every other failure mode is a silent `Declined`.
    pub fn apply(
        &self,
        command: Command,
        store: &dyn ContentStore,
    ) -> Result<Transition, StoreError> {
        let transition = match command {
            Command::Indent => match indent(&self.current) {
                Some(snapshot) => Transition::Applied(self.with_snapshot(snapshot)),
                None => Transition::Declined,
            },
            Command::Outdent => match outdent(&self.current) {
                Some(snapshot) => Transition::Applied(self.with_snapshot(snapshot)),
                None => Transition::Declined,
            },
            Command::ToggleBlock(kind) => {
                Transition::Applied(self.with_snapshot(toggle_block(&self.current, &kind)))
            }
            Command::ToggleMark(mark) => {
                let keys = self.current.selection().blocks().to_vec();
                Transition::Applied(self.with_snapshot(self.current.toggle_mark(&keys, mark)))
            }
            Command::InsertImage { src, target } => {
                let insert = ImageInsert { src, target };
                Transition::Applied(self.with_snapshot(insert.apply(&self.current)))
            }
            Command::InsertText(text) => {
                Transition::Applied(self.with_snapshot(self.current.insert_text(&text)))
            }
            Command::Select(selection) => {
                Transition::Applied(self.with_snapshot(self.current.select(selection)))
            }
            Command::SetBlockLimit(limit) => {
                let save_enabled = gate::save_allowed(&self.current, limit);
                Transition::Applied(EditorState {
                    current: self.current.clone(),
                    block_limit: limit,
                    save_enabled,
                    last_saved: self.last_saved.clone(),
                })
            }
            Command::Save => {
                if !self.save_enabled {
                    debug!("save declined: block count exceeds limit");
                    Transition::Declined
                } else {
                    save_document(store, &self.current)?;
                    let mut saved = self.clone();
                    saved.last_saved = self.current.clone();
                    Transition::Applied(saved)
                }
            }
            Command::Cancel => Transition::Applied(self.with_snapshot(self.last_saved.clone())),
        };
        Ok(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BlockKind, Selection};
    use crate::store::{CONTENT_KEY, MemoryStore};
    use pretty_assertions::assert_eq;

    fn applied(transition: Transition) -> EditorState {
        match transition {
            Transition::Applied(state) => state,
            Transition::Declined => panic!("expected Applied, got Declined"),
        }
    }

    #[test]
    fn test_load_from_empty_store_uses_default_document() {
        let store = MemoryStore::default();
        let state = EditorState::load(&store).unwrap();

        assert_eq!(state.snapshot(), &Snapshot::default_document());
        assert!(state.save_enabled());
        assert_eq!(state.last_saved(), state.snapshot());
    }

    #[test]
    fn test_gate_closes_when_limit_is_exceeded() {
        // blockLimit = 2 with three non-empty paragraphs: save must be a
        // no-op and cancel must revert to the loaded baseline.
        let store = MemoryStore::default();
        let baseline = Snapshot::from_paragraphs(&["one"]);
        let state = EditorState::new(baseline.clone(), BlockLimit::AtMost(2));

        let over = state.with_snapshot(Snapshot::from_paragraphs(&["one", "two", "three"]));
        assert!(!over.save_enabled());

        let save = over.apply(Command::Save, &store).unwrap();
        assert_eq!(save, Transition::Declined);
        assert_eq!(store.read(CONTENT_KEY).unwrap(), None);

        let cancelled = applied(over.apply(Command::Cancel, &store).unwrap());
        assert_eq!(cancelled.snapshot(), &baseline);
        assert!(cancelled.save_enabled());
    }

    #[test]
    fn test_save_persists_and_becomes_cancel_baseline() {
        let store = MemoryStore::default();
        let state = EditorState::load(&store).unwrap();

        let edited = applied(
            state
                .apply(Command::InsertText(" Edited.".to_string()), &store)
                .unwrap(),
        );
        let saved = applied(edited.apply(Command::Save, &store).unwrap());
        assert_eq!(saved.last_saved(), edited.snapshot());
        assert!(store.read(CONTENT_KEY).unwrap().is_some());

        // Later edits are discarded by Cancel in favor of the new baseline.
        let edited_again = applied(
            saved
                .apply(Command::InsertText(" More.".to_string()), &store)
                .unwrap(),
        );
        let cancelled = applied(edited_again.apply(Command::Cancel, &store).unwrap());
        assert_eq!(cancelled.snapshot(), saved.last_saved());
    }

    #[test]
    fn test_set_block_limit_recomputes_gate_both_ways() {
        let store = MemoryStore::default();
        let state = EditorState::new(
            Snapshot::from_paragraphs(&["one", "two", "three"]),
            BlockLimit::Unbounded,
        );
        assert!(state.save_enabled());

        let tightened = applied(
            state
                .apply(Command::SetBlockLimit(BlockLimit::AtMost(2)), &store)
                .unwrap(),
        );
        assert!(!tightened.save_enabled());

        let loosened = applied(
            tightened
                .apply(Command::SetBlockLimit(BlockLimit::AtMost(5)), &store)
                .unwrap(),
        );
        assert!(loosened.save_enabled());
    }

    #[test]
    fn test_illegal_indent_is_declined_and_changes_nothing() {
        let store = MemoryStore::default();
        let state = EditorState::new(Snapshot::from_paragraphs(&["only"]), BlockLimit::Unbounded);

        let transition = state.apply(Command::Indent, &store).unwrap();

        assert_eq!(transition, Transition::Declined);
    }

    #[test]
    fn test_insert_image_command_places_void_block_at_selection() {
        let store = MemoryStore::default();
        let snapshot = Snapshot::from_paragraphs(&["a", "b"]);
        let target = snapshot.root_keys()[0];
        let snapshot = snapshot.select(Selection::single(snapshot.root_keys()[1]));
        let state = EditorState::new(snapshot, BlockLimit::Unbounded);

        let next = applied(
            state
                .apply(
                    Command::InsertImage {
                        src: "https://x.com/pic.png".to_string(),
                        target: Some(target),
                    },
                    &store,
                )
                .unwrap(),
        );

        let inserted = next.snapshot().root_keys()[1];
        let block = next.snapshot().block(inserted).unwrap();
        assert_eq!(
            block.kind,
            BlockKind::Image {
                src: "https://x.com/pic.png".to_string()
            }
        );
        assert!(block.children.is_empty());
        assert!(block.leaves.is_empty());
    }
}
