/*!
 * Editing core.
 *
 * Everything in this module is a pure function over [`Snapshot`] values from
 * the document model:
 *
 * - **`indent`**: the list/indent state machine. Indent and Outdent derive
 *   their legality from the snapshot on every invocation and either return a
 *   mutated successor or decline with `None`, in which case the raw input
 *   event is forwarded unhandled. Illegal transitions decline silently and
 *   leave the snapshot untouched.
 * - **`gate`**: the block-count gate. `save_allowed` is recomputed
 *   synchronously with every document or limit change.
 * - **`command` / `state`**: the tagged [`Command`] variants and the
 *   [`EditorState`] value they transition. `EditorState::apply` is the one
 *   exhaustive dispatch point; `Save` is the only command that touches the
 *   outside world (through the content store).
 *
 * [`Snapshot`]: crate::document::Snapshot
 */

pub mod command;
pub mod gate;
pub mod indent;
pub mod state;

pub use command::Command;
pub use gate::{BlockLimit, count_significant_blocks, save_allowed};
pub use indent::{DEFAULT_LIST_KIND, MAX_NEST_DEPTH, indent, outdent, toggle_block};
pub use state::{EditorState, Transition};
