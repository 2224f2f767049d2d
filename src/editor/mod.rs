//! The editing widget.
//!
//! A rope-backed buffer with a multi-range selection. Edits are expressed
//! as [`Transaction`]s over char offsets, recorded for undo, and announced
//! to an optional change listener so the owner can mirror the text.

mod buffer;
mod history;
mod selection;
mod transaction;

pub use buffer::{Cursor, Direction, EditorBuffer};
pub use history::DEFAULT_MAX_STEPS;
pub use selection::{Selection, SelectionRange};
pub use transaction::{
    Assoc, Change, ChangeNotice, ChangeOrigin, ChangeSet, EditError, Transaction,
};
