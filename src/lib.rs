// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. editor::EditorBuffer)
    clippy::module_name_repetitions
)]

//! # Marknote
//!
//! A terminal markdown note editor with a live, sanitized HTML preview.
//!
//! Marknote keeps one note in sync between:
//! - a source editor widget (with undo, selection and formatting commands)
//! - the canonical document string
//! - an HTML preview rendered from the document
//! - a persistent key-value store, plus optional file and remote copies
//!
//! ## Architecture
//!
//! The document core ([`sync`], [`session`]) is UI-free. The terminal shell
//! in [`app`] uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **View**: Render to terminal
//!
//! ## Modules
//!
//! - [`editor`]: Text buffer with transactions, selections and history
//! - [`commands`]: Markdown formatting commands
//! - [`render`]: Markdown to sanitized HTML
//! - [`sync`]: Editor/document synchronization
//! - [`session`]: One open note with its store, files and remote
//! - [`storage`]: Key-value persistence
//! - [`files`]: Upload and download helpers
//! - [`remote`]: Demo HTTP save and load
//! - [`config`]: Layered configuration flags
//! - [`app`]: Main application loop and state
//! - [`ui`]: Terminal UI components

pub mod app;
pub mod commands;
pub mod config;
pub mod editor;
pub mod files;
pub mod remote;
pub mod render;
pub mod session;
pub mod storage;
pub mod sync;
pub mod ui;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::commands::FormatCommand;
    pub use crate::editor::EditorBuffer;
    pub use crate::session::NoteSession;
}
