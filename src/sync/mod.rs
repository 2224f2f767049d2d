//! Two-way synchronization between the document and the mounted editor.
//!
//! The document is the authoritative text. While an editor is mounted,
//! text flows both ways:
//! - edits inside the editor arrive as change notices and are copied into
//!   the document by [`SyncCore::pump`]
//! - external replacements go through [`SyncCore::replace_document`],
//!   which rewrites the editor only when its text actually differs
//!
//! Every write compares before it writes, so neither direction can echo
//! back into the other.

use std::sync::mpsc::{self, Receiver};

use crate::commands::{self, FormatCommand};
use crate::editor::{ChangeNotice, EditorBuffer};

/// Identity of the pane an editor is mounted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// Where the core stands relative to its editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No editor.
    Unmounted,
    /// Editor text matches the document.
    MountedIdle,
    /// The editor changed and the document has not caught up yet.
    MountedDirty,
}

/// A live editor tied to the surface it was mounted on.
///
/// Dropping it tears the editor down and closes its change channel.
#[derive(Debug)]
pub struct MountedEditor {
    surface: SurfaceId,
    buffer: EditorBuffer,
    changes: Receiver<ChangeNotice>,
}

impl MountedEditor {
    fn mount(surface: SurfaceId, text: &str) -> Self {
        let (tx, changes) = mpsc::channel();
        let mut buffer = EditorBuffer::from_text(text);
        buffer.set_change_listener(tx);
        tracing::debug!(surface = surface.0, "editor mounted");
        Self {
            surface,
            buffer,
            changes,
        }
    }
}

impl Drop for MountedEditor {
    fn drop(&mut self) {
        tracing::debug!(surface = self.surface.0, "editor torn down");
    }
}

/// Owner of the document and of at most one mounted editor.
#[derive(Debug)]
pub struct SyncCore {
    document: String,
    revision: u64,
    editor: Option<MountedEditor>,
    mounts: u64,
}

impl SyncCore {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            revision: 0,
            editor: None,
            mounts: 0,
        }
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    /// Bumped every time the document text changes.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    pub fn state(&self) -> SyncState {
        match &self.editor {
            None => SyncState::Unmounted,
            Some(mounted) if mounted.buffer.rope() == self.document.as_str() => {
                SyncState::MountedIdle
            }
            Some(_) => SyncState::MountedDirty,
        }
    }

    /// Mount on `surface`, or unmount with `None`.
    ///
    /// Registering the surface already mounted is a no-op. A different
    /// surface replaces the editor: pending edits are pulled into the
    /// document first, then the old editor is dropped and a new one is
    /// seeded from the document.
    pub fn register_surface(&mut self, surface: Option<SurfaceId>) {
        if self.mounted_surface() == surface {
            return;
        }
        self.pump();
        self.editor = None;
        if let Some(surface) = surface {
            self.editor = Some(MountedEditor::mount(surface, &self.document));
            self.mounts += 1;
        }
    }

    pub const fn is_mounted(&self) -> bool {
        self.editor.is_some()
    }

    pub fn mounted_surface(&self) -> Option<SurfaceId> {
        self.editor.as_ref().map(|m| m.surface)
    }

    /// How many editors have been built so far.
    pub const fn mount_count(&self) -> u64 {
        self.mounts
    }

    pub fn editor(&self) -> Option<&EditorBuffer> {
        self.editor.as_ref().map(|m| &m.buffer)
    }

    /// Run `f` against the mounted editor, then pull its changes in.
    ///
    /// Returns `None` when nothing is mounted.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut EditorBuffer) -> R) -> Option<R> {
        let result = f(&mut self.editor.as_mut()?.buffer);
        self.pump();
        Some(result)
    }

    /// Apply a formatting command to the editor. A no-op while unmounted.
    ///
    /// The edit lands in the editor first and reaches the document through
    /// the same change notices as typing.
    pub fn apply_command(&mut self, cmd: &FormatCommand) -> bool {
        let applied = commands::apply(cmd, self.editor.as_mut().map(|m| &mut m.buffer));
        self.pump();
        applied
    }

    /// Drain pending change notices into the document.
    ///
    /// Only the newest notice matters since each carries the full text.
    /// Returns `true` if the document changed.
    pub fn pump(&mut self) -> bool {
        let Some(mounted) = &self.editor else {
            return false;
        };
        let Some(latest) = mounted.changes.try_iter().last() else {
            return false;
        };
        if latest.text == self.document {
            return false;
        }
        tracing::trace!(origin = ?latest.origin, "document updated from editor");
        self.set_document(latest.text);
        true
    }

    /// Replace the document from outside the editor.
    ///
    /// The editor is rewritten only when its text differs from `text`.
    /// Returns `true` if the document changed.
    pub fn replace_document(&mut self, text: &str) -> bool {
        self.pump();
        let changed = self.document != text;
        if changed {
            self.set_document(text.to_string());
        }
        if let Some(mounted) = &mut self.editor {
            if mounted.buffer.rope() != text {
                mounted.buffer.replace_all(text);
            }
            // The echo of our own rewrite carries `text` back
            mounted.changes.try_iter().for_each(drop);
        }
        changed
    }

    fn set_document(&mut self, text: String) {
        self.document = text;
        self.revision += 1;
    }
}
