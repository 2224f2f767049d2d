//! The note session: everything a view needs to drive one document.
//!
//! A [`NoteSession`] owns the synchronization core, the rendered preview,
//! and the persistence slot. Every mutating call ends with [`NoteSession::refresh`],
//! which re-renders and persists whenever the document moved.

use std::path::Path;

use crate::commands::FormatCommand;
use crate::editor::EditorBuffer;
use crate::files::{self, Download, FileError};
use crate::remote::{RemoteError, RemoteSync};
use crate::render;
use crate::storage::{self, KeyValueStore};
use crate::sync::{SurfaceId, SyncCore, SyncState};

/// Persistence slot used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "markdown-content";

/// Name of the exported file.
pub const EXPORT_FILENAME: &str = "markdown-note.md";

/// Shown when the store holds no document.
pub const SAMPLE_DOCUMENT: &str = "# Welcome to Markdown Preview!

## Features
- **Real-time** editing
- _Italic_ and **bold** text
- [Links](https://example.com)
- Lists:
  - Item 1
  - Item 2
- `Inline code`

```js
console.log('Hello World!');
```

![Image](https://placehold.co/600x300/png)
";

pub const SAVED_NOTICE: &str = "Saved to API! (Demo)";
pub const SAVE_FAILED_NOTICE: &str = "Error saving to API";
pub const LOADED_NOTICE: &str = "Loaded from API!";
pub const LOAD_FAILED_NOTICE: &str = "Error loading from API";

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub storage_key: String,
    /// Document used when the store has nothing usable.
    pub initial: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            initial: SAMPLE_DOCUMENT.to_string(),
        }
    }
}

/// What a file upload did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The file replaced the document.
    Loaded,
    /// Not a `.md` file; nothing changed.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOp {
    Save,
    Load,
}

/// A remote call detached from the session so it can run elsewhere.
#[derive(Debug, Clone)]
pub struct RemoteJob {
    op: RemoteOp,
    /// Document snapshot sent by a save.
    text: String,
}

impl RemoteJob {
    pub const fn op(&self) -> RemoteOp {
        self.op
    }

    /// Perform the call. Blocks for as long as the remote takes.
    pub fn run(self, remote: &dyn RemoteSync) -> RemoteOutcome {
        let result = match self.op {
            RemoteOp::Save => remote.save(&self.text).map(|()| RemoteOutcome::Saved),
            RemoteOp::Load => remote.load().map(RemoteOutcome::Loaded),
        };
        result.unwrap_or_else(|error| RemoteOutcome::Failed { op: self.op, error })
    }
}

#[derive(Debug)]
pub enum RemoteOutcome {
    Saved,
    Loaded(String),
    Failed { op: RemoteOp, error: RemoteError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn info(message: &str) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.to_string(),
        }
    }

    fn error(message: &str) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.to_string(),
        }
    }
}

/// One open note backed by a store slot.
#[derive(Debug)]
pub struct NoteSession<S: KeyValueStore> {
    store: S,
    storage_key: String,
    core: SyncCore,
    html: String,
    /// Core revision the preview and the store last reflected.
    synced_revision: u64,
    loading: bool,
    upload_dialog: bool,
}

impl<S: KeyValueStore> NoteSession<S> {
    /// Hydrate the document from `store`, falling back to `options.initial`.
    ///
    /// The hydrated document is written back at once, so the slot holds
    /// its trimmed form before the first edit.
    pub fn open(mut store: S, options: SessionOptions) -> Self {
        let SessionOptions {
            storage_key,
            initial,
        } = options;
        let document = storage::load(&store, &storage_key, &initial);
        storage::save(&mut store, &storage_key, &document);
        let html = render::render(&document);
        tracing::debug!(key = %storage_key, chars = document.len(), "session opened");
        Self {
            store,
            storage_key,
            core: SyncCore::new(document),
            html,
            synced_revision: 0,
            loading: false,
            upload_dialog: false,
        }
    }

    pub fn document(&self) -> &str {
        self.core.document()
    }

    /// Sanitized HTML for the current document.
    pub fn html(&self) -> &str {
        &self.html
    }

    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    pub const fn upload_dialog_visible(&self) -> bool {
        self.upload_dialog
    }

    pub const fn set_upload_dialog_visible(&mut self, visible: bool) {
        self.upload_dialog = visible;
    }

    pub fn sync_state(&self) -> SyncState {
        self.core.state()
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Mount the editor on `surface`, or tear it down with `None`.
    ///
    /// Call once with the surface when the editor pane appears and once
    /// with `None` when it goes away.
    pub fn editor_ref(&mut self, surface: Option<SurfaceId>) {
        self.core.register_surface(surface);
        self.refresh();
    }

    pub fn editor(&self) -> Option<&EditorBuffer> {
        self.core.editor()
    }

    /// Run `f` against the mounted editor. `None` when nothing is mounted.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut EditorBuffer) -> R) -> Option<R> {
        let result = self.core.edit(f);
        self.refresh();
        result
    }

    /// Apply a formatting command. Returns `true` when the text changed.
    pub fn format(&mut self, cmd: &FormatCommand) -> bool {
        let applied = self.core.apply_command(cmd);
        self.refresh();
        applied
    }

    /// Replace the document with the contents of a `.md` file.
    ///
    /// Other files are skipped and leave the upload dialog as it was.
    ///
    /// # Errors
    /// Returns [`FileError`] when the file cannot be read; the document
    /// and the dialog are left untouched.
    pub fn handle_file_upload(&mut self, path: &Path) -> Result<UploadOutcome, FileError> {
        if !files::is_markdown_file(path) {
            tracing::debug!(path = %path.display(), "upload skipped, not a .md file");
            return Ok(UploadOutcome::Skipped);
        }
        let text = files::read_file_as_text(path)?;
        self.core.replace_document(&text);
        self.upload_dialog = false;
        self.refresh();
        Ok(UploadOutcome::Loaded)
    }

    /// Export the document verbatim to `dir/markdown-note.md`.
    ///
    /// # Errors
    /// Returns [`FileError`] when the file cannot be written.
    pub fn handle_download(&self, dir: &Path) -> Result<Download, FileError> {
        files::download_text(dir, EXPORT_FILENAME, self.core.document())
    }

    /// Start a remote call, raising the loading flag.
    ///
    /// Returns `None` while another call is outstanding.
    pub fn begin_remote(&mut self, op: RemoteOp) -> Option<RemoteJob> {
        if self.loading {
            tracing::debug!(?op, "remote call already in flight");
            return None;
        }
        self.loading = true;
        let text = match op {
            RemoteOp::Save => self.core.document().to_string(),
            RemoteOp::Load => String::new(),
        };
        Some(RemoteJob { op, text })
    }

    /// Settle a remote call: clear the loading flag, apply a loaded
    /// document, and describe the result for the user.
    pub fn finish_remote(&mut self, outcome: RemoteOutcome) -> Notice {
        self.loading = false;
        match outcome {
            RemoteOutcome::Saved => Notice::info(SAVED_NOTICE),
            RemoteOutcome::Loaded(text) => {
                self.core.replace_document(&text);
                self.refresh();
                Notice::info(LOADED_NOTICE)
            }
            RemoteOutcome::Failed { op, error } => {
                tracing::warn!(?op, %error, "remote call failed");
                match op {
                    RemoteOp::Save => Notice::error(SAVE_FAILED_NOTICE),
                    RemoteOp::Load => Notice::error(LOAD_FAILED_NOTICE),
                }
            }
        }
    }

    /// Save to `remote` on the current thread. `None` if a call is in flight.
    pub fn save_remote(&mut self, remote: &dyn RemoteSync) -> Option<Notice> {
        let job = self.begin_remote(RemoteOp::Save)?;
        Some(self.finish_remote(job.run(remote)))
    }

    /// Load from `remote` on the current thread. `None` if a call is in flight.
    pub fn load_remote(&mut self, remote: &dyn RemoteSync) -> Option<Notice> {
        let job = self.begin_remote(RemoteOp::Load)?;
        Some(self.finish_remote(job.run(remote)))
    }

    /// Bring the preview and the store up to date with the document.
    pub fn refresh(&mut self) {
        self.core.pump();
        let revision = self.core.revision();
        if revision == self.synced_revision {
            return;
        }
        self.html = render::render(self.core.document());
        storage::save(&mut self.store, &self.storage_key, self.core.document());
        self.synced_revision = revision;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::HeadingLevel;
    use crate::remote::RemoteError;
    use crate::storage::MemoryStore;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::tempdir;

    const PANE: SurfaceId = SurfaceId(7);

    /// In-process remote that records saves and serves a fixed listing.
    #[derive(Default)]
    struct FakeRemote {
        saved: RefCell<Vec<String>>,
        body: String,
        fail: bool,
    }

    impl FakeRemote {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn error() -> RemoteError {
            RemoteError::Status {
                url: "fake".to_string(),
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
    }

    impl RemoteSync for FakeRemote {
        fn save(&self, text: &str) -> Result<(), RemoteError> {
            if self.fail {
                return Err(Self::error());
            }
            self.saved.borrow_mut().push(text.to_string());
            Ok(())
        }

        fn load(&self) -> Result<String, RemoteError> {
            if self.fail {
                return Err(Self::error());
            }
            Ok(self.body.clone())
        }
    }

    fn session() -> NoteSession<MemoryStore> {
        NoteSession::open(MemoryStore::new(), SessionOptions::default())
    }

    fn stored(session: &NoteSession<MemoryStore>) -> Option<String> {
        session.store().get(DEFAULT_STORAGE_KEY).unwrap()
    }

    #[test]
    fn test_open_with_empty_store_uses_sample() {
        let session = session();
        assert_eq!(session.document(), SAMPLE_DOCUMENT);
        assert!(session.html().contains("<h1>Welcome to Markdown Preview!</h1>"));
        assert!(!session.is_loading());
        assert!(!session.upload_dialog_visible());
    }

    #[test]
    fn test_open_prefers_stored_document() {
        let mut store = MemoryStore::new();
        store.set("notes", "# Mine").unwrap();
        let options = SessionOptions {
            storage_key: "notes".to_string(),
            ..SessionOptions::default()
        };
        let session = NoteSession::open(store, options);
        assert_eq!(session.document(), "# Mine");
    }

    #[test]
    fn test_typing_updates_document_preview_and_store() {
        let mut session = session();
        session.editor_ref(Some(PANE));
        session.edit(|ed| {
            ed.select_all();
            ed.insert_str("  *hi*  ");
        });
        assert_eq!(session.document(), "  *hi*  ");
        assert!(session.html().contains("<em>hi</em>"));
        assert_eq!(stored(&session).as_deref(), Some("*hi*"));
    }

    #[test]
    fn test_edit_without_editor_is_none() {
        let mut session = session();
        assert!(session.edit(|ed| ed.insert_char('x')).is_none());
        assert_eq!(stored(&session).as_deref(), Some(SAMPLE_DOCUMENT.trim()));
    }

    #[test]
    fn test_open_writes_hydrated_document_back() {
        let session = session();
        assert_eq!(stored(&session).as_deref(), Some(SAMPLE_DOCUMENT.trim()));

        let mut store = MemoryStore::new();
        store.set("notes", "  # Padded  \n").unwrap();
        let options = SessionOptions {
            storage_key: "notes".to_string(),
            ..SessionOptions::default()
        };
        let session = NoteSession::open(store, options);
        assert_eq!(session.document(), "  # Padded  \n");
        assert_eq!(
            session.store().get("notes").unwrap().as_deref(),
            Some("# Padded")
        );
    }

    #[test]
    fn test_open_with_blank_initial_leaves_slot_empty() {
        let options = SessionOptions {
            initial: String::new(),
            ..SessionOptions::default()
        };
        let session = NoteSession::open(MemoryStore::new(), options);
        assert_eq!(stored(&session), None);
    }

    #[test]
    fn test_clearing_document_removes_slot() {
        let mut session = session();
        session.editor_ref(Some(PANE));
        session.edit(|ed| ed.insert_char('x'));
        assert!(stored(&session).is_some());
        session.edit(|ed| {
            ed.select_all();
            ed.delete_back();
        });
        assert_eq!(session.document(), "");
        assert_eq!(session.html(), "");
        assert_eq!(stored(&session), None);
    }

    #[test]
    fn test_format_reaches_preview() {
        let mut session = session();
        session.editor_ref(Some(PANE));
        session.edit(|ed| {
            ed.select_all();
            ed.insert_str("## Old");
        });
        assert!(session.format(&FormatCommand::Heading(HeadingLevel::H1)));
        assert_eq!(session.document(), "# Old");
        assert!(session.html().contains("<h1>Old</h1>"));
    }

    #[test]
    fn test_format_without_editor_is_noop() {
        let mut session = session();
        assert!(!session.format(&FormatCommand::Bold));
        assert_eq!(session.document(), SAMPLE_DOCUMENT);
    }

    #[test]
    fn test_upload_skips_non_markdown_and_keeps_dialog() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "plain").unwrap();
        let mut session = session();
        session.set_upload_dialog_visible(true);
        assert_eq!(session.handle_file_upload(&path).unwrap(), UploadOutcome::Skipped);
        assert!(session.upload_dialog_visible());
        assert_eq!(session.document(), SAMPLE_DOCUMENT);
    }

    #[test]
    fn test_upload_read_error_keeps_document() {
        let dir = tempdir().unwrap();
        let mut session = session();
        session.set_upload_dialog_visible(true);
        let result = session.handle_file_upload(&dir.path().join("missing.md"));
        assert!(result.is_err());
        assert!(session.upload_dialog_visible());
        assert_eq!(session.document(), SAMPLE_DOCUMENT);
    }

    #[test]
    fn test_upload_rewrites_mounted_editor() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.md");
        fs::write(&path, "# Uploaded").unwrap();
        let mut session = session();
        session.editor_ref(Some(PANE));
        session.handle_file_upload(&path).unwrap();
        assert_eq!(session.editor().unwrap().text(), "# Uploaded");
        assert_eq!(stored(&session).as_deref(), Some("# Uploaded"));
    }

    #[test]
    fn test_download_writes_document() {
        let dir = tempdir().unwrap();
        let session = session();
        let download = session.handle_download(dir.path()).unwrap();
        assert_eq!(download.path, dir.path().join(EXPORT_FILENAME));
        assert_eq!(fs::read_to_string(download.path).unwrap(), SAMPLE_DOCUMENT);
    }

    #[test]
    fn test_second_remote_call_blocked_while_loading() {
        let mut session = session();
        let job = session.begin_remote(RemoteOp::Save).unwrap();
        assert!(session.is_loading());
        assert!(session.begin_remote(RemoteOp::Load).is_none());
        let notice = session.finish_remote(job.run(&FakeRemote::default()));
        assert_eq!(notice, Notice::info(SAVED_NOTICE));
        assert!(!session.is_loading());
    }

    #[test]
    fn test_local_edits_allowed_while_loading() {
        let mut session = session();
        session.editor_ref(Some(PANE));
        let _job = session.begin_remote(RemoteOp::Load).unwrap();
        session.edit(|ed| ed.insert_char('x'));
        assert!(session.document().starts_with('x'));
    }

    #[test]
    fn test_save_remote_sends_document() {
        let mut session = session();
        let remote = FakeRemote::default();
        let notice = session.save_remote(&remote).unwrap();
        assert_eq!(notice.message, "Saved to API! (Demo)");
        assert_eq!(remote.saved.borrow().as_slice(), &[SAMPLE_DOCUMENT.to_string()]);
    }

    #[test]
    fn test_load_remote_replaces_document() {
        let mut session = session();
        session.editor_ref(Some(PANE));
        let remote = FakeRemote {
            body: "# Remote".to_string(),
            ..FakeRemote::default()
        };
        let notice = session.load_remote(&remote).unwrap();
        assert_eq!(notice, Notice::info(LOADED_NOTICE));
        assert_eq!(session.document(), "# Remote");
        assert_eq!(session.editor().unwrap().text(), "# Remote");
        assert!(session.html().contains("<h1>Remote</h1>"));
    }

    #[test]
    fn test_remote_failures_reset_loading_and_report() {
        let mut session = session();
        let remote = FakeRemote::failing();
        let notice = session.save_remote(&remote).unwrap();
        assert_eq!(notice, Notice::error(SAVE_FAILED_NOTICE));
        assert!(!session.is_loading());
        let notice = session.load_remote(&remote).unwrap();
        assert_eq!(notice, Notice::error(LOAD_FAILED_NOTICE));
        assert_eq!(session.document(), SAMPLE_DOCUMENT);
    }

    #[test]
    fn test_remount_after_unmount_keeps_document() {
        let mut session = session();
        session.editor_ref(Some(PANE));
        session.edit(|ed| ed.insert_char('!'));
        session.editor_ref(None);
        assert_eq!(session.sync_state(), SyncState::Unmounted);
        session.editor_ref(Some(SurfaceId(8)));
        assert_eq!(session.editor().unwrap().text(), session.document());
    }
}
