use std::path::PathBuf;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;

use crate::commands::{DEFAULT_CODE_LANG, FormatCommand};
use crate::editor::EditorBuffer;
use crate::session::{Notice, NoteSession, NoticeLevel, SessionOptions};
use crate::storage::{KeyValueStore, MemoryStore};
use crate::sync::SurfaceId;
use crate::ui::MainLayout;

/// The session type the shell drives; the store is chosen at startup.
pub type Session = NoteSession<Box<dyn KeyValueStore>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

impl From<NoticeLevel> for ToastLevel {
    fn from(level: NoticeLevel) -> Self {
        match level {
            NoticeLevel::Info => Self::Info,
            NoticeLevel::Error => Self::Error,
        }
    }
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// Which pane receives editing and scrolling keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Editor,
    Preview,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    /// Path of a markdown file to load.
    Upload,
    /// URL for a link or image command waiting to run.
    Url(FormatCommand),
}

/// A modal collecting one line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

/// The complete application state.
///
/// All state lives here - no global or scattered state.
#[derive(Debug)]
pub struct Model {
    /// Document, editor, preview and persistence
    pub session: Session,
    /// Whether the editor pane is shown (and the widget mounted)
    pub editor_visible: bool,
    pub focus: Pane,
    /// Last surface handed to the session; each showing of the pane gets a new one
    surfaces_created: u64,
    /// First editor line in view
    pub editor_scroll_offset: usize,
    /// First preview line in view
    pub preview_scroll_offset: usize,
    pub width: u16,
    pub height: u16,
    pub prompt: Option<Prompt>,
    pub help_visible: bool,
    pub help_scroll_offset: usize,
    /// Language tag for new code blocks
    pub code_lang: String,
    /// Global config path shown in help
    pub config_global_path: Option<PathBuf>,
    /// Local override path shown in help
    pub config_local_path: Option<PathBuf>,
    /// Store file shown in help
    pub store_path: Option<PathBuf>,
    toast: Option<Toast>,
    pub should_quit: bool,
}

impl Model {
    /// Create a model around `session` with the editor pane shown and focused.
    pub fn new(session: Session, terminal_size: (u16, u16)) -> Self {
        let mut model = Self::unmounted(session, terminal_size);
        model.show_editor();
        model
    }

    fn unmounted(session: Session, terminal_size: (u16, u16)) -> Self {
        Self {
            session,
            editor_visible: false,
            focus: Pane::Preview,
            surfaces_created: 0,
            editor_scroll_offset: 0,
            preview_scroll_offset: 0,
            width: terminal_size.0,
            height: terminal_size.1,
            prompt: None,
            help_visible: false,
            help_scroll_offset: 0,
            code_lang: DEFAULT_CODE_LANG.to_string(),
            config_global_path: None,
            config_local_path: None,
            store_path: None,
            toast: None,
            should_quit: false,
        }
    }

    /// Set the language tag used for new code blocks.
    #[must_use]
    pub fn with_code_lang(mut self, code_lang: impl Into<String>) -> Self {
        self.code_lang = code_lang.into();
        self
    }

    /// The editor surface currently mounted, if the pane is shown.
    pub const fn surface(&self) -> Option<SurfaceId> {
        if self.editor_visible {
            Some(SurfaceId(self.surfaces_created))
        } else {
            None
        }
    }

    pub fn editor(&self) -> Option<&EditorBuffer> {
        self.session.editor()
    }

    /// Show the editor pane, mounting a fresh widget on a new surface.
    pub(super) fn show_editor(&mut self) {
        if self.editor_visible {
            return;
        }
        self.surfaces_created += 1;
        self.editor_visible = true;
        self.session.editor_ref(self.surface());
        self.editor_scroll_offset = 0;
        self.focus_pane(Pane::Editor);
    }

    /// Hide the editor pane; the widget is torn down.
    pub(super) fn hide_editor(&mut self) {
        if !self.editor_visible {
            return;
        }
        self.editor_visible = false;
        self.session.editor_ref(None);
        self.focus = Pane::Preview;
    }

    pub(super) fn focus_pane(&mut self, pane: Pane) {
        let pane = if self.editor_visible {
            pane
        } else {
            Pane::Preview
        };
        self.focus = pane;
        match pane {
            Pane::Editor => self.session.edit(EditorBuffer::focus),
            Pane::Preview => self.session.edit(EditorBuffer::blur),
        };
    }

    /// Run `f` against the editor and keep its cursor in view.
    pub(super) fn edit<R>(&mut self, f: impl FnOnce(&mut EditorBuffer) -> R) -> Option<R> {
        let result = self.session.edit(f);
        self.ensure_cursor_visible();
        result
    }

    /// Run a formatting command, asking for a URL first when it needs one.
    pub(super) fn format(&mut self, cmd: FormatCommand) {
        if !self.editor_visible {
            self.show_toast(ToastLevel::Warning, "Editor hidden (F2 shows it)");
            return;
        }
        if cmd.needs_url() {
            self.open_prompt(PromptKind::Url(cmd));
            return;
        }
        self.run_format(&cmd);
    }

    pub(super) fn run_format(&mut self, cmd: &FormatCommand) {
        if self.session.format(cmd) {
            tracing::debug!(command = cmd.label(), "format applied");
        }
        self.focus_pane(Pane::Editor);
        self.ensure_cursor_visible();
    }

    pub(super) fn open_prompt(&mut self, kind: PromptKind) {
        if kind == PromptKind::Upload {
            self.session.set_upload_dialog_visible(true);
        }
        self.prompt = Some(Prompt {
            kind,
            input: String::new(),
        });
    }

    /// Close the prompt, returning it.
    pub(super) fn take_prompt(&mut self) -> Option<Prompt> {
        let prompt = self.prompt.take()?;
        if prompt.kind == PromptKind::Upload {
            self.session.set_upload_dialog_visible(false);
        }
        Some(prompt)
    }

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + Duration::from_secs(4),
        });
    }

    pub(super) fn show_notice(&mut self, notice: Notice) {
        self.show_toast(notice.level.into(), notice.message);
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }

    /// Screen layout for the current size and pane visibility.
    pub fn layout(&self) -> MainLayout {
        crate::ui::main_layout(
            Rect::new(0, 0, self.width, self.height),
            self.editor_visible,
            self.toast.is_some(),
        )
    }

    /// Rows of text visible in the editor pane.
    pub fn editor_view_height(&self) -> usize {
        self.layout()
            .editor
            .map_or(0, |area| crate::ui::pane_inner(area).height as usize)
    }

    /// Rows of text visible in the preview pane.
    pub fn preview_view_height(&self) -> usize {
        crate::ui::pane_inner(self.layout().preview).height as usize
    }

    /// Largest useful preview scroll offset.
    pub fn preview_max_scroll(&self) -> usize {
        let inner = crate::ui::pane_inner(self.layout().preview);
        crate::ui::wrap_text(self.session.html(), inner.width as usize)
            .len()
            .saturating_sub(inner.height as usize)
    }

    pub(super) fn scroll_preview(&mut self, delta: isize) {
        let max = self.preview_max_scroll();
        self.preview_scroll_offset = self
            .preview_scroll_offset
            .saturating_add_signed(delta)
            .min(max);
    }

    pub(super) fn scroll_editor(&mut self, delta: isize) {
        let max = self
            .editor()
            .map_or(0, |ed| ed.line_count().saturating_sub(1));
        self.editor_scroll_offset = self
            .editor_scroll_offset
            .saturating_add_signed(delta)
            .min(max);
    }

    /// Scroll the editor so the main cursor is on screen.
    pub(super) fn ensure_cursor_visible(&mut self) {
        let Some(line) = self.editor().map(|ed| ed.cursor().line) else {
            return;
        };
        let height = self.editor_view_height().max(1);
        if line < self.editor_scroll_offset {
            self.editor_scroll_offset = line;
        } else if line >= self.editor_scroll_offset + height {
            self.editor_scroll_offset = line + 1 - height;
        }
    }
}

impl Default for Model {
    /// An in-memory, blank, unmounted model.
    fn default() -> Self {
        let store: Box<dyn KeyValueStore> = Box::new(MemoryStore::new());
        let options = SessionOptions {
            initial: String::new(),
            ..SessionOptions::default()
        };
        Self::unmounted(NoteSession::open(store, options), (80, 24))
    }
}
