use crate::app::Model;
use crate::app::model::{Pane, Prompt, PromptKind};
use crate::commands::FormatCommand;
use crate::editor::{Direction, EditorBuffer};

/// All possible events and actions in the application.
///
/// These represent user input, system events, and internal actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Editor
    /// Insert a character at every selection range
    InsertChar(char),
    /// Split lines at every selection range (Enter)
    InsertNewline,
    /// Delete before each cursor or the selected text (Backspace)
    DeleteBack,
    /// Delete after each cursor or the selected text (Delete)
    DeleteForward,
    /// Move cursor in a direction
    MoveCursor(Direction),
    /// Extend the main selection in a direction (Shift+arrow)
    ExtendSelection(Direction),
    /// Move cursor to beginning of line (Home)
    MoveHome,
    /// Move cursor to end of line (End)
    MoveEnd,
    /// Move cursor one word left (Ctrl+Left)
    MoveWordLeft,
    /// Move cursor one word right (Ctrl+Right)
    MoveWordRight,
    /// Move cursor to start of buffer (Ctrl+Home)
    MoveToStart,
    /// Move cursor to end of buffer (Ctrl+End)
    MoveToEnd,
    /// Move cursor one page up
    EditorPageUp,
    /// Move cursor one page down
    EditorPageDown,
    /// Move cursor to (line, col), e.g. from a mouse click
    MoveTo(usize, usize),
    SelectAll,
    Undo,
    Redo,
    /// Scroll the editor viewport without moving the cursor
    EditorScroll(isize),

    // Formatting
    /// Run a toolbar command against the editor
    Format(FormatCommand),

    // Preview
    /// Scroll the preview by n lines (negative is up)
    PreviewScroll(isize),
    PreviewPageUp,
    PreviewPageDown,
    PreviewTop,
    PreviewBottom,

    // Panes
    /// Move keyboard focus to the other pane
    SwitchFocus,
    /// Focus a specific pane (mouse click)
    FocusPane(Pane),
    /// Hide or show the editor pane
    ToggleEditor,

    // Prompt
    /// Open the upload path dialog
    OpenUpload,
    PromptInput(char),
    PromptBackspace,
    /// Enter in a prompt
    PromptSubmit,
    /// Esc in a prompt
    PromptCancel,

    // Files and remote (handled as side effects)
    /// Export the document to the export directory
    Download,
    /// Send the document to the remote endpoint
    SaveRemote,
    /// Replace the document with the remote copy
    LoadRemote,

    // Help
    ToggleHelp,
    HideHelp,
    HelpScrollUp,
    HelpScrollDown,

    // Window
    /// Terminal resized
    Resize(u16, u16),

    // Application
    /// Quit the application
    Quit,
}

/// Update the model based on a message.
///
/// This is the core of TEA - all state transitions happen here. File and
/// network work is left to the side-effect pass that runs afterwards.
pub fn update(mut model: Model, msg: Message) -> Model {
    match msg {
        // Editor
        Message::InsertChar(ch) => {
            model.edit(|ed| ed.insert_char(ch));
        }
        Message::InsertNewline => {
            model.edit(EditorBuffer::split_line);
        }
        Message::DeleteBack => {
            model.edit(EditorBuffer::delete_back);
        }
        Message::DeleteForward => {
            model.edit(EditorBuffer::delete_forward);
        }
        Message::MoveCursor(direction) => {
            model.edit(|ed| ed.move_cursor(direction));
        }
        Message::ExtendSelection(direction) => {
            model.edit(|ed| ed.extend_selection(direction));
        }
        Message::MoveHome => {
            model.edit(EditorBuffer::move_home);
        }
        Message::MoveEnd => {
            model.edit(EditorBuffer::move_end);
        }
        Message::MoveWordLeft => {
            model.edit(EditorBuffer::move_word_left);
        }
        Message::MoveWordRight => {
            model.edit(EditorBuffer::move_word_right);
        }
        Message::MoveToStart => {
            model.edit(EditorBuffer::move_to_start);
        }
        Message::MoveToEnd => {
            model.edit(EditorBuffer::move_to_end);
        }
        Message::EditorPageUp => {
            let page = model.editor_view_height().max(1);
            model.edit(|ed| (0..page).for_each(|_| ed.move_cursor(Direction::Up)));
        }
        Message::EditorPageDown => {
            let page = model.editor_view_height().max(1);
            model.edit(|ed| (0..page).for_each(|_| ed.move_cursor(Direction::Down)));
        }
        Message::MoveTo(line, col) => {
            model.focus_pane(Pane::Editor);
            model.edit(|ed| ed.move_to(line, col));
        }
        Message::SelectAll => {
            model.edit(EditorBuffer::select_all);
        }
        Message::Undo => {
            model.edit(EditorBuffer::undo);
        }
        Message::Redo => {
            model.edit(EditorBuffer::redo);
        }
        Message::EditorScroll(delta) => model.scroll_editor(delta),

        // Formatting
        Message::Format(cmd) => model.format(cmd),

        // Preview
        Message::PreviewScroll(delta) => model.scroll_preview(delta),
        Message::PreviewPageUp => {
            let page = page_delta(model.preview_view_height());
            model.scroll_preview(-page);
        }
        Message::PreviewPageDown => {
            let page = page_delta(model.preview_view_height());
            model.scroll_preview(page);
        }
        Message::PreviewTop => model.preview_scroll_offset = 0,
        Message::PreviewBottom => model.preview_scroll_offset = model.preview_max_scroll(),

        // Panes
        Message::SwitchFocus => {
            let next = match model.focus {
                Pane::Editor => Pane::Preview,
                Pane::Preview => Pane::Editor,
            };
            model.focus_pane(next);
        }
        Message::FocusPane(pane) => model.focus_pane(pane),
        Message::ToggleEditor => {
            if model.editor_visible {
                model.hide_editor();
            } else {
                model.show_editor();
            }
        }

        // Prompt
        Message::OpenUpload => model.open_prompt(PromptKind::Upload),
        Message::PromptInput(ch) => {
            if let Some(prompt) = model.prompt.as_mut() {
                prompt.input.push(ch);
            }
        }
        Message::PromptBackspace => {
            if let Some(prompt) = model.prompt.as_mut() {
                prompt.input.pop();
            }
        }
        Message::PromptSubmit => {
            // The upload prompt stays open until the file is read
            let is_url = matches!(
                model.prompt,
                Some(Prompt {
                    kind: PromptKind::Url(_),
                    ..
                })
            );
            if is_url
                && let Some(Prompt {
                    kind: PromptKind::Url(cmd),
                    input,
                }) = model.take_prompt()
            {
                let url = Some(input.trim().to_string()).filter(|url| !url.is_empty());
                model.run_format(&cmd.with_url(url));
            }
        }
        Message::PromptCancel => {
            // A declined URL still runs the command with the placeholder URL
            if let Some(prompt) = model.take_prompt()
                && let PromptKind::Url(cmd) = prompt.kind
            {
                model.run_format(&cmd.with_url(None));
            }
        }

        Message::Download | Message::SaveRemote | Message::LoadRemote => {}

        // Help
        Message::ToggleHelp => {
            model.help_visible = !model.help_visible;
            model.help_scroll_offset = 0;
        }
        Message::HideHelp => model.help_visible = false,
        Message::HelpScrollUp => {
            model.help_scroll_offset = model.help_scroll_offset.saturating_sub(1);
        }
        Message::HelpScrollDown => model.help_scroll_offset += 1,

        // Window
        Message::Resize(width, height) => {
            model.width = width;
            model.height = height;
            model.ensure_cursor_visible();
            model.preview_scroll_offset = model
                .preview_scroll_offset
                .min(model.preview_max_scroll());
        }

        // Application
        Message::Quit => model.should_quit = true,
    }
    model
}

fn page_delta(height: usize) -> isize {
    isize::try_from(height.max(1)).unwrap_or(isize::MAX)
}
