use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;
use unicode_width::UnicodeWidthChar;

use crate::app::model::Pane;
use crate::app::{App, Message, Model};
use crate::commands::{FormatCommand, HeadingLevel};
use crate::editor::Direction;

/// Alt+key toolbar shortcuts, in toolbar order.
pub const FORMAT_KEYS: [char; 11] = ['b', 'i', 'e', 'k', 'g', '1', '2', 'q', 'u', 'o', 'c'];

/// The formatting command bound to Alt+`key`.
pub fn format_command_for_key(key: char, code_lang: &str) -> Option<FormatCommand> {
    let cmd = match key.to_ascii_lowercase() {
        'b' => FormatCommand::Bold,
        'i' => FormatCommand::Italic,
        'e' => FormatCommand::InlineCode,
        'k' => FormatCommand::Link { url: None },
        'g' => FormatCommand::Image { url: None },
        '1' => FormatCommand::Heading(HeadingLevel::H1),
        '2' => FormatCommand::Heading(HeadingLevel::H2),
        'q' => FormatCommand::Quote,
        'u' => FormatCommand::BulletList,
        'o' => FormatCommand::NumberedList,
        'c' => FormatCommand::CodeBlock {
            language: code_lang.to_string(),
        },
        _ => return None,
    };
    Some(cmd)
}

impl App {
    pub(super) fn handle_event(event: &Event, model: &Model) -> Option<Message> {
        match event {
            Event::Key(key) => Self::handle_key(*key, model),
            Event::Mouse(mouse) => Self::handle_mouse(*mouse, model),
            Event::Resize(w, h) => Some(Message::Resize(*w, *h)),
            _ => None,
        }
    }

    pub(super) fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);

        if ctrl && matches!(key.code, KeyCode::Char('q' | 'c')) {
            return Some(Message::Quit);
        }

        if model.help_visible {
            return match key.code {
                KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('q' | '?') => {
                    Some(Message::HideHelp)
                }
                KeyCode::Up | KeyCode::Char('k') => Some(Message::HelpScrollUp),
                KeyCode::Down | KeyCode::Char('j') => Some(Message::HelpScrollDown),
                _ => None,
            };
        }

        if model.prompt.is_some() {
            return match key.code {
                KeyCode::Esc => Some(Message::PromptCancel),
                KeyCode::Enter => Some(Message::PromptSubmit),
                KeyCode::Backspace => Some(Message::PromptBackspace),
                KeyCode::Char(c) if !ctrl && !alt => Some(Message::PromptInput(c)),
                _ => None,
            };
        }

        if alt
            && let KeyCode::Char(c) = key.code
            && let Some(cmd) = format_command_for_key(c, &model.code_lang)
        {
            return Some(Message::Format(cmd));
        }

        if ctrl && let KeyCode::Char(c) = key.code {
            return match c {
                'z' => Some(Message::Undo),
                'y' => Some(Message::Redo),
                'a' => Some(Message::SelectAll),
                'o' => Some(Message::OpenUpload),
                's' => Some(Message::Download),
                'r' => Some(Message::SaveRemote),
                'l' => Some(Message::LoadRemote),
                _ => None,
            };
        }

        match key.code {
            KeyCode::F(1) => return Some(Message::ToggleHelp),
            KeyCode::F(2) => return Some(Message::ToggleEditor),
            KeyCode::Tab | KeyCode::BackTab => return Some(Message::SwitchFocus),
            _ => {}
        }

        if model.focus == Pane::Editor && model.editor_visible {
            Self::editor_key(key.code, ctrl, shift)
        } else {
            Self::preview_key(key.code)
        }
    }

    fn editor_key(code: KeyCode, ctrl: bool, shift: bool) -> Option<Message> {
        let arrow = |direction| {
            if shift {
                Message::ExtendSelection(direction)
            } else {
                Message::MoveCursor(direction)
            }
        };
        let msg = match code {
            KeyCode::Char(c) => Message::InsertChar(c),
            KeyCode::Enter => Message::InsertNewline,
            KeyCode::Backspace => Message::DeleteBack,
            KeyCode::Delete => Message::DeleteForward,
            KeyCode::Left if ctrl => Message::MoveWordLeft,
            KeyCode::Right if ctrl => Message::MoveWordRight,
            KeyCode::Left => arrow(Direction::Left),
            KeyCode::Right => arrow(Direction::Right),
            KeyCode::Up => arrow(Direction::Up),
            KeyCode::Down => arrow(Direction::Down),
            KeyCode::Home if ctrl => Message::MoveToStart,
            KeyCode::End if ctrl => Message::MoveToEnd,
            KeyCode::Home => Message::MoveHome,
            KeyCode::End => Message::MoveEnd,
            KeyCode::PageUp => Message::EditorPageUp,
            KeyCode::PageDown => Message::EditorPageDown,
            _ => return None,
        };
        Some(msg)
    }

    fn preview_key(code: KeyCode) -> Option<Message> {
        let msg = match code {
            KeyCode::Up | KeyCode::Char('k') => Message::PreviewScroll(-1),
            KeyCode::Down | KeyCode::Char('j') => Message::PreviewScroll(1),
            KeyCode::PageUp | KeyCode::Char('b') => Message::PreviewPageUp,
            KeyCode::PageDown | KeyCode::Char(' ') => Message::PreviewPageDown,
            KeyCode::Home | KeyCode::Char('g') => Message::PreviewTop,
            KeyCode::End | KeyCode::Char('G') => Message::PreviewBottom,
            KeyCode::Char('?') => Message::ToggleHelp,
            KeyCode::Char('q') => Message::Quit,
            _ => return None,
        };
        Some(msg)
    }

    pub(super) fn handle_mouse(mouse: MouseEvent, model: &Model) -> Option<Message> {
        if model.help_visible || model.prompt.is_some() {
            return None;
        }
        let layout = model.layout();
        let in_preview = point_in_rect(mouse.column, mouse.row, layout.preview);
        let editor_area = layout
            .editor
            .filter(|area| point_in_rect(mouse.column, mouse.row, *area));

        match mouse.kind {
            MouseEventKind::ScrollDown if editor_area.is_some() => Some(Message::EditorScroll(3)),
            MouseEventKind::ScrollUp if editor_area.is_some() => Some(Message::EditorScroll(-3)),
            MouseEventKind::ScrollDown if in_preview => Some(Message::PreviewScroll(3)),
            MouseEventKind::ScrollUp if in_preview => Some(Message::PreviewScroll(-3)),
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(area) = editor_area {
                    return editor_position_at(model, area, mouse.column, mouse.row)
                        .map(|(line, col)| Message::MoveTo(line, col));
                }
                in_preview.then_some(Message::FocusPane(Pane::Preview))
            }
            _ => None,
        }
    }
}

fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

/// Buffer (line, char column) under a click in the editor pane.
fn editor_position_at(model: &Model, area: Rect, x: u16, y: u16) -> Option<(usize, usize)> {
    let editor = model.editor()?;
    let inner = crate::ui::pane_inner(area);
    if !point_in_rect(x, y, inner) {
        return None;
    }
    let line = model.editor_scroll_offset + (y - inner.y) as usize;
    if line >= editor.line_count() {
        let last = editor.line_count().saturating_sub(1);
        return Some((last, editor.line_len(last)));
    }
    let gutter = crate::ui::line_number_width(editor.line_count()) + 1;
    let target = x.saturating_sub(inner.x + gutter) as usize;
    let h_offset = crate::ui::editor_h_offset(editor, inner.width);
    let text = editor.line_at(line).unwrap_or_default();
    let mut used = 0;
    let mut col = h_offset;
    for ch in text.chars().skip(h_offset) {
        let width = ch.width().unwrap_or(0);
        if used + width > target {
            break;
        }
        used += width;
        col += 1;
    }
    Some((line, col))
}
