use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{FORMAT_KEYS, Model, ToastLevel, format_command_for_key};
use crate::editor::EditorBuffer;
use crate::sync::SyncState;

/// One line of shortcut hints for the formatting toolbar and file actions.
pub fn render_toolbar(model: &Model, frame: &mut Frame, area: Rect) {
    let key_style = if model.editor_visible {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    // File actions first so they survive truncation on narrow terminals
    let mut spans = Vec::new();
    for (key, label) in [
        ("^O", "upload"),
        ("^S", "download"),
        ("^R", "save API"),
        ("^L", "load API"),
    ] {
        spans.push(Span::styled(
            format!(" {key}"),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(format!(" {label}")));
    }
    spans.push(Span::raw(" \u{2502}"));
    for key in FORMAT_KEYS {
        let Some(cmd) = format_command_for_key(key, &model.code_lang) else {
            continue;
        };
        spans.push(Span::styled(
            format!(" M-{}", key.to_ascii_uppercase()),
            key_style,
        ));
        spans.push(Span::raw(format!(" {}", cmd.label())));
    }
    let toolbar = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(toolbar, area);
}

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let sync = match model.session.sync_state() {
        SyncState::Unmounted => "[editor hidden]",
        SyncState::MountedIdle => "[synced]",
        SyncState::MountedDirty => "[syncing]",
    };
    let cursor_info = model.editor().map_or_else(String::new, |ed| {
        let c = ed.cursor();
        format!("  Ln {}, Col {}", c.line + 1, c.col + 1)
    });
    let modified = if model.editor().is_some_and(EditorBuffer::is_dirty) {
        " [modified]"
    } else {
        ""
    };

    let base = Style::default().bg(Color::DarkGray).fg(Color::White);
    let mut spans = vec![Span::raw(format!(
        " marknote  {sync}{modified}{cursor_info}"
    ))];
    if model.session.is_loading() {
        spans.push(Span::styled(
            "  Loading...",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    }
    spans.push(Span::raw("  F1:help  F2:editor  Tab:focus  ^Q:quit"));

    frame.render_widget(Paragraph::new(Line::from(spans)).style(base), area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
