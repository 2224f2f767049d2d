use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use unicode_width::UnicodeWidthChar;

use crate::app::{Model, Pane};
use crate::editor::EditorBuffer;

use super::{EDITOR_WIDTH_PERCENT, overlays, status};

/// Where each part of the screen goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MainLayout {
    pub toolbar: Rect,
    /// Absent while the editor pane is hidden.
    pub editor: Option<Rect>,
    pub preview: Rect,
    pub toast: Option<Rect>,
    pub status: Rect,
}

pub fn main_layout(area: Rect, editor_visible: bool, toast_active: bool) -> MainLayout {
    let footer_rows = 1 + u16::from(toast_active);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(footer_rows),
        ])
        .split(area);
    let body = rows[1];
    let footer = rows[2];

    let (editor, preview) = if editor_visible {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(EDITOR_WIDTH_PERCENT),
                Constraint::Percentage(100 - EDITOR_WIDTH_PERCENT),
            ])
            .split(body);
        (Some(columns[0]), columns[1])
    } else {
        (None, body)
    };

    MainLayout {
        toolbar: rows[0],
        editor,
        preview,
        toast: toast_active.then_some(Rect {
            height: footer.height.min(1),
            ..footer
        }),
        status: Rect {
            y: footer.y + footer.height.saturating_sub(1),
            height: footer.height.min(1),
            ..footer
        },
    }
}

/// Text area of a bordered pane.
pub fn pane_inner(area: Rect) -> Rect {
    area.inner(Margin::new(1, 1))
}

/// Render the complete UI.
pub fn render(model: &Model, frame: &mut Frame) {
    let area = frame.area();
    let layout = main_layout(area, model.editor_visible, model.active_toast().is_some());

    status::render_toolbar(model, frame, layout.toolbar);
    if let Some(editor_area) = layout.editor {
        render_editor(model, frame, editor_area);
    }
    render_preview(model, frame, layout.preview);
    if let Some(toast_area) = layout.toast {
        status::render_toast_bar(model, frame, toast_area);
    }
    status::render_status_bar(model, frame, layout.status);

    if model.help_visible {
        overlays::render_help_overlay(model, frame, area);
    } else if let Some(prompt) = &model.prompt {
        overlays::render_prompt_overlay(prompt, frame, area);
    }
}

fn pane_block(title: String, focused: bool) -> Block<'static> {
    let border = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border)
}

fn render_editor(model: &Model, frame: &mut Frame, area: Rect) {
    let focused = model.focus == Pane::Editor;
    let dirty = model.editor().is_some_and(EditorBuffer::is_dirty);
    let title = if dirty {
        " Editor [modified] ".to_string()
    } else {
        " Editor ".to_string()
    };
    let block = pane_block(title, focused);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(editor) = model.editor() else {
        return;
    };
    let lines = editor_lines(editor, model.editor_scroll_offset, inner, focused);
    frame.render_widget(Paragraph::new(lines), inner);
}

fn editor_lines(
    editor: &EditorBuffer,
    scroll: usize,
    inner: Rect,
    focused: bool,
) -> Vec<Line<'static>> {
    let total = editor.line_count();
    let gutter = line_number_width(total) as usize;
    let h_offset = editor_h_offset(editor, inner.width);
    let start = scroll.min(total.saturating_sub(1));
    let end = (start + inner.height as usize).min(total);

    let ranges = editor.selection().ranges();
    let cursor_style = if focused {
        Style::default().bg(Color::White).fg(Color::Black)
    } else {
        Style::default().bg(Color::DarkGray)
    };
    let selected_style = Style::default().bg(Color::Blue).fg(Color::White);
    let style_at = |pos: usize| {
        if ranges.iter().any(|r| r.head == pos) {
            cursor_style
        } else if ranges.iter().any(|r| r.from() <= pos && pos < r.to()) {
            selected_style
        } else {
            Style::default()
        }
    };

    (start..end)
        .map(|line_idx| {
            let line_start = editor.rope().line_to_char(line_idx);
            let text = editor.line_at(line_idx).unwrap_or_default();
            let len = text.chars().count();

            let mut cells: Vec<(char, Style)> = text
                .chars()
                .enumerate()
                .skip(h_offset)
                .map(|(col, ch)| {
                    let ch = if ch == '\t' { ' ' } else { ch };
                    (ch, style_at(line_start + col))
                })
                .collect();
            // Cursor parked after the last char
            if ranges.iter().any(|r| r.head == line_start + len) {
                cells.push((' ', cursor_style));
            }

            let mut spans = vec![Span::styled(
                format!("{:>gutter$} ", line_idx + 1),
                Style::default().fg(Color::DarkGray),
            )];
            spans.extend(group_cells(cells));
            Line::from(spans)
        })
        .collect()
}

/// Chars hidden at the left of every editor line so the cursor stays on screen.
pub fn editor_h_offset(editor: &EditorBuffer, pane_width: u16) -> usize {
    let gutter = line_number_width(editor.line_count()) + 1;
    let text_width = pane_width.saturating_sub(gutter).max(1) as usize;
    editor.cursor().col.saturating_sub(text_width - 1)
}

fn render_preview(model: &Model, frame: &mut Frame, area: Rect) {
    let block = pane_block(" Preview ".to_string(), model.focus == Pane::Preview);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let html = model.session.html();
    if html.is_empty() {
        let hint = Line::styled("Nothing to preview", Style::default().fg(Color::DarkGray));
        frame.render_widget(Paragraph::new(hint), inner);
        return;
    }

    let lines = highlight_html(&wrap_text(html, inner.width as usize));
    let height = inner.height as usize;
    let start = model
        .preview_scroll_offset
        .min(lines.len().saturating_sub(height));
    let visible: Vec<Line> = lines.into_iter().skip(start).take(height).collect();
    frame.render_widget(Paragraph::new(visible), inner);
}

/// Tags in one color, text in the default style. Tags may span wrapped lines.
fn highlight_html(lines: &[String]) -> Vec<Line<'static>> {
    let tag_style = Style::default().fg(Color::Cyan);
    let mut in_tag = false;
    lines
        .iter()
        .map(|line| {
            let cells = line.chars().map(|ch| {
                if ch == '<' {
                    in_tag = true;
                }
                let style = if in_tag { tag_style } else { Style::default() };
                if ch == '>' {
                    in_tag = false;
                }
                (ch, style)
            });
            Line::from(group_cells(cells))
        })
        .collect()
}

/// Hard-wrap `text` to `width` display columns.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for raw in text.lines() {
        let mut line = String::new();
        let mut used = 0;
        for ch in raw.chars() {
            let ch_width = ch.width().unwrap_or(0);
            if used + ch_width > width && !line.is_empty() {
                out.push(std::mem::take(&mut line));
                used = 0;
            }
            line.push(ch);
            used += ch_width;
        }
        out.push(line);
    }
    out
}

/// Merge runs of equally styled chars into spans.
fn group_cells(cells: impl IntoIterator<Item = (char, Style)>) -> Vec<Span<'static>> {
    let mut runs: Vec<(String, Style)> = Vec::new();
    for (ch, style) in cells {
        match runs.last_mut() {
            Some((text, last)) if *last == style => text.push(ch),
            _ => runs.push((ch.to_string(), style)),
        }
    }
    runs.into_iter()
        .map(|(text, style)| Span::styled(text, style))
        .collect()
}

/// Calculate the width needed for line numbers.
#[allow(clippy::cast_possible_truncation)]
pub const fn line_number_width(total_lines: usize) -> u16 {
    if total_lines == 0 {
        1
    } else {
        // At most 20 digits
        (total_lines.ilog10() + 1) as u16
    }
}
