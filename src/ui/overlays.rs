use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph};

use crate::app::{FORMAT_KEYS, Model, Prompt, PromptKind, format_command_for_key};
use crate::commands::FormatCommand;

pub fn render_prompt_overlay(prompt: &Prompt, frame: &mut Frame, area: Rect) {
    let popup = centered_popup_rect(area.width.saturating_sub(16).max(44), 7, area);
    let (title, label, hint) = match &prompt.kind {
        PromptKind::Upload => (
            "Upload Markdown file",
            "Path to a .md file:",
            "Enter loads \u{2502} Esc cancels",
        ),
        PromptKind::Url(FormatCommand::Image { .. }) => (
            "Image URL",
            "Image address:",
            "Enter inserts \u{2502} blank or Esc uses a placeholder",
        ),
        PromptKind::Url(_) => (
            "Link URL",
            "Link address:",
            "Enter inserts \u{2502} blank or Esc uses a placeholder",
        ),
    };

    let lines = vec![
        Line::raw(label),
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Yellow)),
            Span::raw(prompt.input.clone()),
            Span::styled(" ", Style::default().bg(Color::White)),
        ]),
        Line::styled(hint, Style::default().fg(Color::Indexed(245))),
    ];

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .padding(Padding::horizontal(1))
        .style(Style::default().bg(Color::Black).fg(Color::White));
    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

pub fn render_help_overlay(model: &Model, frame: &mut Frame, area: Rect) {
    let popup_width = area.width.saturating_sub(12).max(48);
    let popup_height = area.height.saturating_sub(4).max(12);
    let popup = centered_popup_rect(popup_width, popup_height, area);

    let path_or = |path: Option<&std::path::PathBuf>, missing: &str| {
        path.map_or_else(|| missing.to_string(), |p| p.display().to_string())
    };
    let global_cfg = path_or(model.config_global_path.as_ref(), "<unknown>");
    let local_cfg = path_or(model.config_local_path.as_ref(), "<none>");
    let store = path_or(model.store_path.as_ref(), "<memory>");

    let section_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let dim_style = Style::default().fg(Color::Indexed(245));

    let mut all_lines: Vec<Line> = Vec::new();

    all_lines.push(Line::styled("Editing", section_style));
    all_lines.push(Line::raw("  Arrows, Home/End    Move"));
    all_lines.push(Line::raw("  Shift+Arrows        Extend selection"));
    all_lines.push(Line::raw("  Ctrl+Left/Right     Word movement"));
    all_lines.push(Line::raw("  Ctrl+Home/End       Document start / end"));
    all_lines.push(Line::raw("  Ctrl-a              Select all"));
    all_lines.push(Line::raw("  Ctrl-z / Ctrl-y     Undo / redo"));
    all_lines.push(Line::raw(""));

    all_lines.push(Line::styled("Formatting", section_style));
    for key in FORMAT_KEYS {
        if let Some(cmd) = format_command_for_key(key, &model.code_lang) {
            all_lines.push(Line::raw(format!(
                "  Alt-{:<15}{}",
                key.to_ascii_uppercase(),
                cmd.label()
            )));
        }
    }
    all_lines.push(Line::raw(""));

    all_lines.push(Line::styled("Files and API", section_style));
    all_lines.push(Line::raw("  Ctrl-o              Upload a .md file"));
    all_lines.push(Line::raw("  Ctrl-s              Download markdown-note.md"));
    all_lines.push(Line::raw("  Ctrl-r              Save to API"));
    all_lines.push(Line::raw("  Ctrl-l              Load from API"));
    all_lines.push(Line::raw(""));

    all_lines.push(Line::styled("View", section_style));
    all_lines.push(Line::raw("  Tab                 Switch pane focus"));
    all_lines.push(Line::raw("  F2                  Hide / show editor"));
    all_lines.push(Line::raw("  j/k, PageUp/Down    Scroll preview"));
    all_lines.push(Line::raw("  F1                  Toggle help"));
    all_lines.push(Line::raw("  Ctrl-q              Quit"));
    all_lines.push(Line::raw(""));

    all_lines.push(Line::styled("Config", section_style));
    all_lines.push(Line::raw(format!("  Global: {global_cfg}")));
    all_lines.push(Line::raw(format!("  Local override: {local_cfg}")));
    all_lines.push(Line::raw(format!("  Store: {store}")));

    let block = Block::default()
        .title("Help")
        .borders(Borders::ALL)
        .padding(Padding::uniform(1))
        .style(Style::default().bg(Color::Black).fg(Color::White));

    frame.render_widget(Clear, popup);
    frame.render_widget(block, popup);

    // Inner area: border(1) + padding(1) on each side = 4
    let inner = Rect::new(
        popup.x + 2,
        popup.y + 2,
        popup.width.saturating_sub(4),
        popup.height.saturating_sub(4),
    );

    // Reserve 1 row at bottom for footer hint
    let content_height_u16 = inner.height.saturating_sub(1);
    let content_height = content_height_u16 as usize;
    let max_scroll = all_lines.len().saturating_sub(content_height);
    let scroll = model.help_scroll_offset.min(max_scroll);

    let visible: Vec<Line> = all_lines
        .into_iter()
        .skip(scroll)
        .take(content_height)
        .collect();
    let content_area = Rect::new(inner.x, inner.y, inner.width, content_height_u16);
    frame.render_widget(Paragraph::new(visible), content_area);

    let footer_area = Rect::new(inner.x, inner.y + content_height_u16, inner.width, 1);
    let footer = Line::styled("j/k scroll \u{2502} Esc closes", dim_style);
    frame.render_widget(Paragraph::new(footer), footer_area);
}

fn centered_popup_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w) / 2);
    let y = area.y + (area.height.saturating_sub(h) / 2);
    Rect::new(x, y, w, h)
}
