//! Markdown formatting commands.
//!
//! Each command is planned as a pure function of the document and the
//! current selection ([`plan`]) and applied to the editor as a single
//! transaction ([`apply`]). Commands act on every selection range.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use ropey::Rope;

use crate::editor::{
    Assoc, Change, ChangeOrigin, ChangeSet, EditError, EditorBuffer, Selection, SelectionRange,
    Transaction,
};

/// Link target used when none (or a blank one) is given.
pub const DEFAULT_LINK_URL: &str = "https://example.com";
/// Image source used when none (or a blank one) is given.
pub const DEFAULT_IMAGE_URL: &str = "https://placehold.co/600x300/png";

const TEXT_PLACEHOLDER: &str = "text";
const CODE_PLACEHOLDER: &str = "code";
const LINK_PLACEHOLDER: &str = "link text";
const ALT_PLACEHOLDER: &str = "alt text";

/// Language tag for new code blocks unless configured otherwise.
pub const DEFAULT_CODE_LANG: &str = "js";

/// Leading whitespace plus an optional `#` marker and its trailing spaces.
static HEADING_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(#{1,6}\s+)?").expect("heading prefix pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    H1,
    H2,
}

impl HeadingLevel {
    const fn marker(self) -> &'static str {
        match self {
            Self::H1 => "# ",
            Self::H2 => "## ",
        }
    }
}

/// A toolbar formatting action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatCommand {
    Bold,
    Italic,
    InlineCode,
    Heading(HeadingLevel),
    Quote,
    BulletList,
    /// Every touched line gets `1. `; lines are not renumbered.
    NumberedList,
    CodeBlock {
        language: String,
    },
    Link {
        url: Option<String>,
    },
    Image {
        url: Option<String>,
    },
}

impl FormatCommand {
    /// True for commands that ask the user for a URL before running.
    pub const fn needs_url(&self) -> bool {
        matches!(self, Self::Link { .. } | Self::Image { .. })
    }

    /// The same command with its URL resolved; `None` means declined.
    #[must_use]
    pub fn with_url(self, url: Option<String>) -> Self {
        match self {
            Self::Link { .. } => Self::Link { url },
            Self::Image { .. } => Self::Image { url },
            other => other,
        }
    }

    /// Short name for logs and status messages.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::InlineCode => "inline code",
            Self::Heading(HeadingLevel::H1) => "heading 1",
            Self::Heading(HeadingLevel::H2) => "heading 2",
            Self::Quote => "quote",
            Self::BulletList => "bullet list",
            Self::NumberedList => "numbered list",
            Self::CodeBlock { .. } => "code block",
            Self::Link { .. } => "link",
            Self::Image { .. } => "image",
        }
    }
}

/// Changes plus the selection to leave behind.
#[derive(Debug, Clone)]
pub struct EditPlan {
    pub changes: ChangeSet,
    pub selection: Selection,
}

/// Plan `cmd` against `doc` with the given selection.
///
/// # Errors
/// Returns an [`EditError`] if the selection does not fit the document.
pub fn plan(cmd: &FormatCommand, doc: &Rope, selection: &Selection) -> Result<EditPlan, EditError> {
    let len = doc.len_chars();
    if let Some(range) = selection.ranges().iter().find(|r| r.to() > len) {
        return Err(EditError::OutOfBounds { to: range.to(), len });
    }
    match cmd {
        FormatCommand::Bold => wrap(doc, selection, &Wrap::inline("**", "**", TEXT_PLACEHOLDER)),
        FormatCommand::Italic => wrap(doc, selection, &Wrap::inline("_", "_", TEXT_PLACEHOLDER)),
        FormatCommand::InlineCode => {
            wrap(doc, selection, &Wrap::inline("`", "`", TEXT_PLACEHOLDER))
        }
        FormatCommand::Link { url } => {
            let close = format!("]({})", resolve_url(url.as_deref(), DEFAULT_LINK_URL));
            wrap(doc, selection, &Wrap::inline("[", &close, LINK_PLACEHOLDER))
        }
        FormatCommand::Image { url } => {
            let close = format!("]({})", resolve_url(url.as_deref(), DEFAULT_IMAGE_URL));
            wrap(doc, selection, &Wrap::inline("![", &close, ALT_PLACEHOLDER))
        }
        FormatCommand::CodeBlock { language } => {
            let open = format!("```{}\n", language.trim());
            let wrap_shape = Wrap {
                open: &open,
                close: "\n```",
                placeholder: CODE_PLACEHOLDER,
                own_lines: true,
            };
            wrap(doc, selection, &wrap_shape)
        }
        FormatCommand::Heading(level) => edit_lines(doc, selection, |text| {
            let strip = HEADING_PREFIX.find(text).map_or(0, |m| text[..m.end()].chars().count());
            (strip, level.marker())
        }),
        FormatCommand::Quote => edit_lines(doc, selection, |_| (0, "> ")),
        FormatCommand::BulletList => edit_lines(doc, selection, |_| (0, "- ")),
        FormatCommand::NumberedList => edit_lines(doc, selection, |_| (0, "1. ")),
    }
}

/// Apply `cmd` to the mounted editor, if any, and give it focus.
///
/// Returns `true` when the text changed. Without an editor this is a
/// silent no-op.
pub fn apply(cmd: &FormatCommand, editor: Option<&mut EditorBuffer>) -> bool {
    let Some(editor) = editor else {
        tracing::debug!(command = cmd.label(), "no editor mounted, command ignored");
        return false;
    };
    let applied = match plan(cmd, editor.rope(), editor.selection()) {
        Ok(plan) => editor.dispatch(
            Transaction::new(plan.changes).with_selection(plan.selection),
            ChangeOrigin::Command,
        ),
        Err(err) => {
            tracing::warn!(command = cmd.label(), %err, "formatting command failed");
            false
        }
    };
    editor.focus();
    applied
}

fn resolve_url<'a>(url: Option<&'a str>, fallback: &'a str) -> &'a str {
    url.map(str::trim).filter(|u| !u.is_empty()).unwrap_or(fallback)
}

struct Wrap<'a> {
    open: &'a str,
    close: &'a str,
    placeholder: &'a str,
    /// Put the delimiters on lines of their own.
    own_lines: bool,
}

impl<'a> Wrap<'a> {
    const fn inline(open: &'a str, close: &'a str, placeholder: &'a str) -> Self {
        Self {
            open,
            close,
            placeholder,
            own_lines: false,
        }
    }
}

/// Surround every range with delimiters, selecting the wrapped content.
fn wrap(doc: &Rope, selection: &Selection, shape: &Wrap<'_>) -> Result<EditPlan, EditError> {
    let mut changes = Vec::with_capacity(selection.ranges().len());
    let mut ranges = Vec::with_capacity(selection.ranges().len());
    // Growth of the document from earlier ranges, in chars
    let mut grown = 0;
    let mut shrunk = 0;

    for range in selection.ranges() {
        let (from, to) = (range.from(), range.to());
        let content = if range.is_empty() {
            shape.placeholder.to_string()
        } else {
            doc.slice(from..to).to_string()
        };
        let lead = if shape.own_lines && !at_line_start(doc, from) { "\n" } else { "" };
        let trail = if shape.own_lines && !at_line_end(doc, to) { "\n" } else { "" };
        let open_len = lead.chars().count() + shape.open.chars().count();
        let content_len = content.chars().count();
        let insert = format!("{lead}{}{content}{}{trail}", shape.open, shape.close);
        let insert_len = insert.chars().count();

        let start = from + grown - shrunk + open_len;
        ranges.push(SelectionRange::new(start, start + content_len));
        grown += insert_len;
        shrunk += to - from;
        changes.push(Change::new(from, to, insert));
    }

    Ok(EditPlan {
        changes: ChangeSet::new(changes)?,
        selection: Selection::new(ranges, selection.main_index()),
    })
}

/// Replace the first `strip` chars of every touched line with a prefix.
///
/// `line_edit` gets the line text without its line break and returns
/// how many leading chars to drop and what to insert. A line touched by
/// several ranges is edited once.
fn edit_lines<F>(doc: &Rope, selection: &Selection, line_edit: F) -> Result<EditPlan, EditError>
where
    F: Fn(&str) -> (usize, &'static str),
{
    let lines: BTreeSet<usize> = selection
        .ranges()
        .iter()
        .flat_map(|r| doc.char_to_line(r.from())..=doc.char_to_line(r.to()))
        .collect();

    let mut changes = Vec::with_capacity(lines.len());
    // Line starts whose old prefix is replaced, not just extended
    let mut replaced_starts = Vec::new();
    for line in lines {
        let start = doc.line_to_char(line);
        let text = doc.line(line).to_string();
        let text = text.trim_end_matches(['\n', '\r']);
        let (strip, prefix) = line_edit(text);
        if strip > 0 {
            replaced_starts.push(start);
        }
        changes.push(Change::new(start, start + strip, prefix));
    }
    let changes = ChangeSet::new(changes)?;

    // Endpoints inside an old prefix land after the new one
    let map = |pos: usize| {
        let mapped = changes.map_pos(pos, Assoc::After);
        if replaced_starts.contains(&pos) {
            changes
                .changes()
                .iter()
                .find(|c| c.from == pos)
                .map_or(mapped, |c| mapped + c.insert.chars().count())
        } else {
            mapped
        }
    };
    let ranges = selection
        .ranges()
        .iter()
        .map(|r| SelectionRange::new(map(r.anchor), map(r.head)))
        .collect();
    let selection = Selection::new(ranges, selection.main_index());

    Ok(EditPlan {
        changes,
        selection,
    })
}

fn at_line_start(doc: &Rope, pos: usize) -> bool {
    pos == 0 || doc.char(pos - 1) == '\n'
}

fn at_line_end(doc: &Rope, pos: usize) -> bool {
    pos >= doc.len_chars() || matches!(doc.char(pos), '\n' | '\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, selection: Selection, cmd: &FormatCommand) -> (String, Selection) {
        let mut buf = EditorBuffer::from_text(text);
        buf.dispatch(Transaction::select(selection), ChangeOrigin::Input);
        assert!(apply(cmd, Some(&mut buf)));
        (buf.text(), buf.selection().clone())
    }

    fn selected(text: &str, sel: &Selection) -> String {
        let range = sel.main();
        text.chars().skip(range.from()).take(range.len()).collect()
    }

    // --- Inline wraps ---

    #[test]
    fn test_bold_wraps_selection_and_keeps_it_selected() {
        let (text, sel) = run("some text here", Selection::single(5, 9), &FormatCommand::Bold);
        assert_eq!(text, "some **text** here");
        assert_eq!(sel.main(), SelectionRange::new(7, 11));
        assert_eq!(selected(&text, &sel), "text");
    }

    #[test]
    fn test_bold_on_cursor_inserts_selected_placeholder() {
        let (text, sel) = run("ab", Selection::cursor(1), &FormatCommand::Bold);
        assert_eq!(text, "a**text**b");
        assert_eq!(selected(&text, &sel), "text");
    }

    #[test]
    fn test_italic_and_inline_code_delimiters() {
        let (text, _) = run("x", Selection::single(0, 1), &FormatCommand::Italic);
        assert_eq!(text, "_x_");
        let (text, _) = run("x", Selection::single(0, 1), &FormatCommand::InlineCode);
        assert_eq!(text, "`x`");
    }

    #[test]
    fn test_wrap_every_range_with_shifted_selection() {
        let sel = Selection::new(
            vec![SelectionRange::new(0, 1), SelectionRange::new(2, 3)],
            1,
        );
        let (text, sel) = run("a b", sel, &FormatCommand::Bold);
        assert_eq!(text, "**a** **b**");
        assert_eq!(
            sel.ranges(),
            &[SelectionRange::new(2, 3), SelectionRange::new(8, 9)]
        );
        assert_eq!(sel.main_index(), 1);
    }

    #[test]
    fn test_wrap_multibyte_selection() {
        let (text, sel) = run("héllo wörld", Selection::single(6, 11), &FormatCommand::Bold);
        assert_eq!(text, "héllo **wörld**");
        assert_eq!(selected(&text, &sel), "wörld");
    }

    // --- Links and images ---

    #[test]
    fn test_link_with_url() {
        let cmd = FormatCommand::Link {
            url: Some("https://rust-lang.org".to_string()),
        };
        let (text, sel) = run("see docs", Selection::single(4, 8), &cmd);
        assert_eq!(text, "see [docs](https://rust-lang.org)");
        assert_eq!(selected(&text, &sel), "docs");
    }

    #[test]
    fn test_link_declined_uses_default_url_and_placeholder() {
        let (text, sel) = run("", Selection::cursor(0), &FormatCommand::Link { url: None });
        assert_eq!(text, "[link text](https://example.com)");
        assert_eq!(selected(&text, &sel), "link text");
    }

    #[test]
    fn test_image_blank_url_uses_default() {
        let cmd = FormatCommand::Image {
            url: Some("   ".to_string()),
        };
        let (text, _) = run("", Selection::cursor(0), &cmd);
        assert_eq!(text, "![alt text](https://placehold.co/600x300/png)");
    }

    #[test]
    fn test_with_url_only_touches_url_commands() {
        let link = FormatCommand::Link { url: None }.with_url(Some("u".to_string()));
        assert_eq!(
            link,
            FormatCommand::Link {
                url: Some("u".to_string())
            }
        );
        assert_eq!(FormatCommand::Bold.with_url(Some("u".to_string())), FormatCommand::Bold);
        assert!(link.needs_url());
        assert!(!FormatCommand::Quote.needs_url());
    }

    // --- Headings ---

    #[test]
    fn test_heading_replaces_existing_marker() {
        let (text, _) = run("## Old", Selection::cursor(3), &FormatCommand::Heading(HeadingLevel::H1));
        assert_eq!(text, "# Old");
    }

    #[test]
    fn test_heading_on_plain_line() {
        let (text, sel) = run("Title\nbody", Selection::cursor(2), &FormatCommand::Heading(HeadingLevel::H2));
        assert_eq!(text, "## Title\nbody");
        assert_eq!(sel.main(), SelectionRange::cursor(5));
    }

    #[test]
    fn test_heading_strips_leading_whitespace() {
        let (text, _) = run("   ###  Deep", Selection::cursor(0), &FormatCommand::Heading(HeadingLevel::H1));
        assert_eq!(text, "# Deep");
    }

    #[test]
    fn test_heading_cursor_in_old_marker_lands_after_new_marker() {
        let (text, sel) = run("### Old", Selection::cursor(1), &FormatCommand::Heading(HeadingLevel::H2));
        assert_eq!(text, "## Old");
        assert_eq!(sel.main(), SelectionRange::cursor(3));
    }

    #[test]
    fn test_heading_keeps_empty_line_break() {
        let (text, _) = run("\nnext", Selection::cursor(0), &FormatCommand::Heading(HeadingLevel::H1));
        assert_eq!(text, "# \nnext");
    }

    #[test]
    fn test_heading_spans_every_selected_line() {
        let (text, _) = run("a\n# b\nc", Selection::single(0, 6), &FormatCommand::Heading(HeadingLevel::H2));
        assert_eq!(text, "## a\n## b\n## c");
    }

    // --- Line prefixes ---

    #[test]
    fn test_quote_prefixes_each_touched_line() {
        let (text, sel) = run("one\ntwo\nthree", Selection::single(1, 5), &FormatCommand::Quote);
        assert_eq!(text, "> one\n> two\nthree");
        assert_eq!(sel.main(), SelectionRange::new(3, 9));
    }

    #[test]
    fn test_numbered_list_repeats_one() {
        let (text, _) = run("a\nb\nc", Selection::single(0, 5), &FormatCommand::NumberedList);
        assert_eq!(text, "1. a\n1. b\n1. c");
    }

    #[test]
    fn test_line_touched_by_two_ranges_is_prefixed_once() {
        let sel = Selection::new(
            vec![SelectionRange::cursor(0), SelectionRange::cursor(2), SelectionRange::cursor(5)],
            0,
        );
        let (text, _) = run("abc\nde", sel, &FormatCommand::BulletList);
        assert_eq!(text, "- abc\n- de");
    }

    // --- Code blocks ---

    #[test]
    fn test_code_block_wraps_whole_line() {
        let cmd = FormatCommand::CodeBlock {
            language: "rust".to_string(),
        };
        let (text, sel) = run("let x = 1;", Selection::single(0, 10), &cmd);
        assert_eq!(text, "```rust\nlet x = 1;\n```");
        assert_eq!(selected(&text, &sel), "let x = 1;");
    }

    #[test]
    fn test_code_block_inside_line_puts_fences_on_own_lines() {
        let cmd = FormatCommand::CodeBlock {
            language: String::new(),
        };
        let (text, sel) = run("before mid after", Selection::single(7, 10), &cmd);
        assert_eq!(text, "before \n```\nmid\n```\n after");
        assert_eq!(selected(&text, &sel), "mid");
    }

    #[test]
    fn test_code_block_placeholder() {
        let cmd = FormatCommand::CodeBlock {
            language: "js".to_string(),
        };
        let (text, sel) = run("", Selection::cursor(0), &cmd);
        assert_eq!(text, "```js\ncode\n```");
        assert_eq!(selected(&text, &sel), "code");
    }

    // --- Widget lifecycle ---

    #[test]
    fn test_apply_without_editor_is_noop() {
        assert!(!apply(&FormatCommand::Bold, None));
    }

    #[test]
    fn test_apply_focuses_editor_and_is_one_transaction() {
        let mut buf = EditorBuffer::from_text("a\nb");
        buf.select_all();
        assert!(!buf.has_focus());
        apply(&FormatCommand::Quote, Some(&mut buf));
        assert!(buf.has_focus());
        assert_eq!(buf.transactions_applied(), 1);
        assert!(buf.undo());
        assert_eq!(buf.text(), "a\nb");
    }

    #[test]
    fn test_plan_rejects_selection_past_end() {
        let doc = Rope::from_str("ab");
        let err = plan(&FormatCommand::Bold, &doc, &Selection::cursor(9)).unwrap_err();
        assert_eq!(err, EditError::OutOfBounds { to: 9, len: 2 });
    }
}
