use std::sync::mpsc::Sender;

use ropey::Rope;

use super::history::{History, HistoryEntry};
use super::selection::{Selection, SelectionRange};
use super::transaction::{
    Assoc, Change, ChangeNotice, ChangeOrigin, ChangeSet, Transaction,
};

/// Main cursor position as line and column, both zero-based and in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub line: usize,
    pub col: usize,
}

impl Cursor {
    pub const fn at(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// Direction for cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// The editing widget: a rope with a multi-range selection.
///
/// Every text change goes through [`EditorBuffer::dispatch`] as one
/// transaction. Text-changing transactions are recorded for undo and
/// reported to the change listener, if one is installed.
///
/// Typing and deletion act on every selection range. Movement acts on the
/// main range and collapses the selection to it.
pub struct EditorBuffer {
    rope: Rope,
    selection: Selection,
    /// Remembered column for vertical movement (sticky column).
    goal_col: Option<usize>,
    history: History,
    listener: Option<Sender<ChangeNotice>>,
    focused: bool,
    dirty: bool,
    applied: u64,
}

impl EditorBuffer {
    /// Create a new buffer from a string, cursor at the start.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            selection: Selection::cursor(0),
            goal_col: None,
            history: History::default(),
            listener: None,
            focused: false,
            dirty: false,
            applied: 0,
        }
    }

    /// Create an empty buffer.
    pub fn empty() -> Self {
        Self::from_text("")
    }

    /// Install the listener that receives a [`ChangeNotice`] per text change.
    pub fn set_change_listener(&mut self, listener: Sender<ChangeNotice>) {
        self.listener = Some(listener);
    }

    /// The full text content of the buffer.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub const fn rope(&self) -> &Rope {
        &self.rope
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Total number of lines in the buffer.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Get the content of a line (without trailing newline).
    pub fn line_at(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        let s = self.rope.line(line_idx).to_string();
        Some(s.trim_end_matches('\n').trim_end_matches('\r').to_string())
    }

    /// Length of a line in chars (without trailing newline).
    pub fn line_len(&self, line_idx: usize) -> usize {
        self.line_at(line_idx).map_or(0, |s| s.chars().count())
    }

    /// The main cursor (the head of the main range).
    pub fn cursor(&self) -> Cursor {
        self.line_col(self.selection.main().head)
    }

    /// Whether the buffer has been modified since creation or last save.
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the buffer as clean (e.g., after saving).
    pub const fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub const fn focus(&mut self) {
        self.focused = true;
    }

    pub const fn blur(&mut self) {
        self.focused = false;
    }

    pub const fn has_focus(&self) -> bool {
        self.focused
    }

    /// Number of text-changing transactions applied so far.
    pub const fn transactions_applied(&self) -> u64 {
        self.applied
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Apply `tx` atomically.
    ///
    /// Returns `true` when the text changed. A transaction with no text
    /// changes only moves the selection; one whose changes do not fit the
    /// document is rejected and leaves the buffer untouched.
    pub fn dispatch(&mut self, tx: Transaction, origin: ChangeOrigin) -> bool {
        let Transaction { changes, selection } = tx;
        if let Err(err) = changes.check_bounds(self.rope.len_chars()) {
            tracing::warn!(%err, ?origin, "rejected transaction");
            return false;
        }
        self.goal_col = None;

        if changes.is_empty() {
            if let Some(selection) = selection {
                self.selection = selection.clamp(self.rope.len_chars());
            }
            return false;
        }

        let inverse = changes.invert(&self.rope);
        let selection_before = self.selection.clone();
        changes.apply(&mut self.rope);
        let len = self.rope.len_chars();
        self.selection = selection.map_or_else(
            || selection_before.map(&changes).clamp(len),
            |s| s.clamp(len),
        );

        if origin != ChangeOrigin::History {
            self.history.record(HistoryEntry {
                changes,
                inverse,
                selection_before,
                selection_after: self.selection.clone(),
            });
        }
        self.dirty = true;
        self.applied += 1;
        self.notify(origin);
        true
    }

    /// Replace the whole text in one undoable transaction.
    ///
    /// Selection endpoints are clamped to the new length so the cursor
    /// stays near where it was, and never land inside a `\r\n` pair. Returns `false` without dispatching when
    /// `text` already equals the buffer.
    pub fn replace_all(&mut self, text: &str) -> bool {
        if self.rope == text {
            return false;
        }
        let new_len = text.chars().count();
        tracing::debug!(old = self.rope.len_chars(), new = new_len, "replacing editor text");
        let clamped = self.selection.clamp(new_len);
        let new_rope = Rope::from_str(text);
        let ranges = clamped
            .ranges()
            .iter()
            .map(|r| {
                SelectionRange::new(
                    outside_line_break(&new_rope, r.anchor),
                    outside_line_break(&new_rope, r.head),
                )
            })
            .collect();
        let selection = Selection::new(ranges, clamped.main_index());
        let tx = Transaction::new(ChangeSet::single(0, self.rope.len_chars(), text))
            .with_selection(selection);
        self.dispatch(tx, ChangeOrigin::Replace)
    }

    /// Insert a character at every selection range.
    pub fn insert_char(&mut self, ch: char) {
        let mut tmp = [0; 4];
        self.insert_str(ch.encode_utf8(&mut tmp));
    }

    /// Replace every selection range with `s`, leaving a cursor after each insert.
    pub fn insert_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        let changes: Vec<Change> = self
            .selection
            .ranges()
            .iter()
            .map(|r| Change::new(r.from(), r.to(), s))
            .collect();
        self.dispatch_edits(changes, Assoc::After);
    }

    /// Split the current line at the cursor (Enter key).
    pub fn split_line(&mut self) {
        self.insert_str("\n");
    }

    /// Delete the selection, or the character before each cursor (Backspace).
    ///
    /// Returns `true` if anything was deleted.
    pub fn delete_back(&mut self) -> bool {
        let changes: Vec<Change> = self
            .selection
            .ranges()
            .iter()
            .filter_map(|r| {
                if !r.is_empty() {
                    Some(Change::delete(r.from(), r.to()))
                } else if r.head > 0 {
                    Some(Change::delete(r.head - 1, r.head))
                } else {
                    None
                }
            })
            .collect();
        self.dispatch_edits(changes, Assoc::Before)
    }

    /// Delete the selection, or the character at each cursor (Delete key).
    ///
    /// Returns `true` if anything was deleted.
    pub fn delete_forward(&mut self) -> bool {
        let len = self.rope.len_chars();
        let changes: Vec<Change> = self
            .selection
            .ranges()
            .iter()
            .filter_map(|r| {
                if !r.is_empty() {
                    Some(Change::delete(r.from(), r.to()))
                } else if r.head < len {
                    Some(Change::delete(r.head, r.head + 1))
                } else {
                    None
                }
            })
            .collect();
        self.dispatch_edits(changes, Assoc::Before)
    }

    /// Undo the last recorded edit. Returns `true` if there was one.
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.history.undo() else {
            return false;
        };
        let tx = Transaction::new(entry.inverse.clone())
            .with_selection(entry.selection_before.clone());
        self.dispatch(tx, ChangeOrigin::History)
    }

    /// Redo the last undone edit. Returns `true` if there was one.
    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.history.redo() else {
            return false;
        };
        let tx = Transaction::new(entry.changes.clone())
            .with_selection(entry.selection_after.clone());
        self.dispatch(tx, ChangeOrigin::History)
    }

    /// Move the cursor in the given direction.
    ///
    /// A non-empty selection collapses to its edge on Left/Right.
    pub fn move_cursor(&mut self, direction: Direction) {
        let main = self.selection.main();
        let pos = match direction {
            Direction::Left if !main.is_empty() => main.from(),
            Direction::Right if !main.is_empty() => main.to(),
            _ => self.step(main.head, direction),
        };
        self.step_head(pos, direction, false);
    }

    /// Move the main head, keeping its anchor (Shift+arrow).
    pub fn extend_selection(&mut self, direction: Direction) {
        let head = self.step(self.selection.main().head, direction);
        self.step_head(head, direction, true);
    }

    /// Move cursor to the beginning of the line (Home).
    pub fn move_home(&mut self) {
        let line = self.cursor().line;
        self.set_head(self.rope.line_to_char(line), false);
    }

    /// Move cursor to the end of the line (End).
    pub fn move_end(&mut self) {
        let line = self.cursor().line;
        self.set_head(self.rope.line_to_char(line) + self.line_len(line), false);
    }

    /// Move cursor one word to the left (Ctrl+Left).
    pub fn move_word_left(&mut self) {
        let Cursor { line, col } = self.cursor();
        if col == 0 {
            if line > 0 {
                self.move_to(line - 1, self.line_len(line - 1));
            }
            return;
        }

        let chars: Vec<char> = self.line_at(line).unwrap_or_default().chars().collect();
        let mut end = col.min(chars.len());
        while end > 0 && chars[end - 1].is_whitespace() {
            end -= 1;
        }
        // Start of previous word
        let start = chars[..end]
            .iter()
            .rposition(|&c| !is_word_char(c))
            .map_or(0, |i| i + 1);
        self.move_to(line, start);
    }

    /// Move cursor one word to the right (Ctrl+Right).
    pub fn move_word_right(&mut self) {
        let Cursor { line, col } = self.cursor();
        let line_len = self.line_len(line);
        if col >= line_len {
            if line + 1 < self.line_count() {
                self.move_to(line + 1, 0);
            }
            return;
        }

        let chars: Vec<char> = self.line_at(line).unwrap_or_default().chars().collect();
        let after = &chars[col..];
        let word_end = after
            .iter()
            .position(|&c| !is_word_char(c))
            .unwrap_or(after.len());
        // Skip whitespace/punctuation after word
        let rest = &after[word_end..];
        let gap_end = rest
            .iter()
            .position(|&c| is_word_char(c))
            .unwrap_or(rest.len());
        self.move_to(line, col + word_end + gap_end);
    }

    /// Move cursor to a specific line and column, clamped to the text.
    pub fn move_to(&mut self, line: usize, col: usize) {
        let line = line.min(self.line_count().saturating_sub(1));
        let pos = self.rope.line_to_char(line) + col.min(self.line_len(line));
        self.set_head(pos, false);
    }

    /// Move cursor to the start of the buffer (Ctrl+Home).
    pub fn move_to_start(&mut self) {
        self.set_head(0, false);
    }

    /// Move cursor to the end of the buffer (Ctrl+End).
    pub fn move_to_end(&mut self) {
        self.set_head(self.rope.len_chars(), false);
    }

    pub fn select_all(&mut self) {
        self.selection = Selection::single(0, self.rope.len_chars());
        self.goal_col = None;
    }

    // --- Private helpers ---

    fn dispatch_edits(&mut self, changes: Vec<Change>, assoc: Assoc) -> bool {
        if changes.is_empty() {
            return false;
        }
        let changes = match ChangeSet::new(changes) {
            Ok(changes) => changes,
            Err(err) => {
                tracing::warn!(%err, "discarding invalid edit");
                return false;
            }
        };
        let cursors = changes
            .changes()
            .iter()
            .map(|c| {
                let pos = if assoc == Assoc::After { c.to } else { c.from };
                SelectionRange::cursor(changes.map_pos(pos, assoc))
            })
            .collect();
        let main = self.selection.main_index();
        let tx = Transaction::new(changes).with_selection(Selection::new(cursors, main));
        self.dispatch(tx, ChangeOrigin::Input)
    }

    fn notify(&mut self, origin: ChangeOrigin) {
        let Some(listener) = &self.listener else {
            return;
        };
        let notice = ChangeNotice {
            text: self.rope.to_string(),
            origin,
        };
        if listener.send(notice).is_err() {
            tracing::debug!("change listener closed");
            self.listener = None;
        }
    }

    fn line_col(&self, pos: usize) -> Cursor {
        let pos = pos.min(self.rope.len_chars());
        let line = self.rope.char_to_line(pos);
        Cursor::at(line, pos - self.rope.line_to_char(line))
    }

    /// Position one step from `pos`, honouring the goal column vertically.
    fn step(&mut self, pos: usize, direction: Direction) -> usize {
        let Cursor { line, col } = self.line_col(pos);
        match direction {
            Direction::Left => {
                if col > 0 {
                    pos - 1
                } else if line > 0 {
                    self.rope.line_to_char(line - 1) + self.line_len(line - 1)
                } else {
                    pos
                }
            }
            Direction::Right => {
                if col < self.line_len(line) {
                    pos + 1
                } else if line + 1 < self.line_count() {
                    self.rope.line_to_char(line + 1)
                } else {
                    pos
                }
            }
            Direction::Up | Direction::Down => {
                let target = if direction == Direction::Up {
                    line.checked_sub(1)
                } else {
                    Some(line + 1).filter(|&l| l < self.line_count())
                };
                let Some(target) = target else {
                    return pos;
                };
                let goal = *self.goal_col.get_or_insert(col);
                self.rope.line_to_char(target) + goal.min(self.line_len(target))
            }
        }
    }

    fn set_head(&mut self, head: usize, extend: bool) {
        let anchor = if extend {
            self.selection.main().anchor
        } else {
            head
        };
        self.selection = Selection::single(anchor, head);
        self.goal_col = None;
    }

    /// Like [`Self::set_head`], keeping the goal column across vertical steps.
    fn step_head(&mut self, head: usize, direction: Direction, extend: bool) {
        let goal = match direction {
            Direction::Up | Direction::Down => self.goal_col,
            Direction::Left | Direction::Right => None,
        };
        self.set_head(head, extend);
        self.goal_col = goal;
    }
}

/// `pos`, moved back onto the `\r` when it would split a `\r\n` pair.
fn outside_line_break(rope: &Rope, pos: usize) -> usize {
    if pos > 0 && pos < rope.len_chars() && rope.char(pos - 1) == '\r' && rope.char(pos) == '\n' {
        pos - 1
    } else {
        pos
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl std::fmt::Debug for EditorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorBuffer")
            .field(
                "rope",
                &format_args!("Rope({} lines)", self.rope.len_lines()),
            )
            .field("selection", &self.selection)
            .field("focused", &self.focused)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}
