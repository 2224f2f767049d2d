use ropey::Rope;
use thiserror::Error;

use super::selection::Selection;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("change {from}..{to} is inverted")]
    Inverted { from: usize, to: usize },
    #[error("changes overlap at {at}")]
    Overlap { at: usize },
    #[error("change ends at {to} but the document has {len} chars")]
    OutOfBounds { to: usize, len: usize },
}

/// Replace the chars in `from..to` with `insert`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub from: usize,
    pub to: usize,
    pub insert: String,
}

impl Change {
    pub fn new(from: usize, to: usize, insert: impl Into<String>) -> Self {
        Self {
            from,
            to,
            insert: insert.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::new(at, at, text)
    }

    pub fn delete(from: usize, to: usize) -> Self {
        Self::new(from, to, String::new())
    }

    fn insert_len(&self) -> usize {
        self.insert.chars().count()
    }

    const fn is_noop(&self) -> bool {
        self.from == self.to && self.insert.is_empty()
    }
}

/// Which side of an insertion a position sticks to when mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Before,
    After,
}

/// A set of non-overlapping changes, all expressed in the coordinates of
/// the document before any of them is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    /// Sort and validate `changes`.
    ///
    /// Several insertions at one position are allowed and keep their
    /// relative order.
    ///
    /// # Errors
    /// Returns [`EditError::Inverted`] for a change with `from > to` and
    /// [`EditError::Overlap`] when two changes cover the same chars.
    pub fn new(mut changes: Vec<Change>) -> Result<Self, EditError> {
        if let Some(bad) = changes.iter().find(|c| c.from > c.to) {
            return Err(EditError::Inverted {
                from: bad.from,
                to: bad.to,
            });
        }
        changes.sort_by_key(|c| (c.from, c.to));
        for pair in changes.windows(2) {
            if pair[1].from < pair[0].to {
                return Err(EditError::Overlap { at: pair[1].from });
            }
        }
        Ok(Self { changes })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// A set holding one change. `from` and `to` are swapped if inverted.
    pub fn single(from: usize, to: usize, insert: impl Into<String>) -> Self {
        Self {
            changes: vec![Change::new(from.min(to), from.max(to), insert)],
        }
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// True when applying the set cannot change any text.
    pub fn is_empty(&self) -> bool {
        self.changes.iter().all(Change::is_noop)
    }

    /// Check every change fits in a document of `len` chars.
    ///
    /// # Errors
    /// Returns [`EditError::OutOfBounds`] for the first change past the end.
    pub fn check_bounds(&self, len: usize) -> Result<(), EditError> {
        match self.changes.iter().find(|c| c.to > len) {
            Some(c) => Err(EditError::OutOfBounds { to: c.to, len }),
            None => Ok(()),
        }
    }

    /// Apply to `rope`. Changes run back to front so earlier offsets stay valid.
    pub fn apply(&self, rope: &mut Rope) {
        for change in self.changes.iter().rev() {
            if change.from < change.to {
                rope.remove(change.from..change.to);
            }
            if !change.insert.is_empty() {
                rope.insert(change.from, &change.insert);
            }
        }
    }

    /// The set that undoes this one, given the document it applies to.
    pub fn invert(&self, before: &Rope) -> Self {
        let mut shift_in = 0;
        let mut shift_out = 0;
        let changes = self
            .changes
            .iter()
            .map(|c| {
                let from = c.from + shift_in - shift_out;
                let inserted = c.insert_len();
                shift_in += inserted;
                shift_out += c.to - c.from;
                Change::new(from, from + inserted, before.slice(c.from..c.to).to_string())
            })
            .collect();
        Self { changes }
    }

    /// Where `pos` ends up once the set is applied.
    ///
    /// Positions inside a replaced span collapse to its start (`Before`) or
    /// the end of the inserted text (`After`). A position exactly at an
    /// insertion point stays in front of the inserted text with `Before`.
    pub fn map_pos(&self, pos: usize, assoc: Assoc) -> usize {
        // End of the last change passed, in old and new coordinates
        let mut old_end = 0;
        let mut new_end = 0;
        for change in &self.changes {
            if pos < change.from {
                break;
            }
            let new_from = new_end + (change.from - old_end);
            let new_to = new_from + change.insert_len();
            let inside = pos < change.to;
            let at_insert = change.from == change.to && pos == change.from;
            if at_insert && assoc == Assoc::Before {
                return new_from;
            }
            if inside {
                return if pos == change.from || assoc == Assoc::Before {
                    new_from
                } else {
                    new_to
                };
            }
            old_end = change.to;
            new_end = new_to;
        }
        new_end + (pos - old_end)
    }

    /// Char count of a `len_before`-char document once the set is applied.
    pub fn len_after(&self, len_before: usize) -> usize {
        self.changes.iter().fold(len_before, |len, c| {
            len - (c.to - c.from) + c.insert_len()
        })
    }
}

/// One atomic update: text changes plus an optional explicit selection.
///
/// Without a selection the current one is mapped through the changes.
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    pub changes: ChangeSet,
    pub selection: Option<Selection>,
}

impl Transaction {
    pub const fn new(changes: ChangeSet) -> Self {
        Self {
            changes,
            selection: None,
        }
    }

    /// A transaction that only moves the selection.
    pub fn select(selection: Selection) -> Self {
        Self {
            changes: ChangeSet::empty(),
            selection: Some(selection),
        }
    }

    #[must_use]
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }
}

/// What caused a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// Typing and deletion keys.
    Input,
    /// A formatting command.
    Command,
    /// A full-buffer replacement from outside the editor.
    Replace,
    /// Undo or redo.
    History,
}

/// Sent to the change listener after every transaction that altered the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotice {
    pub text: String,
    pub origin: ChangeOrigin,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn applied(text: &str, changes: &ChangeSet) -> String {
        let mut rope = Rope::from_str(text);
        changes.apply(&mut rope);
        rope.to_string()
    }

    #[test]
    fn test_new_rejects_overlap() {
        let err = ChangeSet::new(vec![Change::delete(0, 4), Change::delete(2, 6)]).unwrap_err();
        assert_eq!(err, EditError::Overlap { at: 2 });
    }

    #[test]
    fn test_new_rejects_inverted_change() {
        let err = ChangeSet::new(vec![Change::new(5, 2, "")]).unwrap_err();
        assert_eq!(err, EditError::Inverted { from: 5, to: 2 });
    }

    #[test]
    fn test_new_allows_touching_changes() {
        let set = ChangeSet::new(vec![Change::delete(3, 5), Change::delete(0, 3)]).unwrap();
        assert_eq!(set.changes()[0].from, 0);
        assert_eq!(applied("abcdefg", &set), "fg");
    }

    #[test]
    fn test_apply_multiple_changes_uses_original_offsets() {
        let set = ChangeSet::new(vec![Change::insert(0, "**"), Change::insert(4, "**")]).unwrap();
        assert_eq!(applied("text rest", &set), "**text** rest");
    }

    #[test]
    fn test_apply_multibyte() {
        let set = ChangeSet::single(1, 2, "ö");
        assert_eq!(applied("héllo", &set), "höllo");
    }

    #[test]
    fn test_check_bounds() {
        let set = ChangeSet::single(2, 9, "");
        assert_eq!(set.check_bounds(5), Err(EditError::OutOfBounds { to: 9, len: 5 }));
        assert!(set.check_bounds(9).is_ok());
    }

    #[test]
    fn test_is_empty_for_noop_changes() {
        assert!(ChangeSet::empty().is_empty());
        assert!(ChangeSet::single(3, 3, "").is_empty());
        assert!(!ChangeSet::single(3, 3, "x").is_empty());
    }

    #[test]
    fn test_invert_restores_text() {
        let before = Rope::from_str("one two three");
        let set = ChangeSet::new(vec![Change::new(0, 3, "1"), Change::new(8, 13, "THREE!")])
            .unwrap();
        let mut rope = before.clone();
        set.apply(&mut rope);
        assert_eq!(rope.to_string(), "1 two THREE!");
        set.invert(&before).apply(&mut rope);
        assert_eq!(rope, before);
    }

    #[test]
    fn test_map_pos_around_insert() {
        let set = ChangeSet::single(2, 2, "xyz");
        assert_eq!(set.map_pos(1, Assoc::After), 1);
        assert_eq!(set.map_pos(2, Assoc::Before), 2);
        assert_eq!(set.map_pos(2, Assoc::After), 5);
        assert_eq!(set.map_pos(4, Assoc::Before), 7);
    }

    #[test]
    fn test_map_pos_inside_replacement() {
        let set = ChangeSet::single(2, 6, "ab");
        assert_eq!(set.map_pos(2, Assoc::After), 2);
        assert_eq!(set.map_pos(4, Assoc::Before), 2);
        assert_eq!(set.map_pos(4, Assoc::After), 4);
        assert_eq!(set.map_pos(6, Assoc::Before), 4);
        assert_eq!(set.map_pos(9, Assoc::Before), 7);
    }

    #[test]
    fn test_len_after() {
        let set = ChangeSet::new(vec![Change::delete(0, 2), Change::insert(5, "abc")]).unwrap();
        assert_eq!(set.len_after(10), 11);
    }

    fn change_set(len: usize) -> impl Strategy<Value = ChangeSet> {
        prop::collection::vec((0..=len, 0..=3usize, "[a-z\n]{0,4}"), 0..5).prop_map(
            move |mut raw| {
                let mut changes: Vec<Change> = Vec::new();
                let mut cursor = 0;
                raw.sort_by_key(|(at, _, _)| *at);
                for (at, del, insert) in raw {
                    let from = at.max(cursor);
                    if from > len {
                        break;
                    }
                    let to = (from + del).min(len);
                    changes.push(Change::new(from, to, insert));
                    cursor = to;
                }
                ChangeSet::new(changes).unwrap()
            },
        )
    }

    proptest! {
        #[test]
        fn prop_invert_round_trips(
            (text, set) in "[a-z \n]{0,24}".prop_flat_map(|t| {
                let len = t.chars().count();
                (Just(t), change_set(len))
            })
        ) {
            let before = Rope::from_str(&text);
            let mut rope = before.clone();
            set.apply(&mut rope);
            prop_assert_eq!(rope.len_chars(), set.len_after(before.len_chars()));
            set.invert(&before).apply(&mut rope);
            prop_assert_eq!(rope.to_string(), text);
        }

        #[test]
        fn prop_map_pos_is_monotonic_and_in_bounds(
            (text, set) in "[a-z \n]{0,24}".prop_flat_map(|t| {
                let len = t.chars().count();
                (Just(t), change_set(len))
            })
        ) {
            let len = text.chars().count();
            let new_len = set.len_after(len);
            let mut last = 0;
            for pos in 0..=len {
                let mapped = set.map_pos(pos, Assoc::Before);
                prop_assert!(mapped <= new_len);
                prop_assert!(mapped >= last);
                prop_assert!(set.map_pos(pos, Assoc::After) >= mapped);
                last = mapped;
            }
        }
    }
}
