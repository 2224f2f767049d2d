use super::transaction::{Assoc, ChangeSet};

/// One selected span. `anchor` stays put while `head` moves.
///
/// Both ends are char offsets into the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange {
    pub anchor: usize,
    pub head: usize,
}

impl SelectionRange {
    pub const fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// An empty range (a plain cursor) at `pos`.
    pub const fn cursor(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    /// Lower end of the range.
    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// Upper end of the range.
    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub const fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    pub fn len(&self) -> usize {
        self.to() - self.from()
    }

    fn map(self, changes: &ChangeSet) -> Self {
        if self.is_empty() {
            let pos = changes.map_pos(self.head, Assoc::After);
            return Self::cursor(pos);
        }
        // Inserts at either edge land outside the range
        let from = changes.map_pos(self.from(), Assoc::After);
        let to = changes.map_pos(self.to(), Assoc::Before).max(from);
        if self.anchor <= self.head {
            Self::new(from, to)
        } else {
            Self::new(to, from)
        }
    }

    fn clamp(self, len: usize) -> Self {
        Self::new(self.anchor.min(len), self.head.min(len))
    }
}

/// A non-empty set of ranges, sorted by position, with overlapping ranges
/// merged. One of them is the main range that movement and the cursor
/// report follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    ranges: Vec<SelectionRange>,
    main: usize,
}

impl Selection {
    /// Build a selection from arbitrary ranges.
    ///
    /// Ranges are sorted and merged; `main` indexes into `ranges` as given
    /// and follows its range through the merge. An empty list becomes a
    /// cursor at the start of the buffer.
    pub fn new(ranges: Vec<SelectionRange>, main: usize) -> Self {
        if ranges.is_empty() {
            return Self::cursor(0);
        }
        let main_range = ranges[main.min(ranges.len() - 1)];

        let mut sorted = ranges;
        sorted.sort_by_key(|r| (r.from(), r.to()));

        let mut merged: Vec<SelectionRange> = Vec::with_capacity(sorted.len());
        for range in sorted {
            if let Some(last) = merged.last_mut() {
                let touching = range.from() == last.to() && (range.is_empty() || last.is_empty());
                if range.from() < last.to() || touching {
                    let from = last.from();
                    let to = last.to().max(range.to());
                    *last = if last.anchor <= last.head {
                        SelectionRange::new(from, to)
                    } else {
                        SelectionRange::new(to, from)
                    };
                    continue;
                }
            }
            merged.push(range);
        }

        let main = merged
            .iter()
            .position(|r| r.from() <= main_range.from() && main_range.to() <= r.to())
            .unwrap_or(0);
        Self {
            ranges: merged,
            main,
        }
    }

    pub fn single(anchor: usize, head: usize) -> Self {
        Self {
            ranges: vec![SelectionRange::new(anchor, head)],
            main: 0,
        }
    }

    pub fn cursor(pos: usize) -> Self {
        Self::single(pos, pos)
    }

    pub fn ranges(&self) -> &[SelectionRange] {
        &self.ranges
    }

    pub fn main(&self) -> SelectionRange {
        self.ranges[self.main]
    }

    pub const fn main_index(&self) -> usize {
        self.main
    }

    /// The selection after `changes` were applied to the text it points into.
    pub fn map(&self, changes: &ChangeSet) -> Self {
        let ranges = self.ranges.iter().map(|r| r.map(changes)).collect();
        Self::new(ranges, self.main)
    }

    /// Pull every endpoint inside `0..=len`.
    pub fn clamp(&self, len: usize) -> Self {
        let ranges = self.ranges.iter().map(|r| r.clamp(len)).collect();
        Self::new(ranges, self.main)
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::cursor(0)
    }
}
