//! Grouping classified diff lines into highlight ranges.
//!
//! The [`Aggregator`] consumes [`DiffEvent`]s strictly in order, keeps at most
//! one range open, and writes every new-file line it resolves into a
//! [`HighlightTable`]. It is single-pass and holds no state between files.
//!
//! ## State
//!
//! - `cursor`: the new-file line the next inserted or context line lands on
//! - [`RangeState`]: either idle or one [`OpenRange`]
//! - the inserted text accumulated since the last context line
//!
//! ## Transitions
//!
//! | event       | idle                         | open                                          |
//! |-------------|------------------------------|-----------------------------------------------|
//! | hunk header | move cursor                  | settle the range, move cursor                 |
//! | delete      | open modified range at cursor| append removed text                           |
//! | insert      | open added range at cursor   | continue, or pivot into a new added range     |
//! | other       | advance cursor               | settle the range, advance cursor              |
//!
//! Settling a range reclassifies a modified range that received no insertions
//! as deleted, then closes it: the line count is fixed and, when text was
//! removed, the character diff is rendered.
//!
//! ## Pivot Rule
//!
//! Diffs pair deletions and insertions positionally without saying which
//! insertion replaces which deletion. The first `deleted` insertions of a
//! modified range are its replacement; any further insertion closes it and
//! opens a new added range. See [`InsertStep::decide`].

use crate::classify::{DiffEvent, INVALID_LINE, LineNumber, classify};
use crate::config::Color;
use crate::highlight::{ElementId, HighlightElement, HighlightKind, HighlightTable};
use crate::render::render;

/// The range currently accumulating lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenRange {
    /// The table element every line of this range maps to.
    pub id: ElementId,
    /// First new-file line of the range.
    pub start: LineNumber,
    /// Removed lines seen since the range opened.
    pub deleted: LineNumber,
    /// Kind the range closes with, unless settling turns a modified range
    /// into a deleted one.
    pub kind: HighlightKind,
}

/// Whether the aggregator is between ranges or accumulating one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeState {
    /// No range is open; context lines only advance the cursor.
    Idle,
    /// A range is open and takes further removals and insertions.
    Open(OpenRange),
}

/// What an inserted line does to the range state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertStep {
    /// No range is open: start an added range.
    Open,
    /// The line belongs to the open range.
    Continue(OpenRange),
    /// The open range already has all its replacement lines: close it and
    /// start an added range.
    Pivot(OpenRange),
}

impl InsertStep {
    /// Applies the pivot rule for an insertion landing on `cursor`.
    #[must_use]
    pub fn decide(state: RangeState, cursor: LineNumber) -> Self {
        match state {
            RangeState::Idle => Self::Open,
            RangeState::Open(range)
                if range.kind != HighlightKind::Added
                    && cursor.saturating_sub(range.start) >= range.deleted =>
            {
                Self::Pivot(range)
            }
            RangeState::Open(range) => Self::Continue(range),
        }
    }
}

/// Streaming diff-to-highlight state machine for one file.
///
/// Call [`Aggregator::finish`] to obtain the table. Dropping an aggregator
/// without finishing discards any partial range.
#[derive(Debug)]
pub struct Aggregator {
    extra: Color,
    cursor: LineNumber,
    state: RangeState,
    inserted_text: String,
    table: HighlightTable,
}

impl Aggregator {
    /// Creates an aggregator marking removed spans with `extra`.
    #[must_use]
    pub fn new(extra: Color) -> Self {
        Self {
            extra,
            cursor: 0,
            state: RangeState::Idle,
            inserted_text: String::new(),
            table: HighlightTable::new(),
        }
    }

    /// The new-file line the next inserted or context line lands on.
    #[inline]
    #[must_use]
    pub fn cursor(&self) -> LineNumber {
        self.cursor
    }

    /// The range being accumulated, if any.
    #[inline]
    #[must_use]
    pub fn state(&self) -> RangeState {
        self.state
    }

    /// Classifies and consumes one raw diff line.
    pub fn feed_line(&mut self, line: &str) {
        self.feed(classify(line));
    }

    /// Consumes one classified event.
    pub fn feed(&mut self, event: DiffEvent) {
        match event {
            DiffEvent::HunkStart { new_line_number } => {
                if let RangeState::Open(range) = self.state {
                    log::warn!(
                        "hunk header at line {new_line_number} while range at {} is open",
                        range.start
                    );
                    self.settle();
                }
                if new_line_number == INVALID_LINE {
                    log::warn!("unparseable hunk header line number");
                }
                self.cursor = new_line_number;
            }
            DiffEvent::Delete { text } => {
                let mut range = match self.state {
                    RangeState::Open(range) => range,
                    RangeState::Idle => {
                        let range = self.open(HighlightKind::Modified);
                        self.table.insert(self.cursor, range.id);
                        range
                    }
                };
                let removed = &mut self.table.element_mut(range.id).removed_text;
                removed.push_str(&text);
                removed.push('\n');
                range.deleted = range.deleted.saturating_add(1);
                self.state = RangeState::Open(range);
            }
            DiffEvent::Insert { text } => {
                let range = match InsertStep::decide(self.state, self.cursor) {
                    InsertStep::Open => self.open(HighlightKind::Added),
                    InsertStep::Pivot(previous) => {
                        self.close(previous);
                        self.open(HighlightKind::Added)
                    }
                    InsertStep::Continue(range) => range,
                };
                self.table.insert(self.cursor, range.id);
                self.inserted_text.push_str(&text);
                self.cursor = self.cursor.saturating_add(1);
                self.state = RangeState::Open(range);
            }
            DiffEvent::Other => {
                self.settle();
                self.cursor = self.cursor.saturating_add(1);
            }
        }
    }

    /// Closes any open range and returns the finished table.
    #[must_use]
    pub fn finish(mut self) -> HighlightTable {
        self.settle();
        log::debug!(
            "aggregated {} highlighted lines ending at line {}",
            self.table.len(),
            self.cursor
        );
        self.table
    }

    fn open(&mut self, kind: HighlightKind) -> OpenRange {
        let id = self.table.push(HighlightElement::new(self.cursor, kind));
        OpenRange {
            id,
            start: self.cursor,
            deleted: 0,
            kind,
        }
    }

    /// Reclassifies a replacement-less modified range as deleted, closes it, and
    /// resets the per-range accumulators.
    fn settle(&mut self) {
        if let RangeState::Open(mut range) = self.state {
            if range.kind == HighlightKind::Modified && self.cursor == range.start {
                range.kind = HighlightKind::Deleted;
            }
            self.close(range);
        }
        self.state = RangeState::Idle;
        self.inserted_text.clear();
    }

    fn close(&mut self, range: OpenRange) {
        let line_count = self.cursor.saturating_sub(range.start);
        let extra = self.extra;
        let inserted = &self.inserted_text;
        let element = self.table.element_mut(range.id);
        element.line_count = line_count;
        element.kind = range.kind;
        if !element.removed_text.is_empty() {
            element.rendered_diff = Some(render(inserted, &element.removed_text, extra));
        }
    }
}

/// Runs a whole line sequence through a fresh [`Aggregator`].
pub fn highlight_lines<I, S>(lines: I, extra: Color) -> HighlightTable
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut aggregator = Aggregator::new(extra);
    for line in lines {
        aggregator.feed_line(line.as_ref());
    }
    aggregator.finish()
}
