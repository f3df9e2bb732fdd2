//! Classification of raw unified-diff lines.
//!
//! Every line coming out of a diff provider is turned into exactly one
//! [`DiffEvent`]. The classifier is a pure function of the line text; all
//! bookkeeping (line cursors, open ranges) lives in [`crate::aggregate`].
//!
//! ## Recognized Shapes
//!
//! In priority order:
//!
//! 1. `@@ -<old>[,<len>] +<new>[,<len>] @@ ...` hunk headers
//! 2. `-<text>` removed lines
//! 3. `+<text>` inserted lines
//! 4. anything else (context lines, file headers, tool diagnostics)
//!
//! File headers such as `--- a/file` would classify as removals, so providers
//! strip the diff preamble before handing lines over.

use regex::Regex;
use std::sync::OnceLock;

/// A 1-based line number in the new file, or [`INVALID_LINE`] for unparseable headers.
pub type LineNumber = i32;

/// Line number reported for a hunk header whose new-side start does not parse.
pub const INVALID_LINE: LineNumber = -1;

static DIFF_LINE: OnceLock<Regex> = OnceLock::new();

/// Hunk header capturing the new-side start, or a marker and the rest of the line.
fn diff_line_regex() -> &'static Regex {
    DIFF_LINE.get_or_init(|| {
        Regex::new(r"^(?:@@ -\d+(?:,\d+)? \+(\d+)(?:,\d+)? @@|([-+])(.*))")
            .expect("Failed to compile diff line regex")
    })
}

/// One classified diff line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffEvent {
    /// A hunk header; carries the first line number of the new-file side.
    HunkStart { new_line_number: LineNumber },
    /// A line removed from the old file.
    Delete { text: String },
    /// A line present only in the new file.
    Insert { text: String },
    /// Context, file header, or anything unrecognized.
    Other,
}

/// Classifies a single raw diff line.
///
/// Never fails: a hunk header whose number overflows yields
/// `HunkStart { new_line_number: INVALID_LINE }`.
#[must_use]
pub fn classify(line: &str) -> DiffEvent {
    let Some(caps) = diff_line_regex().captures(line) else {
        return DiffEvent::Other;
    };

    if let Some(start) = caps.get(1) {
        let new_line_number = start.as_str().parse().unwrap_or(INVALID_LINE);
        return DiffEvent::HunkStart { new_line_number };
    }

    let text = caps.get(3).map_or_else(String::new, |m| m.as_str().to_string());
    match caps.get(2).map(|m| m.as_str()) {
        Some("-") => DiffEvent::Delete { text },
        Some("+") => DiffEvent::Insert { text },
        _ => DiffEvent::Other,
    }
}
