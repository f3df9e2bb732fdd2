//! Character-level rendering of what a modified range used to say.
//!
//! The rendering answers "what did this range look like before, and which
//! parts of that are gone": it reproduces the old text in full, tagging the
//! removed spans with the `extra` color. Text that exists only on the new side
//! is never shown.

use crate::config::Color;
use serde::{Deserialize, Serialize};
use similar::{Algorithm, ChangeTag, TextDiff};
use smallvec::SmallVec;
use std::time::Duration;

/// Upper bound on the character alignment; past it the diff degrades to a
/// coarser but still valid alignment.
const RENDER_TIMEOUT: Duration = Duration::from_millis(200);

/// A run of old-side text, optionally colored as removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkedSpan {
    pub text: String,

    /// Set on spans that no longer exist on the new side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl MarkedSpan {
    #[inline]
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.color.is_some()
    }
}

/// Old text split into kept and removed spans.
///
/// Adjacent spans never share the same removed state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkedText {
    pub spans: SmallVec<[MarkedSpan; 4]>,
}

impl MarkedText {
    /// The full old text, ignoring marks.
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }

    /// Iterates over the removed spans' text.
    pub fn removed(&self) -> impl Iterator<Item = &str> {
        self.spans
            .iter()
            .filter(|span| span.is_removed())
            .map(|span| span.text.as_str())
    }

    /// Appends text, merging into the last span when the mark matches.
    fn push(&mut self, text: &str, color: Option<Color>) {
        if let Some(last) = self.spans.last_mut() {
            if last.color == color {
                last.text.push_str(text);
                return;
            }
        }
        self.spans.push(MarkedSpan {
            text: text.to_string(),
            color,
        });
    }
}

/// Renders `old_text` with every span absent from `new_text` marked in `extra`.
#[must_use]
pub fn render(new_text: &str, old_text: &str, extra: Color) -> MarkedText {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .timeout(RENDER_TIMEOUT)
        .diff_chars(old_text, new_text);

    let mut marked = MarkedText::default();
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Equal => marked.push(change.value(), None),
            ChangeTag::Delete => marked.push(change.value(), Some(extra)),
            ChangeTag::Insert => {}
        }
    }
    marked
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXTRA: Color = Color::rgba(0.5, 0.0, 0.0, 1.0);

    fn removed(marked: &MarkedText) -> Vec<&str> {
        marked.removed().collect()
    }

    #[test]
    fn nothing_in_common_is_fully_removed() {
        let marked = render("y", "x", EXTRA);
        assert_eq!(marked.plain_text(), "x");
        assert_eq!(removed(&marked), vec!["x"]);
        assert_eq!(marked.spans.len(), 1);
        assert_eq!(marked.spans[0].color, Some(EXTRA));
    }

    #[test]
    fn shared_prefix_is_kept() {
        let marked = render("let total = 2;\n", "let total = 1;\n", EXTRA);
        assert_eq!(marked.plain_text(), "let total = 1;\n");
        assert_eq!(removed(&marked), vec!["1"]);
        assert!(!marked.spans[0].is_removed());
        assert_eq!(marked.spans[0].text, "let total = ");
    }

    #[test]
    fn insertions_are_never_rendered() {
        let marked = render("foobar", "foo", EXTRA);
        assert_eq!(marked.plain_text(), "foo");
        assert!(removed(&marked).is_empty());
    }

    #[test]
    fn everything_removed_when_new_side_empty() {
        let marked = render("", "gone\n", EXTRA);
        assert_eq!(removed(&marked), vec!["gone\n"]);
    }

    #[test]
    fn empty_old_side_renders_nothing() {
        let marked = render("added", "", EXTRA);
        assert!(marked.spans.is_empty());
    }

    #[test]
    fn adjacent_spans_alternate() {
        let marked = render("a_c_e", "abcde", EXTRA);
        assert_eq!(marked.plain_text(), "abcde");
        for pair in marked.spans.windows(2) {
            assert_ne!(pair[0].is_removed(), pair[1].is_removed());
        }
        assert_eq!(removed(&marked), vec!["b", "d"]);
    }

    #[test]
    fn serializes_removed_spans_with_color() {
        let marked = render("ab", "axb", EXTRA);
        let json = serde_json::to_value(&marked).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"text": "a"},
                {"text": "x", "color": "0.5 0 0 1"},
                {"text": "b"}
            ])
        );
    }
}
