//! The per-file line to highlight map.
//!
//! A [`HighlightTable`] owns its [`HighlightElement`]s in an arena and maps
//! every covered new-file line to the element of its range. All lines of one
//! range share one [`ElementId`], so aliasing is explicit and survives a trip
//! through the JSON wire format.
//!
//! ## Equality
//!
//! - Content equality (`==` on [`HighlightElement`]) compares start, line
//!   count, kind and removed text.
//! - Identity (same [`ElementId`], or [`HighlightTable::is_alias`]) is
//!   stricter: two distinct ranges may be content-equal but never aliases.
//!
//! ## JSON Format
//!
//! ```json
//! {
//!   "12": {"range": "12 2", "kind": "modified", "text": "old\n", "diff": [{"text": "old", "color": "0.5 0 0 1"}, {"text": "\n"}]},
//!   "13": {"range": "12 2", "kind": "modified", "text": "old\n", "diff": [...]},
//!   "20": {"range": "20 1", "kind": "added", "text": ""}
//! }
//! ```

use crate::classify::LineNumber;
use crate::error::{Error, Result};
use crate::render::MarkedText;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Display classification of a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightKind {
    /// Lines that only exist in the new file.
    Added,
    /// Lines removed without replacement.
    Deleted,
    /// Lines replaced by other lines.
    Modified,
}

/// A contiguous span of new-file lines, `count` may be 0 for pure deletions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineRange {
    /// First line of the range.
    pub start: LineNumber,
    /// Number of lines covered.
    pub count: LineNumber,
}

impl LineRange {
    /// Whether `line` falls in `[start, start + count)`.
    #[inline]
    #[must_use]
    pub fn contains(&self, line: LineNumber) -> bool {
        line >= self.start && line < self.start.saturating_add(self.count)
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.start, self.count)
    }
}

impl FromStr for LineRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidRange(s.to_string());
        let (start, count) = s.split_once(' ').ok_or_else(invalid)?;
        Ok(Self {
            start: start.parse().map_err(|_| invalid())?,
            count: count.parse().map_err(|_| invalid())?,
        })
    }
}

/// One annotated range of the new file.
#[derive(Debug, Clone)]
pub struct HighlightElement {
    /// First new-file line of the range; for a pure deletion, the line the
    /// removed lines used to precede.
    pub start: LineNumber,

    /// Fixed when the range closes; 0 while open.
    pub line_count: LineNumber,

    /// Added, deleted or modified; decides the gutter color.
    pub kind: HighlightKind,

    /// Removed lines, each terminated by `\n`. Empty for pure additions.
    pub removed_text: String,

    /// Present only when `removed_text` is non-empty and the range has closed.
    pub rendered_diff: Option<MarkedText>,
}

impl HighlightElement {
    /// An element opening at `start` with no lines and no removed text yet.
    #[must_use]
    pub fn new(start: LineNumber, kind: HighlightKind) -> Self {
        Self {
            start,
            line_count: 0,
            kind,
            removed_text: String::new(),
            rendered_diff: None,
        }
    }

    /// The lines this element covers.
    #[inline]
    #[must_use]
    pub fn range(&self) -> LineRange {
        LineRange {
            start: self.start,
            count: self.line_count,
        }
    }
}

impl PartialEq for HighlightElement {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start
            && self.line_count == other.line_count
            && self.kind == other.kind
            && self.removed_text == other.removed_text
    }
}

impl Eq for HighlightElement {}

impl Hash for HighlightElement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.start.hash(state);
        self.line_count.hash(state);
        self.kind.hash(state);
        self.removed_text.hash(state);
    }
}

/// Index of an element inside its [`HighlightTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

/// Line number to element map for one file.
#[derive(Debug, Clone, Default)]
pub struct HighlightTable {
    elements: Vec<HighlightElement>,
    lines: HashMap<LineNumber, ElementId>,
}

impl HighlightTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new element and returns its identity. It is not yet mapped to any line.
    pub fn push(&mut self, element: HighlightElement) -> ElementId {
        self.elements.push(element);
        ElementId(self.elements.len() - 1)
    }

    /// Maps `line` to an element, replacing any previous mapping for that line.
    pub fn insert(&mut self, line: LineNumber, id: ElementId) {
        self.lines.insert(line, id);
    }

    #[must_use]
    pub fn get(&self, line: LineNumber) -> Option<&HighlightElement> {
        self.id_at(line).map(|id| &self.elements[id.0])
    }

    #[must_use]
    pub fn id_at(&self, line: LineNumber) -> Option<ElementId> {
        self.lines.get(&line).copied()
    }

    #[must_use]
    pub fn element(&self, id: ElementId) -> &HighlightElement {
        &self.elements[id.0]
    }

    pub(crate) fn element_mut(&mut self, id: ElementId) -> &mut HighlightElement {
        &mut self.elements[id.0]
    }

    /// Whether two lines resolve to the very same element.
    #[must_use]
    pub fn is_alias(&self, a: LineNumber, b: LineNumber) -> bool {
        matches!((self.id_at(a), self.id_at(b)), (Some(x), Some(y)) if x == y)
    }

    /// Number of mapped lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Mapped lines in ascending order with their elements.
    pub fn iter(&self) -> impl Iterator<Item = (LineNumber, &HighlightElement)> {
        let mut lines: Vec<_> = self.lines.iter().map(|(&line, &id)| (line, id)).collect();
        lines.sort_unstable_by_key(|&(line, _)| line);
        lines.into_iter().map(|(line, id)| (line, &self.elements[id.0]))
    }

    /// Distinct mapped elements in ascending start-line order, each visited once.
    pub fn ranges(&self) -> impl Iterator<Item = (LineRange, &HighlightElement)> {
        let mut ids: Vec<ElementId> = self.lines.values().copied().collect();
        ids.sort_unstable();
        ids.dedup();
        ids.sort_by_key(|id| self.elements[id.0].start);
        ids.into_iter().map(|id| {
            let element = &self.elements[id.0];
            (element.range(), element)
        })
    }

    /// Calls `f` once per distinct range in ascending start-line order.
    pub fn for_each_range<F>(&self, mut f: F)
    where
        F: FnMut(LineRange, &HighlightElement),
    {
        for (range, element) in self.ranges() {
            f(range, element);
        }
    }

    /// Whether two tables map the same lines to content-equal elements.
    #[must_use]
    pub fn content_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(line, element)| other.get(line) == Some(element))
    }

    /// Encodes the table in the line-keyed JSON wire format.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let wire: BTreeMap<LineNumber, WireElement<'_>> = self
            .iter()
            .map(|(line, element)| (line, WireElement::from(element)))
            .collect();
        Ok(serde_json::to_vec(&wire)?)
    }

    /// Decodes the JSON wire format, re-establishing aliases between lines
    /// whose entries carry identical content.
    pub fn from_json(json: &[u8]) -> Result<Self> {
        let wire: BTreeMap<LineNumber, WireElement<'static>> = serde_json::from_slice(json)?;

        let mut table = Self::new();
        let mut seen: HashMap<HighlightElement, ElementId> = HashMap::new();
        for (line, entry) in wire {
            let element = entry.into_element()?;
            let id = match seen.get(&element) {
                Some(&id) => id,
                None => {
                    let id = table.push(element.clone());
                    seen.insert(element, id);
                    id
                }
            };
            table.insert(line, id);
        }
        Ok(table)
    }
}

#[derive(Serialize, Deserialize)]
struct WireElement<'a> {
    range: String,
    kind: HighlightKind,
    text: Cow<'a, str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    diff: Option<Cow<'a, MarkedText>>,
}

impl<'a> From<&'a HighlightElement> for WireElement<'a> {
    fn from(element: &'a HighlightElement) -> Self {
        Self {
            range: element.range().to_string(),
            kind: element.kind,
            text: Cow::Borrowed(&element.removed_text),
            diff: element.rendered_diff.as_ref().map(Cow::Borrowed),
        }
    }
}

impl WireElement<'_> {
    fn into_element(self) -> Result<HighlightElement> {
        let range: LineRange = self.range.parse()?;
        Ok(HighlightElement {
            start: range.start,
            line_count: range.count,
            kind: self.kind,
            removed_text: self.text.into_owned(),
            rendered_diff: self.diff.map(Cow::into_owned),
        })
    }
}
