//! Display colors and provider settings supplied by the host.
//!
//! Colors are opaque to the diff core: it only tags each range with a
//! [`HighlightKind`] and marks removed spans with the `extra` color. The host
//! decides how kinds map to gutter colors via [`HighlightColors::color_for`].
//!
//! ## JSON Shape
//!
//! ```json
//! {
//!   "colors": { "added": "0.253 0.659 0.694 1", "extra": "0.5 0 0 1" },
//!   "show_head": true,
//!   "format_scripts": { "rs": "rustfmt-diff" }
//! }
//! ```
//!
//! Every field is optional; missing ones fall back to the defaults.

use crate::error::{Error, Result};
use crate::highlight::HighlightKind;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// An RGBA color with components in `0.0..=1.0`, written as `"r g b a"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: f32,
}

impl Color {
    #[must_use]
    pub const fn rgba(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Parses `"r g b a"`; the alpha component may be omitted and defaults to 1.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidColor(s.to_string());
        let components = s
            .split_whitespace()
            .map(|part| part.parse::<f32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>>>()?;

        if components.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(invalid());
        }

        match components[..] {
            [red, green, blue] => Ok(Self::rgba(red, green, blue, 1.0)),
            [red, green, blue, alpha] => Ok(Self::rgba(red, green, blue, alpha)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.red, self.green, self.blue, self.alpha)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The four colors the gutter needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightColors {
    pub added: Color,
    pub deleted: Color,
    pub modified: Color,
    /// Marks removed spans inside a modified range's rendered diff.
    pub extra: Color,
}

impl Default for HighlightColors {
    fn default() -> Self {
        Self {
            added: Color::rgba(0.253, 0.659, 0.694, 1.0),
            deleted: Color::rgba(1.0, 0.584, 0.571, 1.0),
            modified: Color::rgba(1.0, 0.576, 0.0, 1.0),
            extra: Color::rgba(0.5, 0.0, 0.0, 1.0),
        }
    }
}

impl HighlightColors {
    /// Default modified color for formatter suggestions.
    pub const FORMAT_MODIFIED: Color = Color::rgba(0.129, 0.313, 1.0, 1.0);

    /// Default modified color for type-inference suggestions.
    pub const INFER_MODIFIED: Color = Color::rgba(1.0, 0.0, 0.0, 1.0);

    #[must_use]
    pub fn color_for(&self, kind: HighlightKind) -> Color {
        match kind {
            HighlightKind::Added => self.added,
            HighlightKind::Deleted => self.deleted,
            HighlightKind::Modified => self.modified,
        }
    }

    /// Returns a copy with a different modified color.
    #[must_use]
    pub fn with_modified(self, modified: Color) -> Self {
        Self { modified, ..self }
    }
}

/// Settings for the diff providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Colors used for git diff; format and infer override `modified`.
    pub colors: HighlightColors,

    /// Modified color for formatter suggestions.
    pub format_color: Color,

    /// Modified color for type-inference suggestions.
    pub infer_color: Color,

    /// Diff the working tree against `HEAD` rather than the index.
    pub show_head: bool,

    /// File extension to formatter-diff command.
    pub format_scripts: HashMap<String, String>,

    /// Command producing a diff of inferred type annotations for Swift files.
    pub infer_script: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        let format_scripts = [
            ("swift", "swift_format.sh"),
            ("m", "clang_format.sh"),
            ("mm", "clang_format.sh"),
            ("h", "clang_format.sh"),
            ("cpp", "clang_format.sh"),
            ("c", "clang_format.sh"),
        ]
        .into_iter()
        .map(|(ext, script)| (ext.to_string(), script.to_string()))
        .collect();

        Self {
            colors: HighlightColors::default(),
            format_color: HighlightColors::FORMAT_MODIFIED,
            infer_color: HighlightColors::INFER_MODIFIED,
            show_head: false,
            format_scripts,
            infer_script: "infer.sh".to_string(),
        }
    }
}

impl ProviderConfig {
    /// Parses a JSON config; an empty or absent string gives the defaults.
    pub fn from_json(json: Option<&str>) -> Result<Self> {
        match json.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(json) => Ok(serde_json::from_str(json)?),
        }
    }
}
