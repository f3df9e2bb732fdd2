//! # gutter-diff-nvim
//!
//! A Neovim plugin core that turns unified diffs into gutter highlights.
//!
//! Diff text from `git diff`, a formatter's suggested diff, or a type-inference
//! tool is classified line by line and folded into a per-line table of ranges.
//! Each range is tagged added, deleted or modified, keeps the text it replaced,
//! and for replaced text carries a character-level rendering of what was removed.
//!
//! ## Architecture
//!
//! - `classify` - unified-diff line classifier
//! - `render` - character diff of a range's old text against its new text
//! - `aggregate` - the streaming state machine grouping lines into ranges
//! - `highlight` - the line to range table and its JSON wire format
//! - `config` - colors and provider settings
//! - `provider` - running git and lint tools and streaming their output
//! - `lib` (this module) - re-exports and, with the `nvim` feature, Lua bindings
//!
//! ## Usage from Lua
//!
//! ```lua
//! local gutter = require("gutter_diff_nvim")
//!
//! -- Highlights for the unstaged changes of a file, as JSON keyed by line
//! local json = gutter.request_highlights("git", vim.api.nvim_buf_get_name(0))
//!
//! -- Highlights for a diff already in hand
//! local json = gutter.highlight_diff(diff_text)
//! ```

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod error;
pub mod highlight;
pub mod provider;
pub mod render;

pub use aggregate::{Aggregator, InsertStep, OpenRange, RangeState, highlight_lines};
pub use classify::{DiffEvent, INVALID_LINE, LineNumber, classify};
pub use config::{Color, HighlightColors, ProviderConfig};
pub use error::{Error, Result};
pub use highlight::{ElementId, HighlightElement, HighlightKind, HighlightTable, LineRange};
pub use provider::{Provider, ProviderInfo, request_highlights, request_many};
pub use render::{MarkedSpan, MarkedText, render};

/// Highlights a complete diff held in memory.
///
/// Lines before the first hunk header (`diff --git`, `index`, `---` and `+++`)
/// are skipped, so whole `git diff` output can be passed as is.
#[must_use]
pub fn highlight_diff(text: &str, extra: Color) -> HighlightTable {
    let hunks = text
        .lines()
        .skip_while(|line| !matches!(classify(line), DiffEvent::HunkStart { .. }));
    highlight_lines(hunks, extra)
}

#[cfg(feature = "nvim")]
mod lua {
    use super::*;
    use mlua::prelude::*;
    use std::path::{Path, PathBuf};

    fn lua_err(err: Error) -> LuaError {
        LuaError::RuntimeError(err.to_string())
    }

    fn load(provider: &str, config: Option<&str>) -> LuaResult<(Provider, ProviderConfig)> {
        let provider = Provider::from_name(provider).map_err(lua_err)?;
        let config = ProviderConfig::from_json(config).map_err(lua_err)?;
        Ok((provider, config))
    }

    fn encode(lua: &Lua, table: &HighlightTable) -> LuaResult<LuaString> {
        let json = table.to_json().map_err(lua_err)?;
        lua.create_string(&json)
    }

    fn colors_table(lua: &Lua, colors: HighlightColors) -> LuaResult<LuaTable> {
        let table = lua.create_table()?;
        table.set("added", colors.added.to_string())?;
        table.set("deleted", colors.deleted.to_string())?;
        table.set("modified", colors.modified.to_string())?;
        table.set("extra", colors.extra.to_string())?;
        Ok(table)
    }

    /// Runs a provider for one file; `nil` when it does not handle the file.
    fn request_highlights(
        lua: &Lua,
        (provider, path, config): (String, String, Option<String>),
    ) -> LuaResult<Option<LuaString>> {
        let (provider, config) = load(&provider, config.as_deref())?;
        crate::provider::request_highlights(provider, Path::new(&path), &config)
            .map_err(lua_err)?
            .map(|table| encode(lua, &table))
            .transpose()
    }

    /// Runs a provider for many files in parallel. Files that fail or are not
    /// handled are absent from the result.
    fn request_many(
        lua: &Lua,
        (provider, paths, config): (String, Vec<String>, Option<String>),
    ) -> LuaResult<LuaTable> {
        let (provider, config) = load(&provider, config.as_deref())?;
        let paths: Vec<PathBuf> = paths.into_iter().map(PathBuf::from).collect();

        let result = lua.create_table()?;
        for (path, table) in crate::provider::request_many(provider, &paths, &config) {
            if let Ok(Some(table)) = table {
                result.set(path.to_string_lossy().as_ref(), encode(lua, &table)?)?;
            }
        }
        Ok(result)
    }

    /// Highlights diff text already in hand. Anything before the first hunk
    /// header is ignored.
    fn highlight_diff(
        lua: &Lua,
        (text, config): (String, Option<String>),
    ) -> LuaResult<LuaString> {
        let config = ProviderConfig::from_json(config.as_deref()).map_err(lua_err)?;
        encode(lua, &super::highlight_diff(&text, config.colors.extra))
    }

    fn describe(lua: &Lua, (provider, config): (String, Option<String>)) -> LuaResult<LuaTable> {
        let (provider, config) = load(&provider, config.as_deref())?;
        let info = provider.describe();

        let table = lua.create_table()?;
        table.set("title", info.title)?;
        table.set("apply_prompt", info.apply_prompt)?;
        table.set("apply_confirm", info.apply_confirm)?;
        table.set("colors", colors_table(lua, provider.colors(&config))?)?;
        Ok(table)
    }

    /// Creates the Lua module exports. Called by mlua when loaded via `require("gutter_diff_nvim")`.
    #[mlua::lua_module]
    fn gutter_diff_nvim(lua: &Lua) -> LuaResult<LuaTable> {
        let exports = lua.create_table()?;
        exports.set("request_highlights", lua.create_function(request_highlights)?)?;
        exports.set("request_many", lua.create_function(request_many)?)?;
        exports.set("highlight_diff", lua.create_function(highlight_diff)?)?;
        exports.set("describe", lua.create_function(describe)?)?;
        Ok(exports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXTRA: Color = Color::rgba(0.5, 0.0, 0.0, 1.0);

    #[test]
    fn highlight_diff_in_memory() {
        let table = highlight_diff("@@ -1,2 +1,3 @@\n a\n+b\n c\n", EXTRA);
        let element = table.get(2).unwrap();
        assert_eq!(element.kind, HighlightKind::Added);
        assert_eq!(element.range(), LineRange { start: 2, count: 1 });
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn highlight_diff_skips_file_headers() {
        let text = "diff --git a/f b/f\nindex 1..2 100644\n--- a/f\n+++ b/f\n@@ -1 +1,2 @@\n a\n+b\n";
        let table = highlight_diff(text, EXTRA);
        assert!(table.get(0).is_none());
        assert_eq!(table.get(2).unwrap().kind, HighlightKind::Added);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn highlight_diff_without_hunks_is_empty() {
        assert!(highlight_diff("--- a/f\n+++ b/f\n", EXTRA).is_empty());
    }

    #[test]
    fn highlight_diff_empty() {
        assert!(highlight_diff("", EXTRA).is_empty());
    }

    #[test]
    fn highlight_diff_ignores_trailing_newline() {
        let with = highlight_diff("@@ -1 +1 @@\n-x\n+y\n", EXTRA);
        let without = highlight_diff("@@ -1 +1 @@\n-x\n+y", EXTRA);
        assert!(with.content_eq(&without));
    }
}
