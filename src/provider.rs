//! Diff sources feeding the aggregator.
//!
//! Each [`Provider`] runs an external tool in the file's directory and streams
//! its stdout, line by line, into a fresh [`Aggregator`]:
//!
//! - `git`: `git diff --no-ext-diff --no-color [HEAD] <file>`
//! - `format`: the formatter-diff command configured for the file extension
//! - `infer`: the type-inference diff command, Swift files only
//!
//! Output is consumed lazily and exactly once. If reading fails midway the
//! partial aggregation is dropped and the error returned.

use crate::aggregate::Aggregator;
use crate::config::{Color, HighlightColors, ProviderConfig};
use crate::error::{Error, Result};
use crate::highlight::HighlightTable;
use rayon::prelude::*;
use serde::Serialize;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A tool producing a unified-diff-like transcript for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    GitDiff,
    Format,
    Infer,
}

/// Labels for the host's "apply suggestion" dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    pub title: &'static str,
    /// May contain `%d` placeholders for the first and last line.
    pub apply_prompt: &'static str,
    pub apply_confirm: &'static str,
}

impl Provider {
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "git" => Ok(Self::GitDiff),
            "format" => Ok(Self::Format),
            "infer" => Ok(Self::Infer),
            other => Err(Error::UnknownProvider(other.to_string())),
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::GitDiff => "git",
            Self::Format => "format",
            Self::Infer => "infer",
        }
    }

    #[must_use]
    pub fn describe(self) -> ProviderInfo {
        match self {
            Self::GitDiff => ProviderInfo {
                title: "GitDiff",
                apply_prompt: "Revert code at lines %d-%d to staged version?",
                apply_confirm: "Revert",
            },
            Self::Format => ProviderInfo {
                title: "Format Lint",
                apply_prompt: "Apply style suggestion to lines %d-%d",
                apply_confirm: "Modify",
            },
            Self::Infer => ProviderInfo {
                title: "Infer Types",
                apply_prompt: "Make type explicit",
                apply_confirm: "Modify",
            },
        }
    }

    /// Header lines printed before the first hunk.
    ///
    /// These are skipped unclassified: `--- a/file` and `+++ b/file` would
    /// otherwise read as a removal and an insertion.
    #[must_use]
    pub fn preamble(self) -> usize {
        match self {
            Self::GitDiff => 4,
            Self::Format | Self::Infer => 2,
        }
    }

    /// Colors for this provider's ranges.
    #[must_use]
    pub fn colors(self, config: &ProviderConfig) -> HighlightColors {
        match self {
            Self::GitDiff => config.colors,
            Self::Format => config.colors.with_modified(config.format_color),
            Self::Infer => config.colors.with_modified(config.infer_color),
        }
    }

    /// Whether a non-zero exit status means failure.
    ///
    /// Formatter and inference scripts exit with 1 when they have suggestions.
    fn strict_status(self) -> bool {
        matches!(self, Self::GitDiff)
    }

    /// Builds the command for `path`, or `None` when the provider does not
    /// handle this kind of file.
    #[must_use]
    pub fn command(self, path: &Path, config: &ProviderConfig) -> Option<Command> {
        let file_name = path.file_name()?;
        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        let mut command = match self {
            Self::GitDiff => {
                let mut command = Command::new("git");
                command.args(["diff", "--no-ext-diff", "--no-color"]);
                if config.show_head {
                    command.arg("HEAD");
                }
                command.arg(file_name);
                command
            }
            Self::Format => {
                let script = config.format_scripts.get(extension)?;
                let mut command = Command::new(script);
                command.arg(file_name);
                command
            }
            Self::Infer => {
                if extension != "swift" {
                    return None;
                }
                let mut command = Command::new(&config.infer_script);
                command.arg(path);
                command
            }
        };

        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            command.current_dir(dir);
        }
        Some(command)
    }
}

/// Aggregates a diff transcript after skipping `preamble` header lines.
pub fn highlight_reader<R: BufRead>(
    reader: R,
    preamble: usize,
    extra: Color,
) -> Result<HighlightTable> {
    let mut aggregator = Aggregator::new(extra);
    for line in reader.lines().skip(preamble) {
        aggregator.feed_line(&line?);
    }
    Ok(aggregator.finish())
}

/// Runs `provider` for one file.
///
/// Returns `Ok(None)` when the provider does not apply to the file.
pub fn request_highlights(
    provider: Provider,
    path: &Path,
    config: &ProviderConfig,
) -> Result<Option<HighlightTable>> {
    let Some(mut command) = provider.command(path, config) else {
        log::debug!("{} does not handle {}", provider.name(), path.display());
        return Ok(None);
    };
    let program = command.get_program().to_string_lossy().into_owned();

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let (Some(stdout), Some(mut stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return Err(Error::Io(std::io::Error::other("provider pipes unavailable")));
    };

    // stderr drains on its own thread while stdout streams into the aggregator.
    let extra = provider.colors(config).extra;
    let (table, stderr) = std::thread::scope(|scope| {
        let errors = scope.spawn(move || {
            let mut text = String::new();
            let _ = stderr.read_to_string(&mut text);
            text
        });
        let table = highlight_reader(BufReader::new(stdout), provider.preamble(), extra);
        (table, errors.join().unwrap_or_default())
    });

    let status = child.wait()?;
    if !status.success() {
        if provider.strict_status() {
            return Err(Error::ProviderFailed {
                program,
                status,
                stderr: stderr.trim().to_string(),
            });
        }
        log::debug!("{program} exited with {status}");
    }

    let table = table?;
    log::debug!(
        "{} produced {} highlighted lines for {}",
        provider.name(),
        table.len(),
        path.display()
    );
    Ok(Some(table))
}

/// Runs `provider` for many files in parallel, preserving input order.
pub fn request_many(
    provider: Provider,
    paths: &[PathBuf],
    config: &ProviderConfig,
) -> Vec<(PathBuf, Result<Option<HighlightTable>>)> {
    paths
        .par_iter()
        .map(|path| {
            let result = request_highlights(provider, path, config);
            if let Err(err) = &result {
                log::warn!("{} failed for {}: {err}", provider.name(), path.display());
            }
            (path.clone(), result)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::{HighlightKind, LineRange};
    use std::ffi::OsStr;
    use std::io::Cursor;

    const GIT_DIFF: &str = "\
diff --git a/src/main.rs b/src/main.rs
index 83db48f..bf269f4 100644
--- a/src/main.rs
+++ b/src/main.rs
@@ -1,4 +1,4 @@
 fn main() {
-    println!(\"hello\");
+    println!(\"hello, world\");
     run();
 }
";

    fn args(command: &Command) -> Vec<&OsStr> {
        command.get_args().collect()
    }

    #[test]
    fn provider_names_round_trip() {
        for provider in [Provider::GitDiff, Provider::Format, Provider::Infer] {
            assert_eq!(Provider::from_name(provider.name()).unwrap(), provider);
        }
        assert!(matches!(
            Provider::from_name("blame"),
            Err(Error::UnknownProvider(_))
        ));
    }

    #[test]
    fn preamble_is_skipped() {
        let extra = Color::rgba(0.5, 0.0, 0.0, 1.0);
        let table = highlight_reader(Cursor::new(GIT_DIFF), 4, extra).unwrap();

        let ranges: Vec<_> = table.ranges().map(|(range, e)| (range, e.kind)).collect();
        assert_eq!(
            ranges,
            vec![(LineRange { start: 2, count: 1 }, HighlightKind::Modified)]
        );
        assert_eq!(table.get(2).unwrap().removed_text, "    println!(\"hello\");\n");
    }

    #[test]
    fn git_command_shape() {
        let mut config = ProviderConfig::default();
        let command = Provider::GitDiff
            .command(Path::new("/repo/src/main.rs"), &config)
            .unwrap();
        assert_eq!(command.get_program(), "git");
        assert_eq!(args(&command), ["diff", "--no-ext-diff", "--no-color", "main.rs"]);
        assert_eq!(command.get_current_dir(), Some(Path::new("/repo/src")));

        config.show_head = true;
        let command = Provider::GitDiff.command(Path::new("main.rs"), &config).unwrap();
        assert_eq!(
            args(&command),
            ["diff", "--no-ext-diff", "--no-color", "HEAD", "main.rs"]
        );
        assert_eq!(command.get_current_dir(), None);
    }

    #[test]
    fn format_dispatches_on_extension() {
        let config = ProviderConfig::default();
        let command = Provider::Format
            .command(Path::new("/src/view.m"), &config)
            .unwrap();
        assert_eq!(command.get_program(), "clang_format.sh");
        assert_eq!(args(&command), ["view.m"]);

        assert!(Provider::Format.command(Path::new("/src/notes.txt"), &config).is_none());
        assert!(Provider::Format.command(Path::new("/src/Makefile"), &config).is_none());
    }

    #[test]
    fn infer_only_handles_swift() {
        let config = ProviderConfig::default();
        let command = Provider::Infer
            .command(Path::new("/app/View.swift"), &config)
            .unwrap();
        assert_eq!(command.get_program(), "infer.sh");
        assert_eq!(args(&command), ["/app/View.swift"]);

        assert!(Provider::Infer.command(Path::new("/app/main.c"), &config).is_none());
    }

    #[test]
    fn unhandled_file_yields_no_table() {
        let config = ProviderConfig::default();
        let result = request_highlights(Provider::Infer, Path::new("/app/main.c"), &config);
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn provider_colors_override_modified() {
        let config = ProviderConfig::default();
        assert_eq!(Provider::GitDiff.colors(&config), config.colors);
        assert_eq!(
            Provider::Format.colors(&config).modified,
            HighlightColors::FORMAT_MODIFIED
        );
        assert_eq!(
            Provider::Infer.colors(&config).modified,
            HighlightColors::INFER_MODIFIED
        );
        assert_eq!(Provider::Infer.colors(&config).added, config.colors.added);
    }

    #[test]
    fn describe_labels() {
        assert_eq!(Provider::GitDiff.describe().apply_confirm, "Revert");
        assert_eq!(Provider::Format.describe().title, "Format Lint");
    }
}
