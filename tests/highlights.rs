use gutter_diff_nvim::{
    Color, HighlightKind, HighlightTable, LineRange, highlight_diff, provider::highlight_reader,
};
use std::io::Cursor;

const EXTRA: Color = Color::rgba(0.5, 0.0, 0.0, 1.0);

/// `git diff` of a small Rust file: a rename, a removed line, two edits with
/// an appended line, and a pure addition in a later hunk.
const TRANSCRIPT: &str = "\
diff --git a/src/config.rs b/src/config.rs
index 1f3c2aa..8d0e9b1 100644
--- a/src/config.rs
+++ b/src/config.rs
@@ -1,9 +1,10 @@
 use std::path::PathBuf;

-pub struct Settings {
+pub struct Config {
     pub root: PathBuf,
-    pub verbose: bool,
     pub depth: usize,
-    pub name: String,
-    pub tag: String,
+    pub label: String,
+    pub tags: Vec<String>,
+    pub hidden: bool,
 }

@@ -40,3 +41,5 @@ impl Config {
     fn depth(&self) -> usize {
         self.depth
     }
+
+    fn hidden(&self) -> bool { self.hidden }
";

fn transcript_table() -> HighlightTable {
    highlight_reader(Cursor::new(TRANSCRIPT), 4, EXTRA).unwrap()
}

fn ranges(table: &HighlightTable) -> Vec<(LineRange, HighlightKind)> {
    table.ranges().map(|(range, e)| (range, e.kind)).collect()
}

#[test]
fn transcript_ranges() {
    let table = transcript_table();

    assert_eq!(
        ranges(&table),
        vec![
            (LineRange { start: 3, count: 1 }, HighlightKind::Modified),
            (LineRange { start: 5, count: 0 }, HighlightKind::Deleted),
            (LineRange { start: 6, count: 2 }, HighlightKind::Modified),
            (LineRange { start: 8, count: 1 }, HighlightKind::Added),
            (LineRange { start: 44, count: 2 }, HighlightKind::Added),
        ]
    );
}

#[test]
fn transcript_removed_text_and_rendering() {
    let table = transcript_table();

    let renamed = table.get(3).unwrap();
    assert_eq!(renamed.removed_text, "pub struct Settings {\n");
    let diff = renamed.rendered_diff.as_ref().unwrap();
    assert_eq!(diff.plain_text(), renamed.removed_text);
    assert!(diff.removed().count() > 0);
    assert!(diff.spans[0].text.starts_with("pub struct "));

    let deleted = table.get(5).unwrap();
    assert_eq!(deleted.removed_text, "    pub verbose: bool,\n");

    let edited = table.get(6).unwrap();
    assert_eq!(edited.removed_text, "    pub name: String,\n    pub tag: String,\n");
    assert!(table.is_alias(6, 7));
    assert!(!table.is_alias(7, 8));
    assert!(table.get(8).unwrap().rendered_diff.is_none());
}

#[test]
fn transcript_lines_map_inside_their_ranges() {
    let table = transcript_table();
    for (line, element) in table.iter() {
        let range = element.range();
        assert!(
            range.contains(line) || (range.count == 0 && range.start == line),
            "line {line} outside {range}"
        );
    }
}

#[test]
fn transcript_json_round_trip() {
    let table = transcript_table();
    let decoded = HighlightTable::from_json(&table.to_json().unwrap()).unwrap();

    assert!(decoded.content_eq(&table));
    assert!(decoded.is_alias(6, 7));
    assert!(decoded.is_alias(44, 45));
    assert!(!decoded.is_alias(7, 8));
    assert_ne!(decoded.get(3), decoded.get(6));
    assert_eq!(
        decoded.get(6).unwrap().rendered_diff,
        table.get(6).unwrap().rendered_diff
    );
}

#[test]
fn transcript_replay_is_stable() {
    assert!(transcript_table().content_eq(&transcript_table()));
}

#[test]
fn truncated_stream_without_trailing_context() {
    let table = highlight_diff("@@ -7,2 +7,2 @@\n keep\n-old\n+new", EXTRA);
    assert_eq!(
        ranges(&table),
        vec![(LineRange { start: 8, count: 1 }, HighlightKind::Modified)]
    );
}

#[test]
fn invalid_hunk_number_degrades_without_failing() {
    let table = highlight_diff("@@ -1 +99999999999 @@\n+x\n", EXTRA);
    assert_eq!(table.get(-1).unwrap().kind, HighlightKind::Added);
}

#[test]
fn largest_hunk_number_does_not_overflow() {
    let table = highlight_diff("@@ -1,1 +2147483647,2 @@\n ctx\n ctx2\n", EXTRA);
    assert!(table.is_empty());

    let table = highlight_diff("@@ -1,1 +2147483647,2 @@\n-old\n+new\n+more\n", EXTRA);
    assert!(table.get(i32::MAX).is_some());
    assert_eq!(table.len(), 1);
}

#[test]
fn whole_transcript_in_memory_matches_streamed() {
    assert!(highlight_diff(TRANSCRIPT, EXTRA).content_eq(&transcript_table()));
}
