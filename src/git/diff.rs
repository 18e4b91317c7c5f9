//! Unified diff annotation
//!
//! Walks `git diff` output once, keeping an old and a new line counter, and
//! tags every body line with the line numbers it has on each side:
//!
//! ```text
//! @@ -10,3 +10,4 @@     old=10 new=10
//!  context              old=10 new=10
//! -removed              old=11
//! +added                       new=11
//! ```
//!
//! Also reports a gutter width wide enough for the largest line number in the
//! whole diff, so every hunk lines up the same way.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{GitError, Result};

/// Narrowest gutter ever reported
pub const MIN_LINE_NUMBER_WIDTH: usize = 8;

// @@ -(old start)[,(old length)] +(new start)[,(new length)] @@
static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").unwrap()
});

/// Kind of a diff body line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffLineKind {
    HunkHeader,
    Context,
    Added,
    Removed,
}

/// A diff line with the line numbers it maps to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    /// The line as git printed it, prefix included
    pub text: String,
    pub kind: DiffLineKind,
    /// Absent for added lines
    pub old_line_number: Option<u32>,
    /// Absent for removed lines
    pub new_line_number: Option<u32>,
}

/// Annotated diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    pub lines: Vec<DiffLine>,
    /// Gutter width for right-aligning line numbers
    pub line_number_width: usize,
}

impl DiffResult {
    /// A diff with no hunks
    pub fn empty() -> Self {
        Self {
            lines: Vec::new(),
            line_number_width: MIN_LINE_NUMBER_WIDTH,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Count of added and removed lines
    pub fn stats(&self) -> (usize, usize) {
        self.lines.iter().fold((0, 0), |(added, removed), line| match line.kind {
            DiffLineKind::Added => (added + 1, removed),
            DiffLineKind::Removed => (added, removed + 1),
            _ => (added, removed),
        })
    }

    /// Old/new line numbers right-aligned to `line_number_width`, blank where
    /// a side has no number
    pub fn gutter(&self, line: &DiffLine) -> String {
        let width = self.line_number_width;
        let column = |n: Option<u32>| match n {
            Some(n) => format!("{:>width$}", n),
            None => " ".repeat(width),
        };
        format!("{}{}", column(line.old_line_number), column(line.new_line_number))
    }
}

/// Annotate unified diff text.
///
/// Everything before the first `@@` line (`diff --git`, `index`, `---`,
/// `+++`) is dropped. Lines that are not hunk headers, context, additions or
/// removals (`\ No newline at end of file`) are skipped, and so are combined
/// `@@@` hunks, which git prints for unmerged paths.
pub fn annotate(diff: &str) -> Result<DiffResult> {
    let body = diff.lines().skip_while(|line| !line.starts_with("@@"));

    let mut lines = Vec::new();
    let mut old_line_number: u32 = 1;
    let mut new_line_number: u32 = 1;
    let mut max_line_number: u64 = 0;

    // inside a combined (`@@@`) hunk of an unmerged path
    let mut in_combined_hunk = false;

    for line in body {
        if line.starts_with("@@@") {
            in_combined_hunk = true;
        } else if line.starts_with("@@") {
            in_combined_hunk = false;
            let hunk = parse_hunk_header(line)?;
            old_line_number = hunk.old_start;
            new_line_number = hunk.new_start;
            max_line_number = max_line_number.max(hunk.old_end()).max(hunk.new_end());
            lines.push(DiffLine {
                text: line.to_string(),
                kind: DiffLineKind::HunkHeader,
                old_line_number: Some(old_line_number),
                new_line_number: Some(new_line_number),
            });
        } else if in_combined_hunk {
            continue;
        } else if line.starts_with(' ') {
            lines.push(DiffLine {
                text: line.to_string(),
                kind: DiffLineKind::Context,
                old_line_number: Some(old_line_number),
                new_line_number: Some(new_line_number),
            });
            old_line_number = old_line_number.saturating_add(1);
            new_line_number = new_line_number.saturating_add(1);
        } else if line.starts_with('-') {
            lines.push(DiffLine {
                text: line.to_string(),
                kind: DiffLineKind::Removed,
                old_line_number: Some(old_line_number),
                new_line_number: None,
            });
            old_line_number = old_line_number.saturating_add(1);
        } else if line.starts_with('+') {
            lines.push(DiffLine {
                text: line.to_string(),
                kind: DiffLineKind::Added,
                old_line_number: None,
                new_line_number: Some(new_line_number),
            });
            new_line_number = new_line_number.saturating_add(1);
        }
    }

    let digits = max_line_number.to_string().len();
    Ok(DiffResult {
        lines,
        line_number_width: MIN_LINE_NUMBER_WIDTH.max(digits + 1),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HunkHeader {
    old_start: u32,
    old_len: u32,
    new_start: u32,
    new_len: u32,
}

impl HunkHeader {
    fn old_end(&self) -> u64 {
        u64::from(self.old_start) + u64::from(self.old_len)
    }

    fn new_end(&self) -> u64 {
        u64::from(self.new_start) + u64::from(self.new_len)
    }
}

fn parse_hunk_header(line: &str) -> Result<HunkHeader> {
    let invalid = || GitError::UnexpectedOutput(format!("hunk header '{line}'"));
    let caps = HUNK_HEADER.captures(line).ok_or_else(invalid)?;

    // omitted lengths mean a single-line hunk and count as 0
    let field = |i: usize| -> Result<u32> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().map_err(|_| invalid().into()),
            None => Ok(0),
        }
    };

    Ok(HunkHeader {
        old_start: field(1)?,
        old_len: field(2)?,
        new_start: field(3)?,
        new_len: field(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn numbers(result: &DiffResult) -> Vec<(DiffLineKind, Option<u32>, Option<u32>)> {
        result
            .lines
            .iter()
            .map(|l| (l.kind, l.old_line_number, l.new_line_number))
            .collect()
    }

    #[test]
    fn test_annotate_single_hunk() {
        let diff = "diff --git a/paper.tex b/paper.tex
index abc123..def456 100644
--- a/paper.tex
+++ b/paper.tex
@@ -10,3 +10,4 @@ section
 context
-removed
+added one
+added two
";
        let result = annotate(diff).unwrap();
        assert_eq!(
            numbers(&result),
            vec![
                (DiffLineKind::HunkHeader, Some(10), Some(10)),
                (DiffLineKind::Context, Some(10), Some(10)),
                (DiffLineKind::Removed, Some(11), None),
                (DiffLineKind::Added, None, Some(11)),
                (DiffLineKind::Added, None, Some(12)),
            ]
        );
        // largest end is 14: two digits plus one, floored at 8
        assert_eq!(result.line_number_width, 8);
        assert_eq!(result.lines[1].text, " context");
        assert_eq!(result.stats(), (2, 1));
    }

    #[test]
    fn test_annotate_multiple_hunks_reset_counters() {
        let diff = "@@ -1,2 +1,2 @@
-a
+b
 c
@@ -40,2 +40,3 @@
 x
+y
 z
";
        let result = annotate(diff).unwrap();
        assert_eq!(
            numbers(&result),
            vec![
                (DiffLineKind::HunkHeader, Some(1), Some(1)),
                (DiffLineKind::Removed, Some(1), None),
                (DiffLineKind::Added, None, Some(1)),
                (DiffLineKind::Context, Some(2), Some(2)),
                (DiffLineKind::HunkHeader, Some(40), Some(40)),
                (DiffLineKind::Context, Some(40), Some(40)),
                (DiffLineKind::Added, None, Some(41)),
                (DiffLineKind::Context, Some(41), Some(42)),
            ]
        );
    }

    #[test]
    fn test_annotate_empty_diff() {
        let result = annotate("").unwrap();
        assert_eq!(result, DiffResult::empty());

        let header_only = annotate("diff --git a/x b/x\nindex 1..2 100644\n").unwrap();
        assert!(header_only.is_empty());
        assert_eq!(header_only.line_number_width, MIN_LINE_NUMBER_WIDTH);
    }

    #[test]
    fn test_annotate_omitted_lengths_default_to_zero() {
        let result = annotate("@@ -3 +3 @@\n-old\n+new\n").unwrap();
        assert_eq!(
            numbers(&result),
            vec![
                (DiffLineKind::HunkHeader, Some(3), Some(3)),
                (DiffLineKind::Removed, Some(3), None),
                (DiffLineKind::Added, None, Some(3)),
            ]
        );
    }

    #[test]
    fn test_annotate_new_file_hunk() {
        let result = annotate("@@ -0,0 +1,2 @@\n+one\n+two\n").unwrap();
        assert_eq!(result.lines[1].new_line_number, Some(1));
        assert_eq!(result.lines[2].new_line_number, Some(2));
        assert_eq!(result.lines[2].old_line_number, None);
    }

    #[test]
    fn test_annotate_skips_no_newline_marker() {
        let result = annotate("@@ -1 +1 @@\n-a\n\\ No newline at end of file\n+b\n").unwrap();
        assert_eq!(result.lines.len(), 3);
        assert_eq!(result.lines[2].kind, DiffLineKind::Added);
    }

    #[test]
    fn test_width_grows_with_large_line_numbers() {
        let result = annotate("@@ -9999990,5 +9999990,20 @@\n context\n").unwrap();
        // 10000010 has 8 digits
        assert_eq!(result.line_number_width, 9);
    }

    #[test]
    fn test_malformed_hunk_header_is_an_error() {
        assert!(annotate("@@ nonsense @@\n").is_err());
        assert!(annotate("@@ -99999999999,1 +1,1 @@\n").is_err());
    }

    #[test]
    fn test_combined_hunks_are_skipped() {
        let diff = "diff --cc c.txt
index 1111111,2222222..0000000
--- a/c.txt
+++ b/c.txt
@@@ -1,1 -1,1 +1,5 @@@
++<<<<<<< HEAD
 +ours
++=======
+ theirs
++>>>>>>> other
";
        let result = annotate(diff).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.line_number_width, MIN_LINE_NUMBER_WIDTH);
    }

    #[test]
    fn test_plain_hunk_after_combined_hunk() {
        let result = annotate("@@@ -1,1 -1,1 +1,2 @@@\n++x\n@@ -5,1 +5,1 @@\n-a\n+b\n").unwrap();
        assert_eq!(
            numbers(&result),
            vec![
                (DiffLineKind::HunkHeader, Some(5), Some(5)),
                (DiffLineKind::Removed, Some(5), None),
                (DiffLineKind::Added, None, Some(5)),
            ]
        );
    }

    #[test]
    fn test_gutter_alignment() {
        let result = annotate("@@ -7,2 +7,2 @@\n-a\n+b\n").unwrap();
        assert_eq!(result.gutter(&result.lines[1]), "       7        ");
        assert_eq!(result.gutter(&result.lines[2]), "               7");
    }
}
