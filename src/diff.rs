//! Diff generation for previewing rewritten units.

use similar::{ChangeTag, TextDiff};
use std::fmt::Write;

/// Generates a unified diff between two versions of a unit.
pub fn unified_diff(original: &str, modified: &str, unit_name: &str) -> String {
    let diff = TextDiff::from_lines(original, modified);
    let mut output = String::new();

    let _ = writeln!(&mut output, "--- a/{}", unit_name);
    let _ = writeln!(&mut output, "+++ b/{}", unit_name);

    for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
        if idx > 0 {
            let _ = writeln!(&mut output);
        }

        for op in group {
            for change in diff.iter_changes(op) {
                let sign = match change.tag() {
                    ChangeTag::Delete => "-",
                    ChangeTag::Insert => "+",
                    ChangeTag::Equal => " ",
                };

                let _ = write!(&mut output, "{}{}", sign, change.value());
                if change.missing_newline() {
                    let _ = writeln!(&mut output);
                }
            }
        }
    }

    output
}

/// Line counts of a rewrite pass over one or more units.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiffSummary {
    pub units_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
}

impl DiffSummary {
    /// Creates a summary from original and modified content.
    pub fn from_diff(original: &str, modified: &str) -> Self {
        let diff = TextDiff::from_lines(original, modified);
        let mut insertions = 0;
        let mut deletions = 0;

        for change in diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Insert => insertions += 1,
                ChangeTag::Delete => deletions += 1,
                ChangeTag::Equal => {}
            }
        }

        Self {
            units_changed: usize::from(insertions > 0 || deletions > 0),
            insertions,
            deletions,
        }
    }

    /// Combines two summaries.
    pub fn merge(&mut self, other: &DiffSummary) {
        self.units_changed += other.units_changed;
        self.insertions += other.insertions;
        self.deletions += other.deletions;
    }
}

impl std::fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} unit(s) changed, {} insertions(+), {} deletions(-)",
            self.units_changed, self.insertions, self.deletions
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unified_diff() {
        let original = "if (s.length() == 0) {}\n";
        let modified = "if (s.isEmpty()) {}\n";
        let diff = unified_diff(original, modified, "Foo.java");

        assert!(diff.contains("--- a/Foo.java"));
        assert!(diff.contains("+++ b/Foo.java"));
        assert!(diff.contains("-if (s.length() == 0) {}"));
        assert!(diff.contains("+if (s.isEmpty()) {}"));
    }

    #[test]
    fn test_diff_summary() {
        let original = "line1\nline2\nline3\n";
        let modified = "line1\nmodified\nline3\nnew line\n";
        let summary = DiffSummary::from_diff(original, modified);

        assert_eq!(summary.units_changed, 1);
        assert_eq!(summary.insertions, 2);
        assert_eq!(summary.deletions, 1);
    }

    #[test]
    fn test_diff_summary_unchanged() {
        let summary = DiffSummary::from_diff("same\n", "same\n");
        assert_eq!(summary, DiffSummary::default());
    }
}
