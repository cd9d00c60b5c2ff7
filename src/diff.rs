use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use similar::{ChangeTag, TextDiff};

const PREVIEW_CONTEXT: usize = 3;
const PREVIEW_MAX_LINES: usize = 200;

/// What replacing `existing` with a link to `source` would change.
/// Binary or unreadable files get a one-line note instead of a diff.
pub fn preview(existing: &Path, source: &Path) -> String {
    let mut out = format!(
        "--- {} (existing)\n+++ {} (source)\n",
        existing.display(),
        source.display()
    );
    match (read_text(existing), read_text(source)) {
        (Some(old), Some(new)) => out.push_str(&render_diff(&old, &new, PREVIEW_CONTEXT)),
        _ => out.push_str("(binary or unreadable content; no preview)\n"),
    }
    out
}

fn read_text(path: &Path) -> Option<String> {
    let bytes = fs::read(path).ok()?;
    if bytes.contains(&0) {
        return None;
    }
    String::from_utf8(bytes).ok()
}

pub fn render_diff(old: &str, new: &str, context: usize) -> String {
    let diff = TextDiff::configure()
        .algorithm(similar::Algorithm::Myers)
        .diff_lines(old, new);

    let mut out = String::new();
    let mut lines = 0usize;
    for (idx, group) in diff.grouped_ops(context).iter().enumerate() {
        if idx > 0 {
            out.push_str("...\n");
        }
        for op in group {
            for change in diff.iter_changes(op) {
                if lines == PREVIEW_MAX_LINES {
                    let _ = writeln!(out, "(diff truncated at {PREVIEW_MAX_LINES} lines)");
                    return out;
                }
                let marker = match change.tag() {
                    ChangeTag::Delete => "- ",
                    ChangeTag::Insert => "+ ",
                    ChangeTag::Equal => "  ",
                };
                let _ = write!(out, "{marker}{change}");
                if change.missing_newline() {
                    out.push('\n');
                }
                lines += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_changed_lines() {
        let rendered = render_diff(
            "alias ll='ls -l'\nexport A=1\n",
            "alias ll='ls -la'\nexport A=1\n",
            3,
        );
        assert_eq!(
            rendered,
            "- alias ll='ls -l'\n+ alias ll='ls -la'\n  export A=1\n"
        );
    }

    #[test]
    fn preview_has_headers_and_notes_binary_content() {
        let temp = tempfile::tempdir().expect("temp dir");
        let existing = temp.path().join("existing");
        let source = temp.path().join("source");
        fs::write(&existing, "a\n").expect("existing");
        fs::write(&source, "b\n").expect("source");

        let text = preview(&existing, &source);
        assert!(text.starts_with(&format!("--- {} (existing)\n", existing.display())));
        assert!(text.ends_with("- a\n+ b\n"));

        fs::write(&source, [0u8, 1, 2]).expect("binary source");
        assert!(preview(&existing, &source).ends_with("no preview)\n"));
    }

    #[test]
    fn identical_text_renders_nothing() {
        assert_eq!(render_diff("same\n", "same\n", 3), "");
    }

    #[test]
    fn long_diffs_are_truncated() {
        let old: String = (0..500).map(|n| format!("old {n}\n")).collect();
        let new: String = (0..500).map(|n| format!("new {n}\n")).collect();
        let rendered = render_diff(&old, &new, 3);
        assert!(rendered.ends_with(&format!("(diff truncated at {PREVIEW_MAX_LINES} lines)\n")));
    }
}
