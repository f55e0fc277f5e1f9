//! Compact, human-readable change reports.
//!
//! ```text
//! ╭─ src/main.rs
//! │
//! │    1 │   fn main() {
//! │    2 │ - println!("hi");
//! │    2 │ + println!("hello");
//! │    3 │   }
//! ╰─
//! ```
//!
//! Unchanged lines further than [`CONTEXT_WINDOW`] entries from any change
//! are dropped. The output is plain text; colouring is left to the
//! presentation layer, which keys off the `│ - ` / `│ + ` markers.

use super::engine::{DiffEntry, DiffKind, compute_diff, split_lines};

pub const CONTEXT_WINDOW: usize = 2;
pub const CREATE_PREVIEW_LINES: usize = 10;

pub const NEW_FILE_BADGE: &str = "[NEW]";
const HEADER: &str = "╭─";
const GUTTER: &str = "│";
const FOOTER: &str = "╰─";

/// Render an edit script. Returns an empty string when nothing changed.
pub fn render_diff(entries: &[DiffEntry], path: &str) -> String {
    if !entries.iter().any(DiffEntry::is_change) {
        return String::new();
    }

    let mut out = vec![format!("{} {}", HEADER, path), GUTTER.to_string()];
    for (i, entry) in entries.iter().enumerate() {
        let marker = match entry.kind {
            DiffKind::Same if !change_nearby(entries, i) => continue,
            DiffKind::Same => ' ',
            DiffKind::Delete => '-',
            DiffKind::Add => '+',
        };
        out.push(format!(
            "{} {:>4} │ {} {}",
            GUTTER,
            entry.display_line(),
            marker,
            entry.content
        ));
    }
    out.push(FOOTER.to_string());
    out.join("\n")
}

fn change_nearby(entries: &[DiffEntry], i: usize) -> bool {
    let lo = i.saturating_sub(CONTEXT_WINDOW);
    let hi = (i + CONTEXT_WINDOW + 1).min(entries.len());
    entries[lo..hi].iter().any(DiffEntry::is_change)
}

/// Render a brand-new file: the first [`CREATE_PREVIEW_LINES`] lines as
/// additions, then a count of the rest.
pub fn render_create(content: &str, path: &str) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut out = vec![
        format!("{} {} {}", HEADER, path, NEW_FILE_BADGE),
        GUTTER.to_string(),
    ];
    for (i, line) in lines.iter().take(CREATE_PREVIEW_LINES).enumerate() {
        out.push(format!("{} {:>4} │ + {}", GUTTER, i + 1, line));
    }
    if lines.len() > CREATE_PREVIEW_LINES {
        out.push(format!(
            "{} ... {} more lines",
            GUTTER,
            lines.len() - CREATE_PREVIEW_LINES
        ));
    }
    out.push(FOOTER.to_string());
    out.join("\n")
}

/// Report a file mutation: the create form when there was no previous
/// content, otherwise a diff (empty if nothing changed).
pub fn format_change(old: Option<&str>, new: &str, path: &str) -> String {
    match old {
        None => render_create(new, path),
        Some(old) => render_diff(&compute_diff(&split_lines(old), &split_lines(new)), path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_changes_renders_nothing() {
        assert_eq!(format_change(Some("a\nb"), "a\nb", "f.txt"), "");
        assert_eq!(format_change(Some(""), "", "f.txt"), "");
    }

    #[test]
    fn renders_markers_and_line_numbers() {
        let out = format_change(Some("fn main() {\n    a();\n}"), "fn main() {\n    b();\n}", "m.rs");
        let expected = "╭─ m.rs\n\
                        │\n\
                        │    1 │   fn main() {\n\
                        │    2 │ -     a();\n\
                        │    2 │ +     b();\n\
                        │    3 │   }\n\
                        ╰─";
        assert_eq!(out, expected);
    }

    #[test]
    fn distant_context_is_collapsed() {
        let old: Vec<String> = (1..=20).map(|n| format!("line {}", n)).collect();
        let mut new = old.clone();
        new[9] = "changed".to_string();
        let out = format_change(Some(&old.join("\n")), &new.join("\n"), "f");

        assert!(out.contains("line 8"));
        assert!(out.contains("line 9"));
        assert!(out.contains("│ -") && out.contains("│ + changed"));
        assert!(out.contains("line 11"));
        assert!(!out.contains("line 7"));
        assert!(!out.contains("line 13"));
        assert!(!out.contains("line 1\n"));
    }

    #[test]
    fn create_shows_first_ten_lines_and_remainder() {
        let content: Vec<String> = (1..=14).map(|n| format!("row {}", n)).collect();
        let out = format_change(None, &content.join("\n"), "new.txt");

        assert!(out.starts_with("╭─ new.txt [NEW]\n│\n"));
        assert!(out.contains("│   10 │ + row 10"));
        assert!(!out.contains("row 11"));
        assert!(out.contains("│ ... 4 more lines"));
        assert!(out.ends_with("╰─"));
    }

    #[test]
    fn short_create_has_no_remainder_line() {
        let out = render_create("one\ntwo", "s.txt");
        assert!(out.contains("│    2 │ + two"));
        assert!(!out.contains("more lines"));
    }
}
