//! Console formatting for command and tool output

use colored::Colorize;

/// Lines of output shown to the human before truncating.
pub const MAX_DISPLAY_LINES: usize = 50;

const EMPTY_OUTPUT: &str = "(no output)";

/// How a line of tool output should be coloured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    /// `╭─ path` or a `[NEW]` header
    Header,
    Added,
    Removed,
    Plain,
}

/// Classify a rendered line by its diff gutter marker.
pub fn line_style(line: &str) -> LineStyle {
    if line.starts_with("╭─") {
        return LineStyle::Header;
    }
    // `│ NNNN │ + text` / `│ NNNN │ - text`, or `│ + text` in a create preview
    let Some(rest) = line.strip_prefix("│ ") else {
        return LineStyle::Plain;
    };
    let marker = match rest.split_once(" │ ") {
        Some((number, body)) if number.trim().chars().all(|c| c.is_ascii_digit()) => body,
        _ => rest,
    };
    if marker.starts_with("+ ") || marker == "+" {
        LineStyle::Added
    } else if marker.starts_with("- ") || marker == "-" {
        LineStyle::Removed
    } else {
        LineStyle::Plain
    }
}

/// Formats command and tool output for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Limit output to [`MAX_DISPLAY_LINES`] lines, noting how many were cut.
    ///
    /// The model always gets the full text; this is only for the screen.
    pub fn format_output(output: &str) -> String {
        if output.is_empty() {
            return EMPTY_OUTPUT.to_string();
        }
        let lines: Vec<&str> = output.split('\n').collect();
        if lines.len() <= MAX_DISPLAY_LINES {
            return output.to_string();
        }
        format!(
            "{}\n... ({} more lines, output truncated)",
            lines[..MAX_DISPLAY_LINES].join("\n"),
            lines.len() - MAX_DISPLAY_LINES
        )
    }

    /// [`format_output`](Self::format_output) with diff lines coloured.
    pub fn render(output: &str) -> String {
        Self::format_output(output)
            .split('\n')
            .map(|line| match line_style(line) {
                LineStyle::Header => line.cyan().bold().to_string(),
                LineStyle::Added => line.green().to_string(),
                LineStyle::Removed => line.red().to_string(),
                LineStyle::Plain if line.starts_with("... (") => line.yellow().to_string(),
                LineStyle::Plain => line.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Welcome box shown when the REPL starts
    pub fn header(title: &str) -> String {
        let width = title.chars().count() + 8;
        format!(
            "╭{}╮\n│    {}    │\n╰{}╯",
            "─".repeat(width),
            title,
            "─".repeat(width)
        )
    }
}
