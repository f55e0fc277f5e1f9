//! Shell-command extraction from plain-text model replies.
//!
//! Two recognisers run over the same text and their results are
//! concatenated, fenced blocks first:
//!
//! - **Fenced**: ```` ```bash ```` / `sh` / `shell` / untagged blocks.
//! - **Label**: a line reading just `Bash` or `Shell`, followed by command
//!   lines up to a blank line.
//!
//! Heredocs and backslash continuations are kept as a single command.

const FENCE: &str = "```";
const SHELL_TAGS: [&str; 3] = ["bash", "sh", "shell"];
const LABELS: [&str; 2] = ["bash", "shell"];

/// Extract shell commands from `text`, fenced blocks first, then label blocks.
pub fn extract_commands(text: &str) -> Vec<String> {
    let mut commands = extract_fenced(text);
    extract_labelled(text, &mut commands);
    commands
}

/// Preview of a possibly multi-line command: its first line, plus `...`
/// when more lines follow.
pub fn command_preview(command: &str) -> String {
    match command.split_once('\n') {
        Some((first, _)) => format!("{}...", first),
        None => command.to_string(),
    }
}

fn extract_fenced(text: &str) -> Vec<String> {
    let mut commands = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find(FENCE) {
        let after_open = &rest[open + FENCE.len()..];
        let Some(eol) = after_open.find('\n') else {
            break;
        };
        let info = after_open[..eol].trim();
        let body_and_rest = &after_open[eol + 1..];
        let Some(close) = body_and_rest.find(FENCE) else {
            break;
        };

        if is_shell_fence(info) {
            push_block_body(body_and_rest[..close].trim(), &mut commands);
        }
        rest = &body_and_rest[close + FENCE.len()..];
    }
    commands
}

fn is_shell_fence(info: &str) -> bool {
    info.is_empty() || SHELL_TAGS.iter().any(|tag| info.eq_ignore_ascii_case(tag))
}

fn push_block_body(body: &str, commands: &mut Vec<String>) {
    if body.contains("<<") || body.contains("\\\n") {
        if !body.is_empty() && !body.starts_with('#') {
            commands.push(body.to_string());
        }
        return;
    }
    commands.extend(
        body.lines()
            .map(str::trim)
            .filter(|line| is_command_line(line))
            .map(str::to_string),
    );
}

fn is_command_line(line: &str) -> bool {
    !line.is_empty() && !line.starts_with('#')
}

fn is_label(line: &str) -> bool {
    let line = line.trim_end();
    LABELS.iter().any(|label| line.eq_ignore_ascii_case(label))
}

/// Lines that start with a label word end a label block even when followed
/// by more text (`Bash output:`).
fn starts_with_label(line: &str) -> bool {
    LABELS.iter().any(|label| {
        line.get(..label.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(label))
    })
}

fn extract_labelled(text: &str, commands: &mut Vec<String>) {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut i = 0;

    while i < lines.len() {
        if !is_label(lines[i]) {
            i += 1;
            continue;
        }
        i += 1;
        let Some(&first) = lines.get(i) else {
            break;
        };

        if first.contains("<<") {
            if let Some(marker) = heredoc_marker(first) {
                let mut span = vec![first];
                i += 1;
                while i < lines.len() && lines[i].trim() != marker {
                    span.push(lines[i]);
                    i += 1;
                }
                if let Some(&terminator) = lines.get(i) {
                    span.push(terminator);
                    i += 1;
                }
                commands.push(span.join("\n"));
            } else {
                i += 1;
            }
            continue;
        }

        let mut block = vec![first];
        i += 1;
        while i < lines.len() && !lines[i].trim().is_empty() && !starts_with_label(lines[i]) {
            block.push(lines[i]);
            i += 1;
        }
        for line in block {
            let cmd = line.trim();
            if is_command_line(cmd) && !commands.iter().any(|c| c == cmd) {
                commands.push(cmd.to_string());
            }
        }
    }
}

/// The `MARKER` of `<<MARKER` or `<<'MARKER'` (word characters only).
fn heredoc_marker(line: &str) -> Option<&str> {
    let after = &line[line.find("<<")? + 2..];
    let after = after.trim_start().trim_start_matches('\'');
    let len = after
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(after.len());
    (len > 0).then(|| &after[..len])
}
