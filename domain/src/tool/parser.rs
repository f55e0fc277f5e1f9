//! Tool-call extraction from model output.
//!
//! The agent protocol embeds invocations in free text:
//!
//! ```text
//! <tool>write_file</tool>
//! <params>{"path": "hello.txt", "content": "hi\n"}</params>
//! ```
//!
//! [`ToolCallScanner`] walks the text once, left to right, and descends into
//! each `<tool>` / `<params>` pair. It never fails as a whole: a broken pair is
//! recorded as a [`ParseFailure`] and scanning resumes after it, so one bad
//! fragment cannot hide the calls that follow.
//!
//! Parameter bodies are decoded in two steps:
//!
//! 1. strict JSON (must be an object);
//! 2. **degraded extraction** ([`recover_params`]) when strict decoding fails
//!    on syntax. Models routinely emit file contents with raw newlines or
//!    unescaped quotes; for `path` + `content` payloads the intent is still
//!    recoverable.

use std::str::Chars;

use serde_json::Value;
use thiserror::Error;

use super::entities::{ToolCall, ToolParams};

const TOOL_OPEN: &str = "<tool>";
const TOOL_CLOSE: &str = "</tool>";
const PARAMS_OPEN: &str = "<params>";
const PARAMS_CLOSE: &str = "</params>";

/// A fragment that looked like a tool call but could not be turned into one.
///
/// Failures are diagnostics only. The caller logs them; they never abort a
/// batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("unterminated <tool> tag at byte {offset}")]
    UnterminatedTool { offset: usize },

    #[error("empty tool name at byte {offset}")]
    EmptyToolName { offset: usize },

    #[error("<tool>{tool}</tool> at byte {offset} is not followed by <params>")]
    MissingParams { tool: String, offset: usize },

    #[error("unterminated <params> for '{tool}' at byte {offset}")]
    UnterminatedParams { tool: String, offset: usize },

    #[error("params for '{tool}' are not a JSON object")]
    NotAnObject { tool: String },

    #[error("could not decode params for '{tool}': {reason}")]
    MalformedParams { tool: String, reason: String },
}

/// Everything one scan produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    /// Calls in document order.
    pub calls: Vec<ToolCall>,
    /// Fragments that were dropped, in document order.
    pub failures: Vec<ParseFailure>,
    /// How many of `calls` came out of degraded extraction.
    pub recovered: usize,
}

/// Extract every well-formed tool call from `text`, in order of appearance.
pub fn parse_tool_calls(text: &str) -> Vec<ToolCall> {
    ToolCallScanner::new(text).scan().calls
}

/// Single-pass scanner over model output.
pub struct ToolCallScanner<'a> {
    src: &'a str,
    pos: usize,
    report: ScanReport,
}

impl<'a> ToolCallScanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            report: ScanReport::default(),
        }
    }

    pub fn scan(mut self) -> ScanReport {
        while self.scan_call() {}
        self.report
    }

    /// Parse one `<tool>…</tool><params>…</params>` pair starting at the next
    /// `<tool>`. Returns `false` once nothing further can match.
    fn scan_call(&mut self) -> bool {
        let Some(open) = self.find(TOOL_OPEN) else {
            return false;
        };
        let name_start = open + TOOL_OPEN.len();
        self.pos = name_start;

        let Some(close) = self.find(TOOL_CLOSE) else {
            self.fail(ParseFailure::UnterminatedTool { offset: open });
            return false;
        };

        let raw_name = &self.src[name_start..close];
        if let Some(inner) = raw_name.rfind(TOOL_OPEN) {
            // `<tool>a <tool>b</tool>`: the outer tag is an orphan, rescan from the inner one.
            self.fail(ParseFailure::UnterminatedTool { offset: open });
            self.pos = name_start + inner;
            return true;
        }

        let name = raw_name.trim();
        self.pos = close + TOOL_CLOSE.len();
        if name.is_empty() {
            self.fail(ParseFailure::EmptyToolName { offset: open });
            return true;
        }

        self.skip_whitespace();
        if !self.src[self.pos..].starts_with(PARAMS_OPEN) {
            self.fail(ParseFailure::MissingParams {
                tool: name.to_string(),
                offset: open,
            });
            return true;
        }

        let body_start = self.pos + PARAMS_OPEN.len();
        self.pos = body_start;
        let Some(body_end) = self.find(PARAMS_CLOSE) else {
            self.fail(ParseFailure::UnterminatedParams {
                tool: name.to_string(),
                offset: open,
            });
            return false;
        };
        self.pos = body_end + PARAMS_CLOSE.len();

        match decode_params(&self.src[body_start..body_end]) {
            Ok(ParamsDecoding::Strict(params)) => {
                self.report.calls.push(ToolCall::with_arguments(name, params));
            }
            Ok(ParamsDecoding::Recovered(params)) => {
                self.report.recovered += 1;
                self.report.calls.push(ToolCall::with_arguments(name, params));
            }
            Err(DecodeError::NotAnObject) => {
                self.fail(ParseFailure::NotAnObject {
                    tool: name.to_string(),
                });
            }
            Err(DecodeError::Malformed(reason)) => {
                self.fail(ParseFailure::MalformedParams {
                    tool: name.to_string(),
                    reason,
                });
            }
        }
        true
    }

    fn find(&self, needle: &str) -> Option<usize> {
        self.src[self.pos..].find(needle).map(|i| i + self.pos)
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn fail(&mut self, failure: ParseFailure) {
        self.report.failures.push(failure);
    }
}

/// How a params body was decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamsDecoding {
    Strict(ToolParams),
    Recovered(ToolParams),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    NotAnObject,
    Malformed(String),
}

/// Decode a raw `<params>` body: clean it, try strict JSON, then fall back
/// to [`recover_params`].
pub fn decode_params(body: &str) -> Result<ParamsDecoding, DecodeError> {
    let cleaned = clean_params_body(body);
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Object(map)) => Ok(ParamsDecoding::Strict(map.into_iter().collect())),
        Ok(_) => Err(DecodeError::NotAnObject),
        Err(e) => recover_params(&cleaned)
            .map(ParamsDecoding::Recovered)
            .ok_or_else(|| DecodeError::Malformed(e.to_string())),
    }
}

/// Trim the body and drop stray `>` characters that leak from model output
/// (`{...}>` or a dangling `>` before `</params>`).
pub fn clean_params_body(body: &str) -> String {
    let mut cleaned = body.trim().replace("}>", "}");
    loop {
        let trimmed = cleaned.trim_end();
        match trimmed.strip_suffix('>') {
            Some(stripped) => cleaned = stripped.to_string(),
            None => {
                cleaned.truncate(trimmed.len());
                return cleaned;
            }
        }
    }
}

/// Degraded extraction for bodies that are not valid JSON.
///
/// Looks for a `"path": "<no quotes>"` field and a `"content": "…"` field
/// whose value runs up to the last quote of the object, then decodes JSON
/// escapes inside the content. Returns `None` unless both fields are found.
pub fn recover_params(body: &str) -> Option<ToolParams> {
    let path = find_path_field(body)?;
    let content = find_content_field(body)?;

    let mut params = ToolParams::new();
    params.insert("path".to_string(), Value::String(path.to_string()));
    params.insert(
        "content".to_string(),
        Value::String(unescape_json_fragment(content)),
    );
    Some(params)
}

/// Position just past `"key"\s*:\s*"`, for every occurrence of the key.
fn string_value_starts<'b>(body: &'b str, key: &'b str) -> impl Iterator<Item = usize> + 'b {
    body.match_indices(key).filter_map(move |(at, _)| {
        let mut pos = at + key.len();
        pos += leading_ws(&body[pos..]);
        pos += body[pos..].strip_prefix(':').map(|_| 1)?;
        pos += leading_ws(&body[pos..]);
        body[pos..].strip_prefix('"').map(|_| pos + 1)
    })
}

fn leading_ws(s: &str) -> usize {
    s.len() - s.trim_start().len()
}

fn find_path_field(body: &str) -> Option<&str> {
    string_value_starts(body, "\"path\"").find_map(|start| {
        let len = body[start..].find('"')?;
        (len > 0).then(|| &body[start..start + len])
    })
}

fn find_content_field(body: &str) -> Option<&str> {
    string_value_starts(body, "\"content\"").find_map(|start| {
        body[start..]
            .match_indices('"')
            .map(|(i, _)| start + i)
            .find(|&quote| closes_object(&body[quote + 1..]))
            .map(|end| &body[start..end])
    })
}

/// True if `rest` is optional whitespace, an optional `}`, then whitespace.
fn closes_object(rest: &str) -> bool {
    let rest = rest.trim_start();
    rest.strip_prefix('}').unwrap_or(rest).trim().is_empty()
}

/// Decode JSON string escapes in one pass. Unknown escapes are kept as written.
pub fn unescape_json_fragment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('u') => push_unicode_escape(&mut chars, &mut out),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn push_unicode_escape(chars: &mut Chars<'_>, out: &mut String) {
    let hex: String = chars.clone().take(4).collect();
    let decoded = (hex.len() == 4)
        .then(|| u32::from_str_radix(&hex, 16).ok())
        .flatten()
        .and_then(char::from_u32);
    match decoded {
        Some(ch) => {
            out.push(ch);
            for _ in 0..4 {
                chars.next();
            }
        }
        None => out.push_str("\\u"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_pairs_in_document_order() {
        let text = r#"First I'll write it.
<tool>write_file</tool>
<params>{"path": "a.txt", "content": "hi"}</params>
Then read it back.
<tool>read_file</tool><params>{"path": "a.txt"}</params>"#;

        let calls = parse_tool_calls(text);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].tool_name, "write_file");
        assert_eq!(calls[0].get_string("content"), Some("hi"));
        assert_eq!(calls[1].tool_name, "read_file");
        assert_eq!(calls[1].get_string("path"), Some("a.txt"));
    }

    #[test]
    fn orphan_tool_tag_does_not_affect_following_pairs() {
        let text = "<tool>list_dir</tool> I changed my mind.\n\
                    <tool>read_file</tool>\n<params>{\"path\": \"b.txt\"}</params>";

        let report = ToolCallScanner::new(text).scan();
        assert_eq!(report.calls.len(), 1);
        assert_eq!(report.calls[0].tool_name, "read_file");
        assert_eq!(
            report.failures,
            vec![ParseFailure::MissingParams {
                tool: "list_dir".to_string(),
                offset: 0
            }]
        );
    }

    #[test]
    fn nested_open_tag_rescans_from_inner_tag() {
        let text = "<tool>oops <tool>grep</tool><params>{\"pattern\": \"TODO\"}</params>";
        let report = ToolCallScanner::new(text).scan();
        assert_eq!(report.calls.len(), 1);
        assert_eq!(report.calls[0].tool_name, "grep");
        assert!(matches!(
            report.failures[0],
            ParseFailure::UnterminatedTool { offset: 0 }
        ));
    }

    #[test]
    fn params_may_span_lines_and_name_is_trimmed() {
        let text = "<tool> write_file </tool>\n\n  <params>\n{\n  \"path\": \"x\",\n  \"content\": \"a\\nb\"\n}\n</params>";
        let calls = parse_tool_calls(text);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tool_name, "write_file");
        assert_eq!(calls[0].get_string("content"), Some("a\nb"));
    }

    #[test]
    fn strips_trailing_angle_artifacts() {
        let text = "<tool>read_file</tool><params>{\"path\": \"a\"}></params>\n\
                    <tool>list_dir</tool><params>{\"path\": \".\"} >\n</params>";
        let calls = parse_tool_calls(text);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].get_string("path"), Some("."));
    }

    #[test]
    fn degraded_extraction_recovers_path_and_content() {
        let text = "<tool>write_file</tool>\n<params>{\"path\": \"hello.py\", \"content\": \"print(\"hi\")\\nprint(\\\"bye\\\")\"}</params>";

        let report = ToolCallScanner::new(text).scan();
        assert_eq!(report.recovered, 1);
        assert_eq!(report.calls.len(), 1);
        let call = &report.calls[0];
        assert_eq!(call.get_string("path"), Some("hello.py"));
        assert_eq!(
            call.get_string("content"),
            Some("print(\"hi\")\nprint(\"bye\")")
        );
    }

    #[test]
    fn unrecoverable_params_are_dropped_and_scan_continues() {
        let text = "<tool>grep</tool><params>{pattern: TODO</params>\n\
                    <tool>list_dir</tool><params>{}</params>";
        let report = ToolCallScanner::new(text).scan();
        assert_eq!(report.calls.len(), 1);
        assert_eq!(report.calls[0].tool_name, "list_dir");
        assert!(matches!(
            &report.failures[0],
            ParseFailure::MalformedParams { tool, .. } if tool == "grep"
        ));
    }

    #[test]
    fn non_object_params_are_a_parse_failure() {
        let report = ToolCallScanner::new("<tool>x</tool><params>[1, 2]</params>").scan();
        assert!(report.calls.is_empty());
        assert_eq!(
            report.failures,
            vec![ParseFailure::NotAnObject {
                tool: "x".to_string()
            }]
        );
    }

    #[test]
    fn unterminated_params_ends_scan() {
        let report = ToolCallScanner::new("<tool>read_file</tool><params>{\"path\": \"a\"}").scan();
        assert!(report.calls.is_empty());
        assert!(matches!(
            report.failures[0],
            ParseFailure::UnterminatedParams { .. }
        ));
    }

    #[test]
    fn empty_name_is_skipped() {
        let report = ToolCallScanner::new("<tool> </tool><params>{}</params>").scan();
        assert!(report.calls.is_empty());
        assert!(matches!(
            report.failures[0],
            ParseFailure::EmptyToolName { .. }
        ));
    }

    #[test]
    fn text_without_tags_yields_nothing() {
        let report = ToolCallScanner::new("Just chatting, no tools here.").scan();
        assert_eq!(report, ScanReport::default());
    }

    #[test]
    fn recover_params_requires_both_fields() {
        assert!(recover_params(r#"{"path": "a.txt", oops}"#).is_none());
        assert!(recover_params(r#"{"content": "x"}"#).is_none());
        assert!(recover_params(r#"{"path": "", "content": "x"}"#).is_none());

        let params = recover_params("{\"path\" : \"a.txt\" , \"content\":\"line \"1\"\" }").unwrap();
        assert_eq!(params.get("path"), Some(&json!("a.txt")));
        assert_eq!(params.get("content"), Some(&json!("line \"1\"")));
    }

    #[test]
    fn clean_params_body_handles_repeated_artifacts() {
        assert_eq!(clean_params_body("  {\"a\": 1}> >  "), "{\"a\": 1}");
        assert_eq!(clean_params_body("{\"a\": {\"b\": 1}>}"), "{\"a\": {\"b\": 1}}");
    }

    #[test]
    fn unescape_handles_standard_and_unknown_escapes() {
        assert_eq!(unescape_json_fragment(r#"a\tb\\n\"c\""#), "a\tb\\n\"c\"");
        assert_eq!(unescape_json_fragment(r"\u0041\u00e9"), "A\u{e9}");
        assert_eq!(unescape_json_fragment(r"\q\u12"), "\\q\\u12");
        assert_eq!(unescape_json_fragment("trailing\\"), "trailing\\");
    }
}
