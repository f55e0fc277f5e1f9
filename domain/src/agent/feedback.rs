//! Feedback turns: what the controller sends back after running actions.

use serde::{Deserialize, Serialize};

use crate::command::CommandOutput;
use crate::tool::{ToolCall, ToolError};

pub const TOOL_RESULTS_HEADER: &str = "[Tool Results]";
pub const COMMAND_RESULTS_HEADER: &str = "[Command Results]";
pub const COMMAND_RESULT_HEADER: &str = "[Command Result]";

/// Outcome of one action in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionRecord {
    Tool {
        call: ToolCall,
        outcome: Result<String, ToolError>,
    },
    Command {
        preview: String,
        output: CommandOutput,
    },
    /// A dangerous command the human declined. Not an error, and not
    /// reported to the model.
    Skipped { preview: String },
}

impl ActionRecord {
    pub fn feedback_entry(&self) -> Option<String> {
        match self {
            ActionRecord::Tool {
                call,
                outcome: Ok(output),
            } => Some(format!("[{}] Result:\n{}", call.tool_name, output)),
            ActionRecord::Tool {
                call,
                outcome: Err(err),
            } => Some(err.feedback_line(&call.tool_name)),
            ActionRecord::Command { preview, output } => {
                Some(format!("$ {}\n{}", preview, output.text))
            }
            ActionRecord::Skipped { .. } => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ActionRecord::Skipped { .. })
    }

    pub fn is_failure(&self) -> bool {
        match self {
            ActionRecord::Tool { outcome, .. } => outcome.is_err(),
            ActionRecord::Command { output, .. } => !output.is_success(),
            ActionRecord::Skipped { .. } => false,
        }
    }
}

/// Join a batch into one feedback message. `None` when every action was
/// skipped and there is nothing to report.
pub fn build_feedback(header: &str, records: &[ActionRecord]) -> Option<String> {
    let entries: Vec<String> = records.iter().filter_map(ActionRecord::feedback_entry).collect();
    if entries.is_empty() {
        None
    } else {
        Some(format!("{}\n{}", header, entries.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_feedback_mixes_results_and_errors() {
        let records = vec![
            ActionRecord::Tool {
                call: ToolCall::new("read_file").with_arg("path", "a"),
                outcome: Ok("hello".to_string()),
            },
            ActionRecord::Tool {
                call: ToolCall::new("nope"),
                outcome: Err(ToolError::unknown_tool("nope")),
            },
        ];
        assert_eq!(
            build_feedback(TOOL_RESULTS_HEADER, &records).unwrap(),
            "[Tool Results]\n[read_file] Result:\nhello\n[nope] Error: Tool not found: nope"
        );
        assert!(records[1].is_failure());
    }

    #[test]
    fn command_feedback_skips_refused_commands() {
        let records = vec![
            ActionRecord::Skipped {
                preview: "rm -rf /".into(),
            },
            ActionRecord::Command {
                preview: "ls".into(),
                output: CommandOutput::success("a\nb"),
            },
        ];
        assert_eq!(
            build_feedback(COMMAND_RESULTS_HEADER, &records).unwrap(),
            "[Command Results]\n$ ls\na\nb"
        );
    }

    #[test]
    fn all_skipped_means_no_feedback() {
        let records = vec![ActionRecord::Skipped {
            preview: "mkfs /dev/sda1".into(),
        }];
        assert!(build_feedback(COMMAND_RESULTS_HEADER, &records).is_none());
        assert!(records[0].is_skipped());
        assert!(!records[0].is_failure());
    }
}
