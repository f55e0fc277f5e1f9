//! Dangerous-command gate.

use crate::ports::confirmation::ConfirmationPort;
use shellpilot_domain::ToolCall;
use tracing::warn;

/// The shell line a tool call hands to `bash`, for the tools that build one
/// from their params: `run_command` runs `command` as is, `install_package`
/// splices `manager` and `package` into an install line.
pub fn tool_shell_text(call: &ToolCall) -> Option<String> {
    match call.tool_name.as_str() {
        "run_command" => call.get_string("command").map(str::to_string),
        "install_package" => {
            let manager = call.get_string("manager").unwrap_or_default();
            let package = call.get_string("package")?;
            Some(format!("{} install {}", manager, package))
        }
        _ => None,
    }
}

/// Ask the human before a dangerous command runs.
///
/// A failure to ask counts as a refusal.
pub async fn confirm_dangerous(command: &str, confirmation: &dyn ConfirmationPort) -> bool {
    match confirmation.confirm_dangerous(command).await {
        Ok(approved) => approved,
        Err(e) => {
            warn!("Could not confirm dangerous command, refusing: {}", e);
            false
        }
    }
}
