//! Progress reporting for the agent loops

use crate::output::ConsoleFormatter;
use colored::Colorize;
use shellpilot_application::AgentProgressNotifier;
use shellpilot_domain::{
    CommandOutput, LoopPhase, ParseFailure, TerminationReason, ToolCall, ToolError,
};
use std::io::{self, Write};

/// Prints loop progress to the terminal: the streamed reply, each action
/// with its output, and loop guard warnings.
pub struct ConsoleProgress {
    verbose: bool,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Also print phase transitions and parse failures
    pub fn verbose() -> Self {
        Self { verbose: true }
    }

    fn flush() {
        let _ = io::stdout().flush();
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentProgressNotifier for ConsoleProgress {
    fn on_phase_change(&self, phase: LoopPhase) {
        if self.verbose {
            println!("{}", format!("  · {}", phase.as_str()).dimmed());
        }
    }

    fn on_termination(&self, reason: &TerminationReason, iterations: usize) {
        if self.verbose {
            println!(
                "{}",
                format!("  · turn ended: {} ({} batches)", reason, iterations).dimmed()
            );
        }
    }

    fn on_llm_stream_start(&self) {
        print!("\n🤖 ");
        Self::flush();
    }

    fn on_llm_chunk(&self, chunk: &str) {
        print!("{}", chunk);
        Self::flush();
    }

    fn on_llm_stream_end(&self) {
        println!("\n");
    }

    fn on_parse_failure(&self, failure: &ParseFailure) {
        if self.verbose {
            println!("{} {}", "⚠ dropped tool block:".yellow(), failure);
        }
    }

    fn on_tool_call(&self, call: &ToolCall) {
        println!("{} {}", "🔧".cyan(), call.preview().cyan().bold());
    }

    fn on_tool_result(&self, _call: &ToolCall, result: &Result<String, ToolError>) {
        match result {
            Ok(output) => println!("{}", ConsoleFormatter::render(output)),
            Err(e) => println!("{} {}", "✗".red().bold(), e.to_string().red()),
        }
    }

    fn on_auto_execute(&self) {
        println!("\n{}", "⚠️  AUTO-EXEC MODE: Running commands...".yellow());
    }

    fn on_command_start(&self, preview: &str, interactive: bool) {
        if interactive {
            println!("\n{} {} {}", "$".cyan(), preview, "(interactive)".dimmed());
        } else {
            println!("\n{} {}", "$".cyan(), preview);
        }
    }

    fn on_command_result(&self, _preview: &str, output: &CommandOutput) {
        let rendered = ConsoleFormatter::render(&output.text);
        if output.is_success() {
            println!("{}", rendered);
        } else {
            println!("{}", rendered.red());
        }
    }

    fn on_command_skipped(&self, _preview: &str) {
        println!("{}", "✓ Skipped".green());
    }

    fn on_iteration_cap(&self, max_iterations: usize) {
        println!(
            "\n{}",
            format!(
                "⚠️  Reached the iteration limit ({}); stopping here.",
                max_iterations
            )
            .yellow()
            .bold()
        );
    }

    fn on_repeated_action(&self, tool_name: &str, streak: usize) {
        println!(
            "{}",
            format!(
                "⚠️  '{}' called {} times in a row with the same params; the model may be stuck.",
                tool_name, streak
            )
            .yellow()
        );
    }

    fn on_feedback_sent(&self, entries: usize) {
        let noun = if entries == 1 { "result" } else { "results" };
        println!("\n{}", format!("📤 Sent {} {} to the model", entries, noun).dimmed());
    }
}
