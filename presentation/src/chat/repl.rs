//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::agent::progress::ConsoleProgress;
use crate::output::ConsoleFormatter;
use async_trait::async_trait;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use shellpilot_application::{
    Conversation, ConversationLogger, GatewayError, LlmGateway, NoConversationLogger,
    RunAgentUseCase, RunShellLoopUseCase, ShellExecutorPort, SystemContextProvider,
    ToolExecutorPort,
};
use shellpilot_domain::{AgentPromptTemplate, LoopMode, TerminationReason};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// What the REPL needs from the process that owns the adapters.
#[async_trait]
pub trait ReplHost: Send + Sync {
    /// Reset the working directory and exported variables (`clear`).
    fn reset_shell_session(&self);

    /// Stop helper processes before the REPL exits.
    async fn shutdown(&self);
}

/// Commands handled by the REPL itself rather than sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    Exit,
    Clear,
    Help,
    Tools,
    Mode(LoopMode),
    Model(String),
    ShowStatus,
    /// Looked like a command but could not be used; carries the message.
    Invalid(String),
}

/// Recognise a host command. `None` means the line is a message for the
/// model.
pub fn parse_host_command(line: &str) -> Option<HostCommand> {
    let line = line.trim();
    match line.to_lowercase().as_str() {
        "exit" | "quit" | "/exit" | "/quit" | "/q" => return Some(HostCommand::Exit),
        "clear" | "/clear" => return Some(HostCommand::Clear),
        "help" | "/help" | "/h" | "/?" => return Some(HostCommand::Help),
        "/tools" => return Some(HostCommand::Tools),
        "/mode" | "/model" => return Some(HostCommand::ShowStatus),
        _ => {}
    }

    let rest = line.strip_prefix('/')?;
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    Some(match name.to_lowercase().as_str() {
        "mode" => match LoopMode::from_str(arg) {
            Ok(mode) => HostCommand::Mode(mode),
            Err(e) => HostCommand::Invalid(e),
        },
        "model" => HostCommand::Model(arg.to_string()),
        other => HostCommand::Invalid(format!("Unknown command: /{}", other)),
    })
}

/// Interactive chat REPL
pub struct ChatRepl<T: ToolExecutorPort + 'static, S: ShellExecutorPort + 'static> {
    gateway: Arc<dyn LlmGateway>,
    context: Arc<dyn SystemContextProvider>,
    host: Arc<dyn ReplHost>,
    tools: Arc<T>,
    agent: RunAgentUseCase<T>,
    shell_loop: RunShellLoopUseCase<S>,
    logger: Arc<dyn ConversationLogger>,
    progress: ConsoleProgress,
    mode: LoopMode,
    model: String,
    conversation: Option<Conversation>,
}

impl<T: ToolExecutorPort + 'static, S: ShellExecutorPort + 'static> ChatRepl<T, S> {
    /// Create a new ChatRepl
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        context: Arc<dyn SystemContextProvider>,
        host: Arc<dyn ReplHost>,
        tools: Arc<T>,
        agent: RunAgentUseCase<T>,
        shell_loop: RunShellLoopUseCase<S>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            context,
            host,
            tools,
            agent,
            shell_loop,
            logger: Arc::new(NoConversationLogger),
            progress: ConsoleProgress::new(),
            mode: LoopMode::default(),
            model: model.into(),
            conversation: None,
        }
    }

    /// Set the loop the REPL starts in
    pub fn with_mode(mut self, mode: LoopMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set a conversation logger for the sessions this REPL opens
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Show phase transitions and dropped tool blocks
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.progress = if verbose {
            ConsoleProgress::verbose()
        } else {
            ConsoleProgress::new()
        };
        self
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        let history_path = dirs::data_dir().map(|p| p.join("shellpilot").join("history.txt"));

        if let Some(ref path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            match rl.readline("👤 You: ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(line);

                    if let Some(command) = parse_host_command(line) {
                        if self.handle_command(command).await {
                            break;
                        }
                        continue;
                    }

                    self.process_message(line).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    self.host.shutdown().await;
                    println!("\n👋 Goodbye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    self.host.shutdown().await;
                    break;
                }
            }
        }

        if let Some(ref path) = history_path {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", ConsoleFormatter::header("shellpilot").cyan());
        println!();
        println!("Model: {}   Mode: {}", self.model.bold(), self.mode.as_str().bold());
        println!("Type 'exit' to quit, 'clear' to start a new conversation, 'help' for commands");
        println!();
    }

    fn print_help(&self) {
        println!();
        println!("Commands:");
        println!("  exit, quit           - Stop helpers and exit");
        println!("  clear                - New conversation; reset directory and env vars");
        println!("  /mode shell|agent    - Switch loop (starts a new conversation)");
        println!("  /model <name>        - Switch model (starts a new conversation)");
        println!("  /tools               - List the tools available in agent mode");
        println!("  help                 - Show this help");
        println!();
    }

    /// Handle host commands. Returns true if should exit.
    async fn handle_command(&mut self, command: HostCommand) -> bool {
        match command {
            HostCommand::Exit => {
                self.host.shutdown().await;
                println!("\n👋 Goodbye!");
                return true;
            }
            HostCommand::Clear => {
                self.conversation = None;
                self.host.reset_shell_session();
                println!(
                    "\n🔄 New conversation started (working directory and env vars reset)\n"
                );
            }
            HostCommand::Help => self.print_help(),
            HostCommand::Tools => {
                println!();
                println!("{}", self.tools.tool_list());
                println!();
            }
            HostCommand::Mode(mode) => {
                if mode != self.mode {
                    self.mode = mode;
                    self.conversation = None;
                    info!(mode = mode.as_str(), "Switched loop mode");
                }
                println!("Mode: {}", mode.as_str().bold());
            }
            HostCommand::Model(name) if name.is_empty() => {
                println!("{}", "Usage: /model <name>".yellow());
            }
            HostCommand::Model(name) => {
                self.model = name;
                self.conversation = None;
                info!(model = %self.model, "Switched model");
                println!("Model: {} (new conversation)", self.model.bold());
            }
            HostCommand::ShowStatus => {
                println!("Model: {}   Mode: {}", self.model.bold(), self.mode.as_str().bold());
            }
            HostCommand::Invalid(message) => {
                println!("{}", message.yellow());
                println!("Type help for available commands");
            }
        }
        false
    }

    async fn open_conversation(&self) -> Result<Conversation, GatewayError> {
        let session = match self.mode {
            LoopMode::Shell => self.gateway.create_session(&self.model).await?,
            LoopMode::Agent => {
                let prompt = AgentPromptTemplate::agent_system(&self.tools.tool_list());
                self.gateway
                    .create_session_with_system_prompt(&self.model, &prompt)
                    .await?
            }
        };
        debug!(model = %self.model, mode = self.mode.as_str(), "Opened model session");
        Ok(Conversation::new(session, self.context.clone())
            .with_conversation_logger(self.logger.clone()))
    }

    async fn process_message(&mut self, message: &str) {
        if self.conversation.is_none() {
            match self.open_conversation().await {
                Ok(conversation) => self.conversation = Some(conversation),
                Err(e) => {
                    eprintln!("{} {}", "Error:".red().bold(), e);
                    return;
                }
            }
        }
        let Some(conversation) = self.conversation.as_ref() else {
            return;
        };

        let result = match self.mode {
            LoopMode::Shell => {
                self.shell_loop
                    .execute_with_progress(conversation, message, &self.progress)
                    .await
            }
            LoopMode::Agent => {
                self.agent
                    .execute_with_progress(conversation, message, &self.progress)
                    .await
            }
        };

        match result {
            Ok(outcome) => {
                if outcome.reason == TerminationReason::Refused {
                    debug!("Human declined the proposed commands");
                }
            }
            Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_and_clear() {
        assert_eq!(parse_host_command("exit"), Some(HostCommand::Exit));
        assert_eq!(parse_host_command("QUIT"), Some(HostCommand::Exit));
        assert_eq!(parse_host_command("/exit"), Some(HostCommand::Exit));
        assert_eq!(parse_host_command(" clear "), Some(HostCommand::Clear));
        assert_eq!(parse_host_command("help"), Some(HostCommand::Help));
        assert_eq!(parse_host_command("/tools"), Some(HostCommand::Tools));
    }

    #[test]
    fn test_mode_switch() {
        assert_eq!(
            parse_host_command("/mode agent"),
            Some(HostCommand::Mode(LoopMode::Agent))
        );
        assert_eq!(
            parse_host_command("/mode  Shell"),
            Some(HostCommand::Mode(LoopMode::Shell))
        );
        assert!(matches!(
            parse_host_command("/mode turbo"),
            Some(HostCommand::Invalid(_))
        ));
        assert_eq!(parse_host_command("/mode"), Some(HostCommand::ShowStatus));
    }

    #[test]
    fn test_model_switch_keeps_case() {
        assert_eq!(
            parse_host_command("/model openai/GPT-oss-120b:free"),
            Some(HostCommand::Model("openai/GPT-oss-120b:free".to_string()))
        );
    }

    #[test]
    fn test_messages_are_not_commands() {
        assert_eq!(parse_host_command("list files here"), None);
        assert_eq!(parse_host_command("exit the vim editor?"), None);
        assert_eq!(parse_host_command("clearly wrong"), None);
    }

    #[test]
    fn test_unknown_slash_command() {
        assert_eq!(
            parse_host_command("/logout"),
            Some(HostCommand::Invalid("Unknown command: /logout".to_string()))
        );
    }
}
