//! CLI entrypoint for shellpilot
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use clap::Parser;
use shellpilot_application::{
    ConfirmationPort, Conversation, ConversationLogger, LlmGateway, NoConversationLogger,
    RunAgentUseCase, RunShellLoopUseCase, SystemContextProvider,
};
use shellpilot_infrastructure::shell::CaptureLimits;
use shellpilot_infrastructure::{
    ConfigLoader, FileConfig, JsonlConversationLogger, LspPool, OpenAiCompatibleGateway,
    SessionHandle, SessionStore, ShellExecutor, ShellSession, ToolContext, ToolRegistry,
    builtin_registry,
};
use shellpilot_presentation::chat::stdin::{answer_once, prepare_input, read_stdin};
use shellpilot_presentation::{ChatRepl, Cli, ConsoleConfirmation, ReplHost};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const LOG_FILE_PREFIX: &str = "shellpilot.log";

/// Filter directive for `-v` repetitions.
fn verbosity_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    }
}

/// stderr logging, plus a daily rolling file in `log_dir` when given.
///
/// `RUST_LOG` overrides the verbosity flag. The returned guard must live
/// until exit so buffered file lines get written.
fn init_tracing(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(verbosity_directive(verbose)))
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(filter());

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
    }
    .map_err(|e| anyhow!("{}", e))
    .context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Stops helpers and resets the shell overlay for the REPL.
struct Host {
    shell: Arc<ShellExecutor>,
    registry: Arc<ToolRegistry>,
}

#[async_trait]
impl ReplHost for Host {
    fn reset_shell_session(&self) {
        self.shell.reset();
    }

    async fn shutdown(&self) {
        self.registry.shutdown().await;
    }
}

fn conversation_logger(
    config: &FileConfig,
    log_dir: Option<&PathBuf>,
) -> Option<Arc<dyn ConversationLogger>> {
    if !config.logging.conversation_log {
        return None;
    }
    let logger = log_dir.and_then(|dir| JsonlConversationLogger::in_dir(dir));
    if logger.is_none() {
        warn!("conversation_log is on but no usable log directory was given");
    }
    logger.map(|l| Arc::new(l) as Arc<dyn ConversationLogger>)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    let log_dir = cli.log_dir.clone().or_else(|| config.logging.dir.clone());
    let _guard = init_tracing(cli.verbose, log_dir.as_deref());

    info!("Starting shellpilot");

    let model = cli.model.clone().unwrap_or_else(|| config.model.name.clone());

    // === Dependency Injection ===
    let fallback = ShellSession::from_current_dir();
    let store = config
        .session
        .persist
        .then(|| SessionStore::new(config.session.path()));
    let initial = match &store {
        Some(store) => store.restore_or(fallback.clone()),
        None => fallback.clone(),
    };
    let restored = initial.working_dir != fallback.working_dir;
    let session = SessionHandle::new(initial);

    let limits = CaptureLimits {
        timeout: Duration::from_secs(config.tools.command_timeout_secs),
        max_output_bytes: config.tools.max_output_bytes,
    };
    let mut shell = ShellExecutor::new(session.clone()).with_limits(limits);
    if let Some(store) = store {
        shell = shell.with_store(store);
    }
    let shell = Arc::new(shell);
    let context: Arc<dyn SystemContextProvider> = shell.clone();

    let gateway: Arc<dyn LlmGateway> = Arc::new(OpenAiCompatibleGateway::new(
        config.model.to_gateway_settings(),
    )?);
    let logger = conversation_logger(&config, log_dir.as_ref())
        .unwrap_or_else(|| Arc::new(NoConversationLogger));

    if cli.stdin {
        let raw = read_stdin().await.context("failed to read stdin")?;
        let Some(message) = prepare_input(&raw) else {
            eprintln!("No input provided");
            return Ok(ExitCode::FAILURE);
        };
        let conversation = Conversation::new(gateway.create_session(&model).await?, context)
            .with_conversation_logger(logger);
        return match answer_once(&conversation, message).await? {
            Some(reply) => {
                println!("{}", reply);
                Ok(ExitCode::SUCCESS)
            }
            None => {
                eprintln!("No response received");
                Ok(ExitCode::FAILURE)
            }
        };
    }

    let lsp_pool = Arc::new(LspPool::new(config.lsp.servers.clone(), session.clone()));
    let tool_context = ToolContext::new(session, config.tools.to_settings());
    let registry = Arc::new(builtin_registry(tool_context, lsp_pool));

    let params = config.agent.to_loop_params();
    let confirmation: Arc<dyn ConfirmationPort> = Arc::new(ConsoleConfirmation::new());
    let agent = RunAgentUseCase::new(registry.clone(), params.clone())
        .with_command_gate(config.safety.to_policy(), confirmation.clone())
        .with_conversation_logger(logger.clone());
    let shell_loop = RunShellLoopUseCase::new(
        shell.clone(),
        confirmation,
        config.safety.to_policy(),
        params,
    )
    .with_conversation_logger(logger.clone());

    if restored {
        println!("📂 Restored session: {}", shell.session().working_dir().display());
    }

    let host = Arc::new(Host {
        shell: shell.clone(),
        registry: registry.clone(),
    });
    let mut repl = ChatRepl::new(gateway, context, host, registry.clone(), agent, shell_loop, model)
        .with_mode(cli.mode.into())
        .with_conversation_logger(logger)
        .with_verbose(cli.verbose > 0);

    let result = repl.run().await;
    registry.shutdown().await;
    result?;

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(verbosity_directive(0), "warn");
        assert_eq!(verbosity_directive(1), "info");
        assert_eq!(verbosity_directive(2), "debug");
        assert_eq!(verbosity_directive(3), "trace");
        assert_eq!(verbosity_directive(9), "trace");
    }

    #[test]
    fn test_conversation_log_off_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = FileConfig::default();
        assert!(conversation_logger(&config, Some(&dir.path().to_path_buf())).is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_conversation_log_needs_a_directory() {
        let mut config = FileConfig::default();
        config.logging.conversation_log = true;
        assert!(conversation_logger(&config, None).is_none());

        let dir = tempfile::tempdir().unwrap();
        assert!(conversation_logger(&config, Some(&dir.path().to_path_buf())).is_some());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
