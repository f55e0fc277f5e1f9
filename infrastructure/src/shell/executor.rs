//! Shell executor adapter
//!
//! Implements [`ShellExecutorPort`] on top of the session overlay: `cd` and
//! `export` update the overlay, everything else runs through `bash -c`.
//! The overlay is saved after every change when a [`SessionStore`] is set.

use super::interactive::run_interactive;
use super::process::{CaptureLimits, run_captured};
use super::session::{SessionHandle, ShellSession};
use super::store::SessionStore;
use async_trait::async_trait;
use shellpilot_application::ports::context_provider::SystemContextProvider;
use shellpilot_application::ports::shell_executor::ShellExecutorPort;
use shellpilot_domain::{CommandOutput, SystemContext};
use tracing::warn;

pub struct ShellExecutor {
    session: SessionHandle,
    limits: CaptureLimits,
    store: Option<SessionStore>,
}

impl ShellExecutor {
    pub fn new(session: SessionHandle) -> Self {
        Self {
            session,
            limits: CaptureLimits::default(),
            store: None,
        }
    }

    pub fn with_limits(mut self, limits: CaptureLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_store(mut self, store: SessionStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Back to the process's current directory with no exported variables.
    pub fn reset(&self) {
        self.session.replace(ShellSession::from_current_dir());
        self.persist();
    }

    fn persist(&self) {
        if let Some(store) = &self.store
            && let Err(e) = store.save(&self.session.snapshot())
        {
            warn!("Could not save session: {}", e);
        }
    }
}

#[async_trait]
impl ShellExecutorPort for ShellExecutor {
    async fn execute(&self, command: &str) -> CommandOutput {
        if let Some(message) = self.session.apply_builtin(command) {
            self.persist();
            return if message.starts_with("Error:") {
                CommandOutput::failure(Some(1), message)
            } else {
                CommandOutput::success(message)
            };
        }
        run_captured(command, &self.session.snapshot(), self.limits).await
    }

    async fn execute_interactive(&self, command: &str) -> CommandOutput {
        run_interactive(command, &self.session.snapshot()).await
    }
}

impl SystemContextProvider for ShellExecutor {
    fn system_context(&self) -> SystemContext {
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string());
        SystemContext::new(std::env::consts::OS, user, self.session.working_dir())
    }
}
