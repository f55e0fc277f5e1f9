//! Source of the `[SYSTEM: ...]` header for user turns.

use shellpilot_domain::SystemContext;

/// Supplies the current OS / user / working directory.
///
/// The working directory follows the shell session overlay, so this is
/// queried on every user turn rather than captured once.
pub trait SystemContextProvider: Send + Sync {
    fn system_context(&self) -> SystemContext;
}

/// Fixed context, for tests and one-shot runs.
pub struct StaticContext(pub SystemContext);

impl SystemContextProvider for StaticContext {
    fn system_context(&self) -> SystemContext {
        self.0.clone()
    }
}
