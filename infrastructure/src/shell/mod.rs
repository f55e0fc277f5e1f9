//! Shell adapters: the session overlay, captured and interactive execution,
//! and overlay persistence.

pub mod executor;
pub mod interactive;
pub mod process;
pub mod session;
pub mod store;

pub use executor::ShellExecutor;
pub use interactive::{TerminalGuard, run_interactive};
pub use process::{CaptureLimits, DEFAULT_COMMAND_TIMEOUT, DEFAULT_MAX_OUTPUT_BYTES, run_captured};
pub use session::{SessionHandle, ShellSession};
pub use store::{SessionStore, SessionStoreError};
