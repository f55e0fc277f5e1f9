//! Agent presentation components
//!
//! - Console prompts for executing shell commands
//! - Progress reporting for the agent loops

pub mod confirmation;
pub mod progress;

pub use confirmation::ConsoleConfirmation;
pub use progress::ConsoleProgress;
