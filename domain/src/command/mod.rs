//! Shell-command side of the conversation: extraction from replies,
//! safety classification, and the shape of an execution result.

pub mod extractor;
pub mod output;
pub mod policy;

pub use extractor::{command_preview, extract_commands};
pub use output::{CommandOutput, format_timeout};
pub use policy::{CommandClass, CommandPolicy};
