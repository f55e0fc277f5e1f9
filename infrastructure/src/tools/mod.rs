//! Tool implementations for the agent system
//!
//! Every tool is an async handler in a [`ToolRegistry`]. The built-in set
//! covers file editing, search, command and code execution, package
//! installation and language-server queries. All tools resolve relative
//! paths against the shell session's working directory, so a `cd` made in
//! shell mode applies to tool mode too.

pub mod builtin;
pub mod code;
pub mod command;
pub mod context;
pub mod file;
pub mod lsp;
pub mod registry;
pub mod search;

pub use builtin::{builtin_registry, register_builtin_tools};
pub use context::{DEFAULT_TREE_IGNORE, ToolContext, ToolSettings};
pub use lsp::{LspError, LspPool, default_servers};
pub use registry::{ToolHandler, ToolRegistry};
