//! Language server commands from TOML (`[lsp]` section)

use crate::tools::default_servers;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw LSP configuration from TOML
///
/// ```toml
/// [lsp.servers]
/// python = "pyright-langserver --stdio"
/// ```
///
/// Entries are merged over the built-in table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLspConfig {
    /// Language id -> command line
    pub servers: BTreeMap<String, String>,
}

impl Default for FileLspConfig {
    fn default() -> Self {
        Self {
            servers: default_servers(),
        }
    }
}
