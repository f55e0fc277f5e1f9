//! CLI command definitions

use clap::{Parser, ValueEnum};
use shellpilot_domain::LoopMode;
use std::path::PathBuf;

/// Which loop the REPL starts in
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Extract shell commands from replies and offer to run them
    Shell,
    /// Let the model call local tools through `<tool>` blocks
    Agent,
}

impl From<ModeArg> for LoopMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Shell => LoopMode::Shell,
            ModeArg::Agent => LoopMode::Agent,
        }
    }
}

/// CLI arguments for shellpilot
#[derive(Parser, Debug)]
#[command(name = "shellpilot")]
#[command(author, version, about = "Chat with a model that can run shell commands and local tools")]
#[command(long_about = r#"
shellpilot sends your messages to a chat model and acts on its replies.

Modes:
  shell   Commands in ```bash blocks are offered for execution (y/n/select/auto)
  agent   The model calls local tools (files, grep, shell, code intelligence)

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./shellpilot.toml   Project-level config
3. ~/.config/shellpilot/config.toml   Global config

Example:
  shellpilot
  shellpilot --mode agent --model openai/gpt-oss-120b:free
  echo "how do I list open ports?" | shellpilot --stdin
"#)]
pub struct Cli {
    /// Loop to start in
    #[arg(long, value_enum, default_value = "shell")]
    pub mode: ModeArg,

    /// Model to talk to (overrides [model] name)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Read one message from stdin, print the reply and exit
    #[arg(long)]
    pub stdin: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Directory for rolling trace logs and the conversation log
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}
