use thiserror::Error;

use crate::core::config::ConfigError;
use crate::core::env::EnvError;

/// Failures that end the program. Everything a single command can get wrong
/// is reported inline by the terminal instead.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Flag error: {0}")]
    Flag(String),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Session error: {0}")]
    Env(#[from] EnvError),
    #[error("Server error: {0}")]
    Server(String),
    #[error("Ctrl-C error: {0}")]
    CtrlC(#[from] ctrlc::Error),
}
