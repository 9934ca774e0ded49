use std::path::{Path, PathBuf};

use thiserror::Error;

mod loader;
mod paths;

pub use loader::RcLoader;
pub use paths::{ConfigPaths, HISTORY_ENV};

use super::commands::CommandError;
use super::env::EnvError;
use super::parser::ParseError;
use crate::flags::Flags;
use crate::input::history::DEFAULT_MAX_HISTORY;

/// Startup settings, resolved from flags, the environment and defaults in
/// that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub rc_path: PathBuf,
    pub history_path: PathBuf,
    pub max_history: usize,
    pub quiet: bool,
    pub debug: bool,
    /// Address for the HTTP front-end; `None` runs the interactive shell.
    pub serve: Option<String>,
}

impl Config {
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self::with_paths(ConfigPaths::new()?))
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Config {
            rc_path: paths.rc_path,
            history_path: paths.history_path,
            max_history: DEFAULT_MAX_HISTORY,
            quiet: false,
            debug: false,
            serve: None,
        }
    }

    pub fn from_flags(flags: &Flags) -> Result<Self, ConfigError> {
        Self::from_flags_in(dirs::home_dir().as_deref(), flags)
    }

    fn from_flags_in(home: Option<&Path>, flags: &Flags) -> Result<Self, ConfigError> {
        let paths = ConfigPaths::resolve(
            home,
            flags.get_value("config").map(Path::new),
            flags.get_value("history-file").map(Path::new),
        )?;
        let mut config = Self::with_paths(paths);
        config.apply_flags(flags)?;
        Ok(config)
    }

    fn apply_flags(&mut self, flags: &Flags) -> Result<(), ConfigError> {
        if let Some(rc) = flags.get_value("config") {
            self.rc_path = PathBuf::from(rc);
        }
        if let Some(history) = flags.get_value("history-file") {
            self.history_path = PathBuf::from(history);
        }
        if let Some(max) = flags.get_value("max-history") {
            self.max_history = match max.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        flag: "--max-history",
                        value: max.to_string(),
                    })
                }
            };
        }
        self.quiet = flags.is_set("quiet");
        self.debug = flags.is_set("debug");
        self.serve = flags.get_value("serve").map(str::to_string);
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Home directory not found")]
    HomeDirNotFound,
    #[error("invalid value {value:?} for {flag}")]
    InvalidValue { flag: &'static str, value: String },
    #[error("unrecognized line: {0}")]
    InvalidLine(String),
    #[error("alias target not found: {0}")]
    UnknownCommand(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Env(#[from] EnvError),
    #[error("{0}")]
    Command(#[from] CommandError),
}
