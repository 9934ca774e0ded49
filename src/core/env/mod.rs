mod vars;

pub use vars::EnvVarManager;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("Current directory unavailable: {0}")]
    CurrentDir(#[from] std::io::Error),
    #[error("Invalid variable name: {0:?}")]
    InvalidName(String),
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),
}
