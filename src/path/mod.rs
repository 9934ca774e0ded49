mod expander;
mod normalize;

pub use expander::PathExpander;
pub use normalize::normalize;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("Home directory not found")]
    HomeDirNotFound,
}
