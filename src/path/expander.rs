use super::PathError;
use std::path::{Path, PathBuf};

/// Expands a leading `~` to the user's home directory.
#[derive(Clone, Debug, Default)]
pub struct PathExpander;

impl PathExpander {
    pub fn new() -> Self {
        Self
    }

    pub fn expand(&self, path: &str) -> Result<PathBuf, PathError> {
        if path.starts_with('~') {
            self.expand_tilde(path)
        } else {
            Ok(Path::new(path).to_path_buf())
        }
    }

    fn expand_tilde(&self, path: &str) -> Result<PathBuf, PathError> {
        if path.len() == 1 {
            return self.get_home_dir();
        }

        let without_tilde = &path[1..];
        if let Some(stripped) = without_tilde.strip_prefix('/') {
            let mut home_path = self.get_home_dir()?;
            for part in stripped.split('/').filter(|p| !p.is_empty()) {
                home_path.push(part);
            }
            Ok(home_path)
        } else {
            // ~user forms are passed through untouched
            Ok(Path::new(path).to_path_buf())
        }
    }

    pub fn get_home_dir(&self) -> Result<PathBuf, PathError> {
        dirs::home_dir().ok_or(PathError::HomeDirNotFound)
    }
}
