use std::env;
use std::path::{Path, PathBuf};

use log::debug;

use super::env::{EnvError, EnvVarManager};
use crate::path::normalize;
use crate::process::host;

/// Mutable context shared by every command of one session.
///
/// The working directory always names an existing directory: it is set once
/// at construction and only replaced by [`SessionState::set_current_directory`]
/// after the target has been checked.
#[derive(Debug, Clone)]
pub struct SessionState {
    current_dir: PathBuf,
    previous_dir: Option<PathBuf>,
    env_vars: EnvVarManager,
    user: String,
    host: String,
}

impl SessionState {
    /// Build the state from the process: working directory, environment,
    /// user and host name.
    pub fn new() -> Result<Self, EnvError> {
        let current_dir = normalize(&env::current_dir()?);
        Ok(Self {
            current_dir,
            previous_dir: None,
            env_vars: EnvVarManager::from_process(),
            user: detect_user(),
            host: detect_host(),
        })
    }

    /// State rooted at `dir` with the given identity. `dir` must be an
    /// existing absolute directory.
    pub fn with_identity(
        dir: impl AsRef<Path>,
        user: impl Into<String>,
        host: impl Into<String>,
    ) -> Result<Self, EnvError> {
        let dir = normalize(dir.as_ref());
        if !dir.is_absolute() || !dir.is_dir() {
            return Err(EnvError::CurrentDir(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("not a directory: {}", dir.display()),
            )));
        }

        Ok(Self {
            current_dir: dir,
            previous_dir: None,
            env_vars: EnvVarManager::from_process(),
            user: user.into(),
            host: host.into(),
        })
    }

    pub fn current_directory(&self) -> &Path {
        &self.current_dir
    }

    /// The directory that was current before the last successful change.
    pub fn previous_directory(&self) -> Option<&Path> {
        self.previous_dir.as_deref()
    }

    /// Change the working directory. Relative paths are taken from the current
    /// directory. Returns `false` and leaves the state untouched when the
    /// target is not an existing directory.
    pub fn set_current_directory(&mut self, path: impl AsRef<Path>) -> bool {
        let target = self.resolve(path);
        if !target.is_dir() {
            debug!("cd rejected, not a directory: {}", target.display());
            return false;
        }

        let previous = std::mem::replace(&mut self.current_dir, target);
        self.previous_dir = Some(previous);
        true
    }

    /// Absolute, normalized form of `path`. Purely lexical.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            normalize(path)
        } else {
            normalize(&self.current_dir.join(path))
        }
    }

    /// Value of `name`, or an empty string when unset.
    pub fn get_env(&self, name: &str) -> &str {
        self.env_vars.get(name).unwrap_or("")
    }

    /// Set a variable for the session. This also calls `std::env::set_var`,
    /// so the change is visible to the whole process.
    pub fn set_env(&mut self, name: &str, value: &str) -> Result<(), EnvError> {
        self.env_vars.set(name, value)
    }

    pub fn env_vars(&self) -> &EnvVarManager {
        &self.env_vars
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn prompt(&self) -> String {
        let dirname = self
            .current_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.current_dir.display().to_string());
        format!("{}@{}:{}$ ", self.user, self.host, dirname)
    }
}

fn first_env(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|value| !value.is_empty())
}

fn detect_user() -> String {
    first_env(&["USER", "USERNAME", "LOGNAME"]).unwrap_or_else(|| "user".to_string())
}

fn detect_host() -> String {
    first_env(&["HOSTNAME", "COMPUTERNAME"])
        .or_else(host::host_name)
        .unwrap_or_else(|| "localhost".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn state_in(dir: &Path) -> SessionState {
        SessionState::with_identity(dir, "alice", "box").unwrap()
    }

    #[test]
    fn test_cd_relative_and_back() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        let root = normalize(tmp.path());
        let mut state = state_in(&root);

        assert!(state.set_current_directory("sub"));
        assert_eq!(state.current_directory(), root.join("sub"));
        assert_eq!(state.previous_directory(), Some(root.as_path()));

        assert!(state.set_current_directory(".."));
        assert_eq!(state.current_directory(), root);
    }

    #[test]
    fn test_cd_nonexistent_leaves_state() {
        let tmp = TempDir::new().unwrap();
        let mut state = state_in(tmp.path());
        let before = state.current_directory().to_path_buf();

        assert!(!state.set_current_directory("missing"));
        assert!(!state.set_current_directory("/definitely/not/here"));
        assert_eq!(state.current_directory(), before);
        assert_eq!(state.previous_directory(), None);
    }

    #[test]
    fn test_cd_to_file_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("file.txt"), "x").unwrap();
        let mut state = state_in(tmp.path());
        assert!(!state.set_current_directory("file.txt"));
    }

    #[test]
    fn test_resolve_is_lexical() {
        let tmp = TempDir::new().unwrap();
        let root = normalize(tmp.path());
        let state = state_in(&root);

        assert_eq!(state.resolve("a/./b/../c"), root.join("a").join("c"));
        assert_eq!(state.resolve("/x/../y"), PathBuf::from("/y"));
    }

    #[test]
    fn test_prompt() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("work")).unwrap();
        let mut state = state_in(tmp.path());
        assert!(state.set_current_directory("work"));
        assert_eq!(state.prompt(), "alice@box:work$ ");
    }

    #[cfg(unix)]
    #[test]
    fn test_prompt_at_root() {
        let state = state_in(Path::new("/"));
        assert_eq!(state.prompt(), "alice@box:/$ ");
    }

    #[test]
    #[serial]
    fn test_env_roundtrip_and_process_propagation() {
        let tmp = TempDir::new().unwrap();
        let mut state = state_in(tmp.path());

        assert_eq!(state.get_env("TERMINA_STATE_UNSET_VAR"), "");
        state.set_env("TERMINA_STATE_VAR", "value").unwrap();
        assert_eq!(state.get_env("TERMINA_STATE_VAR"), "value");
        assert_eq!(env::var("TERMINA_STATE_VAR").unwrap(), "value");
    }

    #[test]
    fn test_with_identity_rejects_missing_dir() {
        assert!(SessionState::with_identity("/no/such/dir/here", "u", "h").is_err());
        assert!(SessionState::with_identity("relative", "u", "h").is_err());
    }
}
