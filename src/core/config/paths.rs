use super::ConfigError;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable that overrides where history is stored.
pub const HISTORY_ENV: &str = "TERMINA_HISTORY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub rc_path: PathBuf,
    pub history_path: PathBuf,
}

impl ConfigPaths {
    pub fn new() -> Result<Self, ConfigError> {
        Self::resolve(dirs::home_dir().as_deref(), None, None)
    }

    /// Explicit paths first, then `TERMINA_HISTORY` for history, then the
    /// home directory. `home` is only required for a path nothing else gave.
    pub fn resolve(
        home: Option<&Path>,
        rc: Option<&Path>,
        history: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let in_home = |name: &str| {
            home.map(|home| home.join(name))
                .ok_or(ConfigError::HomeDirNotFound)
        };

        let history_path = match history {
            Some(path) => path.to_path_buf(),
            None => match env::var_os(HISTORY_ENV).filter(|v| !v.is_empty()) {
                Some(path) => PathBuf::from(path),
                None => in_home(".termina_history")?,
            },
        };
        let rc_path = match rc {
            Some(path) => path.to_path_buf(),
            None => in_home(".terminarc")?,
        };

        Ok(ConfigPaths {
            rc_path,
            history_path,
        })
    }

    pub fn in_home(home: &Path) -> Self {
        ConfigPaths {
            rc_path: home.join(".terminarc"),
            history_path: home.join(".termina_history"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_in_home() {
        let paths = ConfigPaths::in_home(Path::new("/home/testuser"));
        assert_eq!(paths.rc_path, PathBuf::from("/home/testuser/.terminarc"));
        assert_eq!(
            paths.history_path,
            PathBuf::from("/home/testuser/.termina_history")
        );
    }

    #[test]
    #[serial]
    fn test_history_override() {
        if dirs::home_dir().is_none() {
            return;
        }
        env::set_var(HISTORY_ENV, "/tmp/elsewhere.json");
        let paths = ConfigPaths::new().unwrap();
        env::remove_var(HISTORY_ENV);

        assert_eq!(paths.history_path, PathBuf::from("/tmp/elsewhere.json"));
        assert!(paths.rc_path.ends_with(".terminarc"));
    }

    #[test]
    #[serial]
    fn test_resolve_without_home() {
        let saved = env::var_os(HISTORY_ENV);
        env::remove_var(HISTORY_ENV);

        let paths = ConfigPaths::resolve(
            None,
            Some(Path::new("/etc/termrc")),
            Some(Path::new("/tmp/hist.json")),
        )
        .unwrap();
        assert_eq!(paths.rc_path, PathBuf::from("/etc/termrc"));
        assert_eq!(paths.history_path, PathBuf::from("/tmp/hist.json"));

        let err = ConfigPaths::resolve(None, Some(Path::new("/etc/termrc")), None).unwrap_err();
        assert!(matches!(err, ConfigError::HomeDirNotFound));

        env::set_var(HISTORY_ENV, "/tmp/from-env.json");
        let paths = ConfigPaths::resolve(None, Some(Path::new("/etc/termrc")), None).unwrap();
        assert_eq!(paths.history_path, PathBuf::from("/tmp/from-env.json"));

        match saved {
            Some(value) => env::set_var(HISTORY_ENV, value),
            None => env::remove_var(HISTORY_ENV),
        }
    }
}
