use std::{fs, path::Path};

use log::{debug, warn};

use super::ConfigError;
use crate::core::commands::{Category, CommandContext, CommandResult};
use crate::core::parser;
use crate::core::terminal::Terminal;

/// Applies an rc file to a terminal.
///
/// Understood lines:
/// - `export NAME=VALUE` / `set NAME=VALUE`
/// - `alias NAME=COMMAND`
/// - blank lines and `#` comments
///
/// Anything else is logged and skipped so one bad line does not stop the rest.
pub struct RcLoader<'a> {
    path: &'a Path,
}

impl<'a> RcLoader<'a> {
    pub fn new(path: &'a Path) -> Self {
        Self { path }
    }

    /// Returns how many lines took effect. A missing file applies nothing.
    pub fn load(&self, terminal: &mut Terminal) -> Result<usize, ConfigError> {
        if !self.path.exists() {
            debug!("no rc file at {}", self.path.display());
            return Ok(0);
        }

        let content = match fs::read_to_string(self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!("skipping rc file {}: {}", self.path.display(), e);
                return Ok(0);
            }
        };
        let mut applied = 0;
        for (number, line) in content.lines().enumerate() {
            match process_line(line, terminal) {
                Ok(true) => applied += 1,
                Ok(false) => {}
                Err(e) => warn!("{}:{}: {}", self.path.display(), number + 1, e),
            }
        }
        Ok(applied)
    }
}

/// `Ok(false)` for lines that carry nothing.
fn process_line(line: &str, terminal: &mut Terminal) -> Result<bool, ConfigError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(false);
    }

    if let Some(def) = line
        .strip_prefix("export ")
        .or_else(|| line.strip_prefix("set "))
    {
        process_env_var(def, terminal)?;
    } else if let Some(def) = line.strip_prefix("alias ") {
        process_alias(def, terminal)?;
    } else {
        return Err(ConfigError::InvalidLine(line.to_string()));
    }
    Ok(true)
}

fn strip_quotes(value: &str) -> &str {
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    if quoted {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

fn split_definition(def: &str) -> Result<(&str, &str), ConfigError> {
    let (name, value) = def
        .split_once('=')
        .ok_or_else(|| ConfigError::InvalidLine(def.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(ConfigError::InvalidLine(def.to_string()));
    }
    Ok((name, strip_quotes(value.trim())))
}

/// Replace `$HOME` and `$PATH` with their current session values.
fn expand_value(value: &str, terminal: &Terminal) -> String {
    ["HOME", "PATH"]
        .iter()
        .fold(value.to_string(), |acc, name| {
            let var = format!("${}", name);
            if acc.contains(&var) {
                acc.replace(&var, terminal.state().get_env(name))
            } else {
                acc
            }
        })
}

fn process_env_var(def: &str, terminal: &mut Terminal) -> Result<(), ConfigError> {
    let (name, value) = split_definition(def)?;
    let value = expand_value(value, terminal);
    terminal.state_mut().set_env(name, &value)?;
    debug!("rc: {}={}", name, value);
    Ok(())
}

/// A bare command name becomes a plain alias of that command. A command with
/// arguments becomes a new command that runs the target with those arguments
/// in front of whatever the user types.
fn process_alias(def: &str, terminal: &mut Terminal) -> Result<(), ConfigError> {
    let (name, command) = split_definition(def)?;
    let words = parser::parse(command)?
        .ok_or_else(|| ConfigError::InvalidLine(def.to_string()))?;

    let registry = terminal.registry_mut();
    if words.args.is_empty() {
        registry.alias(name, &words.command)?;
    } else {
        let target = registry
            .get(&words.command)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownCommand(words.command.clone()))?;
        let preset = words.args;
        registry.register(
            name,
            Category::Custom,
            "User-defined alias",
            move |ctx: &mut CommandContext<'_>, args: &[String]| -> CommandResult {
                let full: Vec<String> = preset.iter().chain(args).cloned().collect();
                target.call(ctx, &full)
            },
        );
    }
    debug!("rc: alias {}={}", name, command);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::SessionState;
    use crate::input::History;
    use serial_test::serial;
    use tempfile::TempDir;

    fn terminal(dir: &TempDir) -> Terminal {
        let state = SessionState::with_identity(dir.path(), "tester", "box").unwrap();
        Terminal::new(state, History::in_memory(10))
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut term = terminal(&dir);
        let path = dir.path().join("absent");
        assert_eq!(RcLoader::new(&path).load(&mut term).unwrap(), 0);
    }

    #[test]
    fn test_unreadable_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let mut term = terminal(&dir);
        let rc = dir.path().join(".terminarc");
        fs::write(&rc, b"export TERMINA_RC_SKIPPED=1\n\xff\xfe\n").unwrap();
        assert_eq!(RcLoader::new(&rc).load(&mut term).unwrap(), 0);
        assert_eq!(term.state().get_env("TERMINA_RC_SKIPPED"), "");
    }

    #[test]
    #[serial]
    fn test_load_rc() {
        let dir = TempDir::new().unwrap();
        let mut term = terminal(&dir);
        let rc = dir.path().join(".terminarc");
        fs::write(
            &rc,
            "# startup\n\
             export TERMINA_RC_VAR=\"hello world\"\n\
             set TERMINA_RC_HOME=$HOME/bin\n\
             alias ll='ls -l'\n\
             alias say=echo\n\
             bogus line here\n\
             alias nothing=frobnicate\n\n",
        )
        .unwrap();

        let applied = RcLoader::new(&rc).load(&mut term).unwrap();
        assert_eq!(applied, 4);

        assert_eq!(term.state().get_env("TERMINA_RC_VAR"), "hello world");
        let home = term.state().get_env("HOME").to_string();
        assert_eq!(term.state().get_env("TERMINA_RC_HOME"), format!("{}/bin", home));

        assert!(term
            .registry()
            .get("say")
            .unwrap()
            .same_as(term.registry().get("echo").unwrap()));
        assert_eq!(term.execute("say hi").text(), "hi");

        fs::write(dir.path().join("visible.txt"), "x").unwrap();
        assert!(term.execute("ll").text().contains("visible.txt"));
        assert!(!term.registry().contains("nothing"));
    }

    #[test]
    fn test_split_definition() {
        assert_eq!(split_definition("A=1").unwrap(), ("A", "1"));
        assert_eq!(split_definition(" B = 'x y' ").unwrap(), ("B", "x y"));
        assert!(split_definition("novalue").is_err());
        assert!(split_definition("=1").is_err());
    }
}
