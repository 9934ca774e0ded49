use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};

use log::{debug, warn};
use thiserror::Error;

use super::commands::{
    builtin_registry, CommandContext, CommandError, CommandOutput, CommandRegistry,
};
use super::parser::{self, ParseError, RedirectKind};
use super::state::SessionState;
use crate::input::History;

/// Why a line produced an error message instead of command output. The
/// [`Display`](std::fmt::Display) form is exactly what the user sees.
#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Command not found: {0}")]
    NotFound(String),
    #[error("Error executing command '{name}': {source}")]
    Handler {
        name: String,
        #[source]
        source: CommandError,
    },
    #[error("Cannot write to file '{name}': {source}")]
    Write {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("Cannot read from file '{name}': {source}")]
    Read {
        name: String,
        #[source]
        source: io::Error,
    },
}

/// One shell session: state, history and the commands it can run.
pub struct Terminal {
    state: SessionState,
    history: History,
    registry: CommandRegistry,
    running: bool,
}

impl Terminal {
    /// A session with every built-in command registered.
    pub fn new(state: SessionState, history: History) -> Self {
        Self::with_registry(state, history, builtin_registry())
    }

    pub fn with_registry(state: SessionState, history: History, registry: CommandRegistry) -> Self {
        Self {
            state,
            history,
            registry,
            running: true,
        }
    }

    /// Run one input line and return what it printed, or why it failed.
    ///
    /// Blank lines are ignored entirely. Anything else is recorded in the
    /// history before parsing, so lines that fail to parse are kept too.
    pub fn dispatch(&mut self, line: &str) -> Result<CommandOutput, TerminalError> {
        if line.trim().is_empty() {
            return Ok(CommandOutput::empty());
        }

        // Persistence failures are logged by History and otherwise ignored.
        let _ = self.history.add(line);

        let Some(parsed) = parser::parse(line)? else {
            return Ok(CommandOutput::empty());
        };
        let (args, redirections) = parser::extract_redirections(&parsed.args)?;

        let handler = self
            .registry
            .get(&parsed.command)
            .ok_or_else(|| TerminalError::NotFound(parsed.command.clone()))?;

        let input = match redirections.get(RedirectKind::Stdin) {
            Some(name) => Some(fs::read_to_string(self.state.resolve(name)).map_err(
                |source| TerminalError::Read {
                    name: name.to_string(),
                    source,
                },
            )?),
            None => None,
        };

        debug!("dispatching {} with {:?}", parsed.command, args);
        let mut ctx = CommandContext::new(
            &mut self.state,
            &mut self.history,
            &self.registry,
            &mut self.running,
        )
        .with_input(input.as_deref());

        let result = panic::catch_unwind(AssertUnwindSafe(|| handler.call(&mut ctx, &args)))
            .unwrap_or_else(|payload| Err(CommandError::ExecutionError(panic_message(&*payload))));
        let output = result.map_err(|source| TerminalError::Handler {
            name: parsed.command.clone(),
            source,
        })?;

        match (output, redirections.output_target()) {
            (CommandOutput::Text(text), Some((kind, target))) => {
                self.write_redirect(&text, kind, target)
            }
            (output, _) => Ok(output),
        }
    }

    /// Like [`Terminal::dispatch`], folding errors into printable text.
    pub fn execute(&mut self, line: &str) -> CommandOutput {
        self.dispatch(line).unwrap_or_else(|err| {
            debug!("{:?}", err);
            CommandOutput::Text(err.to_string())
        })
    }

    fn write_redirect(
        &self,
        text: &str,
        kind: RedirectKind,
        target: &str,
    ) -> Result<CommandOutput, TerminalError> {
        let path = self.state.resolve(target);
        let append = kind == RedirectKind::StdoutAppend;

        let written = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(&path)
            .and_then(|mut file| {
                file.write_all(text.as_bytes())?;
                if !text.ends_with('\n') {
                    file.write_all(b"\n")?;
                }
                Ok(())
            });

        if let Err(source) = written {
            warn!("redirect to {} failed: {}", path.display(), source);
            return Err(TerminalError::Write {
                name: target.to_string(),
                source,
            });
        }

        Ok(if append {
            format!("Output appended to {}", target)
        } else {
            format!("Output redirected to {}", target)
        }
        .into())
    }

    pub fn prompt(&self) -> String {
        self.state.prompt()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "command panicked".to_string()
    }
}
