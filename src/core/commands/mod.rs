use std::fmt;
use std::sync::Arc;

use thiserror::Error;

mod builtin;
mod cd;
mod env;
mod files;
mod history;
mod registry;
mod system;

pub use registry::CommandRegistry;

use super::env::EnvError;
use super::state::SessionState;
use crate::input::History;
use crate::process::ProcessError;

/// Failure of a single handler invocation. The dispatcher reports it inline
/// and the session carries on.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("command not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    ExecutionError(String),
    #[error("{0}")]
    IoError(#[from] std::io::Error),
    #[error("{0}")]
    EnvError(#[from] EnvError),
    #[error("{0}")]
    ProcessError(#[from] ProcessError),
}

/// What a command produced. Presentation layers switch on this instead of
/// looking for magic strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    Text(String),
    ClearScreen,
    Terminate,
}

impl CommandOutput {
    pub const FAREWELL: &'static str = "Goodbye!";

    pub fn empty() -> Self {
        CommandOutput::Text(String::new())
    }

    /// Printable form: the text itself, nothing for a screen clear, and the
    /// farewell for termination.
    pub fn text(&self) -> &str {
        match self {
            CommandOutput::Text(text) => text,
            CommandOutput::ClearScreen => "",
            CommandOutput::Terminate => Self::FAREWELL,
        }
    }
}

impl From<String> for CommandOutput {
    fn from(text: String) -> Self {
        CommandOutput::Text(text)
    }
}

impl From<&str> for CommandOutput {
    fn from(text: &str) -> Self {
        CommandOutput::Text(text.to_string())
    }
}

pub type CommandResult = Result<CommandOutput, CommandError>;

/// Everything a handler may touch while it runs.
pub struct CommandContext<'a> {
    pub state: &'a mut SessionState,
    pub history: &'a mut History,
    pub registry: &'a CommandRegistry,
    /// Contents of the `<` redirection target, if one was given.
    pub input: Option<&'a str>,
    running: &'a mut bool,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        state: &'a mut SessionState,
        history: &'a mut History,
        registry: &'a CommandRegistry,
        running: &'a mut bool,
    ) -> Self {
        Self {
            state,
            history,
            registry,
            input: None,
            running,
        }
    }

    pub fn with_input(mut self, input: Option<&'a str>) -> Self {
        self.input = input;
        self
    }

    /// Ask the host loop to stop after this command.
    pub fn request_exit(&mut self) {
        *self.running = false;
    }
}

pub trait Command: Send + Sync {
    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult;
}

impl<F> Command for F
where
    F: Fn(&mut CommandContext<'_>, &[String]) -> CommandResult + Send + Sync,
{
    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult {
        self(ctx, args)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    File,
    System,
    Builtin,
    Custom,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::File => write!(f, "File Operations"),
            Category::System => write!(f, "System Information"),
            Category::Builtin => write!(f, "Built-in"),
            Category::Custom => write!(f, "Other"),
        }
    }
}

/// A registered command. Cloning shares the underlying command, which is how
/// aliases point at the same behavior.
#[derive(Clone)]
pub struct Handler {
    command: Arc<dyn Command>,
    category: Category,
    summary: &'static str,
}

impl Handler {
    pub fn new(category: Category, summary: &'static str, command: impl Command + 'static) -> Self {
        Self {
            command: Arc::new(command),
            category,
            summary,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn summary(&self) -> &'static str {
        self.summary
    }

    pub fn same_as(&self, other: &Handler) -> bool {
        Arc::ptr_eq(&self.command, &other.command)
    }

    pub fn call(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult {
        self.command.execute(ctx, args)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("category", &self.category)
            .field("summary", &self.summary)
            .finish()
    }
}

/// Registry holding every built-in command and its platform aliases.
pub fn builtin_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    files::register(&mut registry);
    cd::register(&mut registry);
    system::register(&mut registry);
    builtin::register(&mut registry);
    history::register(&mut registry);
    env::register(&mut registry);
    registry
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tempfile::TempDir;

    /// Scratch session rooted in a fresh temp directory.
    pub struct Fixture {
        pub dir: TempDir,
        pub state: SessionState,
        pub history: History,
        pub registry: CommandRegistry,
        pub running: bool,
    }

    impl Fixture {
        pub fn new() -> Self {
            let dir = TempDir::new().expect("temp dir");
            let root = crate::path::normalize(dir.path());
            let state = SessionState::with_identity(&root, "tester", "testhost").expect("state");
            Self {
                dir,
                state,
                history: History::in_memory(100),
                registry: builtin_registry(),
                running: true,
            }
        }

        pub fn root(&self) -> std::path::PathBuf {
            crate::path::normalize(self.dir.path())
        }

        pub fn run(&mut self, name: &str, args: &[&str]) -> CommandResult {
            self.run_with_input(name, args, None)
        }

        pub fn run_with_input(&mut self, name: &str, args: &[&str], input: Option<&str>) -> CommandResult {
            let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
            let handler = self
                .registry
                .get(name)
                .cloned()
                .ok_or_else(|| CommandError::NotFound(name.to_string()))?;
            let mut ctx = CommandContext::new(
                &mut self.state,
                &mut self.history,
                &self.registry,
                &mut self.running,
            )
            .with_input(input);
            handler.call(&mut ctx, &args)
        }

        /// Run and unwrap the text output.
        pub fn text(&mut self, name: &str, args: &[&str]) -> String {
            match self.run(name, args).expect("command failed") {
                CommandOutput::Text(text) => text,
                other => panic!("expected text output, got {:?}", other),
            }
        }
    }
}
