//! Shell engine: parsing, session state, the command registry and the
//! terminal that ties them together.

pub mod commands;
pub mod config;
pub mod env;
pub mod parser;
pub mod state;
pub mod terminal;

pub use commands::{Category, Command, CommandContext, CommandError, CommandOutput, CommandRegistry};
pub use state::SessionState;
pub use terminal::{Terminal, TerminalError};
