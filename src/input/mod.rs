mod completer;
pub mod history;

pub use completer::ShellCompleter;
pub use history::History;
