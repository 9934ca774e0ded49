use log::{debug, warn};
use rustyline::{config::Configurer, error::ReadlineError, history::DefaultHistory, Editor};

use crate::{
    core::{CommandOutput, Terminal},
    error::ShellError,
    highlight::SyntaxHighlighter,
    input::ShellCompleter,
};

pub const BANNER: &str = "Welcome to Termina\nType 'help' for available commands or 'exit' to quit.\n";

/// Interactive front-end: reads lines with rustyline and feeds them to a
/// [`Terminal`] until it stops running or input ends.
pub struct Shell {
    editor: Editor<ShellCompleter, DefaultHistory>,
    terminal: Terminal,
    highlighter: SyntaxHighlighter,
    quiet: bool,
}

impl Shell {
    pub fn new(terminal: Terminal, quiet: bool) -> Result<Self, ShellError> {
        let mut editor = Editor::<ShellCompleter, DefaultHistory>::new()?;
        editor.set_max_history_size(terminal.history().max_entries())?;
        editor.set_auto_add_history(false);
        editor.set_helper(Some(ShellCompleter::new(&terminal)));

        // Arrow-key recall starts from the persisted history.
        for entry in terminal.history().all() {
            editor.add_history_entry(entry.as_str())?;
        }

        Ok(Shell {
            editor,
            terminal,
            highlighter: SyntaxHighlighter::new(),
            quiet,
        })
    }

    pub fn run(&mut self) -> Result<(), ShellError> {
        if !self.quiet {
            println!("{}", self.highlighter.highlight_success(BANNER));
        }

        while self.terminal.is_running() {
            if let Some(helper) = self.editor.helper_mut() {
                helper.sync(&self.terminal);
            }

            let prompt = self.terminal.prompt();
            match self.editor.readline(&prompt) {
                Ok(line) => self.handle_line(&line),
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", CommandOutput::FAREWELL);
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }
        debug!("shell loop finished");
        Ok(())
    }

    fn handle_line(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        if let Err(e) = self.editor.add_history_entry(line) {
            warn!("line editor history: {}", e);
        }

        match self.terminal.dispatch(line) {
            Ok(CommandOutput::ClearScreen) => {
                if let Err(e) = self.editor.clear_screen() {
                    warn!("clear screen failed: {}", e);
                }
            }
            Ok(output) => {
                let text = output.text();
                if !text.is_empty() {
                    println!("{}", text);
                }
            }
            Err(e) => eprintln!("{}", self.highlighter.highlight_error(&e.to_string())),
        }
    }

    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }
}
