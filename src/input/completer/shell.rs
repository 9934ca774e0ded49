use std::borrow::Cow;

use super::{command::CommandCompleter, path::PathCompleter};
use crate::core::Terminal;
use crate::highlight::SyntaxHighlighter;

use rustyline::{
    completion::{Completer, Pair},
    highlight::{CmdKind, Highlighter},
    hint::Hinter,
    validate::Validator,
    Context, Helper,
};

/// rustyline helper: command and path completion plus line coloring.
#[derive(Clone)]
pub struct ShellCompleter {
    command_completer: CommandCompleter,
    path_completer: PathCompleter,
    highlighter: SyntaxHighlighter,
}

impl ShellCompleter {
    pub fn new(terminal: &Terminal) -> Self {
        let mut completer = ShellCompleter {
            command_completer: CommandCompleter::new(),
            path_completer: PathCompleter::new(terminal.state().current_directory()),
            highlighter: SyntaxHighlighter::new(),
        };
        completer.sync(terminal);
        completer
    }

    /// Pick up commands registered and directory changes made since the last
    /// prompt.
    pub fn sync(&mut self, terminal: &Terminal) {
        self.command_completer
            .update_commands(terminal.registry().names());
        self.path_completer
            .set_base_dir(terminal.state().current_directory());
    }

    fn complete_words(&self, line: &str, pos: usize) -> (usize, Vec<Pair>) {
        let line_up_to_cursor = &line[..pos];
        let mut words: Vec<&str> = line_up_to_cursor.split_whitespace().collect();

        if line_up_to_cursor.ends_with(' ') {
            words.push("");
        }

        match words.as_slice() {
            [] => (0, self.command_completer.complete_command("")),
            [word] => {
                let start = line_up_to_cursor.rfind(word).unwrap_or(0);
                (start, self.command_completer.complete_command(word))
            }
            [.., last_word] => {
                let start = if last_word.is_empty() {
                    pos
                } else {
                    line_up_to_cursor.rfind(last_word).unwrap_or(pos)
                };
                (start, self.path_completer.complete_path(last_word))
            }
        }
    }
}

impl Helper for ShellCompleter {}

impl Highlighter for ShellCompleter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Owned(
            self.highlighter
                .highlight_command(line, |cmd| self.command_completer.contains(cmd)),
        )
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(self.highlighter.highlight_hint(hint))
    }
}

impl Hinter for ShellCompleter {
    type Hint = String;
}

impl Validator for ShellCompleter {}

impl Completer for ShellCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        Ok(self.complete_words(line, pos))
    }
}
