use std::collections::BTreeSet;

use rustyline::completion::Pair;

/// Completes the first word of a line from the registered command names.
#[derive(Clone, Debug, Default)]
pub struct CommandCompleter {
    commands: BTreeSet<String>,
}

impl CommandCompleter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_commands<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        self.commands = names.into_iter().map(str::to_lowercase).collect();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains(&name.to_lowercase())
    }

    pub fn complete_command(&self, line: &str) -> Vec<Pair> {
        let input = line.trim().to_lowercase();
        self.commands
            .iter()
            .filter(|cmd| cmd.starts_with(&input))
            .map(|cmd| Pair {
                display: cmd.clone(),
                replacement: cmd.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_prefix() {
        let mut completer = CommandCompleter::new();
        completer.update_commands(["ls", "pwd", "ps", "cp"]);

        let names: Vec<String> = completer
            .complete_command("P")
            .into_iter()
            .map(|p| p.replacement)
            .collect();
        assert_eq!(names, ["ps", "pwd"]);
        assert_eq!(completer.complete_command("").len(), 4);
        assert!(completer.complete_command("zz").is_empty());
        assert!(completer.contains("LS"));
    }
}
