use super::{Category, Command, CommandContext, CommandError, CommandRegistry, CommandResult};
use crate::input::History;

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register("history", Category::Builtin, "Show command history", HistoryCommand);
}

/// `history`, `history N`, `history search TEXT`, `history clear`.
#[derive(Clone, Copy, Default)]
pub struct HistoryCommand;

impl HistoryCommand {
    fn show_all(&self, history: &History) -> CommandResult {
        if history.is_empty() {
            return Ok("No commands in history.".into());
        }
        let lines: Vec<(usize, &str)> = history
            .all()
            .iter()
            .enumerate()
            .map(|(i, cmd)| (i + 1, cmd.as_str()))
            .collect();
        Ok(format_entries(&lines).into())
    }

    fn show_recent(&self, history: &History, count: usize) -> CommandResult {
        let offset = history.len() - history.recent(count).len();
        let lines: Vec<(usize, &str)> = history
            .recent(count)
            .iter()
            .enumerate()
            .map(|(i, cmd)| (offset + i + 1, cmd.as_str()))
            .collect();
        Ok(format_entries(&lines).into())
    }

    fn search(&self, history: &History, args: &[String]) -> CommandResult {
        let query = args.join(" ");
        let matches = history.search(&query);
        if matches.is_empty() {
            return Ok(format!("No history entries match '{}'.", query).into());
        }
        Ok(matches.join("\n").into())
    }
}

fn format_entries(lines: &[(usize, &str)]) -> String {
    lines
        .iter()
        .map(|(n, cmd)| format!("{:4}  {}", n, cmd))
        .collect::<Vec<_>>()
        .join("\n")
}

impl Command for HistoryCommand {
    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult {
        let Some(sub) = args.first() else {
            return self.show_all(ctx.history);
        };

        match sub.as_str() {
            "search" => self.search(ctx.history, &args[1..]),
            "clear" => {
                // Persistence problems are logged by History and otherwise ignored.
                let _ = ctx.history.clear();
                Ok("History cleared.".into())
            }
            count => match count.parse::<usize>() {
                Ok(n) => self.show_recent(ctx.history, n),
                Err(_) => Err(CommandError::InvalidArguments(format!(
                    "unknown history subcommand: {}",
                    count
                ))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::commands::test_support::Fixture;
    use crate::core::commands::CommandError;

    fn seeded() -> Fixture {
        let mut fx = Fixture::new();
        for cmd in ["ls", "cd /tmp", "echo LS", "pwd"] {
            let _ = fx.history.add(cmd);
        }
        fx
    }

    #[test]
    fn test_history_empty() {
        let mut fx = Fixture::new();
        assert_eq!(fx.text("history", &[]), "No commands in history.");
    }

    #[test]
    fn test_history_numbered() {
        let mut fx = seeded();
        let out = fx.text("history", &[]);
        assert_eq!(out.lines().next(), Some("   1  ls"));
        assert_eq!(out.lines().count(), 4);
    }

    #[test]
    fn test_history_recent_keeps_numbers() {
        let mut fx = seeded();
        assert_eq!(fx.text("history", &["2"]), "   3  echo LS\n   4  pwd");
    }

    #[test]
    fn test_history_search() {
        let mut fx = seeded();
        assert_eq!(fx.text("history", &["search", "ls"]), "ls\necho LS");
        assert_eq!(
            fx.text("history", &["search", "zzz"]),
            "No history entries match 'zzz'."
        );
    }

    #[test]
    fn test_history_clear() {
        let mut fx = seeded();
        assert_eq!(fx.text("history", &["clear"]), "History cleared.");
        assert!(fx.history.is_empty());
    }

    #[test]
    fn test_history_bad_subcommand() {
        let mut fx = seeded();
        assert!(matches!(
            fx.run("history", &["frobnicate"]),
            Err(CommandError::InvalidArguments(_))
        ));
    }
}
