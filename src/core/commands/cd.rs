use super::{Category, Command, CommandContext, CommandError, CommandRegistry, CommandResult};
use crate::path::PathExpander;

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register("cd", Category::File, "Change directory", CdCommand::new());
}

#[derive(Clone, Default)]
pub struct CdCommand {
    path_expander: PathExpander,
}

impl CdCommand {
    pub fn new() -> Self {
        Self {
            path_expander: PathExpander::new(),
        }
    }
}

impl Command for CdCommand {
    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult {
        let Some(path_str) = args.first().map(String::as_str) else {
            let home = self
                .path_expander
                .get_home_dir()
                .map_err(|e| CommandError::ExecutionError(e.to_string()))?;
            return Ok(if ctx.state.set_current_directory(home) {
                "".into()
            } else {
                "cd: cannot change to home directory".into()
            });
        };

        if path_str == "-" {
            let Some(previous) = ctx.state.previous_directory().map(|p| p.to_path_buf()) else {
                return Ok("cd: OLDPWD not set".into());
            };
            return Ok(if ctx.state.set_current_directory(&previous) {
                previous.display().to_string().into()
            } else {
                format!("cd: no such file or directory: {}", previous.display()).into()
            });
        }

        let expanded_path = self
            .path_expander
            .expand(path_str)
            .map_err(|e| CommandError::ExecutionError(e.to_string()))?;

        Ok(if ctx.state.set_current_directory(expanded_path) {
            "".into()
        } else {
            format!("cd: no such file or directory: {}", path_str).into()
        })
    }
}
