use std::borrow::Cow;

use super::{Category, CommandContext, CommandError, CommandRegistry, CommandResult};
use crate::core::state::SessionState;

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register("set", Category::Builtin, "Set environment variable", set);
    registry.register("env", Category::Builtin, "Show environment variables", env);
}

const SET_USAGE: &str = "Usage: set VARIABLE=VALUE or set VARIABLE VALUE";

/// Split `NAME=VALUE` (or `NAME VALUE...`) into its parts, trimming whitespace
/// and one pair of surrounding quotes from the value.
pub(crate) fn parse_assignment(args: &[String]) -> Result<(&str, Cow<'_, str>), CommandError> {
    let (name, value): (&str, Cow<'_, str>) = match args {
        [single] => {
            let (name, value) = single
                .split_once('=')
                .ok_or_else(|| CommandError::InvalidArguments(SET_USAGE.into()))?;
            (name.trim(), Cow::Borrowed(value.trim()))
        }
        [name, rest @ ..] if !rest.is_empty() => (name.trim(), Cow::Owned(rest.join(" "))),
        _ => return Err(CommandError::InvalidArguments(SET_USAGE.into())),
    };

    if name.is_empty() {
        return Err(CommandError::InvalidArguments(
            "Variable name cannot be empty".into(),
        ));
    }

    let value = match value {
        Cow::Borrowed(v)
            if v.len() >= 2
                && ((v.starts_with('"') && v.ends_with('"'))
                    || (v.starts_with('\'') && v.ends_with('\''))) =>
        {
            Cow::Borrowed(&v[1..v.len() - 1])
        }
        other => other,
    };

    Ok((name, value))
}

fn set(ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult {
    if args.is_empty() {
        return Ok(env_listing(ctx.state).into());
    }

    let (name, value) = parse_assignment(args)?;
    ctx.state.set_env(name, &value)?;
    Ok(format!("Set {}={}", name, value).into())
}

fn env(ctx: &mut CommandContext<'_>, _args: &[String]) -> CommandResult {
    Ok(env_listing(ctx.state).into())
}

fn env_listing(state: &SessionState) -> String {
    state
        .env_vars()
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("\n")
}
