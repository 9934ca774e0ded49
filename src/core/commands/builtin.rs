use super::{Category, CommandContext, CommandOutput, CommandRegistry, CommandResult};

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register("help", Category::Builtin, "Show this help", help);
    registry.register_with_aliases(&["clear", "cls"], Category::Builtin, "Clear screen", clear);
    registry.register_with_aliases(&["exit", "quit"], Category::Builtin, "Exit terminal", exit);
    registry.register("echo", Category::Builtin, "Echo text", echo);
}

fn help(ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult {
    if let Some(name) = args.first() {
        return Ok(match ctx.registry.get(name) {
            Some(handler) => format!("{}: {}", name, handler.summary()),
            None => format!("Unknown command: {}", name),
        }
        .into());
    }

    let mut groups = ctx.registry.groups();
    groups.sort_by_key(|(_, handler)| handler.category());

    let mut text = String::from("Available commands:\n");
    let mut current = None;
    for (names, handler) in groups {
        if current != Some(handler.category()) {
            current = Some(handler.category());
            text.push_str(&format!("\n{}:\n", handler.category()));
        }
        text.push_str(&format!("  {:<14}- {}\n", names.join("/"), handler.summary()));
    }

    Ok(text.trim_end().to_string().into())
}

fn clear(_ctx: &mut CommandContext<'_>, _args: &[String]) -> CommandResult {
    Ok(CommandOutput::ClearScreen)
}

fn exit(ctx: &mut CommandContext<'_>, _args: &[String]) -> CommandResult {
    ctx.request_exit();
    Ok(CommandOutput::Terminate)
}

fn echo(_ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult {
    Ok(args.join(" ").into())
}
