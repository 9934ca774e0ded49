use std::time::Duration;

use chrono::Local;
use log::debug;

use super::{Category, CommandContext, CommandError, CommandRegistry, CommandResult};
use crate::process::{format_bytes, host, ProcessInfo, ProcessTable};

const TOP_ROWS: usize = 10;

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register("ps", Category::System, "Show running processes", ps);
    registry.register("top", Category::System, "Show system resource usage", top);
    registry.register("df", Category::System, "Show disk space usage", df);
    registry.register("free", Category::System, "Show memory usage", free);
    registry.register("whoami", Category::System, "Show current user", whoami);
}

/// Cut `text` to `max` characters, replacing the tail with `...`.
fn ellipsize(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Accepts only `-h`/`--human-readable`.
fn human_readable_flag(args: &[String]) -> Result<bool, CommandError> {
    let mut human = false;
    for arg in args {
        match arg.as_str() {
            "-h" | "--human-readable" => human = true,
            opt if opt.starts_with('-') => {
                return Err(CommandError::InvalidArguments(format!("invalid option: {}", opt)))
            }
            _ => {}
        }
    }
    Ok(human)
}

fn ps(_ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult {
    let mut show_all = false;
    let mut show_full = false;
    for arg in args {
        match arg.as_str() {
            "-a" | "-A" => show_all = true,
            "-f" | "--full" => show_full = true,
            opt if opt.starts_with('-') => {
                return Err(CommandError::InvalidArguments(format!("invalid option: {}", opt)))
            }
            _ => {}
        }
    }

    let snapshot = ProcessTable::load()?;
    let me = snapshot.current_uid();
    let table: Vec<ProcessInfo> = snapshot
        .processes()
        .into_iter()
        .filter(|p| show_all || me.is_none() || p.uid == me)
        .collect();

    let mut lines = Vec::with_capacity(table.len() + 2);
    if show_full {
        lines.push(format!(
            "{:<8} {:<12} {:<6} {:<6} {:<8} {}",
            "PID", "USER", "CPU%", "MEM%", "STAT", "COMMAND"
        ));
        lines.push("-".repeat(80));
        for p in &table {
            lines.push(format!(
                "{:<8} {:<12} {:<6} {:<6} {:<8} {}",
                p.pid,
                p.user.as_deref().unwrap_or("?"),
                format!("{:.1}", p.cpu_percent),
                format!("{:.1}", p.mem_percent),
                p.status,
                ellipsize(&p.command(), 40)
            ));
        }
    } else {
        lines.push(format!("{:<8} {:<20} {:<10}", "PID", "NAME", "STATUS"));
        lines.push("-".repeat(40));
        for p in &table {
            lines.push(format!(
                "{:<8} {:<20} {:<10}",
                p.pid,
                ellipsize(&p.name, 18),
                p.status
            ));
        }
    }

    Ok(lines.join("\n").into())
}

fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    format!("{} days, {:02}:{:02}", days, hours, minutes)
}

fn top(_ctx: &mut CommandContext<'_>, _args: &[String]) -> CommandResult {
    let snapshot = ProcessTable::sampled()?;
    let memory = snapshot.memory();
    let [one, five, fifteen] = host::load_average();
    let disk = match host::root_disk() {
        Ok(disk) => format!(
            "Disk Usage: {:.1}% ({}/{})",
            disk.percent(),
            format_bytes(disk.used()),
            format_bytes(disk.total)
        ),
        Err(e) => {
            debug!("top: {}", e);
            "Disk Usage: N/A".to_string()
        }
    };

    let mut lines = vec![
        format!("System: {}", host::os_description()),
        format!("Uptime: {}", format_uptime(host::uptime())),
        format!("Current time: {}", Local::now().format("%Y-%m-%d %H:%M:%S")),
        String::new(),
        format!("CPU Usage: {:.1}%", snapshot.cpu_percent()),
        format!(
            "Memory Usage: {:.1}% ({}/{})",
            memory.percent(),
            format_bytes(memory.used),
            format_bytes(memory.total)
        ),
        disk,
        format!("Load average: {:.2}, {:.2}, {:.2}", one, five, fifteen),
        String::new(),
        "Top Processes by CPU:".to_string(),
        format!("{:<8} {:<20} {:<8} {:<8}", "PID", "NAME", "CPU%", "MEM%"),
        "-".repeat(50),
    ];

    let mut table = snapshot.processes();
    table.sort_by(|a, b| b.cpu_percent.total_cmp(&a.cpu_percent));
    for p in table.iter().take(TOP_ROWS) {
        let name: String = p.name.chars().take(18).collect();
        lines.push(format!(
            "{:<8} {:<20} {:<8} {:<8}",
            p.pid,
            name,
            format!("{:.1}", p.cpu_percent),
            format!("{:.1}", p.mem_percent)
        ));
    }

    Ok(lines.join("\n").into())
}

fn df(_ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult {
    let human = human_readable_flag(args)?;

    let mut lines = vec![if human {
        format!(
            "{:<20} {:<8} {:<8} {:<8} {:<6} {}",
            "Filesystem", "Size", "Used", "Avail", "Use%", "Mounted on"
        )
    } else {
        format!(
            "{:<20} {:<12} {:<12} {:<12} {:<6} {}",
            "Filesystem", "1K-blocks", "Used", "Available", "Use%", "Mounted on"
        )
    }];
    lines.push("-".repeat(80));

    for disk in host::disks()? {
        let device = ellipsize(&disk.device, 18);
        let percent = format!("{:.0}%", disk.percent());
        lines.push(if human {
            format!(
                "{:<20} {:<8} {:<8} {:<8} {:<6} {}",
                device,
                format_bytes(disk.total),
                format_bytes(disk.used()),
                format_bytes(disk.free),
                percent,
                disk.mount_point
            )
        } else {
            format!(
                "{:<20} {:<12} {:<12} {:<12} {:<6} {}",
                device,
                disk.total / 1024,
                disk.used() / 1024,
                disk.free / 1024,
                percent,
                disk.mount_point
            )
        });
    }

    Ok(lines.join("\n").into())
}

fn kilobytes(bytes: u64) -> String {
    (bytes / 1024).to_string()
}

fn free(_ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult {
    let human = human_readable_flag(args)?;
    let mem = host::memory()?;

    let (width, show): (usize, fn(u64) -> String) = if human {
        (10, format_bytes)
    } else {
        (12, kilobytes)
    };
    let row = |label: &str, cells: [String; 6]| {
        let mut line = format!("{:<15}", label);
        for (i, cell) in cells.iter().enumerate() {
            // buff/cache is always twelve wide.
            let w = if i == 4 { 12 } else { width };
            line.push_str(&format!(" {:<w$}", cell, w = w));
        }
        line
    };

    let header = [
        "total", "used", "free", "shared", "buff/cache", "available",
    ]
    .map(String::from);
    let lines = [
        row("", header),
        row(
            "Mem:",
            [
                show(mem.total),
                show(mem.used),
                show(mem.free),
                "0".to_string(),
                show(mem.buff_cache()),
                show(mem.available),
            ],
        ),
        row(
            "Swap:",
            [
                show(mem.swap_total),
                show(mem.swap_used),
                show(mem.swap_free),
                "0".to_string(),
                "0".to_string(),
                "0".to_string(),
            ],
        ),
    ];

    Ok(lines.join("\n").into())
}

fn whoami(_ctx: &mut CommandContext<'_>, _args: &[String]) -> CommandResult {
    Ok(host::current_user().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::commands::test_support::Fixture;
    use serial_test::serial;

    #[test]
    fn test_ellipsize() {
        assert_eq!(ellipsize("short", 18), "short");
        assert_eq!(ellipsize("a-very-long-process-name", 18), "a-very-long-pro...");
        assert_eq!(ellipsize("a-very-long-process-name", 18).chars().count(), 18);
    }

    #[test]
    fn test_format_uptime() {
        let up = Duration::from_secs(2 * 86_400 + 3 * 3_600 + 7 * 60 + 59);
        assert_eq!(format_uptime(up), "2 days, 03:07");
        assert_eq!(format_uptime(Duration::from_secs(0)), "0 days, 00:00");
    }

    #[test]
    fn test_invalid_options() {
        let mut fx = Fixture::new();
        for name in ["ps", "df", "free"] {
            match fx.run(name, &["-z"]) {
                Err(CommandError::InvalidArguments(msg)) => assert_eq!(msg, "invalid option: -z"),
                other => panic!("{} accepted -z: {:?}", name, other),
            }
        }
    }

    #[test]
    #[serial]
    fn test_whoami() {
        let mut fx = Fixture::new();
        assert_eq!(fx.text("whoami", &[]), host::current_user());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_ps_lists_self() {
        let mut fx = Fixture::new();
        let out = fx.text("ps", &["-a"]);
        let mut lines = out.lines();
        assert!(lines.next().unwrap().starts_with("PID      NAME"));
        assert_eq!(lines.next().unwrap(), "-".repeat(40));
        let me = std::process::id().to_string();
        assert!(out.lines().any(|l| l.split_whitespace().next() == Some(me.as_str())));

        let full = fx.text("ps", &["-a", "-f"]);
        assert!(full.lines().next().unwrap().contains("COMMAND"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_free_layout() {
        let mut fx = Fixture::new();
        let out = fx.text("free", &[]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("total"));
        assert!(lines[1].starts_with("Mem:"));
        assert!(lines[2].starts_with("Swap:"));

        let human = fx.text("free", &["-h"]);
        let total = human.lines().nth(1).unwrap().split_whitespace().nth(1).unwrap();
        assert!(total.ends_with(['B', 'K', 'M', 'G', 'T', 'P']));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_df_and_top() {
        let mut fx = Fixture::new();
        let out = fx.text("df", &["-h"]);
        assert!(out.starts_with("Filesystem"));

        let out = fx.text("top", &[]);
        assert!(out.starts_with("System: "));
        assert!(out.contains("Top Processes by CPU:"));
    }
}
