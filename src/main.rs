use env_logger::Env;
use log::{debug, LevelFilter};
use std::env;

use termina::core::config::{Config, RcLoader};
use termina::core::{SessionState, Terminal};
use termina::error::ShellError;
use termina::flags::Flags;
use termina::input::History;
use termina::shell::Shell;

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        LevelFilter::Debug
    } else if quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Warn
    };
    let mut builder =
        env_logger::Builder::from_env(Env::default().default_filter_or(default_level.as_str()));
    builder.format_timestamp_millis();
    let _ = builder.try_init();
}

fn main() -> Result<(), ShellError> {
    let mut flags = Flags::new();
    let args: Vec<String> = env::args().skip(1).collect();
    flags.parse(&args)?;

    if flags.is_set("help") {
        flags.print_help();
        return Ok(());
    }

    if flags.is_set("version") {
        println!("Termina {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = Config::from_flags(&flags)?;
    init_logging(config.debug, config.quiet);
    debug!("{:?}", config);

    let history = History::open(&config.history_path, config.max_history);
    let mut terminal = Terminal::new(SessionState::new()?, history);
    let applied = RcLoader::new(&config.rc_path).load(&mut terminal)?;
    debug!("{} rc lines applied from {}", applied, config.rc_path.display());

    match config.serve.as_deref() {
        Some(addr) => termina::api::serve(addr, terminal),
        None => Shell::new(terminal, config.quiet)?.run(),
    }
}
