use env_logger::Env;
use log::LevelFilter;

/// Initialize logging using env_logger.
///
/// `verbosity` is the number of `-v` flags: warn by default, then info,
/// debug and trace. `RUST_LOG` always takes precedence,
/// e.g. `RUST_LOG=sshman_core=trace ssh-manager ls`.
pub fn init_logging(verbosity: u8) {
    let default = level_for(verbosity).as_str().to_ascii_lowercase();
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default))
        .format_timestamp(None)
        .try_init();
}

fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
