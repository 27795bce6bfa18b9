mod config;
mod ui;

use clap::Parser;
use crate::ui::cli;
use sshman_core::utils::logging::init_logging;
use sshman_core::SessionError;

fn main() {
    let args = cli::Args::parse();
    init_logging(args.verbose);
    if let Err(e) = cli::run_cli(args) {
        eprintln!("Error: {e:#}");
        // hand the remote client's status through, like ssh itself does
        let code = match e.downcast_ref::<SessionError>() {
            Some(SessionError::ExitStatus(code)) => *code,
            _ => 1,
        };
        std::process::exit(code);
    }
}
