use std::{io::Write, process::ExitCode};

use clap::Parser;

mod app;
mod settings;

/// Log to stderr with the level taken from LOG_LEVEL, printing only the message
fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("LOG_LEVEL", "info"))
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
}

fn main() -> ExitCode {
    let cli = app::Cli::parse();
    init_logging();

    if let Err(e) = app::run(&cli) {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
