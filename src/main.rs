use std::io;

use clap::Parser;
use log::error;
use stepflow::cli::Cli;
use stepflow::{commands, AppConfig};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    let stdout = io::stdout();
    let code = match commands::execute(cli.command, &config, &mut stdout.lock()) {
        Ok(()) => 0,
        Err(e) => {
            error!("{e}");
            e.exit_code()
        }
    };
    std::process::exit(code);
}
