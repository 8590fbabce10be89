mod app;
mod color;
mod data;
mod export;

use std::process::ExitCode;

use clap::Parser;

use app::Cli;

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match app::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
