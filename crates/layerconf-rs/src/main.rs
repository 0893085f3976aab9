use clap::Parser;
use layerconf_rs::cli::{self, Cli};
use log::error;
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    layerconf_rs::init_logging();
    let cli = Cli::parse();
    let mut stdout = io::stdout().lock();
    match cli::run(cli, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let status = cli::exit_status(&err);
            error!("layerconf failed (status={status:?})");
            eprintln!("error: {err:#}");
            ExitCode::from(status as u8)
        }
    }
}
