use cachefmt::cli::Cli;
use clap::Parser;
use env_logger::Env;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };
    env_logger::init_from_env(Env::default().filter_or("CACHEFMT_LOG", level));

    match cachefmt::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Invalid parameters: {e}");
            ExitCode::FAILURE
        }
    }
}
