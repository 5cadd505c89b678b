use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::debug;

use youtube_faces_db::cli::Cli;
use youtube_faces_db::commands;
use youtube_faces_db::config::DbConfig;
use youtube_faces_db::Database;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise each `-v` raises the level one step from `warn`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = DbConfig::from_env(cli.overrides())?;
    debug!("resolved configuration: {config:?}");
    let db = Database::open(&config.catalog)?;
    commands::execute(&db, &config, &cli.command)
}
