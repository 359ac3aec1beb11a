use std::process::ExitCode;

use clap::Parser;
use mcpgen::cli::{run_cli, Cli};
use mcpgen::error::GenError;
use mcpgen::logging::{init_logging, LogConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env();
    if cli.verbose {
        log_config = log_config.verbose();
    }
    if let Err(err) = init_logging(&log_config) {
        eprintln!("Warning: {err:#}");
    }

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("❌ {err:#}");
            let buffer = err.downcast_ref::<GenError>().and_then(GenError::raw_buffer);
            if let Some(buffer) = buffer.filter(|b| !b.is_empty()) {
                eprintln!("--- generated source ---\n{buffer}");
            }
            ExitCode::FAILURE
        }
    }
}
