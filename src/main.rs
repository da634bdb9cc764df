// src/main.rs

use std::process::ExitCode;

use verirun::cli;
use verirun::logging::init_logging;

/// Exit code for configuration and structural errors raised before (or
/// instead of) a verdict: unknown task, dependency cycle, invalid option.
const CONFIG_ERROR_EXIT: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    if let Err(err) = init_logging(args.log_level) {
        eprintln!("failed to initialise logging: {err}");
        return ExitCode::from(CONFIG_ERROR_EXIT);
    }

    match verirun::run(args).await {
        Ok(overall) => ExitCode::from(overall.exit_code()),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(CONFIG_ERROR_EXIT)
        }
    }
}
