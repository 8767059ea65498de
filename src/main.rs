use std::process::ExitCode;

use clap::Parser;

use crate::cli::Cli;

mod cli;
mod collect;
mod config;
mod credentials;
mod logging;
mod login;
mod orchestrator;
mod phone;
mod prompt;
mod report;
mod store;
mod wrapped_client;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            report::failure(&format!("Fatal Error: {err}"));
            return ExitCode::FAILURE;
        }
    };
    let result = runtime.block_on(Cli::parse().process());
    // a cancelled prompt may leave a thread blocked on stdin
    runtime.shutdown_background();

    match result {
        Ok(exit_code) => exit_code,
        Err(err) => {
            report::failure(&format!("Fatal Error: {err:#}"));
            ExitCode::FAILURE
        }
    }
}
