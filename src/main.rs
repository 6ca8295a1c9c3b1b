//! Metrics collector server

#![allow(missing_docs)]

use clap::Parser;
use pc_metrics::config::ServerArgs;
use pc_metrics::server;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let args = ServerArgs::parse();

    match server::run_server(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Display keeps multi-line messages readable
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
