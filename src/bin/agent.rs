//! Metrics agent: samples this host and pushes to the collector

#![allow(missing_docs)]

use clap::Parser;
use pc_metrics::agent;
use pc_metrics::config::AgentArgs;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let args = AgentArgs::parse();

    match agent::run_agent(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
