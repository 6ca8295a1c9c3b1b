//! Build script for pc-metrics
//!
//! Stamps both binaries with build metadata, read back by `BuildInfo`.

use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    let rustc = std::env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let stamps = [
        ("BUILD_TIME", Some(seconds.to_string())),
        ("GIT_HASH", command_output("git", &["rev-parse", "--short", "HEAD"])),
        ("RUST_VERSION", command_output(&rustc, &["--version"])),
    ];
    for (name, value) in stamps {
        let value = value.unwrap_or_else(|| "unknown".to_string());
        println!("cargo:rustc-env={name}={value}");
    }

    for watched in [".git/HEAD", ".git/refs/heads/", "Cargo.toml"] {
        println!("cargo:rerun-if-changed={watched}");
    }
}

/// Trimmed stdout of a successful command
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    Some(text.trim().to_string()).filter(|t| !t.is_empty())
}
