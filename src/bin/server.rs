//! Summarization server binary.
//! Run with: cargo run --bin textsum-server

use std::process::ExitCode;

use textsum::startup;

fn main() -> ExitCode {
    startup::run()
}
