//! Alias binary for the paper feed server.
//! Run with: cargo run --bin paperfeed-server

use std::process::ExitCode;

use paperfeed::start_paperfeed;

fn main() -> ExitCode {
    start_paperfeed::run()
}
