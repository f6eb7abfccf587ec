//! Binary entrypoint that serves the paper feed.

use std::process::ExitCode;

use paperfeed::start_paperfeed;

/// Start the HTTP server with configuration from the environment.
fn main() -> ExitCode {
    start_paperfeed::run()
}
