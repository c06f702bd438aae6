//! cobbler CLI binary.
//!
//! All logic lives in the library; `main` only builds a `tokio` runtime,
//! parses arguments, and maps the resulting exit code to the process exit.

use clap::Parser;
use cobbler::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let exit_code = cobbler::cli::run(cli).await;
    std::process::exit(exit_code.as_i32());
}
