//! Output Validation CLI
//!
//! # Usage
//!
//! ```bash
//! # Validate a record against a schema
//! output-validate validate --data record.json --schema schema.json --level standard
//!
//! # Describe the engine
//! output-validate capabilities --format yaml
//! ```
//!
//! # Exit Codes
//!
//! - 0: Record is valid
//! - 1: Record is invalid
//! - 3: Invalid input or arguments
//! - 4: File not found or inaccessible
//! - 5: Schema could not be compiled
//! - 10: Internal error

use clap::Parser;
use output_validation::{run_cli, ValidateCli};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = ValidateCli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let exit_code = run_cli(cli).await;
    std::process::exit(exit_code.into());
}

fn init_tracing(verbose: u8, json: bool) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}
