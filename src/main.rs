use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dify_assistant::cli::{self, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so command output on stdout stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli::run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {}", err.user_message());
            ExitCode::FAILURE
        }
    }
}
