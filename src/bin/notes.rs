use clap::Parser;
use mini_notes_api::cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Errors are already printed in the selected output format
    if mini_notes_api::cli::run(cli).await.is_err() {
        std::process::exit(1);
    }
}
