use anyhow::Result;
use clap::{Parser, Subcommand};
use helpboard_backend::api;
use helpboard_backend::bootstrap;
use helpboard_backend::config::HelpboardConfig;
use helpboard_backend::telemetry;

#[derive(Parser)]
#[command(author, version, about = "Helpboard backend daemon")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (Axum) for REST/API access
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let args = Args::parse();
    let config = HelpboardConfig::from_env()?;
    let bootstrap = bootstrap::initialize(&config)?;
    tracing::info!(
        db_path = %config.paths.db_path.display(),
        api_port = config.api_port,
        "bootstrap complete"
    );

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => api::serve_http(config, bootstrap.database).await,
    }
}
