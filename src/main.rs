use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pasty::commands::{purge_expired, serve};
use pasty::config::Config;
use pasty::App;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the TOML config file. Missing files are ignored.
    #[arg(short, long, default_value = "pasty.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve,
    /// Delete every expired paste and exit.
    PurgeExpired,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // try to load .env, ignoring any errors
    _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let app = App::connect(config).await?;

    match cli.command {
        Command::Serve => serve::run(app).await,
        Command::PurgeExpired => purge_expired::run(app).await,
    }
}
