//! Resume analysis command-line client
//!
//! Single binary that:
//! 1. Loads the backend URL and account from TOML + env
//! 2. Signs in (session cookie held in memory for this run)
//! 3. Runs one command, renewing the session transparently if it expires
//! 4. Prints the result as JSON on stdout; logs go to stderr

mod commands;
mod config;

use anyhow::{Context, Result};
use resume_api::ApiClient;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::Command;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs on stderr with LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = commands::parse_args(&args)?;

    if cli.command == Command::Help {
        println!("{}", commands::USAGE);
        return Ok(());
    }

    let config_path = Config::resolve_path(cli.config.as_deref());
    debug!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        base_url = %config.api.base_url,
        timeout_secs = config.api.timeout_secs,
        refresh_timeout_secs = ?config.api.refresh_timeout_secs,
        command = ?cli.command,
        "configuration loaded"
    );

    let client = ApiClient::connect(&config.client_settings())
        .context("failed to build HTTP client")?;

    let output = commands::run(&client, &config.credentials, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
