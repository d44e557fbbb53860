//! Snooze
//!
//! Command line client for the Hack-or-Snooze news API:
//! - Browse the story list
//! - Sign up, log in and keep the session between runs
//! - Post, edit, delete and favorite stories

use anyhow::anyhow;
use clap::Parser;
use snooze_cli::cli::{build_controller, execute, Cli};
use snooze_cli::CliConfig;
use tracing::{debug, error, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration, then let flags win
    let mut config = CliConfig::load()?;
    cli.apply_to(&mut config);

    // Initialize tracing. Logs go to stderr so command output stays clean.
    let log_level = match config.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "snooze={lvl},snooze_cli={lvl},news_api={lvl},session_store={lvl}",
            lvl = log_level
        )
        .into()
    });

    let fmt_layer = if cli.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.base_url,
        backend = ?config.session_backend,
        "Starting snooze"
    );

    let controller = build_controller(&config, cli.memory)?;

    match execute(&controller, cli.command).await {
        Ok(output) => {
            println!("{output}");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Command failed");
            Err(anyhow!(e.user_message()))
        }
    }
}
