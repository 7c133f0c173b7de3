use clap::Parser;
use dotenv::dotenv;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;

use cli::Cli;
use commands::CommandContext;
use shared_config::AppConfig;

#[tokio::main]
async fn main() -> ExitCode {
    // Loading Env Vars
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    info!("Using scheduling API at {}", config.api_base_url);
    debug!("{:?}", cli.command);

    match CommandContext::new(config).run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}
