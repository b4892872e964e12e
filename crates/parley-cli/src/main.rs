use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod configuration;
mod error;
mod prompt;
mod session;

use configuration::{Overrides, Settings};
use session::Session;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Anthropic API key (can also be set via PARLEY_PROVIDER__API_KEY or ANTHROPIC_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// API host (can also be set via PARLEY_PROVIDER__HOST)
    #[arg(long)]
    host: Option<String>,

    /// Model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Output token bound for every model call
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Send one message, print the reply and exit
    #[arg(short = 't', long)]
    message: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::load(Overrides {
        api_key: cli.api_key,
        host: cli.host,
        model: cli.model,
        max_tokens: cli.max_tokens,
    })?;
    let mut session = Session::new(settings)?;

    match cli.message {
        Some(message) => session.headless_start(&message).await,
        None => session.start().await,
    }
}
