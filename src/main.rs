use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newsbrief::app::AppContext;
use newsbrief::cli::{commands, Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries the digest or the delivery receipt.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let ctx = AppContext::new(cli.config.as_deref())?;

    match cli.command() {
        Commands::Run { dry_run } => {
            commands::run(&ctx, dry_run).await?;
        }
        Commands::Fetch { url, limit } => {
            commands::fetch_feed(&ctx, &url, limit).await?;
        }
        Commands::Translate { titles } => {
            commands::translate_titles(&ctx, &titles).await?;
        }
    }

    Ok(())
}
