use clap::Parser;
use students_api::cli::Cli;
use students_api::config::AppConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL, JWT_SECRET_KEY, etc. apply.
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    if let Err(e) = students_api::cli::run(cli, config).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
