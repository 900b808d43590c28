use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::auth::password::hash_password;
use crate::auth::{AuthError, AuthService, Role};
use crate::config::AppConfig;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "students-api")]
#[command(about = "Student records REST API server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides PORT)")]
        port: Option<u16>,
        #[arg(long, help = "SQLite database URL (overrides DATABASE_URL)")]
        database_url: Option<String>,
    },

    #[command(about = "Create the schema and seed the configured admin and API keys, then exit")]
    InitDb {
        #[arg(long, help = "SQLite database URL (overrides DATABASE_URL)")]
        database_url: Option<String>,
    },

    #[command(about = "Print a password hash in the stored format")]
    HashPassword {
        #[arg(help = "Plain-text password")]
        password: String,
    },

    #[command(about = "Print the role of a registered API key; fails for unknown keys")]
    CheckApiKey {
        #[arg(help = "Value sent in the X-API-Key header")]
        key: String,
        #[arg(long, help = "SQLite database URL (overrides DATABASE_URL)")]
        database_url: Option<String>,
    },
}

pub async fn run(cli: Cli, mut config: AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve {
        port: None,
        database_url: None,
    }) {
        Commands::Serve { port, database_url } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(url) = database_url {
                config.database.url = url;
            }
            serve(config).await
        }
        Commands::InitDb { database_url } => {
            if let Some(url) = database_url {
                config.database.url = url;
            }
            let state = AppState::initialize(config).await?;
            info!("Database ready at {}", state.config.database.url);
            state.db.close().await;
            Ok(())
        }
        Commands::HashPassword { password } => {
            let hash = hash_password(&password, config.security.password_hash_rounds)
                .map_err(anyhow::Error::msg)?;
            println!("{}", hash);
            Ok(())
        }
        Commands::CheckApiKey { key, database_url } => {
            if let Some(url) = database_url {
                config.database.url = url;
            }
            let state = AppState::initialize(config).await?;
            let role = api_key_role(&state.auth, &key).await;
            state.db.close().await;

            match role? {
                Some(role) => {
                    println!("{}", role.as_str());
                    Ok(())
                }
                None => anyhow::bail!("API key is not registered"),
            }
        }
    }
}

/// `None` when the key is not registered.
pub async fn api_key_role(auth: &AuthService, key: &str) -> Result<Option<Role>, AuthError> {
    if !auth.is_valid_api_key(key).await? {
        return Ok(None);
    }
    let role = if auth.is_admin(key).await? {
        Role::Admin
    } else {
        Role::User
    };
    Ok(Some(role))
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    if crate::is_production!(config) && config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET_KEY must be set in production");
    }

    info!("Starting {} in {:?} mode", config.app.name, config.environment);
    let bind_addr = config.bind_addr();
    let state = AppState::initialize(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Listening on http://{}", bind_addr);

    axum::serve(listener, crate::app(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    state.db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
