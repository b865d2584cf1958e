use std::fs;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use confab::config::ServerConfig;
use confab::server::{AppState, create_router};
use confab::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "confab")]
#[command(about = "Admin and auth service for the Confab meeting platform", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "8057")]
        port: u16,

        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Shared secret expected in the X-Admin-API-Key header. Until this
        /// is set, admin endpoints report a server misconfiguration.
        #[arg(long, env = "CONFAB_ADMIN_API_KEY", hide_env_values = true)]
        admin_api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("confab=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            data_dir,
            admin_api_key,
        } => {
            let config = ServerConfig {
                host,
                port,
                data_dir: data_dir.into(),
                admin_api_key,
            };

            fs::create_dir_all(&config.data_dir)?;

            let store = SqliteStore::new(config.db_path())?;
            store.initialize()?;

            if config.admin_api_key.is_none() {
                warn!(
                    "No admin API key configured; admin endpoints will fail until CONFAB_ADMIN_API_KEY or --admin-api-key is set"
                );
            }

            let state = Arc::new(AppState::new(
                Arc::new(store),
                config.admin_api_key.clone(),
            ));

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
