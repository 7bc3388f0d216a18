use std::fs;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use flexicad::config::ServerConfig;
use flexicad::server::{AppState, create_router};
use flexicad::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "flexicad")]
#[command(about = "An AI-assisted OpenSCAD design server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "8080")]
        port: u16,

        /// Data directory for database and knowledge objects
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Add an email to the admin allowlist directly in the database.
    /// Useful for bootstrapping the first admin before the server runs.
    AddEmail {
        email: String,

        /// Data directory holding the database
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },
}

fn open_store(data_dir: &str) -> anyhow::Result<SqliteStore> {
    let data_path: std::path::PathBuf = data_dir.into();
    fs::create_dir_all(&data_path)?;

    let store = SqliteStore::new(data_path.join("flexicad.db"))?;
    store.initialize()?;
    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("flexicad=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::AddEmail { email, data_dir } => {
                let email = email.trim().to_lowercase();
                if email.is_empty() {
                    anyhow::bail!("Email cannot be empty");
                }

                let store = open_store(&data_dir)?;
                let added = store.add_admin_email(&email, None)?;
                if added {
                    println!("Added {email} to the admin allowlist.");
                } else {
                    println!("{email} is already on the admin allowlist.");
                }
            }
        },
        Commands::Serve {
            host,
            port,
            data_dir,
        } => {
            let config = ServerConfig {
                host,
                port,
                data_dir: data_dir.into(),
                ..ServerConfig::default()
            }
            .load_env()?;

            fs::create_dir_all(&config.data_dir)?;

            let store = SqliteStore::new(config.db_path())?;
            store.initialize()?;

            let state = Arc::new(AppState::new(Arc::new(store), &config));

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
