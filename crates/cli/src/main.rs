use anyhow::Result;
use clap::{Parser, Subcommand};
use lightchat_core::env_non_empty;
use lightchat_storage::StorageBackend;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "lightchat")]
#[command(about = "Chat assistant that controls your lights", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP chat API
    Serve {
        #[arg(short, long, default_value = "8080")]
        port: u16,
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
    },
    /// Inspect or change lights directly, without the assistant
    Lights {
        #[command(subcommand)]
        command: LightsCommand,
    },
}

#[derive(Subcommand)]
pub(crate) enum LightsCommand {
    /// Print every light as JSON
    List,
    /// Create a light that starts switched off
    Create { name: String },
    /// Delete a light by id
    Delete { id: u64 },
    /// Switch a light on or off
    Power {
        id: u64,
        #[arg(action = clap::ArgAction::Set)]
        on: bool,
    },
    /// Set the colour temperature in Kelvin; omit to clear it
    Temperature { id: u64, kelvin: Option<i64> },
}

/// `DATABASE_URL` selects PostgreSQL; without it state lives in memory.
pub(crate) async fn open_storage() -> Result<StorageBackend> {
    match env_non_empty("DATABASE_URL") {
        Some(url) => {
            let backend = StorageBackend::new_postgres(&url).await?;
            tracing::info!("Connected to PostgreSQL light store");
            Ok(backend)
        },
        None => {
            tracing::warn!("DATABASE_URL not set, lights are kept in memory and lost on exit");
            Ok(StorageBackend::new_memory())
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, host } => commands::serve::run(port, host).await?,
        Commands::Lights { command } => commands::lights::run(command).await?,
    }

    Ok(())
}
