use anyhow::Result;
use clap::{Parser, Subcommand};
use pokedb::http::{serve, AppState};
use pokedb::{CollectionStore, RecordKey};
use pokedb_storage_sled::SledStore;
use serde_json::Value;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

const COLLECTION: &str = "pokemon";

#[derive(Parser)]
#[command(
    name = "pokedb",
    about = "pokedb - a key-value backed record service",
    version = "0.1.0",
    long_about = None
)]
struct Cli {
    /// Database directory path
    #[arg(short, long, default_value = "./pokedb.db")]
    database: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    // --- Data commands against the local database ---
    /// List all records
    List,
    /// Get a record by id
    Get { id: String },
    /// Create a record from a JSON object
    Create { body: String },
    /// Delete a record by id
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let store = Arc::new(SledStore::open(&cli.database)?);
    let collection = Arc::new(CollectionStore::new(store, COLLECTION));

    match cli.command {
        Commands::Serve { port, host } => {
            let addr: SocketAddr = format!("{host}:{port}").parse()?;
            println!("Starting pokedb server on http://{addr}");
            serve(addr, AppState::new(collection)).await?;
        }
        Commands::List => {
            let records = collection.list().await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::Get { id } => {
            let record = collection.get(&RecordKey::parse(&id)).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Create { body } => {
            let body: Value = serde_json::from_str(&body)?;
            let record = collection.create(body).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Delete { id } => {
            collection.delete(&RecordKey::parse(&id)).await?;
            println!("deleted {id}");
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();
}
