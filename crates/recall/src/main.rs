//! Recall Daemon - memory-augmented gateway in front of an LLM backend

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use recall_server::config::{Config, StoreBackend};
use recall_server::error::Result;
use recall_server::interests::OllamaGenerator;
use recall_server::memory::{InMemoryStore, Mem0Store, MemoryStore};
use recall_server::proxy::{AppState, Credentials, ProviderDescriptor, ProxyEngine, ProxyServer};

/// Recall - gives your LLM long-term memory
#[derive(Parser)]
#[command(name = "recall")]
#[command(about = "A gateway that injects long-term memory into LLM chat requests")]
#[command(version)]
pub struct Cli {
    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the gateway (default command)
    #[command(name = "serve")]
    Serve {
        /// Override the listen address from config
        #[arg(long)]
        listen: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        None => serve(cli.config, None).await,
        Some(Command::Serve { listen }) => serve(cli.config, listen).await,
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,recall_server=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(config_path: Option<PathBuf>, listen: Option<String>) -> Result<()> {
    tracing::info!("Starting Recall daemon");

    let config = Config::load(config_path.as_deref())?;
    tracing::debug!("Config loaded: {:?}", config);

    let credentials = Credentials::from_env(&config.providers);
    let descriptor = ProviderDescriptor::resolve(&config.providers, &credentials);
    tracing::info!(
        "Will use the {} backend ({}) with model {}",
        descriptor.kind,
        descriptor.base_url,
        descriptor.model
    );

    let engine = ProxyEngine::from_config(&config.server, descriptor)?;

    let store: Arc<dyn MemoryStore> = match config.store.backend {
        StoreBackend::Mem0 => Arc::new(Mem0Store::new(&config.store)?),
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store, memories are lost on restart");
            Arc::new(InMemoryStore::new())
        }
    };

    let generator = Arc::new(OllamaGenerator::new(&config.generation)?);

    let state = AppState {
        user_id: config.server.user_id.clone(),
        engine,
        store,
        generator,
    };

    let listen_addr = listen.unwrap_or(config.server.listen_addr);
    ProxyServer::new(listen_addr, state).serve().await
}
