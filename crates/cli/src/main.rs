//! Herbal garden CLI - query the garden backend from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # List all plants, or search
//! herbal-cli plants
//! herbal-cli plants --query neem
//!
//! # Show one plant
//! herbal-cli plant 7
//!
//! # Ask the AI assistant
//! herbal-cli ask "What is tulsi used for?"
//!
//! # Identify a plant from a photo
//! herbal-cli identify leaf.jpg
//! ```
//!
//! The backend location comes from `--backend-url` or `BACKEND_URL`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use herbal_garden_core::PlantId;
use herbal_garden_web::backend::BackendClient;
use herbal_garden_web::config::BackendConfig;

mod commands;

#[derive(Parser)]
#[command(name = "herbal-cli")]
#[command(author, version, about = "Virtual Herbal Garden CLI")]
struct Cli {
    /// Backend base URL (defaults to `BACKEND_URL`)
    #[arg(long, global = true)]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List or search plants
    Plants {
        /// Search term
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Show one plant
    Plant {
        /// Plant ID
        id: PlantId,
    },
    /// Ask the AI assistant a question
    Ask {
        /// The message to send
        message: String,
    },
    /// Identify a plant from an image file
    Identify {
        /// Path to a JPEG, PNG, GIF or WebP image
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "herbal_cli=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let config = match cli.backend_url.as_deref() {
        Some(url) => BackendConfig::new(url)?,
        None => BackendConfig::from_env()?,
    };
    let backend = BackendClient::new(&config)?;
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Plants { query } => {
            commands::plants::list(&backend, query.as_deref(), &mut out).await?;
        }
        Commands::Plant { id } => commands::plants::show(&backend, id, &mut out).await?,
        Commands::Ask { message } => commands::ask::run(&backend, &message, &mut out).await?,
        Commands::Identify { path } => commands::identify::run(&backend, &path, &mut out).await?,
    }
    Ok(())
}
