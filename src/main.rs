use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use linkhawk::checker::check_single_url;
use linkhawk::config::Config;
use linkhawk::pipeline::Pipeline;
use linkhawk::storage::LinkStore;

#[derive(Parser)]
#[command(
    name = "linkhawk",
    version,
    about = "Link liveliness assessment for OGC metadata catalogues",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    /// Path to a TOML configuration file (environment variables otherwise)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one full assessment pass over the catalogue
    Run,

    /// Check a single URL without persisting anything
    Check {
        /// URL to probe
        url: String,

        /// Also harvest capability metadata for recognized services
        #[arg(long, default_value = "false")]
        capabilities: bool,
    },

    /// Create the database tables if they do not exist
    InitDb,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate()?;

    match cli.command {
        Commands::Run => {
            tracing::info!(
                catalogue = %config.catalogue.base_url,
                collection = %config.catalogue.collection,
                "Starting run command"
            );
            let pipeline = Pipeline::new(config).await?;
            let summary = pipeline.run().await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Commands::Check { url, capabilities } => {
            tracing::info!(
                url = %url,
                capabilities = %capabilities,
                "Starting check command"
            );
            let report = check_single_url(&url, capabilities, &config.checker).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::InitDb => {
            tracing::info!(
                host = %config.database.host,
                dbname = %config.database.dbname,
                "Starting init-db command"
            );
            let store = LinkStore::connect(&config.database)?;
            store.ensure_schema().await?;
            println!("Database schema ready");
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("linkhawk=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("linkhawk=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
