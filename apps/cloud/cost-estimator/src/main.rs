//! Cost Estimator
//!
//! Prices an infrastructure requirement on AWS, Azure, and GCP from the local
//! price catalog. The catalog is read from Postgres, or from a JSON file of
//! catalog rows for offline runs.

use clap::{Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use database::postgres::{connect_with_retry, ping, run_migrations};
use database::retry::RetryPolicy;
use domain_estimation::{EstimateRequest, EstimationService, InfrastructureRequirement};
use domain_pricing::{
    CloudProvider, InMemoryPriceCatalog, PgPriceCatalog, PriceCatalog, UpsertCatalogEntry,
};
use eyre::{Result, WrapErr};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "cost-estimator")]
#[command(about = "Estimate monthly infrastructure cost on AWS, Azure, and GCP")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price an infrastructure requirement on one or more providers
    Estimate {
        /// JSON file holding the requirement (compute, database, network)
        #[arg(short, long)]
        requirement: PathBuf,

        /// Cloud providers to price (aws, azure, gcp)
        #[arg(short, long, value_delimiter = ',', default_value = "aws,azure,gcp")]
        providers: Vec<CloudProvider>,

        /// Region to price in
        #[arg(short = 'R', long)]
        region: String,

        /// Read catalog rows from this JSON file instead of Postgres
        #[arg(short, long)]
        catalog_file: Option<PathBuf>,
    },

    /// Price classified Azure estimate rows
    Classified {
        /// JSON file holding the rows, either an array or `{"rows": [...]}`
        #[arg(short, long)]
        input: PathBuf,

        /// Region of the estimate
        #[arg(short = 'R', long)]
        region: String,

        /// Read catalog rows from this JSON file instead of Postgres
        #[arg(short, long)]
        catalog_file: Option<PathBuf>,
    },

    /// Upsert catalog rows from a JSON file into Postgres
    ImportCatalog {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show catalog row counts per provider
    Status,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ClassifiedInput {
    Rows(Vec<Value>),
    Wrapped { rows: Vec<Value> },
}

impl ClassifiedInput {
    fn into_rows(self) -> Vec<Value> {
        match self {
            Self::Rows(rows) | Self::Wrapped { rows } => rows,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let cli = Cli::parse();

    match cli.command {
        Commands::Estimate {
            requirement,
            providers,
            region,
            catalog_file,
        } => {
            let requirement: InfrastructureRequirement = read_json(&requirement).await?;
            let catalog = open_catalog(&config, catalog_file.as_deref()).await?;
            let service = EstimationService::new(catalog, config.estimation.clone());

            info!(providers = ?providers, region = %region, "Estimating requirement");
            let outcome = service
                .estimate_providers(&EstimateRequest {
                    cloud_providers: providers,
                    region,
                    requirement,
                })
                .await?;

            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }

        Commands::Classified {
            input,
            region,
            catalog_file,
        } => {
            let rows = read_json::<ClassifiedInput>(&input).await?.into_rows();
            let catalog = open_catalog(&config, catalog_file.as_deref()).await?;
            let service = EstimationService::new(catalog, config.estimation.clone());

            info!(rows = rows.len(), region = %region, "Estimating classified rows");
            let estimate = service.estimate_classified(&region, &rows).await?;

            println!("{}", serde_json::to_string_pretty(&estimate)?);
        }

        Commands::ImportCatalog { file } => {
            let rows: Vec<UpsertCatalogEntry> = read_json(&file).await?;
            let catalog = connect_catalog(&config).await?;

            info!(rows = rows.len(), file = %file.display(), "Importing catalog rows");
            let written = catalog.upsert_many(rows).await?;
            info!(written, "Catalog import complete");
        }

        Commands::Status => {
            let catalog = connect_catalog(&config).await?;

            let mut counts = BTreeMap::new();
            for provider in CloudProvider::ALL {
                counts.insert(provider.to_string(), catalog.count_by_provider(provider).await?);
            }
            println!("{}", serde_json::to_string_pretty(&counts)?);
        }
    }

    Ok(())
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).wrap_err_with(|| format!("Failed to parse {}", path.display()))
}

async fn open_catalog(config: &Config, catalog_file: Option<&Path>) -> Result<Arc<dyn PriceCatalog>> {
    match catalog_file {
        Some(path) => {
            let rows: Vec<UpsertCatalogEntry> = read_json(path).await?;
            info!(rows = rows.len(), file = %path.display(), "Using file-backed catalog");
            let catalog = InMemoryPriceCatalog::with_entries(rows)?;
            Ok(Arc::new(catalog))
        }
        None => Ok(Arc::new(connect_catalog(config).await?)),
    }
}

async fn connect_catalog(config: &Config) -> Result<PgPriceCatalog> {
    info!("Connecting to database...");
    let db = connect_with_retry(config.database()?, RetryPolicy::default())
        .await
        .wrap_err("Database connection failed")?;
    run_migrations::<migration::Migrator>(&db).await?;
    ping(&db).await?;
    Ok(PgPriceCatalog::new(db))
}
