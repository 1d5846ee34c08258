//! bucket-migrate CLI
//!
//! CLI tool for exporting document-store buckets to JSON files and
//! re-importing them into a fresh instance.
//! Pedantic lints relaxed for CLI ergonomics.

// CLI tool - relax pedantic lints for ergonomics
#![allow(clippy::pedantic)]

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use bucket_migrate::{export, store, HttpStoreClient, ImportPipeline, MigrationConfig};

#[derive(Parser)]
#[command(name = "bucket-migrate")]
#[command(version)]
#[command(about = "Move document-store buckets between a live instance and JSON export files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Dry run mode (don't write to the store)
    #[arg(long)]
    dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Import export files into the store
    Import {
        /// Configuration file path
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        /// Dry run mode (don't write to the store)
        #[arg(long)]
        dry_run: bool,
    },

    /// Export buckets to `<bucket>_export.json` files
    Export {
        /// Configuration file path
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        /// Bucket to export (repeatable)
        #[arg(short, long = "bucket", value_name = "NAME", required = true)]
        buckets: Vec<String>,
    },

    /// Validate configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
    },

    /// Generate example configuration
    Init {
        /// Output file path
        #[arg(short, long, default_value = "migration.yaml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Some(Commands::Import { config, dry_run }) => {
            run_import(&config, dry_run || cli.dry_run).await?;
        }
        Some(Commands::Export { config, buckets }) => {
            run_export(&config, &buckets).await?;
        }
        Some(Commands::Validate { config }) => {
            validate_config(&config)?;
        }
        Some(Commands::Init { output }) => {
            generate_config(&output)?;
        }
        None => {
            // Default: import if a config was provided
            if let Some(config) = cli.config {
                run_import(&config, cli.dry_run).await?;
            } else {
                eprintln!("Usage: bucket-migrate --config <FILE> or bucket-migrate <COMMAND>");
                eprintln!("Try 'bucket-migrate --help' for more information.");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn run_import(config_path: &PathBuf, dry_run: bool) -> anyhow::Result<()> {
    info!("Loading configuration from {:?}", config_path);

    let mut config = MigrationConfig::from_file(config_path)?;
    if dry_run {
        config.options.dry_run = true;
    }
    config.validate()?;

    let client = connect(&config).await?;

    info!("Starting import...");
    let pipeline = ImportPipeline::new(&client, &config);
    let stats = pipeline.run().await?;

    println!("\n✅ Import Complete!");
    println!("   Buckets:        {}", stats.buckets);
    println!("   Documents:      {}", stats.documents);
    println!("   Created:        {}", stats.created);
    println!("   Already there:  {}", stats.already_exists);
    println!("   Failed:         {}", stats.failed);
    println!("   Generated keys: {}", stats.generated_keys);
    println!("   Duration:       {:.2}s", stats.duration_secs);

    Ok(())
}

async fn run_export(config_path: &PathBuf, buckets: &[String]) -> anyhow::Result<()> {
    info!("Loading configuration from {:?}", config_path);

    let config = MigrationConfig::from_file(config_path)?;
    config.validate()?;

    let client = connect(&config).await?;

    let total = export::export_buckets(&client, &config.source_dir, buckets).await?;

    println!("\n✅ Export Complete!");
    println!("   Buckets:   {}", buckets.len());
    println!("   Documents: {}", total);
    println!("   Directory: {}", config.source_dir.display());

    Ok(())
}

/// Builds the store client and waits for the store to answer.
///
/// The only fatal failure of a run: if the store never becomes reachable
/// within the startup poll budget, the whole run aborts.
async fn connect(config: &MigrationConfig) -> anyhow::Result<HttpStoreClient> {
    let client = HttpStoreClient::new(config.store.clone())?;
    store::wait_until_available(&client, &config.store.url, &config.options.startup_poll())
        .await?;
    Ok(client)
}

fn validate_config(config_path: &PathBuf) -> anyhow::Result<()> {
    info!("Validating configuration from {:?}", config_path);

    let config = MigrationConfig::from_file(config_path)?;
    config.validate()?;

    println!("✅ Configuration is valid!");
    println!("   Store:        {}", config.store.url);
    println!("   Source dir:   {}", config.source_dir.display());
    println!("   Users bucket: {}", config.users_bucket);
    println!("   Extras:       {}", config.extra_buckets.len());

    Ok(())
}

fn generate_config(output: &PathBuf) -> anyhow::Result<()> {
    std::fs::write(output, CONFIG_TEMPLATE)?;
    println!("✅ Generated configuration: {:?}", output);
    println!(
        "   Edit the file and run: bucket-migrate import --config {:?}",
        output
    );

    Ok(())
}

const CONFIG_TEMPLATE: &str = r#"# bucket-migrate configuration
store:
  url: http://localhost:8091
  username: user1
  password: password

# Directory holding <bucket>_export.json files (also the export target)
source_dir: ./exportedBucketsData

# Settings for buckets created during import
bucket:
  ram_quota_mb: 100
  flush_enabled: true

# Documents in this bucket are keyed by their email field
users_bucket: UsersBDD

# Empty buckets to provision even though no export file exists for them
extra_buckets: []

options:
  dry_run: false
  # Bucket readiness polling after creation
  poll_interval_ms: 1000
  max_poll_attempts: 30
  # Store availability polling at startup
  startup_interval_ms: 10000
  startup_max_attempts: 30
"#;
