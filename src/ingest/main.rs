//! Genealogy ingest pipeline.
//!
//! Picks up the downloaded family export, geocodes its place columns,
//! and replaces the family table in SQLite.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use kinmap::config::Config;
use kinmap::discord::DiscordWebhook;
use kinmap::geocode::{GoogleGeocoder, PlaceCache, PlaceResolver};
use kinmap::pipeline::{ingest_file, IngestReport};
use kinmap::source::{normalize_export, ExportFile};
use kinmap::store::SqliteStore;

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Geocode a family genealogy export and store it in SQLite")]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "kinmap.toml")]
    config: PathBuf,

    /// Read this CSV directly instead of looking for a fresh export
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Discord webhook URL for notifications (overrides the config file)
    #[arg(long)]
    discord_webhook: Option<String>,

    /// Hide the per-column progress bars
    #[arg(long)]
    quiet: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("kinmap ingest");
    let config = Config::load_from_file(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;

    let discord = args
        .discord_webhook
        .clone()
        .or_else(|| config.notifications.discord_webhook.clone())
        .map(DiscordWebhook::new);

    let family = config.family.name.clone();

    if let Some(ref dw) = discord {
        dw.notify(
            "Ingest Started",
            &format!("Starting ingest for family **{}**", family),
            true,
        )
        .await;
    }

    match run(&args, &config).await {
        Ok(Some(report)) => {
            if let Some(ref dw) = discord {
                dw.notify(
                    "Ingest Complete",
                    &format!("Family **{}**\n{}", family, report.describe()),
                    true,
                )
                .await;
            }
            Ok(())
        }
        Ok(None) => {
            info!("Nothing to do");
            Ok(())
        }
        Err(e) => {
            error!("Ingest failed: {:#}", e);
            if let Some(ref dw) = discord {
                dw.notify(
                    "Ingest Failed",
                    &format!("Family **{}**: {:#}", family, e),
                    false,
                )
                .await;
            }
            Err(e)
        }
    }
}

/// Returns `None` when no export was waiting to be processed.
async fn run(args: &Args, config: &Config) -> Result<Option<IngestReport>> {
    let csv = match &args.csv {
        Some(path) => path.clone(),
        None => match normalize_export(&config.family.source_dir, &config.family.name)? {
            ExportFile::Renamed(path) => path,
            ExportFile::NotFound => return Ok(None),
        },
    };
    info!("File: {}", csv.display());

    let geocoder = GoogleGeocoder::new(
        &config.geocoder.api_key,
        &config.geocoder.endpoint,
        config.geocoder_timeout(),
    )?;
    let mut resolver = PlaceResolver::new(geocoder, PlaceCache::new(config.enrichment.cache_capacity));

    let store = SqliteStore::new(&config.database.path, &config.table_name());

    let report = ingest_file(
        &csv,
        &config.enrichment.columns,
        &mut resolver,
        &store,
        !args.quiet,
    )
    .await?;

    info!(
        "Stored {} rows in table '{}' of {}",
        report.rows,
        store.table_name(),
        store.path().display()
    );
    Ok(Some(report))
}
