use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod builder;
mod cache;
mod config;
mod discovery;
mod domain;
mod error;
mod fetcher;
mod locality;
mod matcher;
mod models;
mod phone;
mod processor;
mod scraper;
mod services;
mod source;
mod tables;

use crate::cache::EnrichmentCache;
use crate::config::{Config, ConfigArgs};
use crate::models::CoverageStats;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the directory from a CSV export of the government extract
    Normalize {
        /// Path to the raw extract (CSV export of the first sheet)
        #[arg(short, long)]
        raw: PathBuf,

        /// Previous directory whose links are carried over (defaults to the directory file)
        #[arg(short, long)]
        prior: Option<PathBuf>,

        /// Where to write the rebuilt directory (defaults to the directory file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Discover website and appointment links into the cache
    Enrich {
        /// Start at this index of the hospitals still missing links
        #[arg(long, default_value_t = 0)]
        start: usize,

        /// Process at most this many hospitals
        #[arg(long)]
        count: Option<usize>,

        /// Merge the cache into the directory file without searching
        #[arg(long)]
        merge: bool,

        /// Print coverage statistics and exit
        #[arg(long)]
        stats: bool,

        /// Ignore cache hits and search again
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = config::build_config(&cli.config)?;

    match cli.command {
        Commands::Normalize { raw, prior, output } => {
            let prior = prior.unwrap_or_else(|| config.directory_file.clone());
            let output = output.unwrap_or_else(|| config.directory_file.clone());
            normalize_file(&raw, &prior, &output)?;
        }
        Commands::Enrich {
            start,
            count,
            merge,
            stats,
            force,
        } => {
            enrich_directory(&config, start, count, merge, stats, force).await?;
        }
    }

    Ok(())
}

fn normalize_file(raw: &Path, prior: &Path, output: &Path) -> Result<()> {
    info!("Reading prior directory {}", prior.display());
    let prior_directory = source::load_directory_or_empty(prior)
        .with_context(|| format!("Failed to load prior directory {}", prior.display()))?;
    let matcher = matcher::ContainmentMatcher::from_directory(&prior_directory);
    info!("  Indexed {} prior entries", matcher.len());

    let rows = source::read_raw_rows(raw)
        .with_context(|| format!("Failed to read raw extract {}", raw.display()))?;

    let (hospitals, report) = builder::normalize(&rows, &matcher);
    info!("  Built {} hospital entries", report.built);
    info!("  Skipped {} due to unknown city", report.dropped_unresolved_city);
    info!("  Skipped {} non-hospital rows", report.skipped_not_hospital);
    info!(
        "  Links preserved: website={} appointment={}",
        report.websites_preserved, report.appointments_preserved
    );
    info!("City distribution:");
    for (city, count) in &report.city_distribution {
        info!("  {}: {}", city, count);
    }

    source::save_directory(output, &hospitals)
        .with_context(|| format!("Failed to write directory {}", output.display()))?;
    Ok(())
}

async fn enrich_directory(
    config: &Config,
    start: usize,
    count: Option<usize>,
    merge: bool,
    stats: bool,
    force: bool,
) -> Result<()> {
    let mut directory = source::load_directory(&config.directory_file).with_context(|| {
        format!("Failed to load directory {}", config.directory_file.display())
    })?;
    let mut cache = EnrichmentCache::load(&config.cache_file)
        .with_context(|| format!("Failed to load cache {}", config.cache_file.display()))?;

    if stats {
        log_stats(&cache::coverage_stats(&directory, &cache));
        return Ok(());
    }

    if merge {
        cache::merge(&mut directory, &cache);
        source::save_directory(&config.directory_file, &directory)?;
        log_stats(&cache::coverage_stats(&directory, &cache));
        return Ok(());
    }

    let fetcher = Arc::new(fetcher::HttpFetcher::new(config)?);
    let discovery = discovery::UrlDiscoveryClient::new(fetcher, config);
    let options = processor::RunOptions {
        start,
        count,
        force,
        checkpoint_every: config.checkpoint_every,
    };
    processor::run_enrichment(&directory, &mut cache, &discovery, &config.cache_file, &options)
        .await?;
    Ok(())
}

fn log_stats(stats: &CoverageStats) {
    info!(
        "Directory: {} hospitals  website={}  appointment={}",
        stats.directory_total, stats.directory_with_website, stats.directory_with_appointment
    );
    info!(
        "Cache    : {} entries    website={}  appointment={}",
        stats.cache_total, stats.cache_with_website, stats.cache_with_appointment
    );
}
