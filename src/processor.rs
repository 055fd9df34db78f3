//! The sequential enrichment loop over the canonical directory.

use crate::cache::EnrichmentCache;
use crate::discovery::UrlDiscoveryClient;
use crate::error::Result;
use crate::models::HospitalRecord;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Which records a run visits and how.
#[derive(Debug, Clone, Default)]
pub(crate) struct RunOptions {
    /// Offset into the list of records still missing a link.
    pub start: usize,
    /// At most this many records; `None` means all remaining.
    pub count: Option<usize>,
    /// Re-run discovery even for cached hospitals.
    pub force: bool,
    /// Save the cache after every this many records.
    pub checkpoint_every: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub processed: usize,
    pub checkpoints: usize,
}

/// Records missing a website or appointment link, windowed by `start`/`count`.
pub(crate) fn select_work<'a>(
    directory: &'a [HospitalRecord],
    start: usize,
    count: Option<usize>,
) -> Vec<&'a HospitalRecord> {
    directory
        .iter()
        .filter(|h| h.needs_links())
        .skip(start)
        .take(count.unwrap_or(usize::MAX))
        .collect()
}

/// Processes the selected records one at a time, checkpointing the cache to
/// `cache_path` every `checkpoint_every` records and once more at the end.
pub(crate) async fn run_enrichment(
    directory: &[HospitalRecord],
    cache: &mut EnrichmentCache,
    discovery: &UrlDiscoveryClient,
    cache_path: &Path,
    options: &RunOptions,
) -> Result<RunSummary> {
    let work = select_work(directory, options.start, options.count);
    let checkpoint_every = options.checkpoint_every.max(1);
    tracing::info!(target: "enrich_task",
        "To process: {} hospitals (from index {}); cache already holds {}",
        work.len(), options.start, cache.len()
    );

    let progress_bar = ProgressBar::new(work.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );

    let mut summary = RunSummary::default();
    for (i, hospital) in work.iter().enumerate() {
        tracing::info!(target: "enrich_task",
            "[{}/{}] {} ({})", i + 1, work.len(), hospital.name, hospital.city
        );
        progress_bar.set_message(hospital.name.clone());
        cache.process(hospital, discovery, options.force).await;
        summary.processed += 1;
        progress_bar.inc(1);

        if summary.processed % checkpoint_every == 0 {
            cache.save(cache_path)?;
            summary.checkpoints += 1;
            tracing::info!(target: "enrich_task", "  Checkpoint: {} cache entries saved", cache.len());
        }
    }

    cache.save(cache_path)?;
    summary.checkpoints += 1;
    progress_bar.finish_with_message("Processing complete");

    tracing::info!(target: "enrich_task",
        "Done: processed {} hospitals, cache holds {}. Run with --merge to fold results into the directory.",
        summary.processed, cache.len()
    );
    Ok(summary)
}
