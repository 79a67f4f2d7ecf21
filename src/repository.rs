use crate::config::Config;
use crate::error::Result;
use crate::listing;
use crate::manifest::{write_manifest, Manifest};
use crate::metadata::AddonMetadata;
use crate::parallel::{collect_results, ParallelFetcher};
use crate::processors::{run_blocking, FetchContext};
use indicatif::ProgressBar;
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Result of a successful repository run
#[derive(Debug, Clone)]
pub struct RepositorySummary {
    /// Add-ons in manifest order
    pub addons: Vec<AddonMetadata>,
    /// Written `addons.xml` (or `.gz`)
    pub manifest_path: PathBuf,
    /// Written checksum file
    pub checksum_path: PathBuf,
    /// MD5 of the uncompressed manifest
    pub digest: String,
}

/// Builds the repository for `locations` as configured.
///
/// All add-ons are fetched concurrently. The manifest and checksum are only
/// written when every add-on succeeded. The scratch folder is recreated at
/// the start and removed at the end, whatever the outcome.
pub async fn create_repository(
    locations: &[String],
    config: &Config,
    progress: Option<ProgressBar>,
) -> Result<RepositorySummary> {
    config.ensure_directories_exist().await?;
    let ctx = FetchContext::new(config)?;

    reset_scratch(&ctx.temp_dir).await?;
    let outcome = build(locations, config, &ctx, progress).await;
    if let Err(e) = tokio::fs::remove_dir_all(&ctx.temp_dir).await {
        warn!("Could not remove {}: {}", ctx.temp_dir.display(), e);
    }
    outcome
}

async fn build(
    locations: &[String],
    config: &Config,
    ctx: &FetchContext,
    progress: Option<ProgressBar>,
) -> Result<RepositorySummary> {
    if locations.is_empty() {
        warn!("No add-on locations given, writing an empty repository");
    }

    let fetcher = match progress {
        Some(progress) => ParallelFetcher::with_progress(progress),
        None => ParallelFetcher::new(),
    };
    let addons = collect_results(fetcher.fetch_all(locations, ctx).await)?;

    let manifest_path = config.manifest_path();
    let checksum_path = config.checksum_path();
    let manifest = Manifest::from_addons(&addons);
    let digest = write_manifest(&manifest, &manifest_path, &checksum_path, config.compressed).await?;

    if config.html_index {
        let repo_dir = ctx.target_dir.clone();
        let summary = run_blocking(move || listing::write_listings(&repo_dir)).await?;
        info!("Listed {} archives", summary.checksums);
    }

    Ok(RepositorySummary {
        addons,
        manifest_path,
        checksum_path,
        digest,
    })
}

async fn reset_scratch(temp_dir: &Path) -> Result<()> {
    if tokio::fs::try_exists(temp_dir).await? {
        info!("Removing leftover {}", temp_dir.display());
        tokio::fs::remove_dir_all(temp_dir).await?;
    }
    tokio::fs::create_dir_all(temp_dir).await?;
    Ok(())
}
