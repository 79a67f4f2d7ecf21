use crate::config::Config;
use crate::error::{RepoError, Result};
use crate::metadata::AddonMetadata;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::path::{Path, PathBuf};

/// Shared helpers for fetchers (archive building, metadata copies, downloads)
pub mod common;
/// Add-ons from a local source folder
pub mod folder;
/// Add-ons from a pre-built zip archive
pub mod archive;
/// Add-ons from a git-hosted branch archive
pub mod git;
/// Skin texture packing with the external TexturePacker tool
pub mod textures;

pub use archive::ArchiveFetcher;
pub use folder::FolderFetcher;
pub use git::{GitFetcher, GitSource};

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9+.-]+://.").unwrap());

/// Returns true when a location names a remote git-hosted source
pub fn is_url(location: &str) -> bool {
    URL_PATTERN.is_match(location)
}

/// Everything a fetcher needs besides the location itself
#[derive(Debug, Clone)]
pub struct FetchContext {
    /// Repository folder receiving `{id}/` subfolders
    pub target_dir: PathBuf,
    /// Scratch folder for downloads and staged sources
    pub temp_dir: PathBuf,
    /// Branch used when a git location does not name one
    pub default_branch: String,
    /// TexturePacker executable
    pub texture_packer: PathBuf,
    /// HTTP client for archive downloads
    pub client: reqwest::Client,
}

impl FetchContext {
    /// Builds the context for a run from the configuration
    pub fn new(config: &Config) -> Result<Self> {
        let target_dir = absolute(&config.datadir)?;
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.github_token {
            let value = HeaderValue::from_str(&format!("token {}", token))
                .map_err(|e| RepoError::Config(format!("Invalid GITHUB_TOKEN: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            temp_dir: target_dir.join(crate::config::TEMP_DIRNAME),
            target_dir,
            default_branch: config.default_branch.clone(),
            texture_packer: config.texture_packer.clone(),
            client,
        })
    }
}

/// A way of turning one add-on location into a packaged add-on
#[async_trait]
pub trait AddonFetcher: Send + Sync {
    /// Returns the name of the fetcher
    fn name(&self) -> &'static str;
    /// Determines if this fetcher can handle the given location
    fn accepts(&self, location: &str) -> bool;
    /// Materializes the archive and metadata files under the target folder
    async fn fetch(&self, location: &str, ctx: &FetchContext) -> Result<AddonMetadata>;
}

/// Factory picking the fetcher for a location
pub struct FetcherFactory;

impl FetcherFactory {
    /// Creates the appropriate fetcher for the given location
    ///
    /// URLs go to git, existing directories to the folder fetcher and existing
    /// files to the archive fetcher. Anything else is `PathNotFound`.
    pub fn create_fetcher(location: &str) -> Result<Box<dyn AddonFetcher>> {
        let git = GitFetcher;
        if git.accepts(location) {
            return Ok(Box::new(git));
        }
        let folder = FolderFetcher;
        if folder.accepts(location) {
            return Ok(Box::new(folder));
        }
        let archive = ArchiveFetcher;
        if archive.accepts(location) {
            return Ok(Box::new(archive));
        }
        Err(RepoError::PathNotFound(PathBuf::from(location)))
    }
}

/// Resolves and fetches a single add-on location
pub async fn fetch_addon(location: &str, ctx: &FetchContext) -> Result<AddonMetadata> {
    let location = crate::utils::normalize_location(location);
    let fetcher = FetcherFactory::create_fetcher(&location)?;
    log::info!("Processing {} ({})", location, fetcher.name());
    fetcher.fetch(&location, ctx).await
}

/// Makes a path absolute against the current directory without touching the filesystem
pub fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Runs blocking filesystem work off the async executor
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| RepoError::Worker(format!("Join error: {}", e)))?
}
