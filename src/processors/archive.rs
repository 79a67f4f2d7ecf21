use crate::error::{RepoError, Result};
use crate::metadata::{AddonMetadata, INFO_BASENAME};
use crate::processors::common::{archive_root, packaged_metadata, read_archive_entry};
use crate::processors::{absolute, run_blocking, AddonFetcher, FetchContext};
use async_trait::async_trait;
use log::{debug, info};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Fetcher for pre-built add-on zip archives
pub struct ArchiveFetcher;

impl ArchiveFetcher {
    /// Validates a pre-built archive and places it under its canonical name
    pub fn package(archive_path: &Path, ctx: &FetchContext) -> Result<AddonMetadata> {
        let archive_path = absolute(archive_path)?;
        let mut archive = ZipArchive::new(File::open(&archive_path)?)?;
        let root = archive_root(archive.file_names())?;

        let info_name = format!("{}/{}", root, INFO_BASENAME);
        let info = read_archive_entry(&mut archive, &info_name)?.ok_or_else(|| {
            RepoError::InvalidMetadata(format!(
                "{} has no {}",
                archive_path.display(),
                info_name
            ))
        })?;
        let info = String::from_utf8(info)
            .map_err(|e| RepoError::InvalidMetadata(format!("{} is not UTF-8: {}", info_name, e)))?;
        let metadata = AddonMetadata::parse(&info)?;

        if let Some(current) = packaged_metadata(&ctx.target_dir, &metadata) {
            return Ok(current);
        }

        let addon_dir = ctx.target_dir.join(&metadata.id);
        fs::create_dir_all(&addon_dir)?;
        for (source_name, target_name) in metadata.metadata_basenames() {
            if let Some(bytes) = read_archive_entry(&mut archive, &format!("{}/{}", root, source_name))? {
                fs::write(addon_dir.join(&target_name), bytes)?;
            }
        }
        drop(archive);

        let target_path = addon_dir.join(metadata.archive_basename());
        if is_same_file(&archive_path, &target_path) {
            debug!("{} is already in place", target_path.display());
        } else {
            fs::copy(&archive_path, &target_path)?;
        }

        info!("Imported {} {} from {}", metadata.id, metadata.version, archive_path.display());
        Ok(metadata)
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[async_trait]
impl AddonFetcher for ArchiveFetcher {
    fn name(&self) -> &'static str {
        "archive"
    }

    fn accepts(&self, location: &str) -> bool {
        Path::new(location).is_file()
    }

    async fn fetch(&self, location: &str, ctx: &FetchContext) -> Result<AddonMetadata> {
        let archive_path = PathBuf::from(location);
        let ctx = ctx.clone();
        run_blocking(move || ArchiveFetcher::package(&archive_path, &ctx)).await
    }
}
