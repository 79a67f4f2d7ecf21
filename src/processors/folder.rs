use crate::error::Result;
use crate::metadata::{AddonMetadata, INFO_BASENAME};
use crate::processors::common::{
    copy_metadata_files, copy_tree, packaged_metadata, remove_dir_if_exists, write_folder_archive,
};
use crate::processors::{absolute, run_blocking, textures, AddonFetcher, FetchContext};
use async_trait::async_trait;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Fetcher for add-on source folders
pub struct FolderFetcher;

impl FolderFetcher {
    /// Packages the add-on in `source_dir` into the target folder.
    ///
    /// `source_is_scratch` marks sources that already live in the scratch
    /// folder and may be modified in place by texture packing.
    pub fn package(source_dir: &Path, ctx: &FetchContext, source_is_scratch: bool) -> Result<AddonMetadata> {
        let source_dir = absolute(source_dir)?;
        let metadata = AddonMetadata::from_file(&source_dir.join(INFO_BASENAME))?;

        if let Some(current) = packaged_metadata(&ctx.target_dir, &metadata) {
            return Ok(current);
        }

        let source_dir = if metadata.is_skin() && textures::has_media(&source_dir) {
            let work_dir = if source_is_scratch {
                source_dir
            } else {
                stage(&source_dir, &ctx.temp_dir.join(format!("{}-staged", metadata.id)))?
            };
            textures::pack_skin_textures(&work_dir, &ctx.texture_packer)?;
            work_dir
        } else {
            source_dir
        };

        let addon_dir = ctx.target_dir.join(&metadata.id);
        fs::create_dir_all(&addon_dir)?;

        let archive_path = addon_dir.join(metadata.archive_basename());
        let entries = write_folder_archive(&source_dir, &metadata.id, &archive_path)?;
        copy_metadata_files(&source_dir, &addon_dir, &metadata)?;

        info!(
            "Packaged {} {} ({} files) into {}",
            metadata.id,
            metadata.version,
            entries,
            archive_path.display()
        );
        Ok(metadata)
    }
}

fn stage(source_dir: &Path, staged_dir: &Path) -> Result<PathBuf> {
    remove_dir_if_exists(staged_dir)?;
    copy_tree(source_dir, staged_dir)?;
    Ok(staged_dir.to_path_buf())
}

#[async_trait]
impl AddonFetcher for FolderFetcher {
    fn name(&self) -> &'static str {
        "folder"
    }

    fn accepts(&self, location: &str) -> bool {
        Path::new(location).is_dir()
    }

    async fn fetch(&self, location: &str, ctx: &FetchContext) -> Result<AddonMetadata> {
        let source_dir = PathBuf::from(location);
        let ctx = ctx.clone();
        run_blocking(move || FolderFetcher::package(&source_dir, &ctx, false)).await
    }
}
