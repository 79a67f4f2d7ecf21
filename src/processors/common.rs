use crate::error::{RepoError, Result};
use crate::metadata::{AddonMetadata, INFO_BASENAME};
use log::{debug, info, warn};
use reqwest::Client;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Returns the already packaged metadata when `{target}/{id}` holds the same version
///
/// Both the packaged `addon.xml` and its archive must be present. An unreadable
/// packaged descriptor is treated as absent so the add-on gets rebuilt.
pub fn packaged_metadata(target_dir: &Path, metadata: &AddonMetadata) -> Option<AddonMetadata> {
    let addon_dir = target_dir.join(&metadata.id);
    let current_path = addon_dir.join(INFO_BASENAME);
    if !current_path.is_file() {
        return None;
    }

    let current = match AddonMetadata::from_file(&current_path) {
        Ok(current) => current,
        Err(e) => {
            warn!("Ignoring packaged {}: {}", current_path.display(), e);
            return None;
        }
    };

    if current.version != metadata.version {
        return None;
    }
    if !addon_dir.join(current.archive_basename()).is_file() {
        debug!("Archive for {} {} is missing, rebuilding", current.id, current.version);
        return None;
    }

    info!(
        "Addon {} already has version {} on the repo, skipping...",
        current.id, current.version
    );
    Some(current)
}

/// Copies the metadata files present in `source_dir` beside the archive
pub fn copy_metadata_files(source_dir: &Path, addon_dir: &Path, metadata: &AddonMetadata) -> Result<()> {
    for (source_name, target_name) in metadata.metadata_basenames() {
        let source_path = source_dir.join(&source_name);
        if source_path.is_file() {
            fs::copy(&source_path, addon_dir.join(&target_name))?;
        }
    }
    Ok(())
}

/// Compresses every file under `source_dir` into `archive_path`, entries prefixed by `prefix/`
///
/// The archive is written next to its final name with a `.part` suffix and
/// renamed once complete.
pub fn write_folder_archive(source_dir: &Path, prefix: &str, archive_path: &Path) -> Result<usize> {
    let part_path = PathBuf::from(format!("{}.part", archive_path.display()));
    let result = write_archive_entries(source_dir, prefix, &part_path);
    match result {
        Ok(count) => {
            fs::rename(&part_path, archive_path)?;
            debug!("Wrote {} entries to {}", count, archive_path.display());
            Ok(count)
        }
        Err(e) => {
            let _ = fs::remove_file(&part_path);
            Err(e)
        }
    }
}

fn write_archive_entries(source_dir: &Path, prefix: &str, part_path: &Path) -> Result<usize> {
    let mut zip = ZipWriter::new(File::create(part_path)?);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut count = 0;

    for entry in WalkDir::new(source_dir).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|e| RepoError::IO(io::Error::new(io::ErrorKind::Other, e)))?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .fold(prefix.to_string(), |acc, part| format!("{}/{}", acc, part));

        zip.start_file(name, options)?;
        let mut file = File::open(entry.path())?;
        io::copy(&mut file, &mut zip)?;
        count += 1;
    }

    zip.finish()?;
    Ok(count)
}

/// Finds the single top-level directory shared by all archive entries
pub fn archive_root<'a, I>(names: I) -> Result<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut roots = BTreeSet::new();
    let mut bare_file = false;
    for name in names {
        let mut parts = name.splitn(2, '/');
        let root = parts.next().unwrap_or_default();
        if parts.next().is_none() {
            bare_file = true;
        }
        roots.insert(root.to_string());
    }

    if roots.len() != 1 {
        return Err(RepoError::ArchiveLayout(format!(
            "Archive should contain one directory, found {} top-level entries",
            roots.len()
        )));
    }
    let root = roots.into_iter().next().unwrap_or_default();
    if root.is_empty() || bare_file {
        return Err(RepoError::ArchiveLayout(
            "Archive should contain a directory".into(),
        ));
    }
    Ok(root)
}

/// Reads an archive entry into a string, `None` when the entry does not exist
pub fn read_archive_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<Vec<u8>>> {
    match archive.by_name(name) {
        Ok(mut entry) => {
            let mut buf = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut buf)?;
            Ok(Some(buf))
        }
        Err(zip::result::ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Extracts an archive to the specified directory, skipping unsafe entry names
pub fn extract_archive(archive_bytes: &[u8], extract_path: &Path) -> Result<()> {
    fs::create_dir_all(extract_path)?;
    let mut archive = ZipArchive::new(Cursor::new(archive_bytes))?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let outpath = match file.enclosed_name() {
            Some(path) => extract_path.join(path),
            None => {
                warn!("Skipping archive entry with unsafe path: {}", file.name());
                continue;
            }
        };

        if file.name().ends_with('/') {
            fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = File::create(&outpath)?;
            io::copy(&mut file, &mut outfile)?;
        }
    }

    Ok(())
}

/// Copies a directory tree, used to stage sources before they are modified
pub fn copy_tree(source_dir: &Path, dest_dir: &Path) -> Result<()> {
    for entry in WalkDir::new(source_dir).follow_links(true) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|e| RepoError::IO(io::Error::new(io::ErrorKind::Other, e)))?;
        let dest = dest_dir.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)?;
        } else {
            fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}

/// Removes a directory tree if it exists
pub fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Downloads a URL into memory; any non-success status is a download error
pub async fn download_bytes(client: &Client, url: &str) -> Result<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| RepoError::Download(format!("{}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(RepoError::Download(format!(
            "Failed to download {}: HTTP {}",
            url,
            response.status()
        )));
    }

    response
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|e| RepoError::Download(format!("{}: {}", url, e)))
}
