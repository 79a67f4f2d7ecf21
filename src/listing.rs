//! Static directory listings for serving a repository from plain web hosting.
//!
//! Each add-on folder gets an `index.html` linking its archives plus a
//! `{archive}.md5` sidecar per archive; the repository root gets an
//! `index.html` linking every add-on folder.

use crate::config::TEMP_DIRNAME;
use crate::error::Result;
use log::{debug, info};
use std::fs::{self, File};
use std::io;
use std::path::Path;

const SKIPPED_DIRS: &[&str] = &[".git", "externals", TEMP_DIRNAME];

/// What a listing pass wrote
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ListingSummary {
    /// Add-on folders that received an index
    pub folders: Vec<String>,
    /// Number of archive checksum files written
    pub checksums: usize,
}

/// Writes listings and archive checksums for every add-on folder in `repo_dir`
pub fn write_listings(repo_dir: &Path) -> Result<ListingSummary> {
    let mut summary = ListingSummary::default();

    let mut folders: Vec<String> = fs::read_dir(repo_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| !SKIPPED_DIRS.contains(&name.as_str()))
        .collect();
    folders.sort();

    for folder in &folders {
        summary.checksums += write_folder_listing(&repo_dir.join(folder), folder)?;
    }

    let mut html = String::from("<html>\n<body>\n<h1>Directory listing</h1>\n<hr/>\n<pre>");
    for folder in &folders {
        html.push_str(&format!("<a href=\"./{0}/index.html\">{0}</a>\n", folder));
    }
    html.push_str("</pre>\n</body>\n</html>");
    fs::write(repo_dir.join("index.html"), html)?;

    info!("Wrote listings for {} add-on folders", folders.len());
    summary.folders = folders;
    Ok(summary)
}

fn write_folder_listing(folder_dir: &Path, folder: &str) -> Result<usize> {
    let mut archives: Vec<String> = fs::read_dir(folder_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(".zip"))
        .collect();
    archives.sort();

    let mut html = format!(
        "<html>\n<body>\n<h1>Directory listing for {}</h1>\n<hr/>\n<pre>",
        folder
    );
    html.push_str("<a href=\"../index.html\">..</a>\n");

    for archive in &archives {
        let digest = file_md5(&folder_dir.join(archive))?;
        let md5_name = format!("{}.md5", archive);
        fs::write(folder_dir.join(&md5_name), &digest)?;
        debug!("{}/{}: {}", folder, archive, digest);

        html.push_str(&format!("<a href=\"{0}\">{0}</a>\n", archive));
        html.push_str(&format!("<a href=\"{0}\">{0}</a>\n", md5_name));
    }
    html.push_str("</pre>\n</body>\n</html>");
    fs::write(folder_dir.join("index.html"), html)?;

    Ok(archives.len())
}

/// Streams a file through MD5, returning the lowercase hex digest
pub fn file_md5(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut context = md5::Context::new();
    io::copy(&mut file, &mut context)?;
    Ok(format!("{:x}", context.compute()))
}
