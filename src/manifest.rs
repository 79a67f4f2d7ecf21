//! Repository catalog (`addons.xml`) and its MD5 checksum file.

use crate::error::Result;
use crate::metadata::AddonMetadata;
use crate::xml::{Element, Node};
use flate2::write::GzEncoder;
use flate2::Compression;
use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};

/// The aggregated `<addons>` document
#[derive(Debug, Clone)]
pub struct Manifest {
    root: Element,
}

impl Manifest {
    /// Collects the metadata roots of `addons`, keeping their order
    pub fn from_addons(addons: &[AddonMetadata]) -> Self {
        let mut root = Element::new("addons");
        for addon in addons {
            root.children.push(Node::Text("\n".to_string()));
            root.push(addon.root.clone());
        }
        if !addons.is_empty() {
            root.children.push(Node::Text("\n".to_string()));
        }
        Self { root }
    }

    /// Number of add-ons in the catalog
    pub fn len(&self) -> usize {
        self.root.child_elements().count()
    }

    /// True when the catalog lists no add-on
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialized UTF-8 document, the bytes the checksum is computed over
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.root.to_document()
    }
}

/// Lowercase hex MD5 digest
pub fn md5_hex(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}

/// Gzip-compresses a buffer
pub fn gzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

/// Writes the manifest (optionally gzipped) and its checksum file
///
/// The checksum covers the uncompressed document and is written without a
/// trailing newline. Returns the digest.
pub async fn write_manifest(
    manifest: &Manifest,
    manifest_path: &Path,
    checksum_path: &Path,
    compressed: bool,
) -> Result<String> {
    let contents = manifest.to_bytes()?;
    let digest = md5_hex(&contents);

    for path in [manifest_path, checksum_path] {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    if compressed {
        replace_file(manifest_path, &gzip(&contents)?).await?;
    } else {
        replace_file(manifest_path, &contents).await?;
    }
    replace_file(checksum_path, digest.as_bytes()).await?;

    info!(
        "Wrote {} ({} add-ons) and {}",
        manifest_path.display(),
        manifest.len(),
        checksum_path.display()
    );
    Ok(digest)
}

async fn replace_file(path: &Path, contents: &[u8]) -> Result<()> {
    let part_path = PathBuf::from(format!("{}.part", path.display()));
    tokio::fs::write(&part_path, contents).await?;
    tokio::fs::rename(&part_path, path).await?;
    Ok(())
}
