use crate::error::{RepoError, Result};
use crate::xml::Element;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// File name of the add-on descriptor
pub const INFO_BASENAME: &str = "addon.xml";

/// Metadata files copied next to each archive under their own name
pub const METADATA_BASENAMES: &[&str] = &[INFO_BASENAME, "icon.png", "fanart.jpg"];

/// Changelog file name inside an add-on source
pub const CHANGELOG_BASENAME: &str = "changelog.txt";

static INVALID_ID_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9._-]").unwrap());
static VERSION_FORMAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+$").unwrap());

/// Identity and descriptor of one add-on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonMetadata {
    /// Add-on id, e.g. `skin.titan`
    pub id: String,
    /// Dotted three-part version
    pub version: String,
    /// Parsed `<addon>` element
    pub root: Element,
}

impl AddonMetadata {
    /// Parses and validates the contents of an `addon.xml`
    pub fn parse(source: &str) -> Result<Self> {
        let root = Element::parse(source).map_err(|e| match e {
            RepoError::InvalidMetadata(_) => e,
            other => RepoError::InvalidMetadata(format!("Malformed addon.xml: {}", other)),
        })?;
        if root.name != "addon" {
            return Err(RepoError::InvalidMetadata(format!(
                "Root element is <{}>, expected <addon>",
                root.name
            )));
        }

        let id = root.attr("id");
        match id.as_deref() {
            Some(id) if !id.is_empty() && !INVALID_ID_CHARS.is_match(id) => {}
            other => {
                return Err(RepoError::InvalidMetadata(format!(
                    "Invalid addon ID: {}",
                    other.unwrap_or("None")
                )))
            }
        }

        let version = root.attr("version");
        match version.as_deref() {
            Some(version) if VERSION_FORMAT.is_match(version) => {}
            other => {
                return Err(RepoError::InvalidMetadata(format!(
                    "Invalid addon version: {}",
                    other.unwrap_or("None")
                )))
            }
        }

        Ok(Self {
            id: id.unwrap_or_default(),
            version: version.unwrap_or_default(),
            root,
        })
    }

    /// Reads and parses an `addon.xml` from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            RepoError::InvalidMetadata(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&source)
    }

    /// Display name from the `name` attribute
    pub fn name(&self) -> Option<String> {
        self.root.attr("name")
    }

    /// Skins get their textures packed before archiving
    pub fn is_skin(&self) -> bool {
        self.id.starts_with("skin.")
    }

    /// File name of the versioned archive, `{id}-{version}.zip`
    pub fn archive_basename(&self) -> String {
        format!("{}-{}.zip", self.id, self.version)
    }

    /// `(source, target)` file name pairs of metadata copied beside the archive
    pub fn metadata_basenames(&self) -> Vec<(String, String)> {
        let mut names: Vec<(String, String)> = METADATA_BASENAMES
            .iter()
            .map(|name| (name.to_string(), name.to_string()))
            .collect();
        names.push((
            CHANGELOG_BASENAME.to_string(),
            format!("changelog-{}.txt", self.version),
        ));
        names
    }
}
