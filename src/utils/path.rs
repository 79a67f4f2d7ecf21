use crate::error::Result;
use log::debug;
use std::path::{Path, PathBuf};

/// Normalize one user-provided add-on location.
///
/// - Trims leading/trailing whitespace
/// - Strips surrounding single or double quotes if present
/// - Expands a leading `~` to the HOME directory for local paths
pub fn normalize_location(input: &str) -> String {
    let trimmed = input.trim();

    let unquoted = if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };

    if let Some(rest) = unquoted.strip_prefix('~') {
        if rest.is_empty() || rest.starts_with('/') {
            if let Some(home) = std::env::var_os("HOME") {
                let mut buf = PathBuf::from(home);
                let rest = rest.trim_start_matches('/');
                if !rest.is_empty() {
                    buf.push(rest);
                }
                return buf.to_string_lossy().to_string();
            }
        }
    }

    unquoted.to_string()
}

/// Reads extra add-on locations from a sidecar list file.
///
/// One location per line; blank lines and lines starting with `#` are
/// skipped. A missing file yields no locations.
pub fn read_locations_file(path: &Path) -> Result<Vec<String>> {
    if !path.is_file() {
        debug!("No add-on list at {}", path.display());
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)?;
    let locations: Vec<String> = content
        .lines()
        .filter(|line| !line.starts_with('#'))
        .map(normalize_location)
        .filter(|line| !line.is_empty())
        .collect();

    debug!("Read {} add-on locations from {}", locations.len(), path.display());
    Ok(locations)
}
