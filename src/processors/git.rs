use crate::error::{RepoError, Result};
use crate::metadata::{AddonMetadata, INFO_BASENAME};
use crate::processors::common::{archive_root, download_bytes, extract_archive, remove_dir_if_exists};
use crate::processors::{is_url, run_blocking, AddonFetcher, FetchContext, FolderFetcher};
use async_trait::async_trait;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fs;
use std::path::Path;
use url::Url;
use zip::ZipArchive;

static NAME_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(\s)name\s*=\s*"[^"]*""#).unwrap());

/// A git-hosted add-on location, `repo_url[#branch[#alt_id[#alt_name]]]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitSource {
    /// Repository URL without trailing slash
    pub url: String,
    /// Branch whose archive is downloaded
    pub branch: String,
    /// Replacement add-on id for re-branded variants
    pub alt_id: Option<String>,
    /// Replacement display name for re-branded variants
    pub alt_name: Option<String>,
    /// Last path segment of the URL
    pub repo_name: String,
}

impl GitSource {
    /// Parses a git location, using `default_branch` when none is given
    pub fn parse(location: &str, default_branch: &str) -> Result<Self> {
        let mut parts = location.split('#');
        let url = parts.next().unwrap_or_default().trim_end_matches('/').to_string();
        let branch = non_empty(parts.next()).unwrap_or_else(|| default_branch.to_string());
        let alt_id = non_empty(parts.next());
        let alt_name = non_empty(parts.next());

        let parsed = Url::parse(&url)?;
        let repo_name = parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(str::to_string)
            .ok_or_else(|| RepoError::Download(format!("No repository name in {}", url)))?;

        Ok(Self {
            url,
            branch,
            alt_id,
            alt_name,
            repo_name,
        })
    }

    /// URL of the branch archive
    pub fn archive_url(&self) -> String {
        format!("{}/archive/{}.zip", self.url, self.branch)
    }

    /// Scratch name shared by the downloaded zip and its expansion folder
    pub fn scratch_name(&self) -> String {
        format!("{}{}", self.repo_name, self.alt_id.as_deref().unwrap_or_default())
    }

    /// Id and name overrides, only when both are present
    pub fn rebrand(&self) -> Option<(&str, &str)> {
        match (&self.alt_id, &self.alt_name) {
            (Some(id), Some(name)) => Some((id.as_str(), name.as_str())),
            _ => None,
        }
    }
}

fn non_empty(part: Option<&str>) -> Option<String> {
    part.map(str::trim).filter(|p| !p.is_empty()).map(str::to_string)
}

/// Rewrites an `addon.xml` for an alternate-branded variant.
///
/// Every occurrence of `original_id` becomes `alt_id` and the first `name`
/// attribute gets `alt_name`.
pub fn rebrand_addon_xml(content: &str, original_id: &str, alt_id: &str, alt_name: &str) -> String {
    let replaced = content.replace(original_id, alt_id);
    let escaped = quick_xml::escape::escape(alt_name);
    NAME_ATTR
        .replacen(&replaced, 1, |caps: &Captures| format!("{}name=\"{}\"", &caps[1], escaped))
        .into_owned()
}

/// Fetcher for git-hosted sources, via the host's branch archive download
pub struct GitFetcher;

impl GitFetcher {
    fn expand(source: &GitSource, bytes: &[u8], ctx: &FetchContext) -> Result<AddonMetadata> {
        let scratch_name = source.scratch_name();
        fs::create_dir_all(&ctx.temp_dir)?;
        fs::write(ctx.temp_dir.join(format!("{}.zip", scratch_name)), bytes)?;

        let root = {
            let archive = ZipArchive::new(std::io::Cursor::new(bytes))?;
            archive_root(archive.file_names())?
        };

        let expand_dir = ctx.temp_dir.join(&scratch_name);
        remove_dir_if_exists(&expand_dir)?;
        extract_archive(bytes, &expand_dir)?;
        let addon_dir = expand_dir.join(&root);
        debug!("Expanded {} into {}", source.archive_url(), addon_dir.display());

        if let Some((alt_id, alt_name)) = source.rebrand() {
            rewrite_addon_xml(&addon_dir, &source.repo_name, alt_id, alt_name)?;
        }

        FolderFetcher::package(&addon_dir, ctx, true)
    }
}

fn rewrite_addon_xml(addon_dir: &Path, original_id: &str, alt_id: &str, alt_name: &str) -> Result<()> {
    let info_path = addon_dir.join(INFO_BASENAME);
    let content = fs::read_to_string(&info_path).map_err(|e| {
        RepoError::InvalidMetadata(format!("Cannot read {}: {}", info_path.display(), e))
    })?;
    fs::write(&info_path, rebrand_addon_xml(&content, original_id, alt_id, alt_name))?;
    info!("Rebranded {} as {} ({})", original_id, alt_id, alt_name);
    Ok(())
}

#[async_trait]
impl AddonFetcher for GitFetcher {
    fn name(&self) -> &'static str {
        "git"
    }

    fn accepts(&self, location: &str) -> bool {
        is_url(location)
    }

    async fn fetch(&self, location: &str, ctx: &FetchContext) -> Result<AddonMetadata> {
        let source = GitSource::parse(location, &ctx.default_branch)?;
        let url = source.archive_url();
        info!("Downloading {}", url);
        let bytes = download_bytes(&ctx.client, &url).await?;

        let ctx = ctx.clone();
        run_blocking(move || GitFetcher::expand(&source, &bytes, &ctx)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_plain_url() -> Result<()> {
        let source = GitSource::parse("https://github.com/me/skin.titan/", "master")?;
        assert_eq!(source.url, "https://github.com/me/skin.titan");
        assert_eq!(source.branch, "master");
        assert_eq!(source.repo_name, "skin.titan");
        assert_eq!(source.alt_id, None);
        assert_eq!(source.archive_url(), "https://github.com/me/skin.titan/archive/master.zip");
        assert_eq!(source.scratch_name(), "skin.titan");
        assert!(source.rebrand().is_none());
        Ok(())
    }

    #[test]
    fn test_parse_full_location() -> Result<()> {
        let source = GitSource::parse(
            "https://github.com/me/skin.titan#beta#skin.titan.beta#Titan BETA",
            "master",
        )?;
        assert_eq!(source.branch, "beta");
        assert_eq!(source.alt_id.as_deref(), Some("skin.titan.beta"));
        assert_eq!(source.alt_name.as_deref(), Some("Titan BETA"));
        assert_eq!(source.scratch_name(), "skin.titanskin.titan.beta");
        assert_eq!(source.rebrand(), Some(("skin.titan.beta", "Titan BETA")));
        Ok(())
    }

    #[test]
    fn test_parse_uses_default_branch() -> Result<()> {
        let source = GitSource::parse("https://example.org/me/script.x#", "main")?;
        assert_eq!(source.branch, "main");
        Ok(())
    }

    #[test]
    fn test_parse_rejects_bad_urls() {
        assert!(GitSource::parse("https://", "master").is_err());
        assert!(GitSource::parse("https://github.com", "master").is_err());
    }

    #[test]
    fn test_rebrand_addon_xml() {
        let content = r#"<addon id="skin.titan" version="1.0.0" name="Titan" provider-name="me">
    <extension point="xbmc.gui.skin" id="skin.titan"/>
</addon>"#;
        let rebranded = rebrand_addon_xml(content, "skin.titan", "skin.titan.beta", "Titan <beta>");
        assert_eq!(
            rebranded,
            r#"<addon id="skin.titan.beta" version="1.0.0" name="Titan &lt;beta&gt;" provider-name="me">
    <extension point="xbmc.gui.skin" id="skin.titan.beta"/>
</addon>"#
        );
    }

    #[test]
    fn test_rebrand_skips_provider_name() {
        let content = r#"<addon provider-name="me" id="skin.a" version="1.0.0" name="A"/>"#;
        let rebranded = rebrand_addon_xml(content, "skin.a", "skin.b", "B");
        assert_eq!(rebranded, r#"<addon provider-name="me" id="skin.b" version="1.0.0" name="B"/>"#);
    }
}
