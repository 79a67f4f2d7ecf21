use crate::error::{RepoError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the scratch folder created inside the target folder
pub const TEMP_DIRNAME: &str = "temp";

/// Main configuration struct for a repository run
///
/// Values come from a TOML file when one is found and are then overridden by
/// command line flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Repository folder receiving the add-on folders and the manifest
    pub datadir: PathBuf,
    /// Explicit manifest path; defaults to `addons.xml[.gz]` in `datadir`
    pub info: Option<PathBuf>,
    /// Explicit checksum path; defaults to `addons.xml.md5` in `datadir`
    pub checksum: Option<PathBuf>,
    /// Gzip the manifest
    pub compressed: bool,
    /// Sidecar file with extra add-on locations
    pub addons_list: PathBuf,
    /// Branch used for git locations that do not name one
    pub default_branch: String,
    /// TexturePacker executable used for skins
    pub texture_packer: PathBuf,
    /// Write static `index.html` listings and archive checksums
    pub html_index: bool,
    /// User agent sent with archive downloads
    pub user_agent: String,
    /// Token sent with archive downloads, read from `GITHUB_TOKEN`
    #[serde(skip)]
    pub github_token: Option<String>,
}

impl Config {
    /// Creates a new configuration targeting the specified folder
    pub fn new(datadir: PathBuf) -> Self {
        Self {
            datadir,
            info: None,
            checksum: None,
            compressed: false,
            addons_list: PathBuf::from("addonslist.txt"),
            default_branch: "master".to_string(),
            texture_packer: default_texture_packer(),
            html_index: false,
            user_agent: format!("kodi-repo-builder/{}", env!("CARGO_PKG_VERSION")),
            github_token: std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.trim().is_empty()),
        }
    }

    /// Loads configuration from `path`, or from the default config file location
    ///
    /// An explicit path must exist. Without one, the file
    /// `<config dir>/kodi-repo-builder/config.toml` is used when present and
    /// the defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => match dirs::config_dir() {
                Some(dir) => dir.join("kodi-repo-builder").join("config.toml"),
                None => return Ok(Self::default()),
            },
        };

        if !config_path.exists() {
            if path.is_some() {
                return Err(RepoError::Config(format!(
                    "Config file not found: {}",
                    config_path.display()
                )));
            }
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| RepoError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses a TOML document; missing keys keep their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content)
            .map_err(|e| RepoError::Config(format!("Failed to parse config file: {}", e)))?;
        config.github_token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.trim().is_empty());
        Ok(config)
    }

    /// Path of the `addons.xml` manifest
    pub fn manifest_path(&self) -> PathBuf {
        match &self.info {
            Some(path) => path.clone(),
            None if self.compressed => self.datadir.join("addons.xml.gz"),
            None => self.datadir.join("addons.xml"),
        }
    }

    /// Path of the manifest checksum file
    pub fn checksum_path(&self) -> PathBuf {
        self.checksum
            .clone()
            .unwrap_or_else(|| self.datadir.join("addons.xml.md5"))
    }

    /// Ensures the target folder exists
    pub async fn ensure_directories_exist(&self) -> Result<()> {
        if !tokio::fs::try_exists(&self.datadir).await? {
            tokio::fs::create_dir_all(&self.datadir).await?;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(PathBuf::from("."))
    }
}

/// Bundled TexturePacker location for the current platform
pub fn default_texture_packer() -> PathBuf {
    let base = Path::new("externals").join("texturepacker");
    if cfg!(target_os = "windows") {
        base.join("windows").join("TexturePacker.exe")
    } else if cfg!(target_os = "macos") {
        base.join("macos").join("TexturePacker")
    } else {
        base.join("linux").join("TexturePacker")
    }
}
