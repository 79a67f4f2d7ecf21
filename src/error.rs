use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Custom result type alias for the application
pub type Result<T> = std::result::Result<T, RepoError>;

/// Errors that can occur while building an add-on repository
#[derive(Debug, Error)]
pub enum RepoError {
    /// I/O errors
    #[error("IO error: {0}")]
    IO(#[from] io::Error),

    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// ZIP file processing errors
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Directory traversal errors
    #[error("Walkdir error: {0}")]
    Walkdir(#[from] walkdir::Error),

    /// XML reading/writing errors
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// URL parsing errors
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Source archive download errors
    #[error("Download error: {0}")]
    Download(String),

    /// Malformed or missing `addon.xml`, bad id or version
    #[error("Invalid add-on metadata: {0}")]
    InvalidMetadata(String),

    /// Add-on location that is neither a URL nor an existing path
    #[error("Path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    /// Zip archive without exactly one top-level directory
    #[error("Archive layout error: {0}")]
    ArchiveLayout(String),

    /// External texture packer could not run or failed
    #[error("TexturePacker error: {0}")]
    TexturePacker(String),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// A worker task ended without reporting a result
    #[error("Worker error: {0}")]
    Worker(String),

    /// Failure of one add-on, tagged with the location it came from
    #[error("Add-on '{location}' failed: {source}")]
    Addon {
        /// Location string as given on input
        location: String,
        /// Underlying failure
        #[source]
        source: Box<RepoError>,
    },
}

impl RepoError {
    /// Wraps an error with the add-on location that produced it
    pub fn for_addon(location: &str, source: RepoError) -> Self {
        Self::Addon {
            location: location.to_string(),
            source: Box::new(source),
        }
    }

    /// Returns the innermost error, skipping any `Addon` tags
    pub fn root_cause(&self) -> &RepoError {
        match self {
            Self::Addon { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
