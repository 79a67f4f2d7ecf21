#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]

//! Kodi add-on repository builder
//!
//! Fetches add-ons from local folders, zip archives or git-hosted branch
//! archives, packages each one into `{id}/{id}-{version}.zip` with its
//! metadata files, and writes the `addons.xml` catalog with its MD5 checksum.
//!
//! ## Usage
//! ```rust,ignore
//! use kodi_repo_builder::{create_repository, Config};
//! use std::path::PathBuf;
//!
//! async fn example() -> kodi_repo_builder::Result<()> {
//!     let config = Config::new(PathBuf::from("repo"));
//!     let locations = vec![
//!         "./script.hello".to_string(),
//!         "https://github.com/me/skin.titan#beta#skin.titan.beta#Titan BETA".to_string(),
//!     ];
//!     let summary = create_repository(&locations, &config, None).await?;
//!     println!("{} add-ons, md5 {}", summary.addons.len(), summary.digest);
//!     Ok(())
//! }
//! ```

/// Configuration for a repository run
pub mod config;
/// Error handling types and utilities
pub mod error;
/// Static HTML listings and archive checksums
pub mod listing;
/// Logging configuration and utilities
pub mod logging;
pub mod manifest;
/// `addon.xml` metadata and derived file names
pub mod metadata;
/// Concurrent fetch coordination
pub mod parallel;
/// Add-on fetchers for git, folder and archive locations
pub mod processors;
/// End-to-end repository run
pub mod repository;
/// Location normalization and list files
pub mod utils;
pub mod xml;

pub use config::Config;
pub use error::{RepoError, Result};
pub use manifest::Manifest;
pub use metadata::AddonMetadata;
pub use processors::{AddonFetcher, FetchContext, FetcherFactory};
pub use repository::{create_repository, RepositorySummary};
