//! Command implementations for orestore-cmd

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use orestore::repository::{ChildOrder, Repository, RepositoryConfig};

pub mod cache;
pub mod index;
pub mod query;

/// Options locating the archive and the artifact cache.
#[derive(Args, Debug, Clone, Default)]
pub struct RepositoryArgs {
    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Root of the extracted ORE maps (overrides the configuration)
    #[arg(long)]
    pub data_path: Option<PathBuf>,

    /// Root of the artifact cache (overrides the configuration)
    #[arg(long)]
    pub cache_path: Option<PathBuf>,

    /// Resolve children in document order instead of listed order
    #[arg(long)]
    pub document_order: bool,
}

impl RepositoryArgs {
    pub fn to_config(&self) -> Result<RepositoryConfig> {
        let mut config = match &self.config {
            Some(path) => RepositoryConfig::load(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?,
            None => RepositoryConfig::default(),
        };
        if let Some(data_path) = &self.data_path {
            config.data_path = data_path.clone();
        }
        if let Some(cache_path) = &self.cache_path {
            config.cache_path = Some(cache_path.clone());
        }
        if self.document_order {
            config.child_order = ChildOrder::Document;
        }
        Ok(config)
    }

    pub fn open(&self) -> Result<Repository> {
        let config = self.to_config()?;
        log::debug!("opening repository {config:?}");
        Repository::open(config).context("Failed to open repository")
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("orestore.json");
        std::fs::write(&path, r#"{"data_path": "/a", "cache_path": "/b"}"#).unwrap();

        let args = RepositoryArgs {
            config: Some(path),
            cache_path: Some("/c".into()),
            document_order: true,
            ..Default::default()
        };
        let config = args.to_config().unwrap();
        assert_eq!(config.data_path, Path::new("/a"));
        assert_eq!(config.cache_root(), Path::new("/c"));
        assert_eq!(config.child_order, ChildOrder::Document);
    }
}
