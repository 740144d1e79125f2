use std::path::{Path, PathBuf};

use orestore_common::{Error, Result, verify_arg};
use orestore_index::IndexBuilderParams;
use serde::{Deserialize, Serialize};

/// Cursor buffer size used when the configuration does not set one.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1_000_000;

/// Order in which the children listed in `Has Part` are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildOrder {
    /// Resolve in listed order. A child located before one resolved earlier
    /// cannot be reached by the forward cursor and is dropped with a warning.
    #[default]
    Listed,
    /// Resolve each container's listed children in document order. A child
    /// stored before its container is still unreachable once the container
    /// has been read.
    Document,
}

/// Settings of a [`Repository`](crate::Repository).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Root of the extracted ORE maps.
    pub data_path: PathBuf,
    /// Root of the derived artifacts; `data_path` when unset.
    pub cache_path: Option<PathBuf>,
    /// Member fields holding the index key, in order of preference.
    pub identifier_fields: Vec<String>,
    pub child_order: ChildOrder,
    /// Upper bound of the buffer placed in front of the ORE map stream. The
    /// actual buffer never exceeds the document size.
    pub read_buffer_size: usize,
}

impl Default for RepositoryConfig {
    fn default() -> RepositoryConfig {
        RepositoryConfig {
            data_path: PathBuf::from("data"),
            cache_path: None,
            identifier_fields: IndexBuilderParams::default().identifier_fields,
            child_order: ChildOrder::default(),
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

impl RepositoryConfig {
    /// Reads a JSON configuration file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<RepositoryConfig> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("read {}", path.display()), e))?;
        let config: RepositoryConfig = serde_json::from_str(&text)
            .map_err(|e| Error::json(format!("parse {}", path.display()), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        verify_arg!(identifier_fields, !self.identifier_fields.is_empty());
        verify_arg!(read_buffer_size, self.read_buffer_size > 0);
        Ok(())
    }

    pub fn cache_root(&self) -> &Path {
        self.cache_path.as_deref().unwrap_or(&self.data_path)
    }

    pub fn index_builder_params(&self) -> IndexBuilderParams {
        IndexBuilderParams {
            identifier_fields: self.identifier_fields.clone(),
        }
    }

    /// Buffer capacity for a document of `document_size` bytes.
    pub fn buffer_capacity(&self, document_size: u64) -> usize {
        usize::try_from(document_size)
            .unwrap_or(usize::MAX)
            .min(self.read_buffer_size)
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use orestore_common::ErrorKind;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = RepositoryConfig::default();
        assert_eq!(config.cache_root(), Path::new("data"));
        assert_eq!(config.identifier_fields, vec!["@id", "Identifier"]);
        assert_eq!(config.child_order, ChildOrder::Listed);
        assert_eq!(config.buffer_capacity(10), 10);
        assert_eq!(config.buffer_capacity(0), 1);
        assert_eq!(config.buffer_capacity(5_000_000), DEFAULT_READ_BUFFER_SIZE);
    }

    #[test]
    fn test_load_partial() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("orestore.json");
        std::fs::write(
            &path,
            r#"{"data_path": "/srv/data", "cache_path": "/srv/cache", "child_order": "document"}"#,
        )
        .unwrap();
        let config = RepositoryConfig::load(&path).unwrap();
        assert_eq!(config.cache_root(), Path::new("/srv/cache"));
        assert_eq!(config.child_order, ChildOrder::Document);
        assert_eq!(config.read_buffer_size, DEFAULT_READ_BUFFER_SIZE);
    }

    #[test]
    fn test_load_invalid() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("orestore.json");
        std::fs::write(&path, r#"{"identifier_fields": []}"#).unwrap();
        let err = RepositoryConfig::load(&path).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));

        std::fs::write(&path, r#"{"child_order": "random"}"#).unwrap();
        let err = RepositoryConfig::load(&path).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Json { .. }));
    }
}
