//! Deterministic on-disk placement of per-collection files.
//!
//! Files of one collection live in a two-level directory derived from a hash of
//! the collection identifier, e.g. `<root>/3f/a0/<bag>.index.json`, which keeps
//! directory sizes bounded for repositories with many publications.

use std::path::PathBuf;

use xxhash_rust::xxh3::xxh3_128;

/// Suffix of the extracted ORE map file.
pub const ORE_MAP_SUFFIX: &str = ".oremap.jsonld.txt";
/// Suffix of the description artifact.
pub const DESCRIPTION_SUFFIX: &str = ".desc.json";
/// Suffix of the index artifact.
pub const INDEX_SUFFIX: &str = ".index.json";

/// Returns the 128-bit xxh3 digest of the collection identifier as 32 hex digits.
pub fn storage_key(collection_id: &str) -> String {
    format!("{:032x}", xxh3_128(collection_id.as_bytes()))
}

/// Derives a file-name-safe stem from a collection identifier.
///
/// Every run of characters other than ASCII letters, digits and `_` collapses
/// into a single `_`, so `tag:example.org,2024:/ro/1` becomes
/// `tag_example_org_2024_ro_1`.
pub fn bag_name(collection_id: &str) -> String {
    let mut name = String::with_capacity(collection_id.len());
    let mut in_separator = false;
    for c in collection_id.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            name.push(c);
            in_separator = false;
        } else if !in_separator {
            name.push('_');
            in_separator = true;
        }
    }
    name
}

/// Maps collection identifiers to paths below a root directory.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> StorageLayout {
        StorageLayout { root: root.into() }
    }

    /// Directory holding all files of the collection.
    pub fn collection_dir(&self, collection_id: &str) -> PathBuf {
        let key = storage_key(collection_id);
        self.root.join(&key[0..2]).join(&key[2..4])
    }

    /// Path of the collection file with the given suffix.
    pub fn file_path(&self, collection_id: &str, suffix: &str) -> PathBuf {
        self.collection_dir(collection_id)
            .join(format!("{}{suffix}", bag_name(collection_id)))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_bag_name() {
        assert_eq!(bag_name("tag:example.org,2024:/ro/1"), "tag_example_org_2024_ro_1");
        assert_eq!(bag_name("plain_id"), "plain_id");
        assert_eq!(bag_name("a  b"), "a_b");
        assert_eq!(bag_name(""), "");
    }

    #[test]
    fn test_storage_key_is_stable() {
        let a = storage_key("tag:example.org,2024:/ro/1");
        assert_eq!(a.len(), 32);
        assert_eq!(a, storage_key("tag:example.org,2024:/ro/1"));
        assert_ne!(a, storage_key("tag:example.org,2024:/ro/2"));
    }

    #[test]
    fn test_file_path() {
        let layout = StorageLayout::new("/data");
        let id = "doi:10.5072/FK2";
        let key = storage_key(id);
        let path = layout.file_path(id, INDEX_SUFFIX);
        let expected = Path::new("/data")
            .join(&key[0..2])
            .join(&key[2..4])
            .join("doi_10_5072_FK2.index.json");
        assert_eq!(path, expected);
        assert_eq!(path.parent().unwrap(), layout.collection_dir(id));
    }
}
