//! "null" archive store: holds no collections at all.

use orestore_common::{Error, Result};

use crate::{ArchiveStore, OreMapStream};

/// An `ArchiveStore` without content.
///
/// Every lookup fails with `CollectionNotFound`. Useful for serving only
/// already-built description artifacts, or in tests.
pub struct NullArchiveStore;

impl ArchiveStore for NullArchiveStore {
    fn fetch_ore_map(&self, collection_id: &str) -> Result<OreMapStream> {
        Err(Error::collection_not_found(collection_id))
    }
}

#[cfg(test)]
mod tests {
    use crate::ArchiveStore;

    use super::NullArchiveStore;

    #[test]
    fn test_null_store_not_found() {
        let err = NullArchiveStore.fetch_ore_map("tag:x").unwrap_err();
        assert!(err.is_not_found());
    }
}
