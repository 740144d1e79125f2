use std::{fs::File, io::ErrorKind, path::Path};

use orestore_common::{Error, Result};

use crate::{
    ArchiveStore, OreMapStream,
    layout::{ORE_MAP_SUFFIX, StorageLayout},
};

/// An `ArchiveStore` serving ORE maps that were extracted from their packages
/// onto the local filesystem.
///
/// The ORE map of collection `id` is expected at
/// `<data>/<h0h1>/<h2h3>/<bag>.oremap.jsonld.txt` (see [`StorageLayout`]).
/// Extraction from the zipped package is the publisher's concern; this store
/// only opens the resulting file.
pub struct LocalArchiveStore {
    layout: StorageLayout,
}

impl LocalArchiveStore {
    /// Creates a store rooted at `data_path`.
    ///
    /// The directory must exist.
    pub fn new(data_path: &Path) -> Result<LocalArchiveStore> {
        if !data_path.is_dir() {
            return Err(Error::invalid_arg(
                "data_path",
                format!("{} is not a directory", data_path.display()),
            ));
        }
        Ok(LocalArchiveStore {
            layout: StorageLayout::new(data_path),
        })
    }

    /// Location of the ORE map file for the collection.
    pub fn ore_map_path(&self, collection_id: &str) -> std::path::PathBuf {
        self.layout.file_path(collection_id, ORE_MAP_SUFFIX)
    }
}

impl ArchiveStore for LocalArchiveStore {
    fn fetch_ore_map(&self, collection_id: &str) -> Result<OreMapStream> {
        let path = self.ore_map_path(collection_id);
        log::debug!("opening ORE map {}", path.display());
        let file = File::open(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::collection_not_found(collection_id),
            _ => Error::archive_unavailable(collection_id, e),
        })?;
        let size = file
            .metadata()
            .map_err(|e| Error::archive_unavailable(collection_id, e))?
            .len();
        Ok(OreMapStream::new(Box::new(file), size))
    }
}
