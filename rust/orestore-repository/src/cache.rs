//! Build-once storage of the derived artifacts of each collection.

use std::{
    collections::HashMap,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use orestore_archive::{
    ArchiveStore,
    layout::{DESCRIPTION_SUFFIX, INDEX_SUFFIX, StorageLayout},
};
use orestore_common::{Error, Result};
use orestore_index::{
    Description, IndexBuilder, IndexBuilderParams, OffsetIndex, artifacts::read_description,
};
use orestore_io::{AtomicFileWriter, SealingWrite};
use rayon::prelude::*;

/// Locations of the two artifacts of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub description: PathBuf,
    pub index: PathBuf,
}

impl ArtifactPaths {
    pub fn exist(&self) -> bool {
        self.description.is_file() && self.index.is_file()
    }
}

/// Creates artifacts on first use and serves them afterwards.
///
/// Artifacts are published with an atomic rename, so readers never see a
/// partial file. Within one manager, concurrent first requests for the same
/// collection wait on a per-collection lock and only one of them runs the
/// builder. Separate processes sharing a cache directory may build the same
/// collection twice; the last rename wins and both results are identical.
pub struct CacheManager {
    layout: StorageLayout,
    archive: Arc<dyn ArchiveStore>,
    builder: IndexBuilder,
    build_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CacheManager {
    pub fn new(
        cache_root: impl Into<PathBuf>,
        archive: Arc<dyn ArchiveStore>,
        params: IndexBuilderParams,
    ) -> CacheManager {
        CacheManager {
            layout: StorageLayout::new(cache_root),
            archive,
            builder: IndexBuilder::new(params),
            build_locks: Default::default(),
        }
    }

    pub fn archive(&self) -> &Arc<dyn ArchiveStore> {
        &self.archive
    }

    pub fn artifact_paths(&self, collection_id: &str) -> ArtifactPaths {
        ArtifactPaths {
            description: self.layout.file_path(collection_id, DESCRIPTION_SUFFIX),
            index: self.layout.file_path(collection_id, INDEX_SUFFIX),
        }
    }

    /// Returns the artifact locations, building the artifacts first if either
    /// is missing.
    pub fn ensure_artifacts(&self, collection_id: &str) -> Result<ArtifactPaths> {
        let paths = self.artifact_paths(collection_id);
        if paths.exist() {
            log::debug!("artifacts of '{collection_id}' are cached");
            return Ok(paths);
        }

        self.with_build_lock(collection_id, || {
            if paths.exist() {
                log::debug!("artifacts of '{collection_id}' were built concurrently");
                return Ok(());
            }
            self.build(collection_id, &paths).inspect_err(|e| {
                log::error!("failed to build artifacts of '{collection_id}': {e}");
            })
        })?;
        Ok(paths)
    }

    pub fn load_description(&self, paths: &ArtifactPaths) -> Result<Description> {
        read_description(open_artifact(&paths.description)?)
    }

    pub fn load_index(&self, paths: &ArtifactPaths) -> Result<OffsetIndex> {
        OffsetIndex::read_from(open_artifact(&paths.index)?)
    }

    /// Removes both artifacts of a collection so that the next request rebuilds
    /// them. Returns `true` if anything was removed.
    pub fn invalidate(&self, collection_id: &str) -> Result<bool> {
        let paths = self.artifact_paths(collection_id);
        let removed = self.with_build_lock(collection_id, || {
            let mut removed = false;
            // Description first: a lone index is treated as missing artifacts.
            for path in [&paths.description, &paths.index] {
                match std::fs::remove_file(path) {
                    Ok(()) => removed = true,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(Error::io(format!("remove {}", path.display()), e)),
                }
            }
            Ok(removed)
        })?;
        log::debug!("invalidated artifacts of '{collection_id}': {removed}");
        Ok(removed)
    }

    /// Ensures the artifacts of many collections in parallel. Results are in
    /// the order of `collection_ids`; one failure does not stop the others.
    pub fn warm<S>(&self, collection_ids: &[S]) -> Vec<Result<ArtifactPaths>>
    where
        S: AsRef<str> + Sync,
    {
        collection_ids
            .par_iter()
            .map(|id| self.ensure_artifacts(id.as_ref()))
            .collect()
    }

    /// Runs `f` while holding the collection's build lock. The lock entry is
    /// dropped again once no other caller holds or waits on it, so the table
    /// only tracks collections with work in flight.
    fn with_build_lock<T>(&self, collection_id: &str, f: impl FnOnce() -> T) -> T {
        let lock = self
            .build_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(collection_id.to_string())
            .or_default()
            .clone();
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        let mut locks = self.build_locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Handles are only cloned under the table lock, so a count of two
        // (the table and `lock`) means nobody else is waiting.
        if Arc::strong_count(&lock) == 2
            && locks
                .get(collection_id)
                .is_some_and(|entry| Arc::ptr_eq(entry, &lock))
        {
            locks.remove(collection_id);
        }
        result
    }

    fn build(&self, collection_id: &str, paths: &ArtifactPaths) -> Result<()> {
        let stream = self.archive.fetch_ore_map(collection_id)?;
        log::debug!(
            "building artifacts of '{collection_id}' from {} bytes",
            stream.size()
        );
        let artifacts = self.builder.build(stream.into_reader())?;
        // The index goes first; the description completes the pair.
        publish(&paths.index, |writer| artifacts.write_index(writer))?;
        publish(&paths.description, |writer| artifacts.write_description(writer))?;
        log::debug!(
            "published artifacts of '{collection_id}' with {} members",
            artifacts.index.len()
        );
        Ok(())
    }
}

fn publish<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn SealingWrite) -> Result<()>,
{
    let mut writer = AtomicFileWriter::create(path)
        .map_err(|e| Error::io(format!("stage {}", path.display()), e))?;
    write(&mut writer)?;
    writer
        .seal()
        .map_err(|e| Error::io(format!("publish {}", path.display()), e))
}

fn open_artifact(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| Error::io(format!("open {}", path.display()), e))?;
    Ok(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use orestore_archive::{memory_store::MemoryArchiveStore, null_store::NullArchiveStore};
    use orestore_testkit::OreMapFixture;

    use super::*;

    fn manager(dir: &Path, fixture: &OreMapFixture) -> CacheManager {
        let archive = MemoryArchiveStore::new();
        archive.insert(fixture.collection_id(), fixture.to_bytes());
        CacheManager::new(dir, Arc::new(archive), IndexBuilderParams::default())
    }

    #[test]
    fn test_build_then_hit() {
        let dir = tempfile::TempDir::new().unwrap();
        let fixture = OreMapFixture::new("A").has_part(&["B"]).member("B", &[]);
        let cache = manager(dir.path(), &fixture);

        let paths = cache.artifact_paths("A");
        assert!(!paths.exist());
        assert_eq!(cache.ensure_artifacts("A").unwrap(), paths);
        assert!(paths.exist());
        assert!(paths.index.starts_with(dir.path()));

        let description = cache.load_description(&paths).unwrap();
        assert_eq!(&description, fixture.expected_description());
        let index = cache.load_index(&paths).unwrap();
        assert!(index.contains("B"));

        let modified = std::fs::metadata(&paths.index).unwrap().modified().unwrap();
        cache.ensure_artifacts("A").unwrap();
        assert_eq!(
            std::fs::metadata(&paths.index).unwrap().modified().unwrap(),
            modified
        );
    }

    #[test]
    fn test_failed_build_leaves_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let archive = MemoryArchiveStore::new();
        archive.insert("bad", b"{\"describes\": {\"aggregates\": [{\"@id\": \"b\"},".to_vec());
        let cache = CacheManager::new(dir.path(), Arc::new(archive), IndexBuilderParams::default());
        assert!(cache.ensure_artifacts("bad").is_err());
        let paths = cache.artifact_paths("bad");
        assert!(!paths.index.exists());
        assert!(!paths.description.exists());
    }

    #[test]
    fn test_missing_collection() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = CacheManager::new(
            dir.path(),
            Arc::new(NullArchiveStore),
            IndexBuilderParams::default(),
        );
        assert!(cache.ensure_artifacts("x").unwrap_err().is_not_found());
    }

    #[test]
    fn test_invalidate() {
        let dir = tempfile::TempDir::new().unwrap();
        let fixture = OreMapFixture::new("A").member("B", &[]);
        let cache = manager(dir.path(), &fixture);
        assert!(!cache.invalidate("A").unwrap());
        let paths = cache.ensure_artifacts("A").unwrap();
        assert!(cache.invalidate("A").unwrap());
        assert!(!paths.index.exists());
        assert!(!paths.description.exists());
        cache.ensure_artifacts("A").unwrap();
        assert!(paths.exist());
    }

    #[test]
    fn test_warm() {
        let dir = tempfile::TempDir::new().unwrap();
        let archive = MemoryArchiveStore::new();
        for id in ["c1", "c2", "c3"] {
            archive.insert(id, OreMapFixture::new(id).member(&format!("{id}/m"), &[]).to_bytes());
        }
        let cache = CacheManager::new(dir.path(), Arc::new(archive), IndexBuilderParams::default());
        let results = cache.warm(&["c1", "missing", "c2", "c3"]);
        assert_eq!(results.len(), 4);
        assert!(results[0].is_ok());
        assert!(results[1].as_ref().unwrap_err().is_not_found());
        assert!(results[2].as_ref().unwrap().exist());
        assert!(results[3].is_ok());
        assert!(cache.build_locks.lock().unwrap().is_empty());
    }

    #[test]
    fn test_build_locks_released() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = CacheManager::new(
            dir.path(),
            Arc::new(NullArchiveStore),
            IndexBuilderParams::default(),
        );
        for i in 0..10_000 {
            assert!(cache.ensure_artifacts(&format!("missing/{i}")).is_err());
        }
        assert!(cache.build_locks.lock().unwrap().is_empty());

        let fixture = OreMapFixture::new("A").member("B", &[]);
        let cache = manager(dir.path(), &fixture);
        cache.ensure_artifacts("A").unwrap();
        cache.invalidate("A").unwrap();
        cache.invalidate("never-built").unwrap();
        assert!(cache.build_locks.lock().unwrap().is_empty());
    }
}
