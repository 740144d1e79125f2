//! In-memory archive store, for tests and for embedding pre-loaded documents.

use std::{
    collections::HashMap,
    io::Cursor,
    sync::{Arc, RwLock},
};

use orestore_common::{Error, Result};

use crate::{ArchiveStore, OreMapStream};

#[derive(Default)]
pub struct MemoryArchiveStore {
    documents: RwLock<HashMap<String, Arc<[u8]>>>,
}

impl MemoryArchiveStore {
    pub fn new() -> MemoryArchiveStore {
        Default::default()
    }

    /// Registers (or replaces) the ORE map of a collection.
    pub fn insert(&self, collection_id: impl Into<String>, ore_map: impl Into<Arc<[u8]>>) {
        self.documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(collection_id.into(), ore_map.into());
    }

    pub fn remove(&self, collection_id: &str) -> bool {
        self.documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(collection_id)
            .is_some()
    }
}

impl ArchiveStore for MemoryArchiveStore {
    fn fetch_ore_map(&self, collection_id: &str) -> Result<OreMapStream> {
        let document = self
            .documents
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(collection_id)
            .cloned()
            .ok_or_else(|| Error::collection_not_found(collection_id))?;
        let size = document.len() as u64;
        Ok(OreMapStream::new(Box::new(Cursor::new(document)), size))
    }
}
