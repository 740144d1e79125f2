//! *Archive Store* abstraction: the collaborator that resolves a collection
//! identifier to the raw bytes of its published ORE map.
//!
//! The store only hands out a sequential stream together with the total
//! document length; random access into the document is built on top of that
//! by the offset index.

pub mod layout;
pub mod local_store;
pub mod memory_store;
pub mod null_store;

use std::io::Read;

use orestore_common::Result;

/// The `ArchiveStore` trait represents the storage holding published packages.
///
/// Implementations must be safe to share between request threads; every call to
/// [`fetch_ore_map`](ArchiveStore::fetch_ore_map) returns an independent stream
/// positioned at the start of the document.
pub trait ArchiveStore: Send + Sync + 'static {
    /// Opens the ORE map of the given collection.
    ///
    /// # Errors
    ///
    /// * `CollectionNotFound` when the store has no package for `collection_id`.
    /// * `ArchiveUnavailable` when the package exists but cannot be read.
    fn fetch_ore_map(&self, collection_id: &str) -> Result<OreMapStream>;
}

/// A readable ORE map together with its total length in bytes.
pub struct OreMapStream {
    reader: Box<dyn Read + Send>,
    size: u64,
}

impl OreMapStream {
    pub fn new(reader: Box<dyn Read + Send>, size: u64) -> OreMapStream {
        OreMapStream { reader, size }
    }

    /// Total document length, known before any byte is read.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn into_reader(self) -> Box<dyn Read + Send> {
        self.reader
    }
}

impl std::fmt::Debug for OreMapStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OreMapStream")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}
