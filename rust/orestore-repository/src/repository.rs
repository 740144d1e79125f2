use std::{io::BufReader, sync::Arc};

use orestore_archive::{ArchiveStore, local_store::LocalArchiveStore};
use orestore_common::{Error, Result};
use orestore_index::{Description, OffsetIndex};
use orestore_io::ForwardCursor;

use crate::{
    cache::{ArtifactPaths, CacheManager},
    config::RepositoryConfig,
    retriever::{Node, SubtreeRetriever, listed_children},
};

/// Retrieval entry point for the published collections of one archive.
///
/// `Repository` is `Send + Sync`; share it through an `Arc` between request
/// threads. Each retrieval opens its own ORE map stream and cursor.
pub struct Repository {
    config: RepositoryConfig,
    cache: CacheManager,
}

impl Repository {
    pub fn new(config: RepositoryConfig, archive: Arc<dyn ArchiveStore>) -> Result<Repository> {
        config.validate()?;
        let cache = CacheManager::new(
            config.cache_root().to_path_buf(),
            archive,
            config.index_builder_params(),
        );
        Ok(Repository { config, cache })
    }

    /// Opens a repository over the extracted ORE maps under `config.data_path`.
    pub fn open(config: RepositoryConfig) -> Result<Repository> {
        let archive = LocalArchiveStore::new(&config.data_path)?;
        Repository::new(config, Arc::new(archive))
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// The aggregation's own fields, without members.
    pub fn get_aggregation_summary(&self, collection_id: &str) -> Result<Node> {
        let paths = self.cache.ensure_artifacts(collection_id)?;
        let description = self.cache.load_description(&paths)?;
        Ok(Node::new(description))
    }

    /// The aggregation with its direct children under `aggregates`.
    pub fn get_aggregation_with_children(&self, collection_id: &str) -> Result<Node> {
        let paths = self.cache.ensure_artifacts(collection_id)?;
        let description = self.cache.load_description(&paths)?;
        if listed_children(&description).is_none() {
            return Ok(Node::new(description));
        }
        let index = self.cache.load_index(&paths)?;
        self.with_cursor(collection_id, &index, |retriever, cursor| {
            retriever.fetch_aggregation(&description, cursor, true)
        })
    }

    /// One member with its direct children.
    pub fn get_member(&self, collection_id: &str, member_id: &str) -> Result<Node> {
        let paths = self.cache.ensure_artifacts(collection_id)?;
        let index = self.cache.load_index(&paths)?;
        if !index.contains(member_id) {
            log::debug!("member '{member_id}' is not part of '{collection_id}'");
            return Err(Error::unknown_member(member_id));
        }
        self.with_cursor(collection_id, &index, |retriever, cursor| {
            retriever.fetch_member(cursor, member_id, true)
        })
    }

    /// Loads both artifacts, building them if needed.
    pub fn load_artifacts(&self, collection_id: &str) -> Result<(Description, OffsetIndex)> {
        let paths = self.cache.ensure_artifacts(collection_id)?;
        Ok((
            self.cache.load_description(&paths)?,
            self.cache.load_index(&paths)?,
        ))
    }

    pub fn warm<S>(&self, collection_ids: &[S]) -> Vec<Result<ArtifactPaths>>
    where
        S: AsRef<str> + Sync,
    {
        self.cache.warm(collection_ids)
    }

    pub fn invalidate(&self, collection_id: &str) -> Result<bool> {
        self.cache.invalidate(collection_id)
    }

    fn with_cursor<T, F>(&self, collection_id: &str, index: &OffsetIndex, f: F) -> Result<T>
    where
        F: FnOnce(
            &SubtreeRetriever<'_>,
            &mut ForwardCursor<BufReader<Box<dyn std::io::Read + Send>>>,
        ) -> Result<T>,
    {
        let stream = self.cache.archive().fetch_ore_map(collection_id)?;
        let size = stream.size();
        let capacity = self.config.buffer_capacity(size);
        log::debug!("reading '{collection_id}' ({size} bytes, buffer {capacity})");
        let mut cursor =
            ForwardCursor::new(BufReader::with_capacity(capacity, stream.into_reader()));
        let retriever = SubtreeRetriever::new(index, size, self.config.child_order);
        f(&retriever, &mut cursor)
    }
}
