//! Random access to the members of published ORE maps.
//!
//! [`Repository`] ties the pieces together: the [`cache::CacheManager`] builds
//! the description and offset index of a collection once and keeps them next to
//! the archive, and the [`retriever::SubtreeRetriever`] uses the index to read a
//! single member's bytes out of the ORE map stream with a forward cursor.

pub mod cache;
pub mod config;
pub mod repository;
pub mod retriever;
pub mod status;

pub use cache::{ArtifactPaths, CacheManager};
pub use config::{ChildOrder, RepositoryConfig};
pub use repository::Repository;
pub use retriever::{Node, SubtreeRetriever, UnresolvedMember};
pub use status::StatusClass;
