//! # orestore: random access into published ORE maps
//!
//! An ORE map is the JSON-LD resource map of a research-data collection. Its
//! `describes` object holds the collection metadata together with an
//! `aggregates` array listing every member (files and sub-collections) in a
//! flattened form. Published maps can be tens of megabytes and are queried
//! constantly, one node at a time.
//!
//! orestore scans each map once and keeps two small artifacts next to it: the
//! collection description, and an index from member identifier to the byte offset
//! of the member's object. A request for one member then skips straight to that
//! offset on a sequential stream and parses only the member's bytes.
//!
//! ## Module Organization
//!
//! * [`archive`] - Access to published ORE maps and the on-disk layout
//! * [`common`] - Error type and helper macros shared by all crates
//! * [`index`] - Offset-reporting JSON tokenizer and the single-pass index builder
//! * [`io`] - Forward-only cursor and atomically published writers
//! * [`repository`] - Artifact cache, subtree retrieval and the `Repository` entry point
//!
//! ## Getting Started
//!
//! ```no_run
//! use orestore::repository::{Repository, RepositoryConfig};
//!
//! let config = RepositoryConfig {
//!     data_path: "/srv/dataverse/data".into(),
//!     ..Default::default()
//! };
//! let repository = Repository::open(config)?;
//! let node = repository.get_member("doi:10.5072/FK2/ABC", "doi:10.5072/FK2/ABC/1")?;
//! println!("{}", node.into_value());
//! # Ok::<(), orestore::common::Error>(())
//! ```

pub use orestore_archive as archive;
pub use orestore_common as common;
pub use orestore_index as index;
pub use orestore_io as io;
pub use orestore_repository as repository;
