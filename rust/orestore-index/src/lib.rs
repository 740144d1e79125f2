//! Single-pass indexing of ORE map documents.
//!
//! An ORE map is a JSON-LD document whose `describes` object holds the
//! aggregation metadata plus an `aggregates` array with one object per member.
//! Indexing scans the document once and produces two artifacts:
//!
//! * the **description**: every `describes` field except `aggregates`;
//! * the **offset index**: member identifier to the byte offset of the member
//!   object's opening brace, in document order.
//!
//! The scan is driven by [`tokenizer::JsonTokenizer`], which reports the byte
//! span of every token and never holds more than its read buffer plus the value
//! currently being copied.

pub mod artifacts;
pub mod builder;
pub mod tokenizer;

pub use artifacts::{Description, OffsetIndex, OreMapArtifacts};
pub use builder::{IndexBuilder, IndexBuilderParams};
pub use tokenizer::{JsonTokenizer, Token, TokenKind};
