//! Extraction of single members and their direct children from an ORE map,
//! driven by the offset index and a forward cursor.

use std::io::Read;

use orestore_common::{Error, Result};
use orestore_index::{
    Description, OffsetIndex,
    builder::AGGREGATES_FIELD,
};
use orestore_io::ForwardCursor;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::ChildOrder;

/// Field listing the identifiers of an object's direct children.
pub const HAS_PART_FIELD: &str = "Has Part";

/// A listed child that could not be resolved.
#[derive(Debug)]
pub struct UnresolvedMember {
    pub identifier: String,
    pub error: Error,
}

/// The result of a retrieval: the aggregation or member object, with its
/// resolved children under `aggregates` when they were requested.
#[derive(Debug, Default)]
pub struct Node {
    pub value: Map<String, Value>,
    /// Children listed in `Has Part` that are missing from `aggregates`, with the
    /// reason.
    pub unresolved: Vec<UnresolvedMember>,
}

impl Node {
    pub fn new(mut value: Map<String, Value>) -> Node {
        value.remove(AGGREGATES_FIELD);
        Node {
            value,
            unresolved: Vec::new(),
        }
    }

    /// Identifiers listed in `Has Part`, if the node is a container.
    pub fn listed_children(&self) -> Option<Vec<String>> {
        listed_children(&self.value)
    }

    /// Resolved children, present only when children were requested.
    pub fn children(&self) -> Option<&Vec<Value>> {
        self.value.get(AGGREGATES_FIELD).and_then(Value::as_array)
    }

    /// Returns `true` when every listed child was resolved.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.value)
    }
}

/// Reads `Has Part`, accepting a single identifier or an array of them.
pub fn listed_children(object: &Map<String, Value>) -> Option<Vec<String>> {
    match object.get(HAS_PART_FIELD)? {
        Value::String(id) => Some(vec![id.clone()]),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(id) => Some(id.clone()),
                    other => {
                        log::warn!("ignoring non-string '{HAS_PART_FIELD}' entry {other}");
                        None
                    }
                })
                .collect(),
        ),
        other => {
            log::warn!("ignoring '{HAS_PART_FIELD}' of unexpected type: {other}");
            None
        }
    }
}

/// Resolves members of one document through its offset index.
///
/// The retriever itself holds no stream state; every call takes the cursor of the
/// ongoing retrieval. Since the cursor only moves forward, a member located
/// before the cursor's position cannot be read anymore and fails with
/// `BackwardSeek`.
pub struct SubtreeRetriever<'a> {
    index: &'a OffsetIndex,
    document_size: u64,
    child_order: ChildOrder,
}

impl<'a> SubtreeRetriever<'a> {
    pub fn new(index: &'a OffsetIndex, document_size: u64, child_order: ChildOrder) -> Self {
        SubtreeRetriever {
            index,
            document_size,
            child_order,
        }
    }

    /// Returns the aggregation, with its direct children when `include_children`
    /// is set.
    pub fn fetch_aggregation<R: Read>(
        &self,
        description: &Description,
        cursor: &mut ForwardCursor<R>,
        include_children: bool,
    ) -> Result<Node> {
        let mut node = Node::new(description.clone());
        if include_children {
            self.fetch_children(cursor, &mut node)?;
        }
        Ok(node)
    }

    /// Reads the member `identifier` from its byte window.
    ///
    /// # Errors
    ///
    /// * `UnknownMember` if the identifier is not indexed.
    /// * `BackwardSeek` if the window starts behind the cursor.
    /// * `ShortRead` or `UnexpectedEndOfStream` if the document is shorter than
    ///   the index expects.
    /// * `Parse` if the window does not start with a JSON object.
    pub fn fetch_member<R: Read>(
        &self,
        cursor: &mut ForwardCursor<R>,
        identifier: &str,
        include_children: bool,
    ) -> Result<Node> {
        let window = self.index.window(identifier, self.document_size)?;
        let expected = window.end - window.start;
        cursor.advance_to(window.start)?;
        let bytes = cursor.read_window(expected)?;
        if (bytes.len() as u64) < expected {
            return Err(Error::short_read(window.start, expected, bytes.len() as u64));
        }
        log::trace!("member '{identifier}' read from {window:?}");

        let mut node = Node::new(parse_member(&bytes, window.start)?);
        if include_children {
            self.fetch_children(cursor, &mut node)?;
        }
        Ok(node)
    }

    /// Resolves the children listed in the node's `Has Part` into its
    /// `aggregates` array. Children are fetched without their own children.
    ///
    /// Member-scoped failures are recorded in `node.unresolved` and skipped;
    /// any other failure aborts.
    pub fn fetch_children<R: Read>(
        &self,
        cursor: &mut ForwardCursor<R>,
        node: &mut Node,
    ) -> Result<()> {
        let Some(mut listed) = node.listed_children() else {
            return Ok(());
        };
        if self.child_order == ChildOrder::Document {
            listed.sort_by_key(|id| self.index.offset_of(id).unwrap_or(u64::MAX));
        }

        let mut children = Vec::with_capacity(listed.len());
        for identifier in listed {
            match self.fetch_member(cursor, &identifier, false) {
                Ok(child) => children.push(child.into_value()),
                Err(error) if error.is_member_scoped() => {
                    log::warn!("dropping child '{identifier}': {error}");
                    node.unresolved.push(UnresolvedMember { identifier, error });
                }
                Err(error) => return Err(error),
            }
        }
        log::debug!(
            "resolved {} children, {} unresolved",
            children.len(),
            node.unresolved.len()
        );
        node.value
            .insert(AGGREGATES_FIELD.to_string(), Value::Array(children));
        Ok(())
    }
}

/// Parses the leading JSON object of a member window. Bytes after the object
/// belong to the enclosing document and are ignored.
fn parse_member(bytes: &[u8], offset: u64) -> Result<Map<String, Value>> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    match Value::deserialize(&mut deserializer) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(Error::parse(offset, "member window does not start with an object")),
        Err(e) => Err(Error::parse(offset, format!("member window: {e}"))),
    }
}
