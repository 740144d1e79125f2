//! The two derived artifacts of an ORE map: the description and the offset index.

use std::{io::Read, ops::Range};

use indexmap::IndexMap;
use orestore_common::{Error, Result, verify_arg, verify_data};
use orestore_io::SealingWrite;
use serde_json::{Map, Value};

/// The aggregation's own fields, without its `aggregates` member list.
pub type Description = Map<String, Value>;

/// Identifier to byte-offset map of the members of one ORE map.
///
/// Entries are kept in document order, so the entry following a member is the
/// next member object in the document and bounds the member's byte window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetIndex {
    entries: IndexMap<String, u64>,
}

impl OffsetIndex {
    pub fn new() -> OffsetIndex {
        Default::default()
    }

    /// Appends an entry.
    ///
    /// Returns `false` and leaves the index unchanged when the identifier is
    /// already present; the first occurrence wins.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `offset` does not exceed the offset of the last entry.
    pub fn push(&mut self, identifier: impl Into<String>, offset: u64) -> Result<bool> {
        if let Some((_, &last)) = self.entries.last() {
            verify_arg!(offset, offset > last);
        }
        let identifier = identifier.into();
        if self.entries.contains_key(&identifier) {
            return Ok(false);
        }
        self.entries.insert(identifier, offset);
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn offset_of(&self, identifier: &str) -> Option<u64> {
        self.entries.get(identifier).copied()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    /// Entries in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(id, &offset)| (id.as_str(), offset))
    }

    /// Byte range holding the member object of `identifier`.
    ///
    /// The range starts at the member's offset and ends at the offset of the next
    /// entry, or at `document_size` for the last entry. It may include a trailing
    /// delimiter and whitespace belonging to the enclosing array.
    pub fn window(&self, identifier: &str, document_size: u64) -> Result<Range<u64>> {
        let (position, _, &start) = self
            .entries
            .get_full(identifier)
            .ok_or_else(|| Error::unknown_member(identifier))?;
        let end = match self.entries.get_index(position + 1) {
            Some((_, &next)) => next,
            None => document_size,
        };
        if end <= start {
            return Err(Error::invalid_format(
                "index",
                format!("member '{identifier}' at {start} lies outside a document of {end} bytes"),
            ));
        }
        Ok(start..end)
    }

    /// Serializes the index as a pretty-printed JSON object.
    pub fn write_to(&self, writer: &mut dyn SealingWrite) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&self.entries)
            .map_err(|e| Error::json("serialize index", e))?;
        writer
            .write_all(&bytes)
            .map_err(|e| Error::io("write index", e))
    }

    /// Loads an index artifact, checking that offsets are strictly increasing.
    pub fn read_from<R: Read>(reader: R) -> Result<OffsetIndex> {
        let entries: IndexMap<String, u64> =
            serde_json::from_reader(reader).map_err(|e| Error::json("read index", e))?;
        let mut last = None;
        for &offset in entries.values() {
            if let Some(last) = last {
                verify_data!(index, offset > last);
            }
            last = Some(offset);
        }
        Ok(OffsetIndex { entries })
    }
}

/// Description and index derived together from one scan of an ORE map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OreMapArtifacts {
    pub description: Description,
    pub index: OffsetIndex,
}

impl OreMapArtifacts {
    pub fn write_description(&self, writer: &mut dyn SealingWrite) -> Result<()> {
        write_description(&self.description, writer)
    }

    pub fn write_index(&self, writer: &mut dyn SealingWrite) -> Result<()> {
        self.index.write_to(writer)
    }
}

pub fn write_description(description: &Description, writer: &mut dyn SealingWrite) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(description)
        .map_err(|e| Error::json("serialize description", e))?;
    writer
        .write_all(&bytes)
        .map_err(|e| Error::io("write description", e))
}

pub fn read_description<R: Read>(reader: R) -> Result<Description> {
    match serde_json::from_reader(reader).map_err(|e| Error::json("read description", e))? {
        Value::Object(map) => Ok(map),
        _ => Err(Error::invalid_format("description", "not a JSON object")),
    }
}

#[cfg(test)]
mod tests {
    use orestore_common::ErrorKind;

    use super::*;

    fn sample() -> OffsetIndex {
        let mut index = OffsetIndex::new();
        assert!(index.push("b", 100).unwrap());
        assert!(index.push("c", 180).unwrap());
        assert!(index.push("d", 260).unwrap());
        index
    }

    #[test]
    fn test_window_lengths() {
        let index = sample();
        assert_eq!(index.window("b", 400).unwrap(), 100..180);
        assert_eq!(index.window("c", 400).unwrap(), 180..260);
        assert_eq!(index.window("d", 400).unwrap(), 260..400);
    }

    #[test]
    fn test_unknown_member() {
        let err = sample().window("zz", 400).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnknownMember { identifier } if identifier == "zz"));
    }

    #[test]
    fn test_window_beyond_document() {
        let err = sample().window("d", 200).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));
    }

    #[test]
    fn test_duplicate_keeps_first() {
        let mut index = sample();
        assert!(!index.push("b", 300).unwrap());
        assert_eq!(index.offset_of("b"), Some(100));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_out_of_order_offset_rejected() {
        let mut index = sample();
        for offset in [260, 120] {
            let err = index.push("e", offset).unwrap_err();
            assert!(matches!(err.kind(), ErrorKind::InvalidArgument { name, .. } if name == "offset"));
        }
        assert!(!index.contains("e"));
        assert!(index.push("e", 300).unwrap());
    }

    #[test]
    fn test_serialized_order_and_reload() {
        let mut index = OffsetIndex::new();
        index.push("z", 10).unwrap();
        index.push("a", 20).unwrap();
        let mut out = Vec::new();
        index.write_to(&mut out).unwrap();
        let text = String::from_utf8(out.clone()).unwrap();
        assert!(text.find("\"z\"").unwrap() < text.find("\"a\"").unwrap());
        assert_eq!(OffsetIndex::read_from(&out[..]).unwrap(), index);
    }

    #[test]
    fn test_reload_rejects_unordered_offsets() {
        let err = OffsetIndex::read_from(&br#"{"a": 20, "b": 10}"#[..]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));
    }

    #[test]
    fn test_description_round_trip() {
        let description = serde_json::json!({"Title": "t", "Has Part": ["b"], "@id": "a"});
        let Value::Object(description) = description else {
            unreachable!()
        };
        let mut out = Vec::new();
        write_description(&description, &mut out).unwrap();
        assert_eq!(read_description(&out[..]).unwrap(), description);
        assert!(read_description(&b"[1]"[..]).is_err());
    }
}
