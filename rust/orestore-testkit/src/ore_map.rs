//! Hand-built ORE map fixtures.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use orestore_archive::layout::{ORE_MAP_SUFFIX, StorageLayout};
use serde_json::{Map, Value, json};

/// Name of the field listing the identifiers of an object's direct children.
pub const HAS_PART: &str = "Has Part";

/// Builder of an ORE map document.
///
/// The aggregation always carries `@id`, `@type` and `Title`; members carry
/// `@id`, `@type`, `Title` and, when they have children, `Has Part`. Members are
/// serialized in the order they were added.
#[derive(Debug, Clone)]
pub struct OreMapFixture {
    collection_id: String,
    fields: Map<String, Value>,
    members: Vec<Map<String, Value>>,
}

impl OreMapFixture {
    pub fn new(collection_id: &str) -> OreMapFixture {
        let mut fields = Map::new();
        fields.insert("@id".into(), collection_id.into());
        fields.insert("@type".into(), json!(["ore:Aggregation", "Dataset"]));
        fields.insert("Title".into(), format!("Collection {collection_id}").into());
        OreMapFixture {
            collection_id: collection_id.to_string(),
            fields,
            members: Vec::new(),
        }
    }

    pub fn collection_id(&self) -> &str {
        &self.collection_id
    }

    /// Sets an aggregation field.
    pub fn field(mut self, name: &str, value: Value) -> OreMapFixture {
        self.fields.insert(name.to_string(), value);
        self
    }

    /// Sets the aggregation's direct children.
    pub fn has_part(self, children: &[&str]) -> OreMapFixture {
        self.field(HAS_PART, json!(children))
    }

    /// Appends a member with the given direct children.
    pub fn member(mut self, id: &str, children: &[&str]) -> OreMapFixture {
        let mut member = Map::new();
        member.insert("@id".into(), id.into());
        member.insert("@type".into(), "ore:AggregatedResource".into());
        member.insert("Title".into(), format!("Member {id}").into());
        if !children.is_empty() {
            member.insert(HAS_PART.into(), json!(children));
        }
        self.members.push(member);
        self
    }

    /// Appends a member object as is.
    pub fn raw_member(mut self, member: Value) -> OreMapFixture {
        match member {
            Value::Object(map) => self.members.push(map),
            other => panic!("member must be an object: {other}"),
        }
        self
    }

    pub fn members(&self) -> &[Map<String, Value>] {
        &self.members
    }

    /// Identifiers (`@id`) of all members, in document order.
    pub fn member_ids(&self) -> Vec<String> {
        self.members
            .iter()
            .filter_map(|m| m.get("@id").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }

    pub fn expected_member(&self, id: &str) -> Option<&Map<String, Value>> {
        self.members
            .iter()
            .find(|m| m.get("@id").and_then(Value::as_str) == Some(id))
    }

    /// The aggregation fields, which is what indexing should reproduce as the
    /// description.
    pub fn expected_description(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn document(&self) -> Value {
        let mut describes = self.fields.clone();
        describes.insert(
            "aggregates".into(),
            Value::Array(self.members.iter().cloned().map(Value::Object).collect()),
        );
        json!({
            "@context": [
                "https://w3id.org/ore/context",
                {"Title": "http://purl.org/dc/terms/title", "Has Part": "http://purl.org/dc/terms/hasPart"}
            ],
            "describes": describes,
            "@id": format!("{}.oremap", self.collection_id),
            "@type": "ore:ResourceMap"
        })
    }

    /// The document as pretty-printed JSON.
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec_pretty(&self.document()).expect("serialize fixture")
    }

    /// Writes the document to a temporary file.
    pub fn to_temp_file(&self) -> anyhow::Result<tempfile::NamedTempFile> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(&self.to_bytes())?;
        file.flush()?;
        Ok(file)
    }

    /// Places the document under `data_root` where a local archive store looks
    /// for it, and returns the file path.
    pub fn publish(&self, data_root: &Path) -> anyhow::Result<PathBuf> {
        let path = StorageLayout::new(data_root).file_path(&self.collection_id, ORE_MAP_SUFFIX);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, self.to_bytes())?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_document() {
        let fixture = OreMapFixture::new("A")
            .has_part(&["B", "C"])
            .member("B", &[])
            .member("C", &["D"])
            .member("D", &[]);
        let doc = fixture.document();
        assert_eq!(doc["describes"]["@id"], "A");
        assert_eq!(doc["describes"]["aggregates"].as_array().unwrap().len(), 3);
        assert_eq!(fixture.member_ids(), vec!["B", "C", "D"]);
        assert_eq!(fixture.expected_member("C").unwrap()[HAS_PART], json!(["D"]));
        assert!(fixture.expected_member("B").unwrap().get(HAS_PART).is_none());

        let parsed: Value = serde_json::from_slice(&fixture.to_bytes()).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_publish() {
        let dir = tempfile::TempDir::new().unwrap();
        let fixture = OreMapFixture::new("doi:10.5072/FK2/ABC").member("x", &[]);
        let path = fixture.publish(dir.path()).unwrap();
        assert!(path.starts_with(dir.path()));
        assert!(path.to_string_lossy().ends_with("doi_10_5072_FK2_ABC.oremap.jsonld.txt"));
        assert_eq!(std::fs::read(&path).unwrap(), fixture.to_bytes());
    }
}
