use std::{path::Path, sync::Arc};

use orestore_archive::memory_store::MemoryArchiveStore;
use orestore_common::ErrorKind;
use orestore_repository::{ChildOrder, Repository, RepositoryConfig, StatusClass};
use orestore_testkit::{
    OreMapFixture,
    data_gen::{CollectionShape, generate_collection},
};
use serde_json::{Value, json};

fn local_repository(root: &Path, child_order: ChildOrder) -> Repository {
    let config = RepositoryConfig {
        data_path: root.join("data"),
        cache_path: Some(root.join("cache")),
        child_order,
        ..Default::default()
    };
    std::fs::create_dir_all(&config.data_path).unwrap();
    Repository::open(config).unwrap()
}

fn child_ids(value: &Value, field: &str) -> Vec<String> {
    value["aggregates"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c[field].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_flat_collection() {
    let dir = tempfile::TempDir::new().unwrap();
    let repository = local_repository(dir.path(), ChildOrder::Listed);
    let fixture = OreMapFixture::new("A")
        .has_part(&["B", "C"])
        .member("B", &[])
        .member("C", &[]);
    fixture.publish(&repository.config().data_path).unwrap();

    let node = repository.get_aggregation_with_children("A").unwrap();
    assert!(node.is_complete());
    let value = node.into_value();
    assert_eq!(child_ids(&value, "@id"), vec!["B", "C"]);
    assert_eq!(value["aggregates"][0], Value::Object(fixture.expected_member("B").unwrap().clone()));
    assert_eq!(value["Title"], "Collection A");

    let summary = repository.get_aggregation_summary("A").unwrap().into_value();
    assert!(summary.get("aggregates").is_none());
    assert_eq!(summary["Has Part"], json!(["B", "C"]));
}

#[test]
fn test_identifier_field_scenario() {
    let archive = MemoryArchiveStore::new();
    archive.insert(
        "A",
        br#"{"describes": {"Identifier": "A", "Has Part": ["B", "C"],
            "aggregates": [{"Identifier": "B"}, {"Identifier": "C"}]}}"#
            .to_vec(),
    );
    let dir = tempfile::TempDir::new().unwrap();
    let config = RepositoryConfig {
        data_path: dir.path().to_path_buf(),
        ..Default::default()
    };
    let repository = Repository::new(config, Arc::new(archive)).unwrap();
    let value = repository
        .get_aggregation_with_children("A")
        .unwrap()
        .into_value();
    assert_eq!(
        value["aggregates"],
        json!([{"Identifier": "B"}, {"Identifier": "C"}])
    );
}

#[test]
fn test_reversed_has_part() {
    let dir = tempfile::TempDir::new().unwrap();
    let repository = local_repository(dir.path(), ChildOrder::Listed);
    OreMapFixture::new("A")
        .has_part(&["C", "B"])
        .member("B", &[])
        .member("C", &[])
        .publish(&repository.config().data_path)
        .unwrap();

    let node = repository.get_aggregation_with_children("A").unwrap();
    assert_eq!(node.unresolved.len(), 1);
    assert_eq!(node.unresolved[0].identifier, "B");
    assert!(matches!(
        node.unresolved[0].error.kind(),
        ErrorKind::BackwardSeek { .. }
    ));
    let value = node.into_value();
    assert_eq!(child_ids(&value, "@id"), vec!["C"]);
    assert_eq!(value["@id"], "A");
    assert_eq!(value["Has Part"], json!(["C", "B"]));
}

#[test]
fn test_reversed_has_part_document_order() {
    let dir = tempfile::TempDir::new().unwrap();
    let repository = local_repository(dir.path(), ChildOrder::Document);
    OreMapFixture::new("A")
        .has_part(&["C", "B"])
        .member("B", &[])
        .member("C", &[])
        .publish(&repository.config().data_path)
        .unwrap();

    let node = repository.get_aggregation_with_children("A").unwrap();
    assert!(node.is_complete());
    assert_eq!(child_ids(&node.into_value(), "@id"), vec!["B", "C"]);
}

#[test]
fn test_nested_container() {
    let dir = tempfile::TempDir::new().unwrap();
    let repository = local_repository(dir.path(), ChildOrder::Listed);
    OreMapFixture::new("A")
        .has_part(&["B"])
        .member("B", &["D"])
        .member("D", &[])
        .publish(&repository.config().data_path)
        .unwrap();

    let value = repository.get_member("A", "B").unwrap().into_value();
    assert_eq!(value["@id"], "B");
    assert_eq!(child_ids(&value, "@id"), vec!["D"]);

    let leaf = repository.get_member("A", "D").unwrap();
    assert!(leaf.children().is_none());
}

#[test]
fn test_round_trip_generated_collection() {
    let dir = tempfile::TempDir::new().unwrap();
    let repository = local_repository(dir.path(), ChildOrder::Document);
    let shape = CollectionShape {
        member_count: 120,
        ..Default::default()
    };
    let fixture = generate_collection("tag:example.org,2024:/ro/7", 42, &shape);
    fixture.publish(&repository.config().data_path).unwrap();
    let collection_id = fixture.collection_id();

    let (description, index) = repository.load_artifacts(collection_id).unwrap();
    assert_eq!(&description, fixture.expected_description());
    assert_eq!(index.len(), shape.member_count);
    let offsets = index.iter().map(|(_, offset)| offset).collect::<Vec<_>>();
    assert!(offsets.windows(2).all(|w| w[0] < w[1]));

    for member_id in fixture.member_ids() {
        let node = repository.get_member(collection_id, &member_id).unwrap();
        assert!(node.is_complete(), "{member_id}");
        let mut value = node.value;
        let children = value.remove("aggregates");
        assert_eq!(&value, fixture.expected_member(&member_id).unwrap());
        match value.get("Has Part") {
            Some(Value::Array(listed)) => {
                let children = children.unwrap();
                let children = children.as_array().unwrap();
                assert_eq!(children.len(), listed.len());
                for child in children {
                    let id = child["@id"].as_str().unwrap();
                    assert_eq!(child.as_object().unwrap(), fixture.expected_member(id).unwrap());
                }
            }
            _ => assert!(children.is_none()),
        }
    }

    let node = repository
        .get_aggregation_with_children(collection_id)
        .unwrap();
    assert!(node.is_complete());
}

#[test]
fn test_idempotent_artifacts() {
    let dir = tempfile::TempDir::new().unwrap();
    let repository = local_repository(dir.path(), ChildOrder::Listed);
    let fixture = generate_collection("tag:idem", 3, &CollectionShape::default());
    fixture.publish(&repository.config().data_path).unwrap();

    let paths = repository.cache().ensure_artifacts("tag:idem").unwrap();
    let first = (
        std::fs::read(&paths.description).unwrap(),
        std::fs::read(&paths.index).unwrap(),
    );
    assert!(repository.invalidate("tag:idem").unwrap());
    repository.cache().ensure_artifacts("tag:idem").unwrap();
    let second = (
        std::fs::read(&paths.description).unwrap(),
        std::fs::read(&paths.index).unwrap(),
    );
    assert_eq!(first, second);
}

#[test]
fn test_invalidate_picks_up_republished_document() {
    let dir = tempfile::TempDir::new().unwrap();
    let repository = local_repository(dir.path(), ChildOrder::Listed);
    let data_path = repository.config().data_path.clone();
    OreMapFixture::new("A")
        .member("B", &[])
        .publish(&data_path)
        .unwrap();
    assert!(repository.get_member("A", "B").is_ok());

    OreMapFixture::new("A")
        .member("B", &[])
        .member("C", &[])
        .publish(&data_path)
        .unwrap();
    let err = repository.get_member("A", "C").unwrap_err();
    assert_eq!(StatusClass::of(&err), StatusClass::NotFound);

    repository.invalidate("A").unwrap();
    assert_eq!(repository.get_member("A", "C").unwrap().value["@id"], "C");
}

#[test]
fn test_not_found() {
    let dir = tempfile::TempDir::new().unwrap();
    let repository = local_repository(dir.path(), ChildOrder::Listed);
    OreMapFixture::new("A")
        .member("B", &[])
        .publish(&repository.config().data_path)
        .unwrap();

    let err = repository.get_aggregation_summary("missing").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::CollectionNotFound { .. }));
    assert_eq!(StatusClass::of(&err), StatusClass::NotFound);

    let err = repository.get_member("A", "nope").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnknownMember { .. }));
    assert_eq!(StatusClass::of(&err).http_status(), 404);
}

#[test]
fn test_malformed_document_is_server_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let repository = local_repository(dir.path(), ChildOrder::Listed);
    let path = OreMapFixture::new("A")
        .publish(&repository.config().data_path)
        .unwrap();
    std::fs::write(&path, b"{\"describes\": {\"Title\": }}").unwrap();

    let err = repository.get_aggregation_summary("A").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Parse { .. }));
    assert_eq!(StatusClass::of(&err), StatusClass::ServerError);
    assert!(!repository.cache().artifact_paths("A").description.exists());
}
