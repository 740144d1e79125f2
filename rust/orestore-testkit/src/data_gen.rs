//! Seeded generation of synthetic collections.
//!
//! Generated collections are trees: every member is attached either to the
//! aggregation or to an earlier member acting as a folder, and `Has Part` lists
//! children in document order. Text fields mix in quotes, backslashes, braces
//! and non-ASCII characters so that byte offsets differ from character offsets.

use serde_json::{Value, json};

use crate::ore_map::{HAS_PART, OreMapFixture};

const WORDS: &[&str] = &[
    "survey",
    "données",
    "raw",
    "{draft}",
    "[v2]",
    "\"final\"",
    "C:\\data",
    "genome",
    "Zürich",
    "温度",
    "plot",
    "readme",
];

/// Shape of a generated collection.
#[derive(Debug, Clone)]
pub struct CollectionShape {
    pub member_count: usize,
    /// Probability that a member can receive children.
    pub folder_ratio: f64,
    /// Upper bound on the number of keywords per member.
    pub max_keywords: usize,
}

impl Default for CollectionShape {
    fn default() -> CollectionShape {
        CollectionShape {
            member_count: 50,
            folder_ratio: 0.2,
            max_keywords: 4,
        }
    }
}

/// Member identifier used by generated collections.
pub fn member_id(collection_id: &str, ordinal: usize) -> String {
    format!("{collection_id}/file-{ordinal:04}")
}

/// Generates a collection with the given shape. The same `seed` always yields
/// the same document.
pub fn generate_collection(collection_id: &str, seed: u64, shape: &CollectionShape) -> OreMapFixture {
    let mut rng = fastrand::Rng::with_seed(seed);

    // children[0] belongs to the aggregation, children[i + 1] to member i.
    let mut children: Vec<Vec<String>> = vec![Vec::new(); shape.member_count + 1];
    let mut folders = vec![0usize];
    let mut members = Vec::with_capacity(shape.member_count);
    for ordinal in 0..shape.member_count {
        let id = member_id(collection_id, ordinal);
        let parent = folders[rng.usize(..folders.len())];
        children[parent].push(id.clone());
        if rng.f64() < shape.folder_ratio {
            folders.push(ordinal + 1);
        }
        members.push(generate_member(&mut rng, &id, shape));
    }

    let mut fixture = OreMapFixture::new(collection_id)
        .field("Description", phrase(&mut rng, 12).into())
        .field("Creator", json!([{"name": phrase(&mut rng, 2), "affiliation": null}]));
    if !children[0].is_empty() {
        fixture = fixture.field(HAS_PART, json!(children[0]));
    }
    for (ordinal, mut member) in members.into_iter().enumerate() {
        if !children[ordinal + 1].is_empty() {
            member[HAS_PART] = json!(children[ordinal + 1]);
        }
        fixture = fixture.raw_member(member);
    }
    fixture
}

fn generate_member(rng: &mut fastrand::Rng, id: &str, shape: &CollectionShape) -> Value {
    let keywords = (0..rng.usize(..=shape.max_keywords))
        .map(|_| phrase(rng, 1))
        .collect::<Vec<_>>();
    json!({
        "@id": id,
        "@type": "ore:AggregatedResource",
        "Title": phrase(rng, 3),
        "Keyword": keywords,
        "Size": rng.u64(..1 << 40),
        "Checksum": {"@type": "SHA-1", "@value": format!("{:040x}", rng.u128(..))},
        "Restricted": rng.bool(),
    })
}

fn phrase(rng: &mut fastrand::Rng, words: usize) -> String {
    (0..words.max(1))
        .map(|_| WORDS[rng.usize(..WORDS.len())])
        .collect::<Vec<_>>()
        .join(" ")
}
