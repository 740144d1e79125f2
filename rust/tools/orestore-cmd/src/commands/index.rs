//! Index command implementation

use std::{fs::File, path::PathBuf};

use anyhow::{Context, Result};
use orestore::{
    archive::layout::{DESCRIPTION_SUFFIX, INDEX_SUFFIX, bag_name},
    index::{IndexBuilder, IndexBuilderParams},
    io::{AtomicFileWriter, SealingWrite},
};
use serde::Serialize;

use crate::utils::{format_size, print_json, validate_file_exists};

#[derive(Serialize)]
struct IndexSummary {
    file: String,
    size: String,
    description_fields: Vec<String>,
    member_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_member: Option<MemberInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_member: Option<MemberInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    artifacts: Vec<String>,
}

#[derive(Serialize)]
struct MemberInfo {
    identifier: String,
    offset: u64,
}

pub fn run(
    identifier_fields: Vec<String>,
    output: Option<PathBuf>,
    file: PathBuf,
) -> Result<()> {
    validate_file_exists(&file)?;
    let size = std::fs::metadata(&file)?.len();

    let mut params = IndexBuilderParams::default();
    if !identifier_fields.is_empty() {
        params.identifier_fields = identifier_fields;
    }
    let reader = File::open(&file).with_context(|| format!("Failed to open {}", file.display()))?;
    let artifacts = IndexBuilder::new(params)
        .build(reader)
        .with_context(|| format!("Failed to index {}", file.display()))?;

    let mut written = Vec::new();
    if let Some(dir) = output {
        let stem = artifact_stem(&file);
        let description_path = dir.join(format!("{stem}{DESCRIPTION_SUFFIX}"));
        let index_path = dir.join(format!("{stem}{INDEX_SUFFIX}"));

        let mut writer = AtomicFileWriter::create(&index_path)?;
        artifacts.write_index(&mut writer)?;
        writer.seal()?;
        let mut writer = AtomicFileWriter::create(&description_path)?;
        artifacts.write_description(&mut writer)?;
        writer.seal()?;

        written.push(index_path.display().to_string());
        written.push(description_path.display().to_string());
    }

    let member_info = |(identifier, offset): (&str, u64)| MemberInfo {
        identifier: identifier.to_string(),
        offset,
    };
    let summary = IndexSummary {
        file: file.display().to_string(),
        size: format_size(size),
        description_fields: artifacts.description.keys().cloned().collect(),
        member_count: artifacts.index.len(),
        first_member: artifacts.index.iter().next().map(member_info),
        last_member: artifacts.index.iter().last().map(member_info),
        artifacts: written,
    };
    print_json(&summary)
}

/// Artifact file stem for a standalone ORE map: the file name without its
/// ORE map suffix, made file-name safe.
fn artifact_stem(file: &std::path::Path) -> String {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = name
        .strip_suffix(".oremap.jsonld.txt")
        .or_else(|| name.strip_suffix(".json"))
        .unwrap_or(&name);
    bag_name(name)
}
