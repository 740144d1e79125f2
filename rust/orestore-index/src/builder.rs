use std::io::Read;

use orestore_common::{Error, Result};

use crate::{
    artifacts::{Description, OffsetIndex, OreMapArtifacts},
    tokenizer::{JsonTokenizer, Token, TokenKind},
};

/// Name of the root field holding the aggregation.
pub const DESCRIBES_FIELD: &str = "describes";
/// Name of the aggregation field listing all member objects.
pub const AGGREGATES_FIELD: &str = "aggregates";

/// Configuration of the index builder.
#[derive(Debug, Clone)]
pub struct IndexBuilderParams {
    /// Member fields holding the identifier used as index key, in order of
    /// preference. When a member carries several of them, the earliest listed one
    /// wins regardless of the order of fields in the member object.
    pub identifier_fields: Vec<String>,
}

impl IndexBuilderParams {
    pub fn identifier_priority(&self, field: &str) -> Option<usize> {
        self.identifier_fields.iter().position(|f| f == field)
    }
}

impl Default for IndexBuilderParams {
    fn default() -> IndexBuilderParams {
        IndexBuilderParams {
            identifier_fields: vec!["@id".to_string(), "Identifier".to_string()],
        }
    }
}

/// Builds the description and offset index of an ORE map in a single forward
/// scan.
///
/// # Scan
///
/// 1. The root object is scanned for the `describes` field; every other root
///    field is skipped (but still validated).
/// 2. Each field of `describes` except `aggregates` is copied into the
///    description, in source order.
/// 3. `aggregates` switches to member indexing: for every object in the array
///    the offset of its opening brace is recorded, then the object is scanned with
///    a brace depth counter until it closes, watching the fields at depth 1 for the
///    member identifier.
///
/// Without an `aggregates` field the aggregation has no members and the index is
/// empty.
pub struct IndexBuilder {
    params: IndexBuilderParams,
}

impl IndexBuilder {
    pub fn new(params: IndexBuilderParams) -> IndexBuilder {
        IndexBuilder { params }
    }

    pub fn build<R: Read>(&self, reader: R) -> Result<OreMapArtifacts> {
        let mut tokenizer = JsonTokenizer::new(reader);
        let root = tokenizer.expect_token()?;
        if root.kind != TokenKind::StartObject {
            return Err(Error::invalid_format("ORE map", "root is not a JSON object"));
        }

        let mut artifacts = None;
        loop {
            let token = tokenizer.expect_token()?;
            match token.kind {
                TokenKind::EndObject => break,
                TokenKind::FieldName(name) => {
                    let value = tokenizer.expect_token()?;
                    if name == DESCRIBES_FIELD && artifacts.is_none() {
                        if value.kind != TokenKind::StartObject {
                            return Err(Error::invalid_format(
                                DESCRIBES_FIELD,
                                "aggregation is not a JSON object",
                            ));
                        }
                        log::trace!("describes at {}", value.start);
                        artifacts = Some(self.scan_aggregation(&mut tokenizer)?);
                    } else {
                        tokenizer.skip_value(&value)?;
                    }
                }
                _ => return Err(Error::parse(token.start, "expected a field name")),
            }
        }
        // Drain to end of input so trailing garbage is reported.
        if let Some(token) = tokenizer.next_token()? {
            return Err(Error::parse(token.start, "trailing characters after the root value"));
        }

        let artifacts = artifacts
            .ok_or_else(|| Error::invalid_format("ORE map", "no 'describes' aggregation"))?;
        log::debug!(
            "indexed {} members, description has {} fields",
            artifacts.index.len(),
            artifacts.description.len()
        );
        Ok(artifacts)
    }

    /// Scans the aggregation object; the tokenizer is positioned right after its
    /// opening brace and is left right after its closing brace.
    fn scan_aggregation<R: Read>(
        &self,
        tokenizer: &mut JsonTokenizer<R>,
    ) -> Result<OreMapArtifacts> {
        let mut description = Description::new();
        let mut index = OffsetIndex::new();
        loop {
            let token = tokenizer.expect_token()?;
            let name = match token.kind {
                TokenKind::EndObject => break,
                TokenKind::FieldName(name) => name,
                _ => return Err(Error::parse(token.start, "expected a field name")),
            };
            let value = tokenizer.expect_token()?;
            if name == AGGREGATES_FIELD {
                if value.kind == TokenKind::StartArray {
                    self.index_members(tokenizer, &mut index)?;
                } else {
                    log::warn!(
                        "'{AGGREGATES_FIELD}' at {} is not an array, no members indexed",
                        value.start
                    );
                    tokenizer.skip_value(&value)?;
                }
            } else {
                log::trace!("copying field '{name}'");
                let value = tokenizer.read_value(value)?;
                description.insert(name, value);
            }
        }
        Ok(OreMapArtifacts { description, index })
    }

    /// Indexes the member objects of the `aggregates` array; the tokenizer is
    /// positioned right after the opening bracket.
    fn index_members<R: Read>(
        &self,
        tokenizer: &mut JsonTokenizer<R>,
        index: &mut OffsetIndex,
    ) -> Result<()> {
        loop {
            let token = tokenizer.expect_token()?;
            match token.kind {
                TokenKind::EndArray => return Ok(()),
                TokenKind::StartObject => {
                    let start = token.start;
                    let identifier = self.scan_member(tokenizer)?.ok_or_else(|| {
                        Error::invalid_format(
                            AGGREGATES_FIELD,
                            format!("member object at {start} has no identifier"),
                        )
                    })?;
                    log::trace!("member '{identifier}' at {start}");
                    if !index.push(identifier.as_str(), start)? {
                        log::warn!("duplicate member '{identifier}' at {start} is not indexed");
                    }
                }
                _ => {
                    return Err(Error::invalid_format(
                        AGGREGATES_FIELD,
                        format!("element at {} is not a JSON object", token.start),
                    ));
                }
            }
        }
    }

    /// Scans one member object up to and including its closing brace and returns
    /// its preferred identifier.
    fn scan_member<R: Read>(&self, tokenizer: &mut JsonTokenizer<R>) -> Result<Option<String>> {
        let mut depth = 1usize;
        let mut best: Option<(usize, String)> = None;
        while depth > 0 {
            let token = tokenizer.expect_token()?;
            match token.kind {
                TokenKind::StartObject => depth += 1,
                TokenKind::EndObject => depth -= 1,
                TokenKind::FieldName(ref field) if depth == 1 => {
                    let Some(priority) = self.params.identifier_priority(field) else {
                        continue;
                    };
                    let value = tokenizer.expect_token()?;
                    match value.kind {
                        TokenKind::String(id) => {
                            if best.as_ref().is_none_or(|(p, _)| priority < *p) {
                                best = Some((priority, id));
                            }
                        }
                        _ => {
                            log::warn!("identifier field '{field}' at {} is not a string", token.start);
                            skip_member_value(tokenizer, &value)?;
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(best.map(|(_, id)| id))
    }
}

fn skip_member_value<R: Read>(tokenizer: &mut JsonTokenizer<R>, value: &Token) -> Result<()> {
    if value.kind.is_scalar() {
        return Ok(());
    }
    tokenizer.skip_value(value)
}
