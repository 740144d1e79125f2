//! Retrieval commands: summary, metadata and member

use anyhow::Result;
use orestore::{
    common::Error,
    repository::{Node, StatusClass},
};

use crate::{commands::RepositoryArgs, utils::print_json};

pub fn summary(args: RepositoryArgs, collection: String) -> Result<()> {
    let repository = args.open()?;
    let node = repository
        .get_aggregation_summary(&collection)
        .map_err(retrieval_error)?;
    emit(node)
}

pub fn metadata(args: RepositoryArgs, collection: String) -> Result<()> {
    let repository = args.open()?;
    let node = repository
        .get_aggregation_with_children(&collection)
        .map_err(retrieval_error)?;
    emit(node)
}

pub fn member(args: RepositoryArgs, collection: String, member: String) -> Result<()> {
    let repository = args.open()?;
    let node = repository
        .get_member(&collection, &member)
        .map_err(retrieval_error)?;
    emit(node)
}

/// Prints the node; unresolved children go to stderr.
fn emit(node: Node) -> Result<()> {
    for unresolved in &node.unresolved {
        eprintln!(
            "unresolved child '{}': {}",
            unresolved.identifier, unresolved.error
        );
    }
    print_json(&node.into_value())
}

fn retrieval_error(error: Error) -> anyhow::Error {
    let status = StatusClass::of(&error).http_status();
    anyhow::Error::new(error).context(format!("Retrieval failed with status {status}"))
}
