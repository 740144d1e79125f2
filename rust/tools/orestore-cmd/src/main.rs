use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod utils;

use commands::RepositoryArgs;

#[derive(Parser)]
#[command(name = "orestore-cmd")]
#[command(about = "Command-line utility for indexing and querying ORE maps")]
#[command(version)]
struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the description and index artifacts of a standalone ORE map file
    Index {
        /// Member fields used as index key, in order of preference
        #[arg(long = "identifier-field")]
        identifier_fields: Vec<String>,

        /// Directory receiving the artifacts (prints statistics only if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// ORE map file
        file: PathBuf,
    },

    /// Print the collection's own metadata, without members
    Summary {
        #[command(flatten)]
        repository: RepositoryArgs,

        collection: String,
    },

    /// Print the collection with its direct children
    Metadata {
        #[command(flatten)]
        repository: RepositoryArgs,

        collection: String,
    },

    /// Print one member of a collection with its direct children
    Member {
        #[command(flatten)]
        repository: RepositoryArgs,

        collection: String,

        member: String,
    },

    /// Build missing artifacts for many collections
    Warm {
        #[command(flatten)]
        repository: RepositoryArgs,

        /// File with one collection identifier per line
        #[arg(short, long)]
        list: Option<PathBuf>,

        collections: Vec<String>,
    },

    /// Remove the artifacts of a collection so they are rebuilt on next use
    Invalidate {
        #[command(flatten)]
        repository: RepositoryArgs,

        collection: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    utils::init_logging(cli.verbose);

    match cli.command {
        Commands::Index {
            identifier_fields,
            output,
            file,
        } => commands::index::run(identifier_fields, output, file),
        Commands::Summary {
            repository,
            collection,
        } => commands::query::summary(repository, collection),
        Commands::Metadata {
            repository,
            collection,
        } => commands::query::metadata(repository, collection),
        Commands::Member {
            repository,
            collection,
            member,
        } => commands::query::member(repository, collection, member),
        Commands::Warm {
            repository,
            list,
            collections,
        } => commands::cache::warm(repository, list, collections),
        Commands::Invalidate {
            repository,
            collection,
        } => commands::cache::invalidate(repository, collection),
    }
}
