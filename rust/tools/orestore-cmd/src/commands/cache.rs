//! Artifact cache maintenance: warm and invalidate

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::commands::RepositoryArgs;

pub fn warm(args: RepositoryArgs, list: Option<PathBuf>, mut collections: Vec<String>) -> Result<()> {
    if let Some(list) = list {
        let text = std::fs::read_to_string(&list)
            .with_context(|| format!("Failed to read {}", list.display()))?;
        collections.extend(read_collection_list(&text));
    }
    if collections.is_empty() {
        anyhow::bail!("No collections given");
    }

    let repository = args.open()?;
    let results = repository.warm(&collections);
    let mut failed = 0;
    for (collection, result) in collections.iter().zip(results) {
        match result {
            Ok(paths) => println!("{collection}\t{}", paths.index.display()),
            Err(e) => {
                failed += 1;
                eprintln!("{collection}\tfailed: {e}");
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} collections failed", collections.len());
    }
    Ok(())
}

pub fn invalidate(args: RepositoryArgs, collection: String) -> Result<()> {
    let repository = args.open()?;
    let removed = repository.invalidate(&collection)?;
    println!(
        "{collection}\t{}",
        if removed { "invalidated" } else { "not cached" }
    );
    Ok(())
}

/// One identifier per line; blank lines and `#` comments are skipped.
fn read_collection_list(text: &str) -> impl Iterator<Item = String> + '_ {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use orestore_testkit::OreMapFixture;

    use super::*;

    #[test]
    fn test_read_collection_list() {
        let ids = read_collection_list("# published\ndoi:1\n\n  doi:2  \n").collect::<Vec<_>>();
        assert_eq!(ids, vec!["doi:1", "doi:2"]);
    }

    #[test]
    fn test_warm_and_invalidate() {
        let dir = tempfile::TempDir::new().unwrap();
        OreMapFixture::new("doi:1")
            .member("doi:1/a", &[])
            .publish(dir.path())
            .unwrap();
        let args = RepositoryArgs {
            data_path: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        warm(args.clone(), None, vec!["doi:1".to_string()]).unwrap();
        assert!(args.open().unwrap().cache().artifact_paths("doi:1").exist());
        invalidate(args.clone(), "doi:1".to_string()).unwrap();
        assert!(!args.open().unwrap().cache().artifact_paths("doi:1").exist());

        assert!(warm(args, None, vec!["doi:missing".to_string()]).is_err());
    }
}
