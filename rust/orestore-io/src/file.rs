use std::{
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

use crate::SealingWrite;

/// A `SealingWrite` that stages its content in a private temporary file next to
/// the destination and renames it into place on `seal()`.
///
/// Concurrent readers of the destination observe either the previous state or the
/// complete new file, never a partial one. Dropping the writer before sealing
/// removes the staged file.
pub struct AtomicFileWriter {
    file: Option<NamedTempFile>,
    target: PathBuf,
}

impl AtomicFileWriter {
    /// Creates a writer for `target`, creating the parent directory if needed.
    pub fn create<P: AsRef<Path>>(target: P) -> std::io::Result<AtomicFileWriter> {
        let target = target.as_ref().to_path_buf();
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;
        let file = tempfile::Builder::new()
            .prefix(".staging-")
            .tempfile_in(&dir)?;
        Ok(AtomicFileWriter {
            file: Some(file),
            target,
        })
    }
}

impl SealingWrite for AtomicFileWriter {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.file
            .as_mut()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))?
            .write_all(buf)
    }

    fn seal(&mut self) -> std::io::Result<()> {
        let mut file = self
            .file
            .take()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))?;
        file.flush()?;
        file.as_file().sync_all()?;
        file.persist(&self.target).map_err(|e| e.error)?;
        log::trace!("published {}", self.target.display());
        Ok(())
    }
}
