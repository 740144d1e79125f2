//! I/O abstractions:
//! - `ForwardCursor`: byte-counting, seek-forward-only read position over a sequential stream.
//! - `SealingWrite`: sequential writer with a `seal()` operation, committing the write activity.
//!
//! Provides a memory-based writer and a file-based writer that publishes atomically on seal.

pub mod cursor;
pub mod file;
pub mod utils;

pub use cursor::ForwardCursor;
pub use file::AtomicFileWriter;

/// A trait for sequential writing with explicit sealing semantics.
///
/// Data appended through [`write_all`](SealingWrite::write_all) becomes visible to
/// readers only once [`seal`](SealingWrite::seal) succeeds. A writer dropped before
/// sealing must leave no trace at its destination, so an interrupted artifact build
/// never exposes a partial file.
pub trait SealingWrite: Send {
    /// Appends the entire buffer to the pending content.
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()>;

    /// Flushes the pending content and publishes it at the destination.
    ///
    /// Once sealed, the writer does not accept further writes.
    fn seal(&mut self) -> std::io::Result<()>;
}

impl SealingWrite for Vec<u8> {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.extend_from_slice(buf);
        Ok(())
    }

    fn seal(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
