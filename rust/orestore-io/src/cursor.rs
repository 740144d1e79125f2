//! Forward-only read cursor over a sequential byte stream.

use std::io::Read;

use orestore_common::{Error, Result};

use crate::utils::{discard, read_fully};

/// A byte-counting read position over a stream that cannot rewind.
///
/// The cursor tracks how many bytes have been consumed from the underlying
/// reader. It can only move forward: [`advance_to`](ForwardCursor::advance_to)
/// rejects targets behind the current position instead of silently reading the
/// wrong bytes, and [`read_window`](ForwardCursor::read_window) consumes the bytes
/// it returns.
///
/// One cursor belongs to one retrieval. It is passed by `&mut` through nested
/// calls and never duplicated, since two copies would disagree about the
/// position.
pub struct ForwardCursor<R> {
    inner: R,
    position: u64,
}

impl<R> ForwardCursor<R> {
    pub fn new(inner: R) -> ForwardCursor<R> {
        ForwardCursor { inner, position: 0 }
    }

    /// Number of bytes consumed from the underlying stream so far.
    pub fn position(&self) -> u64 {
        self.position
    }
}

impl<R: Read> ForwardCursor<R> {
    /// Moves the cursor forward to the absolute offset `target`.
    ///
    /// # Errors
    ///
    /// * `BackwardSeek` if `target` is behind the current position; nothing is
    ///   consumed in that case.
    /// * `UnexpectedEndOfStream` if the stream ends before `target`. The position
    ///   then reflects the bytes actually discarded.
    pub fn advance_to(&mut self, target: u64) -> Result<()> {
        if target < self.position {
            log::trace!("rejecting seek from {} back to {target}", self.position);
            return Err(Error::backward_seek(self.position, target));
        }
        let delta = target - self.position;
        if delta == 0 {
            return Ok(());
        }
        let skipped = discard(&mut self.inner, delta)
            .map_err(|e| Error::io(format!("skip to offset {target}"), e))?;
        self.position += skipped;
        if skipped < delta {
            return Err(Error::unexpected_end_of_stream(self.position, target));
        }
        Ok(())
    }

    /// Reads up to `len` bytes at the current position.
    ///
    /// The returned buffer is shorter than `len` only when the stream ends first;
    /// callers decide whether that is an error.
    pub fn read_window(&mut self, len: u64) -> Result<Vec<u8>> {
        let len = usize::try_from(len)
            .map_err(|_| Error::invalid_arg("len", format!("window of {len} bytes")))?;
        let mut buf = vec![0u8; len];
        let read = read_fully(&mut self.inner, &mut buf)
            .map_err(|e| Error::io(format!("read window at {}", self.position), e))?;
        buf.truncate(read);
        self.position += read as u64;
        Ok(buf)
    }
}
