/// Reads until `buffer` is full or the reader reports end of stream.
///
/// Short reads and `Interrupted` are retried; the returned count is smaller than
/// `buffer.len()` only at end of stream.
pub fn read_fully<R: std::io::Read + ?Sized>(
    read: &mut R,
    buffer: &mut [u8],
) -> std::io::Result<usize> {
    let mut pos: usize = 0;
    while pos < buffer.len() {
        match read.read(&mut buffer[pos..]) {
            Ok(0) => return Ok(pos),
            Ok(bytes) => pos += bytes,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(pos)
}

/// Discards up to `count` bytes from the reader, returning how many were discarded.
///
/// The result is smaller than `count` only at end of stream.
pub fn discard<R: std::io::Read + ?Sized>(read: &mut R, count: u64) -> std::io::Result<u64> {
    let mut scratch = [0u8; 8 * 1024];
    let mut remaining = count;
    while remaining > 0 {
        let chunk = remaining.min(scratch.len() as u64) as usize;
        match read.read(&mut scratch[..chunk]) {
            Ok(0) => break,
            Ok(bytes) => remaining -= bytes as u64,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(count - remaining)
}


#[cfg(test)]
mod tests {
    use super::{discard, read_fully, test_readers::TrickleReader};

    #[test]
    fn test_read_fully_short_reads() {
        let data = b"0123456789";
        let mut reader = TrickleReader::new(data, 3);
        let mut buf = [0u8; 8];
        assert_eq!(read_fully(&mut reader, &mut buf).unwrap(), 8);
        assert_eq!(&buf, b"01234567");
        let mut rest = [0u8; 8];
        assert_eq!(read_fully(&mut reader, &mut rest).unwrap(), 2);
        assert_eq!(&rest[..2], b"89");
    }

    #[test]
    fn test_discard() {
        let data = vec![7u8; 20_000];
        let mut reader = TrickleReader::new(&data, 5000);
        assert_eq!(discard(&mut reader, 12_345).unwrap(), 12_345);
        assert_eq!(discard(&mut reader, 12_345).unwrap(), 20_000 - 12_345);
        assert_eq!(discard(&mut reader, 1).unwrap(), 0);
    }
}
