use crate::{Error, Result};
use std::io::{self, ErrorKind, Read};

/// Largest block length accepted from a length prefix.
pub const MAX_BLOCK_LEN: u32 = 64 * 1024 * 1024;

/// Little-endian reader over a container stream.
///
/// Every read names the field being read so that a truncated stream surfaces
/// as a format error pointing at the missing part instead of a bare EOF.
pub struct Reader<R> {
    inner: R,
    position: u64,
}

impl<R: Read> Reader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    pub fn get_position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn read_array<const N: usize>(&mut self, field: &str) -> Result<[u8; N]> {
        let mut buf = [0; N];
        self.fill(&mut buf, field)?;
        Ok(buf)
    }

    pub fn read_u32(&mut self, field: &str) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array::<4>(field)?))
    }

    pub fn skip(&mut self, bytes: u64, field: &str) -> Result<()> {
        let skipped = io::copy(&mut self.inner.by_ref().take(bytes), &mut io::sink())?;
        self.position += skipped;

        if skipped < bytes {
            return Err(Error::format(format!("truncated {field}")));
        }

        Ok(())
    }

    pub fn read_bytes(&mut self, bytes: usize, field: &str) -> Result<Vec<u8>> {
        let mut buf = vec![0; bytes];
        self.fill(&mut buf, field)?;
        Ok(buf)
    }

    /// Reads a `u32` length prefix followed by that many bytes.
    pub fn read_block(&mut self, field: &str) -> Result<Vec<u8>> {
        let len = self.read_u32(field)?;

        if len > MAX_BLOCK_LEN {
            return Err(Error::format(format!("bad block length {len} for {field}")));
        }

        self.read_bytes(len as usize, field)
    }

    pub fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.position += self.inner.read_to_end(&mut buf)? as u64;
        Ok(buf)
    }

    fn fill(&mut self, buf: &mut [u8], field: &str) -> Result<()> {
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.position += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                Err(Error::format(format!("truncated {field}")))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_u32_little_endian() {
        let mut reader = Reader::new(Cursor::new(vec![0x01, 0x02, 0x00, 0x00]));
        assert_eq!(reader.read_u32("length").unwrap(), 0x0201);
        assert_eq!(reader.get_position(), 4);
    }

    #[test]
    fn test_truncated_block() {
        let mut reader = Reader::new(Cursor::new(vec![0x08, 0, 0, 0, 1, 2, 3]));
        let err = reader.read_block("key block").unwrap_err();
        assert!(err.is_format_err());
        assert!(err.to_string().contains("key block"));
    }

    #[test]
    fn test_oversized_block() {
        let mut reader = Reader::new(Cursor::new(vec![0xff, 0xff, 0xff, 0xff]));
        assert!(reader.read_block("cover").unwrap_err().is_format_err());
    }

    #[test]
    fn test_skip_past_end() {
        let mut reader = Reader::new(Cursor::new(vec![0; 3]));
        assert!(reader.skip(9, "gap").is_err());
    }
}
