// Byte stream access for the interpreter
//
// The interpreter reads the stream through this trait only. The cursor,
// endianness and eof flag live behind it so hosts can supply file-backed
// or memory-backed implementations.

use crate::error::{ErrorKind, InterpretError};

/// Byte order used to decode multi-byte reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// Cursor-based access to the byte stream under interpretation.
pub trait Stream {
    /// Total stream length in bytes.
    fn size(&self) -> u64;

    /// Current cursor position.
    fn offset(&self) -> u64;

    /// True at or past the end of the stream, or after a clamped seek.
    fn at_eof(&self) -> bool;

    /// Absolute positioning. Seeking past `size()` clamps to the end and
    /// sets a sticky eof flag; an in-bounds seek clears it.
    fn seek(&mut self, pos: u64);

    fn endian(&self) -> Endianness;

    fn set_endian(&mut self, endian: Endianness);

    /// Read exactly `n` bytes at the cursor, advancing it.
    /// A short read fails with `Eof` and leaves the cursor unmoved.
    fn read(&mut self, n: u64) -> Result<Vec<u8>, InterpretError>;

    /// Read a string at the cursor. `max_len < 0` reads until NUL and fails
    /// with `Eof` if the stream ends first; otherwise reads up to `max_len`
    /// bytes, stopping at NUL, returning what was read even on a short
    /// stream. The returned bytes exclude the terminator; the cursor is
    /// advanced past it.
    fn read_string(&mut self, max_len: i64) -> Result<Vec<u8>, InterpretError>;
}

/// Run `f` with the cursor restored to its current position afterwards,
/// on every exit path. This is the no-seek discipline required by the
/// `ReadInt` family of built-ins.
pub fn with_restored_offset<S, T>(stream: &mut S, f: impl FnOnce(&mut S) -> T) -> T
where
    S: Stream + ?Sized,
{
    let saved = stream.offset();
    let result = f(stream);
    stream.seek(saved);
    result
}

/// Memory-backed stream over a borrowed byte slice.
pub struct SliceStream<'a> {
    data: &'a [u8],
    offset: u64,
    endian: Endianness,
    sticky_eof: bool,
}

impl<'a> SliceStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            endian: Endianness::Little,
            sticky_eof: false,
        }
    }
}

impl<'a> Stream for SliceStream<'a> {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn at_eof(&self) -> bool {
        self.sticky_eof || self.offset >= self.size()
    }

    fn seek(&mut self, pos: u64) {
        if pos >= self.size() {
            self.offset = self.size();
            self.sticky_eof = true;
        } else {
            self.offset = pos;
            self.sticky_eof = false;
        }
    }

    fn endian(&self) -> Endianness {
        self.endian
    }

    fn set_endian(&mut self, endian: Endianness) {
        self.endian = endian;
    }

    fn read(&mut self, n: u64) -> Result<Vec<u8>, InterpretError> {
        let start = self.offset as usize;
        let end = start.saturating_add(n as usize);
        if end > self.data.len() {
            return Err(InterpretError::new(
                ErrorKind::Eof,
                format!(
                    "short read: {} bytes requested, {} available",
                    n,
                    self.data.len().saturating_sub(start)
                ),
            )
            .at_offset(self.offset));
        }
        self.offset = end as u64;
        Ok(self.data[start..end].to_vec())
    }

    fn read_string(&mut self, max_len: i64) -> Result<Vec<u8>, InterpretError> {
        let start = self.offset as usize;
        let mut bytes = Vec::new();
        let mut pos = start;
        loop {
            if max_len >= 0 && bytes.len() as i64 >= max_len {
                break;
            }
            match self.data.get(pos) {
                Some(0) => {
                    pos += 1;
                    break;
                }
                Some(&b) => {
                    bytes.push(b);
                    pos += 1;
                }
                None => {
                    if max_len < 0 {
                        return Err(InterpretError::new(
                            ErrorKind::Eof,
                            "unterminated string: end of stream before NUL",
                        )
                        .at_offset(start as u64));
                    }
                    break;
                }
            }
        }
        self.offset = pos as u64;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_advances_cursor() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut s = SliceStream::new(&data);
        assert_eq!(s.read(2).unwrap(), vec![0x01, 0x02]);
        assert_eq!(s.offset(), 2);
        assert_eq!(s.read(2).unwrap(), vec![0x03, 0x04]);
        assert!(s.at_eof());
    }

    #[test]
    fn test_short_read_fails_cursor_unmoved() {
        let data = [0x01, 0x02];
        let mut s = SliceStream::new(&data);
        let err = s.read(4).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Eof);
        assert_eq!(s.offset(), 0);
    }

    #[test]
    fn test_seek_clamps_and_sets_sticky_eof() {
        let data = [0u8; 8];
        let mut s = SliceStream::new(&data);
        s.seek(100);
        assert_eq!(s.offset(), 8);
        assert!(s.at_eof());
        s.seek(3);
        assert_eq!(s.offset(), 3);
        assert!(!s.at_eof());
    }

    #[test]
    fn test_with_restored_offset_on_success() {
        let data = [0u8; 8];
        let mut s = SliceStream::new(&data);
        s.seek(2);
        let read = with_restored_offset(&mut s, |s| s.read(4));
        assert!(read.is_ok());
        assert_eq!(s.offset(), 2);
    }

    #[test]
    fn test_with_restored_offset_on_error() {
        let data = [0u8; 4];
        let mut s = SliceStream::new(&data);
        s.seek(1);
        let read = with_restored_offset(&mut s, |s| {
            s.seek(3);
            s.read(10)
        });
        assert!(read.is_err());
        assert_eq!(s.offset(), 1);
    }

    #[test]
    fn test_read_string_until_nul() {
        let data = b"hi\0rest";
        let mut s = SliceStream::new(data);
        assert_eq!(s.read_string(-1).unwrap(), b"hi".to_vec());
        assert_eq!(s.offset(), 3);
    }

    #[test]
    fn test_read_string_unterminated_fails() {
        let data = b"abc";
        let mut s = SliceStream::new(data);
        assert_eq!(s.read_string(-1).unwrap_err().kind, ErrorKind::Eof);
    }

    #[test]
    fn test_read_string_bounded() {
        let data = b"abcdef";
        let mut s = SliceStream::new(data);
        assert_eq!(s.read_string(4).unwrap(), b"abcd".to_vec());
        assert_eq!(s.offset(), 4);
    }

    #[test]
    fn test_read_string_bounded_stops_at_nul() {
        let data = b"ab\0def";
        let mut s = SliceStream::new(data);
        assert_eq!(s.read_string(4).unwrap(), b"ab".to_vec());
        assert_eq!(s.offset(), 3);
    }

    #[test]
    fn test_read_string_bounded_short_stream_returns_partial() {
        let data = b"ab";
        let mut s = SliceStream::new(data);
        assert_eq!(s.read_string(10).unwrap(), b"ab".to_vec());
        assert_eq!(s.offset(), 2);
    }

    #[test]
    fn test_set_endian_idempotent() {
        let data = [0u8; 1];
        let mut s = SliceStream::new(&data);
        s.set_endian(Endianness::Big);
        s.set_endian(Endianness::Big);
        assert_eq!(s.endian(), Endianness::Big);
    }
}
