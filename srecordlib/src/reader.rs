//! The `reader` module provides [`LineReader`], a line source with one line of
//! push-back. A record parser reads ahead one line, and if that line belongs to the
//! next record it is returned to the reader so the next parse starts right at it.

use std::io::{self, BufRead};

#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    pending: Option<Vec<u8>>,
}

impl<R: BufRead> LineReader<R> {
    pub const fn new(inner: R) -> Self {
        Self {
            inner,
            pending: None,
        }
    }

    /// Returns the underlying reader. A pushed-back line is lost.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Next raw line including its terminator, or `None` at end of stream.
    ///
    /// # Errors
    /// Propagates I/O errors of the underlying reader.
    pub fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        if let Some(line) = self.pending.take() {
            return Ok(Some(line));
        }
        let mut buf = Vec::new();
        if self.inner.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(buf))
    }

    /// Returns `line` to the reader; the next call to [`next_line`](Self::next_line) yields it again.
    ///
    /// Only one line can be pending at a time, a second push-back replaces the first.
    pub fn push_back(&mut self, line: Vec<u8>) {
        self.pending = Some(line);
    }

    /// True if no pending line is left and the underlying reader is at end of stream.
    ///
    /// # Errors
    /// Propagates I/O errors of the underlying reader.
    pub fn is_exhausted(&mut self) -> io::Result<bool> {
        if self.pending.is_some() {
            return Ok(false);
        }
        Ok(self.inner.fill_buf()?.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_keep_terminator() {
        // Arrange
        let mut reader = LineReader::new("a\nb\r\nc".as_bytes());

        // Act & Assert
        assert_eq!(reader.next_line().unwrap(), Some(b"a\n".to_vec()));
        assert_eq!(reader.next_line().unwrap(), Some(b"b\r\n".to_vec()));
        assert_eq!(reader.next_line().unwrap(), Some(b"c".to_vec()));
        assert_eq!(reader.next_line().unwrap(), None);
        assert!(reader.is_exhausted().unwrap());
    }

    #[test]
    fn test_push_back_is_returned_first() {
        // Arrange
        let mut reader = LineReader::new("first\nsecond\n".as_bytes());

        // Act
        let first = reader.next_line().unwrap().unwrap();
        reader.push_back(first.clone());

        // Assert
        assert!(!reader.is_exhausted().unwrap());
        assert_eq!(reader.next_line().unwrap(), Some(first));
        assert_eq!(reader.next_line().unwrap(), Some(b"second\n".to_vec()));
    }

    #[test]
    fn test_pending_line_at_end_of_stream() {
        // Arrange
        let mut reader = LineReader::new("only\n".as_bytes());
        let line = reader.next_line().unwrap().unwrap();

        // Act
        reader.push_back(line);

        // Assert
        assert!(!reader.is_exhausted().unwrap());
        assert!(reader.next_line().unwrap().is_some());
        assert!(reader.is_exhausted().unwrap());
    }
}
