//! Refillable byte buffer over any reader, with a few bytes of lookahead.

use std::io::{self, Read};

const CAPACITY: usize = 64 * 1024;

/// Pull-based byte source. Never holds more than one buffer of input.
pub(crate) struct ByteSource<R> {
    reader: R,
    buf: Box<[u8]>,
    start: usize,
    end: usize,
    consumed: u64,
    eof: bool,
}

impl<R: Read> ByteSource<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            reader,
            buf: vec![0; CAPACITY].into_boxed_slice(),
            start: 0,
            end: 0,
            consumed: 0,
            eof: false,
        }
    }

    /// Byte offset of the next unconsumed byte.
    pub(crate) fn position(&self) -> u64 {
        self.consumed
    }

    /// The byte `ahead` positions past the cursor, or `None` past the end.
    pub(crate) fn peek_at(&mut self, ahead: usize) -> io::Result<Option<u8>> {
        while self.end - self.start <= ahead {
            if self.eof {
                return Ok(None);
            }
            self.fill()?;
        }
        Ok(Some(self.buf[self.start + ahead]))
    }

    /// Consume one byte previously returned by [`Self::peek_at`].
    pub(crate) fn bump(&mut self) {
        debug_assert!(self.start < self.end, "bump past buffered input");
        self.start += 1;
        self.consumed += 1;
    }

    fn fill(&mut self) -> io::Result<()> {
        if self.start > 0 {
            self.buf.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
        loop {
            match self.reader.read(&mut self.buf[self.end..]) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(());
                }
                Ok(read) => {
                    self.end += read;
                    return Ok(());
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out one byte per read call.
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.split_first() {
                Some((first, rest)) if !buf.is_empty() => {
                    buf[0] = *first;
                    self.0 = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    #[test]
    fn test_lookahead_across_reads() {
        let mut source = ByteSource::new(Trickle(b"abc"));
        assert_eq!(source.peek_at(2).unwrap(), Some(b'c'));
        assert_eq!(source.peek_at(0).unwrap(), Some(b'a'));
        source.bump();
        assert_eq!(source.position(), 1);
        assert_eq!(source.peek_at(1).unwrap(), Some(b'c'));
        assert_eq!(source.peek_at(2).unwrap(), None);
    }

    #[test]
    fn test_end_is_repeatable() {
        let mut source = ByteSource::new(&b"x"[..]);
        source.peek_at(0).unwrap();
        source.bump();
        assert_eq!(source.peek_at(0).unwrap(), None);
        assert_eq!(source.peek_at(0).unwrap(), None);
    }

    #[test]
    fn test_read_error_surfaces() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("boom"))
            }
        }
        let mut source = ByteSource::new(Broken);
        assert!(source.peek_at(0).is_err());
    }
}
