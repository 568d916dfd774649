use crate::accumulator::BitAccumulator;
use crate::error::Result;
use crate::BitReader;
use log::debug;
use std::io::{self, Read};

/// Reads bits from any [`Read`] implementation
///
/// The reader itself implements [`Read`], so it can be handed to anything
/// that consumes bytes once the bit level fields have been decoded.
///
/// ```rust
/// use bitcursor::{BitReader, StreamReader};
/// use std::io::Read;
///
/// let mut bits = StreamReader::new(&[0b1100_0001, 0xaa, 0xbb][..]);
/// assert_eq!(bits.read_u8(2).unwrap(), 0b11);
///
/// let mut rest = Vec::new();
/// bits.read_to_end(&mut rest).unwrap();
/// assert_eq!(rest, vec![0xaa, 0xbb]);
/// ```
#[derive(Debug)]
pub struct StreamReader<R> {
    bits: BitAccumulator<R>,
}

impl<R> StreamReader<R> {
    #[inline]
    pub fn new(source: R) -> Self {
        StreamReader {
            bits: BitAccumulator::new(source),
        }
    }

    /// Number of bits pulled from the source that have not been consumed
    ///
    /// ```rust
    /// use bitcursor::{BitReader, StreamReader};
    /// let mut bits = StreamReader::new(&[0xff, 0xff][..]);
    /// assert_eq!(bits.bits_buffered(), 0);
    /// bits.read_u8(3).unwrap();
    /// assert_eq!(bits.bits_buffered(), 13);
    /// ```
    #[inline]
    pub fn bits_buffered(&self) -> u32 {
        self.bits.remaining()
    }

    #[inline]
    pub fn get_ref(&self) -> &R {
        self.bits.get_ref()
    }

    /// Mutable access to the source. Reading from it directly while bits
    /// are buffered will desynchronize the stream.
    #[inline]
    pub fn get_mut(&mut self) -> &mut R {
        self.bits.get_mut()
    }

    /// Releases the source. Any buffered bits are lost.
    #[inline]
    pub fn into_inner(self) -> R {
        self.bits.into_inner()
    }
}

impl<R: Read> StreamReader<R> {
    /// Resumable skip for callers that retry on insufficient data
    #[inline]
    pub(crate) fn skip_owed(&mut self, owed: &mut u64) -> Result<()> {
        self.bits.skip_owed(owed)
    }
}

impl<R: Read> BitReader for StreamReader<R> {
    #[inline]
    fn peek_bits(&mut self, count: u32) -> Result<u64> {
        self.bits.peek(count)
    }

    #[inline]
    fn read_bits(&mut self, count: u32) -> Result<u64> {
        self.bits.read(count)
    }

    #[inline]
    fn skip(&mut self, count: u64) -> Result<()> {
        self.bits.skip(count)
    }

    #[inline]
    fn is_aligned(&self) -> bool {
        self.bits.is_aligned()
    }

    #[inline]
    fn align(&mut self) -> Result<u32> {
        let count = self.bits.remaining() % 8;
        self.bits.skip(u64::from(count))?;
        Ok(count)
    }
}

impl<R: Read> Read for StreamReader<R> {
    /// Discards any partial byte, drains whole bytes from the lookahead, and
    /// reads the remainder of `buf` straight from the source.
    ///
    /// If bytes were drained before the source failed, the drained count is
    /// returned and the source's error is left for the next call.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.align()?;

        let lookahead_bytes = ((self.bits.remaining() >> 3) as usize).min(buf.len());
        let (head, tail) = buf.split_at_mut(lookahead_bytes);
        for dst in head.iter_mut() {
            *dst = self.read_u8(8)?;
        }

        if tail.is_empty() {
            return Ok(lookahead_bytes);
        }

        // The lookahead is empty now, so the source is positioned exactly
        // at the next unread byte
        match self.bits.get_mut().read(tail) {
            Ok(n) => Ok(lookahead_bytes + n),
            Err(e) if lookahead_bytes > 0 => {
                debug!("deferring source error after {} bytes: {}", lookahead_bytes, e);
                Ok(lookahead_bytes)
            }
            Err(e) => Err(e),
        }
    }
}
