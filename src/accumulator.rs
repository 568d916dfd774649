use crate::error::{Error, Result};
use log::trace;
use std::io::{self, Read};

/// Size of the lookahead buffer in bits
pub const BUFFER_BITS: u32 = 64;

/// The widest peek that is possible while the stream is not byte aligned
///
/// An unaligned lookahead holds a partial byte, so only seven whole bytes can
/// be packed in behind it.
///
/// ```rust
/// const _: () = assert!(
///     bitcursor::MAX_UNALIGNED_PEEK_BITS >= 32,
///     "unaligned 32 bit fields should always be peekable"
/// );
/// ```
pub const MAX_UNALIGNED_PEEK_BITS: u32 = 56;

const BUFFER_BYTES: usize = (BUFFER_BITS / 8) as usize;

/// Stages bytes from a source as individually addressable bits
///
/// The lookahead is a single left-justified `u64`: the most significant
/// `remaining` bits are unconsumed data and every bit below them is zero.
/// Bytes are pulled from the source only when a request can't be satisfied
/// by what is already buffered.
///
/// ```rust
/// use bitcursor::BitAccumulator;
/// let mut bits = BitAccumulator::new(&[0b1010_0000, 0xff][..]);
/// assert_eq!(bits.peek(3).unwrap(), 0b101);
/// bits.skip(3).unwrap();
/// assert_eq!(bits.read(13).unwrap(), 0xff);
/// assert!(bits.peek(1).is_err());
/// ```
#[derive(Debug)]
pub struct BitAccumulator<R> {
    /// Current lookahead buffer contents
    buffer: u64,

    /// Number of valid bits in buffer
    remaining: u32,

    source: R,
}

impl<R> BitAccumulator<R> {
    #[inline]
    pub fn new(source: R) -> Self {
        BitAccumulator {
            buffer: 0,
            remaining: 0,
            source,
        }
    }

    /// Number of bits pulled from the source but not yet consumed
    #[inline]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Returns true if the cursor sits on a byte boundary
    #[inline]
    pub fn is_aligned(&self) -> bool {
        self.remaining % 8 == 0
    }

    #[inline]
    pub fn get_ref(&self) -> &R {
        &self.source
    }

    /// Mutable access to the source. Reading from it directly while bits
    /// are buffered will desynchronize the stream.
    #[inline]
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.source
    }

    /// Releases the source. Any buffered bits are lost.
    #[inline]
    pub fn into_inner(self) -> R {
        self.source
    }

    #[inline]
    fn consume(&mut self, count: u32) {
        debug_assert!(count <= self.remaining, "consumed too much data");

        // a full 64 bit shift is an overflow for u64::shl
        self.buffer = self.buffer.checked_shl(count).unwrap_or(0);
        self.remaining -= count;
    }
}

impl<R: Read> BitAccumulator<R> {
    /// Pulls as many whole bytes as fit behind the valid bits with a single
    /// read of the source, returning the number of bytes absorbed.
    ///
    /// A short read is not an error. A source that reports it is exhausted
    /// yields [`Error::EndOfData`] and one that would block yields
    /// [`Error::InsufficientData`].
    pub fn fill(&mut self) -> Result<usize> {
        let mut raw = [0u8; BUFFER_BYTES];
        let capacity = ((BUFFER_BITS - self.remaining) >> 3) as usize;
        if capacity == 0 {
            return Ok(0);
        }

        let read = loop {
            match self.source.read(&mut raw[..capacity]) {
                Ok(0) => {
                    trace!("byte source exhausted with {} bits buffered", self.remaining);
                    return Err(Error::EndOfData);
                }
                Ok(n) => break n.min(capacity),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Err(Error::InsufficientData)
                }
                Err(e) => return Err(Error::Io(e)),
            }
        };

        trace!("filled {} of {} requested bytes", read, capacity);
        for &byte in &raw[..read] {
            let pos = BUFFER_BITS - 8 - self.remaining;
            self.buffer |= u64::from(byte) << pos;
            self.remaining += 8;
        }

        Ok(read)
    }

    /// Returns the next `count` bits (1 to 64 inclusive) in the low bits of
    /// the result without consuming them
    pub fn peek(&mut self, count: u32) -> Result<u64> {
        if count == 0 || count > BUFFER_BITS {
            return Err(Error::WidthOverflow {
                requested: count,
                width: BUFFER_BITS,
            });
        }

        if count > MAX_UNALIGNED_PEEK_BITS && !self.is_aligned() {
            return Err(Error::AlignmentOverflow {
                requested: count,
                remaining: self.remaining,
            });
        }

        while self.remaining < count {
            self.fill()?;
        }

        let shift = BUFFER_BITS - count;
        let mask = u64::MAX << shift;
        Ok((self.buffer & mask) >> shift)
    }

    /// Discards `count` bits, refilling as often as needed
    pub fn skip(&mut self, count: u64) -> Result<()> {
        let mut owed = count;
        self.skip_owed(&mut owed)
    }

    /// Skips until `owed` reaches zero. On failure `owed` holds the bits
    /// still outstanding so the skip can be resumed.
    pub(crate) fn skip_owed(&mut self, owed: &mut u64) -> Result<()> {
        loop {
            let len = (*owed).min(u64::from(self.remaining)) as u32;
            self.consume(len);
            *owed -= u64::from(len);

            if *owed == 0 {
                return Ok(());
            }

            self.fill().map_err(Error::unexpected_eof)?;
        }
    }

    /// Peeks and then consumes `count` bits. Running out of data is always
    /// [`Error::UnexpectedEndOfData`] here.
    pub fn read(&mut self, count: u32) -> Result<u64> {
        let result = self.peek(count).map_err(Error::unexpected_eof)?;
        self.consume(count);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out its data a few bytes at a time
    struct Trickle<'a> {
        data: &'a [u8],
        chunk: usize,
    }

    impl<'a> Read for Trickle<'a> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let len = buf.len().min(self.chunk).min(self.data.len());
            let (head, tail) = self.data.split_at(len);
            buf[..len].copy_from_slice(head);
            self.data = tail;
            Ok(len)
        }
    }

    struct Interrupting {
        interrupted: bool,
    }

    impl Read for Interrupting {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::ErrorKind::Interrupted.into());
            }
            buf[0] = 0xa5;
            Ok(1)
        }
    }

    #[test]
    fn test_fill_packs_below_valid_bits() {
        let mut bits = BitAccumulator::new(&[0xab, 0xcd][..]);
        assert_eq!(bits.fill().unwrap(), 2);
        assert_eq!(bits.remaining(), 16);
        assert_eq!(bits.peek(16).unwrap(), 0xabcd);
    }

    #[test]
    fn test_fill_caps_at_capacity() {
        let data = [0x11u8; 12];
        let mut bits = BitAccumulator::new(&data[..]);
        assert_eq!(bits.fill().unwrap(), 8);
        assert_eq!(bits.remaining(), 64);
        assert_eq!(bits.fill().unwrap(), 0);
        bits.skip(12).unwrap();
        assert_eq!(bits.fill().unwrap(), 1);
        assert_eq!(bits.remaining(), 60);
    }

    #[test]
    fn test_fill_eof() {
        let mut bits = BitAccumulator::new(&[][..]);
        assert!(matches!(bits.fill(), Err(Error::EndOfData)));
    }

    #[test]
    fn test_fill_retries_interrupted() {
        let mut bits = BitAccumulator::new(Interrupting { interrupted: false });
        assert_eq!(bits.fill().unwrap(), 1);
        assert_eq!(bits.peek(8).unwrap(), 0xa5);
    }

    #[test]
    fn test_peek_accumulates_short_reads() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let mut bits = BitAccumulator::new(Trickle {
            data: &data,
            chunk: 3,
        });
        assert_eq!(bits.peek(64).unwrap(), 0x0102_0304_0506_0708);
    }

    #[test]
    fn test_peek_does_not_advance() {
        let mut bits = BitAccumulator::new(&[0b1100_0000][..]);
        assert_eq!(bits.peek(2).unwrap(), 0b11);
        assert_eq!(bits.peek(2).unwrap(), 0b11);
        assert_eq!(bits.remaining(), 8);
    }

    #[test]
    fn test_peek_zero_bits() {
        let mut bits = BitAccumulator::new(&[0xff][..]);
        assert!(matches!(
            bits.peek(0),
            Err(Error::WidthOverflow {
                requested: 0,
                width: 64
            })
        ));
        assert!(matches!(bits.peek(65), Err(Error::WidthOverflow { .. })));
    }

    #[test]
    fn test_unaligned_wide_peek() {
        let data = [0xffu8; 16];
        let mut bits = BitAccumulator::new(&data[..]);
        bits.skip(3).unwrap();
        assert!(matches!(
            bits.peek(57),
            Err(Error::AlignmentOverflow {
                requested: 57,
                remaining: 61
            })
        ));
        assert_eq!(bits.peek(56).unwrap(), (1 << 56) - 1);
        bits.skip(5).unwrap();
        assert_eq!(bits.peek(64).unwrap(), u64::MAX);
    }

    #[test]
    fn test_skip_full_buffer() {
        let data = [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x80];
        let mut bits = BitAccumulator::new(&data[..]);
        assert_eq!(bits.peek(64).unwrap(), u64::MAX);
        bits.skip(64).unwrap();
        assert_eq!(bits.remaining(), 0);
        assert_eq!(bits.peek(1).unwrap(), 1);
    }

    #[test]
    fn test_skip_past_many_fills() {
        let mut data = vec![0u8; 100];
        data.push(0xc0);
        let mut bits = BitAccumulator::new(data.as_slice());
        bits.skip(800).unwrap();
        assert_eq!(bits.read(2).unwrap(), 0b11);
    }

    #[test]
    fn test_skip_owed_reports_progress() {
        let mut bits = BitAccumulator::new(&[0xff, 0xff][..]);
        let mut owed = 20;
        assert!(matches!(
            bits.skip_owed(&mut owed),
            Err(Error::UnexpectedEndOfData)
        ));
        assert_eq!(owed, 4);
    }

    #[test]
    fn test_read_eof_is_unexpected() {
        let mut bits = BitAccumulator::new(&[0x01][..]);
        assert!(matches!(bits.read(9), Err(Error::UnexpectedEndOfData)));
        assert_eq!(bits.read(8).unwrap(), 0x01);
        assert!(matches!(bits.peek(1), Err(Error::EndOfData)));
    }
}
