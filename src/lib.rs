/*!

***Bit level cursors over byte streams***

Bitcursor turns anything that implements [`std::io::Read`] into a stream of
bits that can be peeked, skipped, and read in arbitrary widths from 1 to 64
bits, with no regard for byte boundaries. Bits are read most significant bit
first, the layout used by most video and audio bitstreams.

## Features

 - ✔ peek at up to 64 bits without consuming them
 - ✔ skip any number of bits
 - ✔ width checked reads into `bool`, `u8`, `u16`, `u32`, and `u64`
 - ✔ interleave bit reads with plain byte reads through [`std::io::Read`]
 - ✔ a buffered reader that one thread can feed while another decodes
 - ✔ no allocations in the bit reading path

## Example

```rust
use bitcursor::{BitReader, StreamReader};
let mut bits = StreamReader::new(&[0b1011_0011, 0xab, 0xcd][..]);
assert_eq!(bits.read_bit().unwrap(), true);
assert_eq!(bits.peek_u8(3).unwrap(), 0b011);
assert_eq!(bits.read_u8(7).unwrap(), 0b011_0011);
assert!(bits.is_aligned());
assert_eq!(bits.read_u16(16).unwrap(), 0xabcd);
```

Running out of data has two flavors. A peek that finds nothing left is
[`Error::EndOfData`], a legitimate answer for a decoder probing whether
another record follows. A read or skip that runs out is
[`Error::UnexpectedEndOfData`]: the caller committed to data that isn't
there.

```rust
use bitcursor::{BitReader, Error, StreamReader};
let mut bits = StreamReader::new(&[0x01][..]);
bits.skip(8).unwrap();
assert!(matches!(bits.peek_u8(8), Err(Error::EndOfData)));
assert!(matches!(bits.read_u8(8), Err(Error::UnexpectedEndOfData)));
```

Byte reads realign to the next byte boundary and then drain the lookahead
before falling through to the source:

```rust
use bitcursor::{BitReader, StreamReader};
use std::io::Read;

let data: Vec<u8> = (1..=10).collect();
let mut bits = StreamReader::new(data.as_slice());
bits.skip(20).unwrap();

let mut buf = [0u8; 5];
bits.read_exact(&mut buf).unwrap();
assert_eq!(buf, [4, 5, 6, 7, 8]);
```

## Producer and consumer

[`buffered`] splits a reader into a [`BufferedWriter`] for a producer thread
and a [`BufferedReader`] for a consumer thread. The consumer blocks only while
too few bytes have been written to satisfy the current request.

```rust
use bitcursor::BitReader;
use std::io::Write;

let (mut writer, mut reader) = bitcursor::buffered();
let producer = std::thread::spawn(move || {
    writer.write_all(&[0xde, 0xad]).unwrap();
    writer.write_all(&[0xbe, 0xef]).unwrap();
});

assert_eq!(reader.read_u32(32).unwrap(), 0xdead_beef);
producer.join().unwrap();
```
*/

mod accumulator;
mod buffered;
mod error;
mod stream;

pub use accumulator::{BitAccumulator, BUFFER_BITS, MAX_UNALIGNED_PEEK_BITS};
pub use buffered::{buffered, BufferedReader, BufferedWriter};
pub use error::{Error, Result};
pub use stream::StreamReader;

#[inline]
fn check_width(count: u32, width: u32) -> Result<()> {
    if count == 0 || count > width {
        Err(Error::WidthOverflow {
            requested: count,
            width,
        })
    } else {
        Ok(())
    }
}

macro_rules! gen_width {
    ($peek:ident, $read:ident, $t:ty, $doc:expr) => {
        #[doc = concat!("Peeks at 1 to ", $doc, " bits without consuming them")]
        #[inline]
        fn $peek(&mut self, count: u32) -> Result<$t> {
            check_width(count, <$t>::BITS)?;
            self.peek_bits(count).map(|x| x as $t)
        }

        #[doc = concat!("Consumes 1 to ", $doc, " bits")]
        #[inline]
        fn $read(&mut self, count: u32) -> Result<$t> {
            check_width(count, <$t>::BITS)?;
            self.read_bits(count).map(|x| x as $t)
        }
    };
}

/// Read bits most significant bit first
///
/// The width typed methods (`peek_u8` ... `read_u64`) reject a bit count of
/// zero or one wider than their result type with [`Error::WidthOverflow`].
/// Results occupy the low bits of the returned integer.
pub trait BitReader {
    /// Returns the next `count` bits (1 to 64 inclusive) without advancing
    ///
    /// ```rust
    /// use bitcursor::{BitReader, StreamReader};
    /// let mut bits = StreamReader::new(&[0xf0][..]);
    /// assert_eq!(bits.peek_bits(4).unwrap(), 0xf);
    /// assert_eq!(bits.peek_bits(4).unwrap(), 0xf);
    /// ```
    fn peek_bits(&mut self, count: u32) -> Result<u64>;

    /// Returns the next `count` bits (1 to 64 inclusive) and advances past
    /// them. Equivalent to [`peek_bits`](BitReader::peek_bits) followed by
    /// [`skip`](BitReader::skip).
    ///
    /// ```rust
    /// use bitcursor::{BitReader, StreamReader};
    /// let mut bits = StreamReader::new(&[0xf0][..]);
    /// assert_eq!(bits.read_bits(4).unwrap(), 0xf);
    /// assert_eq!(bits.read_bits(4).unwrap(), 0x0);
    /// ```
    fn read_bits(&mut self, count: u32) -> Result<u64>;

    /// Advances the stream by `count` bits. Unlike peeks and reads, the
    /// count is unbounded.
    ///
    /// Bits skipped before a failure stay skipped. If a non-blocking source
    /// interrupts a skip with [`Error::InsufficientData`], retrying with the
    /// same count skips those bits twice; [`BufferedReader`] resumes an
    /// interrupted skip on its own.
    ///
    /// ```rust
    /// use bitcursor::{BitReader, StreamReader};
    /// let mut bits = StreamReader::new(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 0x80][..]);
    /// bits.skip(72).unwrap();
    /// assert_eq!(bits.read_bit().unwrap(), true);
    /// ```
    fn skip(&mut self, count: u64) -> Result<()>;

    /// Returns true if the reader is not partway through a byte
    ///
    /// ```rust
    /// use bitcursor::{BitReader, StreamReader};
    /// let mut bits = StreamReader::new(&[0b1010_1010][..]);
    /// assert!(bits.is_aligned());
    /// bits.read_bit().unwrap();
    /// assert!(!bits.is_aligned());
    /// ```
    fn is_aligned(&self) -> bool;

    /// Skips to the next byte boundary and returns how many bits were
    /// skipped (0 to 7)
    ///
    /// ```rust
    /// use bitcursor::{BitReader, StreamReader};
    /// let mut bits = StreamReader::new(&[0b1010_1010, 0xcc][..]);
    /// assert_eq!(bits.align().unwrap(), 0);
    /// bits.read_u8(3).unwrap();
    /// assert_eq!(bits.align().unwrap(), 5);
    /// assert_eq!(bits.read_u8(8).unwrap(), 0xcc);
    /// ```
    fn align(&mut self) -> Result<u32>;

    /// Returns if the next bit is set without consuming it
    #[inline]
    fn peek_bit(&mut self) -> Result<bool> {
        self.peek_bits(1).map(|x| x == 1)
    }

    /// Consumes a bit and returns if it was set
    ///
    /// ```rust
    /// use bitcursor::{BitReader, StreamReader};
    /// let mut bits = StreamReader::new(&[0b1001_0011][..]);
    /// assert_eq!(bits.read_bit().unwrap(), true);
    /// assert_eq!(bits.read_bit().unwrap(), false);
    /// ```
    #[inline]
    fn read_bit(&mut self) -> Result<bool> {
        self.read_bits(1).map(|x| x == 1)
    }

    gen_width!(peek_u8, read_u8, u8, "8");
    gen_width!(peek_u16, read_u16, u16, "16");
    gen_width!(peek_u32, read_u32, u32, "32");
    gen_width!(peek_u64, read_u64, u64, "64");
}
