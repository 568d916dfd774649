use crate::error::{Error, Result};
use crate::stream::StreamReader;
use crate::BitReader;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use log::{debug, trace};
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct Sink {
    bytes: VecDeque<u8>,

    /// Set once the writer is gone
    closed: bool,

    /// Set once the reader is gone; further writes are refused
    reader_closed: bool,
}

type SharedSink = Arc<Mutex<Sink>>;

#[inline]
fn lock(sink: &SharedSink) -> MutexGuard<'_, Sink> {
    // Nothing panics while the lock is held, so a poisoned sink is still
    // consistent
    sink.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Creates a connected producer and consumer pair
///
/// Bytes written to the [`BufferedWriter`] become bits for the
/// [`BufferedReader`]. The writer is not `Clone` and every reader operation
/// takes `&mut self`, so there is always exactly one producer and one
/// consumer.
///
/// ```rust
/// use bitcursor::BitReader;
/// use std::io::Write;
///
/// let (mut writer, mut reader) = bitcursor::buffered();
/// writer.write_all(&[0b1010_0000]).unwrap();
/// assert_eq!(reader.read_u8(3).unwrap(), 0b101);
/// ```
pub fn buffered() -> (BufferedWriter, BufferedReader) {
    BufferedReader::with_capacity(0)
}

/// The byte source a [`BufferedReader`] pulls from
///
/// Reads report [`io::ErrorKind::WouldBlock`] while the sink is empty but
/// still open, and `Ok(0)` once the writer is gone and everything has been
/// drained.
#[derive(Debug)]
pub(crate) struct SinkReader {
    sink: SharedSink,
}

impl SinkReader {
    pub(crate) fn len(&self) -> usize {
        lock(&self.sink).bytes.len()
    }
}

impl Read for SinkReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut sink = lock(&self.sink);
        if sink.bytes.is_empty() && !buf.is_empty() {
            return if sink.closed {
                Ok(0)
            } else {
                Err(io::ErrorKind::WouldBlock.into())
            };
        }

        sink.bytes.read(buf)
    }
}

/// Producer half of a [`buffered`] pair
///
/// Every write appends to the sink and then posts a wake to the reader. Wakes
/// coalesce: any number of writes made before the reader looks leave a
/// single pending wake.
///
/// Dropping the writer closes the sink. The reader then drains what remains
/// and reports end of data instead of blocking. Once the reader is dropped,
/// writes fail with [`io::ErrorKind::BrokenPipe`].
#[derive(Debug)]
pub struct BufferedWriter {
    sink: SharedSink,
    signal: Sender<()>,
}

impl BufferedWriter {
    /// Closes the sink. Equivalent to dropping the writer.
    pub fn close(self) {
        drop(self);
    }

    fn wake(&self) {
        match self.signal.try_send(()) {
            Ok(()) => trace!("posted wake"),
            Err(TrySendError::Full(())) => {}
            Err(TrySendError::Disconnected(())) => debug!("wake posted after reader dropped"),
        }
    }
}

impl Write for BufferedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        {
            let mut sink = lock(&self.sink);
            if sink.reader_closed {
                return Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "buffered reader was dropped",
                ));
            }
            sink.bytes.extend(buf);
        }

        self.wake();
        Ok(buf.len())
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for BufferedWriter {
    fn drop(&mut self) {
        let pending = {
            let mut sink = lock(&self.sink);
            sink.closed = true;
            sink.bytes.len()
        };

        // The sender disconnects once this returns, releasing a reader
        // blocked on the signal
        debug!("closing buffered writer with {} bytes pending", pending);
    }
}

/// Consumer half of a [`buffered`] pair
///
/// Operations are attempted against the bytes written so far. When those
/// aren't enough the reader blocks until the next write (or until the writer
/// is dropped) and tries again. Bits already pulled into the lookahead stay
/// there between attempts, and an interrupted skip resumes where it left
/// off.
///
/// ```rust
/// use bitcursor::BitReader;
/// use std::io::Write;
///
/// let (mut writer, mut reader) = bitcursor::buffered();
/// let consumer = std::thread::spawn(move || {
///     let header = reader.read_u16(12).unwrap();
///     let flag = reader.read_bit().unwrap();
///     (header, flag)
/// });
///
/// writer.write_all(&[0xab]).unwrap();
/// writer.write_all(&[0xc8]).unwrap();
/// assert_eq!(consumer.join().unwrap(), (0xabc, true));
/// ```
#[derive(Debug)]
pub struct BufferedReader {
    inner: StreamReader<SinkReader>,
    signal: Receiver<()>,
}

impl BufferedReader {
    /// Creates a connected pair with room for `capacity` bytes before the
    /// sink reallocates
    pub fn with_capacity(capacity: usize) -> (BufferedWriter, BufferedReader) {
        let sink = Arc::new(Mutex::new(Sink {
            bytes: VecDeque::with_capacity(capacity),
            closed: false,
            reader_closed: false,
        }));
        let (tx, rx) = crossbeam_channel::bounded(1);

        let writer = BufferedWriter {
            sink: Arc::clone(&sink),
            signal: tx,
        };

        let reader = BufferedReader {
            inner: StreamReader::new(SinkReader { sink }),
            signal: rx,
        };

        (writer, reader)
    }

    /// Number of bytes written but not yet pulled into the lookahead
    ///
    /// ```rust
    /// use bitcursor::BitReader;
    /// use std::io::Write;
    ///
    /// let (mut writer, mut reader) = bitcursor::buffered();
    /// writer.write_all(&[0xff; 10]).unwrap();
    /// assert_eq!(reader.len(), 10);
    /// reader.read_bit().unwrap();
    /// assert_eq!(reader.len(), 2);
    /// assert_eq!(reader.bits_buffered(), 79);
    /// ```
    pub fn len(&self) -> usize {
        self.inner.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bits available without blocking: the lookahead plus the unread sink
    pub fn bits_buffered(&self) -> u64 {
        u64::from(self.inner.bits_buffered()) + (self.len() as u64) * 8
    }

    /// Blocks until a write posts a wake or the writer is dropped
    fn wait(&self) {
        trace!("waiting on writer with {} bits buffered", self.inner.bits_buffered());
        if self.signal.recv().is_err() {
            // Disconnected: the sink is closed so the next attempt can't
            // come up short again
            trace!("writer gone, retrying against closed sink");
        }
    }

    fn retry<T, F>(&mut self, mut op: F) -> Result<T>
    where
        F: FnMut(&mut StreamReader<SinkReader>) -> Result<T>,
    {
        loop {
            match op(&mut self.inner) {
                Err(Error::InsufficientData) => self.wait(),
                res => return res,
            }
        }
    }
}

impl Drop for BufferedReader {
    fn drop(&mut self) {
        let discarded = {
            let mut sink = lock(&self.inner.get_ref().sink);
            sink.reader_closed = true;
            let discarded = sink.bytes.len();
            sink.bytes = VecDeque::new();
            discarded
        };

        debug!("closing buffered reader, discarding {} unread bytes", discarded);
    }
}

impl BitReader for BufferedReader {
    fn peek_bits(&mut self, count: u32) -> Result<u64> {
        self.retry(|inner| inner.peek_bits(count))
    }

    fn read_bits(&mut self, count: u32) -> Result<u64> {
        self.retry(|inner| inner.read_bits(count))
    }

    fn skip(&mut self, count: u64) -> Result<()> {
        let mut owed = count;
        self.retry(|inner| inner.skip_owed(&mut owed))
    }

    #[inline]
    fn is_aligned(&self) -> bool {
        self.inner.is_aligned()
    }

    fn align(&mut self) -> Result<u32> {
        self.retry(|inner| inner.align())
    }
}

impl Read for BufferedReader {
    /// Blocks until at least one byte is available (or the writer is gone),
    /// then behaves like [`StreamReader`]'s byte read
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.inner.read(buf) {
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => self.wait(),
                res => return res,
            }
        }
    }
}
