use std::io;

/// The ways a bit read can fail
///
/// The two end of data variants are intentionally distinct: a decoder that
/// only peeked at the next field can treat [`Error::EndOfData`] as "no more
/// records", while [`Error::UnexpectedEndOfData`] means a record was cut off.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// More bits were requested than the result type holds (or zero bits
    /// were requested)
    #[error("cannot request {requested} bits from a {width} bit read")]
    WidthOverflow { requested: u32, width: u32 },

    /// A peek or read wider than 56 bits while the stream was not byte
    /// aligned. The 64 bit lookahead can't absorb enough whole bytes to
    /// satisfy it.
    #[error("cannot peek {requested} bits with {remaining} unaligned bits buffered")]
    AlignmentOverflow { requested: u32, remaining: u32 },

    /// The byte source is exhausted and the peek could not be satisfied
    #[error("end of data")]
    EndOfData,

    /// The byte source ran out in the middle of a committed read or skip
    #[error("unexpected end of data")]
    UnexpectedEndOfData,

    /// The byte source has nothing available right now, but may later
    #[error("insufficient data available")]
    InsufficientData,

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns true for either flavor of end of data
    ///
    /// ```rust
    /// use bitcursor::Error;
    /// assert!(Error::EndOfData.is_end_of_data());
    /// assert!(Error::UnexpectedEndOfData.is_end_of_data());
    /// assert!(!Error::InsufficientData.is_end_of_data());
    /// ```
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, Error::EndOfData | Error::UnexpectedEndOfData)
    }

    /// Upgrades a probe's end of data into a committed read's end of data
    pub(crate) fn unexpected_eof(self) -> Self {
        match self {
            Error::EndOfData => Error::UnexpectedEndOfData,
            e => e,
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match err {
            Error::Io(e) => return e,
            Error::InsufficientData => io::ErrorKind::WouldBlock,
            Error::EndOfData | Error::UnexpectedEndOfData => io::ErrorKind::UnexpectedEof,
            Error::WidthOverflow { .. } | Error::AlignmentOverflow { .. } => {
                io::ErrorKind::InvalidInput
            }
        };

        io::Error::new(kind, err)
    }
}

/// Result alias used throughout the crate
pub type Result<T> = core::result::Result<T, Error>;
