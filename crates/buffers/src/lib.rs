//! Binary buffer utilities for serz.
//!
//! This crate provides the bounded byte cursors the stream codec reads from
//! and the growable writer it encodes into. All multi-byte quantities are
//! big-endian, matching the Java object stream wire format.
//!
//! # Overview
//!
//! - [`ByteCursor`] - Sequential reads with an end-of-data query
//! - [`Reader`] - Cursor over a byte slice
//! - [`SeekReader`] - Cursor over any `Read + Seek` source
//! - [`Writer`] - Writes binary data to an auto-growing buffer
//!
//! # Example
//!
//! ```
//! use serz_buffers::{ByteCursor, Reader, Writer};
//!
//! // Write some data
//! let mut writer = Writer::new();
//! writer.u8(0x01);
//! writer.u16(0x0203);
//! writer.buf(b"hello");
//! let data = writer.flush();
//!
//! // Read it back
//! let mut reader = Reader::new(&data);
//! assert_eq!(reader.u8(), Ok(0x01));
//! assert_eq!(reader.u16(), Ok(0x0203));
//! assert_eq!(reader.read_vec(5).unwrap(), b"hello");
//! assert!(reader.is_eof());
//! ```

mod cursor;
mod print_octets;
mod reader;
mod seek_reader;
mod writer;

pub use cursor::ByteCursor;
pub use print_octets::{print_octets, print_octets_default};
pub use reader::Reader;
pub use seek_reader::SeekReader;
pub use writer::Writer;

/// Error type for buffer operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// Attempted to read past the end of the buffer.
    EndOfBuffer {
        /// Bytes requested by the failed read.
        wanted: usize,
        /// Bytes that were left when the read was attempted.
        available: usize,
    },
    /// The underlying source failed.
    Io(String),
    /// A source offset does not fit the platform's address space.
    SourceTooLarge {
        /// Offset reported by the source.
        offset: u64,
    },
}

impl std::fmt::Display for BufferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferError::EndOfBuffer { wanted, available } => write!(
                f,
                "end of buffer (wanted {wanted} bytes, {available} available)"
            ),
            BufferError::Io(msg) => write!(f, "source read failed: {msg}"),
            BufferError::SourceTooLarge { offset } => {
                write!(f, "source offset {offset} exceeds the addressable range")
            }
        }
    }
}

impl std::error::Error for BufferError {}

impl From<std::io::Error> for BufferError {
    fn from(err: std::io::Error) -> Self {
        BufferError::Io(err.to_string())
    }
}
