//! Binary buffer reader with cursor tracking.

use crate::{BufferError, ByteCursor};

/// A binary buffer reader that reads data from a byte slice.
///
/// The reader maintains a cursor position and never reads past `end`; every
/// out-of-range read returns [`BufferError::EndOfBuffer`] instead of
/// panicking.
///
/// # Example
///
/// ```
/// use serz_buffers::{ByteCursor, Reader};
///
/// let data = [0x01, 0x02, 0x03, 0x04];
/// let mut reader = Reader::new(&data);
///
/// assert_eq!(reader.u8(), Ok(0x01));
/// assert_eq!(reader.u16(), Ok(0x0203));
/// assert!(reader.u16().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    /// The underlying byte slice.
    pub uint8: &'a [u8],
    /// Current cursor position.
    pub x: usize,
    /// End position (exclusive).
    pub end: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader for the given byte slice.
    pub fn new(uint8: &'a [u8]) -> Self {
        let end = uint8.len();
        Self { uint8, x: 0, end }
    }

    /// Creates a reader over `uint8[x..end]`.
    ///
    /// `end` is clamped to the slice length.
    pub fn from_slice(uint8: &'a [u8], x: usize, end: usize) -> Self {
        let end = end.min(uint8.len());
        Self {
            uint8,
            x: x.min(end),
            end,
        }
    }

    /// Peeks at the current byte without advancing the cursor.
    pub fn peek(&self) -> Option<u8> {
        if self.x < self.end {
            Some(self.uint8[self.x])
        } else {
            None
        }
    }

    /// Returns the next `size` bytes as a borrowed subslice and advances.
    pub fn buf(&mut self, size: usize) -> Result<&'a [u8], BufferError> {
        self.assert_size(size)?;
        let x = self.x;
        self.x += size;
        Ok(&self.uint8[x..self.x])
    }

    fn assert_size(&self, size: usize) -> Result<(), BufferError> {
        let available = self.end.saturating_sub(self.x);
        if size > available {
            return Err(BufferError::EndOfBuffer {
                wanted: size,
                available,
            });
        }
        Ok(())
    }
}

impl ByteCursor for Reader<'_> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), BufferError> {
        let src = self.buf(buf.len())?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn remaining(&self) -> usize {
        self.end.saturating_sub(self.x)
    }

    fn position(&self) -> usize {
        self.x
    }
}
