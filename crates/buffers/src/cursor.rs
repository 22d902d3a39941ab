//! The positioned-read abstraction shared by all cursors.

use crate::BufferError;

/// A positioned reader over a bounded byte source.
///
/// Implementors only provide [`read_exact`](ByteCursor::read_exact),
/// [`remaining`](ByteCursor::remaining) and [`position`](ByteCursor::position);
/// the typed big-endian readers are derived from those.
///
/// A failed read never yields partial data. Callers must treat the cursor
/// position as unspecified after an error.
pub trait ByteCursor {
    /// Fills `buf` completely or fails with [`BufferError::EndOfBuffer`].
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), BufferError>;

    /// Number of bytes left before the end of data.
    fn remaining(&self) -> usize;

    /// Offset of the next byte to be read, from the start of the source.
    fn position(&self) -> usize;

    /// Returns `true` once every byte has been consumed.
    fn is_eof(&self) -> bool {
        self.remaining() == 0
    }

    /// Reads `n` bytes into a fresh vector.
    ///
    /// The length is checked against [`remaining`](ByteCursor::remaining)
    /// before allocating, so hostile length prefixes cannot force a large
    /// allocation.
    fn read_vec(&mut self, n: usize) -> Result<Vec<u8>, BufferError> {
        let available = self.remaining();
        if n > available {
            return Err(BufferError::EndOfBuffer {
                wanted: n,
                available,
            });
        }
        let mut out = vec![0u8; n];
        self.read_exact(&mut out)?;
        Ok(out)
    }

    /// Reads a fixed-size array.
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        let mut out = [0u8; N];
        self.read_exact(&mut out)?;
        Ok(out)
    }

    /// Reads an unsigned 8-bit integer.
    fn u8(&mut self) -> Result<u8, BufferError> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Reads a signed 8-bit integer.
    fn i8(&mut self) -> Result<i8, BufferError> {
        Ok(self.u8()? as i8)
    }

    /// Reads an unsigned 16-bit integer (big-endian).
    fn u16(&mut self) -> Result<u16, BufferError> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    /// Reads a signed 16-bit integer (big-endian).
    fn i16(&mut self) -> Result<i16, BufferError> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    /// Reads an unsigned 32-bit integer (big-endian).
    fn u32(&mut self) -> Result<u32, BufferError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    /// Reads a signed 32-bit integer (big-endian).
    fn i32(&mut self) -> Result<i32, BufferError> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    /// Reads an unsigned 64-bit integer (big-endian).
    fn u64(&mut self) -> Result<u64, BufferError> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    /// Reads a signed 64-bit integer (big-endian).
    fn i64(&mut self) -> Result<i64, BufferError> {
        Ok(i64::from_be_bytes(self.read_array()?))
    }

    /// Reads a 32-bit float (big-endian), preserving the bit pattern.
    fn f32(&mut self) -> Result<f32, BufferError> {
        Ok(f32::from_bits(self.u32()?))
    }

    /// Reads a 64-bit float (big-endian), preserving the bit pattern.
    fn f64(&mut self) -> Result<f64, BufferError> {
        Ok(f64::from_bits(self.u64()?))
    }
}
