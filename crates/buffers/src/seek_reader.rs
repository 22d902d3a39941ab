//! Cursor over a seekable source.

use std::io::{Read, Seek, SeekFrom};

use crate::{BufferError, ByteCursor};

/// A [`ByteCursor`] over any `Read + Seek` source.
///
/// The source length is measured once at construction (by seeking to the end
/// and back), which gives the cursor the same end-of-data and bounded
/// allocation behaviour as [`Reader`](crate::Reader).
pub struct SeekReader<R> {
    inner: R,
    x: usize,
    end: usize,
}

impl<R: Read + Seek> SeekReader<R> {
    /// Wraps `inner`, starting at its current position.
    pub fn new(mut inner: R) -> Result<Self, BufferError> {
        let start = inner.stream_position()?;
        let end = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(start))?;
        Ok(Self {
            inner,
            x: to_offset(start)?,
            end: to_offset(end)?,
        })
    }

    /// Gives the source back to the caller.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

fn to_offset(offset: u64) -> Result<usize, BufferError> {
    usize::try_from(offset).map_err(|_| BufferError::SourceTooLarge { offset })
}

impl<R: Read + Seek> ByteCursor for SeekReader<R> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), BufferError> {
        let available = self.remaining();
        if buf.len() > available {
            return Err(BufferError::EndOfBuffer {
                wanted: buf.len(),
                available,
            });
        }
        self.inner.read_exact(buf)?;
        self.x += buf.len();
        Ok(())
    }

    fn remaining(&self) -> usize {
        self.end.saturating_sub(self.x)
    }

    fn position(&self) -> usize {
        self.x
    }
}
