//! Auto-growing binary buffer writer.

/// Writes big-endian binary data into a growable buffer.
///
/// # Example
///
/// ```
/// use serz_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.u8(0x73);
/// writer.u32(0x007e_0000);
/// assert_eq!(writer.flush(), vec![0x73, 0x00, 0x7e, 0x00, 0x00]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct Writer {
    /// Bytes written so far.
    pub uint8: Vec<u8>,
}

impl Writer {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::with_alloc_size(64)
    }

    /// Creates an empty writer with `alloc_size` bytes pre-allocated.
    pub fn with_alloc_size(alloc_size: usize) -> Self {
        Self {
            uint8: Vec::with_capacity(alloc_size),
        }
    }

    /// Discards everything written so far.
    pub fn reset(&mut self) {
        self.uint8.clear();
    }

    /// Returns the written bytes and resets the writer.
    pub fn flush(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.uint8)
    }

    /// Number of bytes written.
    pub fn len(&self) -> usize {
        self.uint8.len()
    }

    /// Returns `true` when nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.uint8.is_empty()
    }

    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.uint8.push(val);
    }

    #[inline]
    pub fn i8(&mut self, val: i8) {
        self.uint8.push(val as u8);
    }

    #[inline]
    pub fn u16(&mut self, val: u16) {
        self.uint8.extend_from_slice(&val.to_be_bytes());
    }

    #[inline]
    pub fn i16(&mut self, val: i16) {
        self.uint8.extend_from_slice(&val.to_be_bytes());
    }

    #[inline]
    pub fn u32(&mut self, val: u32) {
        self.uint8.extend_from_slice(&val.to_be_bytes());
    }

    #[inline]
    pub fn i32(&mut self, val: i32) {
        self.uint8.extend_from_slice(&val.to_be_bytes());
    }

    #[inline]
    pub fn u64(&mut self, val: u64) {
        self.uint8.extend_from_slice(&val.to_be_bytes());
    }

    #[inline]
    pub fn i64(&mut self, val: i64) {
        self.uint8.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes a 32-bit float, preserving its bit pattern.
    #[inline]
    pub fn f32(&mut self, val: f32) {
        self.u32(val.to_bits());
    }

    /// Writes a 64-bit float, preserving its bit pattern.
    #[inline]
    pub fn f64(&mut self, val: f64) {
        self.u64(val.to_bits());
    }

    /// Appends raw bytes.
    pub fn buf(&mut self, data: &[u8]) {
        self.uint8.extend_from_slice(data);
    }
}
