#![allow(dead_code)]

use std::path::PathBuf;

use serz::constants::*;
use serz_buffers::Writer;

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Every `.ser` fixture, sorted by name.
pub fn fixture_files() -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(fixtures_dir())
        .expect("fixtures dir")
        .map(|entry| entry.expect("dir entry").path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "ser"))
        .collect();
    files.sort();
    files
}

pub fn handle(n: u32) -> u32 {
    BASE_WIRE_HANDLE + n
}

/// Hand-assembles object streams byte by byte.
pub struct StreamBuilder {
    w: Writer,
}

impl StreamBuilder {
    /// Starts a stream with the standard header.
    pub fn new() -> Self {
        let mut w = Writer::new();
        w.buf(&STREAM_MAGIC);
        w.buf(&STREAM_VERSION);
        Self { w }
    }

    /// Starts a stream with no header at all.
    pub fn bare() -> Self {
        Self { w: Writer::new() }
    }

    pub fn u8(mut self, v: u8) -> Self {
        self.w.u8(v);
        self
    }

    pub fn u16(mut self, v: u16) -> Self {
        self.w.u16(v);
        self
    }

    pub fn i32(mut self, v: i32) -> Self {
        self.w.i32(v);
        self
    }

    pub fn i64(mut self, v: i64) -> Self {
        self.w.i64(v);
        self
    }

    pub fn bytes(mut self, v: &[u8]) -> Self {
        self.w.buf(v);
        self
    }

    pub fn utf(mut self, s: &str) -> Self {
        self.w.u16(s.len() as u16);
        self.w.buf(s.as_bytes());
        self
    }

    pub fn null(self) -> Self {
        self.u8(TC_NULL)
    }

    pub fn end(self) -> Self {
        self.u8(TC_ENDBLOCKDATA)
    }

    pub fn string(self, s: &str) -> Self {
        self.u8(TC_STRING).utf(s)
    }

    pub fn reference(mut self, h: u32) -> Self {
        self.w.u8(TC_REFERENCE);
        self.w.u32(h);
        self
    }

    /// Class descriptor header up to and including the field count. Fields,
    /// annotations and the super class slot follow.
    pub fn class_desc(self, name: &str, uid: i64, flags: u8, fields: u16) -> Self {
        self.u8(TC_CLASSDESC)
            .utf(name)
            .i64(uid)
            .u8(flags)
            .u16(fields)
    }

    pub fn prim_field(self, code: u8, name: &str) -> Self {
        self.u8(code).utf(name)
    }

    /// Object field; the type signature string follows.
    pub fn object_field(self, name: &str, signature: &str) -> Self {
        self.u8(b'L').utf(name).string(signature)
    }

    pub fn block(self, data: &[u8]) -> Self {
        self.u8(TC_BLOCKDATA).u8(data.len() as u8).bytes(data)
    }

    pub fn build(mut self) -> Vec<u8> {
        self.w.flush()
    }
}
