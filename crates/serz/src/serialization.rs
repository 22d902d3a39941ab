//! A whole decoded stream and its top-level entry points.

use std::io::{Read, Seek};

use serde::Serialize;
use serz_buffers::{Reader, SeekReader};
use tracing::debug;

use crate::config::DecoderConfig;
use crate::constants::{DEFECT_MARKER, STREAM_MAGIC, STREAM_VERSION, TC_ENDBLOCKDATA};
use crate::content::Content;
use crate::decode::Decoder;
use crate::encode::Encoder;
use crate::error::SerzError;
use crate::print::print_serialization;
use crate::walk::{walk, walk_mut};

/// Stream header plus every top-level record, in stream order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Serialization {
    pub magic: [u8; 2],
    pub version: [u8; 2],
    pub contents: Vec<Content>,
}

impl Default for Serialization {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialization {
    /// An empty stream with the standard header.
    pub fn new() -> Self {
        Self {
            magic: STREAM_MAGIC,
            version: STREAM_VERSION,
            contents: Vec::new(),
        }
    }

    /// Decodes records until the end of `data`.
    pub fn from_bytes(data: &[u8]) -> Result<Self, SerzError> {
        Self::from_bytes_with_config(data, DecoderConfig::default())
    }

    pub fn from_bytes_with_config(data: &[u8], config: DecoderConfig) -> Result<Self, SerzError> {
        Decoder::with_config(Reader::new(data), config).decode_all()
    }

    /// Decodes exactly `count` top-level records from a seekable source.
    ///
    /// The source is read from its current position; bytes after the last
    /// record are left unread.
    pub fn from_read_seeker<R: Read + Seek>(source: R, count: usize) -> Result<Self, SerzError> {
        let cursor = SeekReader::new(source).map_err(|err| SerzError::Io {
            context: "measuring source length".to_owned(),
            message: err.to_string(),
        })?;
        Decoder::new(cursor).decode_count(count)
    }

    /// Like [`from_bytes`](Self::from_bytes), for streams produced by a
    /// generator that omits one `TC_ENDBLOCKDATA` after the handle
    /// `0x7e0009`.
    ///
    /// The terminator is inserted after the first occurrence of the handle
    /// bytes only. Inputs without them decode exactly as with `from_bytes`.
    pub fn from_bytes_with_defect_compensation(data: &[u8]) -> Result<Self, SerzError> {
        let patched = insert_terminator(data);
        Self::from_bytes(&patched)
    }

    /// Seekable-source counterpart of
    /// [`from_bytes_with_defect_compensation`](Self::from_bytes_with_defect_compensation).
    pub fn from_read_seeker_with_defect_compensation<R: Read + Seek>(
        mut source: R,
        count: usize,
    ) -> Result<Self, SerzError> {
        let mut data = Vec::new();
        source.read_to_end(&mut data).map_err(|err| SerzError::Io {
            context: "reading source".to_owned(),
            message: err.to_string(),
        })?;
        let patched = insert_terminator(&data);
        Decoder::new(Reader::new(&patched)).decode_count(count)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        Encoder::new().encode(self)
    }

    /// Encodes and then removes the terminator that decoding with defect
    /// compensation inserted, reproducing the original bytes.
    pub fn to_bytes_with_defect_compensation(&self) -> Vec<u8> {
        strip_terminator(self.to_bytes())
    }

    /// Indented human-readable dump. The format is for reading, not parsing.
    pub fn to_debug_string(&self) -> String {
        print_serialization(self)
    }

    pub fn to_json(&self) -> Result<serde_json::Value, SerzError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Walks every top-level record in order. See [`walk`].
    pub fn walk<E, F>(&self, mut callback: F) -> Result<(), E>
    where
        F: FnMut(&Content) -> Result<(), E>,
    {
        for content in &self.contents {
            walk(content, &mut callback)?;
        }
        Ok(())
    }

    /// Walks every top-level record in order, allowing rewrites. See
    /// [`walk_mut`].
    pub fn walk_mut<E, F>(&mut self, mut callback: F) -> Result<(), E>
    where
        F: FnMut(&mut Content) -> Result<(), E>,
    {
        for content in &mut self.contents {
            walk_mut(content, &mut callback)?;
        }
        Ok(())
    }

    /// Finds the node that materialized `handle`.
    ///
    /// After a `TC_RESET` the same handle can name several nodes; the first
    /// one in stream order is returned.
    pub fn find_by_handle(&self, handle: u32) -> Option<&Content> {
        self.contents
            .iter()
            .find_map(|content| find_materialized(content, handle))
    }
}

fn find_materialized(content: &Content, handle: u32) -> Option<&Content> {
    if !matches!(content, Content::Reference(_)) && content.handle() == Some(handle) {
        return Some(content);
    }
    content
        .children()
        .into_iter()
        .find_map(|child| find_materialized(child, handle))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn insert_terminator(data: &[u8]) -> Vec<u8> {
    let mut patched = data.to_vec();
    match find(data, &DEFECT_MARKER) {
        Some(at) => {
            let at = at + DEFECT_MARKER.len();
            debug!(offset = at, "inserting missing TC_ENDBLOCKDATA");
            patched.insert(at, TC_ENDBLOCKDATA);
        }
        None => debug!("no defect marker, decoding unchanged"),
    }
    patched
}

fn strip_terminator(mut data: Vec<u8>) -> Vec<u8> {
    let mut needle = DEFECT_MARKER.to_vec();
    needle.push(TC_ENDBLOCKDATA);
    if let Some(at) = find(&data, &needle) {
        let at = at + DEFECT_MARKER.len();
        debug!(offset = at, "removing inserted TC_ENDBLOCKDATA");
        data.remove(at);
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_patches_first_occurrence_only() {
        let data = [1, 0x00, 0x7e, 0x00, 0x09, 2, 0x00, 0x7e, 0x00, 0x09];
        assert_eq!(
            insert_terminator(&data),
            vec![1, 0x00, 0x7e, 0x00, 0x09, 0x78, 2, 0x00, 0x7e, 0x00, 0x09]
        );
    }

    #[test]
    fn strip_undoes_insert() {
        let data = vec![9, 0x00, 0x7e, 0x00, 0x09, 0x71, 0x00, 0x7e, 0x00, 0x09];
        assert_eq!(strip_terminator(insert_terminator(&data)), data);
    }

    #[test]
    fn unmarked_input_is_untouched() {
        let data = vec![0xac, 0xed, 0x00, 0x05, 0x70];
        assert_eq!(insert_terminator(&data), data);
        assert_eq!(strip_terminator(data.clone()), data);
    }

    #[test]
    fn header_only_stream_round_trips() {
        let data = [0xac, 0xed, 0x00, 0x05];
        let ser = Serialization::from_bytes(&data).unwrap();
        assert_eq!(ser, Serialization::new());
        assert_eq!(ser.to_bytes(), data);
    }

    #[test]
    fn debug_string_starts_with_header() {
        let text = Serialization::new().to_debug_string();
        assert!(text.starts_with("@Magic - 0xac ed\n@Version - 0x00 05\n@Contents"));
    }
}
