//! Modified UTF-8 text as used by `DataOutput.writeUTF`.
//!
//! Stream strings are kept as raw bytes so that any input, including invalid
//! encodings, re-encodes unchanged. Decoding to Rust text is lossy and only
//! used for display and lookups.

use serde::{Serialize, Serializer};

/// Raw modified UTF-8 bytes of a class name, field name or string payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JavaUtf {
    pub data: Vec<u8>,
}

impl JavaUtf {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Decodes the bytes, replacing malformed sequences with U+FFFD.
    pub fn to_string_lossy(&self) -> String {
        decode_modified_utf8(&self.data)
    }

    /// Replaces the bytes with the modified UTF-8 encoding of `value`.
    pub fn set_value(&mut self, value: &str) {
        self.data = encode_modified_utf8(value);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<&str> for JavaUtf {
    fn from(value: &str) -> Self {
        Self {
            data: encode_modified_utf8(value),
        }
    }
}

impl std::fmt::Display for JavaUtf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl Serialize for JavaUtf {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string_lossy())
    }
}

/// Decodes modified UTF-8.
///
/// Accepts the two-byte NUL form and surrogate pairs encoded as separate
/// three-byte sequences, plus standard four-byte sequences that non-JDK
/// writers sometimes emit.
pub fn decode_modified_utf8(bytes: &[u8]) -> String {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let cont = |i: usize| bytes.get(i).copied().filter(|b| b & 0xc0 == 0x80);
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b < 0x80 {
            units.push(b as u16);
            i += 1;
        } else if b & 0xe0 == 0xc0 {
            match cont(i + 1) {
                Some(b1) => {
                    units.push((((b & 0x1f) as u16) << 6) | (b1 & 0x3f) as u16);
                    i += 2;
                }
                None => {
                    units.push(0xfffd);
                    i += 1;
                }
            }
        } else if b & 0xf0 == 0xe0 {
            match (cont(i + 1), cont(i + 2)) {
                (Some(b1), Some(b2)) => {
                    units.push(
                        (((b & 0x0f) as u16) << 12)
                            | (((b1 & 0x3f) as u16) << 6)
                            | (b2 & 0x3f) as u16,
                    );
                    i += 3;
                }
                _ => {
                    units.push(0xfffd);
                    i += 1;
                }
            }
        } else if b & 0xf8 == 0xf0 {
            match (cont(i + 1), cont(i + 2), cont(i + 3)) {
                (Some(b1), Some(b2), Some(b3)) => {
                    let cp = (((b & 0x07) as u32) << 18)
                        | (((b1 & 0x3f) as u32) << 12)
                        | (((b2 & 0x3f) as u32) << 6)
                        | (b3 & 0x3f) as u32;
                    match char::from_u32(cp) {
                        Some(ch) => {
                            let mut buf = [0u16; 2];
                            units.extend_from_slice(ch.encode_utf16(&mut buf));
                        }
                        None => units.push(0xfffd),
                    }
                    i += 4;
                }
                _ => {
                    units.push(0xfffd);
                    i += 1;
                }
            }
        } else {
            units.push(0xfffd);
            i += 1;
        }
    }
    String::from_utf16_lossy(&units)
}

/// Encodes `value` the way `DataOutputStream.writeUTF` does, without the
/// length prefix.
pub fn encode_modified_utf8(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007f => out.push(unit as u8),
            0x0000 | 0x0080..=0x07ff => {
                out.push(0xc0 | ((unit >> 6) & 0x1f) as u8);
                out.push(0x80 | (unit & 0x3f) as u8);
            }
            _ => {
                out.push(0xe0 | ((unit >> 12) & 0x0f) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3f) as u8);
                out.push(0x80 | (unit & 0x3f) as u8);
            }
        }
    }
    out
}
