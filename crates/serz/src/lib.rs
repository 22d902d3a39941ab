//! Byte-exact decoder, encoder and tree walker for Java object serialization
//! streams (`AC ED 00 05 ...`).
//!
//! A stream decodes into a [`Serialization`]: the header plus a tree of
//! [`Content`] nodes per top-level record. Re-encoding an unmodified tree
//! reproduces the input bytes. Back-references stay [`Reference`] leaves
//! carrying the handle of the node that first materialized the value, so the
//! tree is acyclic even for self-referential object graphs.
//!
//! ```
//! use serz::Serialization;
//!
//! let data = [0xac, 0xed, 0x00, 0x05, 0x74, 0x00, 0x02, b'h', b'i'];
//! let ser = Serialization::from_bytes(&data).unwrap();
//! assert_eq!(ser.contents.len(), 1);
//! assert_eq!(ser.to_bytes(), data);
//! ```

pub mod config;
pub mod constants;
pub mod content;
pub mod decode;
pub mod encode;
pub mod error;
pub mod handles;
pub mod print;
pub mod serialization;
pub mod utf;
pub mod walk;

pub use config::{DecoderConfig, DEFAULT_MAX_DEPTH};
pub use content::{
    Array, BlockData, BlockKind, Class, ClassData, ClassDesc, Content, Enum, Field, FieldDesc,
    FieldType, FieldValue, JavaString, Object, ProxyClassDesc, Reference, StringKind,
};
pub use decode::Decoder;
pub use encode::Encoder;
pub use error::SerzError;
pub use handles::{ClassLayout, HandleEntry, HandleKind, HandleTable};
pub use serialization::Serialization;
pub use utf::JavaUtf;
pub use walk::{walk, walk_mut};
