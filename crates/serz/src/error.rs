//! Decoder error type.

use serz_buffers::BufferError;
use thiserror::Error;

/// Error type for object stream decoding.
///
/// Every variant is fatal for the decode call that produced it and no partial
/// tree is returned. A non-standard version is normally only logged.
#[derive(Debug, Error)]
pub enum SerzError {
    #[error("invalid stream magic [{}], expected [ac ed]", serz_buffers::print_octets_default(.found))]
    MagicMismatch { found: Vec<u8> },
    /// Only returned when [`DecoderConfig::strict_version`](crate::DecoderConfig) is set.
    #[error("unsupported stream version [{:02x} {:02x}]", .found[0], .found[1])]
    VersionMismatch { found: [u8; 2] },
    #[error("truncated input at offset {offset} while {context}")]
    TruncatedInput { context: String, offset: usize },
    #[error("unsupported content type 0x{tag:02x} at offset {offset} while {context}")]
    UnsupportedTag {
        tag: u8,
        offset: usize,
        context: String,
    },
    #[error("reference to unassigned handle 0x{handle:08x}")]
    UnresolvedHandle { handle: u32 },
    #[error("end of data before TC_ENDBLOCKDATA while reading {context}")]
    MissingTerminator { context: String },
    #[error("expected {expected} but found {found} while {context}")]
    UnexpectedContent {
        expected: &'static str,
        found: &'static str,
        context: String,
    },
    #[error("unsupported field type code 0x{code:02x} while {context}")]
    UnsupportedFieldType { code: u8, context: String },
    #[error("`{class_name}` is not an array class name")]
    InvalidArrayClass { class_name: String },
    #[error("invalid length {length} while {context}")]
    InvalidLength { length: i64, context: String },
    #[error("externalizable class {class_name} was written without block data")]
    UnsupportedExternalContents { class_name: String },
    #[error("class hierarchy of {class_name} is cyclic")]
    CyclicHierarchy { class_name: String },
    #[error("content nesting exceeds the limit of {limit}")]
    DepthLimitExceeded { limit: usize },
    #[error("source read failed while {context}: {message}")]
    Io { context: String, message: String },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Attaches the structural role being parsed to a low-level read failure.
pub(crate) trait ReadContext<T> {
    fn role<F>(self, offset: usize, context: F) -> Result<T, SerzError>
    where
        F: FnOnce() -> String;
}

impl<T> ReadContext<T> for Result<T, BufferError> {
    fn role<F>(self, offset: usize, context: F) -> Result<T, SerzError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|err| match err {
            BufferError::EndOfBuffer { .. } => SerzError::TruncatedInput {
                context: context(),
                offset,
            },
            BufferError::Io(message) => SerzError::Io {
                context: context(),
                message,
            },
            err @ BufferError::SourceTooLarge { .. } => SerzError::Io {
                context: context(),
                message: err.to_string(),
            },
        })
    }
}
