//! Decoder configuration.

/// Nesting limit used by [`DecoderConfig::default`].
///
/// One level of object nesting costs several decoder frames, so this stays
/// well below what an unoptimized build fits on a 2 MiB thread stack. Raise
/// it only together with the stack size of the decoding thread.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Knobs for [`Decoder`](crate::Decoder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Maximum nesting of content records before decoding fails with
    /// [`SerzError::DepthLimitExceeded`](crate::SerzError::DepthLimitExceeded).
    ///
    /// The decoder, encoder and walker all recurse once per level.
    pub max_depth: usize,
    /// Reject streams whose version is not `00 05` instead of only logging.
    pub strict_version: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            strict_version: false,
        }
    }
}
