//! Hex formatting for debug dumps.

use std::fmt::Write;

/// Formats up to `max` bytes as space-separated hex pairs.
///
/// Bytes beyond `max` are summarised as a count so that large block-data
/// payloads keep debug dumps readable.
///
/// ```
/// use serz_buffers::print_octets;
///
/// assert_eq!(print_octets(&[0xac, 0xed, 0x00, 0x05], 16), "ac ed 00 05");
/// assert_eq!(print_octets(&[1, 2, 3], 2), "01 02 ... (1 more)");
/// assert_eq!(print_octets(&[], 16), "");
/// ```
pub fn print_octets(octets: &[u8], max: usize) -> String {
    let mut out = String::with_capacity(octets.len().min(max) * 3);
    for (i, byte) in octets.iter().take(max).enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{byte:02x}");
    }
    if octets.len() > max {
        let _ = write!(out, " ... ({} more)", octets.len() - max);
    }
    out
}

/// [`print_octets`] with the 16-byte default used by the stream dumper.
pub fn print_octets_default(octets: &[u8]) -> String {
    print_octets(octets, 16)
}
