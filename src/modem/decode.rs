//! Best-effort text decoding of raw modem bytes.

/// Decode bytes as UTF-8, dropping any malformed sequences.
///
/// Modems occasionally emit line noise or partial multi-byte sequences right
/// after the port is opened; those bytes are discarded instead of failing.
pub fn best_effort_decode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}
