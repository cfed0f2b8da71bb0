//! Title canonicalization.
//!
//! A canonical title is lowercase, has underscores for spaces and is
//! percent-encoded, so it can be used directly as a file name and as a URL
//! path segment.

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Lowercases, replaces spaces with `_`, then percent-encodes.
///
/// The result is pure ASCII and the transform is idempotent:
/// `canonicalize(&canonicalize(t)) == canonicalize(t)`.
pub fn canonicalize(title: &str) -> String {
    let lowered = title.to_lowercase().replace(' ', "_");
    percent_encode(&lowered)
}

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~' | b':')
}

fn is_lower_hex(b: u8) -> bool {
    b.is_ascii_digit() || (b'a'..=b'f').contains(&b)
}

/// Escapes every byte outside the unreserved set as `%xx`.
/// A `%` that already starts an escape is kept, so nothing is encoded twice.
fn percent_encode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(bytes.len());

    for (i, &b) in bytes.iter().enumerate() {
        let escaped = b == b'%'
            && bytes.get(i + 1).copied().is_some_and(is_lower_hex)
            && bytes.get(i + 2).copied().is_some_and(is_lower_hex);

        if is_unreserved(b) || escaped {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0f) as usize] as char);
        }
    }
    out
}
