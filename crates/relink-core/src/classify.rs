//! Decide whether a raw field holds a serialized value or opaque text.

use crate::decoder::decode;

/// The encoding of boolean `false`. The legacy ecosystem's own check cannot
/// tell this payload apart from a failed decode, so it is matched literally.
pub const ENCODED_FALSE: &[u8] = b"b:0;";

/// `true` if `raw` is a complete, well-formed serialized value.
///
/// Empty input is never encoded. Anything that does not start with a known
/// tag followed by its delimiter is rejected without running the decoder.
///
/// # Example
/// ```
/// use relink_core::is_encoded;
/// assert!(is_encoded(b"b:0;"));
/// assert!(is_encoded(br#"s:5:"hello";"#));
/// assert!(!is_encoded(br#"s:9:"hello";"#));
/// assert!(!is_encoded(b"https://example.com"));
/// ```
pub fn is_encoded(raw: &[u8]) -> bool {
    if raw.is_empty() {
        return false;
    }
    if raw == ENCODED_FALSE {
        return true;
    }
    has_tag_shape(raw) && decode(raw).is_ok()
}

fn has_tag_shape(raw: &[u8]) -> bool {
    match raw {
        [b'N', b';', ..] => true,
        [b'b' | b'i' | b'd' | b's' | b'a' | b'O', b':', ..] => true,
        _ => false,
    }
}
