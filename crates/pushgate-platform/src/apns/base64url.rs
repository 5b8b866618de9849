//! Unpadded base64url, as used for every JWT segment.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Encode `bytes` with the URL-safe alphabet and no `=` padding.
///
/// Standard base64 with `+` mapped to `-`, `/` mapped to `_`, and the trailing
/// padding stripped.
pub fn encode_url_safe(bytes: &[u8]) -> String {
    let mut encoded = STANDARD.encode(bytes);
    let unpadded = encoded.trim_end_matches('=').len();
    encoded.truncate(unpadded);
    encoded
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect()
}
