//! UTF-8–safe string truncation.
//!
//! Device tokens and response bodies end up in log lines; these helpers keep
//! them short without panicking on a multi-byte boundary.

/// Truncate a string to at most `max_bytes` bytes at a char boundary.
#[inline]
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Short form of a device token for log output: the first 8 characters plus
/// the full length, e.g. `"a1b2c3d4…(64)"`.
pub fn token_prefix(token: &str) -> String {
    if token.len() <= 8 {
        return token.to_owned();
    }
    format!("{}…({})", truncate_str(token, 8), token.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_string_unchanged() {
        assert_eq!(truncate_str("hello", 10), "hello");
    }

    #[test]
    fn exact_length_unchanged() {
        assert_eq!(truncate_str("hello", 5), "hello");
    }

    #[test]
    fn truncates_ascii() {
        assert_eq!(truncate_str("hello world", 5), "hello");
    }

    #[test]
    fn snaps_back_inside_multibyte_char() {
        // '—' is three bytes
        assert_eq!(truncate_str("ab—cd", 3), "ab");
        assert_eq!(truncate_str("ab—cd", 5), "ab—");
    }

    #[test]
    fn zero_budget() {
        assert_eq!(truncate_str("abc", 0), "");
    }

    #[test]
    fn token_prefix_long_token() {
        let token = "a".repeat(64);
        assert_eq!(token_prefix(&token), "aaaaaaaa…(64)");
    }

    #[test]
    fn token_prefix_short_token() {
        assert_eq!(token_prefix("tok-A"), "tok-A");
    }
}
