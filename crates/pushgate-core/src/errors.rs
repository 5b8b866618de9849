//! Argument validation errors.
//!
//! An [`ArgumentError`] means a request was malformed or incomplete and was
//! rejected before any storage or network work began.

use thiserror::Error;

/// Malformed or missing request fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    /// A required field was absent or empty.
    #[error("missing required field: {0}")]
    Missing(&'static str),

    /// A field exceeded its maximum length.
    #[error("field {field} exceeds {max} characters")]
    TooLong {
        /// Field name.
        field: &'static str,
        /// Maximum accepted length.
        max: usize,
    },

    /// A field had a value outside its accepted domain.
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Field name.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },
}

/// Reject empty strings and strings longer than `max` characters.
pub fn require(field: &'static str, value: &str, max: usize) -> Result<(), ArgumentError> {
    if value.trim().is_empty() {
        return Err(ArgumentError::Missing(field));
    }
    if value.chars().count() > max {
        return Err(ArgumentError::TooLong { field, max });
    }
    Ok(())
}

/// [`require`] plus a hex-digit check. Device tokens are spliced into the
/// APNs request path, so anything but `[0-9a-fA-F]` is rejected.
pub fn require_hex(field: &'static str, value: &str, max: usize) -> Result<(), ArgumentError> {
    require(field, value, max)?;
    if !value.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ArgumentError::Invalid {
            field,
            reason: "must contain only hex digits".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn missing_display() {
        let err = ArgumentError::Missing("device_token");
        assert_eq!(err.to_string(), "missing required field: device_token");
    }

    #[test]
    fn too_long_display() {
        let err = ArgumentError::TooLong { field: "ip", max: 15 };
        assert_eq!(err.to_string(), "field ip exceeds 15 characters");
    }

    #[test]
    fn require_rejects_empty_and_blank() {
        assert_matches!(require("ip", "", 15), Err(ArgumentError::Missing("ip")));
        assert_matches!(require("ip", "   ", 15), Err(ArgumentError::Missing("ip")));
    }

    #[test]
    fn require_rejects_over_long() {
        let ip = "1".repeat(16);
        assert_matches!(
            require("ip", &ip, 15),
            Err(ArgumentError::TooLong { field: "ip", max: 15 })
        );
    }

    #[test]
    fn require_hex_accepts_mixed_case() {
        assert!(require_hex("token", "a1B2c3D4", 99).is_ok());
    }

    #[test]
    fn require_hex_rejects_path_characters() {
        for token in ["aa/../../3/device/bb?x=1", "abc def", "ab%2F", "zz"] {
            assert_matches!(
                require_hex("token", token, 99),
                Err(ArgumentError::Invalid { field: "token", .. }),
                "{token}"
            );
        }
    }

    #[test]
    fn require_hex_checks_length_first() {
        assert_matches!(require_hex("token", "", 99), Err(ArgumentError::Missing("token")));
        assert_matches!(
            require_hex("token", &"a".repeat(100), 99),
            Err(ArgumentError::TooLong { field: "token", max: 99 })
        );
    }

    #[test]
    fn require_accepts_boundary() {
        assert!(require("ip", "255.255.255.255", 15).is_ok());
    }
}
