//! Init-data payload parsing.
//!
//! Telegram Mini Apps pass a signed, URL-encoded set of key/value pairs
//! (the "init data") with every request. This module parses that
//! payload, exposes the fields the verifier needs, and renders the
//! canonical check string that the signature covers.

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

// =============================================================================
// Telegram User
// =============================================================================

/// The platform user asserted by a verified init-data payload.
///
/// Deserialized from the `user` field once the signature is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramUser {
    /// Platform-scoped user identifier.
    pub id: i64,
    /// Telegram username, if the user has one.
    #[serde(default)]
    pub username: Option<String>,
    /// First name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// IETF language tag of the user's client.
    #[serde(default)]
    pub language_code: Option<String>,
}

// =============================================================================
// Init Data
// =============================================================================

/// An init-data payload parsed into an ordered field map.
///
/// Field order is preserved from the wire form; the canonical check
/// string sorts its own rendering and does not depend on it.
#[derive(Debug, Clone)]
pub struct InitData {
    fields: Vec<(String, String)>,
}

impl InitData {
    /// Parse the URL-encoded init-data string.
    ///
    /// Percent-encoding is decoded here, so field values (notably the
    /// JSON `user` object) come out in their original form.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let fields = url::form_urlencoded::parse(raw.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { fields }
    }

    /// Get the first value for a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The supplied signature (`hash` field).
    #[must_use]
    pub fn hash(&self) -> Option<&str> {
        self.get("hash")
    }

    /// The issuance timestamp (`auth_date` field) as unix seconds.
    #[must_use]
    pub fn auth_date(&self) -> Option<i64> {
        self.get("auth_date").and_then(|v| v.parse().ok())
    }

    /// Render the canonical check string.
    ///
    /// Every field except `hash` is rendered as `key=value`; the
    /// rendered strings are sorted lexicographically (plain string
    /// order, not numeric) and joined with a single newline.
    #[must_use]
    pub fn check_string(&self) -> String {
        let mut lines: Vec<String> = self
            .fields
            .iter()
            .filter(|(k, _)| k != "hash")
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        lines.sort();
        lines.join("\n")
    }

    /// Deserialize the embedded `user` object.
    ///
    /// # Errors
    ///
    /// Returns `Malformed` if the field is absent or not valid JSON of
    /// the expected shape.
    pub fn user(&self) -> Result<TelegramUser, AuthError> {
        let raw = self
            .get("user")
            .ok_or_else(|| AuthError::malformed("missing user field"))?;
        serde_json::from_str(raw)
            .map_err(|e| AuthError::malformed(format!("unparsable user field: {e}")))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_fields() {
        let data = InitData::parse("auth_date=1700000000&hash=abc123");
        assert_eq!(data.get("auth_date"), Some("1700000000"));
        assert_eq!(data.hash(), Some("abc123"));
        assert_eq!(data.auth_date(), Some(1_700_000_000));
    }

    #[test]
    fn test_parse_decodes_percent_encoding() {
        let data = InitData::parse("user=%7B%22id%22%3A42%7D&hash=h");
        assert_eq!(data.get("user"), Some(r#"{"id":42}"#));
    }

    #[test]
    fn test_check_string_sorted_and_hash_excluded() {
        let data = InitData::parse("b=2&a=1&hash=deadbeef");
        assert_eq!(data.check_string(), "a=1\nb=2");
    }

    #[test]
    fn test_check_string_sorts_as_strings_not_numbers() {
        // "10" sorts before "9" in plain string order
        let data = InitData::parse("x=10&x=9&hash=h");
        assert_eq!(data.check_string(), "x=10\nx=9");
    }

    #[test]
    fn test_user_parsing() {
        let data = InitData::parse(
            "user=%7B%22id%22%3A42%2C%22username%22%3A%22alice%22%7D&hash=h",
        );
        let user = data.user().unwrap();
        assert_eq!(user.id, 42);
        assert_eq!(user.username.as_deref(), Some("alice"));
        assert_eq!(user.last_name, None);
    }

    #[test]
    fn test_missing_user_is_malformed() {
        let data = InitData::parse("auth_date=1&hash=h");
        assert!(matches!(data.user(), Err(AuthError::Malformed { .. })));
    }

    #[test]
    fn test_non_numeric_auth_date() {
        let data = InitData::parse("auth_date=yesterday&hash=h");
        assert_eq!(data.auth_date(), None);
    }
}
