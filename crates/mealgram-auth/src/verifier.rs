//! Init-data signature verification.
//!
//! Implements the Telegram Web App signing scheme: the secret key is
//! HMAC-SHA256 of the bot token keyed with the literal label
//! `WebAppData`, and the signature is HMAC-SHA256 of the canonical
//! check string keyed with that secret, rendered as lowercase hex.
//!
//! Verification is a pure function of its inputs; callers are expected
//! to forward the accepted hash to the [`ReplayGuard`](crate::ReplayGuard).

use hmac::{Hmac, Mac};
use sha2::Sha256;
use time::{Duration, OffsetDateTime};

use crate::error::AuthError;
use crate::init_data::{InitData, TelegramUser};

type HmacSha256 = Hmac<Sha256>;

/// Label keyed over the bot token to derive the signing secret.
const SECRET_LABEL: &[u8] = b"WebAppData";

/// Maximum accepted age of an init-data payload.
pub const MAX_AGE: Duration = Duration::hours(24);

/// Verify an init-data payload against the bot token.
///
/// On success returns the asserted [`TelegramUser`]. The checks run in
/// order: field presence, freshness, signature, user parsing.
///
/// # Errors
///
/// - `Malformed` if `hash` or `auth_date` is missing, `auth_date` is
///   not a decimal timestamp, or the `user` field cannot be parsed.
/// - `Expired` if the payload is older than [`MAX_AGE`].
/// - `InvalidSignature` if the computed signature does not match.
pub fn verify(init_data: &InitData, bot_token: &str) -> Result<TelegramUser, AuthError> {
    verify_at(init_data, bot_token, OffsetDateTime::now_utc())
}

/// [`verify`] with an explicit notion of "now", for deterministic tests.
pub fn verify_at(
    init_data: &InitData,
    bot_token: &str,
    now: OffsetDateTime,
) -> Result<TelegramUser, AuthError> {
    let hash = init_data
        .hash()
        .ok_or_else(|| AuthError::malformed("missing hash field"))?;
    let auth_date = init_data
        .auth_date()
        .ok_or_else(|| AuthError::malformed("missing or invalid auth_date field"))?;

    let issued_at = OffsetDateTime::from_unix_timestamp(auth_date)
        .map_err(|_| AuthError::malformed("auth_date out of range"))?;
    if now - issued_at > MAX_AGE {
        return Err(AuthError::Expired);
    }

    let candidate = sign(&init_data.check_string(), bot_token);
    if candidate != hash {
        return Err(AuthError::InvalidSignature);
    }

    init_data.user()
}

/// Compute the signature of a canonical check string.
///
/// Exposed for tests that need to fabricate correctly-signed payloads.
#[must_use]
pub fn sign(check_string: &str, bot_token: &str) -> String {
    let mut secret =
        HmacSha256::new_from_slice(SECRET_LABEL).expect("HMAC can take key of any size");
    secret.update(bot_token.as_bytes());
    let secret_key = secret.finalize().into_bytes();

    let mut mac =
        HmacSha256::new_from_slice(&secret_key).expect("HMAC can take key of any size");
    mac.update(check_string.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

// =============================================================================
// Tests
// =============================================================================
