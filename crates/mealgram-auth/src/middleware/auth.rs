//! Init-data authentication extractor.
//!
//! This module provides the axum extractor that validates the
//! `X-Telegram-Init-Data` header and resolves the persisted user
//! before a protected handler runs.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use mealgram_auth::middleware::{AuthState, TelegramAuth};
//!
//! async fn protected_handler(TelegramAuth(user): TelegramAuth) -> String {
//!     format!("Hello, user {}!", user.telegram_id)
//! }
//!
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .with_state(auth_state);
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::error::AuthError;
use crate::init_data::InitData;
use crate::replay::ReplayGuard;
use crate::storage::{PersistedUser, UserStorage};
use crate::verifier;

use super::error::AuthRejection;

/// Request header carrying the init-data payload.
pub const INIT_DATA_HEADER: &str = "x-telegram-init-data";

// =============================================================================
// Auth State
// =============================================================================

/// State required for init-data authentication.
///
/// Include this in your application state and make it available to the
/// `TelegramAuth` extractor via `FromRef`.
#[derive(Clone)]
pub struct AuthState {
    /// Bot token shared with the platform. Never logged, never echoed.
    bot_token: Arc<str>,

    /// Replay guard for accepted signatures.
    pub replay: Arc<ReplayGuard>,

    /// User storage for resolving identities.
    pub users: Arc<dyn UserStorage>,

    /// Attach internal error detail to rejections. Leave off in
    /// production.
    pub expose_error_detail: bool,
}

impl AuthState {
    /// Creates a new auth state.
    pub fn new(
        bot_token: impl Into<Arc<str>>,
        replay: Arc<ReplayGuard>,
        users: Arc<dyn UserStorage>,
    ) -> Self {
        Self {
            bot_token: bot_token.into(),
            replay,
            users,
            expose_error_detail: false,
        }
    }

    /// Enables error detail in rejection bodies (non-production only).
    #[must_use]
    pub fn with_expose_error_detail(mut self, expose: bool) -> Self {
        self.expose_error_detail = expose;
        self
    }

    /// Run the full authentication pipeline on a raw init-data payload.
    ///
    /// Verifier first, then replay admission of the verified hash, then
    /// the identity upsert. Failure at any stage rejects the request;
    /// a failed upsert is an authentication failure, not something to
    /// ignore, because handlers require a resolved user.
    ///
    /// # Errors
    ///
    /// Returns the stage-specific [`AuthError`]; callers surface it
    /// uniformly as an unauthorized response.
    pub async fn authenticate(&self, raw_init_data: &str) -> Result<PersistedUser, AuthError> {
        let init_data = InitData::parse(raw_init_data);
        let identity = verifier::verify(&init_data, &self.bot_token)?;

        // verify() guarantees the hash is present at this point.
        let hash = init_data
            .hash()
            .ok_or_else(|| AuthError::malformed("missing hash field"))?;
        self.replay.admit(hash)?;

        let user = self.users.upsert(&identity).await.map_err(|e| {
            tracing::error!(telegram_id = identity.id, error = %e, "Identity upsert failed");
            e
        })?;

        tracing::debug!(
            telegram_id = user.telegram_id,
            username = user.username.as_deref().unwrap_or(""),
            "Request authenticated"
        );
        Ok(user)
    }
}

// =============================================================================
// Telegram Auth Extractor
// =============================================================================

/// Axum extractor that authenticates a request and yields the resolved
/// user.
///
/// This extractor:
/// 1. Reads the `X-Telegram-Init-Data` header
/// 2. Verifies the payload signature and freshness
/// 3. Admits the signature through the replay guard
/// 4. Upserts the user record and attaches it to the request
///
/// # Errors
///
/// Rejects with a uniform 401 response (see [`AuthRejection`]) if any
/// stage fails.
pub struct TelegramAuth(pub PersistedUser);

impl<S> FromRequestParts<S> for TelegramAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let raw = parts
            .headers
            .get(INIT_DATA_HEADER)
            .and_then(|h| h.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AuthRejection::new(AuthError::MissingInitData, auth_state.expose_error_detail)
            })?;

        match auth_state.authenticate(raw).await {
            Ok(user) => Ok(TelegramAuth(user)),
            Err(e) => {
                tracing::debug!(error = %e, "Authentication rejected");
                Err(AuthRejection::new(e, auth_state.expose_error_detail))
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init_data::TelegramUser;
    use crate::verifier::sign;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use time::OffsetDateTime;
    use uuid::Uuid;

    const BOT_TOKEN: &str = "123456:TEST-TOKEN";

    // -------------------------------------------------------------------------
    // Mock Storage
    // -------------------------------------------------------------------------

    struct MockUserStorage {
        fail: AtomicBool,
        upsert_calls: AtomicUsize,
    }

    impl MockUserStorage {
        fn new() -> Self {
            Self {
                fail: AtomicBool::new(false),
                upsert_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl UserStorage for MockUserStorage {
        async fn upsert(&self, identity: &TelegramUser) -> Result<PersistedUser, AuthError> {
            self.upsert_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(AuthError::persistence("connection refused"));
            }
            let now = OffsetDateTime::now_utc();
            Ok(PersistedUser {
                id: Uuid::new_v4(),
                telegram_id: identity.id,
                username: identity.username.clone(),
                first_name: identity.first_name.clone(),
                last_name: identity.last_name.clone(),
                language_code: identity.language_code.clone(),
                created_at: now,
                updated_at: now,
            })
        }
    }

    // -------------------------------------------------------------------------
    // Helper Functions
    // -------------------------------------------------------------------------

    fn signed_payload(user_id: i64) -> String {
        let auth_date = OffsetDateTime::now_utc().unix_timestamp().to_string();
        let user = format!(r#"{{"id":{user_id},"username":"alice"}}"#);
        let mut lines = vec![
            format!("auth_date={auth_date}"),
            format!("user={user}"),
        ];
        lines.sort();
        let hash = sign(&lines.join("\n"), BOT_TOKEN);

        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("auth_date", &auth_date)
            .append_pair("user", &user)
            .append_pair("hash", &hash)
            .finish()
    }

    fn state_with(storage: Arc<MockUserStorage>) -> AuthState {
        AuthState::new(BOT_TOKEN, Arc::new(ReplayGuard::new()), storage)
    }

    // -------------------------------------------------------------------------
    // Tests
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_authenticate_resolves_user() {
        let storage = Arc::new(MockUserStorage::new());
        let state = state_with(storage.clone());

        let user = state.authenticate(&signed_payload(42)).await.unwrap();
        assert_eq!(user.telegram_id, 42);
        assert_eq!(user.username.as_deref(), Some("alice"));
        assert_eq!(storage.upsert_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_same_payload_is_replayed_on_second_attempt() {
        let state = state_with(Arc::new(MockUserStorage::new()));
        let payload = signed_payload(42);

        assert!(state.authenticate(&payload).await.is_ok());
        assert!(matches!(
            state.authenticate(&payload).await,
            Err(AuthError::Replayed)
        ));
    }

    #[tokio::test]
    async fn test_invalid_signature_never_reaches_storage() {
        let storage = Arc::new(MockUserStorage::new());
        let state = state_with(storage.clone());

        let result = state.authenticate("auth_date=1700000000&hash=bogus").await;
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
        assert_eq!(storage.upsert_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_persistence_failure_rejects_and_consumes_hash() {
        let storage = Arc::new(MockUserStorage::new());
        storage.fail.store(true, Ordering::SeqCst);
        let state = state_with(storage);
        let payload = signed_payload(42);

        let result = state.authenticate(&payload).await;
        assert!(matches!(result, Err(AuthError::Persistence { .. })));

        // The hash was admitted before the upsert ran; a retry with the
        // same payload is a replay.
        assert!(matches!(
            state.authenticate(&payload).await,
            Err(AuthError::Replayed)
        ));
    }
}
