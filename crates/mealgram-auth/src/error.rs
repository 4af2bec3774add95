//! Authentication error types.

/// Errors that can occur while authenticating a request.
///
/// Every variant is surfaced to the caller as a uniform unauthorized
/// rejection; the variants only differ in what gets logged and, in
/// non-production deployments, in the detail attached to the response.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request did not carry an init-data header at all.
    #[error("No auth data provided")]
    MissingInitData,

    /// The init-data payload is structurally invalid: missing `hash`
    /// or `auth_date`, or the embedded `user` object cannot be parsed.
    #[error("Malformed init data: {message}")]
    Malformed {
        /// Description of what is malformed.
        message: String,
    },

    /// The init data was issued more than 24 hours ago.
    #[error("Auth data expired")]
    Expired,

    /// The signature was already admitted within the replay window.
    #[error("Auth data already used")]
    Replayed,

    /// The computed signature does not match the supplied hash.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The user record could not be persisted after verification.
    ///
    /// Downstream handlers require a resolved identity, so a failed
    /// upsert rejects the request rather than being ignored.
    #[error("Identity persistence failed: {message}")]
    Persistence {
        /// Description of the storage failure.
        message: String,
    },
}

impl AuthError {
    /// Create a `Malformed` error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Create a `Persistence` error.
    #[must_use]
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a `Replayed` error.
    #[must_use]
    pub fn is_replayed(&self) -> bool {
        matches!(self, Self::Replayed)
    }

    /// Returns `true` if this is a `Persistence` error.
    #[must_use]
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }
}
