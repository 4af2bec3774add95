//! Replay protection for accepted signatures.
//!
//! A verified signature may be admitted once; a second admission
//! attempt within the replay window is refused. The guard is an
//! explicit component instance, not ambient global state, so a
//! multi-instance deployment can swap in a shared store without
//! touching call sites.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use time::{Duration, OffsetDateTime};

use crate::error::AuthError;

/// How long an admitted signature stays blocked.
pub const DEFAULT_WINDOW: Duration = Duration::minutes(5);

/// Tracks which signature digests have already been consumed.
///
/// Check-and-insert is a single indivisible operation under one lock,
/// which keeps the at-most-once guarantee on a multi-threaded runtime.
/// Expired records are evicted lazily when their digest is checked
/// again; [`sweep`](Self::sweep) removes the rest and can be driven by
/// a periodic task.
#[derive(Debug)]
pub struct ReplayGuard {
    window: Duration,
    records: Mutex<HashMap<String, OffsetDateTime>>,
}

impl ReplayGuard {
    /// Create a guard with the default 5-minute window.
    #[must_use]
    pub fn new() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }

    /// Create a guard with an explicit window.
    #[must_use]
    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Admit a signature digest.
    ///
    /// A digest with no live record is recorded with
    /// `expires_at = now + window` and admitted; a digest with a live
    /// record is refused without mutating state. Once a record's window
    /// elapses the digest becomes eligible for re-admission.
    ///
    /// # Errors
    ///
    /// Returns `Replayed` if a live record exists. The guard has no
    /// other failure mode.
    pub fn admit(&self, digest: &str) -> Result<(), AuthError> {
        let now = OffsetDateTime::now_utc();
        let mut records = self.lock();

        if let Some(&expires_at) = records.get(digest) {
            if expires_at > now {
                tracing::debug!("Replay attempt blocked");
                return Err(AuthError::Replayed);
            }
        }

        records.insert(digest.to_owned(), now + self.window);
        Ok(())
    }

    /// Remove a single record, live or not.
    ///
    /// Returns `true` if a record existed.
    pub fn evict(&self, digest: &str) -> bool {
        self.lock().remove(digest).is_some()
    }

    /// Remove all expired records; returns how many were evicted.
    pub fn sweep(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        let mut records = self.lock();
        let before = records.len();
        records.retain(|_, expires_at| *expires_at > now);
        before - records.len()
    }

    /// Number of records currently held, including expired ones not
    /// yet swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if no records are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Spawn the periodic expired-record sweep.
    ///
    /// Lazy eviction only fires when the same digest is checked again;
    /// under normal traffic every request carries a fresh digest, so an
    /// unswept guard grows for the life of the process. The sweep task
    /// bounds that growth.
    pub fn spawn_sweep(
        self: &Arc<Self>,
        period: std::time::Duration,
    ) -> tokio::task::JoinHandle<()> {
        let guard = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick fires immediately; skip it so the sweep
            // runs one full period after startup.
            interval.tick().await;
            loop {
                interval.tick().await;
                let evicted = guard.sweep();
                if evicted > 0 {
                    tracing::debug!(evicted, "Expired replay records swept");
                }
            }
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, OffsetDateTime>> {
        // The critical sections never panic, so poisoning is unreachable;
        // recover the inner map rather than propagate it.
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for ReplayGuard {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
