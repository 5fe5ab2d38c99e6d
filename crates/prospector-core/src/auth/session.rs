use anyhow::{ensure, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::User;

/// Consecutive identity-check faults that open the circuit breaker.
pub const MAX_FAILURES: u32 = 2;

/// Seconds after the last fault before the breaker closes on its own.
pub const RESET_WINDOW_SECS: i64 = 60;

/// Routes whose arrival clears the breaker.
/// Identity-provider redirects land here after login, so a stale open breaker
/// must not hide the fresh session.
pub const PROTECTED_ROUTES: &[&str] = &["/", "/dashboard"];

/// How long a successful identity check satisfies navigation re-checks.
const DEFAULT_STALE_AFTER_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub max_failures: u32,
    pub reset_window_secs: i64,
    pub protected_routes: Vec<String>,
    pub stale_after_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            max_failures: MAX_FAILURES,
            reset_window_secs: RESET_WINDOW_SECS,
            protected_routes: PROTECTED_ROUTES.iter().map(|r| r.to_string()).collect(),
            stale_after_secs: DEFAULT_STALE_AFTER_SECS,
        }
    }
}

impl AuthConfig {
    /// Reject values the breaker cannot work with.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.max_failures >= 1,
            "max_failures must be at least 1, got {}",
            self.max_failures
        );
        ensure!(
            self.reset_window_secs >= 0 && Duration::try_seconds(self.reset_window_secs).is_some(),
            "reset_window_secs out of range: {}",
            self.reset_window_secs
        );
        ensure!(
            self.stale_after_secs >= 0 && Duration::try_seconds(self.stale_after_secs).is_some(),
            "stale_after_secs out of range: {}",
            self.stale_after_secs
        );
        Ok(())
    }

    /// Out-of-range values fall back to the default window.
    pub fn reset_window(&self) -> Duration {
        seconds_or(self.reset_window_secs, RESET_WINDOW_SECS)
    }

    pub fn stale_after(&self) -> Duration {
        seconds_or(self.stale_after_secs, DEFAULT_STALE_AFTER_SECS)
    }

    /// Whether arriving at `path` should clear the breaker.
    /// Query string, fragment and a trailing slash are ignored.
    pub fn is_protected_route(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.protected_routes
            .iter()
            .any(|route| normalize_path(route) == path)
    }
}

fn seconds_or(secs: i64, fallback: i64) -> Duration {
    match Duration::try_seconds(secs) {
        Some(d) if secs >= 0 => d,
        _ => Duration::seconds(fallback),
    }
}

fn normalize_path(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = path[..end].trim_end_matches('/');
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

/// Process-wide authentication record, owned by `AuthSessionManager`.
#[derive(Debug, Clone)]
pub struct Session {
    user: Option<User>,
    failure_count: u32,
    last_failure_at: Option<DateTime<Utc>>,
    last_success_at: Option<DateTime<Utc>>,
    max_failures: u32,
    reset_window: Duration,
}

impl Session {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            user: None,
            failure_count: 0,
            last_failure_at: None,
            last_success_at: None,
            // Zero would hold the breaker open before any fault
            max_failures: config.max_failures.max(1),
            reset_window: config.reset_window(),
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn last_failure_at(&self) -> Option<DateTime<Utc>> {
        self.last_failure_at
    }

    fn window_elapsed(&self, now: DateTime<Utc>) -> bool {
        self.last_failure_at
            .map(|at| now - at > self.reset_window)
            .unwrap_or(false)
    }

    /// Breaker state as of `now`. Read-only: the counter itself is only
    /// cleared by `expire_failures`.
    pub fn is_circuit_open(&self, now: DateTime<Utc>) -> bool {
        self.failure_count >= self.max_failures && !self.window_elapsed(now)
    }

    /// Lazily forget faults older than the reset window.
    /// Returns true if anything was cleared.
    pub fn expire_failures(&mut self, now: DateTime<Utc>) -> bool {
        if self.failure_count > 0 && self.window_elapsed(now) {
            self.reset_failures();
            true
        } else {
            false
        }
    }

    pub fn reset_failures(&mut self) {
        self.failure_count = 0;
        self.last_failure_at = None;
    }

    pub fn record_success(&mut self, user: User, now: DateTime<Utc>) {
        self.user = Some(user);
        self.last_success_at = Some(now);
        self.reset_failures();
    }

    /// A 401 is a valid answer, not a fault: the counter is left alone.
    pub fn record_unauthenticated(&mut self) {
        self.user = None;
        self.last_success_at = None;
    }

    /// Count a fault. Returns true if this fault opened the breaker.
    pub fn record_failure(&mut self, now: DateTime<Utc>) -> bool {
        let was_open = self.failure_count >= self.max_failures;
        self.failure_count = self.failure_count.saturating_add(1);
        self.last_failure_at = Some(now);
        !was_open && self.failure_count >= self.max_failures
    }

    pub fn clear_user(&mut self) {
        self.user = None;
        self.last_success_at = None;
    }

    /// Whether the last successful check is recent enough to skip re-checking.
    pub fn is_fresh(&self, now: DateTime<Utc>, stale_after: Duration) -> bool {
        self.last_success_at
            .map(|at| now - at <= stale_after)
            .unwrap_or(false)
    }
}
