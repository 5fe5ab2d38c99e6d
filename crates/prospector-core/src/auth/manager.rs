//! The authentication state machine.
//!
//! `AuthSessionManager` owns the `Session` record and is the only thing that
//! mutates it. Callers read a `SessionState` snapshot, either directly or by
//! subscribing to the watch channel, and gate rendering on it.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{ApiError, IdentityApi};
use crate::clock::{Clock, SystemClock};

use super::{AuthConfig, Session, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Unknown,
    Checking,
    Authenticated,
    Unauthenticated,
    CircuitOpen,
}

/// What the application shell sees.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub phase: AuthPhase,
    pub user: Option<User>,
    pub is_loading: bool,
    pub is_authenticated: bool,
    pub is_logged_out: bool,
    /// Cause of the last failed check, for display only.
    pub error: Option<ApiError>,
}

impl SessionState {
    fn initial() -> Self {
        Self {
            phase: AuthPhase::Unknown,
            user: None,
            is_loading: false,
            is_authenticated: false,
            is_logged_out: false,
            error: None,
        }
    }
}

pub struct AuthSessionManager<A> {
    api: A,
    clock: Arc<dyn Clock>,
    config: AuthConfig,
    session: Session,
    phase: AuthPhase,
    error: Option<ApiError>,
    state_tx: watch::Sender<SessionState>,
}

impl<A: IdentityApi> AuthSessionManager<A> {
    pub fn new(api: A, config: AuthConfig) -> Self {
        Self::with_clock(api, config, Arc::new(SystemClock))
    }

    pub fn with_clock(api: A, config: AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let (state_tx, _) = watch::channel(SessionState::initial());
        Self {
            api,
            clock,
            session: Session::new(&config),
            config,
            phase: AuthPhase::Unknown,
            error: None,
            state_tx,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Current state, with the breaker evaluated against the clock.
    pub fn state(&self) -> SessionState {
        let circuit_open = self.session.is_circuit_open(self.clock.now());
        let is_loading = self.phase == AuthPhase::Checking;
        let is_logged_out = (self.error.is_some() && !is_loading) || circuit_open;
        let user = self.session.user().cloned();

        let phase = if self.phase == AuthPhase::CircuitOpen && !circuit_open {
            AuthPhase::Unauthenticated
        } else {
            self.phase
        };

        SessionState {
            phase,
            is_authenticated: user.is_some() && !is_logged_out,
            user,
            is_loading,
            is_logged_out,
            error: self.error.clone(),
        }
    }

    /// Initial check when the shell starts.
    pub async fn mount(&mut self) -> SessionState {
        self.check().await
    }

    /// Manual refresh. Still honours the breaker.
    pub async fn refresh(&mut self) -> SessionState {
        self.check().await
    }

    /// Route change. Arrival at a protected route clears the breaker
    /// regardless of elapsed time; the identity is then re-checked unless a
    /// recent successful check is still fresh.
    pub async fn navigate(&mut self, path: &str) -> SessionState {
        if self.config.is_protected_route(path) {
            if self.session.failure_count() > 0 {
                info!(path = path, failures = self.session.failure_count(), "Protected route reached, resetting circuit breaker");
            }
            self.session.reset_failures();
        }

        let now = self.clock.now();
        if self.phase == AuthPhase::Authenticated
            && self.session.is_fresh(now, self.config.stale_after())
        {
            debug!(path = path, "Identity still fresh, skipping check");
            return self.state();
        }

        self.check().await
    }

    /// Forget the current user locally after the server session is gone.
    pub fn sign_out(&mut self) -> SessionState {
        info!("Signed out");
        self.session.clear_user();
        self.error = None;
        self.phase = AuthPhase::Unauthenticated;
        self.publish()
    }

    async fn check(&mut self) -> SessionState {
        let now = self.clock.now();
        if self.session.expire_failures(now) {
            debug!("Reset window elapsed, circuit breaker closed");
        }

        if self.session.is_circuit_open(now) {
            debug!(failures = self.session.failure_count(), "Circuit open, skipping identity check");
            self.phase = AuthPhase::CircuitOpen;
            return self.publish();
        }

        self.phase = AuthPhase::Checking;
        self.publish();

        let result = self.api.current_user().await;
        let now = self.clock.now();

        match result {
            Ok(user) => {
                info!(user_id = %user.id, "Authenticated");
                self.session.record_success(user, now);
                self.error = None;
                self.phase = AuthPhase::Authenticated;
            }
            Err(e) if e.is_unauthorized() => {
                debug!("Not authenticated");
                self.session.record_unauthenticated();
                self.error = Some(e);
                self.phase = AuthPhase::Unauthenticated;
            }
            // Every non-401 error counts toward the breaker, transient or not
            Err(e) => {
                let opened = self.session.record_failure(now);
                let transient = e.is_transient();
                if opened {
                    warn!(error = %e, transient, failures = self.session.failure_count(), "Identity check failed, circuit breaker open");
                    self.phase = AuthPhase::CircuitOpen;
                } else {
                    warn!(error = %e, transient, failures = self.session.failure_count(), "Identity check failed");
                    self.phase = AuthPhase::Unauthenticated;
                }
                self.error = Some(e);
            }
        }

        self.publish()
    }

    fn publish(&self) -> SessionState {
        let state = self.state();
        self.state_tx.send_replace(state.clone());
        state
    }
}
