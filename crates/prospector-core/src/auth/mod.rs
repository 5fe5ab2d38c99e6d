//! Authentication module for tracking the signed-in user.
//!
//! This module provides:
//! - `AuthSessionManager`: polls `/api/auth/user` and exposes `SessionState`
//! - `Session`: the failure counters and circuit breaker behind the manager
//! - `User`: the identity returned by the backend
//!
//! After `MAX_FAILURES` consecutive faults the breaker opens and no identity
//! requests are issued until `RESET_WINDOW` passes or the user lands on a
//! protected route.

pub mod manager;
pub mod session;
pub mod user;

pub use manager::{AuthPhase, AuthSessionManager, SessionState};
pub use session::{AuthConfig, Session, MAX_FAILURES, PROTECTED_ROUTES, RESET_WINDOW_SECS};
pub use user::User;
