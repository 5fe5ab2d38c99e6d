//! Prospector core - client-side session and preferences engines.
//!
//! This crate provides the pieces of the prospector client that own state:
//! - `AuthSessionManager`: polls the identity endpoint behind a circuit breaker
//! - `PreferencesEngine`: syncs the preferences record and applies its visual
//!   subset to a `Document`
//!
//! Both engines talk to the backend through the traits in [`api`] and read
//! time through an injected [`Clock`].

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod document;
pub mod preferences;

pub use api::{ApiClient, ApiError, IdentityApi, PreferencesApi};
pub use auth::{AuthConfig, AuthPhase, AuthSessionManager, SessionState, User};
pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "testing"))]
pub use clock::ManualClock;
pub use config::Config;
pub use document::{Document, MemoryDocument};
pub use preferences::{
    Preference, PreferencesEngine, PreferencesError, PreferencesRecord, PreferencesSnapshot, Theme,
};
