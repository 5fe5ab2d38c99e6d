//! REST API client module for the prospector backend.
//!
//! This module provides the `ApiClient` for talking to the two endpoints the
//! client core depends on: the identity check at `/api/auth/user` and the
//! preferences record at `/api/preferences`.
//!
//! The engines do not use `ApiClient` directly. They are generic over the
//! `IdentityApi` and `PreferencesApi` traits so tests can script responses.

pub mod client;
pub mod error;

use async_trait::async_trait;

pub use client::ApiClient;
pub use error::ApiError;

use crate::auth::User;
use crate::preferences::PreferencesRecord;

/// Source of the currently authenticated identity.
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Fetch the current user. A 401 surfaces as `ApiError::Unauthorized`.
    async fn current_user(&self) -> Result<User, ApiError>;
}

/// Remote storage for the preferences record.
#[async_trait]
pub trait PreferencesApi: Send + Sync {
    /// Fetch the stored record, already merged over defaults.
    async fn fetch_preferences(&self) -> Result<PreferencesRecord, ApiError>;

    /// Persist the full record and return what the server stored.
    async fn store_preferences(
        &self,
        record: &PreferencesRecord,
    ) -> Result<PreferencesRecord, ApiError>;
}
