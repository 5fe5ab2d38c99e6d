//! User preferences: the record, typed edits, and the engine that syncs the
//! record with `/api/preferences` and reflects its visual subset on a
//! `Document`.

pub mod engine;
pub mod error;
pub mod record;

pub use engine::{PreferencesEngine, PreferencesSnapshot};
pub use error::PreferencesError;
pub use record::{Preference, PreferencesRecord, Theme};
