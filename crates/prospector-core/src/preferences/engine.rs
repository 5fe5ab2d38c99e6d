//! Preferences synchronization.
//!
//! `PreferencesEngine` owns the in-memory record and the document it styles.
//! Every operation that changes the record re-applies the visual subset before
//! returning, so a caller that sees the operation complete can rely on the
//! document already matching.

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::PreferencesApi;
use crate::document::{apply_visual_preferences, Document};

use super::{Preference, PreferencesError, PreferencesRecord};

/// What the application shell sees.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferencesSnapshot {
    pub preferences: PreferencesRecord,
    pub is_loading: bool,
    /// Last load or save failure, for display only.
    pub error: Option<PreferencesError>,
}

pub struct PreferencesEngine<A, D> {
    api: A,
    document: D,
    record: PreferencesRecord,
    /// Last record known to match the server.
    committed: PreferencesRecord,
    is_loading: bool,
    error: Option<PreferencesError>,
    state_tx: watch::Sender<PreferencesSnapshot>,
}

impl<A: PreferencesApi, D: Document> PreferencesEngine<A, D> {
    /// Start from defaults. The document is styled immediately so it is never
    /// left unstyled while the first load is in flight.
    pub fn new(api: A, mut document: D) -> Self {
        let record = PreferencesRecord::default();
        apply_visual_preferences(&mut document, &record);

        let (state_tx, _) = watch::channel(PreferencesSnapshot {
            preferences: record.clone(),
            is_loading: false,
            error: None,
        });

        Self {
            api,
            document,
            committed: record.clone(),
            record,
            is_loading: false,
            error: None,
            state_tx,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    /// Mutable access for environment changes (e.g. the OS color scheme
    /// flipping). Call `reapply` afterwards.
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    pub fn preferences(&self) -> &PreferencesRecord {
        &self.record
    }

    /// True when local edits have not been saved.
    pub fn is_dirty(&self) -> bool {
        self.record != self.committed
    }

    pub fn snapshot(&self) -> PreferencesSnapshot {
        PreferencesSnapshot {
            preferences: self.record.clone(),
            is_loading: self.is_loading,
            error: self.error.clone(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PreferencesSnapshot> {
        self.state_tx.subscribe()
    }

    /// Fetch the stored record and make it current.
    ///
    /// On failure the document is styled from defaults, the in-memory record
    /// is left alone, and the error is returned for logging. If an earlier
    /// load or save committed a non-default record, the document and
    /// `preferences()` disagree until the next `update`, `reapply` or
    /// successful load.
    pub async fn load(&mut self) -> Result<PreferencesRecord, PreferencesError> {
        self.set_loading(true);
        let result = self.api.fetch_preferences().await;
        self.is_loading = false;

        match result {
            Ok(record) => {
                debug!(theme = %record.theme, "Preferences loaded");
                self.record = record.clone();
                self.committed = record.clone();
                self.error = None;
                apply_visual_preferences(&mut self.document, &self.record);
                self.publish();
                Ok(record)
            }
            Err(e) => {
                let err = PreferencesError::from(e);
                warn!(error = %err, "Failed to load preferences, styling from defaults");
                apply_visual_preferences(&mut self.document, &PreferencesRecord::default());
                self.error = Some(err.clone());
                self.publish();
                Err(err)
            }
        }
    }

    /// Persist `record`. On success it becomes the current and committed
    /// record; on failure nothing local changes.
    pub async fn save(&mut self, record: PreferencesRecord) -> Result<(), PreferencesError> {
        self.set_loading(true);
        let result = self.api.store_preferences(&record).await;
        self.is_loading = false;

        match result {
            Ok(stored) => {
                info!("Preferences saved");
                self.record = stored.clone();
                self.committed = stored;
                self.error = None;
                apply_visual_preferences(&mut self.document, &self.record);
                self.publish();
                Ok(())
            }
            Err(e) => {
                let err = PreferencesError::from(e);
                warn!(error = %err, "Failed to save preferences");
                self.error = Some(err.clone());
                self.publish();
                Err(err)
            }
        }
    }

    /// Persist the current in-memory record, including unsaved edits.
    pub async fn save_current(&mut self) -> Result<(), PreferencesError> {
        let record = self.record.clone();
        self.save(record).await
    }

    /// Optimistic local edit. Not persisted until `save`.
    pub fn update(&mut self, change: Preference) -> &PreferencesRecord {
        debug!(key = change.key(), "Preference updated locally");
        self.record.apply(change);
        apply_visual_preferences(&mut self.document, &self.record);
        self.publish();
        &self.record
    }

    /// Restore defaults locally. Not persisted until `save`.
    pub fn reset(&mut self) -> &PreferencesRecord {
        self.record = PreferencesRecord::default();
        apply_visual_preferences(&mut self.document, &self.record);
        self.publish();
        &self.record
    }

    /// Drop unsaved edits and go back to the committed record.
    pub fn discard_changes(&mut self) -> &PreferencesRecord {
        self.record = self.committed.clone();
        apply_visual_preferences(&mut self.document, &self.record);
        self.publish();
        &self.record
    }

    /// Re-apply the current record, e.g. after the environment's color
    /// scheme changed under `Theme::System`.
    pub fn reapply(&mut self) {
        apply_visual_preferences(&mut self.document, &self.record);
    }

    fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
        self.publish();
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::document::MemoryDocument;
    use crate::preferences::Theme;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Backend that stores what it is given and can be told to fail.
    #[derive(Default)]
    struct FakeStore {
        stored: Mutex<Option<PreferencesRecord>>,
        fail_fetch: Mutex<Option<ApiError>>,
        fail_store: Mutex<Option<ApiError>>,
        observer: Mutex<Option<watch::Receiver<PreferencesSnapshot>>>,
        loading_in_flight: Mutex<Vec<bool>>,
    }

    impl FakeStore {
        fn observe(&self, rx: watch::Receiver<PreferencesSnapshot>) {
            *self.observer.lock().unwrap() = Some(rx);
        }

        fn record_loading(&self) {
            if let Some(rx) = self.observer.lock().unwrap().as_ref() {
                let loading = rx.borrow().is_loading;
                self.loading_in_flight.lock().unwrap().push(loading);
            }
        }

        fn with_record(record: PreferencesRecord) -> Self {
            Self {
                stored: Mutex::new(Some(record)),
                ..Self::default()
            }
        }

        fn unreachable() -> Self {
            Self {
                fail_fetch: Mutex::new(Some(ApiError::NetworkError("connection refused".into()))),
                fail_store: Mutex::new(Some(ApiError::NetworkError("connection refused".into()))),
                ..Self::default()
            }
        }

        fn fail_next_store(&self, err: ApiError) {
            *self.fail_store.lock().unwrap() = Some(err);
        }
    }

    #[async_trait]
    impl PreferencesApi for FakeStore {
        async fn fetch_preferences(&self) -> Result<PreferencesRecord, ApiError> {
            self.record_loading();
            if let Some(err) = self.fail_fetch.lock().unwrap().clone() {
                return Err(err);
            }
            Ok(self.stored.lock().unwrap().clone().unwrap_or_default())
        }

        async fn store_preferences(
            &self,
            record: &PreferencesRecord,
        ) -> Result<PreferencesRecord, ApiError> {
            self.record_loading();
            if let Some(err) = self.fail_store.lock().unwrap().take() {
                return Err(err);
            }
            *self.stored.lock().unwrap() = Some(record.clone());
            Ok(record.clone())
        }
    }

    fn dark_compact() -> PreferencesRecord {
        PreferencesRecord {
            theme: Theme::Dark,
            compact_mode: true,
            animations_enabled: false,
            font_size: 16,
            ..PreferencesRecord::default()
        }
    }

    #[test]
    fn test_new_styles_document_with_defaults() {
        let engine = PreferencesEngine::new(FakeStore::default(), MemoryDocument::new());
        let doc = engine.document();
        assert!(doc.has_marker("light"));
        assert_eq!(doc.font_size(), Some(14));
        assert!(!doc.has_marker("compact"));
        assert_eq!(doc.style_count(), 0);
    }

    #[tokio::test]
    async fn test_load_replaces_record_and_applies() {
        let mut engine = PreferencesEngine::new(
            FakeStore::with_record(dark_compact()),
            MemoryDocument::new(),
        );

        let loaded = engine.load().await.unwrap();
        assert_eq!(loaded, dark_compact());
        assert_eq!(engine.preferences(), &dark_compact());

        let doc = engine.document();
        assert!(doc.has_marker("dark"));
        assert!(doc.has_marker("compact"));
        assert!(doc.has_marker("reduce-motion"));
        assert_eq!(doc.font_size(), Some(16));
        assert!(!engine.snapshot().is_loading);
    }

    #[tokio::test]
    async fn test_load_unreachable_still_styles_document() {
        let mut engine = PreferencesEngine::new(FakeStore::unreachable(), MemoryDocument::new());
        // Scramble the document first to prove load restyles it
        engine.document_mut().add_marker("dark");
        engine.document_mut().set_font_size(40);

        let err = engine.load().await.unwrap_err();
        assert!(err.is_network());

        let doc = engine.document();
        assert!(doc.has_marker("light"));
        assert!(!doc.has_marker("dark"));
        assert_eq!(doc.font_size(), Some(14));
        assert!(!doc.has_marker("compact"));
        assert!(!doc.has_marker("reduce-motion"));

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.preferences, PreferencesRecord::default());
        assert!(!snapshot.is_loading);
        assert!(snapshot.error.is_some());
    }

    #[tokio::test]
    async fn test_save_commits_and_applies() {
        let mut engine = PreferencesEngine::new(FakeStore::default(), MemoryDocument::new());
        engine.save(dark_compact()).await.unwrap();

        assert_eq!(engine.preferences(), &dark_compact());
        assert!(engine.document().has_marker("dark"));
        assert!(!engine.is_dirty());
    }

    #[tokio::test]
    async fn test_failed_save_leaves_committed_record() {
        let store = FakeStore::default();
        let mut engine = PreferencesEngine::new(store, MemoryDocument::new());
        engine.save(dark_compact()).await.unwrap();

        engine.api().fail_next_store(ApiError::ServerError {
            status: 500,
            message: "Failed to update preferences".into(),
        });
        let attempted = PreferencesRecord {
            theme: Theme::Light,
            ..dark_compact()
        };
        let err = engine.save(attempted).await.unwrap_err();
        assert_eq!(
            err,
            PreferencesError::Rejected {
                status: 500,
                message: "Failed to update preferences".into()
            }
        );

        assert_eq!(engine.preferences(), &dark_compact());
        assert!(engine.document().has_marker("dark"));

        let reloaded = engine.load().await.unwrap();
        assert_eq!(reloaded, dark_compact());
    }

    #[tokio::test]
    async fn test_save_network_error_is_distinguished() {
        let mut engine = PreferencesEngine::new(FakeStore::unreachable(), MemoryDocument::new());
        let err = engine.save(dark_compact()).await.unwrap_err();
        assert!(err.is_network());
        assert_eq!(engine.preferences(), &PreferencesRecord::default());
    }

    #[test]
    fn test_update_is_local_and_immediate() {
        let mut engine = PreferencesEngine::new(FakeStore::default(), MemoryDocument::new());

        engine.update(Preference::FontSize(25));
        assert_eq!(engine.preferences().font_size, 25);
        assert_eq!(engine.document().font_size(), Some(18));

        engine.update(Preference::FontSize(5));
        assert_eq!(engine.preferences().font_size, 5);
        assert_eq!(engine.document().font_size(), Some(12));

        engine.update(Preference::AnimationsEnabled(false));
        assert!(engine.document().has_marker("reduce-motion"));

        assert!(engine.is_dirty());
        // Nothing reached the server
        assert!(engine.api().stored.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_current_persists_edits() {
        let mut engine = PreferencesEngine::new(FakeStore::default(), MemoryDocument::new());
        engine.update(Preference::Theme(Theme::Dark));
        engine.save_current().await.unwrap();

        assert!(!engine.is_dirty());
        let stored = engine.api().stored.lock().unwrap().clone().unwrap();
        assert_eq!(stored.theme, Theme::Dark);
    }

    #[tokio::test]
    async fn test_discard_and_reset() {
        let mut engine = PreferencesEngine::new(
            FakeStore::with_record(dark_compact()),
            MemoryDocument::new(),
        );
        engine.load().await.unwrap();

        engine.update(Preference::Theme(Theme::Light));
        engine.discard_changes();
        assert_eq!(engine.preferences(), &dark_compact());
        assert!(engine.document().has_marker("dark"));

        engine.reset();
        assert_eq!(engine.preferences(), &PreferencesRecord::default());
        assert!(engine.is_dirty());
        assert_eq!(engine.document().style_count(), 0);
    }

    #[test]
    fn test_reapply_follows_environment_scheme() {
        let mut engine = PreferencesEngine::new(FakeStore::default(), MemoryDocument::new());
        assert!(engine.document().has_marker("light"));

        engine.document_mut().set_prefers_dark_scheme(true);
        engine.reapply();
        assert!(engine.document().has_marker("dark"));
        assert!(!engine.document().has_marker("light"));
    }

    #[tokio::test]
    async fn test_is_loading_while_load_and_save_in_flight() {
        let mut engine = PreferencesEngine::new(
            FakeStore::with_record(dark_compact()),
            MemoryDocument::new(),
        );
        engine.api().observe(engine.subscribe());

        engine.load().await.unwrap();
        assert!(!engine.snapshot().is_loading);

        engine.save(PreferencesRecord::default()).await.unwrap();
        assert!(!engine.snapshot().is_loading);

        assert_eq!(*engine.api().loading_in_flight.lock().unwrap(), vec![true, true]);
        assert!(!engine.subscribe().borrow().is_loading);
    }

    #[tokio::test]
    async fn test_is_loading_cleared_after_failures() {
        let mut engine = PreferencesEngine::new(FakeStore::unreachable(), MemoryDocument::new());
        engine.api().observe(engine.subscribe());

        let _ = engine.load().await;
        let _ = engine.save(dark_compact()).await;

        assert_eq!(*engine.api().loading_in_flight.lock().unwrap(), vec![true, true]);
        assert!(!engine.subscribe().borrow().is_loading);
    }

    #[tokio::test]
    async fn test_subscribers_see_snapshots() {
        let mut engine = PreferencesEngine::new(
            FakeStore::with_record(dark_compact()),
            MemoryDocument::new(),
        );
        let rx = engine.subscribe();
        engine.load().await.unwrap();

        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.preferences, dark_compact());
        assert!(!snapshot.is_loading);
    }
}
