//! Playground state container
//!
//! Owns the catalog, the per-model config and run-state maps and the
//! session fields. Every mutation is applied under one write lock and
//! published as an immutable snapshot, so subscribers see whole updates in
//! the order they were applied.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::broadcast;

use tts_playground_core::{BatchSummary, ConfigMap, ConfigValue, ModelDescriptor};

use crate::config_store::ModelConfigs;
use crate::run_state::{RunState, RunStates};

/// Immutable view of the whole playground at one revision
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlaygroundSnapshot {
    /// Bumped by every applied update
    pub revision: u64,
    /// Bumped by every successful catalog load
    pub catalog_epoch: u64,
    pub models: Vec<ModelDescriptor>,
    pub active_model_id: Option<String>,
    /// Batch membership, in selection order
    pub selected_model_ids: Vec<String>,
    pub text: String,
    pub configs: ModelConfigs,
    pub runs: RunStates,
    pub loading_catalog: bool,
    /// Catalog load failure; the only global error
    pub global_error: Option<String>,
    pub last_batch_summary: Option<BatchSummary>,
}

impl PlaygroundSnapshot {
    pub fn model(&self, model_id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.model_id == model_id)
    }

    pub fn has_model(&self, model_id: &str) -> bool {
        self.model(model_id).is_some()
    }

    pub fn active_model(&self) -> Option<&ModelDescriptor> {
        self.active_model_id.as_deref().and_then(|id| self.model(id))
    }

    pub fn is_selected(&self, model_id: &str) -> bool {
        self.selected_model_ids.iter().any(|id| id == model_id)
    }

    /// Models the backend reports as not ready
    pub fn unconfigured_models(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.iter().filter(|m| !m.configured)
    }
}

/// Shared, explicitly owned playground state
pub struct PlaygroundStore {
    state: RwLock<Arc<PlaygroundSnapshot>>,
    event_tx: broadcast::Sender<Arc<PlaygroundSnapshot>>,
}

impl PlaygroundStore {
    /// Create an empty store; `event_capacity` bounds each subscriber's backlog
    pub fn new(default_text: impl Into<String>, event_capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(event_capacity.max(1));
        let initial = PlaygroundSnapshot {
            text: default_text.into(),
            ..Default::default()
        };

        Self {
            state: RwLock::new(Arc::new(initial)),
            event_tx,
        }
    }

    /// Latest snapshot
    pub fn snapshot(&self) -> Arc<PlaygroundSnapshot> {
        self.state.read().clone()
    }

    /// Subscribe to every applied update
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<PlaygroundSnapshot>> {
        self.event_tx.subscribe()
    }

    /// Apply `mutate` to a copy of the current state.
    ///
    /// When it reports a change the copy replaces the state and is published
    /// before the lock is released, which keeps publication order equal to
    /// application order.
    fn update<F>(&self, mutate: F) -> bool
    where
        F: FnOnce(&mut PlaygroundSnapshot) -> bool,
    {
        let mut guard = self.state.write();
        let mut next = PlaygroundSnapshot::clone(&guard);
        if !mutate(&mut next) {
            return false;
        }
        next.revision += 1;

        let next = Arc::new(next);
        *guard = Arc::clone(&next);
        // No subscribers is fine
        let _ = self.event_tx.send(next);
        true
    }

    // ---- catalog -------------------------------------------------------

    /// Mark a catalog fetch as in flight and clear the global error
    pub fn begin_catalog_load(&self) {
        self.update(|state| {
            state.loading_catalog = true;
            state.global_error = None;
            true
        });
    }

    /// Replace the catalog and everything derived from it.
    ///
    /// Config edits, run states and the batch summary of the previous catalog
    /// are discarded; results of requests still in flight will be dropped
    /// because the catalog epoch changes.
    pub fn apply_catalog(&self, models: Vec<ModelDescriptor>) {
        self.update(|state| {
            state.active_model_id = models.first().map(|m| m.model_id.clone());
            state.selected_model_ids = models.iter().map(|m| m.model_id.clone()).collect();
            state.configs = ModelConfigs::defaults_for(&models);
            state.runs = RunStates::for_catalog(&models);
            state.models = models;
            state.last_batch_summary = None;
            state.global_error = None;
            state.loading_catalog = false;
            state.catalog_epoch += 1;
            true
        });
    }

    /// Record a catalog load failure; the current catalog is kept as-is
    pub fn fail_catalog_load(&self, message: impl Into<String>) {
        let message = message.into();
        self.update(|state| {
            state.global_error = Some(message);
            state.loading_catalog = false;
            true
        });
    }

    // ---- session -------------------------------------------------------

    /// Make a catalog model the active one. Unknown ids are ignored.
    pub fn set_active_model(&self, model_id: &str) -> bool {
        let changed = self.update(|state| {
            if !state.has_model(model_id) {
                return false;
            }
            state.active_model_id = Some(model_id.to_string());
            true
        });
        if !changed {
            tracing::debug!(model_id, "Ignoring activation of unknown model");
        }
        changed
    }

    /// Add a catalog model to the batch selection, or remove it
    pub fn toggle_selected_model(&self, model_id: &str) -> bool {
        let changed = self.update(|state| {
            if !state.has_model(model_id) {
                return false;
            }
            if let Some(pos) = state.selected_model_ids.iter().position(|id| id == model_id) {
                state.selected_model_ids.remove(pos);
            } else {
                state.selected_model_ids.push(model_id.to_string());
            }
            true
        });
        if !changed {
            tracing::debug!(model_id, "Ignoring selection of unknown model");
        }
        changed
    }

    pub fn set_text(&self, text: impl Into<String>) {
        let text = text.into();
        self.update(|state| {
            if state.text == text {
                return false;
            }
            state.text = text;
            true
        });
    }

    /// Set one config field of a catalog model
    pub fn set_model_config(&self, model_id: &str, key: &str, value: ConfigValue) -> bool {
        let changed = self.update(|state| {
            if !state.has_model(model_id) {
                return false;
            }
            state.configs.set(model_id, key, value);
            true
        });
        if changed {
            tracing::debug!(model_id, key, "Updated model config");
        } else {
            tracing::debug!(model_id, key, "Ignoring config edit for unknown model");
        }
        changed
    }

    /// A model's config; empty for unknown models
    pub fn model_config(&self, model_id: &str) -> ConfigMap {
        self.state.read().configs.get(model_id)
    }

    /// A model's run state; idle for unknown models
    pub fn run_state(&self, model_id: &str) -> RunState {
        self.state.read().runs.get(model_id)
    }

    // ---- runs ----------------------------------------------------------

    /// Replace run-state entries in one update.
    ///
    /// Dropped entirely when `epoch` is not the current catalog epoch, i.e.
    /// the catalog was reloaded after the run started.
    pub fn apply_runs<I>(&self, epoch: u64, updates: I) -> bool
    where
        I: IntoIterator<Item = (String, RunState)>,
    {
        self.update(|state| {
            if state.catalog_epoch != epoch {
                tracing::debug!(
                    epoch,
                    current = state.catalog_epoch,
                    "Dropping run updates from a previous catalog"
                );
                return false;
            }
            let mut changed = false;
            for (model_id, run) in updates {
                changed |= state.runs.replace(&model_id, run);
            }
            changed
        })
    }

    /// Keep the summary of the latest batch for display
    pub fn record_batch_summary(&self, epoch: u64, summary: BatchSummary) {
        self.update(|state| {
            if state.catalog_epoch != epoch {
                return false;
            }
            state.last_batch_summary = Some(summary);
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_state::RunStatus;
    use tts_playground_core::{ConfigField, ModelCategory};

    fn catalog() -> Vec<ModelDescriptor> {
        vec![
            ModelDescriptor::new("a", "A", "p", ModelCategory::Cloud)
                .with_field(ConfigField::new("speaker", "Speaker").with_default("anushka")),
            ModelDescriptor::new("b", "B", "p", ModelCategory::SelfHosted)
                .with_field(ConfigField::new("speaker", "Speaker").with_default("meera")),
        ]
    }

    fn loaded_store() -> PlaygroundStore {
        let store = PlaygroundStore::new("hello", 16);
        store.apply_catalog(catalog());
        store
    }

    #[test]
    fn test_catalog_load_initializes_everything() {
        let store = loaded_store();
        let snapshot = store.snapshot();

        assert_eq!(snapshot.catalog_epoch, 1);
        assert_eq!(snapshot.active_model_id.as_deref(), Some("a"));
        assert_eq!(snapshot.selected_model_ids, vec!["a", "b"]);
        assert_eq!(snapshot.configs.len(), 2);
        assert_eq!(snapshot.runs.len(), 2);
        assert!(snapshot.runs.iter().all(|(_, s)| s.status == RunStatus::Idle));
        assert_eq!(snapshot.text, "hello");
    }

    #[test]
    fn test_reload_discards_edits_and_runs() {
        let store = loaded_store();
        store.set_model_config("a", "speaker", ConfigValue::text("arvind"));
        store.apply_runs(1, [("a".to_string(), RunState::failed("a", "x"))]);

        store.apply_catalog(catalog());
        let snapshot = store.snapshot();
        assert_eq!(snapshot.catalog_epoch, 2);
        assert_eq!(
            snapshot.configs.value("a", "speaker"),
            Some(&ConfigValue::text("anushka"))
        );
        assert_eq!(snapshot.runs.status("a"), Some(RunStatus::Idle));
    }

    #[test]
    fn test_stale_epoch_updates_are_dropped() {
        let store = loaded_store();
        store.apply_catalog(catalog());

        assert!(!store.apply_runs(1, [("a".to_string(), RunState::running())]));
        assert_eq!(store.run_state("a").status, RunStatus::Idle);
        assert!(store.apply_runs(2, [("a".to_string(), RunState::running())]));
    }

    #[test]
    fn test_failed_load_sets_global_error() {
        let store = PlaygroundStore::new("hello", 16);
        store.begin_catalog_load();
        assert!(store.snapshot().loading_catalog);

        store.fail_catalog_load("Failed to fetch catalog: 500");
        let snapshot = store.snapshot();
        assert!(!snapshot.loading_catalog);
        assert!(snapshot.models.is_empty());
        assert_eq!(snapshot.global_error.as_deref(), Some("Failed to fetch catalog: 500"));

        // A new attempt clears the error
        store.begin_catalog_load();
        assert!(store.snapshot().global_error.is_none());
    }

    #[test]
    fn test_toggle_selection() {
        let store = loaded_store();
        assert!(store.toggle_selected_model("a"));
        assert_eq!(store.snapshot().selected_model_ids, vec!["b"]);
        assert!(store.toggle_selected_model("a"));
        assert_eq!(store.snapshot().selected_model_ids, vec!["b", "a"]);
        assert!(!store.toggle_selected_model("ghost"));
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let store = loaded_store();
        let before = store.snapshot().revision;

        assert!(!store.set_active_model("ghost"));
        assert!(!store.set_model_config("ghost", "speaker", ConfigValue::Null));
        assert_eq!(store.snapshot().revision, before);
        assert!(store.model_config("ghost").is_empty());
    }

    #[test]
    fn test_config_edit_is_isolated() {
        let store = loaded_store();
        let b_before = store.model_config("b");

        store.set_model_config("a", "pace", ConfigValue::number(1.25));

        assert_eq!(store.model_config("b"), b_before);
        let a = store.model_config("a");
        assert_eq!(a["speaker"], ConfigValue::text("anushka"));
        assert_eq!(a["pace"].as_f64(), Some(1.25));
    }

    #[tokio::test]
    async fn test_subscribers_see_every_update_in_order() {
        let store = loaded_store();
        let mut rx = store.subscribe();

        store.set_text("one");
        store.set_text("two");
        store.set_text("two"); // unchanged, not published

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.text, "one");
        assert_eq!(second.text, "two");
        assert_eq!(second.revision, first.revision + 1);
        assert!(rx.try_recv().is_err());
    }
}
