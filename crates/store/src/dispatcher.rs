//! Synthesis dispatch
//!
//! Turns "speak" intents into backend calls and reconciles the answers into
//! per-model run state. Failures never leave this module: every error ends up
//! as a terminal `error` entry for the model(s) it concerns, except catalog
//! load failures which go to the global error.

use std::sync::Arc;

use tts_playground_client::{ClientError, TtsBackend};
use tts_playground_core::{BatchSynthesizeRequest, SynthesizeRequest};

use crate::run_state::RunState;
use crate::store::PlaygroundStore;

pub const CATALOG_FAILURE_FALLBACK: &str = "Failed to load model catalog";
pub const SINGLE_FAILURE_FALLBACK: &str = "Unknown error";
pub const BATCH_FAILURE_FALLBACK: &str = "Batch request failed";

/// What a dispatch call ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Nothing to do: no target model or blank text
    Skipped,
    /// Every target was unconfigured; errors were recorded without a request
    Blocked,
    /// A request was sent for this many models
    Dispatched { models: usize },
}

/// Dispatches synthesis requests on behalf of one playground store
pub struct Dispatcher {
    store: Arc<PlaygroundStore>,
    backend: Arc<dyn TtsBackend>,
}

impl Dispatcher {
    pub fn new(store: Arc<PlaygroundStore>, backend: Arc<dyn TtsBackend>) -> Self {
        Self { store, backend }
    }

    pub fn store(&self) -> &Arc<PlaygroundStore> {
        &self.store
    }

    /// Fetch the catalog and reset the session around it.
    ///
    /// On failure the message is recorded as the global error and the
    /// previous catalog (if any) stays in place.
    pub async fn load_catalog(&self) -> Result<usize, ClientError> {
        self.store.begin_catalog_load();

        match self.backend.fetch_catalog().await {
            Ok(catalog) => {
                let count = catalog.models.len();
                tracing::info!(models = count, "Loaded model catalog");
                self.store.apply_catalog(catalog.models);
                Ok(count)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Catalog load failed");
                self.store
                    .fail_catalog_load(message_or(&e, CATALOG_FAILURE_FALLBACK));
                Err(e)
            }
        }
    }

    /// Synthesize the composer text with the active model
    pub async fn run_single(&self) -> DispatchOutcome {
        let snapshot = self.store.snapshot();
        let epoch = snapshot.catalog_epoch;

        let Some(model_id) = snapshot.active_model_id.clone() else {
            tracing::debug!("No active model, skipping run");
            return DispatchOutcome::Skipped;
        };
        if snapshot.text.trim().is_empty() {
            tracing::debug!("Blank text, skipping run");
            return DispatchOutcome::Skipped;
        }

        if let Some(model) = snapshot.model(&model_id).filter(|m| !m.configured) {
            tracing::info!(model_id = %model_id, "Model not configured, not sending request");
            let failed = RunState::failed(&model_id, model.not_configured_message());
            self.store.apply_runs(epoch, [(model_id, failed)]);
            return DispatchOutcome::Blocked;
        }

        self.store
            .apply_runs(epoch, [(model_id.clone(), RunState::running())]);

        let request = SynthesizeRequest {
            model_id: model_id.clone(),
            text: snapshot.text.clone(),
            config_overrides: snapshot.configs.get(&model_id),
            prefer_streaming: true,
        };

        let state = match self.backend.synthesize(&request).await {
            Ok(response) => {
                tracing::info!(
                    model_id = %model_id,
                    success = response.result.success,
                    latency_ms = response.result.latency_ms,
                    "Synthesis finished"
                );
                RunState::from_result(response.result)
            }
            Err(e) => {
                tracing::warn!(model_id = %model_id, error = %e, "Synthesis request failed");
                RunState::failed(&model_id, message_or(&e, SINGLE_FAILURE_FALLBACK))
            }
        };

        self.store.apply_runs(epoch, [(model_id, state)]);
        DispatchOutcome::Dispatched { models: 1 }
    }

    /// Synthesize the composer text with every selected model.
    ///
    /// Falls back to the active model when nothing is selected.
    pub async fn run_batch(&self) -> DispatchOutcome {
        let snapshot = self.store.snapshot();
        let epoch = snapshot.catalog_epoch;

        let targets: Vec<String> = if !snapshot.selected_model_ids.is_empty() {
            snapshot.selected_model_ids.clone()
        } else {
            snapshot.active_model_id.iter().cloned().collect()
        };
        if targets.is_empty() || snapshot.text.trim().is_empty() {
            tracing::debug!(targets = targets.len(), "Nothing to run, skipping batch");
            return DispatchOutcome::Skipped;
        }

        // Models unknown to the catalog are left for the backend to judge
        let (blocked, runnable): (Vec<String>, Vec<String>) = targets
            .iter()
            .cloned()
            .partition(|id| snapshot.model(id).map(|m| !m.configured).unwrap_or(false));

        let mut marks = Vec::with_capacity(targets.len());
        marks.extend(runnable.iter().map(|id| (id.clone(), RunState::queued())));
        marks.extend(blocked.iter().map(|id| {
            let message = snapshot
                .model(id)
                .map(|m| m.not_configured_message())
                .unwrap_or_default();
            (id.clone(), RunState::failed(id, message))
        }));
        self.store.apply_runs(epoch, marks);

        if !blocked.is_empty() {
            tracing::info!(blocked = ?blocked, "Skipping unconfigured models in batch");
        }
        if runnable.is_empty() {
            return DispatchOutcome::Blocked;
        }

        self.store.apply_runs(
            epoch,
            runnable.iter().map(|id| (id.clone(), RunState::running())),
        );

        let request = BatchSynthesizeRequest {
            model_ids: runnable.clone(),
            text: snapshot.text.clone(),
            per_model_config: snapshot.configs.restricted_to(&targets),
            prefer_streaming: true,
        };

        tracing::info!(models = runnable.len(), "Dispatching batch synthesis");
        match self.backend.synthesize_batch(&request).await {
            Ok(response) => {
                if let Some(summary) = response.summary {
                    tracing::info!(
                        total = summary.total,
                        success = summary.success_count,
                        failure = summary.failure_count,
                        duration_ms = summary.duration_ms,
                        "Batch synthesis finished"
                    );
                    self.store.record_batch_summary(epoch, summary);
                }
                self.store.apply_runs(
                    epoch,
                    response
                        .results
                        .into_iter()
                        .map(|result| (result.model_id.clone(), RunState::from_result(result))),
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, models = runnable.len(), "Batch request failed");
                let message = message_or(&e, BATCH_FAILURE_FALLBACK);
                self.store.apply_runs(
                    epoch,
                    runnable
                        .iter()
                        .map(|id| (id.clone(), RunState::failed(id, message.clone()))),
                );
            }
        }

        DispatchOutcome::Dispatched {
            models: runnable.len(),
        }
    }
}

/// Error text, or `fallback` when the error renders empty
fn message_or(err: &ClientError, fallback: &str) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
