//! Integration tests for synthesis dispatch
//!
//! The dispatcher runs against an in-memory backend that records every call
//! and answers from a script.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{broadcast, oneshot};
use tokio::time::timeout;

use tts_playground_client::{ClientError, Operation, TtsBackend};
use tts_playground_core::{
    BatchSummary, BatchSynthesizeRequest, BatchSynthesizeResponse, ConfigField, ConfigValue,
    ModelCatalogResponse, ModelCategory, ModelDescriptor, SynthesisResult, SynthesizeRequest,
    SynthesizeResponse, NOT_CONFIGURED_FALLBACK,
};
use tts_playground_store::{
    DispatchOutcome, Dispatcher, PlaygroundSnapshot, PlaygroundStore, RunStatus,
};

#[derive(Default)]
struct FakeBackend {
    catalog: Vec<ModelDescriptor>,
    catalog_status: Option<u16>,
    single_script: Mutex<VecDeque<Result<SynthesisResult, ClientError>>>,
    batch_script: Mutex<Option<Result<BatchSynthesizeResponse, ClientError>>>,
    /// Held synthesize calls, taken in call order
    holds: Mutex<VecDeque<oneshot::Receiver<()>>>,
    catalog_calls: AtomicUsize,
    single_calls: AtomicUsize,
    batch_calls: AtomicUsize,
    last_single: Mutex<Option<SynthesizeRequest>>,
    last_batch: Mutex<Option<BatchSynthesizeRequest>>,
}

impl FakeBackend {
    fn with_catalog(models: Vec<ModelDescriptor>) -> Self {
        Self {
            catalog: models,
            ..Default::default()
        }
    }

    fn script_single(&self, result: Result<SynthesisResult, ClientError>) {
        self.single_script.lock().push_back(result);
    }

    fn script_batch(&self, result: Result<BatchSynthesizeResponse, ClientError>) {
        *self.batch_script.lock() = Some(result);
    }

    /// Hold the next synthesize call until the returned sender fires
    fn hold_next_single(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.holds.lock().push_back(rx);
        tx
    }

    fn synth_calls(&self) -> usize {
        self.single_calls.load(Ordering::SeqCst) + self.batch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TtsBackend for FakeBackend {
    async fn fetch_catalog(&self) -> Result<ModelCatalogResponse, ClientError> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.catalog_status {
            return Err(ClientError::Status {
                operation: Operation::FetchCatalog,
                status,
            });
        }
        Ok(ModelCatalogResponse {
            models: self.catalog.clone(),
        })
    }

    async fn synthesize(
        &self,
        request: &SynthesizeRequest,
    ) -> Result<SynthesizeResponse, ClientError> {
        let hold = self.holds.lock().pop_front();
        let call = self.single_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_single.lock() = Some(request.clone());
        if let Some(hold) = hold {
            let _ = hold.await;
        }

        let scripted = self.single_script.lock().pop_front();
        let result = scripted.unwrap_or_else(|| {
            Ok(SynthesisResult::with_url(
                &request.model_id,
                format!("http://audio/{}/{}.wav", request.model_id, call),
                10,
            ))
        })?;
        Ok(SynthesizeResponse { result })
    }

    async fn synthesize_batch(
        &self,
        request: &BatchSynthesizeRequest,
    ) -> Result<BatchSynthesizeResponse, ClientError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_batch.lock() = Some(request.clone());

        let scripted = self.batch_script.lock().take();
        scripted.unwrap_or_else(|| {
            let results: Vec<SynthesisResult> = request
                .model_ids
                .iter()
                .map(|id| SynthesisResult::with_url(id, format!("http://audio/{}.wav", id), 10))
                .collect();
            let total = results.len() as u64;
            Ok(BatchSynthesizeResponse {
                results,
                summary: Some(BatchSummary {
                    total,
                    success_count: total,
                    failure_count: 0,
                    duration_ms: 12,
                }),
            })
        })
    }
}

fn cloud(id: &str) -> ModelDescriptor {
    ModelDescriptor::new(id, id.to_uppercase(), "test", ModelCategory::Cloud)
        .with_field(ConfigField::new("speaker", "Speaker").with_default("anushka"))
}

fn unconfigured(id: &str, warnings: &[&str]) -> ModelDescriptor {
    ModelDescriptor::new(id, id.to_uppercase(), "test", ModelCategory::SelfHosted)
        .unconfigured(warnings.iter().map(|w| w.to_string()).collect())
}

async fn loaded(backend: FakeBackend) -> (Arc<FakeBackend>, Dispatcher) {
    let backend = Arc::new(backend);
    let store = Arc::new(PlaygroundStore::new("Vanakkam", 256));
    let dispatcher = Dispatcher::new(store, backend.clone());
    dispatcher.load_catalog().await.unwrap();
    (backend, dispatcher)
}

fn drain(rx: &mut broadcast::Receiver<Arc<PlaygroundSnapshot>>) -> Vec<Arc<PlaygroundSnapshot>> {
    let mut seen = Vec::new();
    while let Ok(snapshot) = rx.try_recv() {
        seen.push(snapshot);
    }
    seen
}

/// Wait until the backend has received `count` single requests
async fn wait_for_single_calls(backend: &FakeBackend, count: usize) {
    timeout(Duration::from_secs(1), async {
        while backend.single_calls.load(Ordering::SeqCst) < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}

fn audio_src(dispatcher: &Dispatcher, model_id: &str) -> Option<String> {
    dispatcher
        .store()
        .run_state(model_id)
        .result
        .and_then(|r| r.audio_source())
        .map(|s| s.src())
}

fn status_history(history: &[Arc<PlaygroundSnapshot>], model_id: &str) -> Vec<RunStatus> {
    let mut statuses: Vec<RunStatus> = Vec::new();
    for snapshot in history {
        if let Some(status) = snapshot.runs.status(model_id) {
            if statuses.last() != Some(&status) {
                statuses.push(status);
            }
        }
    }
    statuses
}

#[tokio::test]
async fn test_catalog_load_initializes_every_model_once() {
    let backend = FakeBackend::with_catalog(vec![cloud("a"), unconfigured("b", &[])]);
    let (backend, dispatcher) = loaded(backend).await;
    let snapshot = dispatcher.store().snapshot();

    assert_eq!(backend.catalog_calls.load(Ordering::SeqCst), 1);
    assert_eq!(snapshot.runs.len(), 2);
    assert_eq!(snapshot.configs.len(), 2);
    assert_eq!(snapshot.runs.status("a"), Some(RunStatus::Idle));
    assert_eq!(snapshot.runs.status("b"), Some(RunStatus::Idle));
    assert_eq!(
        snapshot.configs.value("a", "speaker"),
        Some(&ConfigValue::text("anushka"))
    );
    assert_eq!(backend.synth_calls(), 0);
}

#[tokio::test]
async fn test_catalog_failure_sets_global_error() {
    let backend = Arc::new(FakeBackend {
        catalog_status: Some(500),
        ..Default::default()
    });
    let store = Arc::new(PlaygroundStore::new("Vanakkam", 16));
    let dispatcher = Dispatcher::new(store, backend);

    assert!(dispatcher.load_catalog().await.is_err());
    let snapshot = dispatcher.store().snapshot();
    assert!(!snapshot.loading_catalog);
    assert!(snapshot.models.is_empty());
    assert_eq!(
        snapshot.global_error.as_deref(),
        Some("Failed to fetch catalog: 500")
    );
}

#[tokio::test]
async fn test_single_run_on_unconfigured_model_sends_nothing() {
    let backend = FakeBackend::with_catalog(vec![
        unconfigured("x", &["KEY_A missing", "KEY_B missing"]),
        unconfigured("y", &[]),
    ]);
    let (backend, dispatcher) = loaded(backend).await;

    assert_eq!(dispatcher.run_single().await, DispatchOutcome::Blocked);
    let run = dispatcher.store().run_state("x");
    assert_eq!(run.status, RunStatus::Error);
    assert_eq!(run.error_message(), Some("KEY_A missing; KEY_B missing"));

    dispatcher.store().set_active_model("y");
    assert_eq!(dispatcher.run_single().await, DispatchOutcome::Blocked);
    assert_eq!(
        dispatcher.store().run_state("y").error_message(),
        Some(NOT_CONFIGURED_FALLBACK)
    );

    assert_eq!(backend.synth_calls(), 0);
}

#[tokio::test]
async fn test_single_run_success() {
    let backend = FakeBackend::with_catalog(vec![cloud("a")]);
    let (backend, dispatcher) = loaded(backend).await;
    dispatcher
        .store()
        .set_model_config("a", "pace", ConfigValue::number(1.5));
    let mut rx = dispatcher.store().subscribe();

    assert_eq!(
        dispatcher.run_single().await,
        DispatchOutcome::Dispatched { models: 1 }
    );

    let history = drain(&mut rx);
    assert_eq!(
        status_history(&history, "a"),
        vec![RunStatus::Running, RunStatus::Success]
    );

    let request = backend.last_single.lock().clone().unwrap();
    assert_eq!(request.text, "Vanakkam");
    assert!(request.prefer_streaming);
    assert_eq!(request.config_overrides["pace"].as_f64(), Some(1.5));
    assert_eq!(request.config_overrides["speaker"], ConfigValue::text("anushka"));

    let run = dispatcher.store().run_state("a");
    assert!(run.result.unwrap().audio_source().is_some());
}

#[tokio::test]
async fn test_single_run_transport_failure_becomes_error() {
    let backend = FakeBackend::with_catalog(vec![cloud("a")]);
    backend.script_single(Err(ClientError::Status {
        operation: Operation::Synthesize,
        status: 502,
    }));
    let (_, dispatcher) = loaded(backend).await;

    dispatcher.run_single().await;
    let run = dispatcher.store().run_state("a");
    assert_eq!(run.status, RunStatus::Error);
    assert_eq!(run.error_message(), Some("Synthesize failed: 502"));
}

#[tokio::test]
async fn test_blank_text_or_no_model_is_skipped() {
    let backend = FakeBackend::with_catalog(vec![cloud("a")]);
    let (backend, dispatcher) = loaded(backend).await;
    dispatcher.store().set_text("   ");

    assert_eq!(dispatcher.run_single().await, DispatchOutcome::Skipped);
    assert_eq!(dispatcher.run_batch().await, DispatchOutcome::Skipped);
    assert_eq!(dispatcher.store().run_state("a").status, RunStatus::Idle);

    let empty = Dispatcher::new(
        Arc::new(PlaygroundStore::new("hello", 16)),
        Arc::new(FakeBackend::default()),
    );
    assert_eq!(empty.run_single().await, DispatchOutcome::Skipped);
    assert_eq!(empty.run_batch().await, DispatchOutcome::Skipped);
    assert_eq!(backend.synth_calls(), 0);
}

#[tokio::test]
async fn test_batch_partitions_and_queues_atomically() {
    let backend = FakeBackend::with_catalog(vec![
        cloud("a"),
        unconfigured("b", &["B_KEY missing"]),
        cloud("c"),
    ]);
    let (backend, dispatcher) = loaded(backend).await;
    let mut rx = dispatcher.store().subscribe();

    assert_eq!(
        dispatcher.run_batch().await,
        DispatchOutcome::Dispatched { models: 2 }
    );
    let history = drain(&mut rx);

    // Only configured models go over the wire
    let request = backend.last_batch.lock().clone().unwrap();
    assert_eq!(request.model_ids, vec!["a", "c"]);
    assert!(request.prefer_streaming);
    assert_eq!(backend.batch_calls.load(Ordering::SeqCst), 1);

    // Never half-queued: every snapshot holds both or neither
    for snapshot in &history {
        let queued_a = snapshot.runs.status("a") == Some(RunStatus::Queued);
        let queued_c = snapshot.runs.status("c") == Some(RunStatus::Queued);
        assert_eq!(queued_a, queued_c, "half-queued snapshot at revision {}", snapshot.revision);
    }

    // The blocked model fails in the same update that queues the rest
    let queued = history
        .iter()
        .find(|s| s.runs.status("a") == Some(RunStatus::Queued))
        .unwrap();
    assert_eq!(queued.runs.status("b"), Some(RunStatus::Error));

    for id in ["a", "c"] {
        assert_eq!(
            status_history(&history, id),
            vec![RunStatus::Queued, RunStatus::Running, RunStatus::Success]
        );
    }
    assert_eq!(status_history(&history, "b"), vec![RunStatus::Error]);
    assert_eq!(
        dispatcher.store().run_state("b").error_message(),
        Some("B_KEY missing")
    );

    let summary = dispatcher.store().snapshot().last_batch_summary.clone().unwrap();
    assert_eq!(summary.success_count, 2);
}

#[tokio::test]
async fn test_batch_with_only_unconfigured_models_sends_nothing() {
    let backend = FakeBackend::with_catalog(vec![unconfigured("x", &[]), unconfigured("y", &[])]);
    let (backend, dispatcher) = loaded(backend).await;

    assert_eq!(dispatcher.run_batch().await, DispatchOutcome::Blocked);
    assert_eq!(backend.synth_calls(), 0);
    assert_eq!(dispatcher.store().run_state("x").status, RunStatus::Error);
    assert_eq!(dispatcher.store().run_state("y").status, RunStatus::Error);
}

#[tokio::test]
async fn test_batch_mixed_results_are_independent() {
    let backend = FakeBackend::with_catalog(vec![cloud("a"), cloud("b")]);
    backend.script_batch(Ok(BatchSynthesizeResponse {
        results: vec![
            SynthesisResult::with_url("a", "http://audio/a.wav", 30),
            SynthesisResult::failure("b", "Model not configured"),
        ],
        summary: None,
    }));
    let (_, dispatcher) = loaded(backend).await;

    dispatcher.run_batch().await;
    let snapshot = dispatcher.store().snapshot();

    let a = snapshot.runs.get("a");
    assert_eq!(a.status, RunStatus::Success);
    assert_eq!(
        a.result.unwrap().audio_source().map(|s| s.src()),
        Some("http://audio/a.wav".to_string())
    );

    let b = snapshot.runs.get("b");
    assert_eq!(b.status, RunStatus::Error);
    assert_eq!(b.error_message(), Some("Model not configured"));
    assert!(snapshot.last_batch_summary.is_none());
}

#[tokio::test]
async fn test_batch_models_missing_from_response_stay_running() {
    let backend = FakeBackend::with_catalog(vec![cloud("a"), cloud("b")]);
    backend.script_batch(Ok(BatchSynthesizeResponse {
        results: vec![SynthesisResult::with_url("b", "http://audio/b.wav", 30)],
        summary: None,
    }));
    let (backend, dispatcher) = loaded(backend).await;

    assert_eq!(
        dispatcher.run_batch().await,
        DispatchOutcome::Dispatched { models: 2 }
    );
    let request = backend.last_batch.lock().clone().unwrap();
    assert_eq!(request.model_ids, vec!["a", "b"]);

    let snapshot = dispatcher.store().snapshot();
    assert_eq!(snapshot.runs.status("a"), Some(RunStatus::Running));
    assert!(snapshot.runs.get("a").result.is_none());
    assert_eq!(snapshot.runs.status("b"), Some(RunStatus::Success));
    assert!(snapshot.runs.any_pending());
}

#[tokio::test]
async fn test_batch_transport_failure_keeps_blocked_messages() {
    let backend = FakeBackend::with_catalog(vec![
        cloud("a"),
        cloud("b"),
        unconfigured("c", &["C_KEY missing"]),
    ]);
    backend.script_batch(Err(ClientError::Status {
        operation: Operation::SynthesizeBatch,
        status: 500,
    }));
    let (_, dispatcher) = loaded(backend).await;

    dispatcher.run_batch().await;
    let snapshot = dispatcher.store().snapshot();

    for id in ["a", "b"] {
        let run = snapshot.runs.get(id);
        assert_eq!(run.status, RunStatus::Error);
        assert_eq!(run.error_message(), Some("Batch synthesize failed: 500"));
    }
    assert_eq!(snapshot.runs.get("c").error_message(), Some("C_KEY missing"));
}

#[tokio::test]
async fn test_batch_without_selection_uses_active_model() {
    let backend = FakeBackend::with_catalog(vec![cloud("a"), cloud("b")]);
    let (backend, dispatcher) = loaded(backend).await;
    dispatcher.store().toggle_selected_model("a");
    dispatcher.store().toggle_selected_model("b");
    dispatcher.store().set_active_model("b");

    assert_eq!(
        dispatcher.run_batch().await,
        DispatchOutcome::Dispatched { models: 1 }
    );
    let request = backend.last_batch.lock().clone().unwrap();
    assert_eq!(request.model_ids, vec!["b"]);
    assert_eq!(dispatcher.store().run_state("a").status, RunStatus::Idle);
}

#[tokio::test]
async fn test_batch_sends_config_for_selected_models_only() {
    let backend =
        FakeBackend::with_catalog(vec![cloud("a"), cloud("b"), unconfigured("c", &[])]);
    let (backend, dispatcher) = loaded(backend).await;
    let store = dispatcher.store();
    store.toggle_selected_model("b");
    store.set_model_config("a", "speaker", ConfigValue::text("meera"));

    dispatcher.run_batch().await;
    let request = backend.last_batch.lock().clone().unwrap();

    assert_eq!(request.model_ids, vec!["a"]);
    assert!(!request.per_model_config.contains_key("b"));
    assert_eq!(
        request.per_model_config["a"]["speaker"],
        ConfigValue::text("meera")
    );
    // Editing a leaves b untouched
    assert_eq!(
        store.model_config("b")["speaker"],
        ConfigValue::text("anushka")
    );
}

#[tokio::test]
async fn test_rerun_replaces_previous_result() {
    let backend = FakeBackend::with_catalog(vec![cloud("a")]);
    backend.script_single(Ok(SynthesisResult::with_url("a", "http://audio/first.wav", 5)));
    backend.script_single(Ok(SynthesisResult::failure("a", "Rate limited")));
    let (_, dispatcher) = loaded(backend).await;

    dispatcher.run_single().await;
    assert_eq!(dispatcher.store().run_state("a").status, RunStatus::Success);

    let mut rx = dispatcher.store().subscribe();
    dispatcher.run_single().await;
    let history = drain(&mut rx);

    assert_eq!(
        status_history(&history, "a"),
        vec![RunStatus::Running, RunStatus::Error]
    );
    // No stale audio while running or after the new result
    for snapshot in &history {
        let run = snapshot.runs.get("a");
        assert!(run.result.and_then(|r| r.audio_source()).is_none());
    }
    assert_eq!(
        dispatcher.store().run_state("a").error_message(),
        Some("Rate limited")
    );
}

#[tokio::test]
async fn test_results_after_catalog_reload_are_dropped() {
    let backend = Arc::new(FakeBackend::with_catalog(vec![cloud("a")]));
    let release = backend.hold_next_single();
    let store = Arc::new(PlaygroundStore::new("Vanakkam", 64));
    let dispatcher = Arc::new(Dispatcher::new(store, backend.clone()));
    dispatcher.load_catalog().await.unwrap();

    let run = tokio::spawn({
        let dispatcher = dispatcher.clone();
        async move { dispatcher.run_single().await }
    });
    wait_for_single_calls(&backend, 1).await;
    assert_eq!(dispatcher.store().run_state("a").status, RunStatus::Running);

    dispatcher.load_catalog().await.unwrap();
    release.send(()).unwrap();
    run.await.unwrap();

    assert_eq!(dispatcher.store().run_state("a").status, RunStatus::Idle);
    assert_eq!(backend.catalog_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_overlapping_runs_on_one_model_last_resolution_wins() {
    let backend = Arc::new(FakeBackend::with_catalog(vec![cloud("a")]));
    let release_first = backend.hold_next_single();
    let release_second = backend.hold_next_single();
    let store = Arc::new(PlaygroundStore::new("Vanakkam", 64));
    let dispatcher = Arc::new(Dispatcher::new(store, backend.clone()));
    dispatcher.load_catalog().await.unwrap();

    let first = tokio::spawn({
        let dispatcher = dispatcher.clone();
        async move { dispatcher.run_single().await }
    });
    wait_for_single_calls(&backend, 1).await;
    let revision = dispatcher.store().snapshot().revision;

    let second = tokio::spawn({
        let dispatcher = dispatcher.clone();
        async move { dispatcher.run_single().await }
    });
    wait_for_single_calls(&backend, 2).await;

    // Running -> running is applied, not rejected
    let snapshot = dispatcher.store().snapshot();
    assert!(snapshot.revision > revision);
    assert_eq!(snapshot.runs.status("a"), Some(RunStatus::Running));

    release_second.send(()).unwrap();
    second.await.unwrap();
    assert_eq!(dispatcher.store().run_state("a").status, RunStatus::Success);
    assert_eq!(audio_src(&dispatcher, "a").as_deref(), Some("http://audio/a/1.wav"));

    release_first.send(()).unwrap();
    first.await.unwrap();
    assert_eq!(dispatcher.store().run_state("a").status, RunStatus::Success);
    assert_eq!(audio_src(&dispatcher, "a").as_deref(), Some("http://audio/a/0.wav"));
}
