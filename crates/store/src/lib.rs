//! Playground state and dispatch
//!
//! Features:
//! - Per-model configuration seeded from schema defaults
//! - Per-model run-state machine (idle, queued, running, success, error)
//! - Single state container publishing immutable snapshots to subscribers
//! - Single and batch synthesis dispatch with per-model reconciliation

pub mod config_store;
pub mod dispatcher;
pub mod run_state;
pub mod store;

pub use config_store::ModelConfigs;
pub use dispatcher::{
    DispatchOutcome, Dispatcher, BATCH_FAILURE_FALLBACK, CATALOG_FAILURE_FALLBACK,
    SINGLE_FAILURE_FALLBACK,
};
pub use run_state::{RunState, RunStates, RunStatus};
pub use store::{PlaygroundSnapshot, PlaygroundStore};
