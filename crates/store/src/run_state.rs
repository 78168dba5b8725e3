//! Run-state machine
//!
//! Tracks the synthesis lifecycle of every catalog model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tts_playground_core::{ModelDescriptor, SynthesisResult};

/// Synthesis status of one model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// No request yet, or catalog just (re)loaded
    #[default]
    Idle,
    /// Part of a batch that has not been sent yet
    Queued,
    /// Request in flight
    Running,
    Success,
    Error,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Idle => "idle",
            RunStatus::Queued => "queued",
            RunStatus::Running => "running",
            RunStatus::Success => "success",
            RunStatus::Error => "error",
        }
    }

    /// Success or error. Terminal states can still be re-run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Success | RunStatus::Error)
    }

    /// Waiting on the backend
    pub fn is_pending(&self) -> bool {
        matches!(self, RunStatus::Queued | RunStatus::Running)
    }

    /// Transitions of the nominal lifecycle.
    ///
    /// Anything else only happens when two runs for the same model race.
    pub fn valid_transitions(&self) -> &'static [RunStatus] {
        match self {
            RunStatus::Idle => &[RunStatus::Queued, RunStatus::Running, RunStatus::Error],
            RunStatus::Queued => &[RunStatus::Running, RunStatus::Error],
            RunStatus::Running => &[RunStatus::Success, RunStatus::Error],
            RunStatus::Success | RunStatus::Error => {
                &[RunStatus::Queued, RunStatus::Running, RunStatus::Error]
            }
        }
    }

    pub fn can_transition_to(&self, to: RunStatus) -> bool {
        self.valid_transitions().contains(&to)
    }
}

/// Status plus last result of one model
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunState {
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<SynthesisResult>,
}

impl RunState {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn queued() -> Self {
        Self {
            status: RunStatus::Queued,
            result: None,
        }
    }

    pub fn running() -> Self {
        Self {
            status: RunStatus::Running,
            result: None,
        }
    }

    /// Terminal state taken from a backend result
    pub fn from_result(result: SynthesisResult) -> Self {
        let status = if result.success {
            RunStatus::Success
        } else {
            RunStatus::Error
        };
        Self {
            status,
            result: Some(result),
        }
    }

    /// Terminal error fabricated locally
    pub fn failed(model_id: &str, message: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Error,
            result: Some(SynthesisResult::failure(model_id, message)),
        }
    }

    /// Error text of the last result, if any
    pub fn error_message(&self) -> Option<&str> {
        self.result.as_ref().and_then(|r| r.error.as_deref())
    }
}

/// Run state of every model in the current catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunStates(BTreeMap<String, RunState>);

impl RunStates {
    /// One idle entry per catalog model
    pub fn for_catalog(models: &[ModelDescriptor]) -> Self {
        Self(
            models
                .iter()
                .map(|m| (m.model_id.clone(), RunState::idle()))
                .collect(),
        )
    }

    /// State of a model; idle when the model has no entry
    pub fn get(&self, model_id: &str) -> RunState {
        self.0.get(model_id).cloned().unwrap_or_default()
    }

    pub fn status(&self, model_id: &str) -> Option<RunStatus> {
        self.0.get(model_id).map(|s| s.status)
    }

    pub fn contains(&self, model_id: &str) -> bool {
        self.0.contains_key(model_id)
    }

    /// Replace a model's whole entry.
    ///
    /// Returns false (and changes nothing) for models outside the catalog.
    pub fn replace(&mut self, model_id: &str, state: RunState) -> bool {
        match self.0.get_mut(model_id) {
            Some(entry) => {
                if !entry.status.can_transition_to(state.status) {
                    tracing::warn!(
                        model_id,
                        from = entry.status.as_str(),
                        to = state.status.as_str(),
                        "Run state transition outside the nominal lifecycle"
                    );
                }
                *entry = state;
                true
            }
            None => {
                tracing::debug!(model_id, "Dropping run state for model outside the catalog");
                false
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RunState)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any model waits on the backend
    pub fn any_pending(&self) -> bool {
        self.0.values().any(|s| s.status.is_pending())
    }
}
