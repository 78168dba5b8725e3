//! Synthesis request/response types
//!
//! Wire shapes of `POST /tts/synthesize` and `POST /tts/synthesize-batch`.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use crate::catalog::ConfigMap;
use crate::error::{CoreError, Result};

/// Outcome of synthesizing text with one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisResult {
    pub model_id: String,
    pub success: bool,
    #[serde(default)]
    pub audio_base64: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub latency_ms: u64,
    #[serde(default)]
    pub streaming_used: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl SynthesisResult {
    /// Locally fabricated failure: no audio, zero latency, no streaming
    pub fn failure(model_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            success: false,
            audio_base64: None,
            audio_url: None,
            latency_ms: 0,
            streaming_used: false,
            error: Some(error.into()),
        }
    }

    /// Successful result served from a URL
    pub fn with_url(model_id: impl Into<String>, url: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            model_id: model_id.into(),
            success: true,
            audio_base64: None,
            audio_url: Some(url.into()),
            latency_ms,
            streaming_used: false,
            error: None,
        }
    }

    /// Playable audio, if any.
    ///
    /// Failed results never play. A URL wins over inline data.
    pub fn audio_source(&self) -> Option<AudioSource> {
        if !self.success {
            return None;
        }
        if let Some(url) = self.audio_url.as_deref().filter(|u| !u.is_empty()) {
            return Some(AudioSource::Url(url.to_string()));
        }
        self.audio_base64
            .as_deref()
            .filter(|b| !b.is_empty())
            .map(|b| AudioSource::InlineWav(b.to_string()))
    }

    /// Decode inline WAV bytes
    pub fn inline_audio(&self) -> Result<Vec<u8>> {
        let encoded = self
            .audio_base64
            .as_deref()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| CoreError::NoAudio(self.model_id.clone()))?;
        Ok(BASE64.decode(encoded)?)
    }
}

/// Where playable audio comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    /// Served by the backend
    Url(String),
    /// Base64 WAV payload embedded in the result
    InlineWav(String),
}

impl AudioSource {
    /// Value for an `<audio src>` attribute
    pub fn src(&self) -> String {
        match self {
            AudioSource::Url(url) => url.clone(),
            AudioSource::InlineWav(data) => format!("data:audio/wav;base64,{}", data),
        }
    }
}

/// `POST /tts/synthesize` request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizeRequest {
    pub model_id: String,
    pub text: String,
    #[serde(default)]
    pub config_overrides: ConfigMap,
    pub prefer_streaming: bool,
}

/// `POST /tts/synthesize` response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizeResponse {
    pub result: SynthesisResult,
}

/// `POST /tts/synthesize-batch` request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSynthesizeRequest {
    pub model_ids: Vec<String>,
    pub text: String,
    #[serde(default)]
    pub per_model_config: BTreeMap<String, ConfigMap>,
    pub prefer_streaming: bool,
}

/// Aggregate counters of a batch run; display only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub duration_ms: u64,
}

/// `POST /tts/synthesize-batch` response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSynthesizeResponse {
    pub results: Vec<SynthesisResult>,
    #[serde(default)]
    pub summary: Option<BatchSummary>,
}
