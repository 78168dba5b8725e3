//! Core types for the TTS playground
//!
//! This crate provides the types shared by every other crate:
//! - Model catalog descriptors and configuration schemas
//! - Synthesis requests, results and batch envelopes
//! - Display naming helpers
//! - Error types

pub mod catalog;
pub mod display;
pub mod error;
pub mod synthesis;

pub use catalog::{
    ConfigField, ConfigFieldOption, ConfigInputType, ConfigMap, ConfigValue, ModelCapabilities,
    ModelCatalogResponse, ModelCategory, ModelDescriptor, NOT_CONFIGURED_FALLBACK,
};
pub use display::{model_parts, title_case, ModelParts};
pub use error::{CoreError, Result};
pub use synthesis::{
    AudioSource, BatchSummary, BatchSynthesizeRequest, BatchSynthesizeResponse, SynthesisResult,
    SynthesizeRequest, SynthesizeResponse,
};
