//! Backend contract

use async_trait::async_trait;

use tts_playground_core::{
    BatchSynthesizeRequest, BatchSynthesizeResponse, ModelCatalogResponse, SynthesizeRequest,
    SynthesizeResponse,
};

use crate::ClientError;

/// The three endpoints the playground consumes.
///
/// Non-2xx answers surface as [`ClientError::Status`]; a `success: false`
/// result inside a 2xx answer is not an error at this layer.
#[async_trait]
pub trait TtsBackend: Send + Sync {
    /// `GET /models/catalog`
    async fn fetch_catalog(&self) -> Result<ModelCatalogResponse, ClientError>;

    /// `POST /tts/synthesize`
    async fn synthesize(&self, request: &SynthesizeRequest)
        -> Result<SynthesizeResponse, ClientError>;

    /// `POST /tts/synthesize-batch`
    async fn synthesize_batch(
        &self,
        request: &BatchSynthesizeRequest,
    ) -> Result<BatchSynthesizeResponse, ClientError>;
}
