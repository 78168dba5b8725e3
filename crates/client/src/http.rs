//! HTTP implementation of the backend contract

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use tts_playground_config::BackendConfig;
use tts_playground_core::{
    BatchSynthesizeRequest, BatchSynthesizeResponse, ModelCatalogResponse, SynthesizeRequest,
    SynthesizeResponse,
};

use crate::backend::TtsBackend;
use crate::{ClientError, Operation};

const CATALOG_PATH: &str = "/models/catalog";
const SYNTHESIZE_PATH: &str = "/tts/synthesize";
const SYNTHESIZE_BATCH_PATH: &str = "/tts/synthesize-batch";

/// `reqwest`-backed client bound to one backend origin
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let parsed =
            Url::parse(trimmed).map_err(|e| ClientError::InvalidBaseUrl(format!("{}: {}", trimmed, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidBaseUrl(format!(
                "{}: unsupported scheme '{}'",
                trimmed,
                parsed.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        tracing::info!(base_url = %trimmed, timeout_secs = timeout.as_secs(), "Created backend client");

        Ok(Self {
            client,
            base_url: trimmed.to_string(),
        })
    }

    /// Create a client from the backend settings section
    pub fn from_config(config: &BackendConfig) -> Result<Self, ClientError> {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.request_timeout_seconds),
        )
    }

    /// Backend origin without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: Operation,
        path: &str,
    ) -> Result<T, ClientError> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(operation, e))?;
        decode(operation, response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        operation: Operation,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = self.url(path);
        tracing::debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(operation, e))?;
        decode(operation, response).await
    }
}

async fn decode<T: DeserializeOwned>(
    operation: Operation,
    response: Response,
) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), %operation, "Backend returned an error status");
        return Err(ClientError::Status {
            operation,
            status: status.as_u16(),
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ClientError::from_reqwest(operation, e))
}

#[async_trait]
impl TtsBackend for HttpBackend {
    async fn fetch_catalog(&self) -> Result<ModelCatalogResponse, ClientError> {
        self.get_json(Operation::FetchCatalog, CATALOG_PATH).await
    }

    async fn synthesize(
        &self,
        request: &SynthesizeRequest,
    ) -> Result<SynthesizeResponse, ClientError> {
        self.post_json(Operation::Synthesize, SYNTHESIZE_PATH, request)
            .await
    }

    async fn synthesize_batch(
        &self,
        request: &BatchSynthesizeRequest,
    ) -> Result<BatchSynthesizeResponse, ClientError> {
        self.post_json(Operation::SynthesizeBatch, SYNTHESIZE_BATCH_PATH, request)
            .await
    }
}
