use crate::config::ClientConfig;
use crate::error::{ApiError, AppError};
use crate::models::prediction_types::{ExplainResult, PredictResult};
use crate::models::session_types::{HealthStatus, Operation};
use crate::models::upload_types::SelectedFile;
use crate::models::wire_types::{RawEnvelope, RawErrorBody, RawPredictData};
use crate::services::normalizer;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::future::Future;

const HEALTH_PATH: &str = "/heartbeat";
const HEALTH_FALLBACK: &str = "Health check failed";

/// The two remote operations the upload session drives.
pub trait InferenceApi: Send + Sync + 'static {
    fn predict(
        &self,
        file: &SelectedFile,
    ) -> impl Future<Output = Result<PredictResult, ApiError>> + Send;

    fn explain(
        &self,
        file: &SelectedFile,
    ) -> impl Future<Output = Result<ExplainResult, ApiError>> + Send;
}

/// HTTP client for the inference service. No timeout and no retries: the
/// service's own latency bounds every call.
#[derive(Clone)]
pub struct ApiClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, AppError> {
        let http_client = reqwest::Client::builder().build().map_err(|e| AppError {
            message: format!("Failed to create HTTP client: {}", e),
        })?;
        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let url = self.config.endpoint(HEALTH_PATH);
        let response = self.http_client.get(&url).send().await.map_err(|e| {
            log::warn!("GET {} failed: {}", url, e);
            ApiError::Network {
                message: HEALTH_FALLBACK.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Transport {
                status: status.as_u16(),
                message: HEALTH_FALLBACK.to_string(),
            });
        }
        response.json().await.map_err(|e| {
            log::warn!("Unreadable heartbeat from {}: {}", url, e);
            ApiError::Malformed {
                message: HEALTH_FALLBACK.to_string(),
            }
        })
    }

    /// Uploads `file` as the single multipart field `file` and returns the
    /// envelope's `data`, if any.
    async fn upload<T: DeserializeOwned>(
        &self,
        op: Operation,
        file: &SelectedFile,
    ) -> Result<Option<T>, ApiError> {
        let fallback = op.fallback_message();
        let network_error = |e: reqwest::Error| {
            log::warn!("{} request for {} failed: {}", op, file.name, e);
            ApiError::Network {
                message: fallback.to_string(),
            }
        };

        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str(file.mime_type())
            .map_err(network_error)?;
        let form = Form::new().part("file", part);

        let url = self.config.endpoint(op.path());
        log::debug!("POST {} ({}, {} bytes)", url, file.name, file.len());

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(network_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(network_error)?;
        log::debug!("{} response {}: {}", op, status, String::from_utf8_lossy(&body));

        interpret_body(op, status, &body)
    }
}

impl InferenceApi for ApiClient {
    async fn predict(&self, file: &SelectedFile) -> Result<PredictResult, ApiError> {
        let data: Option<RawPredictData> = self.upload(Operation::Predict, file).await?;
        Ok(normalizer::normalize_predict(data.unwrap_or_default()))
    }

    // The explain payload already uses the internal field names.
    async fn explain(&self, file: &SelectedFile) -> Result<ExplainResult, ApiError> {
        let data: Option<ExplainResult> = self.upload(Operation::Explain, file).await?;
        Ok(data.unwrap_or_default())
    }
}

/// Applies the transport check then the application check to a reply body.
pub fn interpret_body<T: DeserializeOwned>(
    op: Operation,
    status: StatusCode,
    body: &[u8],
) -> Result<Option<T>, ApiError> {
    let fallback = op.fallback_message();

    if !status.is_success() {
        let message = serde_json::from_slice::<RawErrorBody>(body)
            .ok()
            .and_then(|b| b.message);
        return Err(ApiError::Transport {
            status: status.as_u16(),
            message: message_or(message, fallback),
        });
    }

    let envelope: RawEnvelope<T> = serde_json::from_slice(body).map_err(|e| {
        log::warn!("{} response is not a JSON object: {}", op, e);
        ApiError::Malformed {
            message: fallback.to_string(),
        }
    })?;

    if !envelope.is_success() {
        return Err(ApiError::Application {
            message: message_or(envelope.message, fallback),
        });
    }

    Ok(envelope.data)
}

fn message_or(message: Option<String>, fallback: &str) -> String {
    message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}
