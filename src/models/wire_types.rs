//! Bodies exactly as the inference service sends them, every field optional.

use crate::models::lenient;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// `{ success, data, message }` wrapper shared by both endpoints.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct RawEnvelope<T> {
    #[serde(default, deserialize_with = "lenient::option")]
    pub success: Option<bool>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub data: Option<T>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub message: Option<String>,
}

impl<T> RawEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.success == Some(true)
    }
}

/// Error bodies only ever matter for their `message`.
#[derive(Debug, Deserialize, Default)]
pub struct RawErrorBody {
    #[serde(default, deserialize_with = "lenient::option")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RawPredictData {
    #[serde(default, deserialize_with = "lenient::option")]
    pub filename: Option<String>,
    #[serde(default, deserialize_with = "lenient::seq")]
    pub predictions: Option<Vec<RawPrediction>>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub top_prediction: Option<RawTopPrediction>,
}

/// List entries abbreviate the probability as `prob`.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct RawPrediction {
    #[serde(default, deserialize_with = "lenient::option")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub prob: Option<f64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RawTopPrediction {
    #[serde(default, deserialize_with = "lenient::option")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub probability: Option<f64>,
}
