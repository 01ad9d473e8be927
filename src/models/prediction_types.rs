use crate::models::lenient;
use serde::{Deserialize, Serialize};

/// One disease-class score.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct PredictionItem {
    pub label: Option<String>,
    pub probability: Option<f64>,
}

impl PredictionItem {
    pub fn new(label: impl Into<String>, probability: f64) -> Self {
        Self {
            label: Some(label.into()),
            probability: Some(probability),
        }
    }
}

/// Normalized reply of the predict endpoint.
///
/// `predictions` keeps the order the service ranked them in and
/// `top_prediction` is the service's own pick, never recomputed here.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct PredictResult {
    pub filename: Option<String>,
    pub predictions: Vec<PredictionItem>,
    pub top_prediction: PredictionItem,
}

/// Reply of the explain endpoint, decoded straight from the service's `data`
/// object since its field names already match.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ExplainResult {
    #[serde(default, deserialize_with = "lenient::option")]
    pub filename: Option<String>,
    /// Base64-encoded PNG overlay.
    #[serde(default, deserialize_with = "lenient::option")]
    pub heatmap_image: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub explained_prediction: ExplainedPrediction,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub image_info: ImageInfo,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ExplainedPrediction {
    #[serde(default, deserialize_with = "lenient::option")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub probability: Option<f64>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub class_index: Option<u32>,
}

/// Sizes are `(width, height)`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ImageInfo {
    #[serde(default, deserialize_with = "lenient::option")]
    pub original_size: Option<(u32, u32)>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub model_input_size: Option<(u32, u32)>,
}
