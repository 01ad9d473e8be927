//! Turns raw service replies into the stable internal result shapes.
//!
//! Nothing here fails: absent or mistyped fields stay absent and are handled
//! when rendered.

use crate::models::prediction_types::{PredictResult, PredictionItem};
use crate::models::wire_types::{RawPredictData, RawPrediction, RawTopPrediction};

/// Relabels `prob` to `probability`, keeping order and count exactly.
pub fn normalize_predictions(raw: &[RawPrediction]) -> Vec<PredictionItem> {
    raw.iter()
        .map(|pred| PredictionItem {
            label: pred.label.clone(),
            probability: pred.prob,
        })
        .collect()
}

/// Uses the service's top prediction verbatim, even when it disagrees with
/// the list.
pub fn normalize_top(raw: Option<&RawTopPrediction>) -> PredictionItem {
    match raw {
        Some(top) => PredictionItem {
            label: top.label.clone(),
            probability: top.probability,
        },
        None => PredictionItem::default(),
    }
}

pub fn normalize_predict(raw: RawPredictData) -> PredictResult {
    PredictResult {
        predictions: normalize_predictions(raw.predictions.as_deref().unwrap_or_default()),
        top_prediction: normalize_top(raw.top_prediction.as_ref()),
        filename: raw.filename,
    }
}

/// Percentage with one decimal; absent or non-finite values show as `0.0%`.
pub fn format_probability(probability: Option<f64>) -> String {
    match probability {
        Some(p) if p.is_finite() => format!("{:.1}%", p * 100.0),
        _ => "0.0%".to_string(),
    }
}
