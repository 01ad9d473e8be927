use crate::error::AppError;
use crate::models::prediction_types::{ExplainResult, PredictResult};
use crate::services::normalizer::format_probability;
use crate::services::session::UploadSession;
use base64::Engine;
use std::fmt::Write;

const UNKNOWN: &str = "unknown";

/// Plain-text rendering of everything the session currently shows.
pub fn render_session(session: &UploadSession) -> String {
    let mut out = String::new();

    match session.file() {
        Some(file) => {
            let _ = writeln!(out, "File: {} ({} bytes)", file.name, file.len());
        }
        None => {
            let _ = writeln!(out, "No file selected");
        }
    }

    if let Some(message) = session.error() {
        let _ = writeln!(out, "\nError\n  {}", message);
    }
    if let Some(result) = session.predict_result() {
        render_predictions(&mut out, result);
    }
    if let Some(result) = session.explain_result() {
        render_explanation(&mut out, result);
    }

    out
}

fn render_predictions(out: &mut String, result: &PredictResult) {
    let top = &result.top_prediction;
    let _ = writeln!(out, "\nAnalysis Results");
    let _ = writeln!(
        out,
        "  Top Prediction: {} {}",
        top.label.as_deref().unwrap_or(UNKNOWN),
        format_probability(top.probability)
    );
    let _ = writeln!(out, "  All Predictions:");

    let width = result
        .predictions
        .iter()
        .map(|p| p.label.as_deref().unwrap_or(UNKNOWN).len())
        .max()
        .unwrap_or(0);
    for pred in &result.predictions {
        let _ = writeln!(
            out,
            "    {:<width$}  {:>6}",
            pred.label.as_deref().unwrap_or(UNKNOWN),
            format_probability(pred.probability),
            width = width
        );
    }
}

fn render_explanation(out: &mut String, result: &ExplainResult) {
    let explained = &result.explained_prediction;
    let _ = writeln!(out, "\nVisual Explanation");
    let _ = write!(
        out,
        "  Grad-CAM focus for: {} ({}",
        explained.label.as_deref().unwrap_or(UNKNOWN),
        format_probability(explained.probability)
    );
    if let Some(idx) = explained.class_index {
        let _ = write!(out, ", class {}", idx);
    }
    let _ = writeln!(out, ")");
    let _ = writeln!(out, "  Original size: {}", format_size(result.image_info.original_size));
    let _ = writeln!(
        out,
        "  Model input size: {}",
        format_size(result.image_info.model_input_size)
    );
}

fn format_size(size: Option<(u32, u32)>) -> String {
    match size {
        Some((w, h)) => format!("{} × {}", w, h),
        None => UNKNOWN.to_string(),
    }
}

/// Raw PNG bytes of the heatmap overlay.
pub fn decode_heatmap(result: &ExplainResult) -> Result<Vec<u8>, AppError> {
    let encoded = result
        .heatmap_image
        .as_deref()
        .ok_or_else(|| AppError::from("Explanation has no heatmap image"))?;
    Ok(base64::engine::general_purpose::STANDARD.decode(encoded.trim())?)
}

pub fn heatmap_data_uri(result: &ExplainResult) -> Option<String> {
    result
        .heatmap_image
        .as_deref()
        .map(|b64| format!("data:image/png;base64,{}", b64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::prediction_types::{ExplainedPrediction, ImageInfo, PredictionItem};
    use crate::models::session_types::Operation;
    use crate::models::upload_types::SelectedFile;
    use std::sync::Arc;

    fn explain_result() -> ExplainResult {
        ExplainResult {
            filename: Some("a.png".into()),
            heatmap_image: Some("aGVsbG8=".into()),
            explained_prediction: ExplainedPrediction {
                label: Some("Pneumonia".into()),
                probability: Some(0.8),
                class_index: Some(3),
            },
            image_info: ImageInfo {
                original_size: Some((1024, 768)),
                model_input_size: Some((224, 224)),
            },
        }
    }

    fn session_with_results() -> UploadSession {
        let file = SelectedFile {
            name: "a.png".into(),
            bytes: Arc::from(vec![0u8; 10]),
            preview: None,
        };
        let session = UploadSession::new().select_file(file);
        let (session, p) = session.begin(Operation::Predict);
        let (session, e) = session.begin(Operation::Explain);
        let session = session.complete_predict(
            p.unwrap(),
            PredictResult {
                filename: Some("a.png".into()),
                predictions: vec![
                    PredictionItem::new("Pneumonia", 0.8),
                    PredictionItem {
                        label: Some("Normal".into()),
                        probability: Some(f64::INFINITY),
                    },
                ],
                top_prediction: PredictionItem::new("Pneumonia", 0.8),
            },
        );
        session.complete_explain(e.unwrap(), explain_result())
    }

    #[test]
    fn renders_predictions_and_explanation() {
        let text = render_session(&session_with_results());
        assert!(text.contains("File: a.png (10 bytes)"));
        assert!(text.contains("Top Prediction: Pneumonia 80.0%"));
        assert!(text.contains("Normal"));
        assert!(text.contains("0.0%"));
        assert!(text.contains("Grad-CAM focus for: Pneumonia (80.0%, class 3)"));
        assert!(text.contains("Original size: 1024 × 768"));
        assert!(text.contains("Model input size: 224 × 224"));
        assert!(!text.contains("Error"));
    }

    #[test]
    fn renders_error_panel() {
        let session = session_with_results();
        let (session, t) = session.begin(Operation::Predict);
        let text = render_session(&session.fail(t.unwrap(), "model unavailable"));
        assert!(text.contains("Error\n  model unavailable"));
    }

    #[test]
    fn renders_empty_session() {
        assert_eq!(render_session(&UploadSession::new()), "No file selected\n");
    }

    #[test]
    fn heatmap_decoding() {
        let result = explain_result();
        assert_eq!(decode_heatmap(&result).unwrap(), b"hello");
        assert_eq!(
            heatmap_data_uri(&result).as_deref(),
            Some("data:image/png;base64,aGVsbG8=")
        );

        let missing = ExplainResult::default();
        assert!(decode_heatmap(&missing).is_err());
        assert!(heatmap_data_uri(&missing).is_none());
    }
}
