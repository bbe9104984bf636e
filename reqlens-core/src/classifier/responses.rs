//! Response Parsing Module
//!
//! Parses zero-shot classification responses from the inference API into
//! structured data types.

use crate::classifier::client::ClassifierError;
use serde::{Deserialize, Serialize};

/// A label with its confidence score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub score: f32,
}

/// Scores for every candidate label, highest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub predictions: Vec<Prediction>,
}

impl Classification {
    /// Build a classification, ordering predictions by descending score
    pub fn new(mut predictions: Vec<Prediction>) -> Self {
        predictions.sort_by(|a, b| b.score.total_cmp(&a.score));
        Self { predictions }
    }

    /// Labels whose score is at or above `threshold`, highest first
    pub fn labels_above(&self, threshold: f32) -> Vec<&str> {
        self.predictions
            .iter()
            .filter(|p| p.score >= threshold)
            .map(|p| p.label.as_str())
            .collect()
    }
}

/// The shapes the inference API is known to answer with
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawResponse {
    /// `{"sequence": "...", "labels": [...], "scores": [...]}`
    Columns { labels: Vec<String>, scores: Vec<f32> },
    /// `[{"label": "...", "score": 0.9}, ...]`
    Pairs(Vec<Prediction>),
    /// `{"error": "Model is loading", ...}`
    Error { error: String },
}

/// Parse a zero-shot response body
pub fn parse_zero_shot_response(body: &str) -> Result<Classification, ClassifierError> {
    let raw: RawResponse = serde_json::from_str(body).map_err(|e| {
        ClassifierError::InvalidResponse(format!(
            "Failed to parse classification response: {}. Body: {}",
            e,
            truncate(body, 200)
        ))
    })?;

    match raw {
        RawResponse::Columns { labels, scores } => {
            if labels.len() != scores.len() {
                return Err(ClassifierError::InvalidResponse(format!(
                    "{} labels but {} scores",
                    labels.len(),
                    scores.len()
                )));
            }
            let predictions = labels
                .into_iter()
                .zip(scores)
                .map(|(label, score)| Prediction { label, score })
                .collect();
            Ok(Classification::new(predictions))
        }
        RawResponse::Pairs(predictions) => Ok(Classification::new(predictions)),
        RawResponse::Error { error } => Err(ClassifierError::InvalidResponse(error)),
    }
}

/// Pull a readable message out of an error body, falling back to the raw text
pub fn parse_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: serde_json::Value,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error: serde_json::Value::String(s),
        }) => s,
        Ok(ErrorBody { error }) => error.to_string(),
        Err(_) => truncate(body.trim(), 200).to_string(),
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
