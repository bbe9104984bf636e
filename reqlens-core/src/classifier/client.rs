//! Classifier Client Module
//!
//! Handles communication with a zero-shot model hosted behind a
//! Hugging Face compatible inference API.

use crate::classifier::responses::{self, Classification};
use crate::config::ClassifierConfig;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

/// Errors that can occur during classification
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Classification model not available")]
    NotAvailable,

    #[error("Nothing to classify")]
    EmptyInput,

    #[error("Inference request failed: {0}")]
    RequestFailed(String),

    #[error("Inference API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from inference API: {0}")]
    InvalidResponse(String),
}

/// Scores text against a set of candidate labels without task-specific training
///
/// Implementations are built once at startup and shared across request
/// threads, so they must be `Send + Sync`.
pub trait ZeroShotClassifier: Send + Sync {
    /// Score `text` against every label, filling `{}` in the hypothesis
    /// template with each label
    fn classify(
        &self,
        text: &str,
        labels: &[&str],
        hypothesis_template: &str,
    ) -> Result<Classification, ClassifierError>;

    /// Short human-readable description of the backing model
    fn describe(&self) -> String;
}

/// Classifier operation mode
#[derive(Debug, Clone, Default)]
pub enum ClassifierMode {
    /// Remote inference endpoint for a specific model
    Remote {
        url: String,
        model: String,
        token: Option<String>,
    },
    /// Classification disabled or failed to initialize
    #[default]
    Disabled,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters<'a>,
}

#[derive(Debug, Serialize)]
struct InferenceParameters<'a> {
    candidate_labels: &'a [&'a str],
    multi_label: bool,
    hypothesis_template: &'a str,
}

/// Zero-shot classifier backed by an inference HTTP API
#[derive(Debug, Clone)]
pub struct InferenceClassifier {
    mode: ClassifierMode,
    http: Option<reqwest::blocking::Client>,
}

impl Default for InferenceClassifier {
    fn default() -> Self {
        Self::disabled()
    }
}

impl InferenceClassifier {
    /// A classifier that rejects every request
    pub fn disabled() -> Self {
        Self {
            mode: ClassifierMode::Disabled,
            http: None,
        }
    }

    /// Set up the classifier from configuration
    ///
    /// Setup failures are logged and leave the classifier disabled; callers
    /// find out on their first classification.
    pub fn from_config(config: &ClassifierConfig, token: Option<String>) -> Self {
        if !config.enabled {
            info!("Zero-shot classification disabled by configuration");
            return Self::disabled();
        }

        let http = match reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
        {
            Ok(http) => http,
            Err(e) => {
                error!("Error setting up zero-shot classification client: {}", e);
                return Self::disabled();
            }
        };

        let url = format!(
            "{}/{}",
            config.endpoint.trim_end_matches('/'),
            config.model.trim_start_matches('/')
        );
        info!(model = %config.model, %url, "Zero-shot classification model configured");

        Self {
            mode: ClassifierMode::Remote {
                url,
                model: config.model.clone(),
                token: token.filter(|t| !t.trim().is_empty()),
            },
            http: Some(http),
        }
    }

    /// Check if classification is available
    pub fn is_available(&self) -> bool {
        matches!(self.mode, ClassifierMode::Remote { .. }) && self.http.is_some()
    }

    /// Get the current mode
    pub fn mode(&self) -> &ClassifierMode {
        &self.mode
    }
}

impl ZeroShotClassifier for InferenceClassifier {
    fn classify(
        &self,
        text: &str,
        labels: &[&str],
        hypothesis_template: &str,
    ) -> Result<Classification, ClassifierError> {
        let (url, token, http) = match (&self.mode, &self.http) {
            (ClassifierMode::Remote { url, token, .. }, Some(http)) => (url, token, http),
            _ => return Err(ClassifierError::NotAvailable),
        };

        if text.trim().is_empty() || labels.is_empty() {
            return Err(ClassifierError::EmptyInput);
        }

        let body = InferenceRequest {
            inputs: text,
            parameters: InferenceParameters {
                candidate_labels: labels,
                multi_label: true,
                hypothesis_template,
            },
        };

        let mut request = http.post(url).json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .map_err(|e| ClassifierError::RequestFailed(e.to_string()))?;
        let status = response.status();
        let payload = response
            .text()
            .map_err(|e| ClassifierError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                message: responses::parse_error_message(&payload),
            });
        }

        responses::parse_zero_shot_response(&payload)
    }

    fn describe(&self) -> String {
        match &self.mode {
            ClassifierMode::Remote { model, .. } => format!("Inference API ({})", model),
            ClassifierMode::Disabled => "Disabled".to_string(),
        }
    }
}
