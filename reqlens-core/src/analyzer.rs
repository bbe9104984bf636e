//! Requirement extraction pipeline
//!
//! Turns document text into classified requirement records: segment, clean,
//! drop fragments, classify, then apply the score threshold.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::classifier::{Classification, ClassifierError, ZeroShotClassifier};
use crate::config::{ClassifierConfig, DEFAULT_HYPOTHESIS_TEMPLATE, DEFAULT_THRESHOLD};
use crate::models::{ClassifiedRequirement, CANDIDATE_LABELS, CATEGORY_SEPARATOR, GENERAL_CATEGORY};
use crate::text::{clean_sentence, is_candidate, SentenceSegmenter};

/// Errors surfaced by single-text classification
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("Requirement text is empty")]
    EmptyText,

    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

/// Threshold and hypothesis used when scoring sentences
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerSettings {
    pub hypothesis_template: String,
    pub threshold: f32,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            hypothesis_template: DEFAULT_HYPOTHESIS_TEMPLATE.to_string(),
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl From<&ClassifierConfig> for AnalyzerSettings {
    fn from(config: &ClassifierConfig) -> Self {
        Self {
            hypothesis_template: config.hypothesis_template.clone(),
            threshold: config.threshold,
        }
    }
}

/// Classifies documents and ad-hoc sentences into requirement categories
///
/// The classifier and segmenter are created once by the caller and shared
/// read-only between requests.
#[derive(Clone)]
pub struct Analyzer {
    classifier: Arc<dyn ZeroShotClassifier>,
    segmenter: SentenceSegmenter,
    settings: AnalyzerSettings,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("classifier", &self.classifier.describe())
            .field("settings", &self.settings)
            .finish()
    }
}

impl Analyzer {
    pub fn new(
        classifier: Arc<dyn ZeroShotClassifier>,
        segmenter: SentenceSegmenter,
        settings: AnalyzerSettings,
    ) -> Self {
        Self {
            classifier,
            segmenter,
            settings,
        }
    }

    /// Description of the classifier in use
    pub fn classifier_description(&self) -> String {
        self.classifier.describe()
    }

    /// Extract and classify every requirement sentence in `text`
    ///
    /// Sentences shorter than two tokens are skipped. A sentence whose
    /// classification fails is logged and left out of the result.
    pub fn analyze_text(&self, text: &str) -> Vec<ClassifiedRequirement> {
        let sentences = self.segmenter.segment(text);
        let mut requirements = Vec::new();
        let mut skipped = 0usize;
        let mut failed = 0usize;

        for sentence in &sentences {
            let cleaned = clean_sentence(sentence);
            if !is_candidate(&cleaned) {
                skipped += 1;
                continue;
            }

            match self.score(&cleaned) {
                Ok(classification) => {
                    let categories = self.select_categories(&classification);
                    requirements.push(ClassifiedRequirement::new(categories, cleaned));
                }
                Err(e) => {
                    failed += 1;
                    error!("Error classifying sentence: {}", e);
                }
            }
        }

        info!(
            sentences = sentences.len(),
            classified = requirements.len(),
            skipped,
            failed,
            "Document analysis finished"
        );

        requirements
    }

    /// Classify one ad-hoc requirement and build its record
    pub fn classify_text(&self, text: &str) -> Result<ClassifiedRequirement, AnalyzeError> {
        let cleaned = clean_sentence(text);
        if cleaned.is_empty() {
            return Err(AnalyzeError::EmptyText);
        }
        debug!("Cleaned sentence for classification: '{}'", cleaned);

        let classification = self.score(&cleaned)?;
        let categories = self.select_categories(&classification);
        Ok(ClassifiedRequirement::new(categories, cleaned))
    }

    /// Join the labels that pass the threshold, or fall back to "General"
    pub fn select_categories(&self, classification: &Classification) -> String {
        let labels = classification.labels_above(self.settings.threshold);
        if labels.is_empty() {
            GENERAL_CATEGORY.to_string()
        } else {
            labels.join(CATEGORY_SEPARATOR)
        }
    }

    fn score(&self, sentence: &str) -> Result<Classification, ClassifierError> {
        let classification =
            self.classifier
                .classify(sentence, &CANDIDATE_LABELS, &self.settings.hypothesis_template)?;
        debug!(?classification, "Classification result");
        Ok(classification)
    }
}
