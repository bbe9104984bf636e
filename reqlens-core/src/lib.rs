pub mod analyzer;
pub mod classifier;
pub mod config;
pub mod extract;
pub mod models;
pub mod store;
pub mod text;

// Re-export commonly used types
pub use analyzer::{AnalyzeError, Analyzer, AnalyzerSettings};
pub use classifier::{
    Classification, ClassifierError, ClassifierMode, InferenceClassifier, Prediction,
    ZeroShotClassifier,
};
pub use config::{ClassifierConfig, Config, ServerConfig, StorageConfig};
pub use extract::{extract_text, DocumentKind, ExtractError};
pub use models::{
    ClassifiedRequirement, RequirementStats, RequirementStatus, CANDIDATE_LABELS,
    CATEGORY_SEPARATOR, GENERAL_CATEGORY,
};
pub use store::RequirementStore;
pub use text::{clean_sentence, is_candidate, sanitize_filename, SentenceSegmenter};
