//! Zero-shot classification
//!
//! This module scores requirement sentences against candidate labels using a
//! pretrained zero-shot model served over an inference HTTP API.

pub mod client;
pub mod responses;

pub use client::{ClassifierError, ClassifierMode, InferenceClassifier, ZeroShotClassifier};
pub use responses::{Classification, Prediction};
