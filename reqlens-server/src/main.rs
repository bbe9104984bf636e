mod cli;
mod error;
mod routes;
mod server;
mod upload;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use reqlens_core::config::inference_token;
use reqlens_core::{
    extract_text, Analyzer, AnalyzerSettings, Config, InferenceClassifier, SentenceSegmenter,
};

use crate::cli::{Cli, Command};
use crate::routes::AppState;

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_deref().unwrap_or("info"))),
        )
        .init();

    let mut config = Config::resolve(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    match &cli.command {
        None | Some(Command::Serve { .. }) => serve(&config),
        Some(Command::Analyze { file }) => analyze_file(&config, file),
        Some(Command::Classify { text }) => classify_text(&config, text),
        Some(Command::Config) => {
            print!("{}", config.to_yaml()?);
            Ok(())
        }
    }
}

/// Build the analyzer once; classifier setup failures leave it disabled
fn build_analyzer(config: &Config) -> Analyzer {
    let classifier = InferenceClassifier::from_config(&config.classifier, inference_token());
    if !classifier.is_available() {
        warn!("Zero-shot classifier unavailable; classification requests will fail");
    }

    Analyzer::new(
        Arc::new(classifier),
        SentenceSegmenter::new(),
        AnalyzerSettings::from(&config.classifier),
    )
}

fn serve(config: &Config) -> Result<()> {
    let upload_dir = &config.storage.upload_dir;
    fs::create_dir_all(upload_dir)
        .with_context(|| format!("Failed to create upload directory: {:?}", upload_dir))?;
    info!("Storing uploads in {:?}", upload_dir);

    let state = Arc::new(AppState::new(build_analyzer(config), upload_dir.clone()));
    server::run(state, &config.server)
}

fn analyze_file(config: &Config, file: &Path) -> Result<()> {
    let text = extract_text(file).with_context(|| format!("Failed to read {:?}", file))?;
    if text.trim().is_empty() {
        anyhow::bail!("No valid text found in {:?}", file);
    }

    let requirements = build_analyzer(config).analyze_text(&text);
    println!("{}", serde_json::to_string_pretty(&requirements)?);
    Ok(())
}

fn classify_text(config: &Config, text: &str) -> Result<()> {
    let requirement = build_analyzer(config)
        .classify_text(text)
        .context("Classification failed")?;
    println!("{}", requirement.categories);
    Ok(())
}
