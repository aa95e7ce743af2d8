pub mod classify;
pub mod verify;

use anyhow::{Context, Result};
use hcvgt_core::{BlastnEngine, Classifier, ReferencePanel, SearchEngine};

use crate::config::Config;
use crate::error::CliError;

/// Load the reference panel and build a blastn-backed classifier from `config`
pub fn build_classifier(config: &Config) -> Result<(ReferencePanel, Classifier<BlastnEngine>)> {
    let references = &config.search.references;
    if !references.exists() {
        return Err(CliError::file_not_found(references.clone()).into());
    }
    let panel = ReferencePanel::load(references)
        .with_context(|| format!("Invalid reference panel: {}", references.display()))?;

    let engine = BlastnEngine::with_binary_path(&config.search.blastn, references);
    if !engine.is_available() {
        return Err(CliError::external_tool(
            "blastn".to_string(),
            format!("cannot run {}", config.search.blastn.display()),
        )
        .into());
    }
    if let Some(version) = engine.version() {
        log::info!("Using {}", version);
    }

    let classifier = Classifier::open(engine, &config.cache.path)
        .with_context(|| format!("Failed to open genotype cache: {}", config.cache.path.display()))?;
    log::info!(
        "Genotype cache {} holds {} result(s)",
        config.cache.path.display(),
        classifier.cache().len()
    );

    Ok((panel, classifier))
}
