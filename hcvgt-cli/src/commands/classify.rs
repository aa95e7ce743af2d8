//! Classify command implementation - genotype query sequences

use anyhow::{Context, Result};
use hcvgt_core::{read_fasta, Genotype};
use std::path::PathBuf;

use crate::config::Config;
use crate::error::CliError;

/// Placeholder printed for sequences without a match
const NO_MATCH: &str = "-";

fn display_genotype(genotype: Option<Genotype>) -> String {
    genotype.map_or_else(|| NO_MATCH.to_string(), |g| g.to_string())
}

/// Collect `(id, sequence)` pairs from positional arguments and an optional FASTA file
fn collect_queries(sequences: Vec<String>, fasta: Option<PathBuf>) -> Result<Vec<(String, String)>> {
    let mut queries: Vec<(String, String)> = sequences
        .into_iter()
        .enumerate()
        .map(|(i, seq)| (format!("seq{}", i + 1), seq))
        .collect();

    if let Some(path) = fasta {
        if !path.exists() {
            return Err(CliError::file_not_found(path).into());
        }
        let records = read_fasta(&path)
            .with_context(|| format!("Failed to read query sequences from {}", path.display()))?;
        queries.extend(records.into_iter().map(|r| (r.id().to_string(), r.sequence)));
    }

    if queries.is_empty() {
        return Err(CliError::validation("no sequences given; pass them as arguments or with --fasta").into());
    }
    Ok(queries)
}

pub fn execute(
    config: &Config,
    sequences: Vec<String>,
    fasta: Option<PathBuf>,
    consensus: bool,
) -> Result<()> {
    let queries = collect_queries(sequences, fasta)?;
    log::info!("Classifying {} sequence(s)", queries.len());

    let (_panel, mut classifier) = super::build_classifier(config)?;

    if consensus {
        let genotype = classifier
            .classify_many(queries.iter().map(|(_, seq)| seq.as_str()))
            .context("Classification failed")?;
        if genotype.is_none() {
            log::warn!("Sequences did not agree on a single genotype");
        }
        println!("{}", display_genotype(genotype));
    } else {
        for (id, seq) in &queries {
            let genotype = classifier
                .classify(seq)
                .with_context(|| format!("Failed to classify {}", id))?;
            println!("{}\t{}", id, display_genotype(genotype));
        }
    }

    classifier.close().context("Failed to save genotype cache")?;
    Ok(())
}
