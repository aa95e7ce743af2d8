//! Verify command implementation - check that every reference genotypes as its own label

use anyhow::{Context, Result};
use hcvgt_core::{Genotype, ReferenceRecord};

use crate::config::Config;
use crate::error::CliError;

/// A reference whose classification disagrees with its label
#[derive(Debug, PartialEq)]
struct Mismatch {
    id: String,
    expected: Genotype,
    found: Option<Genotype>,
}

fn check(record: &ReferenceRecord, found: Option<Genotype>) -> Option<Mismatch> {
    if found == Some(record.genotype) {
        None
    } else {
        Some(Mismatch {
            id: record.id.clone(),
            expected: record.genotype,
            found,
        })
    }
}

pub fn execute(config: &Config) -> Result<()> {
    let (panel, mut classifier) = super::build_classifier(config)?;
    log::info!("Verifying {} reference sequence(s)", panel.len());

    let mut mismatches = Vec::new();
    for record in panel.records() {
        let found = classifier
            .classify(&record.sequence)
            .with_context(|| format!("Failed to classify reference {}", record.id))?;
        log::debug!("{}: label {}, classified {:?}", record.id, record.genotype, found);
        if let Some(mismatch) = check(record, found) {
            mismatches.push(mismatch);
        }
    }

    classifier.close().context("Failed to save genotype cache")?;

    for m in &mismatches {
        let found = m.found.map_or_else(|| "-".to_string(), |g| g.to_string());
        println!("{}\texpected {}\tgot {}", m.id, m.expected, found);
    }

    if mismatches.is_empty() {
        println!("All {} references genotyped correctly", panel.len());
        Ok(())
    } else {
        Err(CliError::validation(format!(
            "{} of {} references were misclassified",
            mismatches.len(),
            panel.len()
        ))
        .into())
    }
}
