//! HCV reference panel
//!
//! The panel is a FASTA file whose headers are exactly an identifier and a
//! genotype label, e.g. `>AF009606 1a`. The same file is the blastn search
//! subject, and the classifier reads the label back as the last token of the
//! hit title, so nothing may follow it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::fasta::{self, FastaError, FastaRecord};
use crate::genotype::{Genotype, GenotypeParseError};

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("Failed to read reference panel {path}: {source}")]
    Fasta {
        path: PathBuf,
        #[source]
        source: FastaError,
    },

    #[error("Reference '{id}' has no genotype label in its header")]
    MissingLabel { id: String },

    #[error("Reference '{id}' has text after its genotype label: '{header}'")]
    TrailingFields { id: String, header: String },

    #[error("Reference '{id}' has an invalid genotype label: {source}")]
    InvalidLabel {
        id: String,
        #[source]
        source: GenotypeParseError,
    },
}

/// A reference sequence with its known genotype
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRecord {
    pub id: String,
    pub label: String,
    pub genotype: Genotype,
    pub sequence: String,
}

impl ReferenceRecord {
    fn from_fasta(record: FastaRecord) -> Result<Self, ReferenceError> {
        let id = record.id().to_string();
        let mut fields = record.description_fields();
        let label = fields
            .next()
            .ok_or_else(|| ReferenceError::MissingLabel { id: id.clone() })?
            .to_string();
        if fields.next().is_some() {
            return Err(ReferenceError::TrailingFields {
                id,
                header: record.header.clone(),
            });
        }
        let genotype = Genotype::parse(&label).map_err(|source| ReferenceError::InvalidLabel {
            id: id.clone(),
            source,
        })?;
        drop(fields);

        Ok(Self {
            id,
            label,
            genotype,
            sequence: record.sequence,
        })
    }
}

/// The set of labelled reference sequences used as the search subject
#[derive(Debug, Clone)]
pub struct ReferencePanel {
    path: PathBuf,
    records: Vec<ReferenceRecord>,
}

impl ReferencePanel {
    /// Load and validate the panel at `path`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReferenceError> {
        let path = path.as_ref().to_path_buf();
        let fasta_records = fasta::read_fasta(&path).map_err(|source| ReferenceError::Fasta {
            path: path.clone(),
            source,
        })?;
        let records = Self::from_records(fasta_records)?;

        log::info!("Loaded {} reference sequences from {}", records.len(), path.display());
        Ok(Self { path, records })
    }

    fn from_records(fasta_records: Vec<FastaRecord>) -> Result<Vec<ReferenceRecord>, ReferenceError> {
        fasta_records
            .into_iter()
            .map(ReferenceRecord::from_fasta)
            .collect()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[ReferenceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct genotypes present in the panel, sorted
    pub fn genotypes(&self) -> Vec<Genotype> {
        self.records
            .iter()
            .map(|r| r.genotype)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_panel(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_panel() {
        let file = write_panel(">AF009606 1a\nACGT\n>D17763 3a\nGGCC\n>M62321 1a\nTTAA\n");
        let panel = ReferencePanel::load(file.path()).unwrap();

        assert_eq!(panel.len(), 3);
        assert_eq!(panel.records()[0].id, "AF009606");
        assert_eq!(panel.records()[0].label, "1a");
        assert_eq!(panel.records()[1].genotype, Genotype::new(3, Some('a')).unwrap());
        assert_eq!(
            panel.genotypes(),
            vec![Genotype::new(1, Some('a')).unwrap(), Genotype::new(3, Some('a')).unwrap()]
        );
    }

    #[test]
    fn test_missing_label_rejected() {
        let file = write_panel(">AF009606\nACGT\n");
        let result = ReferencePanel::load(file.path());
        assert!(matches!(result, Err(ReferenceError::MissingLabel { .. })));
    }

    #[test]
    fn test_text_after_label_rejected() {
        let file = write_panel(">AF009606 1a\nACGT\n>M62321 1a H77\nTTAA\n");
        let result = ReferencePanel::load(file.path());
        assert!(matches!(
            result,
            Err(ReferenceError::TrailingFields { ref id, .. }) if id == "M62321"
        ));
    }

    #[test]
    fn test_invalid_label_rejected() {
        let file = write_panel(">AF009606 7x\nACGT\n");
        let result = ReferencePanel::load(file.path());
        assert!(matches!(result, Err(ReferenceError::InvalidLabel { .. })));
    }

    #[test]
    fn test_missing_file_rejected() {
        let result = ReferencePanel::load("/nonexistent/hcv-refs.fasta");
        assert!(matches!(result, Err(ReferenceError::Fasta { .. })));
    }
}
