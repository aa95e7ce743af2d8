//! FASTA sequence file reading
//!
//! Thin layer over needletail that yields owned header/sequence pairs. Used for
//! the reference panel and for query files handed to the command line tool.

use std::io::Read;
use std::path::Path;

use needletail::{parse_fastx_file, parse_fastx_reader, FastxReader};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FastaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Empty file or no sequences found")]
    EmptyFile,
}

pub type FastaResult<T> = Result<T, FastaError>;

/// One FASTA record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    /// Full header line without the leading `>`
    pub header: String,
    pub sequence: String,
}

impl FastaRecord {
    /// First whitespace-delimited field of the header
    pub fn id(&self) -> &str {
        self.header.split_whitespace().next().unwrap_or("")
    }

    /// Header fields after the identifier
    pub fn description_fields(&self) -> impl Iterator<Item = &str> {
        self.header.split_whitespace().skip(1)
    }
}

/// Read every record of a FASTA/FASTQ file (optionally gzipped)
pub fn read_fasta<P: AsRef<Path>>(path: P) -> FastaResult<Vec<FastaRecord>> {
    if !path.as_ref().exists() {
        return Err(FastaError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.as_ref().display()),
        )));
    }
    let reader = parse_fastx_file(&path).map_err(|e| FastaError::Parse(e.to_string()))?;
    collect_records(reader)
}

/// Read every record from any readable source
pub fn parse_reader<R: Read + Send + 'static>(reader: R) -> FastaResult<Vec<FastaRecord>> {
    let fastx_reader = parse_fastx_reader(reader).map_err(|e| FastaError::Parse(e.to_string()))?;
    collect_records(fastx_reader)
}

fn collect_records(mut reader: Box<dyn FastxReader>) -> FastaResult<Vec<FastaRecord>> {
    let mut records = Vec::new();

    while let Some(record) = reader.next() {
        let record = record.map_err(|e| FastaError::Parse(e.to_string()))?;
        let header = String::from_utf8_lossy(record.id()).trim().to_string();
        let sequence = String::from_utf8_lossy(&record.seq()).to_string();
        records.push(FastaRecord { header, sequence });
    }

    if records.is_empty() {
        Err(FastaError::EmptyFile)
    } else {
        Ok(records)
    }
}
