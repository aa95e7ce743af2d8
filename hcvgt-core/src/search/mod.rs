//! Sequence search engines
//!
//! The classifier hands a nucleotide sequence to a [`SearchEngine`] and gets
//! back the engine's ranked hit list. The only production engine is NCBI
//! `blastn`, run as a child process.

pub mod blastn;
pub mod xml;

/// Fixed `blastn` parameter set used for genotyping
#[derive(Debug, Clone, PartialEq)]
pub struct BlastParams {
    /// Output format (5 = BLAST XML)
    pub outfmt: u8,
    /// Expectation value threshold for reporting hits
    pub evalue: f64,
    pub gap_open: i32,
    pub gap_extend: i32,
    /// Penalty for a nucleotide mismatch
    pub penalty: i32,
    /// Reward for a nucleotide match
    pub reward: i32,
    /// Only the single best subject is reported per query
    pub max_target_seqs: u32,
}

impl Default for BlastParams {
    fn default() -> Self {
        Self {
            outfmt: 5,
            evalue: 0.0001,
            gap_open: 5,
            gap_extend: 2,
            penalty: -3,
            reward: 1,
            max_target_seqs: 1,
        }
    }
}

impl BlastParams {
    /// Render the parameters as `blastn` command line arguments
    pub fn to_args(&self) -> Vec<String> {
        vec![
            "-outfmt".to_string(),
            self.outfmt.to_string(),
            "-evalue".to_string(),
            self.evalue.to_string(),
            "-gapopen".to_string(),
            self.gap_open.to_string(),
            "-gapextend".to_string(),
            self.gap_extend.to_string(),
            "-penalty".to_string(),
            self.penalty.to_string(),
            "-reward".to_string(),
            self.reward.to_string(),
            "-max_target_seqs".to_string(),
            self.max_target_seqs.to_string(),
        ]
    }
}

/// One entry of a search engine's ranked result list
#[derive(Debug, Clone, PartialEq)]
pub struct HitDescription {
    /// Hit identifier and definition line, joined by a space
    pub title: String,
    /// Raw score of the hit's first HSP
    pub score: f64,
}

impl HitDescription {
    pub fn new<S: Into<String>>(title: S, score: f64) -> Self {
        Self {
            title: title.into(),
            score,
        }
    }

    /// Last whitespace-delimited token of the title, where the reference label lives
    pub fn label(&self) -> Option<&str> {
        self.title.split_whitespace().last()
    }
}

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur while running a search
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("External tool error: {0}")]
    ExternalTool(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Trait for sequence search engines
pub trait SearchEngine {
    /// Search `sequence` against the reference panel and return the ranked hits
    fn search(&self, sequence: &str) -> SearchResult<Vec<HitDescription>>;

    /// Get the name/identifier of this engine
    fn name(&self) -> &'static str;

    /// Check if the engine can run (e.g., external tools installed)
    fn is_available(&self) -> bool {
        true
    }
}

impl<E: SearchEngine + ?Sized> SearchEngine for Box<E> {
    fn search(&self, sequence: &str) -> SearchResult<Vec<HitDescription>> {
        (**self).search(sequence)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}
