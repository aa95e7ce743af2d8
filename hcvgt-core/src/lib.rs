//! HCV genotyper core library
//!
//! Genotype values, the BLAST search wrapper, the reference panel loader and
//! the persistent memoizing cache that sits in front of the classifier.

pub mod genotype;
pub mod cache;
pub mod search;
pub mod fasta;
pub mod reference;
pub mod classify;

// Re-export commonly used types and functions
pub use genotype::{Genotype, GenotypeParseError, MatchScore};
pub use cache::{cache_key, CacheError, CacheResult, PersistentCache};
pub use search::{BlastParams, HitDescription, SearchEngine, SearchError, SearchResult};
pub use search::blastn::BlastnEngine;
pub use fasta::{read_fasta, FastaError, FastaRecord};
pub use reference::{ReferencePanel, ReferenceRecord, ReferenceError};
pub use classify::{best_match, normalize, Classifier, ClassifyError, ClassifyResult};

/// Version information for the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
