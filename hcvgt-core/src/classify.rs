//! Genotype classification
//!
//! Ties the pieces together: tidy the input sequence, look it up in the
//! persistent cache and, on a miss, search it against the reference panel and
//! keep the genotype of the best-scoring hit.

use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;

use crate::cache::{CacheError, CacheResult, PersistentCache};
use crate::genotype::{Genotype, GenotypeParseError, MatchScore};
use crate::search::{HitDescription, SearchEngine, SearchError};

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Genotype(#[from] GenotypeParseError),

    #[error("Search failed: {0}")]
    Search(#[from] SearchError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

pub type ClassifyResult<T> = Result<T, ClassifyError>;

/// Remove spaces, alignment gaps (`-`) and `~` padding from a raw sequence
pub fn normalize(seq: &str) -> String {
    seq.chars().filter(|c| !matches!(c, ' ' | '-' | '~')).collect()
}

/// Genotype of the highest-scoring hit, or `None` for an empty hit list.
///
/// Every hit label must parse, even those that would not win. Ties go to the
/// hit listed first.
pub fn best_match(descriptions: &[HitDescription]) -> Result<Option<Genotype>, GenotypeParseError> {
    let scores = descriptions
        .iter()
        .map(|desc| {
            let genotype = Genotype::parse(desc.label().unwrap_or(""))?;
            Ok(MatchScore::new(genotype, desc.score))
        })
        .collect::<Result<Vec<_>, GenotypeParseError>>()?;

    let mut best: Option<MatchScore> = None;
    for candidate in scores {
        if best.map_or(true, |b| candidate.score > b.score) {
            best = Some(candidate);
        }
    }

    Ok(best.map(|m| m.genotype))
}

/// Classifies sequences with a search engine, remembering results on disk
pub struct Classifier<E: SearchEngine> {
    engine: E,
    cache: PersistentCache<Option<Genotype>>,
}

impl<E: SearchEngine> Classifier<E> {
    pub fn new(engine: E, cache: PersistentCache<Option<Genotype>>) -> Self {
        Self { engine, cache }
    }

    /// Build a classifier with its cache stored at `cache_path`
    pub fn open<P: AsRef<Path>>(engine: E, cache_path: P) -> ClassifyResult<Self> {
        let cache = PersistentCache::open(cache_path)?;
        Ok(Self::new(engine, cache))
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn cache(&self) -> &PersistentCache<Option<Genotype>> {
        &self.cache
    }

    /// Genotype a single sequence. `Ok(None)` means the search found no hit.
    pub fn classify(&mut self, seq: &str) -> ClassifyResult<Option<Genotype>> {
        let tidied = normalize(seq);
        let engine = &self.engine;

        self.cache.get(&[&tidied], || -> ClassifyResult<Option<Genotype>> {
            let descriptions = engine.search(&tidied)?;
            Ok(best_match(&descriptions)?)
        })
    }

    /// Genotype several sequences from one specimen and require them to agree.
    ///
    /// Returns the shared result when every sequence gives the same outcome,
    /// otherwise `None`. "No match" is an outcome of its own, so one unmatched
    /// sequence among matched ones is a disagreement.
    pub fn classify_many<I, S>(&mut self, seqs: I) -> ClassifyResult<Option<Genotype>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut outcomes = HashSet::new();
        for seq in seqs {
            outcomes.insert(self.classify(seq.as_ref())?);
        }

        if outcomes.len() == 1 {
            Ok(outcomes.into_iter().next().flatten())
        } else {
            log::debug!("{} distinct outcomes, no consensus", outcomes.len());
            Ok(None)
        }
    }

    /// Flush the result cache and release the classifier
    pub fn close(self) -> CacheResult<()> {
        self.cache.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchResult;
    use proptest::prelude::*;
    use std::cell::Cell;
    use std::collections::HashMap;
    use tempfile::TempDir;

    /// Engine answering from a fixed table and counting searches
    struct StubEngine {
        hits: HashMap<String, Vec<HitDescription>>,
        calls: Cell<usize>,
    }

    impl StubEngine {
        fn new(entries: Vec<(&str, Vec<(&str, f64)>)>) -> Self {
            let hits = entries
                .into_iter()
                .map(|(seq, hits)| {
                    let descs = hits.into_iter().map(|(t, s)| HitDescription::new(t, s)).collect();
                    (seq.to_string(), descs)
                })
                .collect();
            Self {
                hits,
                calls: Cell::new(0),
            }
        }
    }

    impl SearchEngine for StubEngine {
        fn search(&self, sequence: &str) -> SearchResult<Vec<HitDescription>> {
            self.calls.set(self.calls.get() + 1);
            match sequence {
                "FAIL" => Err(SearchError::ExternalTool("blastn exploded".to_string())),
                _ => Ok(self.hits.get(sequence).cloned().unwrap_or_default()),
            }
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    fn gt(label: &str) -> Genotype {
        Genotype::parse(label).unwrap()
    }

    fn open_classifier(dir: &TempDir, engine: StubEngine) -> Classifier<StubEngine> {
        Classifier::open(engine, dir.path().join("genotypes.cache")).unwrap()
    }

    fn stub() -> StubEngine {
        StubEngine::new(vec![
            ("ACGTACGT", vec![("Subject_1 AF009606 1a", 120.0)]),
            ("GGGGCCCC", vec![("Subject_4 D17763 2b", 80.0)]),
            ("TTTTAAAA", vec![("Subject_4 D17763 2b", 77.0)]),
            ("CCCCAAAA", vec![("Subject_9 X 3", 60.0)]),
            ("BADLABEL", vec![("Subject_2 unlabelled", 99.0)]),
        ])
    }

    #[test]
    fn test_best_match_highest_score_wins() {
        let descs = vec![
            HitDescription::new("ref_a something 2a", 50.0),
            HitDescription::new("ref_b something 1b", 90.0),
        ];
        assert_eq!(best_match(&descs).unwrap(), Some(gt("1b")));
    }

    #[test]
    fn test_best_match_empty() {
        assert_eq!(best_match(&[]).unwrap(), None);
    }

    #[test]
    fn test_best_match_tie_keeps_first() {
        let descs = vec![
            HitDescription::new("r1 4a", 70.0),
            HitDescription::new("r2 5a", 70.0),
        ];
        assert_eq!(best_match(&descs).unwrap(), Some(gt("4a")));
    }

    #[test]
    fn test_best_match_bad_label_fails() {
        let descs = vec![
            HitDescription::new("r1 1a", 90.0),
            HitDescription::new("r2 Samson", 10.0),
        ];
        assert!(best_match(&descs).is_err());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("AC GT-AC~GT"), "ACGTACGT");
        assert_eq!(normalize("~~--  "), "");
        assert_eq!(normalize("ACGT"), "ACGT");
    }

    #[test]
    fn test_classify_and_cache() {
        let dir = TempDir::new().unwrap();
        let mut classifier = open_classifier(&dir, stub());

        assert_eq!(classifier.classify("ACGTACGT").unwrap(), Some(gt("1a")));
        assert_eq!(classifier.classify("ACGTACGT").unwrap(), Some(gt("1a")));
        assert_eq!(classifier.classify("AC-GT ACGT~").unwrap(), Some(gt("1a")));
        assert_eq!(classifier.engine().calls.get(), 1);
        assert_eq!(classifier.cache().len(), 1);
    }

    #[test]
    fn test_classify_no_hits_is_none_and_cached() {
        let dir = TempDir::new().unwrap();
        let mut classifier = open_classifier(&dir, stub());

        assert_eq!(classifier.classify("AAAAAAAA").unwrap(), None);
        assert_eq!(classifier.classify("AAAAAAAA").unwrap(), None);
        assert_eq!(classifier.engine().calls.get(), 1);
    }

    #[test]
    fn test_classify_errors_propagate_uncached() {
        let dir = TempDir::new().unwrap();
        let mut classifier = open_classifier(&dir, stub());

        assert!(matches!(classifier.classify("FAIL"), Err(ClassifyError::Search(_))));
        assert!(matches!(classifier.classify("BADLABEL"), Err(ClassifyError::Genotype(_))));
        assert!(classifier.cache().is_empty());
    }

    #[test]
    fn test_classify_many_agreement() {
        let dir = TempDir::new().unwrap();
        let mut classifier = open_classifier(&dir, stub());

        assert_eq!(
            classifier.classify_many(["GGGGCCCC", "TTTTAAAA"]).unwrap(),
            Some(gt("2b"))
        );
        assert_eq!(classifier.classify_many(["GGGGCCCC", "CCCCAAAA"]).unwrap(), None);
    }

    #[test]
    fn test_classify_many_no_match_disagrees() {
        let dir = TempDir::new().unwrap();
        let mut classifier = open_classifier(&dir, stub());

        assert_eq!(classifier.classify_many(["GGGGCCCC", "AAAAAAAA"]).unwrap(), None);
        assert_eq!(classifier.classify_many(Vec::<String>::new()).unwrap(), None);
    }

    #[test]
    fn test_results_persist_across_classifiers() {
        let dir = TempDir::new().unwrap();

        let mut first = open_classifier(&dir, stub());
        first.classify("ACGTACGT").unwrap();
        first.close().unwrap();

        let mut second = open_classifier(&dir, StubEngine::new(vec![]));
        assert_eq!(second.classify("ACGTACGT").unwrap(), Some(gt("1a")));
        assert_eq!(second.engine().calls.get(), 0);
    }

    proptest! {
        #[test]
        fn prop_normalize_idempotent(s in "[ACGT ~-]{0,64}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once.clone());
            prop_assert!(!once.contains(|c: char| c == ' ' || c == '-' || c == '~'));
        }
    }
}
