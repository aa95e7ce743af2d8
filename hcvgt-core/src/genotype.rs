//! HCV genotype value type
//!
//! A genotype is a major type in `1..=6` with an optional lowercase subtype
//! letter, written as e.g. `1a`, `3` or `6k`.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a genotype label cannot be understood
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenotypeParseError {
    #[error("Error parsing genotype '{0}'")]
    InvalidLabel(String),

    #[error("Invalid genotype components: major={major}, subtype={subtype:?}")]
    InvalidComponents { major: u8, subtype: Option<char> },
}

fn label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([1-6])([a-z]?)").expect("genotype pattern is valid"))
}

/// An HCV genotype, with an optional subtype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Genotype {
    major: u8,
    subtype: Option<char>,
}

impl Genotype {
    /// Build a genotype from its components, rejecting anything `parse` could not produce
    pub fn new(major: u8, subtype: Option<char>) -> Result<Self, GenotypeParseError> {
        let major_ok = (1..=6).contains(&major);
        let subtype_ok = subtype.map_or(true, |c| c.is_ascii_lowercase());
        if major_ok && subtype_ok {
            Ok(Self { major, subtype })
        } else {
            Err(GenotypeParseError::InvalidComponents { major, subtype })
        }
    }

    /// Parse the genotype at the start of `label`.
    ///
    /// Only the prefix has to match: `"1a"`, `"1a_ref"` and `"1abc"` all give
    /// `1a`. Leading whitespace is not skipped.
    pub fn parse(label: &str) -> Result<Self, GenotypeParseError> {
        let caps = label_pattern()
            .captures(label)
            .ok_or_else(|| GenotypeParseError::InvalidLabel(label.to_string()))?;

        // The pattern guarantees a single ASCII digit in 1..=6
        let major = caps[1].as_bytes()[0] - b'0';
        let subtype = caps.get(2).and_then(|m| m.as_str().chars().next());

        Ok(Self { major, subtype })
    }

    pub fn major(&self) -> u8 {
        self.major
    }

    pub fn subtype(&self) -> Option<char> {
        self.subtype
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.major)?;
        if let Some(sub) = self.subtype {
            write!(f, "{}", sub)?;
        }
        Ok(())
    }
}

impl FromStr for Genotype {
    type Err = GenotypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A genotype paired with the score of the search hit it came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchScore {
    pub genotype: Genotype,
    pub score: f64,
}

impl MatchScore {
    pub fn new(genotype: Genotype, score: f64) -> Self {
        Self { genotype, score }
    }
}
