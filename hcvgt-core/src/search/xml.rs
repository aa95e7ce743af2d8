//! BLAST XML (`-outfmt 5`) report parsing
//!
//! Only the parts of the report needed to rank hits are modelled: the hit
//! identifier and definition line, and the raw score of each hit's first HSP.

use serde::Deserialize;

use super::{HitDescription, SearchError, SearchResult};

#[derive(Debug, Deserialize)]
struct BlastOutput {
    #[serde(rename = "BlastOutput_iterations", default)]
    iterations: Iterations,
}

#[derive(Debug, Default, Deserialize)]
struct Iterations {
    #[serde(rename = "Iteration", default)]
    items: Vec<Iteration>,
}

#[derive(Debug, Deserialize)]
struct Iteration {
    #[serde(rename = "Iteration_hits", default)]
    hits: Hits,
}

#[derive(Debug, Default, Deserialize)]
struct Hits {
    #[serde(rename = "Hit", default)]
    items: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "Hit_id")]
    id: String,
    #[serde(rename = "Hit_def", default)]
    def: String,
    #[serde(rename = "Hit_hsps", default)]
    hsps: Hsps,
}

#[derive(Debug, Default, Deserialize)]
struct Hsps {
    #[serde(rename = "Hsp", default)]
    items: Vec<Hsp>,
}

#[derive(Debug, Deserialize)]
struct Hsp {
    #[serde(rename = "Hsp_score")]
    score: f64,
}

impl Hit {
    fn into_description(self) -> Option<HitDescription> {
        let score = self.hsps.items.first()?.score;
        let title = if self.def.is_empty() {
            self.id
        } else {
            format!("{} {}", self.id, self.def)
        };
        Some(HitDescription { title, score })
    }
}

/// Parse a single-query BLAST XML report into its hit descriptions, in report order.
///
/// Hits that carry no HSP are skipped. A report without any iteration is an error.
pub fn parse_descriptions(xml: &str) -> SearchResult<Vec<HitDescription>> {
    let report: BlastOutput = quick_xml::de::from_str(xml)
        .map_err(|e| SearchError::Parse(format!("Invalid BLAST XML: {}", e)))?;

    let iteration = report
        .iterations
        .items
        .into_iter()
        .next()
        .ok_or_else(|| SearchError::Parse("No records found in BLAST report".to_string()))?;

    Ok(iteration
        .hits
        .items
        .into_iter()
        .filter_map(Hit::into_description)
        .collect())
}
