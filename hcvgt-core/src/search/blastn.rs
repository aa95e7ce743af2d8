//! NCBI blastn wrapper
//!
//! Runs `blastn` as a subprocess against the reference FASTA (passed with
//! `-subject`, so no database needs building) and parses the XML report.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::{Builder, NamedTempFile};

use super::{xml, BlastParams, HitDescription, SearchEngine, SearchError, SearchResult};

/// Header written on the query record; blastn does not care what it is
const QUERY_HEADER: &str = "Sequence";

/// blastn search engine
pub struct BlastnEngine {
    binary_path: PathBuf,
    subject: PathBuf,
    params: BlastParams,
    /// Directory for query and report files; the system temp dir when unset
    scratch_dir: Option<PathBuf>,
}

impl BlastnEngine {
    /// Create an engine searching against the reference FASTA at `subject`
    pub fn new<P: Into<PathBuf>>(subject: P) -> Self {
        let binary_path = which::which("blastn").unwrap_or_else(|_| PathBuf::from("blastn"));
        Self {
            binary_path,
            subject: subject.into(),
            params: BlastParams::default(),
            scratch_dir: None,
        }
    }

    /// Create engine with custom binary path
    pub fn with_binary_path<P: Into<PathBuf>, Q: Into<PathBuf>>(binary_path: P, subject: Q) -> Self {
        Self {
            binary_path: binary_path.into(),
            subject: subject.into(),
            params: BlastParams::default(),
            scratch_dir: None,
        }
    }

    /// Keep the per-search temporary files in `dir`
    pub fn with_scratch_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    pub fn subject(&self) -> &Path {
        &self.subject
    }

    pub fn params(&self) -> &BlastParams {
        &self.params
    }

    /// Version string reported by `blastn -version`, if it runs
    pub fn version(&self) -> Option<String> {
        let output = Command::new(&self.binary_path)
            .arg("-version")
            .stderr(Stdio::null())
            .output()
            .ok()?;

        if !output.status.success() {
            return None;
        }
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .map(|line| line.trim().to_string())
    }

    fn scratch_file(&self, prefix: &str, suffix: &str) -> SearchResult<NamedTempFile> {
        let mut builder = Builder::new();
        builder.prefix(prefix).suffix(suffix);
        let file = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(file)
    }

    /// Write the query sequence to a temporary FASTA file
    fn write_query_file(&self, sequence: &str) -> SearchResult<NamedTempFile> {
        let mut temp_file = self.scratch_file("hcvgt-query-", ".fasta")?;
        writeln!(temp_file, ">{}", QUERY_HEADER)?;
        writeln!(temp_file, "{}", sequence)?;
        temp_file.flush()?;
        Ok(temp_file)
    }

    /// Build the full blastn argument list for one query
    fn build_command_args(&self, query: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-query".to_string(),
            query.to_string_lossy().to_string(),
            "-out".to_string(),
            output.to_string_lossy().to_string(),
            "-subject".to_string(),
            self.subject.to_string_lossy().to_string(),
        ];
        args.extend(self.params.to_args());
        args
    }
}

impl SearchEngine for BlastnEngine {
    fn search(&self, sequence: &str) -> SearchResult<Vec<HitDescription>> {
        // Both files are removed when they go out of scope, on every return path
        let query_file = self.write_query_file(sequence)?;
        let result_file = self.scratch_file("hcvgt-report-", ".xml")?;

        let args = self.build_command_args(query_file.path(), result_file.path());
        log::debug!("Running {} {}", self.binary_path.display(), args.join(" "));

        let output = Command::new(&self.binary_path)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                SearchError::ExternalTool(format!(
                    "Failed to start {}: {}",
                    self.binary_path.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SearchError::ExternalTool(format!(
                "blastn failed with exit code {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        let report = std::fs::read_to_string(result_file.path()).map_err(|e| {
            SearchError::ExternalTool(format!("blastn produced no readable output: {}", e))
        })?;

        if report.trim().is_empty() {
            return Err(SearchError::ExternalTool("blastn produced no output".to_string()));
        }

        let descriptions = xml::parse_descriptions(&report)?;
        log::debug!("blastn reported {} hit(s)", descriptions.len());
        Ok(descriptions)
    }

    fn name(&self) -> &'static str {
        "blastn"
    }

    fn is_available(&self) -> bool {
        Command::new(&self.binary_path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}
