//! Error handling for the hcvgt CLI

use thiserror::Error;
use std::path::PathBuf;

/// User-facing errors that come with suggestions
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("External tool error: {tool} - {message}")]
    ExternalTool { tool: String, message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl CliError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    pub fn external_tool<S: Into<String>>(tool: S, message: S) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into() }
    }
}

/// Provide helpful error messages and suggestions
pub fn format_error_with_suggestions(error: &CliError) -> String {
    let mut message = error.to_string();

    match error {
        CliError::FileNotFound { path } => {
            message.push_str(&format!(
                "\n\nSuggestions:\n\
                 • Check that the file path is correct: {}\n\
                 • Point --references (or [search].references in hcvgt.toml) at the HCV reference FASTA\n\
                 • Ensure you have read permissions for the file",
                path.display()
            ));
        }

        CliError::ExternalTool { tool, .. } => {
            message.push_str(&format!(
                "\n\nSuggestions:\n\
                 • Install {} (NCBI BLAST+): https://blast.ncbi.nlm.nih.gov/doc/blast-help/downloadblastdata.html\n\
                 • Ensure {} is in your PATH, or pass --blastn /path/to/{}",
                tool, tool, tool
            ));
        }

        CliError::Config { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Check your hcvgt.toml configuration file\n\
                 • Use 'hcvgt config' to generate a sample configuration"
            );
        }

        CliError::Validation { .. } => {}
    }

    message
}

/// Print error with helpful suggestions and exit
pub fn print_error_and_exit(error: &CliError) -> ! {
    eprintln!("Error: {}", format_error_with_suggestions(error));
    std::process::exit(1);
}
