use clap::{Parser, Subcommand};
use std::path::PathBuf;
use anyhow::{Context, Result};

mod config;
mod commands;
mod error;

use config::Config;
use error::CliError;

#[derive(Parser)]
#[command(name = "hcvgt")]
#[command(about = "hcvgt - Determine the genotype of HCV sequences using BLAST")]
#[command(version)]
#[command(long_about = "
hcvgt compares HCV nucleotide sequences against a labelled reference panel with
blastn and reports the genotype of the best-scoring reference. Results are cached
on disk, keyed by the sequence, so repeated queries skip the search.

Examples:
  hcvgt classify ACGTTGCA...
  hcvgt classify --fasta amplicons.fasta --consensus
  hcvgt verify --references hcv-refs.fasta
  hcvgt config > hcvgt.toml
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Reference panel FASTA (overrides the configuration file)
    #[arg(long, global = true)]
    pub references: Option<PathBuf>,

    /// Genotype cache file (overrides the configuration file)
    #[arg(long, global = true)]
    pub cache: Option<PathBuf>,

    /// blastn executable (overrides the configuration file)
    #[arg(long, global = true)]
    pub blastn: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Genotype one or more sequences
    Classify {
        /// Nucleotide sequences; spaces, '-' and '~' are ignored
        sequences: Vec<String>,

        /// Read query sequences from a FASTA file
        #[arg(short, long)]
        fasta: Option<PathBuf>,

        /// Report a single genotype only if all sequences agree
        #[arg(long)]
        consensus: bool,
    },

    /// Check that every reference sequence is genotyped as its own label
    Verify,

    /// Print an example configuration file
    Config {
        /// Write the configuration in effect to this file instead
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn setup_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    if let Some(path) = &cli.config {
        if !path.exists() {
            return Err(CliError::config(format!(
                "configuration file {} does not exist",
                path.display()
            ))
            .into());
        }
    }

    let config = Config::load(cli.config.as_deref())?
        .with_overrides(cli.blastn, cli.references, cli.cache);

    match cli.command {
        Commands::Classify { sequences, fasta, consensus } => {
            commands::classify::execute(&config, sequences, fasta, consensus)?;
        }

        Commands::Verify => {
            commands::verify::execute(&config)?;
        }

        Commands::Config { output } => match output {
            Some(path) => {
                config
                    .save_to_file(&path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                log::info!("Wrote configuration to {}", path.display());
            }
            None => print!("{}", Config::example_toml()?),
        },
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    if let Err(err) = run(cli) {
        match err.downcast_ref::<CliError>() {
            Some(cli_err) => error::print_error_and_exit(cli_err),
            None => {
                eprintln!("Error: {:#}", err);
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_classify() {
        let cli = Cli::try_parse_from([
            "hcvgt", "classify", "ACGT", "GG-CC", "--consensus", "--references", "refs.fa",
        ])
        .unwrap();

        assert_eq!(cli.references, Some(PathBuf::from("refs.fa")));
        match cli.command {
            Commands::Classify { sequences, fasta, consensus } => {
                assert_eq!(sequences, vec!["ACGT", "GG-CC"]);
                assert!(fasta.is_none());
                assert!(consensus);
            }
            _ => panic!("Expected classify command"),
        }
    }

    #[test]
    fn test_parse_verbosity() {
        let cli = Cli::try_parse_from(["hcvgt", "-vv", "verify"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Verify));
    }

    #[test]
    fn test_missing_config_file_is_config_error() {
        let cli = Cli::try_parse_from(["hcvgt", "--config", "/nonexistent/hcvgt.toml", "verify"]).unwrap();
        let err = run(cli).unwrap_err();
        assert!(matches!(err.downcast_ref::<CliError>(), Some(CliError::Config { .. })));
    }
}
