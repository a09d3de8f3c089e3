//! CLI argument parsing for Causeway

use crate::config::RunConfig;
use crate::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "causeway")]
#[command(version)]
#[command(
    about = "Reconstruct causal timelines from distributed log records and report anomalies",
    long_about = None
)]
pub struct Cli {
    /// Input document with raw_logs and system_config (default: input/input.json)
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Output document path (default: output/output.json)
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Load run configuration from a TOML file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the output document on a single line
    #[arg(long = "compact")]
    pub compact: bool,

    /// Do not print the run summary
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Enable debug tracing on stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Resolve the effective run configuration: file values, then flags
    pub fn run_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_toml(path)?,
            None => RunConfig::default(),
        };

        if let Some(input) = &self.input {
            config.input_path = input.clone();
        }
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        if self.compact {
            config.pretty = false;
        }
        if self.quiet {
            config.print_summary = false;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["causeway"]);
        assert!(cli.input.is_none());
        assert!(cli.output.is_none());
        assert!(!cli.compact);
        assert!(!cli.quiet);
        assert!(!cli.debug);
        assert_eq!(cli.run_config().unwrap(), RunConfig::default());
    }

    #[test]
    fn test_cli_positional_paths() {
        let cli = Cli::parse_from(["causeway", "in.json", "out/result.json"]);
        let config = cli.run_config().unwrap();
        assert_eq!(config.input_path, PathBuf::from("in.json"));
        assert_eq!(config.output_path, PathBuf::from("out/result.json"));
    }

    #[test]
    fn test_cli_compact_and_quiet() {
        let cli = Cli::parse_from(["causeway", "--compact", "-q"]);
        let config = cli.run_config().unwrap();
        assert!(!config.pretty);
        assert!(!config.print_summary);
    }

    #[test]
    fn test_cli_debug_flag() {
        let cli = Cli::parse_from(["causeway", "--debug"]);
        assert!(cli.debug);
    }

    #[test]
    fn test_cli_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "input_path = \"from_file.json\"").unwrap();
        writeln!(file, "pretty = false").unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let cli = Cli::parse_from(["causeway", "--config", path.as_str(), "override.json"]);
        let config = cli.run_config().unwrap();
        assert_eq!(config.input_path, PathBuf::from("override.json"));
        assert!(!config.pretty);
        assert_eq!(config.output_path, PathBuf::from("output/output.json"));
    }

    #[test]
    fn test_cli_missing_config_file() {
        let cli = Cli::parse_from(["causeway", "--config", "/nonexistent/causeway.toml"]);
        assert!(cli.run_config().is_err());
    }
}
