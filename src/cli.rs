use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "scanlimit")]
#[command(about = "Benchmark prefix scans and least-k selection", long_about = None)]
pub struct Cli {
    /// Size of the input range 0..N
    #[arg(long, short, default_value = "100000")]
    pub n: i64,

    /// Timed iterations per case
    #[arg(long, default_value = "10")]
    pub iterations: u32,

    /// Worker threads (0 = value from config, then rayon default)
    #[arg(long, default_value = "0")]
    pub threads: usize,

    /// Fixed leaf size in elements (0 = value from config)
    #[arg(long, value_name = "N", default_value = "0")]
    pub leaf_size: usize,

    /// How many least elements to select in the least-k cases
    #[arg(long, default_value = "100")]
    pub limit: i64,

    /// Only run cases whose name contains this text
    #[arg(long, value_name = "TEXT")]
    pub filter: Option<String>,

    /// Config file (default: ~/.config/scanlimit/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Output JSON to stdout
    #[arg(long)]
    pub json: bool,

    /// Write JSON output to file
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Show progress indicator while running
    #[arg(long)]
    pub progress: bool,
}

impl Cli {
    pub fn validate(&self) -> Result<(), String> {
        if self.n < 0 {
            return Err(format!("Invalid --n: {}. Must be non-negative", self.n));
        }
        if self.iterations == 0 {
            return Err("Invalid --iterations: must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn should_output_json(&self) -> bool {
        self.json || self.output.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["scanlimit"]);
        assert_eq!(cli.n, 100_000);
        assert_eq!(cli.iterations, 10);
        assert!(cli.validate().is_ok());
        assert!(!cli.should_output_json());
    }

    #[test]
    fn test_cli_rejects_zero_iterations() {
        let cli = Cli::parse_from(["scanlimit", "--iterations", "0"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_cli_output_implies_json() {
        let cli = Cli::parse_from(["scanlimit", "--output", "report.json", "-n", "10"]);
        assert!(cli.should_output_json());
        assert_eq!(cli.n, 10);
    }
}
