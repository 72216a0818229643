mod cli;
mod harness;
mod output;
mod progress;
mod types;

use clap::Parser;
use cli::Cli;
use harness::Harness;
use output::{JsonRenderer, TerminalRenderer};
use progress::BenchProgress;
use scanlimit::{PrefixScanner, ScanConfig};
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = cli.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    }

    let config = match ScanConfig::load(cli.config.as_deref()) {
        Ok(config) => apply_overrides(config, &cli),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    let scanner = match PrefixScanner::new(config) {
        Ok(scanner) => scanner,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    let harness = match Harness::new(scanner, cli.n, cli.iterations, cli.limit, cli.filter.clone()) {
        Ok(harness) => harness,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    let progress = BenchProgress::new(cli.progress);
    let report = harness.run(&progress);

    if cli.should_output_json() {
        let renderer = JsonRenderer::new();
        if let Err(e) = renderer.render(&report, cli.output.as_deref()) {
            eprintln!("Error writing JSON output: {}", e);
            std::process::exit(3);
        }
    } else {
        let use_color = !cli.no_color && std::io::stdout().is_terminal();
        let renderer = TerminalRenderer::new(use_color);
        renderer.render(&report);
    }

    let exit_code = if report.warnings.is_empty() { 0 } else { 1 };
    std::process::exit(exit_code);
}

/// Command-line values take precedence over the config file.
fn apply_overrides(mut config: ScanConfig, cli: &Cli) -> ScanConfig {
    if cli.threads > 0 {
        config = config.with_threads(cli.threads);
    }
    if cli.leaf_size > 0 {
        config = config.with_leaf_size(cli.leaf_size);
    }
    config
}
