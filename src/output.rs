use crate::types::{BenchReport, CaseKind, CaseResult, Warning};
use colored::*;
use std::io;

const BOX_TL: &str = "╭";
const BOX_TR: &str = "╮";
const BOX_BL: &str = "╰";
const BOX_BR: &str = "╯";
const BOX_H: &str = "─";
const BOX_V: &str = "│";

const WIDTH: usize = 62;

pub struct TerminalRenderer {
    use_color: bool,
}

impl TerminalRenderer {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    pub fn render(&self, report: &BenchReport) {
        println!();
        self.print_header(report);
        println!();
        self.print_results(&report.results);

        if !report.warnings.is_empty() {
            println!();
            self.print_warnings(&report.warnings);
        }
        println!();
    }

    fn print_header(&self, report: &BenchReport) {
        println!(
            "  {}{}{}",
            self.colorize(BOX_TL, "bright_black", false),
            self.colorize(&BOX_H.repeat(WIDTH), "bright_black", false),
            self.colorize(BOX_TR, "bright_black", false)
        );

        let title = format!(" Benchmark: range 0..{}", report.n);
        self.print_boxed(&title, "cyan", true);

        let info = format!(
            " Iterations: {} │ Threads: {} │ Limit: {}",
            report.iterations, report.threads, report.limit
        );
        self.print_boxed(&info, "white", false);

        println!(
            "  {}{}{}",
            self.colorize(BOX_BL, "bright_black", false),
            self.colorize(&BOX_H.repeat(WIDTH), "bright_black", false),
            self.colorize(BOX_BR, "bright_black", false)
        );
    }

    fn print_boxed(&self, text: &str, color: &str, bold: bool) {
        let display: String = text.chars().take(WIDTH).collect();
        let padding = WIDTH - display.chars().count();
        println!(
            "  {}{}{}{}",
            self.colorize(BOX_V, "bright_black", false),
            self.colorize(&display, color, bold),
            " ".repeat(padding),
            self.colorize(BOX_V, "bright_black", false)
        );
    }

    fn print_results(&self, results: &[CaseResult]) {
        println!(
            "  {:<36} {:>12} {:>12} {:>6}",
            self.colorize("CASE", "bright_black", true),
            self.colorize("MEAN", "bright_black", true),
            self.colorize("MIN", "bright_black", true),
            self.colorize("OK", "bright_black", true)
        );

        for result in results {
            let name_color = match result.kind {
                CaseKind::Prefix => "white",
                CaseKind::ShortCircuit => "magenta",
                CaseKind::LeastK => "blue",
            };
            let status = if result.verified {
                self.colorize("✓", "green", true)
            } else {
                self.colorize("✗", "red", true)
            };

            println!(
                "  {:<36} {:>12} {:>12} {:>6}",
                self.colorize(&result.name, name_color, false),
                self.colorize(&format_micros(result.mean_micros), "yellow", false),
                self.colorize(&format_micros(result.min_micros), "green", false),
                status
            );
        }
    }

    fn print_warnings(&self, warnings: &[Warning]) {
        println!(
            "  {}",
            self.colorize(&format!("Verification failures ({})", warnings.len()), "red", true)
        );
        for warning in warnings {
            println!(
                "    {} {}",
                self.colorize(&warning.case, "bright_black", false),
                self.colorize(&format!("({})", warning.error), "red", false)
            );
        }
    }

    fn colorize(&self, text: &str, color: &str, bold: bool) -> String {
        if !self.use_color {
            return text.to_string();
        }

        let colored = match color {
            "red" => text.red(),
            "green" => text.green(),
            "yellow" => text.yellow(),
            "blue" => text.blue(),
            "cyan" => text.cyan(),
            "magenta" => text.magenta(),
            "white" => text.white(),
            "bright_black" => text.bright_black(),
            _ => text.normal(),
        };

        if bold {
            colored.bold().to_string()
        } else {
            colored.to_string()
        }
    }
}

/// Formats a duration in microseconds with a unit that keeps it readable.
fn format_micros(micros: f64) -> String {
    if micros >= 1_000_000.0 {
        format!("{:.2} s", micros / 1_000_000.0)
    } else if micros >= 1_000.0 {
        format!("{:.2} ms", micros / 1_000.0)
    } else {
        format!("{:.1} µs", micros)
    }
}

pub struct JsonRenderer;

impl JsonRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, report: &BenchReport, output_file: Option<&std::path::Path>) -> io::Result<()> {
        let json = serde_json::to_string_pretty(report)?;

        if let Some(path) = output_file {
            std::fs::write(path, json)?;
        } else {
            println!("{}", json);
        }

        Ok(())
    }
}
