use crate::progress::BenchProgress;
use crate::types::{BenchReport, CaseKind, CaseResult, Warning};
use rayon::prelude::*;
use scanlimit::{
    collect_iter, collect_par, LeastK, Natural, PrefixScanner, RangeSource, Result, SplitSource,
};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// A value no prefix sum of `0..n` can take.
const MISSING: i64 = -1;

#[derive(Debug, Clone, Copy)]
struct Case {
    name: &'static str,
    kind: CaseKind,
    parallel: bool,
    ordered: bool,
}

const fn case(name: &'static str, kind: CaseKind, parallel: bool, ordered: bool) -> Case {
    Case {
        name,
        kind,
        parallel,
        ordered,
    }
}

const CASES: [Case; 10] = [
    case("parallel_ordered", CaseKind::Prefix, true, true),
    case("parallel_ordered_short_circuit", CaseKind::ShortCircuit, true, true),
    case("parallel_unordered", CaseKind::Prefix, true, false),
    case("parallel_unordered_short_circuit", CaseKind::ShortCircuit, true, false),
    case("sequential_ordered", CaseKind::Prefix, false, true),
    case("sequential_ordered_short_circuit", CaseKind::ShortCircuit, false, true),
    case("sequential_unordered", CaseKind::Prefix, false, false),
    case("sequential_unordered_short_circuit", CaseKind::ShortCircuit, false, false),
    case("least_k_parallel", CaseKind::LeastK, true, true),
    case("least_k_sequential", CaseKind::LeastK, false, true),
];

enum Output {
    Values(Vec<i64>),
    Matched(bool),
}

fn sum(a: &i64, b: &i64) -> i64 {
    a.wrapping_add(*b)
}

/// Runs prefix-scan and least-k cases over the range `0..n`.
pub struct Harness {
    parallel: PrefixScanner,
    sequential: PrefixScanner,
    least: LeastK<i64, Natural>,
    n: i64,
    iterations: u32,
    filter: Option<String>,
    reference: Vec<i64>,
}

impl Harness {
    pub fn new(
        parallel: PrefixScanner,
        n: i64,
        iterations: u32,
        limit: i64,
        filter: Option<String>,
    ) -> Result<Self> {
        let least = LeastK::try_new(limit, Natural)?;
        let sequential = PrefixScanner::sequential();
        let reference = sequential.scan(RangeSource::new(0..n), sum);

        Ok(Self {
            parallel,
            sequential,
            least,
            n,
            iterations: iterations.max(1),
            filter,
            reference,
        })
    }

    pub fn run(&self, progress: &BenchProgress) -> BenchReport {
        let mut results = Vec::new();
        let mut warnings = Vec::new();

        for case in CASES.iter().filter(|c| self.selected(c)) {
            let (result, output) = self.run_case(case, progress);
            if let Some(error) = self.verify(case, &output) {
                warn!(case = case.name, %error, "verification failed");
                warnings.push(Warning {
                    case: case.name.to_string(),
                    error,
                });
            }
            results.push(result);
        }

        progress.finish();

        BenchReport {
            n: self.n,
            iterations: self.iterations,
            threads: self.parallel.threads(),
            limit: self.least.capacity(),
            results: mark_verified(results, &warnings),
            warnings,
        }
    }

    fn selected(&self, case: &Case) -> bool {
        match &self.filter {
            Some(filter) => case.name.contains(filter.as_str()),
            None => true,
        }
    }

    fn run_case(&self, case: &Case, progress: &BenchProgress) -> (CaseResult, Output) {
        let mut total = Duration::ZERO;
        let mut min = Duration::MAX;
        let mut last = None;

        for iteration in 1..=self.iterations {
            progress.update(case.name, iteration, self.iterations);
            let start = Instant::now();
            let output = self.execute(case);
            let elapsed = start.elapsed();
            total += elapsed;
            min = min.min(elapsed);
            last = Some(output);
        }

        let output = last.unwrap_or(Output::Matched(false));
        let output_len = match &output {
            Output::Values(values) => values.len(),
            Output::Matched(found) => usize::from(*found),
        };
        let mean_micros = total.as_secs_f64() * 1e6 / f64::from(self.iterations);

        info!(case = case.name, mean_micros, "case finished");

        let result = CaseResult {
            name: case.name.to_string(),
            kind: case.kind,
            mean_micros,
            min_micros: min.as_secs_f64() * 1e6,
            output_len,
            verified: true,
        };
        (result, output)
    }

    fn execute(&self, case: &Case) -> Output {
        let scanner = if case.parallel {
            &self.parallel
        } else {
            &self.sequential
        };
        let source = RangeSource::new(0..self.n);

        match (case.kind, case.ordered) {
            (CaseKind::Prefix, true) => Output::Values(scanner.scan(source, sum)),
            (CaseKind::Prefix, false) => Output::Values(scanner.scan(source.unordered(), sum)),
            (CaseKind::ShortCircuit, true) => {
                Output::Matched(scanner.any_match(source, sum, |&x| x == MISSING))
            }
            (CaseKind::ShortCircuit, false) => {
                Output::Matched(scanner.any_match(source.unordered(), sum, |&x| x == MISSING))
            }
            // Descending input, so every element evicts the current worst
            (CaseKind::LeastK, _) if case.parallel => Output::Values(self.parallel.install(|| {
                let descending = (0..self.n).into_par_iter().map(|x| self.n - 1 - x);
                collect_par(&self.least, descending)
            })),
            (CaseKind::LeastK, _) => Output::Values(collect_iter(&self.least, (0..self.n).rev())),
        }
    }

    fn verify(&self, case: &Case, output: &Output) -> Option<String> {
        match (case.kind, output) {
            (CaseKind::ShortCircuit, Output::Matched(true)) => {
                Some(format!("found {} in prefix sums of 0..{}", MISSING, self.n))
            }
            (CaseKind::ShortCircuit, _) => None,
            (CaseKind::Prefix, Output::Values(values)) => {
                if values.len() != self.reference.len() {
                    Some(format!(
                        "expected {} values, got {}",
                        self.reference.len(),
                        values.len()
                    ))
                } else if case.ordered && *values != self.reference {
                    Some("ordered prefix differs from sequential reference".to_string())
                } else {
                    None
                }
            }
            (CaseKind::LeastK, Output::Values(values)) => {
                let expected: Vec<i64> = (0..self.n.min(self.least.capacity() as i64)).collect();
                if *values != expected {
                    Some(format!("expected {:?}..., got {:?}...", first(&expected), first(values)))
                } else {
                    None
                }
            }
            _ => Some("unexpected output shape".to_string()),
        }
    }
}

fn first(values: &[i64]) -> &[i64] {
    &values[..values.len().min(5)]
}

fn mark_verified(mut results: Vec<CaseResult>, warnings: &[Warning]) -> Vec<CaseResult> {
    for result in &mut results {
        result.verified = !warnings.iter().any(|w| w.case == result.name);
    }
    results
}
