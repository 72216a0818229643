use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchReport {
    pub n: i64,
    pub iterations: u32,
    pub threads: usize,
    pub limit: usize,
    pub results: Vec<CaseResult>,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseKind {
    Prefix,
    ShortCircuit,
    LeastK,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub name: String,
    pub kind: CaseKind,
    pub mean_micros: f64,
    pub min_micros: f64,
    /// Elements produced by the last iteration
    pub output_len: usize,
    pub verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    pub case: String,
    pub error: String,
}
