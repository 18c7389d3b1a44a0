use chrono::{DateTime, Local};
use serde::Serializer;
use serde_derive::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// HTTP status of a result, or the sentinel for requests that never got one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResponseCode {
    Http(u16),
    Error,
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResponseCode::Http(code) => f.pad(&code.to_string()),
            ResponseCode::Error => f.pad("ERROR"),
        }
    }
}

impl serde::Serialize for ResponseCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ResponseCode::Http(code) => serializer.serialize_u16(*code),
            ResponseCode::Error => serializer.serialize_str("ERROR"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub message: String,
    pub status_code: ResponseCode,
    pub timestamp: DateTime<Local>,
    pub details: BTreeMap<String, Value>,
    pub weight: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ambiguous: Option<String>,
}

impl TestResult {
    pub fn new(name: &str, success: bool, message: String, status_code: ResponseCode) -> Self {
        Self {
            name: name.to_owned(),
            success,
            message,
            status_code,
            timestamp: Local::now(),
            details: BTreeMap::new(),
            weight: 1,
            ambiguous: None,
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_ambiguity(mut self, note: Option<String>) -> Self {
        self.ambiguous = note;
        self
    }

    pub fn with_details(mut self, details: BTreeMap<String, Value>) -> Self {
        self.details = details;
        self
    }
}

/// Ordered, append-only record of executed cases.
#[derive(Debug, Default)]
pub struct Ledger {
    results: Vec<TestResult>,
}

impl Ledger {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            results: Vec::with_capacity(capacity),
        }
    }

    pub fn record(&mut self, result: TestResult) {
        self.results.push(result);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    pub fn summary(&self) -> RunSummary<'_> {
        RunSummary::of(&self.results)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Assessment {
    Excellent,
    Good,
    Partial,
    MajorIssues,
}

impl Assessment {
    pub fn from_rate(rate: f64) -> Self {
        if rate >= 100.0 {
            Assessment::Excellent
        } else if rate >= 80.0 {
            Assessment::Good
        } else if rate >= 50.0 {
            Assessment::Partial
        } else {
            Assessment::MajorIssues
        }
    }

    pub fn headline(self) -> &'static str {
        match self {
            Assessment::Excellent => "EXCELLENT - every endpoint behaves as expected",
            Assessment::Good => "GOOD - most endpoints behave as expected",
            Assessment::Partial => "PARTIAL - a significant share of endpoints misbehave",
            Assessment::MajorIssues => "MAJOR ISSUES - most endpoints misbehave",
        }
    }
}

impl fmt::Display for Assessment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            Assessment::Excellent => "excellent",
            Assessment::Good => "good",
            Assessment::Partial => "partial",
            Assessment::MajorIssues => "major issues",
        };
        f.write_str(label)
    }
}

/// Derived view over a ledger; never stored.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary<'a> {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub weighted_success_rate: f64,
    pub assessment: Assessment,
    #[serde(rename = "results")]
    pub per_result: &'a [TestResult],
}

impl<'a> RunSummary<'a> {
    pub fn of(results: &'a [TestResult]) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.success).count();
        let success_rate = percentage(passed as u64, total as u64);
        let weight_total: u64 = results.iter().map(|r| u64::from(r.weight)).sum();
        let weight_passed: u64 = results
            .iter()
            .filter(|r| r.success)
            .map(|r| u64::from(r.weight))
            .sum();
        Self {
            total,
            passed,
            failed: total - passed,
            success_rate,
            weighted_success_rate: percentage(weight_passed, weight_total),
            assessment: if passed == total {
                Assessment::Excellent
            } else {
                Assessment::from_rate(success_rate)
            },
            per_result: results,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &'a TestResult> {
        self.per_result.iter().filter(|r| !r.success)
    }

    pub fn ambiguous(&self) -> impl Iterator<Item = &'a TestResult> {
        self.per_result.iter().filter(|r| r.ambiguous.is_some())
    }

    /// Case names grouped by the status they received.
    pub fn by_status(&self) -> BTreeMap<ResponseCode, Vec<&'a str>> {
        let mut groups: BTreeMap<ResponseCode, Vec<&'a str>> = BTreeMap::new();
        for result in self.per_result {
            groups
                .entry(result.status_code)
                .or_default()
                .push(result.name.as_str());
        }
        groups
    }
}

/// An empty run counts as fully passed.
fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        100.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}
