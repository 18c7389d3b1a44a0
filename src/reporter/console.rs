use crate::app::ledger::{RunSummary, TestResult};
use crate::reporter::Reporter;
use std::io::{self, Write};

const RULE_WIDTH: usize = 70;

pub struct ConsoleReporter<W> {
    out: W,
}

impl ConsoleReporter<io::Stdout> {
    /// Locks stdout per write, so log lines from other threads are never
    /// held up for a whole run.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn rule(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", "=".repeat(RULE_WIDTH))
    }

    fn heading(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.out)?;
        self.rule()?;
        writeln!(self.out, "{}", title)?;
        self.rule()
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn started(&mut self, name: &str, base_url: &str, total: usize) -> io::Result<()> {
        writeln!(self.out, "Starting '{}' ({} cases)", name, total)?;
        writeln!(self.out, "Testing against: {}", base_url)?;
        self.rule()
    }

    fn recorded(&mut self, result: &TestResult) -> io::Result<()> {
        let status = if result.success { "PASS" } else { "FAIL" };
        writeln!(
            self.out,
            "[{}] {:>5} {} - {}",
            status, result.status_code, result.name, result.message
        )?;
        self.out.flush()
    }

    fn finished(&mut self, summary: &RunSummary<'_>) -> io::Result<()> {
        self.heading("TEST SUMMARY")?;
        writeln!(self.out, "Total:         {}", summary.total)?;
        writeln!(self.out, "Passed:        {}", summary.passed)?;
        writeln!(self.out, "Failed:        {}", summary.failed)?;
        writeln!(self.out, "Success rate:  {:.1}%", summary.success_rate)?;
        writeln!(self.out, "Weighted rate: {:.1}%", summary.weighted_success_rate)?;
        writeln!(self.out, "Assessment:    {}", summary.assessment.headline())?;

        self.heading("STATUS BREAKDOWN")?;
        for (status, names) in summary.by_status() {
            writeln!(self.out, "{} ({} cases)", status, names.len())?;
            for name in names {
                writeln!(self.out, "  - {}", name)?;
            }
        }

        let ambiguous: Vec<&TestResult> = summary.ambiguous().collect();
        if !ambiguous.is_empty() {
            self.heading("AMBIGUOUS EXPECTATIONS")?;
            for result in ambiguous {
                writeln!(
                    self.out,
                    "  - {} (got {}): {}",
                    result.name,
                    result.status_code,
                    result.ambiguous.as_deref().unwrap_or_default()
                )?;
            }
        }

        let failures: Vec<&TestResult> = summary.failures().collect();
        if !failures.is_empty() {
            self.heading("FAILURES")?;
            for result in failures {
                writeln!(
                    self.out,
                    "  - {} [{}]: {}",
                    result.name, result.status_code, result.message
                )?;
            }
        }
        self.out.flush()
    }
}
