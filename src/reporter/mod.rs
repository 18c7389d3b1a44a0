pub mod console;
pub mod export;

use crate::app::ledger::{RunSummary, TestResult};
use std::io;

/// Observer of a run. Called from the single execution thread, in order.
pub trait Reporter {
    fn started(&mut self, name: &str, base_url: &str, total: usize) -> io::Result<()>;
    fn recorded(&mut self, result: &TestResult) -> io::Result<()>;
    fn finished(&mut self, summary: &RunSummary<'_>) -> io::Result<()>;
}
