use crate::app::error::Error;
use crate::app::ledger::RunSummary;
use chrono::{DateTime, Local};
use serde_derive::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    name: &'a str,
    base_url: &'a str,
    generated_at: DateTime<Local>,
    #[serde(flatten)]
    summary: &'a RunSummary<'a>,
}

/// Writes the ledger as CSV for `.csv` paths and as JSON otherwise.
pub fn write_report(
    path: &Path,
    name: &str,
    base_url: &str,
    summary: &RunSummary<'_>,
) -> Result<(), Error> {
    let is_csv = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        write_csv(File::create(path).map_err(io_error)?, summary)
    } else {
        let report = Report {
            name,
            base_url,
            generated_at: Local::now(),
            summary,
        };
        write_json(File::create(path).map_err(io_error)?, &report)
    }
}

fn write_json<W: Write>(out: W, report: &Report<'_>) -> Result<(), Error> {
    let mut out = BufWriter::new(out);
    serde_json::to_writer_pretty(&mut out, report).map_err(|e| Error::Internal(e.to_string()))?;
    out.flush().map_err(io_error)
}

fn write_csv<W: Write>(out: W, summary: &RunSummary<'_>) -> Result<(), Error> {
    let mut writer = csv::Writer::from_writer(out);
    writer
        .write_record(&["name", "success", "status", "weight", "timestamp", "message"])
        .map_err(csv_error)?;
    for result in summary.per_result {
        writer
            .write_record(&[
                result.name.clone(),
                result.success.to_string(),
                result.status_code.to_string(),
                result.weight.to_string(),
                result.timestamp.to_rfc3339(),
                result.message.clone(),
            ])
            .map_err(csv_error)?;
    }
    writer.flush().map_err(io_error)
}

fn io_error(err: std::io::Error) -> Error {
    Error::Internal(format!("cannot write report: {}", err))
}

fn csv_error(err: csv::Error) -> Error {
    Error::Internal(format!("cannot write report: {}", err))
}
