use crate::configuration::constants::cargo_env::CARGO_PKG_NAME;
use crate::configuration::manifest::{Overrides, Source};
use crate::configuration::suites::Suite;
use clap::arg_enum;
use log::LevelFilter;
use std::path::PathBuf;
use structopt::StructOpt;

arg_enum! {
    #[derive(Debug, Clone, Copy)]
    pub enum LogLevel {
        Off, Error, Warn, Info, Debug, Trace,
    }
}

#[derive(StructOpt, Debug)]
#[structopt(name = CARGO_PKG_NAME, about = "Runs a table of HTTP/JSON test cases against a web service")]
pub struct Opt {
    /// Manifest with the case table. Supported: YAML, JSON, TOML. Runs a built-in suite when omitted
    #[structopt(parse(from_os_str))]
    pub file: Option<PathBuf>,

    /// Built-in suite to run when no manifest is given
    #[structopt(long, short = "s", case_insensitive = true, possible_values = &Suite::variants(), default_value = "All")]
    pub suite: Suite,

    /// Target base URL, beats the manifest and VOLLEY_BASE_URL
    #[structopt(long, short = "u")]
    pub base_url: Option<String>,

    /// Request timeout such as 10s or 500ms, beats the manifest and VOLLEY_TIMEOUT
    #[structopt(long, short = "t")]
    pub timeout: Option<String>,

    /// Write the ledger to a .json or .csv file
    #[structopt(long, short = "r", parse(from_os_str))]
    pub report: Option<PathBuf>,

    /// Sets a logging level
    #[structopt(case_insensitive = true, long, short = "L", possible_values = &LogLevel::variants(), env = "LOG_LEVEL")]
    pub logging: Option<LogLevel>,

    /// File to which application will write logs
    #[structopt(long, short = "O", env = "LOG_OUTPUT_FILE")]
    pub log_output_file: Option<PathBuf>,
}

impl Opt {
    pub fn source(&self) -> Source {
        match &self.file {
            Some(path) => Source::File(path.clone()),
            None => Source::Suite(self.suite),
        }
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            base_url: self.base_url.clone(),
            timeout: self.timeout.clone(),
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}
