pub(crate) mod assert;
pub(crate) mod capture;
pub(crate) mod case;
pub(crate) mod context;
pub(crate) mod error;
pub(crate) mod executor;
pub(crate) mod ledger;

use crate::app::assert::Assertable;
use crate::app::capture::{Capturable, CaptureValue, Convert};
use crate::app::case::TestCase;
use crate::app::context::{Context, ContextPool};
use crate::app::error::Error;
use crate::app::executor::{Executor, Outcome, PreparedRequest};
use crate::app::ledger::{Ledger, ResponseCode, TestResult};
use crate::configuration::constants::cargo_env::USER_AGENT;
use crate::configuration::manifest::Manifest;
use crate::connection::Transport;
use crate::reporter::Reporter;
use http::header;
use reqwest::blocking::Client;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

type Captured = Vec<(String, CaptureValue)>;

/// Run-wide knobs, fixed before the first case starts.
#[derive(Debug, Clone, Builder)]
#[builder(pattern = "owned", setter(into))]
pub struct Settings {
    pub name: String,
    pub base_url: String,
    #[builder(default = "Duration::from_secs(10)")]
    pub timeout: Duration,
    #[builder(default)]
    pub headers: BTreeMap<String, String>,
    #[builder(default)]
    pub vars: BTreeMap<String, Value>,
}

pub struct App<C> {
    settings: Settings,
    cases: Vec<TestCase>,
    executor: Executor<C>,
    context: ContextPool,
}

impl App<Client> {
    pub fn new(manifest: Manifest) -> Result<Self, Error> {
        let Manifest {
            name,
            base_url,
            timeout,
            headers,
            vars,
            cases,
        } = manifest;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("cannot create HTTP client: {}", e)))?;
        let settings = SettingsBuilder::default()
            .name(name)
            .base_url(base_url)
            .timeout(timeout)
            .headers(headers)
            .vars(vars)
            .build()
            .map_err(|e| Error::Internal(e.to_string()))?;
        Self::with_client(settings, cases, client)
    }
}

impl<C> App<C>
where
    C: Transport,
{
    pub fn with_client(settings: Settings, cases: Vec<TestCase>, client: C) -> Result<Self, Error> {
        let context = ContextPool::with_vars(
            settings
                .vars
                .iter()
                .map(|(key, value)| (key.clone(), value.convert())),
        )?;
        let executor = Executor::new(client, &settings.base_url);
        Ok(App {
            settings,
            cases,
            executor,
            context,
        })
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    pub fn base_url(&self) -> &str {
        self.executor.base_url()
    }

    /// Executes every case in table order. Each case yields exactly one
    /// ledger entry, whatever happens to it.
    pub fn run(&mut self, reporter: &mut dyn Reporter) -> Ledger {
        info!("Starting '{}' against {}", self.settings.name, self.base_url());
        info!("Registered {} cases", self.cases.len());
        if let Err(e) = reporter.started(&self.settings.name, self.base_url(), self.cases.len()) {
            warn!("Reporter failed: {}", e);
        }

        let mut ledger = Ledger::with_capacity(self.cases.len());
        for index in 0..self.cases.len() {
            let (result, captured) = self.run_guarded(&self.cases[index]);
            self.context.push_vars(captured);
            if let Err(e) = reporter.recorded(&result) {
                warn!("Reporter failed: {}", e);
            }
            ledger.record(result);
        }

        let summary = ledger.summary();
        info!(
            "Finished '{}': {}/{} passed",
            self.settings.name, summary.passed, summary.total
        );
        if let Err(e) = reporter.finished(&summary) {
            warn!("Reporter failed: {}", e);
        }
        ledger
    }

    fn run_guarded(&self, case: &TestCase) -> (TestResult, Captured) {
        match panic::catch_unwind(AssertUnwindSafe(|| self.run_case(case))) {
            Ok(done) => done,
            Err(cause) => {
                let reason = cause
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| cause.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_owned());
                error!("Case '{}' panicked: {}", case.name, reason);
                (fault(case, Error::Internal(reason)), Vec::new())
            }
        }
    }

    fn run_case(&self, case: &TestCase) -> (TestResult, Captured) {
        info!("Test '{}'", case.name);
        let context = self.context.new_context();
        let prepared = match self.prepare(&context, case) {
            Ok(prepared) => prepared,
            Err(e) => {
                error!("Cannot prepare '{}': {}", case.name, e);
                return (fault(case, e), Vec::new());
            }
        };

        let outcome = self.executor.execute(&prepared);
        let (success, message) = match case.expect.assert(&context, &outcome) {
            Ok(message) => (true, message),
            Err(message) => (false, message),
        };

        let mut details = BTreeMap::new();
        details.insert("method".to_owned(), json!(prepared.method.to_string()));
        details.insert("url".to_owned(), json!(prepared.url));
        let status = match &outcome {
            Outcome::Response(exchange) => {
                details.insert(
                    "elapsedMs".to_owned(),
                    json!(exchange.elapsed.as_millis() as u64),
                );
                details.insert("response".to_owned(), json!(exchange.excerpt()));
                ResponseCode::Http(exchange.status)
            }
            Outcome::Failed(_) => ResponseCode::Error,
        };

        let captured: Captured = match &outcome {
            Outcome::Response(exchange) if success => exchange
                .json()
                .map(|body| {
                    case.capture
                        .iter()
                        .filter_map(|entry| entry.capture(body))
                        .collect()
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        if !success {
            warn!("'{}' failed: {}", case.name, message);
        }

        let result = TestResult::new(&case.name, success, message, status)
            .with_weight(case.weight)
            .with_ambiguity(case.ambiguous.clone())
            .with_details(details);
        (result, captured)
    }

    fn prepare(&self, context: &Context, case: &TestCase) -> Result<PreparedRequest, Error> {
        case.validate()?;
        let path = context.apply(&case.path)?;
        let body = match &case.body {
            Some(body) => Some(context.render_value(body)?),
            None => None,
        };

        let mut headers = BTreeMap::new();
        headers.insert(
            header::CONTENT_TYPE.as_str().to_owned(),
            "application/json".to_owned(),
        );
        headers.insert(header::USER_AGENT.as_str().to_owned(), USER_AGENT.to_owned());
        for (key, value) in self.settings.headers.iter().chain(case.headers.iter()) {
            headers.insert(key.to_lowercase(), context.apply(value)?);
        }

        Ok(PreparedRequest {
            method: case.method,
            url: self.executor.url(&path),
            body,
            headers,
            timeout: case.timeout.unwrap_or(self.settings.timeout),
        })
    }
}

/// Result for a case that never reached the wire.
fn fault(case: &TestCase, error: Error) -> TestResult {
    TestResult::new(&case.name, false, error.to_string(), ResponseCode::Error)
        .with_weight(case.weight)
        .with_ambiguity(case.ambiguous.clone())
}
