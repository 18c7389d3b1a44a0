use crate::app::error::Error;
use derivative::*;
use jsonpath::Selector;
use regex::Regex;
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => http::Method::GET,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Delete => http::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StatusSet {
    Exact(u16),
    AnyOf(Vec<u16>),
}

impl StatusSet {
    pub fn contains(&self, status: u16) -> bool {
        match self {
            StatusSet::Exact(code) => *code == status,
            StatusSet::AnyOf(codes) => codes.contains(&status),
        }
    }
}

impl fmt::Display for StatusSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StatusSet::Exact(code) => write!(f, "{}", code),
            StatusSet::AnyOf(codes) => {
                let codes: Vec<String> = codes.iter().map(u16::to_string).collect();
                write!(f, "one of [{}]", codes.join(", "))
            }
        }
    }
}

/// Access-control contract of an endpoint called without credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthGate {
    /// 401 proves the gate.
    Authentication,
    /// Resource ownership checks may also answer 403.
    Ownership,
}

impl AuthGate {
    pub fn codes(self) -> &'static [u16] {
        match self {
            AuthGate::Authentication => &[401],
            AuthGate::Ownership => &[401, 403],
        }
    }

    pub fn accepts(self, status: u16) -> bool {
        self.codes().contains(&status)
    }
}

#[derive(Derivative, Clone, Deserialize)]
#[derivative(Debug)]
#[serde(try_from = "String")]
pub struct JsonPath {
    raw: String,
    #[derivative(Debug = "ignore")]
    selector: Arc<Selector>,
}

impl JsonPath {
    pub fn new(raw: &str) -> Result<Self, Error> {
        let selector = Selector::new(raw)
            .map_err(|e| Error::Definition(format!("invalid JSON path '{}': {:?}", raw, e)))?;
        Ok(Self {
            raw: raw.to_owned(),
            selector: Arc::new(selector),
        })
    }

    pub fn find<'a>(&self, root: &'a Value) -> Vec<&'a Value> {
        self.selector.find(root).collect()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::convert::TryFrom<String> for JsonPath {
    type Error = Error;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        JsonPath::new(&raw)
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Named predicates over a response. Everything except [`Shape::Header`]
/// needs a JSON body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Array,
    Object,
    /// Top level object carries every key.
    Keys(Vec<String>),
    /// First match of `path` equals `value`. String values are templates.
    Equals { path: JsonPath, value: Value },
    /// First match of `path` is a string containing `text`.
    Contains {
        path: JsonPath,
        text: String,
        #[serde(default)]
        ignore_case: bool,
    },
    Matches {
        path: JsonPath,
        #[serde(with = "serde_regex")]
        regex: Regex,
    },
    /// Array at `path` (or the root) has an element whose `field` renders
    /// to `value`.
    Includes {
        #[serde(default)]
        path: Option<JsonPath>,
        field: String,
        value: String,
    },
    Header { name: String },
}

impl Shape {
    pub fn needs_json(&self) -> bool {
        !matches!(self, Shape::Header { .. })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Expectation {
    #[serde(default)]
    pub status: Option<StatusSet>,
    #[serde(default)]
    pub auth: Option<AuthGate>,
    #[serde(default)]
    pub shape: Vec<Shape>,
}

impl Expectation {
    pub fn status(code: u16) -> Self {
        Self {
            status: Some(StatusSet::Exact(code)),
            ..Self::default()
        }
    }

    pub fn gated(gate: AuthGate) -> Self {
        Self {
            auth: Some(gate),
            ..Self::default()
        }
    }

    pub fn with_auth(mut self, gate: AuthGate) -> Self {
        self.auth = Some(gate);
        self
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape.push(shape);
        self
    }

    pub fn needs_json(&self) -> bool {
        self.shape.iter().any(Shape::needs_json)
    }

    /// Status codes accepted through `status`. With neither a status set nor
    /// an auth gate any HTTP answer is accepted.
    pub fn accepts_explicitly(&self, status: u16) -> bool {
        match &self.status {
            Some(set) => set.contains(status),
            None => self.auth.is_none(),
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (&self.status, self.auth) {
            (Some(set), None) => write!(f, "{}", set),
            (Some(set), Some(gate)) => write!(f, "{} or {:?} (auth required)", set, gate.codes()),
            (None, Some(gate)) => write!(f, "{:?} (auth required)", gate.codes()),
            (None, None) => f.write_str("any HTTP status"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureEntry {
    pub variable: String,
    pub json: JsonPath,
}

fn default_weight() -> u32 {
    1
}

/// One declarative request + expectation pair.
#[derive(Debug, Clone, Deserialize, Builder)]
#[builder(pattern = "owned", setter(into))]
pub struct TestCase {
    pub name: String,
    #[serde(default)]
    #[builder(default)]
    pub method: Method,
    /// Liquid template, e.g. `/api/study-groups/{{ uuid }}/chat`.
    pub path: String,
    #[serde(default)]
    #[builder(default)]
    pub body: Option<Value>,
    #[serde(default)]
    #[builder(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    #[builder(default)]
    pub expect: Expectation,
    #[serde(default)]
    #[builder(default)]
    pub capture: Vec<CaptureEntry>,
    #[serde(
        default,
        deserialize_with = "crate::configuration::deserialize::optional_duration::deserialize"
    )]
    #[builder(default)]
    pub timeout: Option<Duration>,
    #[serde(default = "default_weight")]
    #[builder(default = "1")]
    pub weight: u32,
    /// Known disagreement about what this endpoint should answer.
    #[serde(default)]
    #[builder(default)]
    pub ambiguous: Option<String>,
}

impl TestCase {
    pub fn builder() -> TestCaseBuilder {
        TestCaseBuilder::default()
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !self.path.starts_with('/') {
            return Err(Error::Definition(format!(
                "path '{}' must start with '/'",
                self.path
            )));
        }
        match &self.body {
            Some(Value::Object(_)) | None => Ok(()),
            Some(other) => Err(Error::Definition(format!(
                "body must be a JSON object, got {}",
                other
            ))),
        }
    }
}
