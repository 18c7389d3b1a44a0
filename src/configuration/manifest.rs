use crate::app::case::TestCase;
use crate::configuration::constants::common::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, ENV_PREFIX};
use crate::configuration::suites::Suite;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde_derive::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub base_url: String,
    #[serde(with = "crate::configuration::deserialize::duration")]
    pub timeout: Duration,
    /// Sent with every request, on top of the session defaults.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub vars: BTreeMap<String, Value>,
    #[serde(default)]
    pub cases: Vec<TestCase>,
}

/// Where the case table comes from.
#[derive(Debug, Clone)]
pub enum Source {
    File(PathBuf),
    Suite(Suite),
}

/// Values given on the command line; they beat every other layer.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Manifest {
    pub fn load(source: &Source, overrides: &Overrides) -> Result<Self, ConfigError> {
        match source {
            Source::File(path) => Self::read(File::from(path.as_path()), overrides),
            Source::Suite(suite) => {
                let mut merged: Option<Manifest> = None;
                for text in suite.sources() {
                    let part = Self::read(File::from_str(text, FileFormat::Yaml), overrides)?;
                    merged = Some(match merged {
                        Some(manifest) => manifest.merge(part),
                        None => part,
                    });
                }
                let mut manifest = merged.ok_or_else(|| {
                    ConfigError::Message(format!("suite '{}' has no cases", suite))
                })?;
                if suite.sources().len() > 1 {
                    manifest.name = suite.to_string().to_lowercase();
                }
                Ok(manifest)
            }
        }
    }

    fn read<S>(source: S, overrides: &Overrides) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let mut raw = config::Source::collect(&source)?;
        let mut manifest: Manifest = Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("timeout", DEFAULT_TIMEOUT)?
            .add_source(source)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .set_override_option("base_url", overrides.base_url.clone())?
            .set_override_option("timeout", overrides.timeout.clone())?
            .build()?
            .try_deserialize()?;
        // Layering lowercases table keys; template names and headers keep theirs.
        if let Some(vars) = raw.remove("vars") {
            manifest.vars = vars.try_deserialize()?;
        }
        if let Some(headers) = raw.remove("headers") {
            manifest.headers = headers.try_deserialize()?;
        }
        Ok(manifest)
    }

    fn merge(mut self, other: Manifest) -> Self {
        self.headers.extend(other.headers);
        self.vars.extend(other.vars);
        self.cases.extend(other.cases);
        self
    }
}
