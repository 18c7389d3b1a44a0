use crate::app::capture::CaptureValue;
use crate::app::error::Error;
use derivative::*;
use liquid::Object;
use liquid::Parser;
use serde_json::Value;
use std::sync::Arc;

const UUID_KEY: &str = "uuid";
const SHORT_ID_KEY: &str = "short_id";
const RUN_ID_KEY: &str = "run_id";

/// Variables shared by every case of a run. Captures land here.
#[derive(Derivative)]
#[derivative(Debug)]
pub(crate) struct ContextPool {
    globals: Object,
    #[derivative(Debug = "ignore")]
    parser: Arc<Parser>,
    run_id: uuid::Uuid,
}

/// Render scope of a single case.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Context {
    #[derivative(Debug = "ignore")]
    parser: Arc<Parser>,
    variables: Object,
}

impl ContextPool {
    pub fn new() -> Result<Self, Error> {
        Self::with_vars(Vec::new())
    }

    pub fn with_vars<T>(iter: T) -> Result<Self, Error>
    where
        T: IntoIterator<Item = (String, CaptureValue)>,
    {
        let parser = liquid::ParserBuilder::with_stdlib()
            .build()
            .map_err(|e| Error::Template(e.to_string()))?;
        let mut pool = Self {
            globals: Object::new(),
            parser: Arc::new(parser),
            run_id: uuid::Uuid::new_v4(),
        };
        pool.push_vars(iter);
        Ok(pool)
    }

    pub fn push_vars<T>(&mut self, iter: T)
    where
        T: IntoIterator<Item = (String, CaptureValue)>,
    {
        self.globals
            .extend(iter.into_iter().map(|(key, value)| (key.into(), value)));
    }

    /// Fresh scope with its own disposable `uuid` and `short_id`.
    pub fn new_context(&self) -> Context {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let mut variables = self.globals.clone();
        variables.insert(SHORT_ID_KEY.into(), CaptureValue::scalar(id[..8].to_owned()));
        variables.insert(
            UUID_KEY.into(),
            CaptureValue::scalar(uuid::Uuid::new_v4().to_string()),
        );
        variables.insert(
            RUN_ID_KEY.into(),
            CaptureValue::scalar(self.run_id.to_string()),
        );
        Context {
            parser: self.parser.clone(),
            variables,
        }
    }
}

impl Context {
    pub fn apply(&self, template: &str) -> Result<String, Error> {
        if !template.contains("{{") && !template.contains("{%") {
            return Ok(template.to_owned());
        }
        let template = self
            .parser
            .parse(template)
            .map_err(|e| Error::Template(e.to_string()))?;
        template
            .render(&self.variables)
            .map_err(|e| Error::Template(e.to_string()))
    }

    /// Renders every string leaf of `value`, keys included.
    pub fn render_value(&self, value: &Value) -> Result<Value, Error> {
        Ok(match value {
            Value::String(text) => Value::String(self.apply(text)?),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.render_value(item))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(object) => {
                let mut rendered = serde_json::Map::with_capacity(object.len());
                for (key, item) in object {
                    rendered.insert(self.apply(key)?, self.render_value(item)?);
                }
                Value::Object(rendered)
            }
            other => other.clone(),
        })
    }
}
