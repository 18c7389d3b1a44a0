use crate::app::case::CaptureEntry;
use liquid::Object;
use serde_json::Value;

pub type CaptureValue = liquid::model::Value;

pub(crate) trait Capturable<T> {
    fn capture(&self, data: &T) -> Option<(String, CaptureValue)>;
}

pub trait Convert<T> {
    fn convert(&self) -> T;
}

impl Convert<CaptureValue> for Value {
    fn convert(&self) -> CaptureValue {
        match self {
            Value::Null => CaptureValue::Nil,
            Value::Number(num) => match num.as_i64() {
                Some(int) => CaptureValue::scalar(int),
                None => CaptureValue::scalar(num.as_f64().unwrap_or_default()),
            },
            Value::Bool(boolean) => CaptureValue::scalar(*boolean),
            Value::String(string) => CaptureValue::scalar(string.to_string()),
            Value::Array(array) => CaptureValue::Array(array.iter().map(Value::convert).collect()),
            Value::Object(object) => {
                let mut liq_object = Object::new();
                for (key, value) in object {
                    liq_object.insert(key.clone().into(), value.convert());
                }
                CaptureValue::Object(liq_object)
            }
        }
    }
}

impl Convert<CaptureValue> for Vec<&Value> {
    fn convert(&self) -> CaptureValue {
        match self.as_slice() {
            [] => CaptureValue::Nil,
            [single] => single.convert(),
            many => CaptureValue::Array(many.iter().map(|v| v.convert()).collect()),
        }
    }
}

/// Takes the value selected by the entry's JSON path out of a decoded body.
/// Nothing is captured when the path matches nothing.
impl Capturable<Value> for CaptureEntry {
    fn capture(&self, data: &Value) -> Option<(String, CaptureValue)> {
        let found = self.json.find(data);
        if found.is_empty() {
            warn!(
                "Capture '{}' found nothing at {}",
                self.variable,
                self.json.as_str()
            );
            return None;
        }
        let value = found.convert();
        debug!("Captured {} = {:?}", self.variable, value);
        Some((self.variable.clone(), value))
    }
}
