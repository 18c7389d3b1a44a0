use crate::app::case::{Expectation, Shape};
use crate::app::context::Context;
use crate::app::executor::{Exchange, Outcome};
use serde_json::Value;

/// `Ok` and `Err` both carry the explanation shown in the report.
pub type Check = Result<String, String>;

pub trait Assertable<T> {
    fn assert(&self, ctx: &Context, data: &T) -> Check;
}

impl Assertable<Outcome> for Expectation {
    fn assert(&self, ctx: &Context, data: &Outcome) -> Check {
        let exchange = match data {
            Outcome::Response(exchange) => exchange,
            Outcome::Failed(err) => return Err(err.to_string()),
        };
        let status = exchange.status;
        trace!("Asserting HTTP {} against {}", status, self);

        if !self.accepts_explicitly(status) {
            return match self.auth {
                Some(gate) if gate.accepts(status) => {
                    Ok(format!("Access control enforced (HTTP {})", status))
                }
                _ => Err(format!(
                    "Expected status {}, got {}: {}",
                    self,
                    status,
                    exchange.excerpt()
                )),
            };
        }

        if self.needs_json() {
            exchange.decode().map_err(|e| e.to_string())?;
        }
        for shape in &self.shape {
            shape.assert(ctx, exchange)?;
        }
        Ok(if self.shape.is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {} with expected body shape", status)
        })
    }
}

impl Assertable<Exchange> for Shape {
    fn assert(&self, ctx: &Context, data: &Exchange) -> Check {
        let json = match self {
            Shape::Header { name } => {
                return if data.headers.contains_key(name.as_str()) {
                    Ok(format!("Header '{}' present", name))
                } else {
                    Err(format!("Missing response header '{}'", name))
                };
            }
            _ => data.decode().map_err(|e| e.to_string())?,
        };
        match self {
            Shape::Array => match json {
                Value::Array(items) => Ok(format!("Array of {} items", items.len())),
                other => Err(format!("Expected a JSON array, got {}", kind(other))),
            },
            Shape::Object => match json {
                Value::Object(_) => Ok("JSON object".to_owned()),
                other => Err(format!("Expected a JSON object, got {}", kind(other))),
            },
            Shape::Keys(keys) => {
                let object = json
                    .as_object()
                    .ok_or_else(|| format!("Expected a JSON object, got {}", kind(json)))?;
                let missing: Vec<&str> = keys
                    .iter()
                    .filter(|key| !object.contains_key(key.as_str()))
                    .map(String::as_str)
                    .collect();
                if missing.is_empty() {
                    Ok(format!("Keys present: {}", keys.join(", ")))
                } else {
                    Err(format!("Missing keys: {}", missing.join(", ")))
                }
            }
            Shape::Equals { path, value } => {
                let expected = ctx.render_value(value).map_err(|e| e.to_string())?;
                match path.find(json).first() {
                    Some(actual) if **actual == expected => {
                        Ok(format!("{} equals {}", path, expected))
                    }
                    Some(actual) => Err(format!(
                        "Expected {} to equal {}, got {}",
                        path, expected, actual
                    )),
                    None => Err(format!("Nothing found at {}", path)),
                }
            }
            Shape::Contains {
                path,
                text,
                ignore_case,
            } => {
                let actual = first_string(path.find(json).first().copied())
                    .ok_or_else(|| format!("Expected a string at {}", path))?;
                let found = if *ignore_case {
                    actual.to_lowercase().contains(&text.to_lowercase())
                } else {
                    actual.contains(text.as_str())
                };
                if found {
                    Ok(format!("{} mentions '{}'", path, text))
                } else {
                    Err(format!(
                        "Expected {} to contain '{}', got '{}'",
                        path, text, actual
                    ))
                }
            }
            Shape::Matches { path, regex } => {
                let actual = first_string(path.find(json).first().copied())
                    .ok_or_else(|| format!("Expected a string at {}", path))?;
                if regex.is_match(actual) {
                    Ok(format!("{} matches /{}/", path, regex))
                } else {
                    Err(format!("Expected {} to match /{}/, got '{}'", path, regex, actual))
                }
            }
            Shape::Includes { path, field, value } => {
                let expected = ctx.apply(value).map_err(|e| e.to_string())?;
                let target = match path {
                    Some(path) => path
                        .find(json)
                        .first()
                        .copied()
                        .ok_or_else(|| format!("Nothing found at {}", path))?,
                    None => json,
                };
                let items = target
                    .as_array()
                    .ok_or_else(|| format!("Expected a JSON array, got {}", kind(target)))?;
                let hit = items
                    .iter()
                    .filter_map(|item| item.get(field.as_str()))
                    .any(|candidate| same_text(candidate, &expected));
                if hit {
                    Ok(format!("Found item with {} = {}", field, expected))
                } else {
                    Err(format!(
                        "No item with {} = {} among {} items",
                        field,
                        expected,
                        items.len()
                    ))
                }
            }
            Shape::Header { name } => Ok(format!("Header '{}' present", name)),
        }
    }
}

fn first_string(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str)
}

fn same_text(candidate: &Value, expected: &str) -> bool {
    match candidate {
        Value::String(text) => text == expected,
        other => other.to_string() == expected,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::app::case::{AuthGate, JsonPath, StatusSet};
    use crate::app::capture::CaptureValue;
    use crate::app::context::ContextPool;
    use crate::app::error::Error;
    use http::HeaderMap;
    use regex::Regex;
    use serde_json::json;
    use std::time::Duration;

    fn response(status: u16, body: &str) -> Outcome {
        Outcome::Response(Exchange::new(
            status,
            HeaderMap::new(),
            body.to_owned(),
            Duration::from_millis(3),
        ))
    }

    fn ctx() -> Context {
        ContextPool::new().unwrap().new_context()
    }

    fn path(raw: &str) -> JsonPath {
        JsonPath::new(raw).unwrap()
    }

    #[test]
    fn test_root_says_hello() {
        let expect = Expectation::status(200).with_shape(Shape::Equals {
            path: path("$.message"),
            value: json!("Hello World"),
        });

        let check = expect.assert(&ctx(), &response(200, r#"{"message": "Hello World"}"#));

        assert!(check.is_ok(), "{:?}", check);
    }

    #[test]
    fn test_validation_error_mentions_missing_field() {
        let expect = Expectation::status(400).with_shape(Shape::Contains {
            path: path("$.error"),
            text: "client_name is required".to_owned(),
            ignore_case: false,
        });

        let check = expect.assert(
            &ctx(),
            &response(400, r#"{"error": "client_name is required"}"#),
        );

        assert!(check.is_ok(), "{:?}", check);
    }

    #[test]
    fn test_not_found_is_matched_case_insensitively() {
        let expect = Expectation::status(404).with_shape(Shape::Contains {
            path: path("$.error"),
            text: "not found".to_owned(),
            ignore_case: true,
        });

        let check = expect.assert(
            &ctx(),
            &response(404, r#"{"error": "Route /nonexistent-route Not Found"}"#),
        );

        assert!(check.is_ok(), "{:?}", check);
    }

    #[test]
    fn test_auth_required_status_is_a_pass() {
        let expect = Expectation::gated(AuthGate::Authentication);

        let check = expect.assert(&ctx(), &response(401, r#"{"error": "Unauthorized"}"#));

        assert_eq!(check, Ok("Access control enforced (HTTP 401)".to_owned()));
    }

    #[test]
    fn test_ownership_gate_accepts_forbidden() {
        let expect = Expectation::gated(AuthGate::Ownership);

        assert!(expect.assert(&ctx(), &response(403, "{}")).is_ok());
        assert!(expect.assert(&ctx(), &response(200, "[]")).is_err());
    }

    #[test]
    fn test_open_gated_endpoint_fails() {
        let expect = Expectation::gated(AuthGate::Authentication);

        let check = expect.assert(&ctx(), &response(200, r#"{"dashboard": {}}"#));

        let message = check.unwrap_err();
        assert!(message.starts_with("Expected status [401] (auth required), got 200"), "{}", message);
    }

    #[test]
    fn test_auth_gate_skips_body_shape_of_success_contract() {
        let expect = Expectation::status(200)
            .with_auth(AuthGate::Authentication)
            .with_shape(Shape::Keys(vec!["assignment_id".to_owned(), "questions".to_owned()]));

        assert!(expect.assert(&ctx(), &response(401, r#"{"error": "Unauthorized"}"#)).is_ok());
        assert!(expect.assert(&ctx(), &response(200, r#"{"error": "nope"}"#)).is_err());
        assert!(expect
            .assert(&ctx(), &response(200, r#"{"assignment_id": "a", "questions": []}"#))
            .is_ok());
    }

    #[test]
    fn test_status_outside_set_fails_with_expected_and_actual() {
        let expect = Expectation {
            status: Some(StatusSet::AnyOf(vec![200, 400])),
            ..Expectation::default()
        };

        let message = expect.assert(&ctx(), &response(500, "boom")).unwrap_err();

        assert_eq!(message, "Expected status one of [200, 400], got 500: boom");
    }

    #[test]
    fn test_undecodable_body_fails_even_with_good_status() {
        let expect = Expectation::status(200).with_shape(Shape::Array);

        let message = expect.assert(&ctx(), &response(200, "<html>")).unwrap_err();

        assert!(message.starts_with("Response is not valid JSON"), "{}", message);
        assert!(message.ends_with("<html>"), "{}", message);
    }

    #[test]
    fn test_structurally_wrong_body_fails() {
        let expect = Expectation::status(200).with_shape(Shape::Array);

        let message = expect.assert(&ctx(), &response(200, r#"{"items": []}"#)).unwrap_err();

        assert_eq!(message, "Expected a JSON array, got object");
    }

    #[test]
    fn test_missing_keys_are_listed() {
        let expect = Expectation::status(200)
            .with_shape(Shape::Keys(vec!["id".to_owned(), "timestamp".to_owned()]));

        let message = expect.assert(&ctx(), &response(200, r#"{"id": 1}"#)).unwrap_err();

        assert_eq!(message, "Missing keys: timestamp");
    }

    #[test]
    fn test_network_failure_is_explained() {
        let expect = Expectation::status(200);
        let outcome = Outcome::Failed(Error::Connection("connection refused".to_owned()));

        assert_eq!(
            expect.assert(&ctx(), &outcome),
            Err("Network error: connection refused".to_owned())
        );
    }

    #[test]
    fn test_no_rules_accepts_any_answer_but_not_network_errors() {
        let expect = Expectation::default();

        assert!(expect.assert(&ctx(), &response(500, "oops")).is_ok());
        assert!(expect
            .assert(&ctx(), &Outcome::Failed(Error::Timeout("10s".to_owned())))
            .is_err());
    }

    #[test]
    fn test_includes_uses_captured_variables() {
        let context = ContextPool::with_vars(vec![(
            "created_id".to_owned(),
            CaptureValue::scalar("b7c1"),
        )])
        .unwrap()
        .new_context();
        let expect = Expectation::status(200).with_shape(Shape::Includes {
            path: None,
            field: "id".to_owned(),
            value: "{{ created_id }}".to_owned(),
        });

        assert!(expect
            .assert(&context, &response(200, r#"[{"id": "a"}, {"id": "b7c1"}]"#))
            .is_ok());
        assert_eq!(
            expect.assert(&context, &response(200, r#"[{"id": "a"}]"#)),
            Err("No item with id = b7c1 among 1 items".to_owned())
        );
    }

    #[test]
    fn test_matches_and_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("access-control-allow-origin", "*".parse().unwrap());
        let outcome = Outcome::Response(Exchange::new(
            200,
            headers,
            r#"{"id": "550e8400-e29b-41d4-a716-446655440000"}"#.to_owned(),
            Duration::from_millis(1),
        ));
        let expect = Expectation::status(200)
            .with_shape(Shape::Header {
                name: "Access-Control-Allow-Origin".to_owned(),
            })
            .with_shape(Shape::Matches {
                path: path("$.id"),
                regex: Regex::new(r"^[0-9a-f-]{36}$").unwrap(),
            });

        assert!(expect.assert(&ctx(), &outcome).is_ok());

        let missing = Expectation::default().with_shape(Shape::Header {
            name: "Access-Control-Allow-Methods".to_owned(),
        });
        assert_eq!(
            missing.assert(&ctx(), &outcome),
            Err("Missing response header 'Access-Control-Allow-Methods'".to_owned())
        );
    }
}
