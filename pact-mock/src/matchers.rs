//! Loose matching of request and response values.
//!
//! A [`Matcher`] describes what a value is expected to look like rather than what it is exactly.
//! Matchers nest, so a body shape is a tree of field matchers that is evaluated recursively
//! against the JSON value received by the mock provider.

use crate::{error::Error, util};
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::{collections::BTreeMap, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Number,
    Integer,
    Boolean,
    Null,
    Array,
    Object,
}

impl ValueKind {
    /// The kind a JSON value belongs to. Every number is a `Number`; `Integer` only
    /// narrows the matching when requested explicitly.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ValueKind::Integer => value.is_i64() || value.is_u64(),
            kind => ValueKind::of(value) == kind,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Integer => "integer",
            ValueKind::Boolean => "boolean",
            ValueKind::Null => "null",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled regex that remembers its source. Matching is anchored at both ends.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new<S: Into<String>>(source: S) -> Result<Self, Error> {
        let source = source.into();
        let regex = Regex::new(&format!("^(?:{})$", source)).map_err(|e| Error::InvalidRegex {
            pattern: source.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self { source, regex })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
    /// The value must be equal to this one.
    Literal(Value),
    /// The value must be of the given kind; `example` is what gets rendered.
    TypeShape { kind: ValueKind, example: Value },
    /// The value, as text, must match the pattern.
    Regex { pattern: Pattern, example: String },
    /// The value must be an object whose declared fields match. Undeclared fields are ignored.
    Nested(BTreeMap<String, Matcher>),
}

/// A single failed expectation inside a value, addressed by a JSON path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueMismatch {
    pub path: String,
    pub expected: String,
    /// `None` when the value is missing altogether.
    pub actual: Option<String>,
}

impl fmt::Display for ValueMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.actual {
            Some(actual) => write!(
                f,
                "{}: expected {} but got {}",
                self.path, self.expected, actual
            ),
            None => write!(f, "{}: expected {} but it was missing", self.path, self.expected),
        }
    }
}

impl Matcher {
    pub fn literal<V: Into<Value>>(value: V) -> Self {
        Matcher::Literal(value.into())
    }

    /// Matches anything shaped like `value`: objects are matched field by field, every other
    /// value by its kind only.
    pub fn like<V: Into<Value>>(value: V) -> Self {
        match value.into() {
            Value::Object(fields) => Matcher::Nested(
                fields
                    .into_iter()
                    .map(|(name, value)| (name, Matcher::like(value)))
                    .collect(),
            ),
            value => Matcher::TypeShape {
                kind: ValueKind::of(&value),
                example: value,
            },
        }
    }

    /// Matches text against `pattern`. The example must satisfy the pattern itself.
    pub fn term<S1: Into<String>, S2: Into<String>>(
        pattern: S1,
        example: S2,
    ) -> Result<Self, Error> {
        let pattern = Pattern::new(pattern)?;
        let example = example.into();

        if !pattern.is_match(&example) {
            return Err(Error::InvalidRegex {
                pattern: pattern.as_str().into(),
                reason: format!("the example {:?} doesn't match the pattern", example),
            });
        }

        Ok(Matcher::Regex { pattern, example })
    }

    pub fn any_string<S: Into<String>>(example: S) -> Self {
        Matcher::TypeShape {
            kind: ValueKind::String,
            example: Value::String(example.into()),
        }
    }

    pub fn any_number<V: Into<Value>>(example: V) -> Self {
        Matcher::TypeShape {
            kind: ValueKind::Number,
            example: example.into(),
        }
    }

    pub fn integer(example: i64) -> Self {
        Matcher::TypeShape {
            kind: ValueKind::Integer,
            example: Value::from(example),
        }
    }

    pub fn boolean(example: bool) -> Self {
        Matcher::TypeShape {
            kind: ValueKind::Boolean,
            example: Value::Bool(example),
        }
    }

    pub fn nested<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Matcher)>,
    {
        Matcher::Nested(
            fields
                .into_iter()
                .map(|(name, matcher)| (name.into(), matcher))
                .collect(),
        )
    }

    /// The value this matcher renders to when it is used in a response.
    pub fn example(&self) -> Value {
        match self {
            Matcher::Literal(value) => value.clone(),
            Matcher::TypeShape { example, .. } => example.clone(),
            Matcher::Regex { example, .. } => Value::String(example.clone()),
            Matcher::Nested(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(name, matcher)| (name.clone(), matcher.example()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }

    /// The example rendered as text, for headers, paths and query parameters.
    pub fn example_text(&self) -> String {
        value_text(&self.example())
    }

    pub fn describe(&self) -> String {
        match self {
            Matcher::Literal(value) => value.to_string(),
            Matcher::TypeShape { kind, .. } => format!("any {}", kind),
            Matcher::Regex { pattern, .. } => format!("a value matching /{}/", pattern.as_str()),
            Matcher::Nested(_) => String::from("an object"),
        }
    }

    /// Checks `actual` against this matcher, appending every failure found under `path`.
    pub fn check(&self, actual: &Value, path: &str, mismatches: &mut Vec<ValueMismatch>) {
        match self {
            Matcher::Literal(expected) => {
                if expected != actual {
                    mismatches.push(self.mismatch(path, Some(actual)));
                }
            }
            Matcher::TypeShape { kind, .. } => {
                if !kind.accepts(actual) {
                    mismatches.push(self.mismatch(path, Some(actual)));
                }
            }
            Matcher::Regex { pattern, .. } => {
                let matched = match actual {
                    Value::String(text) => pattern.is_match(text),
                    Value::Number(_) | Value::Bool(_) => pattern.is_match(&actual.to_string()),
                    _ => false,
                };

                if !matched {
                    mismatches.push(self.mismatch(path, Some(actual)));
                }
            }
            Matcher::Nested(fields) => {
                let object = match actual.as_object() {
                    Some(object) => object,
                    None => {
                        mismatches.push(self.mismatch(path, Some(actual)));
                        return;
                    }
                };

                for (name, matcher) in fields {
                    let field_path = format!("{}{}", path, util::json_path_segment(name));
                    match object.get(name) {
                        Some(value) => matcher.check(value, &field_path, mismatches),
                        None => mismatches.push(matcher.mismatch(&field_path, None)),
                    }
                }
            }
        }
    }

    /// Checks a textual value such as a header, a path or a query parameter.
    pub fn check_text(&self, actual: &str, path: &str, mismatches: &mut Vec<ValueMismatch>) {
        let matched = match self {
            Matcher::Literal(expected) => value_text(expected).trim() == actual.trim(),
            Matcher::Regex { pattern, .. } => pattern.is_match(actual.trim()),
            Matcher::TypeShape { kind, .. } => match kind {
                ValueKind::String => true,
                ValueKind::Number => actual.trim().parse::<f64>().is_ok(),
                ValueKind::Integer => actual.trim().parse::<i64>().is_ok(),
                ValueKind::Boolean => matches!(actual.trim(), "true" | "false"),
                _ => false,
            },
            Matcher::Nested(_) => false,
        };

        if !matched {
            mismatches.push(ValueMismatch {
                path: path.into(),
                expected: self.describe(),
                actual: Some(actual.into()),
            });
        }
    }

    /// Collects Pact matching rules for this matcher under `path`. Literals carry no rule.
    pub fn matching_rules(&self, path: &str, rules: &mut BTreeMap<String, Value>) {
        match self {
            Matcher::Literal(_) => {}
            Matcher::TypeShape { .. } => {
                rules.insert(path.into(), json!({ "match": "type" }));
            }
            Matcher::Regex { pattern, .. } => {
                rules.insert(
                    path.into(),
                    json!({ "match": "regex", "regex": pattern.as_str() }),
                );
            }
            Matcher::Nested(fields) => {
                for (name, matcher) in fields {
                    let field_path = format!("{}{}", path, util::json_path_segment(name));
                    matcher.matching_rules(&field_path, rules);
                }
            }
        }
    }

    /// A short key used to tell interactions apart: the literal text, or the regex source.
    pub fn identity(&self) -> String {
        match self {
            Matcher::Regex { pattern, .. } => pattern.as_str().into(),
            matcher => matcher.example_text(),
        }
    }

    fn mismatch(&self, path: &str, actual: Option<&Value>) -> ValueMismatch {
        ValueMismatch {
            path: path.into(),
            expected: self.describe(),
            actual: actual.map(Value::to_string),
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        value => value.to_string(),
    }
}

impl From<&str> for Matcher {
    fn from(value: &str) -> Self {
        Matcher::Literal(Value::String(value.into()))
    }
}

impl From<String> for Matcher {
    fn from(value: String) -> Self {
        Matcher::Literal(Value::String(value))
    }
}

impl From<Value> for Matcher {
    fn from(value: Value) -> Self {
        Matcher::Literal(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(matcher: &Matcher, actual: Value) -> Vec<ValueMismatch> {
        let mut mismatches = Vec::new();
        matcher.check(&actual, "$", &mut mismatches);
        mismatches
    }

    #[test]
    fn like_matches_by_type_and_ignores_extra_fields() {
        let matcher = Matcher::like(json!({ "id": 1, "price": 6, "name": "soap" }));

        assert!(check(
            &matcher,
            json!({ "id": 7, "price": 6.5, "name": "bread", "stock": 3 })
        )
        .is_empty());
    }

    #[test]
    fn like_reports_wrong_types_and_missing_fields() {
        let matcher = Matcher::like(json!({ "id": 1, "cpf": "11111111111" }));

        let mismatches = check(&matcher, json!({ "id": "1" }));

        assert_eq!(mismatches.len(), 2);
        assert_eq!(mismatches[0].path, "$.cpf");
        assert_eq!(mismatches[0].actual, None);
        assert_eq!(mismatches[1].path, "$.id");
        assert_eq!(mismatches[1].expected, "any number");
    }

    #[test]
    fn nested_objects_are_checked_recursively() {
        let matcher = Matcher::like(json!({ "customer": { "address": { "id": "14" } } }));

        let mismatches = check(&matcher, json!({ "customer": { "address": { "id": 14 } } }));

        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].path, "$.customer.address.id");
    }

    #[test]
    fn literal_requires_equality() {
        let matcher = Matcher::literal(json!({ "stock": 10 }));

        assert!(check(&matcher, json!({ "stock": 10 })).is_empty());
        assert_eq!(check(&matcher, json!({ "stock": 9 })).len(), 1);
    }

    #[test]
    fn term_is_anchored() {
        let matcher = Matcher::term("[0-9]{11}", "11111111111").unwrap();

        assert!(check(&matcher, json!("22222222222")).is_empty());
        assert_eq!(check(&matcher, json!("x22222222222")).len(), 1);
        assert_eq!(check(&matcher, json!(null)).len(), 1);
    }

    #[test]
    fn term_rejects_example_outside_pattern() {
        assert!(matches!(
            Matcher::term("[0-9]+", "abc"),
            Err(Error::InvalidRegex { .. })
        ));
        assert!(matches!(
            Matcher::term("(unclosed", "x"),
            Err(Error::InvalidRegex { .. })
        ));
    }

    #[test]
    fn integer_rejects_fractions() {
        assert!(check(&Matcher::integer(1), json!(3)).is_empty());
        assert_eq!(check(&Matcher::integer(1), json!(3.5)).len(), 1);
    }

    #[test]
    fn example_renders_nested_shapes() {
        let matcher = Matcher::nested(vec![
            ("id", Matcher::integer(1)),
            ("email", Matcher::term(".+@.+", "r@r.com").unwrap()),
            ("active", Matcher::literal(true)),
        ]);

        assert_eq!(
            matcher.example(),
            json!({ "id": 1, "email": "r@r.com", "active": true })
        );
    }

    #[test]
    fn text_checks_trim_values() {
        let mut mismatches = Vec::new();
        Matcher::from("application/json").check_text(
            " application/json ",
            "$.headers.Accept",
            &mut mismatches,
        );
        Matcher::any_number(1).check_text("abc", "$.query.page", &mut mismatches);

        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].path, "$.query.page");
    }

    #[test]
    fn matching_rules_follow_body_paths() {
        let matcher = Matcher::nested(vec![
            ("id", Matcher::like(1)),
            ("cpf", Matcher::term("[0-9]{11}", "11111111111").unwrap()),
            ("kind", Matcher::from("item")),
        ]);
        let mut rules = BTreeMap::new();

        matcher.matching_rules("$.body", &mut rules);

        assert_eq!(rules.len(), 2);
        assert_eq!(rules["$.body.id"], json!({ "match": "type" }));
        assert_eq!(
            rules["$.body.cpf"],
            json!({ "match": "regex", "regex": "[0-9]{11}" })
        );
    }
}
