//! Selects the registered interaction an incoming request corresponds to.
//!
//! Clauses are evaluated in order of specificity: method, path, query, headers, body. The first
//! candidate in registration order that satisfies every clause wins. When nothing matches, the
//! candidate that satisfied the longest run of leading clauses is reported as the closest one,
//! together with every clause it failed.

use crate::{
    data::RequestData,
    interaction::RequestMatcher,
    matchers::ValueMismatch,
    registry::RegisteredInteraction,
};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "clause", rename_all = "lowercase")]
pub enum Mismatch {
    Method { expected: String, actual: String },
    Path { expected: String, actual: String },
    Query { name: String, mismatch: ValueMismatch },
    Header { name: String, mismatch: ValueMismatch },
    Body { mismatch: ValueMismatch },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Method { expected, actual } => {
                write!(f, "method: expected {} but got {}", expected, actual)
            }
            Mismatch::Path { expected, actual } => {
                write!(f, "path: expected {} but got {}", expected, actual)
            }
            Mismatch::Query { name, mismatch } => write!(f, "query '{}': {}", name, mismatch),
            Mismatch::Header { name, mismatch } => write!(f, "header '{}': {}", name, mismatch),
            Mismatch::Body { mismatch } => write!(f, "body {}", mismatch),
        }
    }
}

/// No registered interaction accepts the request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoMatch {
    pub method: String,
    pub path: String,
    /// Description of the closest candidate, if there was any candidate at all.
    pub closest: Option<String>,
    pub mismatches: Vec<Mismatch>,
}

impl fmt::Display for NoMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No interaction matched {} {}", self.method, self.path)?;

        match &self.closest {
            Some(closest) => {
                write!(f, "; closest was \"{}\"", closest)?;
                for mismatch in &self.mismatches {
                    write!(f, "\n  - {}", mismatch)?;
                }
                Ok(())
            }
            None => write!(f, "; no interactions are active"),
        }
    }
}

/// The result of checking one candidate.
#[derive(Debug, Default)]
pub struct Evaluation {
    /// How many clauses passed before the first failing one.
    pub score: usize,
    pub mismatches: Vec<Mismatch>,
}

impl Evaluation {
    pub fn is_match(&self) -> bool {
        self.mismatches.is_empty()
    }
}

pub fn find_match<'a, I>(
    request: &RequestData,
    candidates: I,
) -> Result<&'a RegisteredInteraction, NoMatch>
where
    I: IntoIterator<Item = &'a RegisteredInteraction>,
{
    let mut closest: Option<(&'a RegisteredInteraction, Evaluation)> = None;

    for candidate in candidates {
        let evaluation = evaluate(candidate.interaction().request(), request);
        if evaluation.is_match() {
            return Ok(candidate);
        }

        let is_closer = match &closest {
            Some((_, best)) => evaluation.score > best.score,
            None => true,
        };
        if is_closer {
            closest = Some((candidate, evaluation));
        }
    }

    let (closest, mismatches) = match closest {
        Some((candidate, evaluation)) => (
            Some(candidate.interaction().description().to_string()),
            evaluation.mismatches,
        ),
        None => (None, Vec::new()),
    };

    Err(NoMatch {
        method: request.method.clone(),
        path: request.uri.clone(),
        closest,
        mismatches,
    })
}

pub fn evaluate(matcher: &RequestMatcher, request: &RequestData) -> Evaluation {
    let clauses = [
        check_method(matcher, request),
        check_path(matcher, request),
        check_query(matcher, request),
        check_headers(matcher, request),
        check_body(matcher, request),
    ];

    let score = clauses.iter().take_while(|clause| clause.is_empty()).count();

    Evaluation {
        score,
        mismatches: clauses.iter().flatten().cloned().collect(),
    }
}

fn check_method(matcher: &RequestMatcher, request: &RequestData) -> Vec<Mismatch> {
    if matcher.method().eq_ignore_ascii_case(&request.method) {
        Vec::new()
    } else {
        vec![Mismatch::Method {
            expected: matcher.method().into(),
            actual: request.method.clone(),
        }]
    }
}

fn check_path(matcher: &RequestMatcher, request: &RequestData) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    matcher
        .path()
        .check_text(request.path(), "$.path", &mut mismatches);

    mismatches
        .into_iter()
        .map(|mismatch| Mismatch::Path {
            expected: mismatch.expected,
            actual: request.path().into(),
        })
        .collect()
}

fn check_query(matcher: &RequestMatcher, request: &RequestData) -> Vec<Mismatch> {
    if matcher.query().is_empty() {
        return Vec::new();
    }

    let query = request.query();
    let mut result = Vec::new();

    for (name, expected) in matcher.query() {
        let path = format!("$.query.{}", name);
        let mut mismatches = Vec::new();

        match query.get(name) {
            Some(actual) => expected.check_text(actual, &path, &mut mismatches),
            None => mismatches.push(ValueMismatch {
                path,
                expected: expected.describe(),
                actual: None,
            }),
        }

        result.extend(mismatches.into_iter().map(|mismatch| Mismatch::Query {
            name: name.clone(),
            mismatch,
        }));
    }

    result
}

fn check_headers(matcher: &RequestMatcher, request: &RequestData) -> Vec<Mismatch> {
    let mut result = Vec::new();

    for (name, expected) in matcher.headers() {
        let path = format!("$.headers.{}", name);
        let mut mismatches = Vec::new();

        match request.header(name) {
            Some(actual) => expected.check_text(actual, &path, &mut mismatches),
            None => mismatches.push(ValueMismatch {
                path,
                expected: expected.describe(),
                actual: None,
            }),
        }

        result.extend(mismatches.into_iter().map(|mismatch| Mismatch::Header {
            name: name.clone(),
            mismatch,
        }));
    }

    result
}

fn check_body(matcher: &RequestMatcher, request: &RequestData) -> Vec<Mismatch> {
    let expected = match matcher.body() {
        Some(expected) => expected,
        None => return Vec::new(),
    };

    if request.body.trim().is_empty() {
        return vec![Mismatch::Body {
            mismatch: ValueMismatch {
                path: "$".into(),
                expected: expected.describe(),
                actual: None,
            },
        }];
    }

    let actual: Value = match serde_json::from_str(&request.body) {
        Ok(actual) => actual,
        Err(_) => Value::String(request.body.clone()),
    };

    let mut mismatches = Vec::new();
    expected.check(&actual, "$", &mut mismatches);

    mismatches
        .into_iter()
        .map(|mismatch| Mismatch::Body { mismatch })
        .collect()
}
