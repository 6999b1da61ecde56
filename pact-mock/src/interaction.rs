use crate::{data::ResponseData, matchers::Matcher};
use serde_json::Value;
use std::{collections::BTreeMap, fmt};

/// What makes two interactions the same in one session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InteractionKey {
    pub method: String,
    pub path: String,
    pub provider_state: Option<String>,
}

impl fmt::Display for InteractionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)?;
        if let Some(state) = &self.provider_state {
            write!(f, " given \"{}\"", state)?;
        }
        Ok(())
    }
}

/// An expected request paired with the response the mock provider gives back for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    description: String,
    provider_state: Option<String>,
    request: RequestMatcher,
    response: ResponseTemplate,
}

impl Interaction {
    pub fn new<S: Into<String>>(description: S) -> Self {
        Self {
            description: description.into(),
            provider_state: None,
            request: RequestMatcher::get("/"),
            response: ResponseTemplate::new(200),
        }
    }

    /// The state the provider must be in for this interaction to make sense.
    pub fn given<S: Into<String>>(mut self, provider_state: S) -> Self {
        self.provider_state = Some(provider_state.into());
        self
    }

    pub fn with_request(mut self, request: RequestMatcher) -> Self {
        self.request = request;
        self
    }

    pub fn will_respond_with(mut self, response: ResponseTemplate) -> Self {
        self.response = response;
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn provider_state(&self) -> Option<&str> {
        self.provider_state.as_deref()
    }

    pub fn request(&self) -> &RequestMatcher {
        &self.request
    }

    pub fn response(&self) -> &ResponseTemplate {
        &self.response
    }

    pub fn key(&self) -> InteractionKey {
        InteractionKey {
            method: self.request.method.clone(),
            path: self.request.path.identity(),
            provider_state: self.provider_state.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestMatcher {
    method: String,
    path: Matcher,
    query: BTreeMap<String, Matcher>,
    headers: BTreeMap<String, Matcher>,
    body: Option<Matcher>,
}

impl RequestMatcher {
    pub fn new<S: AsRef<str>, P: Into<Matcher>>(method: S, path: P) -> Self {
        Self {
            method: method.as_ref().to_uppercase(),
            path: path.into(),
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn get<P: Into<Matcher>>(path: P) -> Self {
        Self::new("GET", path)
    }

    pub fn post<P: Into<Matcher>>(path: P) -> Self {
        Self::new("POST", path)
    }

    pub fn put<P: Into<Matcher>>(path: P) -> Self {
        Self::new("PUT", path)
    }

    pub fn delete<P: Into<Matcher>>(path: P) -> Self {
        Self::new("DELETE", path)
    }

    pub fn with_query<S: Into<String>, M: Into<Matcher>>(mut self, name: S, matcher: M) -> Self {
        self.query.insert(name.into(), matcher.into());
        self
    }

    pub fn with_header<S: Into<String>, M: Into<Matcher>>(mut self, name: S, matcher: M) -> Self {
        self.headers.insert(name.into(), matcher.into());
        self
    }

    pub fn with_body(mut self, body: Matcher) -> Self {
        self.body = Some(body);
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &Matcher {
        &self.path
    }

    pub fn query(&self) -> &BTreeMap<String, Matcher> {
        &self.query
    }

    pub fn headers(&self) -> &BTreeMap<String, Matcher> {
        &self.headers
    }

    pub fn body(&self) -> Option<&Matcher> {
        self.body.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseTemplate {
    status: u16,
    headers: BTreeMap<String, Matcher>,
    body: Option<Matcher>,
}

impl ResponseTemplate {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn with_header<S: Into<String>, M: Into<Matcher>>(mut self, name: S, matcher: M) -> Self {
        self.headers.insert(name.into(), matcher.into());
        self
    }

    pub fn with_body(mut self, body: Matcher) -> Self {
        self.body = Some(body);
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &BTreeMap<String, Matcher> {
        &self.headers
    }

    pub fn body(&self) -> Option<&Matcher> {
        self.body.as_ref()
    }

    /// Resolves every matcher to its example and produces the response to send.
    pub fn render(&self) -> ResponseData {
        let mut headers: BTreeMap<String, String> = self
            .headers
            .iter()
            .map(|(name, matcher)| (name.clone(), matcher.example_text()))
            .collect();

        let (body, content_type) = match self.body.as_ref().map(Matcher::example) {
            Some(Value::String(text)) => (text, "text/plain"),
            Some(value) => (value.to_string(), "application/json"),
            None => (String::new(), ""),
        };

        if !content_type.is_empty()
            && !headers
                .keys()
                .any(|name| name.eq_ignore_ascii_case("content-type"))
        {
            headers.insert("Content-Type".into(), content_type.into());
        }

        ResponseData {
            status_code: self.status,
            headers,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_uses_method_path_and_state() {
        let interaction = Interaction::new("a request for inventory item details")
            .given("it has inventory item details")
            .with_request(RequestMatcher::new("get", "/mm-inventory/1"));

        assert_eq!(
            interaction.key(),
            InteractionKey {
                method: "GET".into(),
                path: "/mm-inventory/1".into(),
                provider_state: Some("it has inventory item details".into()),
            }
        );
    }

    #[test]
    fn render_resolves_examples() {
        let template = ResponseTemplate::new(200)
            .with_header("Content-Type", "application/json")
            .with_body(Matcher::like(json!({ "id": 1, "stock": 10 })));

        let response = template.render();

        assert_eq!(response.status_code, 200);
        assert_eq!(response.headers.len(), 1);
        assert_eq!(
            serde_json::from_str::<Value>(&response.body).unwrap(),
            json!({ "id": 1, "stock": 10 })
        );
    }

    #[test]
    fn render_defaults_json_content_type() {
        let response = ResponseTemplate::new(201)
            .with_body(Matcher::like(json!({ "id": 3 })))
            .render();

        assert_eq!(
            response.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );

        assert!(ResponseTemplate::new(204).render().headers.is_empty());
    }
}
