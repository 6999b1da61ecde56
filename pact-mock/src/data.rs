use std::collections::{BTreeMap, HashMap};

/// A request as it was received by the mock provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestData {
    pub uri: String,
    pub method: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RequestData {
    pub fn new<S1: Into<String>, S2: Into<String>>(method: S1, uri: S2) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            headers: HashMap::new(),
            body: String::new(),
        }
    }

    pub fn with_header<S1: Into<String>, S2: Into<String>>(mut self, name: S1, value: S2) -> Self {
        self.headers.insert(name.into().to_lowercase(), value.into());
        self
    }

    pub fn with_body<S: Into<String>>(mut self, body: S) -> Self {
        self.body = body.into();
        self
    }

    /// The request path without the query string.
    pub fn path(&self) -> &str {
        match self.uri.find('?') {
            Some(index) => &self.uri[..index],
            None => &self.uri,
        }
    }

    pub fn query(&self) -> HashMap<String, String> {
        match self.uri.find('?') {
            Some(index) => url::form_urlencoded::parse(self.uri[index + 1..].as_bytes())
                .into_owned()
                .collect(),
            None => HashMap::new(),
        }
    }

    /// Looks a header up ignoring the case of its name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A response rendered by the mock provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseData {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl ResponseData {
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.keys().any(|key| key.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::RequestData;

    #[test]
    fn path_excludes_query_string() {
        let request = RequestData::new("GET", "/mm-shopping-cart/?customercpf=11111111111");

        assert_eq!(request.path(), "/mm-shopping-cart/");
        assert_eq!(
            request.query().get("customercpf").map(String::as_str),
            Some("11111111111")
        );
    }

    #[test]
    fn header_lookup_ignores_case() {
        let request = RequestData::new("GET", "/").with_header("Accept", "application/json");

        assert_eq!(request.header("ACCEPT"), Some("application/json"));
        assert_eq!(request.header("content-type"), None);
    }
}
