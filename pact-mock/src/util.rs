use crate::error::Error;
use hyper::{
    header::{HeaderName, HeaderValue},
    HeaderMap,
};
use std::collections::HashMap;

pub fn extract_headers(header_map: &HeaderMap) -> HashMap<String, String> {
    // it currently ignores header values with opaque characters
    header_map
        .iter()
        .map(|(k, v)| (String::from(k.as_str()), v.to_str()))
        .filter_map(|(key, value)| value.ok().map(|v| (key, String::from(v))))
        .collect::<HashMap<_, _>>()
}

pub fn put_headers<'a, I: IntoIterator<Item = (&'a String, &'a String)>>(
    header_map: &mut HeaderMap<HeaderValue>,
    headers: I,
) -> Result<(), Error> {
    for (key, value) in headers {
        let header_name = HeaderName::from_lowercase(key.to_lowercase().as_bytes())?;
        let header_value = HeaderValue::from_str(value)?;
        header_map.append(header_name, header_value);
    }

    Ok(())
}

/// Renders a JSON path segment for a field name, quoting names that aren't plain identifiers.
pub fn json_path_segment(name: &str) -> String {
    let plain = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if plain {
        format!(".{}", name)
    } else {
        format!("['{}']", name.replace('\'', "\\'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_headers_lowercases_names() {
        let mut header_map = HeaderMap::new();
        let headers = vec![(
            String::from("Content-Type"),
            String::from("application/json"),
        )];

        put_headers(&mut header_map, headers.iter().map(|(k, v)| (k, v))).unwrap();

        assert_eq!(
            extract_headers(&header_map).get("content-type").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn quotes_unusual_field_names() {
        assert_eq!(json_path_segment("productid"), ".productid");
        assert_eq!(json_path_segment("full name"), "['full name']");
    }
}
