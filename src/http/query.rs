//! Query string decoding.

use std::collections::HashMap;

/// Decoded query string: each name maps to every value it was given, in
/// arrival order. Blank values are kept, so `a=1&a=2&b=` decodes to
/// `{a: ["1", "2"], b: [""]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: HashMap<String, Vec<String>>,
}

impl QueryParams {
    /// Decodes an `application/x-www-form-urlencoded` query string
    /// (percent escapes and `+` for space).
    pub fn parse(query: &str) -> Self {
        let mut params: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
        Self { params }
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.params.get(key).map(|v| v.as_slice())
    }

    /// First value of a parameter, if any.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.first()).map(|v| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn as_map(&self) -> &HashMap<String, Vec<String>> {
        &self.params
    }
}
