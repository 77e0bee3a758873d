use std::collections::HashMap;

use crate::http::query::QueryParams;

/// Represents a parsed HTTP request from a client.
///
/// Built once by the parser and never modified afterwards. The method is
/// kept as sent; whether it is supported is decided at dispatch time.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// The request method, case-sensitive (e.g. "GET")
    pub method: String,
    /// The raw request target, query string included
    pub target: String,
    /// The target up to the first `?`
    pub path: String,
    /// Decoded query string parameters
    pub query: QueryParams,
    /// Protocol token, echoed back in the status line without validation
    pub version: String,
    /// Request headers as key-value pairs
    pub headers: HashMap<String, String>,
    /// POST only: whatever followed the header block in the same buffer.
    /// Content-Length is not consulted.
    pub body: Vec<u8>,
}

/// Builder for constructing Request objects.
pub struct RequestBuilder {
    method: Option<String>,
    target: Option<String>,
    version: Option<String>,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            target: None,
            version: None,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Splits the target into path and query and produces the request.
    pub fn build(self) -> Result<Request, &'static str> {
        let target = self.target.ok_or("target missing")?;
        let (path, query) = match target.split_once('?') {
            Some((path, qs)) => (path.to_string(), QueryParams::parse(qs)),
            None => (target.clone(), QueryParams::default()),
        };

        Ok(Request {
            method: self.method.ok_or("method missing")?,
            target,
            path,
            query,
            version: self.version.unwrap_or_else(|| "HTTP/1.0".to_string()),
            headers: self.headers,
            body: self.body,
        })
    }
}

impl Request {
    /// Retrieves a header value by its exact name.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }

    /// All values of a query parameter, in the order they were sent.
    pub fn query_values(&self, key: &str) -> Option<&[String]> {
        self.query.get(key)
    }
}
