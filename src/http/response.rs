use std::time::SystemTime;

use bytes::{BufMut, Bytes, BytesMut};

use crate::http::producer::Producer;

/// Protocol token used when the request line could not be parsed.
pub const DEFAULT_VERSION: &str = "HTTP/1.0";

/// HTTP status codes the server emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use beacon::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::Forbidden.as_u16(), 403);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
        }
    }
}

/// A response ready to be queued on a connection: a header block and, for
/// a GET of a file, the producer that streams its body.
#[derive(Debug)]
pub struct Response {
    /// Protocol token for the status line, copied from the request
    pub version: String,
    pub status: StatusCode,
    /// Headers in emission order
    pub headers: Vec<(String, String)>,
    pub body: Option<Box<dyn Producer>>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .version("HTTP/1.1")
///     .header("Content-Type", "text/html")
///     .build();
/// ```
pub struct ResponseBuilder {
    version: String,
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Option<Box<dyn Producer>>,
}

impl ResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            status,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Appends a header. Repeated names are emitted repeatedly.
    pub fn header(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.headers.push((key.into(), value.to_string()));
        self
    }

    /// Adds the `Server` and `Date` headers every response carries.
    pub fn standard_headers(self, server_name: &str) -> Self {
        self.header("Server", server_name)
            .header("Date", httpdate::fmt_http_date(SystemTime::now()))
    }

    pub fn body(mut self, producer: impl Producer + 'static) -> Self {
        self.body = Some(Box::new(producer));
        self
    }

    pub fn build(self) -> Response {
        Response {
            version: self.version,
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    /// An error response: standard headers, `text/plain`, `Connection:
    /// close` and no body.
    pub fn error(status: StatusCode, version: &str, server_name: &str) -> Self {
        ResponseBuilder::new(status)
            .version(version)
            .standard_headers(server_name)
            .header("Content-Type", "text/plain")
            .header("Connection", "close")
            .build()
    }

    /// First value of a header, matched case-insensitively.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Serializes the status line and headers, blank line included.
    pub fn head_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(256);

        buf.put_slice(
            format!(
                "{} {} {}\r\n",
                self.version,
                self.status.as_u16(),
                self.status.reason_phrase()
            )
            .as_bytes(),
        );

        for (k, v) in &self.headers {
            buf.put_slice(k.as_bytes());
            buf.put_slice(b": ");
            buf.put_slice(v.as_bytes());
            buf.put_slice(b"\r\n");
        }

        buf.put_slice(b"\r\n");
        buf.freeze()
    }
}
