use std::collections::HashMap;

use thiserror::Error;

use crate::http::request::{Request, RequestBuilder};

/// Terminates the header block.
pub const TERMINATOR: &[u8] = b"\r\n\r\n";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The terminator has not arrived yet.
    #[error("header block incomplete")]
    Incomplete,
    /// The request line is not exactly `METHOD TARGET PROTOCOL`.
    #[error("malformed request line: {0:?}")]
    InvalidRequest(String),
    #[error("header block is not valid UTF-8")]
    InvalidEncoding,
    /// More than the allowed number of bytes arrived without a terminator.
    #[error("header block exceeds {0} bytes")]
    HeadersTooLarge(usize),
}

/// Parses one request out of `buf`.
///
/// Returns the request and the number of bytes it consumed. Header lines
/// without a colon are dropped. A POST body is whatever already follows the
/// header block in `buf`; Content-Length is not used to delimit it.
pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    let headers_end = find_headers_end(buf).ok_or(ParseError::Incomplete)?;
    let header_bytes = &buf[..headers_end];
    let body_bytes = &buf[headers_end + TERMINATOR.len()..];

    let headers_str = std::str::from_utf8(header_bytes).map_err(|_| ParseError::InvalidEncoding)?;

    let mut lines = headers_str.split("\r\n");

    // Request line
    let request_line = lines.next().unwrap_or_default();
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    let (method, target, version) = match parts.as_slice() {
        [method, target, version] => (*method, *target, *version),
        _ => return Err(ParseError::InvalidRequest(request_line.to_string())),
    };

    // Headers
    let mut headers = HashMap::new();
    for line in lines {
        if let Some((key, value)) = line.split_once(':') {
            headers.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    let (body, consumed) = if method == "POST" {
        (body_bytes.to_vec(), buf.len())
    } else {
        (Vec::new(), headers_end + TERMINATOR.len())
    };

    let mut builder = RequestBuilder::new()
        .method(method)
        .target(target)
        .version(version)
        .body(body);
    for (key, value) in headers {
        builder = builder.header(key, value);
    }
    let request = builder
        .build()
        .map_err(|_| ParseError::InvalidRequest(request_line.to_string()))?;

    Ok((request, consumed))
}

pub fn find_headers_end(buf: &[u8]) -> Option<usize> {
    find_headers_end_from(buf, 0)
}

/// Like [`find_headers_end`], but skips the first `start` bytes. The
/// returned offset is still relative to the start of `buf`.
pub fn find_headers_end_from(buf: &[u8], start: usize) -> Option<usize> {
    let tail = buf.get(start..)?;
    tail.windows(TERMINATOR.len())
        .position(|w| w == TERMINATOR)
        .map(|pos| start + pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let req = b"GET / HTTP/1.0\r\nHost: example.com\r\n\r\n";

        let (parsed, consumed) = parse_http_request(req).unwrap();

        assert_eq!(parsed.path, "/");
        assert_eq!(parsed.headers.get("Host").unwrap(), "example.com");
        assert_eq!(consumed, req.len());
    }

    #[test]
    fn two_token_request_line_is_rejected() {
        let result = parse_http_request(b"GET /\r\n\r\n");

        assert!(matches!(result, Err(ParseError::InvalidRequest(_))));
    }

    #[test]
    fn terminator_found_from_offset() {
        let buf = b"GET / HTTP/1.0\r\nA: b\r\n\r\n";
        let end = find_headers_end(buf).unwrap();

        assert_eq!(find_headers_end_from(buf, end - 2), Some(end));
        assert_eq!(find_headers_end_from(buf, end), Some(end));
        assert_eq!(find_headers_end_from(buf, end + 1), None);
        assert_eq!(find_headers_end_from(buf, buf.len() + 10), None);
    }
}
