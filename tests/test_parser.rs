use beacon::http::parser::{ParseError, find_headers_end, parse_http_request};

#[test]
fn test_parse_simple_get_request() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, "GET");
    assert_eq!(parsed.path, "/");
    assert_eq!(parsed.version, "HTTP/1.1");
    assert_eq!(parsed.headers.get("Host").unwrap(), "example.com");
    assert!(parsed.body.is_empty());
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_protocol_token_is_not_validated() {
    let req = b"GET /a.txt FOO/9.9\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.version, "FOO/9.9");
}

#[test]
fn test_parse_unknown_method_is_kept() {
    let req = b"PUT /x HTTP/1.0\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, "PUT");
}

#[test]
fn test_parse_post_body_is_what_follows_the_headers() {
    let req = b"POST /api HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\nhello";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, "POST");
    assert_eq!(parsed.body, b"hello".to_vec());
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_post_body_ignores_content_length() {
    // Only what is already buffered counts, whatever Content-Length says.
    let req = b"POST /api HTTP/1.1\r\nContent-Length: 10\r\n\r\nhel";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.body, b"hel".to_vec());
}

#[test]
fn test_parse_get_ignores_trailing_bytes() {
    let req = b"GET / HTTP/1.0\r\n\r\nleftover";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert!(parsed.body.is_empty());
    assert_eq!(consumed, req.len() - "leftover".len());
}

#[test]
fn test_parse_multiple_headers() {
    let req = b"GET /path HTTP/1.1\r\nHost: example.com\r\nUser-Agent: test-client\r\nAccept: */*\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.headers.get("Host").unwrap(), "example.com");
    assert_eq!(parsed.headers.get("User-Agent").unwrap(), "test-client");
    assert_eq!(parsed.headers.get("Accept").unwrap(), "*/*");
}

#[test]
fn test_parse_header_splits_on_first_colon() {
    let req = b"GET / HTTP/1.0\r\nReferer: http://example.com:8080/x\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(
        parsed.headers.get("Referer").unwrap(),
        "http://example.com:8080/x"
    );
}

#[test]
fn test_parse_header_without_colon_is_dropped() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\nInvalidHeader\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.headers.len(), 1);
    assert_eq!(parsed.headers.get("Host").unwrap(), "example.com");
}

#[test]
fn test_parse_request_with_path_and_query_string() {
    let req = b"GET /search?a=1&a=2&b= HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.target, "/search?a=1&a=2&b=");
    assert_eq!(parsed.path, "/search");
    assert_eq!(parsed.query.get("a").unwrap(), ["1", "2"]);
    assert_eq!(parsed.query.get("b").unwrap(), [""]);
}

#[test]
fn test_parse_incomplete_request_missing_blank_line() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n";
    let result = parse_http_request(req);

    assert!(matches!(result, Err(ParseError::Incomplete)));
}

#[test]
fn test_parse_request_line_with_two_tokens() {
    let result = parse_http_request(b"GET /\r\n\r\n");

    assert!(matches!(result, Err(ParseError::InvalidRequest(_))));
}

#[test]
fn test_parse_request_line_with_four_tokens() {
    let result = parse_http_request(b"GET / HTTP/1.0 extra\r\n\r\n");

    assert!(matches!(result, Err(ParseError::InvalidRequest(_))));
}

#[test]
fn test_parse_empty_request_line() {
    let result = parse_http_request(b"\r\n\r\n");

    assert!(matches!(result, Err(ParseError::InvalidRequest(_))));
}

#[test]
fn test_parse_non_utf8_header_block() {
    let result = parse_http_request(b"GET /\xff HTTP/1.0\r\n\r\n");

    assert_eq!(result.unwrap_err(), ParseError::InvalidEncoding);
}

#[test]
fn test_find_headers_end() {
    assert_eq!(find_headers_end(b"GET / HTTP/1.0\r\n\r\n"), Some(14));
    assert_eq!(find_headers_end(b"GET / HTTP/1.0\r\n"), None);
}
