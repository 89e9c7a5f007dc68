use triton::http::parser::{parse_http_request, ParseError, MAX_HEADER_BYTES};

#[test]
fn test_parse_simple_get_request() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, "GET");
    assert_eq!(parsed.path, "/");
    assert_eq!(parsed.version, "HTTP/1.1");
    assert_eq!(parsed.host, "example.com");
    assert!(!parsed.close);
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_multiple_headers() {
    let req = b"GET /path HTTP/1.1\r\nHost: example.com\r\nUser-Agent: test-client\r\nAccept: */*\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.host, "example.com");
    assert_eq!(parsed.headers.get("User-Agent").unwrap(), "test-client");
    assert_eq!(parsed.headers.get("Accept").unwrap(), "*/*");
    // Host and Connection are not kept in the map
    assert!(!parsed.headers.contains_key("Host"));
}

#[test]
fn test_parse_request_with_path_and_query_string() {
    let req = b"GET /search?q=rust HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.path, "/search?q=rust");
}

#[test]
fn test_parse_leaves_following_bytes() {
    let req = b"GET /a HTTP/1.1\r\nHost: x\r\n\r\nGET /b HTTP/1.1\r\n";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.path, "/a");
    assert_eq!(&req[consumed..], b"GET /b HTTP/1.1\r\n");
}

#[test]
fn test_parse_incomplete_request_missing_blank_line() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n";
    let result = parse_http_request(req);

    assert!(matches!(result, Err(ParseError::Incomplete)));
}

#[test]
fn test_parse_incomplete_partial_line() {
    assert_eq!(
        parse_http_request(b"GET / HT").unwrap_err(),
        ParseError::Incomplete
    );
}

#[test]
fn test_parse_missing_host() {
    let req = b"GET / HTTP/1.1\r\nAccept: */*\r\n\r\n";

    assert_eq!(parse_http_request(req).unwrap_err(), ParseError::MissingHost);
}

#[test]
fn test_parse_last_host_wins() {
    let req = b"GET / HTTP/1.1\r\nHost: first.com\r\nhost: second.com\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.host, "second.com");
}

#[test]
fn test_parse_repeated_header_overwrites() {
    let req = b"GET / HTTP/1.1\r\nHost: a\r\nAccept: text/html\r\naccept: text/plain\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.headers.len(), 1);
    assert_eq!(parsed.headers.get("Accept").unwrap(), "text/plain");
}

#[test]
fn test_parse_connection_close() {
    let variants: &[&[u8]] = &[
        b"GET / HTTP/1.1\r\nHost: a\r\nConnection: close\r\n\r\n",
        b"GET / HTTP/1.1\r\nHost: a\r\nconnection: Close\r\n\r\n",
        b"GET / HTTP/1.1\r\nHost: a\r\nConnection: TE, close\r\n\r\n",
    ];

    for req in variants {
        let (parsed, _) = parse_http_request(req).unwrap();
        assert!(parsed.close);
        assert!(!parsed.headers.contains_key("Connection"));
    }

    let req = b"GET / HTTP/1.1\r\nHost: a\r\nConnection: keep-alive\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();
    assert!(!parsed.close);
}

#[test]
fn test_parse_invalid_request_line_token_count() {
    for req in [
        &b"GET /\r\nHost: a\r\n\r\n"[..],
        &b"GET / HTTP/1.1 extra\r\nHost: a\r\n\r\n"[..],
        &b"\r\nHost: a\r\n\r\n"[..],
    ] {
        assert_eq!(
            parse_http_request(req).unwrap_err(),
            ParseError::InvalidRequestLine
        );
    }
}

#[test]
fn test_parse_rejects_other_methods_versions_and_targets() {
    assert_eq!(
        parse_http_request(b"POST / HTTP/1.1\r\nHost: a\r\n\r\n").unwrap_err(),
        ParseError::InvalidMethod
    );
    assert_eq!(
        parse_http_request(b"GET / HTTP/1.0\r\nHost: a\r\n\r\n").unwrap_err(),
        ParseError::InvalidVersion
    );
    assert_eq!(
        parse_http_request(b"GET index.html HTTP/1.1\r\nHost: a\r\n\r\n").unwrap_err(),
        ParseError::InvalidTarget
    );
}

#[test]
fn test_parse_malformed_header() {
    let req = b"GET / HTTP/1.1\r\nHost: a\r\nBrokenHeader\r\n\r\n";
    let result = parse_http_request(req);

    assert!(matches!(result, Err(ParseError::InvalidHeader)));
}

#[test]
fn test_parse_malformed_header_before_blank_line() {
    // Reported as soon as the line is complete
    let req = b"GET / HTTP/1.1\r\nBrokenHeader\r\n";

    assert_eq!(parse_http_request(req).unwrap_err(), ParseError::InvalidHeader);
}

#[test]
fn test_parse_header_too_large() {
    let mut req = b"GET / HTTP/1.1\r\nHost: a\r\nX-Big: ".to_vec();
    req.extend(std::iter::repeat(b'a').take(MAX_HEADER_BYTES));

    assert_eq!(parse_http_request(&req).unwrap_err(), ParseError::HeaderTooLarge);
}

#[test]
fn test_parse_invalid_utf8() {
    let req = b"GET /\xff HTTP/1.1\r\nHost: a\r\n\r\n";

    assert_eq!(parse_http_request(req).unwrap_err(), ParseError::InvalidEncoding);
}

#[test]
fn test_parse_error_messages() {
    let err: Box<dyn std::error::Error> = Box::new(ParseError::MissingHost);

    assert_eq!(err.to_string(), "missing Host header");
    assert_eq!(ParseError::InvalidRequestLine.to_string(), "malformed request line");
    assert_eq!(ParseError::Incomplete.to_string(), "incomplete request");
}
