use std::collections::HashMap;

use crate::http::request::{canonical_header_key, wants_close, Request};

/// Upper bound on the request line plus headers, terminator included.
pub const MAX_HEADER_BYTES: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// More bytes are needed before a decision can be made.
    #[error("incomplete request")]
    Incomplete,
    #[error("malformed request line")]
    InvalidRequestLine,
    #[error("unsupported method")]
    InvalidMethod,
    #[error("unsupported protocol version")]
    InvalidVersion,
    #[error("request target must start with '/'")]
    InvalidTarget,
    #[error("malformed header line")]
    InvalidHeader,
    #[error("missing Host header")]
    MissingHost,
    #[error("request header block too large")]
    HeaderTooLarge,
    #[error("request header is not valid UTF-8")]
    InvalidEncoding,
}

/// Parses one request from the front of `buf`.
///
/// On success returns the request and the number of bytes it occupied.
/// Lines are examined as soon as they are complete, so a malformed request
/// line is reported before the rest of the header block arrives.
pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    let mut pos = 0;
    let mut request_line: Option<(String, String, String)> = None;
    let mut host: Option<String> = None;
    let mut headers = HashMap::new();
    let mut close = false;

    loop {
        let rest = &buf[pos..];
        let Some(eol) = find_line_end(rest) else {
            if buf.len() > MAX_HEADER_BYTES {
                return Err(ParseError::HeaderTooLarge);
            }
            return Err(ParseError::Incomplete);
        };

        let next = pos + eol + 2;
        if next > MAX_HEADER_BYTES {
            return Err(ParseError::HeaderTooLarge);
        }

        let line = std::str::from_utf8(&rest[..eol])
            .map_err(|_| ParseError::InvalidEncoding)?;
        pos = next;

        if request_line.is_none() {
            request_line = Some(parse_request_line(line)?);
            continue;
        }

        // Empty line terminates the header block
        if line.is_empty() {
            break;
        }

        let (key, value) = parse_header_line(line)?;

        if key.eq_ignore_ascii_case("Host") {
            host = Some(value.to_string());
        } else if key.eq_ignore_ascii_case("Connection") {
            if wants_close(value) {
                close = true;
            }
        } else {
            headers.insert(canonical_header_key(key), value.to_string());
        }
    }

    let (method, path, version) = request_line.ok_or(ParseError::InvalidRequestLine)?;
    let host = host.ok_or(ParseError::MissingHost)?;

    let request = Request {
        method,
        path,
        version,
        host,
        headers,
        close,
    };

    Ok((request, pos))
}

/// Splits a request line into method, target and version.
///
/// All three must be present and the request must be a `GET` for an
/// absolute path over HTTP/1.1.
pub fn parse_request_line(line: &str) -> Result<(String, String, String), ParseError> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    let [method, path, version] = parts.as_slice() else {
        return Err(ParseError::InvalidRequestLine);
    };

    if *method != "GET" {
        return Err(ParseError::InvalidMethod);
    }
    if *version != "HTTP/1.1" {
        return Err(ParseError::InvalidVersion);
    }
    if !path.starts_with('/') {
        return Err(ParseError::InvalidTarget);
    }

    Ok((method.to_string(), path.to_string(), version.to_string()))
}

/// Splits a header line on its first colon and trims both halves.
pub fn parse_header_line(line: &str) -> Result<(&str, &str), ParseError> {
    let (key, value) = line.split_once(':').ok_or(ParseError::InvalidHeader)?;

    let key = key.trim();
    if key.is_empty() {
        return Err(ParseError::InvalidHeader);
    }

    Ok((key, value.trim()))
}

fn find_line_end(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}
