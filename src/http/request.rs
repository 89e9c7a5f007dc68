use std::collections::HashMap;

/// Represents a parsed HTTP request from a client.
///
/// `Host` and `Connection` are lifted out of the header list into their own
/// fields; every other header is kept in `headers` under its canonical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The HTTP method (only "GET" is accepted by the parser)
    pub method: String,
    /// The request target as sent by the client (e.g., "/index.html")
    pub path: String,
    /// HTTP version (always "HTTP/1.1" once parsed)
    pub version: String,
    /// Value of the Host header
    pub host: String,
    /// Remaining request headers, keyed by canonical name
    pub headers: HashMap<String, String>,
    /// Set when the client sent `Connection: close`
    pub close: bool,
}

/// Builder for constructing Request objects.
pub struct RequestBuilder {
    method: Option<String>,
    path: Option<String>,
    version: Option<String>,
    host: Option<String>,
    headers: HashMap<String, String>,
    close: bool,
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
            path: None,
            version: None,
            host: None,
            headers: HashMap::new(),
            close: false,
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.insert(canonical_header_key(key), value.into());
        self
    }

    pub fn close(mut self, close: bool) -> Self {
        self.close = close;
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        Ok(Request {
            method: self.method.unwrap_or_else(|| "GET".to_string()),
            path: self.path.ok_or("path missing")?,
            version: self.version.unwrap_or_else(|| "HTTP/1.1".to_string()),
            host: self.host.ok_or("host missing")?,
            headers: self.headers,
            close: self.close,
        })
    }
}

impl Request {
    /// Retrieves a header value by name, ignoring case.
    ///
    /// `Host` and `Connection` are not stored here; use [`Request::host`]
    /// and [`Request::close`] instead.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&canonical_header_key(key))
            .map(|v| v.as_str())
    }

    /// Determines whether the connection should remain open after the response.
    pub fn keep_alive(&self) -> bool {
        !self.close
    }
}

/// Returns the canonical form of a header name.
///
/// The first character and any character following a hyphen are
/// upper-cased; the rest are lower-cased.
///
/// ```
/// # use triton::http::request::canonical_header_key;
/// assert_eq!(canonical_header_key("content-type"), "Content-Type");
/// assert_eq!(canonical_header_key("X-FORWARDED-FOR"), "X-Forwarded-For");
/// ```
pub fn canonical_header_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = true;

    for c in key.chars() {
        if upper {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c.to_ascii_lowercase());
        }
        upper = c == '-';
    }

    out
}

/// Reports whether a `Connection` header value asks for the connection to
/// be closed.
pub fn wants_close(value: &str) -> bool {
    value
        .split(',')
        .any(|token| token.trim().eq_ignore_ascii_case("close"))
}
