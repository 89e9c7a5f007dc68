use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::http::mime;

pub const HTTP_VERSION: &str = "HTTP/1.1";

/// HTTP status codes produced by the server.
///
/// - `Ok` (200): File served
/// - `BadRequest` (400): Malformed request, unknown host or escaping path
/// - `NotFound` (404): No such file under the document root
/// - `InternalServerError` (500): The file could not be read after routing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 Ok
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use triton::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Returns the reason phrase written on the status line.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "Ok",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

/// A complete HTTP response ready to be serialized.
///
/// Headers live in a `BTreeMap` so they are written in ascending key order.
#[derive(Debug)]
pub struct Response {
    pub version: String,
    pub status: StatusCode,
    pub headers: BTreeMap<String, String>,
    /// File the body was read from, for 200 responses
    pub file_path: Option<PathBuf>,
    pub body: Vec<u8>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::NotFound)
///     .close(req.close)
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: BTreeMap<String, String>,
    file_path: Option<PathBuf>,
    body: Vec<u8>,
}

impl ResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            file_path: None,
            body: Vec::new(),
        }
    }

    /// Adds or replaces a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Adds `Connection: close` when `close` is set.
    pub fn close(self, close: bool) -> Self {
        if close {
            self.header("Connection", "close")
        } else {
            self
        }
    }

    pub fn file_path(mut self, path: PathBuf) -> Self {
        self.file_path = Some(path);
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Builds the final Response.
    ///
    /// A `Date` header for the current time is added unless one was set.
    pub fn build(mut self) -> Response {
        self.headers
            .entry("Date".to_string())
            .or_insert_with(|| httpdate::fmt_http_date(SystemTime::now()));

        Response {
            version: HTTP_VERSION.to_string(),
            status: self.status,
            headers: self.headers,
            file_path: self.file_path,
            body: self.body,
        }
    }
}

impl Response {
    /// Creates a 200 response carrying a file's contents.
    ///
    /// `Content-Type` comes from the file extension and `Last-Modified` from
    /// `modified` when the filesystem reports it.
    pub fn ok(path: PathBuf, body: Vec<u8>, modified: Option<SystemTime>, close: bool) -> Self {
        let mut builder = ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Length", body.len().to_string())
            .header("Content-Type", mime::from_path(&path))
            .close(close);

        if let Some(modified) = modified {
            builder = builder.header("Last-Modified", httpdate::fmt_http_date(modified));
        }

        builder.file_path(path).body(body).build()
    }

    /// Reads `path` and creates a 200 response for it.
    pub async fn from_file(path: &Path, close: bool) -> std::io::Result<Self> {
        let meta = tokio::fs::metadata(path).await?;
        let body = tokio::fs::read(path).await?;
        Ok(Self::ok(path.to_path_buf(), body, meta.modified().ok(), close))
    }

    pub fn bad_request(close: bool) -> Self {
        ResponseBuilder::new(StatusCode::BadRequest)
            .close(close)
            .build()
    }

    pub fn not_found(close: bool) -> Self {
        ResponseBuilder::new(StatusCode::NotFound)
            .close(close)
            .build()
    }

    /// Creates a 500 response. The connection is always closed after it.
    pub fn internal_error() -> Self {
        ResponseBuilder::new(StatusCode::InternalServerError)
            .close(true)
            .build()
    }

    /// Reports whether this response announces that the connection closes.
    pub fn closes_connection(&self) -> bool {
        self.headers
            .get("Connection")
            .is_some_and(|v| v.eq_ignore_ascii_case("close"))
    }
}
