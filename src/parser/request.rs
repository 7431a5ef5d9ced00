//! HTTP request parsing and representation.

use std::collections::HashMap;
use std::str::FromStr;

use crate::parser::error::Error;
use crate::parser::method::Method;
use crate::parser::version::HttpVersion;

/// A parsed HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request path, without the query string
    pub path: String,
    /// The HTTP version
    pub version: HttpVersion,
    /// The HTTP headers, keyed by lowercase name
    pub headers: HashMap<String, String>,
    /// The request body
    pub body: Vec<u8>,
    /// Query parameters parsed from the request target
    pub query_params: HashMap<String, String>,
}

impl HttpRequest {
    /// Create a request from a raw request target such as `/ping?verbose`.
    ///
    /// The query string is split off the target into `query_params`, header
    /// names are lowercased and the body starts out empty.
    pub fn new(method: Method, target: &str, version: HttpVersion, headers: HashMap<String, String>) -> Self {
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();

        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };

        let query_params = query
            .map(|query| query
                .split('&')
                .filter(|s| !s.is_empty())
                .map(|pair| match pair.split_once('=') {
                    Some((k, v)) => (k.to_string(), v.to_string()),
                    None => (pair.to_string(), String::new()),
                })
                .collect())
            .unwrap_or_default();

        Self {
            method,
            path: path.to_string(),
            version,
            headers,
            body: Vec::new(),
            query_params,
        }
    }

    /// Replace the body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Case-insensitive header lookup.
    pub fn get_header(&self, name: &str) -> Option<&String> {
        self.headers.get(&name.to_ascii_lowercase())
    }

    /// Check if a header exists.
    pub fn has_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    /// The announced body length; zero when `Content-Length` is absent.
    pub fn content_length(&self) -> Result<usize, Error> {
        match self.get_header("Content-Length") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| Error::InvalidContentLength(value.clone())),
            None => Ok(0),
        }
    }

    /// Get a query parameter value.
    pub fn get_query_param(&self, name: &str) -> Option<&String> {
        self.query_params.get(name)
    }
}

/// Locate the end of the request head.
///
/// Returns the offset just past the blank line that terminates the headers,
/// or `None` when the buffer does not hold a complete head yet. Bare `\n`
/// line endings are tolerated.
pub fn find_head_end(buf: &[u8]) -> Option<usize> {
    let crlf = buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4);
    let lf = buf.windows(2).position(|w| w == b"\n\n").map(|i| i + 2);
    match (crlf, lf) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Parse a request head (request line plus headers).
///
/// Any bytes after the terminating blank line are ignored; the caller reads
/// the body separately using [`HttpRequest::content_length`].
pub fn parse_request(input: &[u8]) -> Result<HttpRequest, Error> {
    let head = match find_head_end(input) {
        Some(end) => &input[..end],
        None => input,
    };
    let head = std::str::from_utf8(head).map_err(|_| Error::InvalidEncoding)?;

    let mut lines = head.lines();

    let request_line = match lines.next() {
        Some(line) if !line.trim().is_empty() => line,
        _ => return Err(Error::EmptyRequest),
    };

    let parts: Vec<&str> = request_line.split_whitespace().collect();
    let [method, target, version] = parts.as_slice() else {
        return Err(Error::MalformedRequestLine(request_line.to_string()));
    };

    let method = Method::from_str(method)?;
    if !target.starts_with('/') && *target != "*" {
        return Err(Error::InvalidTarget(target.to_string()));
    }
    let version = HttpVersion::from_str(version)?;

    let mut headers: HashMap<String, String> = HashMap::new();
    for line in lines {
        if line.is_empty() {
            break;
        }

        let Some((name, value)) = line.split_once(':') else {
            return Err(Error::InvalidHeaderFormat(line.to_string()));
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidHeaderFormat(line.to_string()));
        }

        let name = name.to_ascii_lowercase();
        let value = value.trim().to_string();

        // Repeated Content-Length headers must agree (RFC 9112, section 6.3).
        if name == "content-length" {
            if let Some(previous) = headers.get(&name) {
                if *previous != value {
                    return Err(Error::ConflictingContentLength(previous.clone(), value));
                }
            }
        }

        headers.insert(name, value);
    }

    let request = HttpRequest::new(method, target, version, headers);
    if version == HttpVersion::Http11 && !request.has_header("Host") {
        return Err(Error::MissingHeader("Host".to_string()));
    }

    Ok(request)
}
