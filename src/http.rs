//! Transport boundary: the HTTP request/response values services work with,
//! and the [`Transport`] that carries them.

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::de::DeserializeOwned;
use tracing::debug;
use ureq::Agent;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_REDIRECTS: u32 = 10;

/// HTTP method used by a service check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    /// `HEAD`, the default: most services answer availability with a status code alone.
    #[default]
    Head,
    /// `GET`
    Get,
    /// `POST`
    Post,
}

impl Method {
    /// The method name as sent on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Head => "HEAD",
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single outbound request built by a service for one name.
///
/// ```
/// use handle_avail::http::{HttpRequest, Method};
///
/// let request = HttpRequest::get("https://example.com/api/check").query("username", "a b");
/// assert_eq!(request.method, Method::Get);
/// assert_eq!(request.url, "https://example.com/api/check?username=a%20b");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Request method.
    pub method: Method,
    /// Absolute URL, query string included.
    pub url: String,
    /// Header pairs in insertion order. Names are stored lower-cased.
    pub headers: Vec<(String, String)>,
    /// Request body, if any.
    pub body: Option<Vec<u8>>,
    /// Whether 3xx responses are followed. Some services signal availability
    /// through the redirect itself.
    pub follow_redirects: bool,
    /// Upper bound on the whole request.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// A `HEAD` request for `url`.
    #[must_use]
    pub fn head(url: impl Into<String>) -> Self {
        Self::new(Method::Head, url)
    }

    /// A `GET` request for `url`.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// A `POST` request for `url`.
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            follow_redirects: true,
            timeout: None,
        }
    }

    /// Set a header, replacing any existing value for the same name.
    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        match self.headers.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.headers.push((name, value)),
        }
        self
    }

    /// Set a header only when the request does not carry it already.
    #[must_use]
    pub fn default_header(self, name: &str, value: impl Into<String>) -> Self {
        if self.header_value(name).is_some() {
            self
        } else {
            self.header(name, value)
        }
    }

    /// Append a percent-encoded query parameter to the URL.
    #[must_use]
    pub fn query(mut self, key: &str, value: &str) -> Self {
        let sep = if self.url.contains('?') { '&' } else { '?' };
        self.url.push(sep);
        self.url.push_str(&encode_component(key));
        self.url.push('=');
        self.url.push_str(&encode_component(value));
        self
    }

    /// Attach a request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Return 3xx responses as-is instead of following them.
    #[must_use]
    pub fn no_redirects(mut self) -> Self {
        self.follow_redirects = false;
        self
    }

    /// Bound the request duration.
    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// What came back from the service: any status code counts as a response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Header pairs, names lower-cased.
    pub headers: Vec<(String, String)>,
    /// Raw body bytes. Empty for `HEAD`.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// A response with the given status and an empty body.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Replace the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// The body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// The body parsed as JSON.
    ///
    /// # Errors
    ///
    /// Returns the parser error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Failure to obtain any response at all.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The request did not complete within its timeout.
    #[error("request timed out")]
    TimedOut,
    /// DNS, connection or protocol failure reported by the HTTP client.
    #[error(transparent)]
    Http(Box<ureq::Error>),
    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

impl From<ureq::Error> for TransportError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Timeout(_) => Self::TimedOut,
            e => Self::Http(Box::new(e)),
        }
    }
}

/// Carries one [`HttpRequest`] to its service and returns the response.
///
/// Implementations must not turn non-2xx status codes into errors; services
/// decide which codes they accept.
pub trait Transport: Send + Sync {
    /// Issue `request` exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no response was received.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Sends [`HttpRequest`]s over the network.
///
/// Every status code comes back as an [`HttpResponse`]. Each request gets its
/// own timeout when it carries one, and redirects are only followed when the
/// request allows them. Requests without a timeout fall back to 10 seconds.
///
/// ```no_run
/// use handle_avail::http::{Client, HttpRequest, Transport};
///
/// let response = Client::new()
///     .send(&HttpRequest::head("https://pastebin.com/u/frank").no_redirects())
///     .unwrap();
/// println!("{}", response.status);
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    agent: Agent,
}

impl Client {
    /// A client identifying itself as this crate.
    #[must_use]
    pub fn new() -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .http_status_as_error(false)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build();
        Self {
            agent: Agent::new_with_config(config),
        }
    }

    fn prepare<B>(
        &self,
        mut builder: ureq::RequestBuilder<B>,
        request: &HttpRequest,
    ) -> ureq::RequestBuilder<B> {
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let redirects = if request.follow_redirects {
            MAX_REDIRECTS
        } else {
            0
        };
        let config = builder
            .config()
            .http_status_as_error(false)
            .max_redirects(redirects);
        match request.timeout {
            Some(timeout) => config.timeout_global(Some(timeout)).build(),
            None => config.build(),
        }
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for Client {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.as_str();
        let body = request.body.as_deref().unwrap_or_default();
        let result = match request.method {
            Method::Head => self.prepare(self.agent.head(url), request).call(),
            Method::Get => self.prepare(self.agent.get(url), request).call(),
            Method::Post => self.prepare(self.agent.post(url), request).send(body),
        };
        let mut response = result?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_owned(), value.to_owned()))
            })
            .collect();
        let body = if request.method == Method::Head {
            Vec::new()
        } else {
            response.body_mut().read_to_vec()?
        };
        debug!(%url, status, bytes = body.len(), "received response");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Everything except ASCII alphanumerics and `-_.!~*'()`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a value for use as a URL path segment or query component.
///
/// ```
/// use handle_avail::http::encode_component;
/// assert_eq!(encode_component("john doe"), "john%20doe");
/// assert_eq!(encode_component("a/b?c"), "a%2Fb%3Fc");
/// ```
#[must_use]
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}
