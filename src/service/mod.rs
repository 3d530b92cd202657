//! Per-service availability strategies.
//!
//! Every service knows how to build one HTTP request for a name, which status
//! codes it considers a valid answer, and how to read a valid answer as an
//! [`Availability`]. The shared request/verify/interpret algorithm lives in
//! the provided [`Service::check`] method.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::http::{HttpRequest, HttpResponse, Transport, TransportError};

pub mod blog;
pub mod bookmark;
pub mod game;
pub mod mail;
pub mod news;
pub mod profile;
pub mod tech;

const CACHE_HEADERS: &[(&str, &str)] = &[
    (
        "cache-control",
        "no-cache,no-store,must-revalidate,max-age=-1,private",
    ),
    ("connection", "keep-alive"),
    ("expires", "-1"),
];

const SPOOF_HEADERS: &[(&str, &str)] = &[
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    ),
    ("accept-encoding", "gzip, deflate, br"),
    ("accept-language", "en-US,en;q=0.5"),
    (
        "user-agent",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/59.0.3071.115 Safari/537.36",
    ),
];

/// Status codes accepted when a service does not say otherwise.
pub const DEFAULT_ACCEPTED_STATUS_CODES: &[u16] = &[200, 404];

/// Identity of a service: the category it is grouped under and its title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Descriptor {
    /// Grouping, e.g. `tech`.
    pub category: String,
    /// Display title, e.g. `GitHub`.
    pub title: String,
}

impl Descriptor {
    /// Build a descriptor.
    #[must_use]
    pub fn new(category: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            title: title.into(),
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.title)
    }
}

/// Verdict of a single service check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use]
pub enum Availability {
    /// The name is free on the service.
    Available,
    /// The name is already registered.
    Taken,
    /// The service answered but the answer did not settle the question.
    Unknown,
}

impl Availability {
    /// `true`/`false` for a definitive verdict, `None` for [`Availability::Unknown`].
    #[must_use]
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Available => Some(true),
            Self::Taken => Some(false),
            Self::Unknown => None,
        }
    }
}

impl From<bool> for Availability {
    fn from(available: bool) -> Self {
        if available {
            Self::Available
        } else {
            Self::Taken
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::Taken => write!(f, "taken"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Why a single service check produced no verdict.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ServiceError {
    /// No response was received.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The service answered with a status code it does not accept.
    #[error("Unexpected status code: {code}{}", reason_suffix(.reason))]
    Rejected {
        /// Status code received.
        code: u16,
        /// Standard reason phrase, where one exists.
        reason: Option<&'static str>,
    },
    /// The response was accepted but could not be understood.
    #[error("could not interpret response: {0}")]
    Interpret(String),
}

impl ServiceError {
    /// A [`ServiceError::Rejected`] for `code`, with its canonical reason phrase.
    pub fn rejected(code: u16) -> Self {
        let reason = ureq::http::StatusCode::from_u16(code)
            .ok()
            .and_then(|status| status.canonical_reason());
        Self::Rejected { code, reason }
    }
}

fn reason_suffix(reason: &Option<&'static str>) -> String {
    reason.map(|r| format!(" - {r}")).unwrap_or_default()
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Interpret(e.to_string())
    }
}

/// A service on which a name can be checked.
///
/// Implementors provide the request for a name and, when the defaults do not
/// fit, the accepted status codes and the interpretation of a response.
pub trait Service: Send + Sync + fmt::Debug {
    /// Category and title of this service.
    fn descriptor(&self) -> &Descriptor;

    /// The request asking the service about `name`.
    fn request(&self, name: &str) -> HttpRequest;

    /// Status codes that count as a valid answer.
    fn accepted_status_codes(&self) -> &[u16] {
        DEFAULT_ACCEPTED_STATUS_CODES
    }

    /// Read an accepted response. Defaults to "available iff 404".
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Interpret`] when the response does not make sense.
    fn interpret(&self, _name: &str, response: &HttpResponse) -> Result<Availability, ServiceError> {
        Ok(Availability::from(response.status == 404))
    }

    /// Send browser-like headers to get past bot detection.
    fn spoof(&self) -> bool {
        false
    }

    /// Check `name` on this service with a single request.
    ///
    /// # Errors
    ///
    /// Transport failures propagate as-is, status codes outside
    /// [`accepted_status_codes`](Self::accepted_status_codes) become
    /// [`ServiceError::Rejected`], and interpretation failures propagate.
    fn check(
        &self,
        transport: &dyn Transport,
        name: &str,
        timeout: Option<Duration>,
    ) -> Result<Availability, ServiceError> {
        let title = &self.descriptor().title;
        let request = prepare_request(self.request(name), self.spoof(), timeout);

        debug!(service = %title, method = %request.method, url = %request.url, "sending request");

        let response = transport.send(&request).map_err(|e| {
            debug!(service = %title, error = %e, "request failed");
            e
        })?;

        debug!(
            service = %title,
            status = response.status,
            content_type = response.header("content-type").unwrap_or("-"),
            "received response"
        );

        if !self.accepted_status_codes().contains(&response.status) {
            debug!(service = %title, status = response.status, "rejected response status");
            return Err(ServiceError::rejected(response.status));
        }

        let availability = self.interpret(name, &response)?;
        debug!(service = %title, %availability, "interpreted response");
        Ok(availability)
    }
}

/// Layer the common headers and timeout under what the service asked for.
fn prepare_request(mut request: HttpRequest, spoof: bool, timeout: Option<Duration>) -> HttpRequest {
    let extra: &[(&str, &str)] = if spoof { SPOOF_HEADERS } else { &[] };
    for (name, value) in CACHE_HEADERS.iter().chain(extra) {
        request = request.default_header(name, *value);
    }
    if request.timeout.is_none() {
        request = request.timeout(timeout);
    }
    request
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Replays canned outcomes and records every request it is given.
    #[derive(Debug, Default)]
    pub(crate) struct MockTransport {
        replies: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
        pub(crate) sent: Mutex<Vec<HttpRequest>>,
    }

    impl MockTransport {
        pub(crate) fn replying(
            replies: impl IntoIterator<Item = Result<HttpResponse, TransportError>>,
        ) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
                sent: Mutex::default(),
            }
        }

        pub(crate) fn status(code: u16) -> Self {
            Self::replying([Ok(HttpResponse::new(code))])
        }

        pub(crate) fn last_request(&self) -> HttpRequest {
            self.sent.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Transport for MockTransport {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.sent.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Other("no reply queued".into())))
        }
    }
}
