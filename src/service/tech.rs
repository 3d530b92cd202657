//! Developer tools and code hosts.

use serde_json::json;

use crate::http::{HttpRequest, HttpResponse, encode_component};
use crate::service::{Availability, Descriptor, Service, ServiceError};

/// Cloud9, checked with a login attempt using a blank password.
#[derive(Debug)]
pub struct Cloud9Service {
    descriptor: Descriptor,
}

impl Cloud9Service {
    /// Create the service under `category`.
    #[must_use]
    pub fn new(category: &str) -> Self {
        Self {
            descriptor: Descriptor::new(category, "Cloud9"),
        }
    }
}

impl Service for Cloud9Service {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn request(&self, name: &str) -> HttpRequest {
        let body = json!({ "username": name, "password": " " });
        HttpRequest::post("https://c9.io/auth/login")
            .header("accept", "*/*")
            .header("content-type", "application/json")
            .header("origin", "https://c9.io")
            .body(body.to_string())
    }

    fn accepted_status_codes(&self) -> &[u16] {
        &[200, 403]
    }

    fn interpret(&self, _name: &str, response: &HttpResponse) -> Result<Availability, ServiceError> {
        Ok(Availability::from(
            response.status == 403 && response.text() == "Incorrect username.",
        ))
    }
}

/// GitHub user and organisation pages.
#[derive(Debug)]
pub struct GitHubService {
    descriptor: Descriptor,
}

impl GitHubService {
    /// Create the service under `category`.
    #[must_use]
    pub fn new(category: &str) -> Self {
        Self {
            descriptor: Descriptor::new(category, "GitHub"),
        }
    }
}

impl Service for GitHubService {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn request(&self, name: &str) -> HttpRequest {
        HttpRequest::head(format!("https://github.com/{}", encode_component(name)))
    }
}

/// Pastebin user pages; unknown users are redirected away.
#[derive(Debug)]
pub struct PastebinService {
    descriptor: Descriptor,
}

impl PastebinService {
    /// Create the service under `category`.
    #[must_use]
    pub fn new(category: &str) -> Self {
        Self {
            descriptor: Descriptor::new(category, "Pastebin"),
        }
    }
}

impl Service for PastebinService {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn request(&self, name: &str) -> HttpRequest {
        HttpRequest::head(format!("https://pastebin.com/u/{}", encode_component(name)))
            .no_redirects()
    }

    fn accepted_status_codes(&self) -> &[u16] {
        &[200, 302]
    }

    fn interpret(&self, _name: &str, response: &HttpResponse) -> Result<Availability, ServiceError> {
        Ok(Availability::from(response.status == 302))
    }
}
