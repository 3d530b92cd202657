//! Blogging platforms.

use crate::http::{HttpRequest, HttpResponse, encode_component};
use crate::service::{Availability, Descriptor, Service, ServiceError};

/// LiveJournal, checked through the `<name>.livejournal.com` subdomain.
#[derive(Debug)]
pub struct LiveJournalService {
    descriptor: Descriptor,
}

impl LiveJournalService {
    /// Create the service under `category`.
    #[must_use]
    pub fn new(category: &str) -> Self {
        Self {
            descriptor: Descriptor::new(category, "LiveJournal"),
        }
    }
}

impl Service for LiveJournalService {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn request(&self, name: &str) -> HttpRequest {
        HttpRequest::head(format!("https://{}.livejournal.com", encode_component(name)))
    }

    fn accepted_status_codes(&self) -> &[u16] {
        &[200, 404, 410]
    }

    // 410 marks a purged journal whose name can be bought back, so it still counts as free.
    fn interpret(&self, _name: &str, response: &HttpResponse) -> Result<Availability, ServiceError> {
        Ok(Availability::from(response.status != 200))
    }
}

/// WordPress.com, which redirects unclaimed subdomains to its signup page.
#[derive(Debug)]
pub struct WordPressService {
    descriptor: Descriptor,
}

impl WordPressService {
    /// Create the service under `category`.
    #[must_use]
    pub fn new(category: &str) -> Self {
        Self {
            descriptor: Descriptor::new(category, "WordPress"),
        }
    }
}

impl Service for WordPressService {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn request(&self, name: &str) -> HttpRequest {
        HttpRequest::head(format!("https://{}.wordpress.com", encode_component(name))).no_redirects()
    }

    fn accepted_status_codes(&self) -> &[u16] {
        &[200, 302, 410]
    }

    fn interpret(&self, _name: &str, response: &HttpResponse) -> Result<Availability, ServiceError> {
        Ok(Availability::from(response.status == 302))
    }
}
