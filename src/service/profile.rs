//! Profile and contact-page hosts.

use crate::http::{HttpRequest, HttpResponse, encode_component};
use crate::service::{Availability, Descriptor, Service, ServiceError};

const NOT_FOUND_MARKER: &str = "<p>Not Found: That ID is not in our database.</p>";

/// scr.im, which answers 200 either way and says "not found" in the page body.
#[derive(Debug)]
pub struct ScrimService {
    descriptor: Descriptor,
}

impl ScrimService {
    /// Create the service under `category`.
    #[must_use]
    pub fn new(category: &str) -> Self {
        Self {
            descriptor: Descriptor::new(category, "scr.im"),
        }
    }
}

impl Service for ScrimService {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn request(&self, name: &str) -> HttpRequest {
        HttpRequest::get(format!("http://scr.im/{}", encode_component(name)))
    }

    fn accepted_status_codes(&self) -> &[u16] {
        &[200]
    }

    fn interpret(&self, _name: &str, response: &HttpResponse) -> Result<Availability, ServiceError> {
        Ok(Availability::from(response.text().contains(NOT_FOUND_MARKER)))
    }
}
