//! Bookmarking services.

use crate::http::{HttpRequest, HttpResponse, encode_component};
use crate::service::{Availability, Descriptor, Service, ServiceError};

/// StumbleUpon's signup username validator.
#[derive(Debug)]
pub struct StumbleUponService {
    descriptor: Descriptor,
}

impl StumbleUponService {
    /// Create the service under `category`.
    #[must_use]
    pub fn new(category: &str) -> Self {
        Self {
            descriptor: Descriptor::new(category, "StumbleUpon"),
        }
    }
}

impl Service for StumbleUponService {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn request(&self, name: &str) -> HttpRequest {
        HttpRequest::post("https://www.stumbleupon.com/api/v2_0/signup/validateusername")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(format!("username={}", encode_component(name)))
    }

    fn accepted_status_codes(&self) -> &[u16] {
        &[200, 500]
    }

    // The validator answers 500 for names that are already registered.
    fn interpret(&self, _name: &str, response: &HttpResponse) -> Result<Availability, ServiceError> {
        Ok(Availability::from(response.status == 200))
    }
}
