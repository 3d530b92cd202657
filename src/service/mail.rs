//! Mail providers.

use serde::Deserialize;
use serde_json::json;

use crate::http::{HttpRequest, HttpResponse};
use crate::service::{Availability, Descriptor, Service, ServiceError};

/// Gmail, via the signup form's input validator.
#[derive(Debug)]
pub struct GmailService {
    descriptor: Descriptor,
}

impl GmailService {
    /// Create the service under `category`.
    #[must_use]
    pub fn new(category: &str) -> Self {
        Self {
            descriptor: Descriptor::new(category, "Gmail"),
        }
    }
}

#[derive(Deserialize)]
struct ValidatorResponse {
    input01: ValidatorField,
}

#[derive(Deserialize)]
struct ValidatorField {
    #[serde(rename = "Valid")]
    valid: String,
}

impl Service for GmailService {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn request(&self, name: &str) -> HttpRequest {
        let body = json!({
            "input01": {
                "Input": "GmailAddress",
                "GmailAddress": name,
                "FirstName": "",
                "LastName": ""
            },
            "Locale": "en"
        });
        HttpRequest::post("https://accounts.google.com/InputValidator?resource=SignUp")
            .header("content-type", "application/json")
            .body(body.to_string())
    }

    fn accepted_status_codes(&self) -> &[u16] {
        &[200]
    }

    fn interpret(&self, _name: &str, response: &HttpResponse) -> Result<Availability, ServiceError> {
        let parsed: ValidatorResponse = response.json()?;
        Ok(Availability::from(parsed.input01.valid == "true"))
    }
}
