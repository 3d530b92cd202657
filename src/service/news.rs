//! News aggregators.

use serde::Deserialize;
use serde_json::Value;

use crate::http::{HttpRequest, HttpResponse};
use crate::service::{Availability, Descriptor, Service, ServiceError};

/// Flipboard's username check API.
#[derive(Debug)]
pub struct FlipboardService {
    descriptor: Descriptor,
}

impl FlipboardService {
    /// Create the service under `category`.
    #[must_use]
    pub fn new(category: &str) -> Self {
        Self {
            descriptor: Descriptor::new(category, "Flipboard"),
        }
    }
}

#[derive(Deserialize)]
struct UsernameCheck {
    #[serde(default)]
    available: Value,
}

/// Loose truthiness: `null`, `false`, `0` and `""` are false, anything else is true.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl Service for FlipboardService {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn request(&self, name: &str) -> HttpRequest {
        HttpRequest::get("https://flipboard.com/api/flipboard/checkUsername").query("username", name)
    }

    fn interpret(&self, _name: &str, response: &HttpResponse) -> Result<Availability, ServiceError> {
        let parsed: UsernameCheck = response.json()?;
        Ok(Availability::from(truthy(&parsed.available)))
    }
}
