//! Gaming networks.

use crate::http::{HttpRequest, HttpResponse, encode_component};
use crate::service::{Availability, Descriptor, Service, ServiceError};

/// Xbox Live, checked through the gamertag avatar endpoint.
///
/// Unknown gamertags either fail with a 500 or are served a stock "bad"
/// avatar. Recognising the stock avatar needs a reference copy of it; without
/// one, a 200 response is reported as [`Availability::Unknown`].
#[derive(Debug)]
pub struct XboxService {
    descriptor: Descriptor,
    reference_avatar: Option<Vec<u8>>,
}

impl XboxService {
    /// Create the service under `category`, without a reference avatar.
    #[must_use]
    pub fn new(category: &str) -> Self {
        Self {
            descriptor: Descriptor::new(category, "Xbox"),
            reference_avatar: None,
        }
    }

    /// Supply the PNG served for gamertags that do not exist.
    #[must_use]
    pub fn with_reference_avatar(mut self, png: impl Into<Vec<u8>>) -> Self {
        self.reference_avatar = Some(png.into());
        self
    }
}

impl Service for XboxService {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn request(&self, name: &str) -> HttpRequest {
        HttpRequest::get(format!(
            "https://avatar-ssl.xboxlive.com/avatar/{}/avatarpic-s.png",
            encode_component(name)
        ))
        .header("accept", "image/png;q=0.9,*/*;q=0.8")
    }

    fn accepted_status_codes(&self) -> &[u16] {
        &[200, 500]
    }

    fn interpret(&self, _name: &str, response: &HttpResponse) -> Result<Availability, ServiceError> {
        if response.status == 500 {
            return Ok(Availability::Available);
        }
        Ok(match &self.reference_avatar {
            Some(reference) => Availability::from(*reference == response.body),
            None => Availability::Unknown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::MockTransport;

    const STOCK: &[u8] = b"\x89PNG stock avatar";

    #[test]
    fn server_error_means_available() {
        let transport = MockTransport::status(500);
        let verdict = XboxService::new("game").check(&transport, "frank", None);
        assert_eq!(verdict.unwrap(), Availability::Available);
    }

    #[test]
    fn stock_avatar_means_available() {
        let service = XboxService::new("game").with_reference_avatar(STOCK);
        let transport = MockTransport::replying([Ok(HttpResponse::new(200).with_body(STOCK))]);
        assert_eq!(
            service.check(&transport, "frank", None).unwrap(),
            Availability::Available
        );
    }

    #[test]
    fn custom_avatar_means_taken() {
        let service = XboxService::new("game").with_reference_avatar(STOCK);
        let transport =
            MockTransport::replying([Ok(HttpResponse::new(200).with_body(&b"\x89PNG custom"[..]))]);
        assert_eq!(
            service.check(&transport, "frank", None).unwrap(),
            Availability::Taken
        );
    }

    #[test]
    fn without_reference_avatar_result_is_unknown() {
        let transport = MockTransport::replying([Ok(HttpResponse::new(200).with_body(STOCK))]);
        let verdict = XboxService::new("game").check(&transport, "frank", None);
        assert_eq!(verdict.unwrap(), Availability::Unknown);
    }
}
