use actix_web::HttpRequest;

use crate::domain::order::{CustomerId, OrderError};

/// Resolve the calling customer. Identity itself is established upstream.
pub trait Authenticator: Send + Sync {
    fn identify(&self, request: &HttpRequest) -> Result<CustomerId, OrderError>;
}

/// Trusts the customer id the gateway places in a request header
pub struct HeaderAuthenticator {
    header: String,
}

impl HeaderAuthenticator {
    pub const DEFAULT_HEADER: &'static str = "x-customer-id";

    pub fn new(header: impl Into<String>) -> Self {
        Self { header: header.into() }
    }
}

impl Default for HeaderAuthenticator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HEADER)
    }
}

impl Authenticator for HeaderAuthenticator {
    fn identify(&self, request: &HttpRequest) -> Result<CustomerId, OrderError> {
        let value = request
            .headers()
            .get(self.header.as_str())
            .ok_or_else(|| OrderError::Unauthorized(format!("missing {} header", self.header)))?;

        value
            .to_str()
            .ok()
            .and_then(|raw| raw.trim().parse::<CustomerId>().ok())
            .ok_or_else(|| OrderError::Unauthorized(format!("malformed {} header", self.header)))
    }
}
