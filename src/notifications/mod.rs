// ============================================================================
// Notifications - multi-channel fan-out of order lifecycle events
// ============================================================================
//
// - email       - EmailTransport contract, message/attachment types
// - smtp        - Pooled SMTP relay strategy
// - http_api    - Stateless transactional-email HTTP strategy
// - failover    - Strategy selection with cached relay probing
// - messaging   - Templated mobile messaging transport
// - templates   - Per-event email rendering and template variables
// - dispatcher  - Per-channel failure-isolated dispatch
// - sink        - Hand-off point between OrderService and the dispatcher
//
// Transport failures never propagate past the dispatcher.
//
// ============================================================================

pub mod dispatcher;
pub mod email;
pub mod failover;
pub mod http_api;
pub mod messaging;
pub mod sink;
pub mod smtp;
pub mod templates;

pub use dispatcher::{DispatchResult, NotificationDispatcher};
pub use email::{EmailMessage, EmailReceipt, EmailRoute, EmailTransport, RelayTransport};
pub use failover::FailoverEmailTransport;
pub use http_api::HttpApiEmailTransport;
pub use messaging::{MessagingTransport, TemplateCatalog, TemplateMessagingClient};
pub use sink::{InlineSink, NotificationSink};
pub use smtp::SmtpRelayTransport;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("SMTP relay error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Relay unavailable: {0}")]
    Unavailable(String),

    #[error("{0} timed out")]
    Timeout(&'static str),

    #[error("Relay host unresolvable: {0}")]
    Unresolvable(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid message: {0}")]
    Message(String),

    #[error("Attachment unreadable: {0}")]
    Attachment(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
}
