use async_trait::async_trait;
use std::path::PathBuf;

use super::TransportError;

/// Where attachment bytes come from
#[derive(Debug, Clone, PartialEq)]
pub enum AttachmentSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub source: AttachmentSource,
}

impl EmailAttachment {
    pub async fn load(&self) -> Result<Vec<u8>, TransportError> {
        match &self.source {
            AttachmentSource::Bytes(bytes) => Ok(bytes.clone()),
            AttachmentSource::Path(path) => Ok(tokio::fs::read(path).await?),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
    pub attachments: Vec<EmailAttachment>,
}

/// Which strategy delivered a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailRoute {
    Relay,
    HttpApi,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailReceipt {
    pub route: EmailRoute,
    pub message_id: Option<String>,
}

/// One `send` capability regardless of which strategy is active
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<EmailReceipt, TransportError>;
}

/// A connection-oriented strategy that can be health-probed before use
#[async_trait]
pub trait RelayTransport: EmailTransport {
    async fn verify(&self) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_attachment_from_bytes() {
        let attachment = EmailAttachment {
            filename: "receipt.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            source: AttachmentSource::Bytes(vec![1, 2, 3]),
        };
        assert_eq!(attachment.load().await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_attachment_from_missing_path_fails() {
        let attachment = EmailAttachment {
            filename: "receipt.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            source: AttachmentSource::Path(PathBuf::from("/nonexistent/receipt.pdf")),
        };
        assert!(matches!(attachment.load().await, Err(TransportError::Attachment(_))));
    }
}
