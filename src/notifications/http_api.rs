use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::HttpApiConfig;
use super::email::{EmailMessage, EmailReceipt, EmailRoute, EmailTransport};
use super::TransportError;

// ============================================================================
// HTTP API Strategy - stateless transactional email provider
// ============================================================================

pub struct HttpApiEmailTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

#[derive(Debug, Serialize)]
struct ApiEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<ApiAttachment>,
}

#[derive(Debug, Serialize)]
struct ApiAttachment {
    filename: String,
    content_type: String,
    /// base64
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiEmailResponse {
    id: Option<String>,
}

impl HttpApiEmailTransport {
    pub fn new(config: &HttpApiConfig, from: impl Into<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            from: from.into(),
        })
    }

    async fn encode_attachments(message: &EmailMessage) -> Result<Vec<ApiAttachment>, TransportError> {
        let mut encoded = Vec::with_capacity(message.attachments.len());
        for attachment in &message.attachments {
            encoded.push(ApiAttachment {
                filename: attachment.filename.clone(),
                content_type: attachment.content_type.clone(),
                content: STANDARD.encode(attachment.load().await?),
            });
        }
        Ok(encoded)
    }
}

#[async_trait]
impl EmailTransport for HttpApiEmailTransport {
    async fn send(&self, message: &EmailMessage) -> Result<EmailReceipt, TransportError> {
        let body = ApiEmailRequest {
            from: &self.from,
            to: vec![message.to.as_str()],
            subject: &message.subject,
            html: &message.html,
            text: &message.text,
            attachments: Self::encode_attachments(message).await?,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        // Some providers answer 202 with an empty body
        let message_id = response
            .json::<ApiEmailResponse>()
            .await
            .ok()
            .and_then(|r| r.id);

        tracing::debug!(to = %message.to, message_id = ?message_id, "Email accepted by HTTP API");

        Ok(EmailReceipt {
            route: EmailRoute::HttpApi,
            message_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::email::{AttachmentSource, EmailAttachment};

    #[tokio::test]
    async fn test_attachments_are_base64_inline() {
        let message = EmailMessage {
            to: "ana@example.com".to_string(),
            subject: "Receipt".to_string(),
            html: "<p>hi</p>".to_string(),
            text: "hi".to_string(),
            attachments: vec![EmailAttachment {
                filename: "r.txt".to_string(),
                content_type: "text/plain".to_string(),
                source: AttachmentSource::Bytes(b"hello".to_vec()),
            }],
        };

        let encoded = HttpApiEmailTransport::encode_attachments(&message).await.unwrap();
        assert_eq!(encoded.len(), 1);
        assert_eq!(encoded[0].content, "aGVsbG8=");

        let body = ApiEmailRequest {
            from: "shop@example.com",
            to: vec![message.to.as_str()],
            subject: &message.subject,
            html: &message.html,
            text: &message.text,
            attachments: encoded,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["to"][0], "ana@example.com");
        assert_eq!(json["attachments"][0]["filename"], "r.txt");
    }

    #[test]
    fn test_attachments_omitted_when_empty() {
        let body = ApiEmailRequest {
            from: "a@example.com",
            to: vec!["b@example.com"],
            subject: "s",
            html: "h",
            text: "t",
            attachments: vec![],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("attachments").is_none());
    }
}
