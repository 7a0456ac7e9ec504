use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::config::MessagingConfig;
use crate::domain::order::OrderEventTag;
use super::TransportError;

// ============================================================================
// Messaging Transport - templated mobile messages
// ============================================================================

#[async_trait]
pub trait MessagingTransport: Send + Sync {
    /// Send provider template `template_id` to an E.164 number. Returns the provider message id.
    async fn send_template(
        &self,
        phone_e164: &str,
        template_id: &str,
        variables: &BTreeMap<String, String>,
    ) -> Result<String, TransportError>;
}

/// Event tag → provider template id, loaded from configuration
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: HashMap<OrderEventTag, String>,
}

impl TemplateCatalog {
    pub fn new(templates: HashMap<OrderEventTag, String>) -> Self {
        Self { templates }
    }

    pub fn template_for(&self, tag: OrderEventTag) -> Option<&str> {
        self.templates.get(&tag).map(String::as_str)
    }
}

/// Client for a content-template messaging API (form-encoded, basic auth)
pub struct TemplateMessagingClient {
    client: reqwest::Client,
    messages_url: String,
    account_sid: String,
    auth_token: String,
    sender: String,
    address_prefix: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

impl TemplateMessagingClient {
    pub fn new(config: &MessagingConfig) -> Result<Self, TransportError> {
        if !config.sender.starts_with('+') {
            return Err(TransportError::InvalidAddress(format!(
                "{}: sender must be E.164 with a + prefix",
                config.sender
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            messages_url: format!(
                "{}/Accounts/{}/Messages.json",
                config.base_url.trim_end_matches('/'),
                config.account_sid
            ),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            sender: config.sender.clone(),
            address_prefix: config.address_prefix.clone(),
        })
    }

    fn form(
        &self,
        phone_e164: &str,
        template_id: &str,
        variables: &BTreeMap<String, String>,
    ) -> Result<Vec<(&'static str, String)>, TransportError> {
        if !phone_e164.starts_with('+') {
            return Err(TransportError::InvalidAddress(format!(
                "{phone_e164}: phone number must be E.164 with a + prefix"
            )));
        }

        let content_variables =
            serde_json::to_string(variables).map_err(|e| TransportError::Message(e.to_string()))?;

        Ok(vec![
            ("From", format!("{}{}", self.address_prefix, self.sender)),
            ("To", format!("{}{}", self.address_prefix, phone_e164)),
            ("ContentSid", template_id.to_string()),
            ("ContentVariables", content_variables),
        ])
    }
}

#[async_trait]
impl MessagingTransport for TemplateMessagingClient {
    async fn send_template(
        &self,
        phone_e164: &str,
        template_id: &str,
        variables: &BTreeMap<String, String>,
    ) -> Result<String, TransportError> {
        let form = self.form(phone_e164, template_id, variables)?;

        let response = self
            .client
            .post(&self.messages_url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
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

        let message = response.json::<MessageResponse>().await?;
        tracing::debug!(template_id = %template_id, message_id = %message.sid, "Templated message accepted");
        Ok(message.sid)
    }
}
