use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::domain::order::OrderEvent;
use crate::metrics::{ChannelOutcome, Metrics};
use super::email::{EmailMessage, EmailTransport};
use super::messaging::{MessagingTransport, TemplateCatalog};
use super::templates::{render_email, template_variables};

// ============================================================================
// Notification Dispatcher
// ============================================================================
//
// Fans one order event out to email and templated messaging. Each channel
// gets exactly one attempt; a failure on one never prevents the other and
// never escapes as an error.
//
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    pub email_delivered: bool,
    pub messaging_delivered: bool,
}

pub struct NotificationDispatcher {
    email: Arc<dyn EmailTransport>,
    messaging: Arc<dyn MessagingTransport>,
    templates: TemplateCatalog,
    metrics: Arc<Metrics>,
}

impl NotificationDispatcher {
    pub fn new(
        email: Arc<dyn EmailTransport>,
        messaging: Arc<dyn MessagingTransport>,
        templates: TemplateCatalog,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            email,
            messaging,
            templates,
            metrics,
        }
    }

    pub async fn dispatch(&self, event: &OrderEvent) -> DispatchResult {
        let view = &event.view;
        let tag = event.tag.as_str();

        if view.customer_email.trim().is_empty()
            || view.customer_name.trim().is_empty()
            || view.order_number.trim().is_empty()
        {
            tracing::warn!(
                order_id = view.order_id,
                event = tag,
                "Missing customer email, name or order number, skipping notification"
            );
            self.metrics.record_notification("email", tag, ChannelOutcome::Skipped);
            self.metrics.record_notification("messaging", tag, ChannelOutcome::Skipped);
            return DispatchResult::default();
        }

        let started = Instant::now();
        let result = DispatchResult {
            email_delivered: self.send_email(event).await,
            messaging_delivered: self.send_message(event).await,
        };
        self.metrics
            .record_dispatch_duration(tag, started.elapsed().as_secs_f64());

        tracing::info!(
            order_id = view.order_id,
            event = tag,
            email_delivered = result.email_delivered,
            messaging_delivered = result.messaging_delivered,
            "Order notification dispatched"
        );

        result
    }

    async fn send_email(&self, event: &OrderEvent) -> bool {
        let rendered = render_email(event);
        let message = EmailMessage {
            to: event.view.customer_email.clone(),
            subject: rendered.subject,
            html: rendered.html,
            text: rendered.text,
            attachments: Vec::new(),
        };

        match self.email.send(&message).await {
            Ok(receipt) => {
                tracing::debug!(
                    order_id = event.view.order_id,
                    route = ?receipt.route,
                    message_id = ?receipt.message_id,
                    "Email notification sent"
                );
                self.metrics
                    .record_notification("email", event.tag.as_str(), ChannelOutcome::Delivered);
                true
            }
            Err(e) => {
                tracing::warn!(
                    order_id = event.view.order_id,
                    event = event.tag.as_str(),
                    error = %e,
                    "Email notification failed"
                );
                self.metrics
                    .record_notification("email", event.tag.as_str(), ChannelOutcome::Failed);
                false
            }
        }
    }

    async fn send_message(&self, event: &OrderEvent) -> bool {
        let tag = event.tag.as_str();

        let phone = match event.view.customer_phone.as_deref() {
            Some(phone) if phone.starts_with('+') => phone,
            other => {
                tracing::warn!(
                    order_id = event.view.order_id,
                    phone = ?other,
                    "Phone number missing or not in international format, skipping message"
                );
                self.metrics.record_notification("messaging", tag, ChannelOutcome::Skipped);
                return false;
            }
        };

        let Some(template_id) = self.templates.template_for(event.tag) else {
            tracing::warn!(event = tag, "No messaging template configured for event, skipping message");
            self.metrics.record_notification("messaging", tag, ChannelOutcome::Skipped);
            return false;
        };

        let variables = template_variables(&event.view);
        match self.messaging.send_template(phone, template_id, &variables).await {
            Ok(message_id) => {
                tracing::debug!(order_id = event.view.order_id, message_id = %message_id, "Templated message sent");
                self.metrics.record_notification("messaging", tag, ChannelOutcome::Delivered);
                true
            }
            Err(e) => {
                tracing::warn!(
                    order_id = event.view.order_id,
                    event = tag,
                    error = %e,
                    "Templated message failed"
                );
                self.metrics.record_notification("messaging", tag, ChannelOutcome::Failed);
                false
            }
        }
    }
}
