use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::metrics::Metrics;
use crate::notifications::templates::escape_html;
use crate::notifications::{EmailMessage, EmailTransport};
use super::cooldown::AlertCooldownTracker;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockSignal {
    pub product_name: String,
    pub current_stock: i64,
    pub min_stock: i64,
}

impl LowStockSignal {
    /// Product identity plus observed level: a further drop is a new signal
    pub fn cooldown_key(&self) -> String {
        format!("low-stock:{}:{}", self.product_name.trim(), self.current_stock)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertOutcome {
    pub sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<bool>,
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("Product name is required")]
    MissingProductName,
}

pub struct LowStockAlerter {
    email: Arc<dyn EmailTransport>,
    tracker: AlertCooldownTracker,
    recipient: String,
    window: Duration,
    metrics: Arc<Metrics>,
}

impl LowStockAlerter {
    pub fn new(
        email: Arc<dyn EmailTransport>,
        tracker: AlertCooldownTracker,
        recipient: impl Into<String>,
        window: Duration,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            email,
            tracker,
            recipient: recipient.into(),
            window,
            metrics,
        }
    }

    pub async fn signal(&self, signal: &LowStockSignal) -> Result<AlertOutcome, AlertError> {
        if signal.product_name.trim().is_empty() {
            return Err(AlertError::MissingProductName);
        }

        let key = signal.cooldown_key();
        if !self.tracker.should_send_and_mark(&key, self.window).await {
            tracing::info!(
                product = %signal.product_name,
                stock = signal.current_stock,
                "Low-stock alert suppressed by cooldown"
            );
            self.metrics.record_alert("suppressed");
            return Ok(AlertOutcome {
                sent: false,
                skipped: Some(true),
            });
        }

        match self.email.send(&self.render(signal)).await {
            Ok(_) => {
                tracing::info!(product = %signal.product_name, stock = signal.current_stock, "Low-stock alert sent");
                self.metrics.record_alert("sent");
                Ok(AlertOutcome {
                    sent: true,
                    skipped: None,
                })
            }
            Err(e) => {
                tracing::warn!(product = %signal.product_name, error = %e, "Low-stock alert failed");
                // Let the next identical signal try again
                self.tracker.reset(&key).await;
                self.metrics.record_alert("failed");
                Ok(AlertOutcome {
                    sent: false,
                    skipped: None,
                })
            }
        }
    }

    fn render(&self, signal: &LowStockSignal) -> EmailMessage {
        let subject = format!("Low stock: {}", signal.product_name);
        let text = format!(
            "{} has {} units left (minimum {}).",
            signal.product_name, signal.current_stock, signal.min_stock
        );

        EmailMessage {
            to: self.recipient.clone(),
            subject,
            html: format!("<p>{}</p>", escape_html(&text)),
            text,
            attachments: Vec::new(),
        }
    }
}
