use async_trait::async_trait;
use std::sync::Arc;

use crate::config::EmailMode;
use crate::metrics::Metrics;
use crate::utils::ProbeGate;
use super::email::{EmailMessage, EmailReceipt, EmailTransport, RelayTransport};
use super::TransportError;

// ============================================================================
// Failover Email Transport
// ============================================================================
//
// Http mode: every send goes through the HTTP API.
// Auto mode: the relay is probed (through the ProbeGate cache) before a send.
// A failed probe or a failed relay send reroutes that one message to the
// HTTP API; the caller only sees an error if the HTTP API fails as well.
//
// ============================================================================

pub struct FailoverEmailTransport {
    relay: Option<Arc<dyn RelayTransport>>,
    http: Arc<dyn EmailTransport>,
    mode: EmailMode,
    gate: ProbeGate,
    metrics: Arc<Metrics>,
}

impl FailoverEmailTransport {
    pub fn new(
        relay: Option<Arc<dyn RelayTransport>>,
        http: Arc<dyn EmailTransport>,
        mode: EmailMode,
        gate: ProbeGate,
        metrics: Arc<Metrics>,
    ) -> Self {
        if mode == EmailMode::Auto && relay.is_none() {
            tracing::warn!("Email mode is auto but no SMTP relay is available, using HTTP API only");
        }

        Self {
            relay,
            http,
            mode,
            gate,
            metrics,
        }
    }

    async fn fall_back(&self, message: &EmailMessage, reason: &str) -> Result<EmailReceipt, TransportError> {
        let relay_state = self.gate.state().await;
        tracing::info!(
            to = %message.to,
            reason = reason,
            relay = ?relay_state,
            "Falling back to HTTP email API"
        );
        self.metrics.record_email_fallback(reason);
        self.http.send(message).await
    }
}

#[async_trait]
impl EmailTransport for FailoverEmailTransport {
    async fn send(&self, message: &EmailMessage) -> Result<EmailReceipt, TransportError> {
        let relay = match (&self.relay, self.mode) {
            (Some(relay), EmailMode::Auto) => relay,
            _ => return self.http.send(message).await,
        };

        if !self.gate.check(relay.verify()).await {
            return self.fall_back(message, "probe_failed").await;
        }

        match relay.send(message).await {
            Ok(receipt) => Ok(receipt),
            Err(e) => {
                tracing::warn!(to = %message.to, error = %e, "SMTP relay send failed");
                self.gate.invalidate().await;
                self.fall_back(message, "relay_send_failed").await
            }
        }
    }
}
