use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::transport::smtp::PoolConfig;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::net::SocketAddr;
use std::time::Duration;

use crate::config::{SmtpConfig, SmtpTls};
use super::email::{EmailMessage, EmailReceipt, EmailRoute, EmailTransport, RelayTransport};
use super::TransportError;

// ============================================================================
// SMTP Relay Strategy - pooled, persistent connections
// ============================================================================
//
// The relay host is resolved once, bounded by the DNS timeout, and only an
// IPv4 address is used. TLS still validates against the configured host name.
//
// ============================================================================

pub struct SmtpRelayTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    greeting_timeout: Duration,
}

impl SmtpRelayTransport {
    pub async fn connect(config: &SmtpConfig, from: &str) -> Result<Self, TransportError> {
        let address = resolve_ipv4(
            &config.host,
            config.port,
            Duration::from_secs(config.dns_timeout_secs),
        )
        .await?;

        let tls = match config.tls {
            SmtpTls::Wrapper => Tls::Wrapper(TlsParameters::new(config.host.clone())?),
            SmtpTls::Starttls => Tls::Required(TlsParameters::new(config.host.clone())?),
            SmtpTls::None => Tls::None,
        };

        let pool = PoolConfig::new()
            .max_size(config.pool_max_size)
            .idle_timeout(Duration::from_secs(config.socket_idle_timeout_secs));

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(address.ip().to_string())
            .port(config.port)
            .tls(tls)
            .timeout(Some(Duration::from_secs(config.connect_timeout_secs)))
            .pool_config(pool);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        tracing::info!(
            host = %config.host,
            address = %address,
            pool_max_size = config.pool_max_size,
            "SMTP relay transport configured"
        );

        Ok(Self {
            transport: builder.build(),
            from: parse_mailbox(from)?,
            greeting_timeout: Duration::from_secs(config.greeting_timeout_secs),
        })
    }

    async fn build_message(&self, message: &EmailMessage) -> Result<Message, TransportError> {
        let body = MultiPart::alternative_plain_html(message.text.clone(), message.html.clone());

        let builder = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(&message.to)?)
            .subject(message.subject.clone());

        let built = if message.attachments.is_empty() {
            builder.multipart(body)
        } else {
            let mut mixed = MultiPart::mixed().multipart(body);
            for attachment in &message.attachments {
                let content_type = ContentType::parse(&attachment.content_type)
                    .map_err(|e| TransportError::Message(e.to_string()))?;
                mixed = mixed.singlepart(
                    Attachment::new(attachment.filename.clone())
                        .body(attachment.load().await?, content_type),
                );
            }
            builder.multipart(mixed)
        };

        built.map_err(|e| TransportError::Message(e.to_string()))
    }
}

#[async_trait]
impl EmailTransport for SmtpRelayTransport {
    async fn send(&self, message: &EmailMessage) -> Result<EmailReceipt, TransportError> {
        let email = self.build_message(message).await?;
        let response = self.transport.send(email).await?;

        Ok(EmailReceipt {
            route: EmailRoute::Relay,
            message_id: response.first_line().map(str::to_string),
        })
    }
}

#[async_trait]
impl RelayTransport for SmtpRelayTransport {
    async fn verify(&self) -> Result<(), TransportError> {
        match tokio::time::timeout(self.greeting_timeout, self.transport.test_connection()).await {
            Ok(Ok(true)) => Ok(()),
            Ok(Ok(false)) => Err(TransportError::Unavailable("relay rejected handshake".to_string())),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(TransportError::Timeout("SMTP greeting")),
        }
    }
}

pub(crate) fn parse_mailbox(address: &str) -> Result<Mailbox, TransportError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| TransportError::InvalidAddress(format!("{address}: {e}")))
}

/// Resolve `host` and keep the first IPv4 address
async fn resolve_ipv4(host: &str, port: u16, timeout: Duration) -> Result<SocketAddr, TransportError> {
    let addresses = tokio::time::timeout(timeout, tokio::net::lookup_host((host, port)))
        .await
        .map_err(|_| TransportError::Timeout("SMTP relay name resolution"))?
        .map_err(|e| TransportError::Unresolvable(format!("{host}: {e}")))?;

    addresses
        .into_iter()
        .find(SocketAddr::is_ipv4)
        .ok_or_else(|| TransportError::Unresolvable(format!("{host}: no IPv4 address")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_ipv4_literal() {
        let address = resolve_ipv4("127.0.0.1", 2525, Duration::from_secs(1)).await.unwrap();
        assert_eq!(address, "127.0.0.1:2525".parse::<SocketAddr>().unwrap());
    }

    #[tokio::test]
    async fn test_resolve_ipv6_only_literal_fails() {
        let result = resolve_ipv4("::1", 2525, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(TransportError::Unresolvable(_))));
    }

    #[test]
    fn test_parse_mailbox_with_display_name() {
        let mailbox = parse_mailbox("Panda Shop <shop@example.com>").unwrap();
        assert_eq!(mailbox.email.to_string(), "shop@example.com");
        assert!(parse_mailbox("not an address").is_err());
    }
}
