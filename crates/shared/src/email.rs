//! Email service for sending transactional emails.
//!
//! Uses `lettre` for SMTP transport. The only message the ledger sends is
//! the deferred-transfer notice to a recipient who has no account yet; it is
//! always best-effort at the call site.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType, transport::smtp::authentication::Credentials,
};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::types::money::format_amount;

/// Email service errors.
#[derive(Debug, Error)]
pub enum EmailError {
    /// Failed to build email message.
    #[error("Failed to build email: {0}")]
    Build(String),
    /// Failed to send email.
    #[error("Failed to send email: {0}")]
    Send(String),
    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    /// Creates a new email service.
    #[must_use]
    pub const fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Creates an SMTP transport.
    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let creds = Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| EmailError::Send(e.to_string()))?
            .port(self.config.smtp_port)
            .credentials(creds)
            .build();

        Ok(transport)
    }

    /// Sends a notice that money is waiting for the recipient.
    ///
    /// Sent when a transfer is deferred because the destination email does
    /// not resolve to an account yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be built or sent.
    pub async fn send_transfer_email(
        &self,
        to_email: &str,
        amount: Decimal,
        description: Option<&str>,
        sender_name: Option<&str>,
        sender_email: Option<&str>,
    ) -> Result<(), EmailError> {
        let sender = match (sender_name, sender_email) {
            (Some(name), Some(email)) => format!("{name} ({email})"),
            (Some(name), None) => name.to_string(),
            (None, Some(email)) => email.to_string(),
            (None, None) => "Someone".to_string(),
        };

        let subject = format!("You received a transfer of {}", format_amount(amount));
        let reference = description.map_or(String::new(), |d| format!("\nReference: {d}\n"));
        let body = format!(
            r"Hello,

{sender} sent you {amount} through Centime.
{reference}
The money is waiting for you. Create an account with this email address to
receive it, and the transfer will be credited automatically.

Best regards,
The Centime Team",
            amount = format_amount(amount),
        );

        let message = Message::builder()
            .from(
                format!("{} <{}>", self.config.from_name, self.config.from_address)
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.config.from_address.clone()))?,
            )
            .to(to_email
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to_email.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| EmailError::Build(e.to_string()))?;

        let transport = self.create_transport()?;
        transport
            .send(message)
            .await
            .map_err(|e| EmailError::Send(e.to_string()))?;

        Ok(())
    }
}
