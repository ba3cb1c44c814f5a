//! Email service for sending transactional emails.
//!
//! Uses `lettre` for SMTP transport.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;

use crate::config::EmailConfig;

/// Email service errors.
#[derive(Debug, Error)]
pub enum EmailError {
    /// Failed to build email message.
    #[error("Failed to build email: {0}")]
    BuildError(String),
    /// Failed to send email.
    #[error("Failed to send email: {0}")]
    SendError(String),
    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Email service for sending transactional emails.
#[derive(Debug, Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    /// Creates a new email service.
    #[must_use]
    pub const fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Minutes a password reset code stays valid.
    #[must_use]
    pub const fn otp_expiry_minutes(&self) -> i64 {
        self.config.otp_expiry_minutes
    }

    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let builder = if self.config.smtp_username.is_empty() {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
                .map_err(|e| EmailError::SendError(e.to_string()))?
                .credentials(Credentials::new(
                    self.config.smtp_username.clone(),
                    self.config.smtp_password.clone(),
                ))
        };

        Ok(builder.port(self.config.smtp_port).build())
    }

    /// Sends a password reset code.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be built or sent.
    pub async fn send_password_reset_otp(
        &self,
        to_email: &str,
        to_name: &str,
        otp: &str,
    ) -> Result<(), EmailError> {
        let body = password_reset_body(to_name, otp, self.config.otp_expiry_minutes);
        self.send_email(to_email, "Password Reset OTP - Expense Tracker", &body)
            .await
    }

    /// Builds a plain-text message from the configured sender.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::InvalidAddress` for unparsable addresses and
    /// `EmailError::BuildError` if the message cannot be assembled.
    pub fn build_message(
        &self,
        to_email: &str,
        subject: &str,
        body: &str,
    ) -> Result<Message, EmailError> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        Message::builder()
            .from(
                from.parse()
                    .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| EmailError::BuildError(e.to_string()))
    }

    /// Sends a generic email.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        let email = self.build_message(to_email, subject, body)?;

        let transport = self.create_transport()?;
        transport
            .send(email)
            .await
            .map_err(|e| EmailError::SendError(e.to_string()))?;

        tracing::debug!(to = %to_email, subject, "email sent");
        Ok(())
    }
}

fn password_reset_body(to_name: &str, otp: &str, expiry_minutes: i64) -> String {
    format!(
        r"Hi {to_name},

We received a request to reset your password. Use the code below to continue:

    {otp}

This code will expire in {expiry_minutes} minutes.

If you didn't request a password reset, you can safely ignore this email.

Best regards,
Expense Tracker"
    )
}
