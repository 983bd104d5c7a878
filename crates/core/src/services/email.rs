//! Email notification service.

use chrono::{DateTime, FixedOffset};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use civica_common::{AppError, AppResult, EmailConfig};

/// Email message to be sent.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    /// Recipient email address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain text body
    pub body: String,
}

impl EmailMessage {
    /// Mail sent when an official closes a report with a reason.
    #[must_use]
    pub fn report_closed(
        to: &str,
        token: &str,
        filed_at: DateTime<FixedOffset>,
        reason: &str,
    ) -> Self {
        Self {
            to: to.to_string(),
            subject: "Report closed by admin action".to_string(),
            body: format!(
                "Your post with Ref. No. {token} posted on {filed_at}, has been closed by \
                 Admin action. With the following reason: {reason}",
            ),
        }
    }

    /// Mail sent when an official resolves a report.
    #[must_use]
    pub fn report_resolved(
        to: &str,
        token: &str,
        filed_at: DateTime<FixedOffset>,
        credited: i32,
    ) -> Self {
        Self {
            to: to.to_string(),
            subject: "Report resolved by admin action".to_string(),
            body: format!(
                "Your post with Ref. No. {token} posted on {filed_at}, has been resolved by \
                 Admin action. Thanks for supporting the government with this initiative. You \
                 have been credited {credited} points which you can redeem on Civica API \
                 supported authorities like toll taxes.",
            ),
        }
    }

    /// Mail sent when an official marks a report as spam.
    #[must_use]
    pub fn report_spammed(to: &str, token: &str, filed_at: DateTime<FixedOffset>) -> Self {
        Self {
            to: to.to_string(),
            subject: "Report spammed by admin action".to_string(),
            body: format!(
                "Your post with Ref. No. {token} posted on {filed_at}, has been marked \
                 spammed by Admin action.",
            ),
        }
    }
}

/// Email service backed by an SMTP transport.
///
/// Constructed without configuration the service is disabled: delivery jobs
/// log and drop their messages instead of failing the pipeline.
#[derive(Clone)]
pub struct EmailService {
    config: Option<EmailConfig>,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl EmailService {
    /// Create a new email service.
    pub fn new(config: Option<EmailConfig>) -> AppResult<Self> {
        let transport = match &config {
            Some(cfg) => Some(build_transport(cfg)?),
            None => None,
        };

        Ok(Self { config, transport })
    }

    /// Create a disabled email service.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            config: None,
            transport: None,
        }
    }

    /// Check if email service is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Send an email.
    pub async fn send(&self, message: EmailMessage) -> AppResult<()> {
        let (Some(config), Some(transport)) = (&self.config, &self.transport) else {
            return Err(AppError::BadRequest(
                "Email service not configured".to_string(),
            ));
        };

        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_address)
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid from address: {e}")))?;
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| AppError::Email(format!("Invalid recipient address: {e}")))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.body)
            .map_err(|e| AppError::Email(e.to_string()))?;

        transport
            .send(email)
            .await
            .map_err(|e| AppError::Email(e.to_string()))?;

        Ok(())
    }
}

fn build_transport(config: &EmailConfig) -> AppResult<AsyncSmtpTransport<Tokio1Executor>> {
    let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        .map_err(|e| AppError::Config(format!("Invalid SMTP host: {e}")))?
        .port(config.port);

    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
    }

    Ok(builder.build())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn filed_at() -> DateTime<FixedOffset> {
        "2025-06-01T12:00:00+00:00".parse().unwrap()
    }

    #[test]
    fn test_report_closed_template() {
        let message =
            EmailMessage::report_closed("citizen@example.com", "abcd1234efgh", filed_at(), "duplicate report");

        assert_eq!(message.subject, "Report closed by admin action");
        assert!(message.body.contains("Ref. No. abcd1234efgh"));
        assert!(message.body.contains("With the following reason: duplicate report"));
    }

    #[test]
    fn test_report_resolved_template() {
        let message = EmailMessage::report_resolved("citizen@example.com", "abcd1234", filed_at(), 20);

        assert_eq!(message.subject, "Report resolved by admin action");
        assert!(message.body.contains("credited 20 points"));
    }

    #[test]
    fn test_report_spammed_template() {
        let message = EmailMessage::report_spammed("citizen@example.com", "abcd1234", filed_at());

        assert_eq!(message.subject, "Report spammed by admin action");
        assert!(message.body.contains("marked spammed by Admin action"));
    }

    #[test]
    fn test_disabled_service() {
        let service = EmailService::disabled();
        assert!(!service.is_enabled());
    }

    #[tokio::test]
    async fn test_send_without_config_fails() {
        let service = EmailService::disabled();
        let result = service
            .send(EmailMessage::report_spammed("citizen@example.com", "abcd1234", filed_at()))
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
