use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::Config;

/// Outcome of a reset-mail attempt. The forgot-password route words its
/// response off this, never off whether the account exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    NotConfigured,
    Failed,
}

/// SMTP mailer for password-reset links. Without EMAIL_USER/EMAIL_PASS the
/// transport is absent and callers fall back to the logged URL.
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Option<String>,
}

impl Mailer {
    pub fn from_config(config: &Config) -> Self {
        if !config.mail_configured() {
            return Mailer {
                transport: None,
                from: None,
            };
        }

        let user = config.email_user.clone().unwrap_or_default();
        let pass = config.email_pass.clone().unwrap_or_default();

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map(|builder| {
                builder
                    .credentials(Credentials::new(user.clone(), pass))
                    .build()
            })
            .map_err(|e| tracing::error!("❌ SMTP relay setup failed: {e}"))
            .ok();

        Mailer {
            transport,
            from: Some(user),
        }
    }

    pub async fn send_reset(&self, to: &str, reset_url: &str) -> SendOutcome {
        let (Some(transport), Some(from)) = (&self.transport, &self.from) else {
            tracing::warn!(
                "⚠️ EMAIL_USER or EMAIL_PASS not set. Skipping email send. Use the reset URL from the logs."
            );
            return SendOutcome::NotConfigured;
        };

        let (Ok(from), Ok(to_addr)) = (from.parse::<Mailbox>(), to.parse::<Mailbox>()) else {
            tracing::error!("❌ invalid mail address, skipping send");
            return SendOutcome::Failed;
        };

        let body = format!(
            "You requested a password reset.\n\nClick this link to set a new password (valid for 1 hour):\n\n{reset_url}\n\nIf you did not request this, you can ignore this email."
        );

        let message = match Message::builder()
            .from(from)
            .to(to_addr)
            .subject("Reset your password - FemWell")
            .body(body)
        {
            Ok(m) => m,
            Err(e) => {
                tracing::error!("❌ failed to build reset mail: {e}");
                return SendOutcome::Failed;
            }
        };

        match transport.send(message).await {
            Ok(_) => {
                tracing::info!("✅ Reset email sent to: {to}");
                SendOutcome::Sent
            }
            Err(e) => {
                tracing::error!("❌ Email send error: {e}");
                SendOutcome::Failed
            }
        }
    }
}
