use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{info, instrument};

use greenlight_config::EmailConfig;

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

impl Email {
    /// Sent on registration with the first activation token.
    pub fn welcome(to: &str, user_id: i64, activation_token: &str, ttl: Duration) -> Self {
        let expires = describe_ttl(ttl);
        let text_body = format!(
            "Hi,\n\n\
             Thanks for signing up for a Greenlight account. We're excited to have you on board!\n\n\
             For future reference, your user ID number is {user_id}.\n\n\
             Please send a request to the `PUT /v1/users/activated` endpoint with the following JSON body to activate your account:\n\n\
             {{\"token\": \"{activation_token}\"}}\n\n\
             Please note that this is a one-time use token and it will expire in {expires}.\n\n\
             Thanks,\n\n\
             The Greenlight Team"
        );
        let html_body = html_template(
            "Welcome to Greenlight",
            &format!(
                "<p>Thanks for signing up for a Greenlight account. We're excited to have you on board!</p>\
                 <p>For future reference, your user ID number is {user_id}.</p>\
                 <p>Please send a request to the <code>PUT /v1/users/activated</code> endpoint with the following JSON body to activate your account:</p>\
                 <pre><code>{{\"token\": \"{activation_token}\"}}</code></pre>\
                 <p>Please note that this is a one-time use token and it will expire in {expires}.</p>"
            ),
        );

        Self {
            to: to.to_string(),
            subject: "Welcome to Greenlight!".to_string(),
            text_body,
            html_body,
        }
    }

    /// Sent when an unactivated user asks for a new activation token.
    pub fn activation(to: &str, activation_token: &str, ttl: Duration) -> Self {
        let expires = describe_ttl(ttl);
        let text_body = format!(
            "Hi,\n\n\
             Please send a `PUT /v1/users/activated` request with the following JSON body to activate your account:\n\n\
             {{\"token\": \"{activation_token}\"}}\n\n\
             Please note that this is a one-time use token and it will expire in {expires}.\n\n\
             Thanks,\n\n\
             The Greenlight Team"
        );
        let html_body = html_template(
            "Activate your Greenlight account",
            &format!(
                "<p>Please send a <code>PUT /v1/users/activated</code> request with the following JSON body to activate your account:</p>\
                 <pre><code>{{\"token\": \"{activation_token}\"}}</code></pre>\
                 <p>Please note that this is a one-time use token and it will expire in {expires}.</p>"
            ),
        );

        Self {
            to: to.to_string(),
            subject: "Activate your Greenlight account".to_string(),
            text_body,
            html_body,
        }
    }

    pub fn password_reset(to: &str, reset_token: &str, ttl: Duration) -> Self {
        let expires = describe_ttl(ttl);
        let text_body = format!(
            "Hi,\n\n\
             Please send a `PUT /v1/users/password` request with the following JSON body to set a new password:\n\n\
             {{\"password\": \"your new password\", \"token\": \"{reset_token}\"}}\n\n\
             Please note that this is a one-time use token and it will expire in {expires}. \
             If you need another token please make a `POST /v1/tokens/password-reset` request.\n\n\
             Thanks,\n\n\
             The Greenlight Team"
        );
        let html_body = html_template(
            "Reset your Greenlight password",
            &format!(
                "<p>Please send a <code>PUT /v1/users/password</code> request with the following JSON body to set a new password:</p>\
                 <pre><code>{{\"password\": \"your new password\", \"token\": \"{reset_token}\"}}</code></pre>\
                 <p>Please note that this is a one-time use token and it will expire in {expires}. \
                 If you need another token please make a <code>POST /v1/tokens/password-reset</code> request.</p>"
            ),
        );

        Self {
            to: to.to_string(),
            subject: "Reset your Greenlight password".to_string(),
            text_body,
            html_body,
        }
    }
}

fn describe_ttl(ttl: Duration) -> String {
    let minutes = ttl.as_secs() / 60;
    match minutes {
        0 => format!("{} seconds", ttl.as_secs()),
        m if m % (24 * 60) == 0 => format!("{} days", m / (24 * 60)),
        m if m % 60 == 0 => format!("{} hours", m / 60),
        m => format!("{m} minutes"),
    }
}

fn html_template(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
</head>
<body style="margin: 0; padding: 0; font-family: Arial, sans-serif; background-color: #f4f4f4;">
    <table width="100%" cellpadding="0" cellspacing="0" style="background-color: #f4f4f4; padding: 20px;">
        <tr>
            <td align="center">
                <table width="600" cellpadding="0" cellspacing="0" style="background-color: #ffffff; border-radius: 8px;">
                    <tr>
                        <td style="background-color: #15803D; padding: 30px; text-align: center;">
                            <h1 style="margin: 0; color: #ffffff; font-size: 28px;">Greenlight</h1>
                        </td>
                    </tr>
                    <tr>
                        <td style="padding: 40px 30px; color: #444444; font-size: 16px; line-height: 1.5;">
                            <p>Hi,</p>
                            {content}
                            <p>Thanks,</p>
                            <p>The Greenlight Team</p>
                        </td>
                    </tr>
                </table>
            </td>
        </tr>
    </table>
</body>
</html>"#
    )
}

/// Outbound mail delivery.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> anyhow::Result<()>;
}

/// Delivers through an SMTP relay.
pub struct SmtpMailer {
    sender: Mailbox,
    transport: SmtpTransport,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> anyhow::Result<Self> {
        let sender = config
            .sender
            .parse()
            .with_context(|| format!("invalid smtp sender {:?}", config.sender))?;

        let transport = if config.username.is_empty() {
            SmtpTransport::builder_dangerous(&config.host)
                .port(config.port)
                .timeout(Some(Duration::from_secs(5)))
                .build()
        } else {
            SmtpTransport::relay(&config.host)
                .context("failed to create SMTP relay")?
                .port(config.port)
                .credentials(Credentials::new(
                    config.username.clone(),
                    config.password.clone(),
                ))
                .timeout(Some(Duration::from_secs(5)))
                .build()
        };

        Ok(Self { sender, transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[instrument(skip(self, email), fields(to = %email.to, subject = %email.subject))]
    async fn send(&self, email: Email) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.sender.clone())
            .to(email.to.parse().context("invalid recipient")?)
            .subject(email.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(email.text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(email.html_body),
                    ),
            )
            .context("failed to build email")?;

        let transport = self.transport.clone();
        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .context("mail task failed")?
            .context("failed to send email")?;

        Ok(())
    }
}

/// Used when SMTP is disabled. Logs the envelope and drops the message; the
/// body is never logged since it carries a token.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> anyhow::Result<()> {
        info!(to = %email.to, subject = %email.subject, "smtp disabled, email not delivered");
        Ok(())
    }
}

/// Keeps every message in memory for inspection.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<Email>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: Email) -> anyhow::Result<()> {
        self.sent
            .lock()
            .map_err(|_| anyhow::anyhow!("mailbox lock poisoned"))?
            .push(email);
        Ok(())
    }
}

/// Picks the SMTP mailer when enabled and the logging one otherwise.
pub fn mailer_from_config(config: &EmailConfig) -> anyhow::Result<std::sync::Arc<dyn Mailer>> {
    if config.enabled {
        Ok(std::sync::Arc::new(SmtpMailer::new(config)?))
    } else {
        Ok(std::sync::Arc::new(LogMailer))
    }
}
