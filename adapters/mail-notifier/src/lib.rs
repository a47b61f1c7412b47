//! mail-notifier — Notifier adapters for reviewer notifications.
//!
//! Purpose
//! - `MailApiNotifier`: deliver the reviewer message through an HTTP mail
//!   delivery API (`POST` JSON `{from, to, subject, text, html}` with a bearer
//!   token). The response body is returned as the delivery receipt.
//! - `LogNotifier`: local development sink that only writes the message to
//!   the log.
//!
//! Environment (`MailSettings::from_env`)
//! - `MAIL_API_URL`, `MAIL_API_TOKEN`, `MAIL_FROM`, `MAIL_TO` (all required).

use domain::{DeliveryReceipt, Notification, Notifier, NotifyError};
use reqwest::Url;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MailConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Connection parameters for the mail delivery API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSettings {
    pub api_url: Url,
    pub api_token: String,
    pub from: String,
    pub to: String,
}

impl MailSettings {
    pub fn from_env() -> Result<Self, MailConfigError> {
        Self::from_vars(|k| std::env::var(k).ok())
    }

    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self, MailConfigError> {
        let required = |name: &'static str| {
            get(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(MailConfigError::Missing(name))
        };

        let raw_url = required("MAIL_API_URL")?;
        let api_url = Url::parse(&raw_url).map_err(|e| MailConfigError::Invalid {
            field: "MAIL_API_URL",
            message: format!("'{}': {}", raw_url, e),
        })?;
        let from = required("MAIL_FROM")?;
        let to = required("MAIL_TO")?;
        for (field, addr) in [("MAIL_FROM", &from), ("MAIL_TO", &to)] {
            if !addr.contains('@') {
                return Err(MailConfigError::Invalid {
                    field,
                    message: "not an email address".into(),
                });
            }
        }

        Ok(Self {
            api_url,
            api_token: required("MAIL_API_TOKEN")?,
            from,
            to,
        })
    }
}

#[derive(Serialize)]
struct MailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
    html: &'a str,
}

#[derive(Debug, Clone)]
pub struct MailApiNotifier {
    client: reqwest::Client,
    settings: MailSettings,
}

impl MailApiNotifier {
    pub fn new(settings: MailSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }

    pub fn from_env() -> Result<Self, MailConfigError> {
        Ok(Self::new(MailSettings::from_env()?))
    }
}

impl Notifier for MailApiNotifier {
    async fn dispatch(&self, message: &Notification) -> Result<DeliveryReceipt, NotifyError> {
        let body = MailRequest {
            from: &self.settings.from,
            to: &self.settings.to,
            subject: &message.subject,
            text: &message.text,
            html: &message.html,
        };
        let response = self
            .client
            .post(self.settings.api_url.clone())
            .bearer_auth(&self.settings.api_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        if !status.is_success() {
            warn!(status = status.as_u16(), body = %text, "mail api rejected message");
            return Err(NotifyError::Rejected(format!("status {}", status.as_u16())));
        }

        let receipt = match text.trim() {
            "" => status.to_string(),
            line => line.to_string(),
        };
        info!(to = %self.settings.to, receipt = %receipt, "reviewer notified");
        Ok(DeliveryReceipt::new(receipt))
    }
}

/// Notifier that only logs. For local development without mail credentials.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub const RECEIPT: &'static str = "logged";
}

impl Notifier for LogNotifier {
    async fn dispatch(&self, message: &Notification) -> Result<DeliveryReceipt, NotifyError> {
        info!(subject = %message.subject, text = %message.text, "notification (log only)");
        Ok(DeliveryReceipt::new(Self::RECEIPT))
    }
}
