//! Transactional email delivery
//!
//! Registration mails the generated password to the new user. Delivery goes
//! through the Mandrill `messages/send` endpoint; when no API key is
//! configured the notifier logs and skips sending.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Mail configuration
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Mandrill API key; sending is disabled when absent
    pub api_key: Option<String>,
    pub sender_email: String,
    /// Base URL of the Mandrill API
    pub api_url: String,
}

impl MailConfig {
    /// Create a new MailConfig from environment variables
    ///
    /// # Environment Variables
    /// - `MANDRILL_API_KEY`: API key (optional)
    /// - `MANDRILL_SENDER_EMAIL`: From address (default: "no-reply@clipshare.local")
    /// - `MANDRILL_API_URL`: API base URL (default: "https://mandrillapp.com/api/1.0")
    pub fn from_env() -> Self {
        MailConfig {
            api_key: std::env::var("MANDRILL_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            sender_email: std::env::var("MANDRILL_SENDER_EMAIL")
                .unwrap_or_else(|_| "no-reply@clipshare.local".to_string()),
            api_url: std::env::var("MANDRILL_API_URL")
                .unwrap_or_else(|_| "https://mandrillapp.com/api/1.0".to_string()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Email delivery errors
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Email request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Email provider rejected the message to {email}: {reason}")]
    Rejected { email: String, reason: String },
}

/// A plain-text email
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// The account-details mail sent after registration
pub fn account_created_email(to: &str, password: &str, login_url: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: "Your Account Details".to_string(),
        text: format!(
            "Your account has been created successfully.\n\n\
             Your temporary password is: {password}\n\n\
             Please log in using the following link: {login_url}\n"
        ),
    }
}

/// Something that can deliver an email
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotifyError>;
}

#[derive(Serialize)]
struct SendRequest<'a> {
    key: &'a str,
    message: MandrillMessage<'a>,
}

#[derive(Serialize)]
struct MandrillMessage<'a> {
    from_email: &'a str,
    subject: &'a str,
    text: &'a str,
    to: Vec<Recipient<'a>>,
}

#[derive(Serialize)]
struct Recipient<'a> {
    email: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResult {
    email: String,
    status: String,
    #[serde(default)]
    reject_reason: Option<String>,
}

/// Mandrill-backed [`Notifier`]
#[derive(Clone)]
pub struct MandrillNotifier {
    client: reqwest::Client,
    config: MailConfig,
}

impl MandrillNotifier {
    pub fn new(config: MailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl Notifier for MandrillNotifier {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotifyError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            warn!("Email not configured, skipping message to {}", email.to);
            return Ok(());
        };

        let request = SendRequest {
            key: api_key,
            message: MandrillMessage {
                from_email: &self.config.sender_email,
                subject: &email.subject,
                text: &email.text,
                to: vec![Recipient {
                    email: &email.to,
                    kind: "to",
                }],
            },
        };

        let results: Vec<SendResult> = self
            .client
            .post(format!(
                "{}/messages/send",
                self.config.api_url.trim_end_matches('/')
            ))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(failed) = results
            .iter()
            .find(|r| r.status == "rejected" || r.status == "invalid")
        {
            return Err(NotifyError::Rejected {
                email: failed.email.clone(),
                reason: failed
                    .reject_reason
                    .clone()
                    .unwrap_or_else(|| failed.status.clone()),
            });
        }

        info!("Email sent to {}", email.to);
        Ok(())
    }
}
