//! Outbound messaging — send-text capability over the Twilio WhatsApp API.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::TwilioConfig;
use crate::error::SendError;

/// Twilio error code for the daily message quota on trial accounts.
const TWILIO_DAILY_LIMIT_CODE: i64 = 63038;

/// Outcome of a send attempt. A quota condition is expected and non-fatal;
/// the caller logs it and moves on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    QuotaExceeded,
}

/// Send-text capability, injected into the router.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, to: &str, body: &str) -> Result<SendOutcome, SendError>;
}

#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

/// Twilio-backed messenger for WhatsApp.
pub struct TwilioMessenger {
    config: TwilioConfig,
    client: reqwest::Client,
}

impl TwilioMessenger {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self) -> String {
        format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.config.account_sid
        )
    }
}

#[async_trait]
impl Messenger for TwilioMessenger {
    async fn send_text(&self, to: &str, body: &str) -> Result<SendOutcome, SendError> {
        if self.config.from_number.is_empty() {
            return Err(SendError::NotConfigured(
                "TWILIO_WHATSAPP_NUMBER not set".to_string(),
            ));
        }

        let form = [
            ("From", self.config.from_number.as_str()),
            ("To", to),
            ("Body", body),
        ];

        let resp = self
            .client
            .post(self.api_url())
            .basic_auth(
                &self.config.account_sid,
                Some(self.config.auth_token.expose_secret()),
            )
            .form(&form)
            .send()
            .await
            .map_err(|e| SendError::SendFailed {
                to: to.to_string(),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            info!(to, "Message sent");
            return Ok(SendOutcome::Sent);
        }

        let status = resp.status();
        let err_body: TwilioErrorBody = resp.json().await.unwrap_or(TwilioErrorBody {
            code: None,
            message: None,
        });

        if err_body.code == Some(TWILIO_DAILY_LIMIT_CODE) {
            warn!(to, "Daily message limit exceeded; dropping outbound message");
            return Ok(SendOutcome::QuotaExceeded);
        }

        Err(SendError::SendFailed {
            to: to.to_string(),
            reason: format!(
                "Twilio returned {status}: {}",
                err_body.message.unwrap_or_default()
            ),
        })
    }
}
