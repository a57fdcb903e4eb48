//! Configuration types.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Twilio WhatsApp credentials and sender number.
#[derive(Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: SecretString,
    /// Sender address, e.g. `whatsapp:+14155238886`.
    pub from_number: String,
}

impl TwilioConfig {
    /// Build config from environment variables.
    /// Returns `None` if `TWILIO_ACCOUNT_SID` is not set (outbound disabled).
    pub fn from_env() -> Option<Self> {
        let account_sid = std::env::var("TWILIO_ACCOUNT_SID").ok()?;
        let auth_token = std::env::var("TWILIO_AUTH_TOKEN").unwrap_or_default();
        let from_number = std::env::var("TWILIO_WHATSAPP_NUMBER").unwrap_or_default();
        Some(Self {
            account_sid,
            auth_token: SecretString::from(auth_token),
            from_number,
        })
    }
}

/// Conversation policy knobs.
#[derive(Debug, Clone)]
pub struct ConvoPolicy {
    /// Phrase that restarts the session from any state (exact match,
    /// case-insensitive, trimmed).
    pub restart_phrase: String,
    /// Whether `reset` also clears the profile draft. When false the draft
    /// survives a reset and a fresh session picks it back up.
    pub reset_clears_draft: bool,
}

impl Default for ConvoPolicy {
    fn default() -> Self {
        Self {
            restart_phrase: "hi".to_string(),
            reset_clears_draft: false,
        }
    }
}

/// Engine configuration, sourced from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen port for the webhook server.
    pub port: u16,
    /// Path to the libSQL database file.
    pub db_path: String,
    /// Token Meta sends back during webhook verification.
    pub verify_token: String,
    /// Directory published portfolio artifacts are written into.
    pub out_dir: String,
    /// Public base URL prefixed onto published artifact paths.
    pub public_base_url: String,
    /// Headless browser binary used for PDF rendering.
    pub chromium_bin: String,
    /// Optional GitHub API token for higher rate limits.
    pub github_token: Option<String>,
    pub policy: ConvoPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port: u16 = std::env::var("FOLIOBOT_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        let db_path = std::env::var("FOLIOBOT_DB_PATH")
            .unwrap_or_else(|_| "./data/foliobot.db".to_string());

        let verify_token = std::env::var("WHATSAPP_VERIFY_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("WHATSAPP_VERIFY_TOKEN".to_string()))?;

        let out_dir =
            std::env::var("FOLIOBOT_OUT_DIR").unwrap_or_else(|_| "./data/portfolios".to_string());

        let public_base_url = std::env::var("FOLIOBOT_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}/portfolios"));

        let chromium_bin =
            std::env::var("FOLIOBOT_CHROMIUM_BIN").unwrap_or_else(|_| "chromium".to_string());

        let github_token = std::env::var("GITHUB_TOKEN").ok();

        let restart_phrase =
            std::env::var("FOLIOBOT_RESTART_PHRASE").unwrap_or_else(|_| "hi".to_string());
        if restart_phrase.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "FOLIOBOT_RESTART_PHRASE".to_string(),
                message: "restart phrase must be non-empty".to_string(),
            });
        }

        let reset_clears_draft = std::env::var("FOLIOBOT_RESET_CLEARS_DRAFT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(false);

        Ok(Self {
            port,
            db_path,
            verify_token,
            out_dir,
            public_base_url,
            chromium_bin,
            github_token,
            policy: ConvoPolicy {
                restart_phrase,
                reset_clears_draft,
            },
        })
    }
}
