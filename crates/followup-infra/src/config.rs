//! Runtime settings loaded from the process environment.
//!
//! Every deployment knob the server needs lives here. Secrets are wrapped
//! in [`SecretString`] so they never end up in debug output or logs.

use secrecy::SecretString;

/// Name of the environment the server runs in (`development`, `production`).
const DEFAULT_APP_ENV: &str = "development";

/// Model used for follow-up suggestions unless overridden.
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Follow Up Boss REST API base.
const DEFAULT_FUB_API_BASE: &str = "https://api.followupboss.com";

/// Per-account requests per minute.
const DEFAULT_RATE_LIMIT_RPM: u32 = 10;

/// Per-IP requests per minute.
const DEFAULT_RATE_LIMIT_RPM_IP: u32 = 100;

/// Errors raised while assembling [`Settings`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {name}: {reason}")]
    InvalidVar { name: &'static str, reason: String },
}

/// All configuration the server reads at startup.
#[derive(Clone)]
pub struct Settings {
    pub app_env: String,
    pub bind_addr: String,
    pub database_url: String,
    pub frontend_embed_origin: String,
    pub marketing_origin: Option<String>,
    pub fub_api_base: String,
    pub fub_client_id: String,
    pub fub_client_secret: SecretString,
    pub fub_embed_secret: SecretString,
    pub jwt_secret: SecretString,
    pub openai_api_key: SecretString,
    pub openai_model: String,
    pub stripe_secret_key: SecretString,
    pub stripe_webhook_secret: SecretString,
    pub stripe_price_id_monthly: String,
    pub rate_limit_rpm: u32,
    pub rate_limit_rpm_ip: u32,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingVar(name))
        };
        let secret = |name: &'static str| -> Result<SecretString, ConfigError> {
            required(name).map(SecretString::from)
        };
        let parsed_u32 = |name: &'static str, default: u32| -> Result<u32, ConfigError> {
            match lookup(name) {
                None => Ok(default),
                Some(raw) => raw.parse().map_err(|e| ConfigError::InvalidVar {
                    name,
                    reason: format!("{e}"),
                }),
            }
        };

        Ok(Self {
            app_env: lookup("APP_ENV").unwrap_or_else(|| DEFAULT_APP_ENV.to_string()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8000".to_string()),
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(crate::sqlite::pool::default_database_url),
            frontend_embed_origin: required("FRONTEND_EMBED_ORIGIN")?,
            marketing_origin: lookup("MARKETING_ORIGIN").filter(|v| !v.is_empty()),
            fub_api_base: lookup("FUB_API_BASE")
                .unwrap_or_else(|| DEFAULT_FUB_API_BASE.to_string()),
            fub_client_id: required("FUB_CLIENT_ID")?,
            fub_client_secret: secret("FUB_CLIENT_SECRET")?,
            fub_embed_secret: secret("FUB_EMBED_SECRET")?,
            jwt_secret: secret("JWT_SECRET")?,
            openai_api_key: secret("OPENAI_API_KEY")?,
            openai_model: lookup("OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            stripe_secret_key: secret("STRIPE_SECRET_KEY")?,
            stripe_webhook_secret: secret("STRIPE_WEBHOOK_SECRET")?,
            stripe_price_id_monthly: required("STRIPE_PRICE_ID_MONTHLY")?,
            rate_limit_rpm: parsed_u32("RATE_LIMIT_RPM", DEFAULT_RATE_LIMIT_RPM)?,
            rate_limit_rpm_ip: parsed_u32("RATE_LIMIT_RPM_IP", DEFAULT_RATE_LIMIT_RPM_IP)?,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }
}
