//! DailySend configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{DailySendError, Result};

/// Overrides `whatsapp.access_token` when set and non-empty.
pub const TOKEN_ENV: &str = "DAILYSEND_WHATSAPP_TOKEN";

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySendConfig {
    /// Destination for the end-of-run report (local number, no country code).
    #[serde(default)]
    pub report_number: String,
    /// Maximum contacts processed per calendar day.
    #[serde(default = "default_daily_limit")]
    pub daily_limit: usize,
    /// Pacing interval between consecutive sends.
    #[serde(default = "default_delay_minutes")]
    pub delay_minutes: f64,
    /// Save progress after this many processed contacts.
    #[serde(default = "default_checkpoint_every")]
    pub checkpoint_every: usize,
    /// Required digit count of a normalized phone number.
    #[serde(default = "default_phone_digits")]
    pub phone_digits: usize,
    /// Prefix added by the transport to build the international address.
    #[serde(default = "default_country_code")]
    pub country_code: String,
    /// Directory holding the contact CSV files and the attachment.
    #[serde(default = "default_source_dir")]
    pub source_dir: String,
    /// File name conventions, tried in order; the first that matches wins.
    #[serde(default = "default_source_patterns")]
    pub source_patterns: Vec<String>,
    #[serde(default = "default_progress_path")]
    pub progress_path: String,
    /// Explicit attachment; when unset the first image in `source_dir` is used.
    #[serde(default)]
    pub attachment: Option<String>,
    #[serde(default)]
    pub message: MessageConfig,
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
}

fn default_daily_limit() -> usize { 500 }
fn default_delay_minutes() -> f64 { 1.0 }
fn default_checkpoint_every() -> usize { 10 }
fn default_phone_digits() -> usize { 10 }
fn default_country_code() -> String { "91".into() }
fn default_source_dir() -> String { ".".into() }
fn default_source_patterns() -> Vec<String> {
    vec!["SDB (*.csv", "SDB*.csv", "contacts*.csv"]
        .into_iter().map(String::from).collect()
}
fn default_progress_path() -> String { "progress.json".into() }

impl Default for DailySendConfig {
    fn default() -> Self {
        Self {
            report_number: String::new(),
            daily_limit: default_daily_limit(),
            delay_minutes: default_delay_minutes(),
            checkpoint_every: default_checkpoint_every(),
            phone_digits: default_phone_digits(),
            country_code: default_country_code(),
            source_dir: default_source_dir(),
            source_patterns: default_source_patterns(),
            progress_path: default_progress_path(),
            attachment: None,
            message: MessageConfig::default(),
            whatsapp: WhatsAppConfig::default(),
        }
    }
}

impl DailySendConfig {
    /// Load config from the default path (./dailysend.toml), falling back to defaults.
    pub fn load() -> Result<Self> {
        Self::load_or_default(&Self::default_path(), env_var)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::parse_file(path)?.finish(env_var)
    }

    /// Missing file means defaults; env overrides and validation apply either way.
    fn load_or_default(path: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config = if path.exists() {
            Self::parse_file(path)?
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Self::default()
        };
        config.finish(env)
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DailySendError::Config(format!("Failed to read config: {e}")))?;
        let config = toml::from_str(&content)
            .map_err(|e| DailySendError::Config(format!("Failed to parse config: {e}")))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn finish(mut self, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        self.apply_env(env);
        self.validate()?;
        Ok(self)
    }

    /// Default config path.
    pub fn default_path() -> PathBuf {
        PathBuf::from("dailysend.toml")
    }

    /// Secrets may come from the environment instead of the file.
    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(token) = env(TOKEN_ENV)
            && !token.is_empty()
        {
            self.whatsapp.access_token = token;
        }
    }

    /// Reject settings the scheduler cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.daily_limit == 0 {
            return Err(DailySendError::Config("daily_limit must be at least 1".into()));
        }
        if self.checkpoint_every == 0 {
            return Err(DailySendError::Config("checkpoint_every must be at least 1".into()));
        }
        if self.phone_digits == 0 {
            return Err(DailySendError::Config("phone_digits must be at least 1".into()));
        }
        if !self.delay_minutes.is_finite() || self.delay_minutes < 0.0 {
            return Err(DailySendError::Config(format!(
                "delay_minutes must be a non-negative number, got {}",
                self.delay_minutes
            )));
        }
        if self.source_patterns.is_empty() {
            return Err(DailySendError::Config("source_patterns must not be empty".into()));
        }
        Ok(())
    }

    /// Pacing interval as a duration.
    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay_minutes * 60.0)
    }

    pub fn source_dir_path(&self) -> PathBuf {
        expand(&self.source_dir)
    }

    pub fn progress_path_buf(&self) -> PathBuf {
        expand(&self.progress_path)
    }

    pub fn attachment_path(&self) -> Option<PathBuf> {
        self.attachment.as_deref().map(expand)
    }
}

fn expand(p: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(p).to_string())
}

/// Message template configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageConfig {
    /// Body with `{name}` and `{code}` placeholders.
    #[serde(default = "default_template")]
    pub template: String,
    /// Used for `{name}` when the contact name has no usable word.
    #[serde(default = "default_fallback_name")]
    pub fallback_name: String,
}

fn default_template() -> String {
    "👋 Hello {name}\n\nReply to this number to hear about local news, offers and job updates.\n\n~{code}~".into()
}
fn default_fallback_name() -> String { "friend".into() }

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            template: default_template(),
            fallback_name: default_fallback_name(),
        }
    }
}

/// WhatsApp Business Cloud API credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    /// Facebook Graph API access token
    #[serde(default)]
    pub access_token: String,
    /// WhatsApp Phone Number ID
    #[serde(default)]
    pub phone_number_id: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

fn default_api_version() -> String { "v21.0".into() }

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            phone_number_id: String::new(),
            api_version: default_api_version(),
        }
    }
}
