//! Daemon settings: optional JSON file plus environment overrides
//!
//! `DYNIP_CONFIG` names a JSON file in the [`PollerConfig`] format. Every
//! other `DYNIP_*` variable overrides the matching field. Empty variables
//! count as unset.

use anyhow::{Context, Result};
use dynip_core::config::{IpVersion, PollerConfig};
use std::env;

pub const CONFIG_VAR: &str = "DYNIP_CONFIG";
pub const HOSTNAME_VAR: &str = "DYNIP_HOSTNAME";
pub const SECRET_VAR: &str = "DYNIP_SECRET";
pub const USERNAME_VAR: &str = "DYNIP_USERNAME";
pub const UPDATE_URL_VAR: &str = "DYNIP_UPDATE_URL";
pub const IP_URL_VAR: &str = "DYNIP_IP_URL";
pub const IP_VERSION_VAR: &str = "DYNIP_IP_VERSION";
pub const SEND_MYIP_VAR: &str = "DYNIP_SEND_MYIP";
pub const INTERVAL_VAR: &str = "DYNIP_INTERVAL_SECS";
pub const TIMEOUT_VAR: &str = "DYNIP_TIMEOUT_SECS";
pub const LOG_LEVEL_VAR: &str = "DYNIP_LOG_LEVEL";

/// Everything the daemon needs to start
#[derive(Debug)]
pub struct Settings {
    pub poller: PollerConfig,
    pub log_level: String,
}

impl Settings {
    /// Load settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut poller = match get(CONFIG_VAR) {
            Some(path) => PollerConfig::from_file(&path)
                .with_context(|| format!("Failed to load {} ({})", CONFIG_VAR, path))?,
            None => PollerConfig::default(),
        };

        if let Some(hostname) = get(HOSTNAME_VAR) {
            poller.provider.hostname = hostname.trim().to_string();
        }
        if let Some(secret) = get(SECRET_VAR) {
            poller.provider.secret = secret;
        }
        if let Some(username) = get(USERNAME_VAR) {
            poller.provider.username = Some(username.trim().to_string());
        }
        if let Some(url) = get(UPDATE_URL_VAR) {
            poller.provider.update_url = url.trim().to_string();
        }
        if let Some(url) = get(IP_URL_VAR) {
            poller.ip_source.url = url.trim().to_string();
        }
        if let Some(version) = get(IP_VERSION_VAR) {
            poller.ip_source.version = version
                .parse::<IpVersion>()
                .with_context(|| format!("Invalid {}", IP_VERSION_VAR))?;
        }
        if let Some(flag) = get(SEND_MYIP_VAR) {
            poller.provider.send_myip = parse_bool(SEND_MYIP_VAR, &flag)?;
        }
        if let Some(secs) = get(INTERVAL_VAR) {
            poller.poll.interval_secs = parse_secs(INTERVAL_VAR, &secs)?;
        }
        if let Some(secs) = get(TIMEOUT_VAR) {
            poller.poll.request_timeout_secs = parse_secs(TIMEOUT_VAR, &secs)?;
        }

        Ok(Self {
            poller,
            log_level: get(LOG_LEVEL_VAR).unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the settings
    ///
    /// On top of [`PollerConfig::validate`] this checks:
    /// - Credentials are present and not an obvious placeholder
    /// - The log level is known
    pub fn validate(&self) -> Result<()> {
        if self.poller.provider.hostname.is_empty() {
            anyhow::bail!(
                "{} is required. Set it via: export {}=myhost.nsupdate.info",
                HOSTNAME_VAR,
                HOSTNAME_VAR
            );
        }

        if self.poller.provider.secret.is_empty() {
            anyhow::bail!(
                "{} is required. Set it via: export {}=your_update_secret",
                SECRET_VAR,
                SECRET_VAR
            );
        }

        // Check for obvious placeholder secrets (common mistake)
        let secret_lower = self.poller.provider.secret.to_lowercase();
        if secret_lower.contains("your_update_secret")
            || secret_lower.contains("replace_me")
            || secret_lower == "changeme"
            || secret_lower == "secret"
        {
            anyhow::bail!(
                "{} appears to be a placeholder. \
                Use the update secret from your DNS provider.",
                SECRET_VAR
            );
        }

        self.poller
            .validate()
            .context("Configuration validation failed")?;

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "{} '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                LOG_LEVEL_VAR,
                self.log_level
            ),
        }

        Ok(())
    }

    /// Non-fatal problems worth a log line at startup
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.poller.provider.update_url.starts_with("http://") {
            warnings.push(format!(
                "Update URL {} uses HTTP (not HTTPS); the update secret is sent unencrypted",
                self.poller.provider.update_url
            ));
        }
        if self.poller.ip_source.url.starts_with("http://") {
            warnings.push(format!(
                "IP source URL {} uses HTTP (not HTTPS); the reported IP can be tampered with",
                self.poller.ip_source.url
            ));
        }

        warnings
    }
}

fn parse_bool(var: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("{} must be true or false. Got: {}", var, other),
    }
}

fn parse_secs(var: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .with_context(|| format!("{} must be a whole number of seconds. Got: {}", var, value))
}
