//! Configuration types for the poller
//!
//! This module defines all configuration structures used throughout the
//! workspace. Every field has a default so a JSON file may set only part of
//! the configuration and leave the rest to environment overrides; call
//! [`PollerConfig::validate`] once all sources have been applied.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default IP echo endpoint
pub const DEFAULT_IP_URL: &str = "https://ipv4.nsupdate.info/myip";

/// Default DynDNS2 update endpoint
pub const DEFAULT_UPDATE_URL: &str = "https://ipv4.nsupdate.info/nic/update";

/// User-Agent sent with every request
pub const USER_AGENT: &str = concat!("dynipd/", env!("CARGO_PKG_VERSION"));

/// Main poller configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollerConfig {
    /// IP source configuration
    #[serde(default)]
    pub ip_source: IpSourceConfig,

    /// DNS provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Scheduling settings
    #[serde(default)]
    pub poll: PollConfig,
}

impl PollerConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Parse a configuration from a JSON string
    pub fn from_json(text: &str) -> Result<Self, crate::Error> {
        Ok(serde_json::from_str(text)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.ip_source.validate()?;
        self.provider.validate()?;
        self.poll.validate()?;
        Ok(())
    }
}

/// IP source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpSourceConfig {
    /// URL of the echo service; the response body is the caller's IP
    #[serde(default = "default_ip_url")]
    pub url: String,

    /// Address family to accept
    #[serde(default)]
    pub version: IpVersion,
}

impl IpSourceConfig {
    /// Validate the IP source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_http_url("IP source URL", &self.url)
    }
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        Self {
            url: default_ip_url(),
            version: IpVersion::default(),
        }
    }
}

/// IP version to accept from the echo service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersion {
    /// IPv4 only
    V4,
    /// IPv6 only
    V6,
    /// Either family
    #[default]
    #[serde(alias = "both")]
    Any,
}

impl IpVersion {
    /// Whether `ip` belongs to this family
    pub fn accepts(&self, ip: &std::net::IpAddr) -> bool {
        match self {
            IpVersion::V4 => ip.is_ipv4(),
            IpVersion::V6 => ip.is_ipv6(),
            IpVersion::Any => true,
        }
    }
}

impl std::str::FromStr for IpVersion {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "v4" | "4" | "ipv4" => Ok(IpVersion::V4),
            "v6" | "6" | "ipv6" => Ok(IpVersion::V6),
            "any" | "both" => Ok(IpVersion::Any),
            other => Err(crate::Error::config(format!(
                "Unknown IP version '{}'. Valid: v4, v6, any",
                other
            ))),
        }
    }
}

/// DynDNS2 provider configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Full URL of the `/nic/update` endpoint
    #[serde(default = "default_update_url")]
    pub update_url: String,

    /// Hostname (FQDN) whose record gets updated
    #[serde(default)]
    pub hostname: String,

    /// Update secret, sent as the HTTP Basic password
    #[serde(default)]
    pub secret: String,

    /// HTTP Basic username; falls back to `hostname`
    #[serde(default)]
    pub username: Option<String>,

    /// Send the observed IP as `myip=` instead of letting the server use the
    /// request's source address
    #[serde(default = "default_send_myip")]
    pub send_myip: bool,
}

impl ProviderConfig {
    /// Create a provider configuration for `hostname`
    pub fn new(hostname: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            secret: secret.into(),
            ..Self::default()
        }
    }

    /// The username sent in the Basic credentials
    pub fn effective_username(&self) -> &str {
        self.username
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(&self.hostname)
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_http_url("Update URL", &self.update_url)?;

        if self.hostname.is_empty() {
            return Err(crate::Error::config("Hostname is required"));
        }
        validate_domain_name(&self.hostname)?;

        if self.secret.is_empty() {
            return Err(crate::Error::config("Update secret cannot be empty"));
        }

        Ok(())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            update_url: default_update_url(),
            hostname: String::new(),
            secret: String::new(),
            username: None,
            send_myip: default_send_myip(),
        }
    }
}

// The secret never shows up in Debug output
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("update_url", &self.update_url)
            .field("hostname", &self.hostname)
            .field("secret", &"<REDACTED>")
            .field("username", &self.username)
            .field("send_myip", &self.send_myip)
            .finish()
    }
}

/// Scheduling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay between the end of one cycle and the start of the next (seconds)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Timeout applied to every HTTP request (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Capacity of the poller's event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl PollConfig {
    /// Validate the scheduling configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(crate::Error::config("Request timeout must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }

    /// Poll interval as a [`Duration`]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Request timeout as a [`Duration`]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_ip_url() -> String {
    DEFAULT_IP_URL.to_string()
}

fn default_update_url() -> String {
    DEFAULT_UPDATE_URL.to_string()
}

fn default_send_myip() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_event_channel_capacity() -> usize {
    100
}

fn validate_http_url(what: &str, url: &str) -> Result<(), crate::Error> {
    if url.is_empty() {
        return Err(crate::Error::config(format!("{} cannot be empty", what)));
    }
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(crate::Error::config(format!(
            "{} must use HTTP or HTTPS scheme. Got: {}",
            what, url
        )));
    }
    // user:secret@host would leak the credential into logs and proxies
    if let Some(authority) = url.split("://").nth(1).and_then(|rest| rest.split('/').next())
        && authority.contains('@')
    {
        return Err(crate::Error::config(format!(
            "{} must not embed credentials; configure the secret separately",
            what
        )));
    }
    Ok(())
}

/// Validate that a string is a valid domain name
///
/// This implements basic DNS domain name validation per RFC 1035.
/// It's not comprehensive but catches common errors.
pub fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
    if domain.is_empty() {
        return Err(crate::Error::config("Domain name cannot be empty"));
    }

    // Total length limit (RFC 1035: 253 chars max)
    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(crate::Error::config(format!(
            "Hostname must be fully qualified. Got: {}",
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(crate::Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}
