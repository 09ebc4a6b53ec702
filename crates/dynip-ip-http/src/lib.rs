// # HTTP IP Source
//
// This crate provides the IP source for the dynip poller: it asks an
// external "what is my IP" service (e.g. `https://ipv4.nsupdate.info/myip`)
// and parses the plain-text body.
//
// ## Architecture
//
// One GET per `current()` call, bounded by the client timeout. No caching, no
// retries and no background task: the poller owns the schedule.

use dynip_core::config::{IpSourceConfig, IpVersion, USER_AGENT};
use dynip_core::traits::IpSource;
use dynip_core::error::body_excerpt;
use dynip_core::{Error, Result};

use std::net::IpAddr;
use std::time::Duration;

/// HTTP-based IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch IP from
    url: String,

    /// Address family to accept
    version: IpVersion,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: URL to fetch IP from (e.g., "https://ipv4.nsupdate.info/myip")
    /// - `version`: Address family to accept
    /// - `timeout`: Upper bound for each lookup
    ///
    /// # Errors
    ///
    /// `Error::TransportUnavailable` if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, version: IpVersion, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            version,
            client,
        })
    }

    /// Create from configuration
    pub fn from_config(config: &IpSourceConfig, timeout: Duration) -> Result<Self> {
        config.validate()?;
        Self::new(config.url.clone(), config.version, timeout)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch current IP from HTTP service
    async fn fetch_ip(&self) -> Result<IpAddr> {
        tracing::debug!("Fetching public IP from {}", self.url);

        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::network(format!("Request to {} timed out", self.url))
            } else {
                Error::network(format!("Request failed: {}", e))
            }
        })?;

        if !response.status().is_success() {
            return Err(Error::network(format!(
                "HTTP error from {}: {}",
                self.url,
                response.status()
            )));
        }

        let ip_text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                Error::network(format!("Reading response from {} timed out", self.url))
            } else {
                Error::network(format!("Failed to read response: {}", e))
            }
        })?;

        let ip: IpAddr = ip_text.trim().parse().map_err(|_| {
            Error::invalid_response(format!("Invalid IP address: {:?}", body_excerpt(&ip_text)))
        })?;

        if !self.version.accepts(&ip) {
            return Err(Error::invalid_response(format!(
                "Expected {:?} address, got: {}",
                self.version, ip
            )));
        }

        tracing::debug!("Echo service reports {}", ip);
        Ok(ip)
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<IpAddr> {
        self.fetch_ip().await
    }
}
