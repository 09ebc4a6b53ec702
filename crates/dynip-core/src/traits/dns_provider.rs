// # DNS Provider Trait
//
// Defines the interface for pushing a new IP to a dynamic DNS service.
//
// ## Implementations
//
// - DynDNS2 (`/nic/update`): `dynip-provider-dyndns2` crate
//
// ## Usage
//
// ```rust,ignore
// use dynip_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     provider.update_record(
//         "myhost.nsupdate.info",
//         std::net::IpAddr::from([192, 0, 2, 1]),
//     ).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Result of a DNS update operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateResult {
    /// The provider changed the record
    Updated {
        /// The new IP address
        new_ip: IpAddr,
    },
    /// The record already held this IP (no-op)
    Unchanged {
        /// The current IP address
        current_ip: IpAddr,
    },
}

impl UpdateResult {
    /// The IP the record holds after the call
    pub fn ip(&self) -> IpAddr {
        match self {
            UpdateResult::Updated { new_ip } => *new_ip,
            UpdateResult::Unchanged { current_ip } => *current_ip,
        }
    }
}

/// Trait for DNS provider implementations
///
/// # Contract
///
/// - **Single-shot**: one HTTP request per call
/// - **Stateless**: no knowledge of the poller's baseline
/// - **No retries**: return an error, the next poll cycle retries
/// - **Credentials stay out of URLs and logs**
///
/// Both [`UpdateResult`] variants count as success: the poller records the
/// new baseline either way.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Point `hostname` at `new_ip`
    ///
    /// # Returns
    ///
    /// - `Ok(UpdateResult)`: The record now holds `new_ip`
    /// - `Err(Error::Authentication)`: Credentials rejected
    /// - `Err(Error::Network)`: Transport error, timeout or unexpected status
    /// - `Err(Error::Provider)`: The service refused the update
    async fn update_record(
        &self,
        hostname: &str,
        new_ip: IpAddr,
    ) -> Result<UpdateResult, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
