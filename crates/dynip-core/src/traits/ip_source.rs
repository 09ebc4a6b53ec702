// # IP Source Trait
//
// Defines the interface for fetching the caller's current public IP.
//
// ## Implementations
//
// - HTTP echo service: `dynip-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use dynip_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let current_ip = source.current().await?;
//     println!("public IP: {}", current_ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for IP source implementations
///
/// # Contract
///
/// - One call to [`IpSource::current`] performs exactly one lookup. No caching:
///   the poller decides how often to ask.
/// - No retry logic and no background tasks. A failed lookup is returned as an
///   error and the poller tries again on its next cycle.
/// - Every lookup must be bounded by a timeout.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Fetch the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The address the echo service saw
    /// - `Err(Error::Network)`: Transport error, timeout or non-2xx status
    /// - `Err(Error::InvalidResponse)`: The body was not an address of the
    ///   expected family
    async fn current(&self) -> Result<IpAddr, crate::Error>;
}
