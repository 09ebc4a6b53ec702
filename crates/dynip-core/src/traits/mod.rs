//! Core traits for the poller
//!
//! This module defines the abstract interfaces the poller drives.
//!
//! - [`IpSource`]: Fetch the current public IP
//! - [`DnsProvider`]: Push a new IP to a dynamic DNS service

pub mod ip_source;
pub mod dns_provider;

pub use ip_source::IpSource;
pub use dns_provider::{DnsProvider, UpdateResult};
