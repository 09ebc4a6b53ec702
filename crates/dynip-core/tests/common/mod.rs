//! Test doubles and common utilities for poller contract tests
//!
//! The doubles record every call so tests can assert on exactly what the
//! poller asked for, and share their counters through `Arc`s so a test can
//! keep a handle after boxing one into the poller.

#![allow(dead_code)]

use dynip_core::config::{PollerConfig, ProviderConfig};
use dynip_core::error::{Error, Result};
use dynip_core::traits::{DnsProvider, IpSource, UpdateResult};
use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const HOSTNAME: &str = "myhost.nsupdate.info";

pub fn ip(s: &str) -> IpAddr {
    s.parse().expect("valid IP literal")
}

/// An IpSource that plays back a script of lookup results
///
/// Once the script is exhausted the last entry is repeated.
pub struct ScriptedIpSource {
    script: Arc<Mutex<VecDeque<Result<IpAddr>>>>,
    last: Arc<Mutex<Option<IpAddr>>>,
    call_count: Arc<AtomicUsize>,
    delay: Duration,
}

impl ScriptedIpSource {
    pub fn new(script: Vec<Result<IpAddr>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            last: Arc::new(Mutex::new(None)),
            call_count: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
        }
    }

    /// Every lookup returns `ip`
    pub fn fixed(ip: IpAddr) -> Self {
        Self::new(vec![Ok(ip)])
    }

    /// Make every lookup take `delay` (tokio time)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Append lookups to the script
    pub fn push(&self, result: Result<IpAddr>) {
        self.script.lock().unwrap().push_back(result);
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Create a new ScriptedIpSource that shares script and counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            script: Arc::clone(&other.script),
            last: Arc::clone(&other.last),
            call_count: Arc::clone(&other.call_count),
            delay: other.delay,
        }
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn current(&self) -> Result<IpAddr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(ip)) => {
                *self.last.lock().unwrap() = Some(ip);
                Ok(ip)
            }
            Some(Err(e)) => Err(e),
            None => self
                .last
                .lock()
                .unwrap()
                .ok_or_else(|| Error::network("script exhausted")),
        }
    }
}

/// What a MockDnsProvider call should do
#[derive(Debug, Clone, Copy)]
pub enum ProviderBehavior {
    Succeed,
    ReportUnchanged,
    FailNetwork,
    FailAuth,
}

/// A mock DnsProvider that records every update request
pub struct MockDnsProvider {
    /// Behaviour for upcoming calls (front first); `Succeed` once empty
    behaviors: Arc<Mutex<VecDeque<ProviderBehavior>>>,
    /// Recorded (hostname, ip) pairs
    calls: Arc<Mutex<Vec<(String, IpAddr)>>>,
    /// Calls currently in progress
    in_flight: Arc<AtomicUsize>,
    /// Highest value `in_flight` reached
    max_in_flight: Arc<AtomicUsize>,
    delay: Duration,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self {
            behaviors: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
        }
    }

    /// Make every update take `delay` (tokio time)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queue the behaviour of the next call
    pub fn then(&self, behavior: ProviderBehavior) -> &Self {
        self.behaviors.lock().unwrap().push_back(behavior);
        self
    }

    /// Get the number of times update_record() was called
    pub fn update_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Get the IPs update_record() was called with
    pub fn updated_ips(&self) -> Vec<IpAddr> {
        self.calls.lock().unwrap().iter().map(|(_, ip)| *ip).collect()
    }

    /// Get the hostnames update_record() was called with
    pub fn updated_hostnames(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(host, _)| host.clone())
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Create a new MockDnsProvider that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            behaviors: Arc::clone(&other.behaviors),
            calls: Arc::clone(&other.calls),
            in_flight: Arc::clone(&other.in_flight),
            max_in_flight: Arc::clone(&other.max_in_flight),
            delay: other.delay,
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn update_record(&self, hostname: &str, new_ip: IpAddr) -> Result<UpdateResult> {
        self.calls
            .lock()
            .unwrap()
            .push((hostname.to_string(), new_ip));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ProviderBehavior::Succeed);

        match behavior {
            ProviderBehavior::Succeed => Ok(UpdateResult::Updated { new_ip }),
            ProviderBehavior::ReportUnchanged => Ok(UpdateResult::Unchanged { current_ip: new_ip }),
            ProviderBehavior::FailNetwork => Err(Error::network("connection refused")),
            ProviderBehavior::FailAuth => Err(Error::auth("badauth")),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create a minimal PollerConfig for testing
pub fn minimal_config(interval_secs: u64) -> PollerConfig {
    let mut config = PollerConfig {
        provider: ProviderConfig::new(HOSTNAME, "test-secret"),
        ..PollerConfig::default()
    };
    config.poll.interval_secs = interval_secs;
    config
}
