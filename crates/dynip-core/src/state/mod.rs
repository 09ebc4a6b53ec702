// # Poller State
//
// The baseline a single poller compares every fetch against.
//
// ## Lifecycle
//
// - Starts empty (`BaselinePhase::Unset`)
// - The first successful fetch becomes the baseline, no update is sent
// - Afterwards the baseline only moves when the provider accepted an update
//
// State lives in memory only. A restart starts a fresh baseline.

use chrono::{DateTime, Utc};
use std::net::IpAddr;

/// Whether a baseline has been established yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselinePhase {
    /// No successful fetch so far
    Unset,
    /// A baseline IP is known
    Set,
}

/// Mutable state owned by one [`crate::Poller`]
#[derive(Debug, Clone, Default)]
pub struct PollerState {
    last_known_ip: Option<IpAddr>,
    current_ip: Option<IpAddr>,
    last_checked: Option<DateTime<Utc>>,
    last_updated: Option<DateTime<Utc>>,
}

impl PollerState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// The IP the DNS record is believed to hold
    pub fn last_known_ip(&self) -> Option<IpAddr> {
        self.last_known_ip
    }

    /// The IP seen on the most recent successful fetch
    pub fn current_ip(&self) -> Option<IpAddr> {
        self.current_ip
    }

    /// When the most recent successful fetch completed
    pub fn last_checked(&self) -> Option<DateTime<Utc>> {
        self.last_checked
    }

    /// When the provider last accepted an update
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn phase(&self) -> BaselinePhase {
        match self.last_known_ip {
            Some(_) => BaselinePhase::Set,
            None => BaselinePhase::Unset,
        }
    }

    /// Record a successful fetch; does not touch the baseline
    pub(crate) fn observe(&mut self, ip: IpAddr) {
        self.current_ip = Some(ip);
        self.last_checked = Some(Utc::now());
    }

    /// Set the first baseline
    pub(crate) fn establish(&mut self, ip: IpAddr) {
        debug_assert!(self.last_known_ip.is_none());
        self.last_known_ip = Some(ip);
    }

    /// Move the baseline after the provider accepted `ip`
    pub(crate) fn commit_update(&mut self, ip: IpAddr) {
        self.last_known_ip = Some(ip);
        self.last_updated = Some(Utc::now());
    }
}
