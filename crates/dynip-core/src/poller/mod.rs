//! Polling loop
//!
//! The Poller is responsible for:
//! - Fetching the current public IP via IpSource
//! - Comparing it to the baseline in PollerState
//! - Updating the DNS record via DnsProvider when the IP moved
//! - Waiting a fixed interval, then doing it again
//!
//! ## Architecture
//!
//! ```text
//!            ┌─────────────┐
//!            │  IpSource   │
//!            └─────────────┘
//!                   │ current()
//!                   ▼
//! ┌─────────────┐  ┌──────────────┐  ┌─────────────┐
//! │ PollerState │◀─│    Poller    │─▶│ DnsProvider │
//! │ (baseline)  │  └──────────────┘  │ (update)    │
//! └─────────────┘         │          └─────────────┘
//!                         ▼
//!                  ┌─────────────┐
//!                  │   Events    │
//!                  └─────────────┘
//! ```
//!
//! ## Cycle
//!
//! 1. Fetch the IP. On failure log it and go to 4
//! 2. No baseline yet: the fetched IP becomes the baseline, nothing is sent
//! 3. IP differs from the baseline: send an update. Only a successful update
//!    moves the baseline, so a failed one is retried next cycle
//! 4. Sleep for the poll interval
//!
//! The next cycle is only scheduled once the previous one has finished, so at
//! most one cycle is ever in flight.

use crate::config::PollerConfig;
use crate::error::Result;
use crate::state::PollerState;
use crate::traits::{DnsProvider, IpSource, UpdateResult};
use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Events emitted by the Poller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollerEvent {
    /// Polling loop started
    Started {
        hostname: String,
        interval: Duration,
    },

    /// The IP lookup failed; the cycle was abandoned
    FetchFailed {
        error: String,
    },

    /// First successful lookup
    BaselineEstablished {
        ip: IpAddr,
    },

    /// Lookup returned the baseline IP
    IpUnchanged {
        ip: IpAddr,
    },

    /// Lookup returned a different IP
    IpChangeDetected {
        previous_ip: IpAddr,
        new_ip: IpAddr,
    },

    /// The provider accepted the update
    UpdateSucceeded {
        hostname: String,
        previous_ip: IpAddr,
        new_ip: IpAddr,
    },

    /// The provider call failed; the baseline was kept
    UpdateFailed {
        hostname: String,
        attempted_ip: IpAddr,
        error: String,
    },

    /// Polling loop stopped
    Stopped {
        reason: String,
    },
}

/// What a single cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The IP lookup failed, nothing else happened
    FetchFailed { error: String },
    /// First successful lookup, no update sent
    BaselineEstablished { ip: IpAddr },
    /// IP matched the baseline, no update sent
    Unchanged { ip: IpAddr },
    /// IP changed and the provider accepted it
    Updated {
        previous_ip: IpAddr,
        result: UpdateResult,
    },
    /// IP changed but the update failed
    UpdateFailed {
        previous_ip: IpAddr,
        attempted_ip: IpAddr,
        error: String,
    },
}

/// Public-IP poller
///
/// Owns its [`PollerState`]. [`Poller::run_cycle`] takes `&mut self`, so two
/// cycles can never overlap and the state needs no lock.
///
/// ## Lifecycle
///
/// 1. Create with [`Poller::new()`]
/// 2. Start with [`Poller::run()`] (or [`Poller::run_until()`])
/// 3. Runs until the shutdown future resolves
pub struct Poller {
    /// Where the public IP comes from
    ip_source: Box<dyn IpSource>,

    /// Where updates go
    provider: Box<dyn DnsProvider>,

    /// Record to keep pointed at us
    hostname: String,

    /// Delay between cycles
    interval: Duration,

    /// Baseline
    state: PollerState,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<PollerEvent>,
}

impl Poller {
    /// Create a new poller
    ///
    /// # Returns
    ///
    /// A tuple of (poller, event_receiver) where event_receiver yields poller
    /// events. Dropping the receiver is fine, events are then discarded.
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: &PollerConfig,
    ) -> Result<(Self, mpsc::Receiver<PollerEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.poll.event_channel_capacity);

        let poller = Self {
            ip_source,
            provider,
            hostname: config.provider.hostname.clone(),
            interval: config.poll.interval(),
            state: PollerState::new(),
            event_tx: tx,
        };

        Ok((poller, rx))
    }

    /// Current baseline and last observation
    pub fn state(&self) -> &PollerState {
        &self.state
    }

    /// Run until Ctrl-C
    pub async fn run(&mut self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run until `shutdown_rx` fires (or its sender is dropped)
    ///
    /// With `None` this behaves like [`Poller::run`].
    pub async fn run_with_shutdown(&mut self, shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>) {
        match shutdown_rx {
            Some(rx) => {
                self.run_until(async {
                    let _ = rx.await;
                })
                .await
            }
            None => self.run().await,
        }
    }

    /// Run cycles until `shutdown` resolves
    ///
    /// The first cycle starts immediately. A cycle still in flight when
    /// `shutdown` resolves is dropped; nothing is persisted, so there is
    /// nothing to flush.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            "Polling for {} every {:?} via {}",
            self.hostname,
            self.interval,
            self.provider.provider_name()
        );
        self.emit_event(PollerEvent::Started {
            hostname: self.hostname.clone(),
            interval: self.interval,
        });

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }

                _ = self.cycle_then_wait() => {}
            }
        }

        self.emit_event(PollerEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });
        info!("Poller stopped");
    }

    async fn cycle_then_wait(&mut self) {
        self.run_cycle().await;
        tokio::time::sleep(self.interval).await;
    }

    /// Run one fetch → compare → update cycle
    ///
    /// Never fails: errors are logged, reported as events and folded into the
    /// returned [`CycleOutcome`].
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let ip = match self.ip_source.current().await {
            Ok(ip) => ip,
            Err(e) => {
                warn!("Failed to fetch public IP: {}", e);
                let error = e.to_string();
                self.emit_event(PollerEvent::FetchFailed {
                    error: error.clone(),
                });
                return CycleOutcome::FetchFailed { error };
            }
        };

        self.state.observe(ip);

        let Some(previous_ip) = self.state.last_known_ip() else {
            info!("Baseline established: {} (no update sent)", ip);
            self.state.establish(ip);
            self.emit_event(PollerEvent::BaselineEstablished { ip });
            return CycleOutcome::BaselineEstablished { ip };
        };

        if ip == previous_ip {
            debug!("Public IP unchanged: {}", ip);
            self.emit_event(PollerEvent::IpUnchanged { ip });
            return CycleOutcome::Unchanged { ip };
        }

        info!("IP change detected: {} -> {}", previous_ip, ip);
        self.emit_event(PollerEvent::IpChangeDetected {
            previous_ip,
            new_ip: ip,
        });

        match self.provider.update_record(&self.hostname, ip).await {
            Ok(result) => {
                match &result {
                    UpdateResult::Updated { .. } => {
                        info!("Updated {} -> {} (previous: {})", self.hostname, ip, previous_ip);
                    }
                    UpdateResult::Unchanged { .. } => {
                        info!("Provider already had {} -> {}", self.hostname, ip);
                    }
                }

                self.state.commit_update(ip);
                self.emit_event(PollerEvent::UpdateSucceeded {
                    hostname: self.hostname.clone(),
                    previous_ip,
                    new_ip: ip,
                });
                CycleOutcome::Updated { previous_ip, result }
            }
            Err(e) => {
                if e.is_auth() {
                    error!("Update of {} rejected, check credentials: {}", self.hostname, e);
                } else {
                    warn!("Failed to update {} -> {}: {}", self.hostname, ip, e);
                }

                let error = e.to_string();
                self.emit_event(PollerEvent::UpdateFailed {
                    hostname: self.hostname.clone(),
                    attempted_ip: ip,
                    error: error.clone(),
                });
                CycleOutcome::UpdateFailed {
                    previous_ip,
                    attempted_ip: ip,
                    error,
                }
            }
        }
    }

    /// Emit a poller event
    fn emit_event(&self, event: PollerEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}
