// # dynip-core
//
// Core library for the dynip public-IP poller.
//
// ## Architecture Overview
//
// This library provides the core functionality for polling-based dynamic DNS:
// - **IpSource**: Trait for fetching the current public IP
// - **DnsProvider**: Trait for pushing a new IP to a dynamic DNS service
// - **PollerState**: The baseline ("last known IP") owned by one poller
// - **Poller**: Runs the fetch → compare → update cycle on a fixed interval
//
// ## Design Principles
//
// 1. **Separation of Concerns**: The cycle logic knows nothing about HTTP
// 2. **One cycle at a time**: `Poller::run_cycle` takes `&mut self`
// 3. **Fail soft**: A failed cycle is logged, never fatal
// 4. **Library-First**: The daemon is a thin wrapper around this crate

pub mod traits;
pub mod poller;
pub mod config;
pub mod error;
pub mod state;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider, UpdateResult};
pub use poller::{Poller, PollerEvent, CycleOutcome};
pub use config::{PollerConfig, IpSourceConfig, ProviderConfig, PollConfig, IpVersion};
pub use error::{Error, Result};
pub use state::{PollerState, BaselinePhase};
