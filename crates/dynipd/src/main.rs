// # dynipd - Dynamic IP update daemon
//
// Thin integration layer: reads configuration, wires the HTTP IP source and
// the DynDNS2 provider into the poller, and runs it until SIGTERM/SIGINT.
// All polling and update logic lives in dynip-core.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `DYNIP_CONFIG`: Optional JSON config file, loaded first
// - `DYNIP_HOSTNAME`: Fully qualified hostname to keep updated (required)
// - `DYNIP_SECRET`: Update secret for the hostname (required)
// - `DYNIP_USERNAME`: Basic auth user name (defaults to the hostname)
// - `DYNIP_UPDATE_URL`: DynDNS2 update endpoint
// - `DYNIP_IP_URL`: "What is my IP" echo service
// - `DYNIP_IP_VERSION`: Address family to accept (v4, v6, any)
// - `DYNIP_SEND_MYIP`: Send the detected address as `myip` (default true)
// - `DYNIP_INTERVAL_SECS`: Poll interval in seconds (default 300)
// - `DYNIP_TIMEOUT_SECS`: Per-request timeout in seconds (default 10)
// - `DYNIP_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export DYNIP_HOSTNAME=myhost.nsupdate.info
// export DYNIP_SECRET=yUTvxjRwNu
//
// dynipd
// ```

mod settings;

use anyhow::{Context, Result};
use dynip_core::Poller;
use dynip_ip_http::HttpIpSource;
use dynip_provider_dyndns2::Dyndns2Provider;
use settings::Settings;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DynipExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DynipExitCode> for ExitCode {
    fn from(code: DynipExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DynipExitCode::ConfigError.into();
        }
    };

    if let Err(e) = settings.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DynipExitCode::ConfigError.into();
    }

    let log_level = match settings.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DynipExitCode::ConfigError.into();
    }

    info!("Starting dynipd daemon");
    info!(
        "Updating {} via {} every {}s",
        settings.poller.provider.hostname,
        settings.poller.provider.update_url,
        settings.poller.poll.interval_secs
    );
    for warning in settings.warnings() {
        warn!("{}", warning);
    }

    // One cycle at a time; a single thread is plenty
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DynipExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match build_poller(&settings) {
            Ok(poller) => {
                run_daemon(poller).await;
                DynipExitCode::CleanShutdown
            }
            Err(e) => {
                error!("Startup error: {:#}", e);
                DynipExitCode::ConfigError
            }
        }
    })
    .into()
}

/// Wire the IP source and provider into a poller
fn build_poller(settings: &Settings) -> Result<Poller> {
    let config = &settings.poller;
    let timeout = config.poll.request_timeout();

    let ip_source = HttpIpSource::from_config(&config.ip_source, timeout)
        .context("Failed to create IP source")?;
    let provider = Dyndns2Provider::from_config(&config.provider, timeout)
        .context("Failed to create DynDNS2 provider")?;

    let (poller, mut events) = Poller::new(Box::new(ip_source), Box::new(provider), config)
        .context("Failed to create poller")?;

    // Everything worth knowing is already logged by the poller
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            tracing::trace!(?event, "poller event");
        }
    });

    Ok(poller)
}

/// Run the poller until a shutdown signal arrives
async fn run_daemon(mut poller: Poller) {
    poller.run_until(shutdown_signal()).await;

    match poller.state().last_known_ip() {
        Some(ip) => info!("Shutting down daemon (last known IP: {})", ip),
        None => info!("Shutting down daemon (no baseline established)"),
    }
}

/// Wait for SIGTERM or SIGINT
///
/// If the handlers cannot be installed the daemon falls back to ctrl-c only.
#[cfg(unix)]
async fn shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!("Failed to setup SIGTERM handler: {}", e);
            ctrl_c().await;
            return;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            warn!("Failed to setup SIGINT handler: {}", e);
            sigterm.recv().await;
            info!("Received shutdown signal: SIGTERM");
            return;
        }
    };

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    info!("Received shutdown signal: {}", name);
}

/// Wait for SIGINT
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn shutdown_signal() {
    ctrl_c().await;
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal: SIGINT"),
        Err(e) => {
            // Without a signal handler there is nothing to wait for
            error!("Failed to wait for CTRL-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
