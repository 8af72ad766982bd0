//! Application execution logic.
//!
//! Wires the validated configuration to a table provider (live or
//! snapshot), runs resolution, and prints the result. In watch mode the
//! resolution repeats on an interval until a shutdown signal arrives.

use std::net::IpAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::signal;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;

use node_addr::config::ValidatedConfig;
use node_addr::net::filter::{NodeAddressFilter, ProtocolFilter};
use node_addr::net::{
    AddressTableProvider, FilteredProvider, ResolveError, Resolver, RouteTableProvider,
    SnapshotProvider,
};

#[cfg(target_os = "linux")]
use node_addr::net::platform::PlatformProvider;

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// Resolution failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The result could not be rendered as JSON.
    #[error("Failed to serialize result: {0}")]
    Output(#[from] serde_json::Error),

    /// Live tables are not available on this platform.
    #[cfg(not(target_os = "linux"))]
    #[error("Live resolution is only supported on Linux; use --snapshot")]
    LiveUnsupported,
}

/// Runtime options extracted from validated config.
///
/// This struct holds only the fields needed by the resolution loop,
/// allowing the config's `link_filter` field to be moved separately.
struct RuntimeOptions {
    targets: Vec<IpAddr>,
    address_filter: NodeAddressFilter,
    route_filter: ProtocolFilter,
    watch: bool,
    interval: Duration,
    json: bool,
}

impl From<&ValidatedConfig> for RuntimeOptions {
    fn from(config: &ValidatedConfig) -> Self {
        Self {
            targets: config.targets.clone(),
            address_filter: config.address_filter,
            route_filter: config.route_filter.clone(),
            watch: config.watch,
            interval: config.interval,
            json: config.json,
        }
    }
}

/// Executes a resolution run.
///
/// Picks the provider (snapshot file when configured, live system state
/// otherwise), scopes it to the configured interfaces, then resolves once
/// or repeatedly depending on watch mode.
///
/// # Errors
///
/// Returns an error if resolution fails (one-shot mode) or the result
/// cannot be printed. Watch mode logs resolution failures and keeps going.
pub async fn execute(mut config: ValidatedConfig) -> Result<(), RunError> {
    let options = RuntimeOptions::from(&config);

    if let Some(path) = config.snapshot.take() {
        tracing::debug!(snapshot = %path.display(), "resolving against snapshot");
        let provider =
            FilteredProvider::new(SnapshotProvider::from_path(path), config.link_filter);
        run_with(&provider, &options).await
    } else {
        run_live(config, &options).await
    }
}

#[cfg(target_os = "linux")]
async fn run_live(config: ValidatedConfig, options: &RuntimeOptions) -> Result<(), RunError> {
    let provider = FilteredProvider::new(PlatformProvider::new(), config.link_filter);
    run_with(&provider, options).await
}

/// Non-Linux stub; only snapshot resolution works elsewhere.
#[cfg(not(target_os = "linux"))]
async fn run_live(_config: ValidatedConfig, _options: &RuntimeOptions) -> Result<(), RunError> {
    Err(RunError::LiveUnsupported)
}

async fn run_with<P>(provider: &P, options: &RuntimeOptions) -> Result<(), RunError>
where
    P: AddressTableProvider + RouteTableProvider,
{
    let mut resolver = Resolver::new(provider, provider);
    if !options.route_filter.is_empty() {
        resolver = resolver.with_route_filter(options.route_filter.clone());
    }

    if options.watch {
        run_watch_loop(&resolver, options).await
    } else {
        let addresses = resolve_once(&resolver, options)?;
        print_addresses(&addresses, options.json)
    }
}

/// Runs one resolution: target-driven when targets are configured,
/// default-route otherwise.
fn resolve_once<A, R>(
    resolver: &Resolver<A, R>,
    options: &RuntimeOptions,
) -> Result<Vec<IpAddr>, ResolveError>
where
    A: AddressTableProvider,
    R: RouteTableProvider,
{
    if options.targets.is_empty() {
        resolver.default_route(&options.address_filter)
    } else {
        resolver.by_targets(&options.targets, &options.address_filter)
    }
}

/// Re-resolves on the configured interval, printing whenever the selected
/// address set changes. Runs until a shutdown signal is received.
async fn run_watch_loop<A, R>(
    resolver: &Resolver<A, R>,
    options: &RuntimeOptions,
) -> Result<(), RunError>
where
    A: AddressTableProvider,
    R: RouteTableProvider,
{
    tracing::info!(
        "Watch mode enabled (interval: {}s)",
        options.interval.as_secs()
    );

    let mut ticks = IntervalStream::new(tokio::time::interval(options.interval));
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut last: Option<Vec<IpAddr>> = None;
    loop {
        tokio::select! {
            biased;

            () = &mut shutdown => {
                tracing::info!("Shutdown signal received, stopping...");
                return Ok(());
            }

            _ = ticks.next() => {
                match resolve_once(resolver, options) {
                    Ok(addresses) => {
                        if last.as_deref() != Some(addresses.as_slice()) {
                            tracing::info!("Selected addresses changed: {}", render(&addresses));
                            print_addresses(&addresses, options.json)?;
                            last = Some(addresses);
                        }
                    }
                    // The interface may come up later; keep watching.
                    Err(e) => tracing::warn!("Resolution failed: {e}"),
                }
            }
        }
    }
}

fn render(addresses: &[IpAddr]) -> String {
    let rendered: Vec<String> = addresses.iter().map(ToString::to_string).collect();
    rendered.join(", ")
}

fn print_addresses(addresses: &[IpAddr], json: bool) -> Result<(), RunError> {
    if json {
        println!("{}", serde_json::to_string(addresses)?);
    } else {
        for address in addresses {
            println!("{address}");
        }
    }
    Ok(())
}

/// Returns a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
