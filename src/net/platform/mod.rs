//! Platform-specific live table providers.
//!
//! # Platform Support
//!
//! - **Linux**: queries iproute2's JSON output (`ip -j`).
//! - Other platforms resolve against snapshot files only.

#[cfg(target_os = "linux")]
mod iproute2;

#[cfg(target_os = "linux")]
pub use iproute2::Iproute2Provider;

// Re-export the platform-specific provider as PlatformProvider for convenience
#[cfg(target_os = "linux")]
pub use iproute2::Iproute2Provider as PlatformProvider;
