//! Built-in default values.

/// Watch-mode re-resolution interval in seconds.
pub const WATCH_INTERVAL_SECS: u64 = 10;
