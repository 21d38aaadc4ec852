//! Context configuration.
use std::env;

/// Default tagline shown by marketplace front pages.
pub const TITLE_DATA: &str = "Discover, collect, and sell NFTs";

#[derive(Clone, Debug)]
pub struct ContextConfig {
    /// Buffered notifications per subscriber before the oldest are dropped
    pub event_capacity: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self { event_capacity: 64 }
    }
}

impl ContextConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `MARKET_EVENT_CAPACITY` - Notification buffer size (default: 64)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(capacity) = read_env::<usize>("MARKET_EVENT_CAPACITY") {
            config.event_capacity = capacity.max(1);
        }

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
