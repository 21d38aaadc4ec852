//! Tracing setup for the CLI.
//!
//! Logs always go to stderr so stdout stays clean JSON. Setting
//! `MARKET_LOG_TO_FILE` adds a daily-rolling file under the platform cache
//! directory:
//! - macOS: `~/Library/Caches/nft-market/logs`
//! - Linux: `~/.cache/nft-market/logs` (or `$XDG_CACHE_HOME/nft-market/logs`)
//! - Windows: `%LOCALAPPDATA%\nft-market\cache\logs`

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "nft-market.log";

pub fn setup_logging() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let file_layer = if env_flag("MARKET_LOG_TO_FILE") {
        let dir = log_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

        let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);

        // Leak the guard to keep the file writer alive until exit
        std::mem::forget(guard);

        Some(fmt::layer().with_writer(writer).with_ansi(false))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}

/// Platform-specific log directory.
pub fn log_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "nft-market")
        .map(|dirs| dirs.cache_dir().join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("nft-market").join("logs"))
}

fn env_flag(key: &str) -> bool {
    std::env::var(key).is_ok_and(|value| parse_flag(&value))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
