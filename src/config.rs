use std::env;

/// Runtime configuration loaded from environment variables
pub struct Config {
    pub db_path: String,
    pub categories_path: Option<String>,
    pub channel_buffer: usize,
    pub sweep_interval_secs: u64,
    pub snapshots_enabled: bool,
    pub rust_log: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// By default snapshots are disabled and the engine runs purely
    /// in-memory. Set ENABLE_SNAPSHOTS=true to persist inventory
    /// snapshots and alert events to SHELFWATCH_DB_PATH.
    pub fn from_env() -> Self {
        Self {
            db_path: env::var("SHELFWATCH_DB_PATH")
                .unwrap_or_else(|_| "/var/lib/shelfwatch/shelfwatch.db".to_string()),

            categories_path: env::var("SHELFWATCH_CATEGORIES").ok(),

            channel_buffer: env::var("OBSERVATION_CHANNEL_BUFFER")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024),

            sweep_interval_secs: env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),

            snapshots_enabled: env::var("ENABLE_SNAPSHOTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),

            rust_log: env::var("RUST_LOG").ok(),
        }
    }
}
