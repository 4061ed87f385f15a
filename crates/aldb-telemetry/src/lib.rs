use std::str::FromStr;

use aldb_settings::LoggingSettings;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Configuration for the telemetry subsystem.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Default log level. Overridden by RUST_LOG env var.
    pub log_level: Level,
    /// Per-module level overrides (e.g. "aldb_store" => DEBUG).
    pub module_levels: Vec<(String, Level)>,
    /// JSON lines instead of the human-readable format.
    pub json: bool,
    /// Settings entries that did not parse; reported once logging is up.
    pub rejected: Vec<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            module_levels: Vec::new(),
            json: false,
            rejected: Vec::new(),
        }
    }
}

impl TelemetryConfig {
    pub fn from_settings(settings: &LoggingSettings) -> Self {
        let mut rejected = Vec::new();
        let log_level = Level::from_str(&settings.level).unwrap_or_else(|_| {
            rejected.push(format!("level={}", settings.level));
            Level::INFO
        });
        let module_levels = settings
            .module_levels
            .iter()
            .filter_map(|(module, level)| match Level::from_str(level) {
                Ok(l) => Some((module.clone(), l)),
                Err(_) => {
                    rejected.push(format!("{module}={level}"));
                    None
                }
            })
            .collect();
        Self {
            log_level,
            module_levels,
            json: settings.json,
            rejected,
        }
    }

    /// `EnvFilter` directive string, e.g. `info,aldb_store=debug`.
    pub fn filter_directive(&self) -> String {
        let mut filter = self.log_level.to_string().to_lowercase();
        for (module, level) in &self.module_levels {
            filter.push_str(&format!(",{}={}", module, level.to_string().to_lowercase()));
        }
        filter
    }
}

/// Install the global subscriber. Call once at startup.
///
/// Returns `false` when a subscriber was already installed.
pub fn init_telemetry(config: &TelemetryConfig) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directive()));

    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_list(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(true).boxed()
    };

    let installed = tracing_subscriber::registry()
        .with(fmt_layer.with_filter(env_filter))
        .try_init()
        .is_ok();

    for entry in &config.rejected {
        tracing::warn!(entry = %entry, "ignoring invalid log level setting");
    }
    installed
}
