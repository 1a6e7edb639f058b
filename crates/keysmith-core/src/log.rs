//! Logging system for keysmith.
//!
//! Console output goes to stderr, filtered by `RUST_LOG` or the level given
//! on the command line. Each `logs:` entry of the repository configuration
//! adds a file output with its own level and format.

use keysmith_types::config::{LogConfig, LogFormat};
use keysmith_types::{KeysmithError, LogLevel, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use crate::util::fs::expand_path;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps file writers flushing until dropped.
#[must_use = "dropping the guards stops file logging"]
pub struct LogGuards(#[allow(dead_code)] Vec<WorkerGuard>);

fn filter_for(level: LogLevel) -> EnvFilter {
    EnvFilter::new(format!("keysmith={}", level.as_directive()))
}

/// Initialize console logging at `level` plus the configured file outputs.
pub fn init(level: LogLevel, outputs: &[LogConfig]) -> Result<LogGuards> {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| filter_for(level));

    let mut layers: Vec<BoxedLayer> = vec![fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_filter(console_filter)
        .boxed()];

    let mut guards = Vec::new();
    for output in outputs {
        let (layer, guard) = file_layer(output)?;
        layers.push(layer);
        guards.push(guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| KeysmithError::Other(format!("Failed to initialise logging: {}", e)))?;

    Ok(LogGuards(guards))
}

fn file_layer(output: &LogConfig) -> Result<(BoxedLayer, WorkerGuard)> {
    let path = expand_path(&output.path);
    let (dir, file) = match (path.parent(), path.file_name()) {
        (Some(dir), Some(file)) => (dir.to_path_buf(), file.to_owned()),
        _ => {
            return Err(KeysmithError::Config(format!(
                "Invalid log path: {}",
                output.path
            )))
        }
    };
    std::fs::create_dir_all(&dir)?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file));
    let filter = filter_for(output.level);

    let layer = match output.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
    };

    Ok((layer, guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_log_path_rejected() {
        let output = LogConfig {
            path: "/".to_string(),
            level: LogLevel::Info,
            format: LogFormat::Json,
        };
        assert!(matches!(file_layer(&output), Err(KeysmithError::Config(_))));
    }
}
