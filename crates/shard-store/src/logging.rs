//! Leveled logging sink handed to a store at construction.
//!
//! Stores never log through the process-global subscriber. Each store holds
//! a [`StorageLogger`], and every operation runs with that logger's
//! dispatcher installed, so two stores in one process can log to different
//! sinks at different levels.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::instrument::{WithDispatch, WithSubscriber};
use tracing::level_filters::LevelFilter;
use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;

use crate::error::StoreError;

/// Log verbosity accepted by store configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// The `tracing` filter that admits this level and everything more severe.
    pub fn as_filter(self) -> LevelFilter {
        match self {
            Self::Debug => LevelFilter::DEBUG,
            Self::Info => LevelFilter::INFO,
            Self::Warn => LevelFilter::WARN,
            Self::Error => LevelFilter::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(StoreError::Config(format!(
                "unknown log level {other:?} (expected debug, info, warn or error)"
            ))),
        }
    }
}

/// Handle to the logging sink a store writes to.
#[derive(Clone)]
pub struct StorageLogger {
    dispatch: Dispatch,
}

impl StorageLogger {
    /// Timestamped text lines on stderr, filtered at `level`.
    pub fn console(level: LogLevel) -> Self {
        Self::with_writer(level, std::io::stderr)
    }

    /// Text lines written to `writer`, filtered at `level`.
    pub fn with_writer<W>(level: LogLevel, writer: W) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level.as_filter())
            .with_ansi(false)
            .with_writer(writer)
            .finish();
        Self::from_dispatch(Dispatch::new(subscriber))
    }

    /// Wrap an existing dispatcher (e.g. one built by the embedding process).
    pub fn from_dispatch(dispatch: Dispatch) -> Self {
        Self { dispatch }
    }

    /// A sink that drops everything.
    pub fn disabled() -> Self {
        Self::from_dispatch(Dispatch::none())
    }

    /// Run `future` with this logger installed as the default dispatcher.
    pub(crate) fn scope<F: Future>(&self, future: F) -> WithDispatch<F> {
        future.with_subscriber(self.dispatch.clone())
    }
}

impl fmt::Debug for StorageLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageLogger").finish_non_exhaustive()
    }
}


#[cfg(test)]
mod tests {
    use super::capture::CapturedLogs;
    use super::*;

    #[test]
    fn parse_and_display_round_trip() {
        for level in [LogLevel::Debug, LogLevel::Info, LogLevel::Warn, LogLevel::Error] {
            assert_eq!(level.to_string().parse::<LogLevel>().unwrap(), level);
        }
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
    }

    #[test]
    fn unknown_level_is_config_error() {
        let err = "verbose".parse::<LogLevel>().unwrap_err();
        assert_eq!(err.code(), "INVALID_CONFIG");
    }

    #[test]
    fn default_level_is_info() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[tokio::test]
    async fn scope_routes_events_to_injected_sink() {
        let logs = CapturedLogs::default();
        let logger = logs.logger(LogLevel::Warn);

        logger
            .scope(async {
                tracing::info!("filtered out");
                tracing::warn!(hash = "h1", "kept");
            })
            .await;

        let out = logs.contents();
        assert!(out.contains("kept"));
        assert!(out.contains("hash=\"h1\"") || out.contains("hash=h1"));
        assert!(!out.contains("filtered out"));
    }

    #[tokio::test]
    async fn disabled_logger_swallows_events() {
        StorageLogger::disabled()
            .scope(async { tracing::error!("nobody listens") })
            .await;
    }
}
