//! Logging utilities
//!
//! Provides logging configuration and helpers.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Log level configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// Resolve from flags and environment: explicit level, then verbose, then env
    pub fn resolve(explicit: Option<&str>, verbose: bool, env: Option<&str>) -> Self {
        explicit
            .and_then(Self::from_str)
            .or(if verbose { Some(LogLevel::Debug) } else { None })
            .or_else(|| env.and_then(Self::from_str))
            .unwrap_or(LogLevel::Info)
    }
}

/// Initialize the logger with specified level
pub fn init_logger(level: LogLevel) {
    let filter = EnvFilter::new(format!("mercado_tests={}", level.to_tracing_level()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!(LogLevel::from_str("info"), Some(LogLevel::Info));
        assert_eq!(LogLevel::from_str("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_str("unknown"), None);
    }

    #[test]
    fn test_resolve_precedence() {
        assert_eq!(LogLevel::resolve(Some("warn"), true, Some("trace")), LogLevel::Warn);
        assert_eq!(LogLevel::resolve(None, true, Some("trace")), LogLevel::Debug);
        assert_eq!(LogLevel::resolve(None, false, Some("trace")), LogLevel::Trace);
        assert_eq!(LogLevel::resolve(Some("bogus"), false, None), LogLevel::Info);
    }
}
