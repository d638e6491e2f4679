use super::truncate_sql_bytes;
use super::types::{QueryEvent, QueryListener};
use crate::normalize::{normalize, query_type};
use std::time::Duration;
use tracing::Level;

/// A `tracing`-based listener that reports statements slower than a threshold.
///
/// Only the normalized statement is logged, so literal values never reach the
/// logs and the message stays groupable.
#[derive(Debug, Clone)]
pub struct SlowQueryLogger {
    /// Statements at or above this duration are reported.
    pub threshold: Duration,
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl SlowQueryLogger {
    /// Create a logger with the given threshold, emitting at `WARN`.
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            level: Level::WARN,
            max_sql_length: Some(200),
        }
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub fn is_slow(&self, duration: Duration) -> bool {
        duration >= self.threshold
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }
}

impl QueryListener for SlowQueryLogger {
    fn on_query(&self, event: &QueryEvent<'_>) {
        if !self.is_slow(event.duration) {
            return;
        }

        /// Dispatch a tracing event at a runtime-determined level.
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let sql = self.truncate_sql(&normalize(event.sql));
        emit_at_level!(
            self.level,
            target: "sqlprom.slow_query",
            query_type = %query_type(event.sql),
            duration_ms = event.duration.as_secs_f64() * 1000.0,
            threshold_ms = self.threshold.as_secs_f64() * 1000.0,
            sql = %sql,
            "slow query"
        );
    }
}
