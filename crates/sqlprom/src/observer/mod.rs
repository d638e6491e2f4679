//! Per-statement duration recording.
//!
//! This module provides:
//! - [`QueryListener`], the single-method callback a host's query hook drives
//! - [`QueryObserver`], which turns each statement into histogram labels and
//!   records its duration
//! - helper listeners for fan-out and slow-query logging
//!
//! # Example
//!
//! ```rust
//! use sqlprom::metrics::MetricsRegistry;
//! use sqlprom::observer::{install, ObserverConfig, QueryEvent, QueryListener};
//! use std::time::Duration;
//!
//! // Startup: register once, fail fast on schema errors.
//! let registry = MetricsRegistry::new();
//! let config = ObserverConfig::new().enable_full_query();
//! let observer = install(&registry, &config).expect("metrics schema");
//!
//! // Per query, from the host's hook.
//! observer.on_query(&QueryEvent::new(
//!     "SELECT * FROM users WHERE id = 42",
//!     Duration::from_millis(13),
//! ));
//!
//! let count = observer
//!     .sink()
//!     .sample_count(&["select * from users where id = ?", "SELECT"])
//!     .unwrap();
//! assert_eq!(count, 1);
//! ```

mod config;
mod observers;
mod tracing_hook;
mod types;


pub use config::{FULL_QUERY_LABELS, ObserverConfig, QUERY_TYPE_LABELS};
pub use observers::{
    CompositeListener, METRIC_HELP, METRIC_NAME, NoopListener, QueryObserver, install,
};
pub use tracing_hook::SlowQueryLogger;
pub use types::{LabelSet, QueryEvent, QueryListener};

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
