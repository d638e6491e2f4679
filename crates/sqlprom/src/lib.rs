//! # sqlprom
//!
//! SQL query duration histograms with low-cardinality labels, for Prometheus.
//!
//! ## Features
//!
//! - **Normalization**: literals and value lists are masked so every execution
//!   of a statement shape maps to one label (`normalize`)
//! - **Query type**: the leading keyword (`SELECT`, `INSERT`, ...) as its own label
//! - **Histogram registry**: idempotent get-or-register on top of `prometheus`,
//!   with schema mismatches reported at startup
//! - **Hook-friendly**: a single-method `QueryListener` the host's query hook
//!   calls synchronously; recording never fails the query
//!
//! ## Wiring
//!
//! ```rust
//! use sqlprom::{install, MetricsRegistry, ObserverConfig, QueryEvent, QueryListener};
//!
//! let registry = MetricsRegistry::new();
//! let observer = install(&registry, &ObserverConfig::new())?;
//!
//! observer.on_query(&QueryEvent::from_secs_f64("SELECT 1", 0.002));
//! assert!(registry.encode_text()?.contains("sql_query_duration_count"));
//! # Ok::<(), sqlprom::MetricsError>(())
//! ```

pub mod error;
pub mod metrics;
pub mod normalize;
pub mod observer;

pub use error::{MetricsError, MetricsResult};
pub use metrics::{HistogramHandle, HistogramSink, MetricsRegistry};
pub use normalize::{ERROR_SENTINEL, normalize, query_type};
pub use observer::{
    CompositeListener, LabelSet, METRIC_HELP, METRIC_NAME, NoopListener, ObserverConfig,
    QueryEvent, QueryListener, QueryObserver, SlowQueryLogger, install,
};
