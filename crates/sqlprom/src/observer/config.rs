use crate::error::{MetricsError, MetricsResult};
use crate::metrics::validate_buckets;
use serde::Deserialize;
use std::time::Duration;

/// Label names when the normalized statement is collected.
pub const FULL_QUERY_LABELS: &[&str] = &["query", "query_type"];
/// Label names when only the statement keyword is collected.
pub const QUERY_TYPE_LABELS: &[&str] = &["query_type"];

/// Process-wide settings for SQL duration collection.
///
/// Read once at startup. By default only the `query_type` label is recorded
/// and the registry's default buckets apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObserverConfig {
    /// Attach the normalized statement as the `query` label.
    pub collect_full_sql_query: bool,
    /// Histogram bucket boundaries in seconds. `None` uses the defaults.
    pub sql_buckets: Option<Vec<f64>>,
    /// Log statements slower than this. `None` disables slow-query logging.
    pub slow_query_threshold: Option<Duration>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PrometheusSection {
    collect_full_sql_query: bool,
    sql_buckets: Option<Vec<f64>>,
    slow_query_threshold_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    prometheus: PrometheusSection,
}

impl ObserverConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the `[prometheus]` table of a TOML document.
    ///
    /// ```toml
    /// [prometheus]
    /// collect_full_sql_query = true
    /// sql_buckets = [0.005, 0.05, 0.5, 5.0]
    /// slow_query_threshold_ms = 250
    /// ```
    ///
    /// Other top-level tables are ignored so the section can live in a
    /// larger application config.
    pub fn from_toml_str(raw: &str) -> MetricsResult<Self> {
        let doc: ConfigDocument =
            toml::from_str(raw).map_err(|e| MetricsError::config(e.to_string()))?;
        let section = doc.prometheus;
        let config = Self {
            collect_full_sql_query: section.collect_full_sql_query,
            sql_buckets: section.sql_buckets,
            slow_query_threshold: section.slow_query_threshold_ms.map(Duration::from_millis),
        };
        config.validate()?;
        Ok(config)
    }

    /// Record the normalized statement as a label.
    pub fn enable_full_query(mut self) -> Self {
        self.collect_full_sql_query = true;
        self
    }

    /// Record only the statement keyword.
    pub fn disable_full_query(mut self) -> Self {
        self.collect_full_sql_query = false;
        self
    }

    /// Set histogram bucket boundaries (seconds, strictly increasing).
    pub fn with_buckets(mut self, buckets: Vec<f64>) -> Self {
        self.sql_buckets = Some(buckets);
        self
    }

    /// Set the slow query threshold.
    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    /// Check bucket boundaries.
    pub fn validate(&self) -> MetricsResult<()> {
        if let Some(buckets) = &self.sql_buckets {
            validate_buckets(buckets)?;
        }
        Ok(())
    }

    /// Label names the histogram is registered with.
    pub fn label_names(&self) -> &'static [&'static str] {
        if self.collect_full_sql_query {
            FULL_QUERY_LABELS
        } else {
            QUERY_TYPE_LABELS
        }
    }
}
