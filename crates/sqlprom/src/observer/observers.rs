use super::config::ObserverConfig;
use super::types::{LabelSet, QueryEvent, QueryListener};
use crate::error::MetricsResult;
use crate::metrics::{HistogramHandle, HistogramSink, MetricsRegistry};
use crate::normalize::{normalize, query_type};
use std::sync::Arc;

/// Name of the exported duration histogram.
pub const METRIC_NAME: &str = "sql_query_duration";
/// Help text of the exported duration histogram.
pub const METRIC_HELP: &str = "SQL query duration histogram";

/// Register the duration histogram and build the observer that feeds it.
///
/// Run once during startup wiring. Any error here is a configuration fault
/// (see [`MetricsError::is_fatal`]) and should stop the service.
///
/// [`MetricsError::is_fatal`]: crate::error::MetricsError::is_fatal
pub fn install(
    registry: &MetricsRegistry,
    config: &ObserverConfig,
) -> MetricsResult<QueryObserver<HistogramHandle>> {
    config.validate()?;
    let handle = registry.get_or_register_histogram(
        METRIC_NAME,
        METRIC_HELP,
        config.label_names(),
        config.sql_buckets.as_deref(),
    )?;
    Ok(QueryObserver::new(handle, config.collect_full_sql_query))
}

/// Records each statement's duration into a histogram, labelled by
/// statement keyword and optionally by normalized statement text.
#[derive(Debug, Clone)]
pub struct QueryObserver<S> {
    sink: S,
    collect_full_query: bool,
}

impl<S: HistogramSink> QueryObserver<S> {
    /// Create an observer over an already registered sink.
    ///
    /// `collect_full_query` must match the label names the sink was
    /// registered with.
    pub fn new(sink: S, collect_full_query: bool) -> Self {
        Self {
            sink,
            collect_full_query,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn collects_full_query(&self) -> bool {
        self.collect_full_query
    }

    /// Labels for `sql`: `[normalized, QUERY_TYPE]` or `[QUERY_TYPE]`, with
    /// empty values dropped.
    pub fn labels(&self, sql: &str) -> LabelSet {
        let normalized = if self.collect_full_query {
            normalize(sql)
        } else {
            String::new()
        };
        LabelSet::from_candidates([normalized, query_type(sql)])
    }

    /// Record one statement. Sink failures are logged and dropped.
    pub fn record(&self, event: &QueryEvent<'_>) {
        let labels = self.labels(event.sql);
        if let Err(err) = self.sink.observe(event.duration_seconds(), &labels.as_strs()) {
            tracing::error!(
                target: "sqlprom",
                error = %err,
                labels = ?labels.values(),
                "dropped sql duration sample"
            );
        }
    }
}

impl<S: HistogramSink> QueryListener for QueryObserver<S> {
    fn on_query(&self, event: &QueryEvent<'_>) {
        self.record(event);
    }
}

/// A listener that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl QueryListener for NoopListener {
    fn on_query(&self, _event: &QueryEvent<'_>) {}
}

/// Delivers each event to several listeners, in insertion order.
#[derive(Default)]
pub struct CompositeListener {
    listeners: Vec<Arc<dyn QueryListener>>,
}

impl CompositeListener {
    /// Create an empty composite listener.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener.
    #[allow(clippy::should_implement_trait)]
    pub fn add<L: QueryListener + 'static>(mut self, listener: L) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    /// Add an Arc-wrapped listener.
    pub fn add_arc(mut self, listener: Arc<dyn QueryListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl QueryListener for CompositeListener {
    fn on_query(&self, event: &QueryEvent<'_>) {
        for listener in &self.listeners {
            listener.on_query(event);
        }
    }
}
