use std::time::Duration;

/// One executed statement, as delivered by the host's query hook.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryEvent<'a> {
    /// Statement text as executed (parameters may be inlined).
    pub sql: &'a str,
    /// Wall-clock execution time.
    pub duration: Duration,
}

impl<'a> QueryEvent<'a> {
    /// Create an event from a measured duration.
    pub fn new(sql: &'a str, duration: Duration) -> Self {
        Self { sql, duration }
    }

    /// Create an event from elapsed seconds.
    ///
    /// Negative, NaN or overflowing values clamp to zero rather than panic.
    pub fn from_secs_f64(sql: &'a str, seconds: f64) -> Self {
        Self {
            sql,
            duration: Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO),
        }
    }

    /// Duration in fractional seconds, the histogram's unit.
    pub fn duration_seconds(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}

/// Ordered label values with empty candidates removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet {
    values: Vec<String>,
}

impl LabelSet {
    /// Keep the non-empty candidates, preserving their order.
    pub fn from_candidates<I>(candidates: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            values: candidates.into_iter().filter(|v| !v.is_empty()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Borrowed view in the shape [`HistogramSink::observe`] expects.
    ///
    /// [`HistogramSink::observe`]: crate::metrics::HistogramSink::observe
    pub fn as_strs(&self) -> Vec<&str> {
        self.values.iter().map(String::as_str).collect()
    }
}

/// Single-method capability the host's query hook calls once per statement.
///
/// Called synchronously on the thread that ran the query, so implementations
/// must not block and must not fail the caller.
pub trait QueryListener: Send + Sync {
    fn on_query(&self, event: &QueryEvent<'_>);
}
