//! Histogram storage backed by the `prometheus` crate.
//!
//! [`MetricsRegistry`] owns a [`prometheus::Registry`] and hands out
//! [`HistogramHandle`]s through an idempotent get-or-register call. Handles
//! are cheap to clone and safe to observe from any thread.
//!
//! The get-or-register bookkeeping lives on the wrapper, so each
//! [`prometheus::Registry`] should be wrapped by exactly one
//! [`MetricsRegistry`]. Share the wrapper (behind an `Arc`) rather than
//! wrapping the same Prometheus registry twice.

use crate::error::{MetricsError, MetricsResult};
use prometheus::core::Collector;
use prometheus::proto;
use prometheus::{Encoder, HistogramOpts, HistogramVec, Registry, TextEncoder};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Destination for duration samples.
///
/// Implementations own their synchronization: `observe` is called
/// concurrently from every thread that executes queries.
pub trait HistogramSink: Send + Sync {
    /// Record `value` under `label_values`.
    ///
    /// `label_values` must line up, in count and order, with the label names
    /// the sink was registered with.
    fn observe(&self, value: f64, label_values: &[&str]) -> MetricsResult<()>;
}

impl<S: HistogramSink + ?Sized> HistogramSink for Arc<S> {
    fn observe(&self, value: f64, label_values: &[&str]) -> MetricsResult<()> {
        (**self).observe(value, label_values)
    }
}

/// A registered histogram family.
#[derive(Clone)]
pub struct HistogramHandle {
    name: Arc<str>,
    label_names: Arc<[String]>,
    vec: HistogramVec,
}

impl fmt::Debug for HistogramHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistogramHandle")
            .field("name", &self.name)
            .field("label_names", &self.label_names)
            .finish()
    }
}

impl HistogramHandle {
    /// Metric name this handle was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Label names, in registration order.
    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    fn check_arity(&self, label_values: &[&str]) -> MetricsResult<()> {
        if label_values.len() != self.label_names.len() {
            return Err(MetricsError::LabelCount {
                expected: self.label_names.len(),
                actual: label_values.len(),
            });
        }
        Ok(())
    }

    /// Current state of the series for `label_values`, if it was ever observed.
    ///
    /// Reads go through `collect()` so that looking at a series never creates it.
    fn snapshot(&self, label_values: &[&str]) -> MetricsResult<Option<proto::Histogram>> {
        self.check_arity(label_values)?;
        let families = self.vec.collect();
        let found = families
            .iter()
            .flat_map(|family| family.get_metric())
            .find(|metric| {
                let pairs = metric.get_label();
                pairs.len() == self.label_names.len()
                    && self.label_names.iter().zip(label_values).all(|(name, value)| {
                        pairs
                            .iter()
                            .any(|p| p.get_name() == name && p.get_value() == *value)
                    })
            })
            .map(|metric| metric.get_histogram().clone());
        Ok(found)
    }

    /// Number of samples recorded under `label_values`. Zero for an unseen series.
    pub fn sample_count(&self, label_values: &[&str]) -> MetricsResult<u64> {
        Ok(self
            .snapshot(label_values)?
            .map_or(0, |h| h.get_sample_count()))
    }

    /// Sum of samples recorded under `label_values`. Zero for an unseen series.
    pub fn sample_sum(&self, label_values: &[&str]) -> MetricsResult<f64> {
        Ok(self
            .snapshot(label_values)?
            .map_or(0.0, |h| h.get_sample_sum()))
    }

    /// Cumulative `(upper_bound, count)` pairs for `label_values`. Empty for an
    /// unseen series.
    pub fn bucket_counts(&self, label_values: &[&str]) -> MetricsResult<Vec<(f64, u64)>> {
        Ok(self
            .snapshot(label_values)?
            .map(|h| {
                h.get_bucket()
                    .iter()
                    .map(|b| (b.get_upper_bound(), b.get_cumulative_count()))
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl HistogramSink for HistogramHandle {
    fn observe(&self, value: f64, label_values: &[&str]) -> MetricsResult<()> {
        self.check_arity(label_values)?;
        self.vec
            .get_metric_with_label_values(label_values)?
            .observe(value);
        Ok(())
    }
}

struct Registered {
    help: String,
    label_names: Vec<String>,
    buckets: Vec<f64>,
    handle: HistogramHandle,
}

/// Process-wide metric registry.
///
/// Create one during startup, register histograms, then share the handles.
pub struct MetricsRegistry {
    registry: Registry,
    histograms: Mutex<HashMap<String, Registered>>,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    /// Create a registry with its own, empty Prometheus registry.
    pub fn new() -> Self {
        Self::with_registry(Registry::new())
    }

    /// Register into an existing Prometheus registry (e.g. the one an
    /// exporter already serves).
    pub fn with_registry(registry: Registry) -> Self {
        Self {
            registry,
            histograms: Mutex::new(HashMap::new()),
        }
    }

    /// The underlying Prometheus registry.
    pub fn prometheus(&self) -> &Registry {
        &self.registry
    }

    /// Return the histogram registered under `name`, registering it first if
    /// needed.
    ///
    /// `buckets` of `None` selects [`prometheus::DEFAULT_BUCKETS`]. Calling
    /// again with the same name but a different help text, label names or
    /// buckets fails with [`MetricsError::RegistrationMismatch`]; the first
    /// registration stays in effect. So does a name that another wrapper
    /// already registered in the same Prometheus registry.
    pub fn get_or_register_histogram(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
        buckets: Option<&[f64]>,
    ) -> MetricsResult<HistogramHandle> {
        let buckets = match buckets {
            Some(b) => {
                validate_buckets(b)?;
                b.to_vec()
            }
            None => prometheus::DEFAULT_BUCKETS.to_vec(),
        };

        let mut histograms = self
            .histograms
            .lock()
            .map_err(|_| MetricsError::Other("histogram registry lock poisoned".to_string()))?;

        if let Some(existing) = histograms.get(name) {
            if existing.help != help {
                return Err(MetricsError::registration_mismatch(
                    name,
                    format!(
                        "help {:?} differs from registered {:?}",
                        help, existing.help
                    ),
                ));
            }
            let same_labels = existing
                .label_names
                .iter()
                .map(String::as_str)
                .eq(label_names.iter().copied());
            if !same_labels {
                return Err(MetricsError::registration_mismatch(
                    name,
                    format!(
                        "label names {:?} differ from registered {:?}",
                        label_names, existing.label_names
                    ),
                ));
            }
            if existing.buckets != buckets {
                return Err(MetricsError::registration_mismatch(
                    name,
                    format!(
                        "buckets {:?} differ from registered {:?}",
                        buckets, existing.buckets
                    ),
                ));
            }
            return Ok(existing.handle.clone());
        }

        let opts = HistogramOpts::new(name, help).buckets(buckets.clone());
        let vec = HistogramVec::new(opts, label_names)?;
        self.registry
            .register(Box::new(vec.clone()))
            .map_err(|e| match e {
                prometheus::Error::AlreadyReg => MetricsError::registration_mismatch(
                    name,
                    "already registered in the underlying Prometheus registry \
                     by another MetricsRegistry",
                ),
                other => MetricsError::Prometheus(other),
            })?;

        let owned_labels: Vec<String> = label_names.iter().map(|s| s.to_string()).collect();
        let handle = HistogramHandle {
            name: Arc::from(name),
            label_names: Arc::from(owned_labels.clone()),
            vec,
        };
        tracing::debug!(
            target: "sqlprom",
            metric = name,
            labels = ?label_names,
            buckets = ?buckets,
            "registered histogram"
        );
        histograms.insert(
            name.to_string(),
            Registered {
                help: help.to_string(),
                label_names: owned_labels,
                buckets,
                handle: handle.clone(),
            },
        );
        Ok(handle)
    }

    /// Render every metric in the Prometheus text exposition format.
    pub fn encode_text(&self) -> MetricsResult<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| MetricsError::Other(e.to_string()))
    }
}

/// Bucket boundaries must be non-empty, finite and strictly increasing.
pub fn validate_buckets(buckets: &[f64]) -> MetricsResult<()> {
    if buckets.is_empty() {
        return Err(MetricsError::invalid_buckets("bucket list is empty"));
    }
    if let Some(b) = buckets.iter().find(|b| !b.is_finite()) {
        return Err(MetricsError::invalid_buckets(format!(
            "bucket boundary {b} is not finite"
        )));
    }
    if let Some(pair) = buckets.windows(2).find(|w| w[0] >= w[1]) {
        return Err(MetricsError::invalid_buckets(format!(
            "boundaries must be strictly increasing, found {} before {}",
            pair[0], pair[1]
        )));
    }
    Ok(())
}
