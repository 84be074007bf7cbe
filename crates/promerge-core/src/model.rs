//! Metric family data model.
//!
//! Families and samples are plain owned values. Merging never mutates a family
//! in place: the aggregator replaces the stored family with a freshly built one.

use std::fmt;

/// One time-series observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Sample name (may carry a suffix such as `_total`, `_sum`, `_count`).
    pub name: String,
    /// Label pairs in the order they were received.
    pub labels: Vec<(String, String)>,
    pub value: f64,
}

impl Sample {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            labels: Vec::new(),
            value,
        }
    }

    /// Builder-style label append.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.push((key.into(), value.into()));
        self
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Family type tag.
///
/// `Other` keeps the raw exposition tag so a family stored on first sight can
/// be rendered back with the type it arrived with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Summary,
    Other(String),
}

impl MetricType {
    /// Parse a `# TYPE` tag.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "counter" => MetricType::Counter,
            "summary" => MetricType::Summary,
            other => MetricType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Summary => "summary",
            MetricType::Other(tag) => tag,
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named metric with its samples.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    /// Informational only; never compared by the merge.
    pub help: String,
    pub metric_type: MetricType,
    pub samples: Vec<Sample>,
}

impl MetricFamily {
    pub fn new(name: impl Into<String>, help: impl Into<String>, metric_type: MetricType) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            metric_type,
            samples: Vec::new(),
        }
    }

    pub fn counter(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self::new(name, help, MetricType::Counter)
    }

    pub fn summary(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self::new(name, help, MetricType::Summary)
    }

    /// Builder-style sample append.
    pub fn with_sample(mut self, sample: Sample) -> Self {
        self.samples.push(sample);
        self
    }

    /// Name the family is exposed under: counters keyed without `_total`
    /// are exposed with it.
    pub fn exposed_name(&self) -> String {
        match self.metric_type {
            MetricType::Counter if !self.name.ends_with("_total") => format!("{}_total", self.name),
            _ => self.name.clone(),
        }
    }

    /// Find a sample by name and exact label set (order-independent).
    pub fn find(&self, name: &str, labels: &[(&str, &str)]) -> Option<&Sample> {
        self.samples.iter().find(|s| {
            s.name == name
                && s.labels.len() == labels.len()
                && labels.iter().all(|(k, v)| s.label(k) == Some(*v))
        })
    }
}
