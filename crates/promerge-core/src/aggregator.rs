//! Running aggregate of all ingested metric families.
//!
//! One `MergeAggregator` is constructed by the hosting service and shared by
//! reference (`Arc`) between the ingestion path and the scrape path. The whole
//! state sits behind a single mutex held for one `ingest` batch or one
//! snapshot, so readers only ever see the pre- or post-state of a batch.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::error::MergeError;
use crate::merge::{check_unique, merge_family};
use crate::model::MetricFamily;
use crate::protocol::exposition;

/// Suffix of creation-timestamp auxiliary families.
pub const CREATED_SUFFIX: &str = "_created";

/// Per-batch outcome counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Families stored on first sight.
    pub inserted: usize,
    /// Families merged into an existing entry.
    pub merged: usize,
    /// Auxiliary families filtered out before merge.
    pub dropped: usize,
}

impl IngestSummary {
    pub fn absorb(&mut self, other: IngestSummary) {
        self.inserted += other.inserted;
        self.merged += other.merged;
        self.dropped += other.dropped;
    }
}

/// Returned when at least one family of a batch could not be merged.
///
/// Families that did merge stay applied; `summary` counts them.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchError {
    pub summary: IngestSummary,
    pub failures: Vec<MergeError>,
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} families failed to merge", self.failures.len())?;
        if let Some(first) = self.failures.first() {
            write!(f, " (first: {first})")?;
        }
        Ok(())
    }
}

impl std::error::Error for BatchError {}

/// Failure of `MergeAggregator::ingest_text`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    /// The text did not parse; nothing was applied.
    #[error(transparent)]
    Decode(#[from] MergeError),
    /// The text parsed but some families were rejected; the rest were applied.
    #[error(transparent)]
    Batch(#[from] BatchError),
}

pub struct MergeAggregator {
    state: Mutex<BTreeMap<String, MetricFamily>>,
    drop_suffixes: Vec<String>,
}

impl Default for MergeAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl MergeAggregator {
    pub fn new() -> Self {
        Self::with_drop_suffixes(vec![CREATED_SUFFIX.to_string()])
    }

    /// Families whose exposed name ends with any of `drop_suffixes` are
    /// discarded.
    pub fn with_drop_suffixes(drop_suffixes: Vec<String>) -> Self {
        Self {
            state: Mutex::new(BTreeMap::new()),
            drop_suffixes,
        }
    }

    // Merges build a new family before replacing the old one, so a panic can
    // never leave a half-merged entry behind and the poison flag is ignored.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, MetricFamily>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Matched against the exposed name so a counter such as
    // `jobs_created_total` is not mistaken for a creation-time series.
    fn is_auxiliary(&self, family: &MetricFamily) -> bool {
        let exposed = family.exposed_name();
        self.drop_suffixes.iter().any(|s| exposed.ends_with(s.as_str()))
    }

    /// Fold a batch of families into the aggregate, in arrival order.
    ///
    /// A family that fails to merge, or repeats one of its own series, leaves
    /// the stored entry for its name untouched; the rest of the batch is still
    /// applied.
    pub fn ingest(&self, batch: Vec<MetricFamily>) -> Result<IngestSummary, BatchError> {
        let mut summary = IngestSummary::default();
        let mut failures = Vec::new();

        let mut state = self.lock();
        for family in batch {
            if self.is_auxiliary(&family) {
                tracing::trace!(family = %family.name, "dropping auxiliary family");
                summary.dropped += 1;
                continue;
            }

            let outcome = match state.get(&family.name) {
                None => check_unique(&family).map(|()| None),
                Some(existing) => merge_family(existing, &family).map(Some),
            };

            match outcome {
                Ok(None) => {
                    tracing::debug!(family = %family.name, samples = family.samples.len(), "inserted");
                    summary.inserted += 1;
                    state.insert(family.name.clone(), family);
                }
                Ok(Some(merged)) => {
                    tracing::debug!(family = %merged.name, samples = merged.samples.len(), "merged");
                    summary.merged += 1;
                    state.insert(merged.name.clone(), merged);
                }
                Err(e @ MergeError::NameMismatch { .. }) => {
                    tracing::error!(error = %e, "merge invoked across family names");
                    failures.push(e);
                }
                Err(e) => {
                    tracing::warn!(family = %family.name, error = %e, "family rejected");
                    failures.push(e);
                }
            }
        }
        drop(state);

        if failures.is_empty() {
            Ok(summary)
        } else {
            Err(BatchError { summary, failures })
        }
    }

    /// Parse exposition text and ingest the resulting families.
    ///
    /// Parse errors reject the whole text before any state changes.
    pub fn ingest_text(&self, text: &str) -> Result<IngestSummary, IngestError> {
        let families = exposition::parse_text(text)?;
        Ok(self.ingest(families)?)
    }

    /// Name-sorted frozen copy of the aggregate.
    pub fn snapshot(&self) -> Vec<MetricFamily> {
        self.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
