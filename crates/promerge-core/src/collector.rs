//! Read-only view over a `MergeAggregator` for export.

use std::sync::Arc;

use crate::aggregator::MergeAggregator;
use crate::model::MetricFamily;
use crate::protocol::exposition;

#[derive(Clone)]
pub struct AggregateCollector {
    aggregator: Arc<MergeAggregator>,
}

impl AggregateCollector {
    pub fn new(aggregator: Arc<MergeAggregator>) -> Self {
        Self { aggregator }
    }

    /// Families sorted by name ascending.
    ///
    /// Ingestion may run concurrently, so this is a copy taken under the
    /// aggregator lock rather than a live view.
    pub fn snapshot(&self) -> Vec<MetricFamily> {
        self.aggregator.snapshot()
    }

    /// Snapshot rendered in the text exposition format.
    pub fn render(&self) -> String {
        exposition::render_text(&self.snapshot())
    }
}
