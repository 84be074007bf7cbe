//! Shared application state for the promerge gateway.
//!
//! The aggregator is constructed here, once, and handed by `Arc` to both the
//! ingest handlers and the scrape handler.

use std::sync::Arc;

use promerge_core::{AggregateCollector, MergeAggregator};

use crate::config::ServiceConfig;
use crate::obs::IngestMetrics;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    aggregator: Arc<MergeAggregator>,
    metrics: Arc<IngestMetrics>,
}

struct AppStateInner {
    cfg: ServiceConfig,
    collector: AggregateCollector,
}

impl AppState {
    pub fn new(cfg: ServiceConfig) -> Self {
        let aggregator = Arc::new(MergeAggregator::with_drop_suffixes(
            cfg.aggregator.drop_suffixes.clone(),
        ));
        let collector = AggregateCollector::new(Arc::clone(&aggregator));

        tracing::info!(drop_suffixes = ?cfg.aggregator.drop_suffixes, "aggregator ready");

        Self {
            inner: Arc::new(AppStateInner { cfg, collector }),
            aggregator,
            metrics: Arc::new(IngestMetrics::default()),
        }
    }

    pub fn cfg(&self) -> &ServiceConfig {
        &self.inner.cfg
    }

    pub fn aggregator(&self) -> Arc<MergeAggregator> {
        Arc::clone(&self.aggregator)
    }

    pub fn collector(&self) -> &AggregateCollector {
        &self.inner.collector
    }

    pub fn metrics(&self) -> &IngestMetrics {
        &self.metrics
    }
}
