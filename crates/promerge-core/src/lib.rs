//! promerge core: metric family model, series identity, the family merger,
//! the running aggregate and its export view.
//!
//! Data flow: parsed families -> `MergeAggregator::ingest` -> shared state ->
//! `AggregateCollector::snapshot` -> exposition renderer. This crate carries
//! no transport or runtime dependencies.
//!
//! Panics, `unwrap`, and `expect` are compile-denied here; all fallible paths
//! surface as `MergeError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod aggregator;
pub mod collector;
pub mod error;
pub mod identity;
pub mod merge;
pub mod model;
pub mod protocol;

pub use aggregator::{BatchError, IngestError, IngestSummary, MergeAggregator};
pub use collector::AggregateCollector;
/// Shared result type.
pub use error::{MergeError, Result};
pub use model::{MetricFamily, MetricType, Sample};
