//! Lightweight in-process metrics about ingestion itself.
//!
//! Kept apart from the merged aggregate so scraping `/metrics` only ever
//! returns what producers sent. Rendered by the `/internal/metrics` handler.

pub mod metrics;

pub use metrics::IngestMetrics;
