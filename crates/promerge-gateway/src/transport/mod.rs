//! Transport layer (HTTP ingest).
//!
//! Exposes the ingest handlers and the codec that decodes bodies once before
//! they reach the aggregator.

pub mod codec;
pub mod http;
