//! promerge gateway library entry.
//!
//! This crate hosts the merge engine as a service: strict YAML config, HTTP
//! ingest endpoints, the scrape endpoint serving the merged aggregate, and the
//! gateway's own counters. It is consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
pub mod transport;
