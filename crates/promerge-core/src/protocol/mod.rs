//! Wire formats handled by the core.
//!
//! - Exposition: Prometheus text blocks in and out.
//! - CloudWatch: subscription envelopes wrapping exposition text in log events.
//!
//! All parsers are panic-free: malformed input is reported as `MergeError`
//! instead of panicking or indexing raw buffers.

pub mod cloudwatch;
pub mod exposition;
