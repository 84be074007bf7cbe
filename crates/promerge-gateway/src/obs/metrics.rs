//! The service's own counters.
//!
//! Counters with dynamic labels backed by `DashMap`. Labels are flattened into
//! sorted key vectors to keep deterministic ordering.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use promerge_core::{BatchError, IngestSummary};

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<Vec<(String, String)>, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let mut key: Vec<(String, String)> = labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        key.sort();

        let counter = self.map.entry(key).or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        let mut key: Vec<(String, String)> = labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        key.sort();
        self.map
            .get(&key)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Render in Prometheus text exposition format, series sorted by labels.
    fn render(&self, name: &str, help: &str, out: &mut String) {
        let _ = writeln!(out, "# HELP {} {}", name, help);
        let _ = writeln!(out, "# TYPE {} counter", name);

        let mut rows: Vec<(Vec<(String, String)>, u64)> = self
            .map
            .iter()
            .map(|r| (r.key().clone(), r.value().load(Ordering::Relaxed)))
            .collect();
        rows.sort();

        for (key, val) in rows {
            let label_str = key
                .iter()
                .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
                .collect::<Vec<_>>()
                .join(",");
            let _ = writeln!(out, "{}{{{}}} {}", name, label_str, val);
        }
    }
}

#[derive(Default)]
pub struct IngestMetrics {
    pub batches: CounterVec,
    pub families: CounterVec,
    pub decode_errors: CounterVec,
}

impl IngestMetrics {
    /// Count one ingested batch and its per-family outcomes.
    pub fn record_batch(&self, source: &str, result: &Result<IngestSummary, BatchError>) {
        self.batches.inc(&[("source", source)]);

        let (summary, failed) = match result {
            Ok(s) => (*s, 0),
            Err(e) => (e.summary, e.failures.len()),
        };
        for (outcome, n) in [
            ("inserted", summary.inserted),
            ("merged", summary.merged),
            ("dropped", summary.dropped),
            ("failed", failed),
        ] {
            if n > 0 {
                self.families.add(&[("outcome", outcome)], n as u64);
            }
        }
    }

    pub fn record_decode_error(&self, source: &str, code: &str) {
        self.decode_errors.inc(&[("source", source), ("code", code)]);
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.batches.render(
            "promerge_batches_total",
            "Exposition batches ingested",
            &mut out,
        );
        self.families.render(
            "promerge_families_total",
            "Metric families by ingest outcome",
            &mut out,
        );
        self.decode_errors.render(
            "promerge_decode_errors_total",
            "Payloads rejected before ingest",
            &mut out,
        );
        out
    }
}
