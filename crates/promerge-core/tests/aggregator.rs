//! Merge aggregator and collector behaviour, end to end from exposition text.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::thread;

use promerge_core::protocol::exposition::parse_text;
use promerge_core::{
    AggregateCollector, IngestError, IngestSummary, MergeAggregator, MetricFamily, MetricType, Sample,
};

use vector_loader::read;

fn counter(name: &str, v: f64) -> MetricFamily {
    MetricFamily::counter(name, "").with_sample(Sample::new(format!("{name}_total"), v))
}

#[test]
fn basic_parse() {
    let agg = MergeAggregator::new();
    let summary = agg.ingest_text(&read("sample_metrics.prom")).unwrap();
    assert_eq!(summary, IngestSummary { inserted: 2, merged: 0, dropped: 2 });

    let snap = agg.snapshot();
    let names: Vec<&str> = snap.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["message_types", "runtime_seconds"]);

    let counts = MetricFamily::counter("message_types", "Message counts by time")
        .with_sample(Sample::new("message_types_total", 1.0).with_label("format", "text"))
        .with_sample(Sample::new("message_types_total", 1.0).with_label("format", "json"));
    let runtime = MetricFamily::summary("runtime_seconds", "Total runtime in seconds")
        .with_sample(Sample::new("runtime_seconds_count", 1.0))
        .with_sample(Sample::new("runtime_seconds_sum", 0.272285345));
    assert_eq!(snap, vec![counts, runtime]);
}

#[test]
fn basic_merge() {
    let agg = Arc::new(MergeAggregator::new());
    let text = read("sample_metrics.prom");
    agg.ingest_text(&text).unwrap();
    let second = agg.ingest_text(&text).unwrap();
    assert_eq!(second, IngestSummary { inserted: 0, merged: 2, dropped: 2 });

    let collector = AggregateCollector::new(Arc::clone(&agg));
    let snap = collector.snapshot();

    let counts = &snap[0];
    assert_eq!(counts.find("message_types_total", &[("format", "text")]).unwrap().value, 2.0);
    assert_eq!(counts.find("message_types_total", &[("format", "json")]).unwrap().value, 2.0);

    let runtime = &snap[1];
    assert_eq!(runtime.find("runtime_seconds_count", &[]).unwrap().value, 2.0);
    assert_eq!(runtime.find("runtime_seconds_sum", &[]).unwrap().value, 0.272285345 * 2.0);

    let out = collector.render();
    assert!(out.contains("message_types_total{format=\"text\"} 2.0\n"));
    assert!(out.contains("message_types_total{format=\"json\"} 2.0\n"));
    assert!(out.contains("runtime_seconds_count 2.0\n"));
    assert!(!out.contains("_created"));
}

#[test]
fn created_series_never_surface() {
    let agg = MergeAggregator::new();
    let text = read("sample_metrics.prom");
    for _ in 0..5 {
        agg.ingest_text(&text).unwrap();
    }
    assert!(agg.snapshot().iter().all(|f| !f.name.ends_with("_created")));
    assert_eq!(agg.len(), 2);
}

#[test]
fn custom_drop_suffixes() {
    let agg = MergeAggregator::with_drop_suffixes(vec!["_debug".into()]);
    let debug = MetricFamily::new("jobs_debug", "", MetricType::Other("gauge".into()))
        .with_sample(Sample::new("jobs_debug", 7.0));
    agg.ingest(vec![counter("jobs", 1.0), debug]).unwrap();
    let names: Vec<String> = agg.snapshot().into_iter().map(|f| f.name).collect();
    assert_eq!(names, ["jobs"]);
}

#[test]
fn snapshot_is_sorted_for_any_insertion_order() {
    let agg = MergeAggregator::new();
    agg.ingest(vec![counter("zeta", 1.0), counter("alpha", 1.0)]).unwrap();
    agg.ingest(vec![counter("mu", 1.0), counter("beta", 1.0), counter("alpha", 1.0)]).unwrap();

    let names: Vec<String> = agg.snapshot().into_iter().map(|f| f.name).collect();
    assert_eq!(names, ["alpha", "beta", "mu", "zeta"]);
}

#[test]
fn first_sight_family_is_stored_verbatim() {
    let agg = MergeAggregator::new();
    let fam = MetricFamily::counter("jobs", "Jobs run")
        .with_sample(Sample::new("jobs_total", 3.0).with_label("queue", "b").with_label("pool", "x"));
    agg.ingest(vec![fam.clone()]).unwrap();
    assert_eq!(agg.snapshot(), vec![fam]);
}

#[test]
fn bad_family_does_not_abort_batch() {
    let agg = MergeAggregator::new();
    agg.ingest_text(&read("sample_metrics.prom")).unwrap();
    let before = agg.snapshot();

    let conflict = parse_text(&read("gauge_conflict.prom")).unwrap();
    let batch = vec![
        conflict[0].clone(),
        counter("jobs", 1.0),
        conflict[1].clone(),
    ];
    let err = agg.ingest(batch).unwrap_err();

    assert_eq!(err.failures.len(), 1);
    assert_eq!(err.failures[0].client_code().as_str(), "UNSUPPORTED_METRIC_TYPE");
    assert_eq!(err.summary, IngestSummary { inserted: 2, merged: 0, dropped: 0 });

    let after = agg.snapshot();
    let message_types = after.iter().find(|f| f.name == "message_types").unwrap();
    let original = before.iter().find(|f| f.name == "message_types").unwrap();
    assert_eq!(message_types, original);
    assert!(after.iter().any(|f| f.name == "jobs"));
    assert!(after.iter().any(|f| f.name == "queue_depth"));
}

#[test]
fn gauges_insert_once_then_reject() {
    let agg = MergeAggregator::new();
    let conflict = parse_text(&read("gauge_conflict.prom")).unwrap();
    let gauge = conflict[1].clone();

    agg.ingest(vec![gauge.clone()]).unwrap();
    let err = agg.ingest(vec![gauge.clone()]).unwrap_err();
    assert_eq!(err.failures.len(), 1);
    assert_eq!(agg.snapshot(), vec![gauge]);
}

#[test]
fn parse_error_leaves_state_untouched() {
    let agg = MergeAggregator::new();
    agg.ingest(vec![counter("jobs", 1.0)]).unwrap();

    let err = agg
        .ingest_text("# TYPE jobs counter\njobs_total 1\njobs_total{ 2\n")
        .unwrap_err();
    let IngestError::Decode(err) = err else {
        panic!("expected decode error, got {err:?}");
    };
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
    assert_eq!(agg.snapshot(), vec![counter("jobs", 1.0)]);
}

#[test]
fn concurrent_ingest_and_snapshot() {
    let agg = Arc::new(MergeAggregator::new());
    let collector = AggregateCollector::new(Arc::clone(&agg));

    let batch = || {
        vec![MetricFamily::counter("pairs", "")
            .with_sample(Sample::new("pairs_total", 1.0).with_label("side", "left"))
            .with_sample(Sample::new("pairs_total", 1.0).with_label("side", "right"))]
    };

    let writers: Vec<_> = (0..4)
        .map(|_| {
            let agg = Arc::clone(&agg);
            thread::spawn(move || {
                for _ in 0..250 {
                    agg.ingest(batch()).unwrap();
                }
            })
        })
        .collect();

    // both series of a family always move together
    for _ in 0..200 {
        for fam in collector.snapshot() {
            let left = fam.find("pairs_total", &[("side", "left")]).unwrap().value;
            let right = fam.find("pairs_total", &[("side", "right")]).unwrap().value;
            assert_eq!(left, right);
        }
    }

    for w in writers {
        w.join().unwrap();
    }
    let fam = &collector.snapshot()[0];
    assert_eq!(fam.find("pairs_total", &[("side", "left")]).unwrap().value, 1000.0);
}

#[test]
fn counter_named_created_is_kept() {
    let agg = MergeAggregator::new();
    let summary = agg
        .ingest_text("# TYPE jobs_created_total counter\njobs_created_total 2\n# TYPE jobs_started_created gauge\njobs_started_created 1.5e9\n")
        .unwrap();
    assert_eq!(summary, IngestSummary { inserted: 1, merged: 0, dropped: 1 });

    let snap = agg.snapshot();
    assert_eq!(snap.len(), 1);
    assert_eq!(snap[0].metric_type, MetricType::Counter);
    assert_eq!(snap[0].find("jobs_created_total", &[]).unwrap().value, 2.0);
}

#[test]
fn repeated_series_text_is_rejected() {
    let agg = MergeAggregator::new();
    let text = "# TYPE jobs counter\njobs_total{q=\"a\"} 1\njobs_total{q=\"a\"} 1\n";
    for _ in 0..2 {
        let err = agg.ingest_text(text).unwrap_err();
        assert!(matches!(err, IngestError::Decode(_)), "{err:?}");
    }
    assert!(agg.is_empty());
}

#[test]
fn repeated_series_family_is_rejected() {
    let agg = MergeAggregator::new();
    let twice = MetricFamily::counter("jobs", "")
        .with_sample(Sample::new("jobs_total", 1.0).with_label("q", "a"))
        .with_sample(Sample::new("jobs_total", 1.0).with_label("q", "a"));

    // first sight
    let err = agg.ingest(vec![twice.clone(), counter("other", 1.0)]).unwrap_err();
    assert_eq!(err.failures.len(), 1);
    assert_eq!(err.failures[0].client_code().as_str(), "BAD_REQUEST");
    assert_eq!(err.summary.inserted, 1);
    assert!(agg.snapshot().iter().all(|f| f.name != "jobs"));

    // merge into a stored family
    let once = MetricFamily::counter("jobs", "")
        .with_sample(Sample::new("jobs_total", 1.0).with_label("q", "a"));
    agg.ingest(vec![once.clone()]).unwrap();
    let err = agg.ingest(vec![twice]).unwrap_err();
    assert_eq!(err.failures.len(), 1);

    let snap = agg.snapshot();
    let jobs = snap.iter().find(|f| f.name == "jobs").unwrap();
    assert_eq!(jobs, &once);
}
