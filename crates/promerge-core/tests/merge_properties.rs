//! Family merger behaviour.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use promerge_core::merge::{add_samples, check_unique, merge_counter, merge_family};
use promerge_core::{MetricFamily, MetricType, Sample};

fn message_types(text: f64, json: f64) -> MetricFamily {
    MetricFamily::counter("message_types", "Message counts by time")
        .with_sample(Sample::new("message_types_total", text).with_label("format", "text"))
        .with_sample(Sample::new("message_types_total", json).with_label("format", "json"))
}

fn value(f: &MetricFamily, format: &str) -> f64 {
    f.find("message_types_total", &[("format", format)])
        .expect("series present")
        .value
}

#[test]
fn add_counter_samples() {
    let total = add_samples(&Sample::new("first", 22.0), &Sample::new("second", 44.1));
    assert_eq!(total.name, "first");
    assert!(total.labels.is_empty());
    assert_eq!(total.value, 22.0 + 44.1);
}

#[test]
fn merge_with_itself_doubles() {
    let count = message_types(1.0, 1.0);
    let merged = merge_counter(&count, &count).unwrap();
    assert_eq!(merged, message_types(2.0, 2.0));
    // inputs are borrowed, never touched
    assert_eq!(count, message_types(1.0, 1.0));
}

#[test]
fn new_label_set_is_appended() {
    let text_only = MetricFamily::counter("message_types", "Message counts by time")
        .with_sample(Sample::new("message_types_total", 1.0).with_label("format", "text"));
    let json_only = MetricFamily::counter("message_types", "Message counts by time")
        .with_sample(Sample::new("message_types_total", 1.0).with_label("format", "json"));

    let merged = merge_counter(&text_only, &json_only).unwrap();
    assert_eq!(merged, message_types(1.0, 1.0));
}

#[test]
fn label_order_does_not_split_series() {
    let a = MetricFamily::counter("req", "")
        .with_sample(Sample::new("req_total", 1.0).with_label("a", "1").with_label("b", "2"));
    let b = MetricFamily::counter("req", "")
        .with_sample(Sample::new("req_total", 4.0).with_label("b", "2").with_label("a", "1"));

    let merged = merge_family(&a, &b).unwrap();
    assert_eq!(merged.samples.len(), 1);
    assert_eq!(merged.samples[0].value, 5.0);
    // existing label order wins
    assert_eq!(merged.samples[0].labels[0].0, "a");
}

#[test]
fn commutative_and_associative() {
    let a = message_types(1.0, 2.0);
    let b = MetricFamily::counter("message_types", "")
        .with_sample(Sample::new("message_types_total", 4.0).with_label("format", "json"))
        .with_sample(Sample::new("message_types_total", 8.0).with_label("format", "xml"));
    let c = message_types(16.0, 32.0);

    let orders = [
        merge_family(&merge_family(&a, &b).unwrap(), &c).unwrap(),
        merge_family(&a, &merge_family(&b, &c).unwrap()).unwrap(),
        merge_family(&merge_family(&a, &c).unwrap(), &b).unwrap(),
        merge_family(&merge_family(&c, &b).unwrap(), &a).unwrap(),
    ];

    for merged in &orders {
        assert_eq!(value(merged, "text"), 17.0);
        assert_eq!(value(merged, "json"), 38.0);
        assert_eq!(merged.find("message_types_total", &[("format", "xml")]).unwrap().value, 8.0);
        assert_eq!(merged.samples.len(), 3);
    }
}

#[test]
fn summary_merges_like_counter() {
    let runtime = MetricFamily::summary("runtime_seconds", "Total runtime in seconds")
        .with_sample(Sample::new("runtime_seconds_count", 1.0))
        .with_sample(Sample::new("runtime_seconds_sum", 0.272285345));

    let merged = merge_family(&runtime, &runtime).unwrap();
    assert_eq!(merged.find("runtime_seconds_count", &[]).unwrap().value, 2.0);
    assert_eq!(merged.find("runtime_seconds_sum", &[]).unwrap().value, 0.272285345 * 2.0);
}

#[test]
fn other_types_are_rejected() {
    let gauge = MetricFamily::new("queue_depth", "", MetricType::Other("gauge".into()))
        .with_sample(Sample::new("queue_depth", 3.0));

    let err = merge_family(&gauge, &gauge).unwrap_err();
    assert_eq!(err.client_code().as_str(), "UNSUPPORTED_METRIC_TYPE");
}

#[test]
fn type_change_is_rejected() {
    let counter = message_types(1.0, 1.0);
    let mut gauge = message_types(1.0, 1.0);
    gauge.metric_type = MetricType::Other("gauge".into());

    let err = merge_family(&counter, &gauge).unwrap_err();
    assert_eq!(err.client_code().as_str(), "UNSUPPORTED_METRIC_TYPE");
    assert!(err.to_string().contains("gauge"));
}

#[test]
fn name_mismatch_is_a_defect() {
    let a = message_types(1.0, 1.0);
    let b = MetricFamily::counter("other", "");
    let err = merge_counter(&a, &b).unwrap_err();
    assert_eq!(err.client_code().as_str(), "NAME_MISMATCH");
}

#[test]
fn repeated_incoming_series_is_rejected() {
    let existing = message_types(1.0, 1.0);
    let incoming = MetricFamily::counter("message_types", "")
        .with_sample(Sample::new("message_types_total", 1.0).with_label("format", "text"))
        .with_sample(Sample::new("message_types_total", 5.0).with_label("format", "text"));

    assert!(check_unique(&existing).is_ok());
    assert!(check_unique(&incoming).is_err());

    let err = merge_counter(&existing, &incoming).unwrap_err();
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}
