//! Family merge by sample identity.
//!
//! Accumulation rule: a series present on both sides is summed, a series only
//! present in the incoming family is appended. Each ingested family is treated
//! as an independent increment report, never as a cumulative total.

use std::collections::{HashMap, HashSet};

use crate::error::{MergeError, Result};
use crate::identity::SeriesId;
use crate::model::{MetricFamily, MetricType, Sample};

/// Add `new`'s value onto `old`, keeping `old`'s name and labels.
pub fn add_samples(old: &Sample, new: &Sample) -> Sample {
    Sample {
        name: old.name.clone(),
        labels: old.labels.clone(),
        value: old.value + new.value,
    }
}

/// Reject a family that carries the same series more than once.
pub fn check_unique(family: &MetricFamily) -> Result<()> {
    let mut seen = HashSet::with_capacity(family.samples.len());
    for sample in &family.samples {
        let id = SeriesId::of(sample);
        if seen.contains(&id) {
            return Err(MergeError::BadRequest(format!(
                "duplicate series {} {:?} in family {}",
                id.name, id.labels, family.name
            )));
        }
        seen.insert(id);
    }
    Ok(())
}

/// Merge two counter-like families into a new family.
///
/// The result keeps `existing`'s name, help and type. Existing samples come
/// first in their original order, unseen incoming samples are appended in
/// arrival order. `incoming` must not repeat a series.
pub fn merge_counter(existing: &MetricFamily, incoming: &MetricFamily) -> Result<MetricFamily> {
    if existing.name != incoming.name {
        return Err(MergeError::NameMismatch {
            existing: existing.name.clone(),
            incoming: incoming.name.clone(),
        });
    }
    check_unique(incoming)?;

    let mut samples = existing.samples.clone();
    let mut index: HashMap<SeriesId, usize> = samples
        .iter()
        .enumerate()
        .map(|(i, s)| (SeriesId::of(s), i))
        .collect();

    for sample in &incoming.samples {
        let id = SeriesId::of(sample);
        match index.get(&id) {
            Some(&pos) => {
                if let Some(slot) = samples.get_mut(pos) {
                    *slot = add_samples(slot, sample);
                }
            }
            None => {
                index.insert(id, samples.len());
                samples.push(sample.clone());
            }
        }
    }

    Ok(MetricFamily {
        name: existing.name.clone(),
        help: existing.help.clone(),
        metric_type: existing.metric_type.clone(),
        samples,
    })
}

/// Merge entry point with type dispatch on the stored family.
///
/// Summaries are merged as counters: count, sum and quantile sub-series are
/// all accumulated by summation. This is only valid for producers that report
/// summaries as increments; true streaming quantiles cannot be merged here.
pub fn merge_family(existing: &MetricFamily, incoming: &MetricFamily) -> Result<MetricFamily> {
    if existing.metric_type != incoming.metric_type {
        return Err(MergeError::UnsupportedMetricType {
            name: incoming.name.clone(),
            metric_type: incoming.metric_type.to_string(),
        });
    }

    match &existing.metric_type {
        MetricType::Counter | MetricType::Summary => merge_counter(existing, incoming),
        MetricType::Other(tag) => Err(MergeError::UnsupportedMetricType {
            name: existing.name.clone(),
            metric_type: tag.clone(),
        }),
    }
}
