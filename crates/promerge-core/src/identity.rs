//! Series identity: sample name plus label pairs in canonical order.

use crate::model::Sample;

/// Identity of one series.
///
/// Labels are sorted so that insertion order never affects equality. A sample
/// without labels has an empty label list, which compares unequal to every
/// non-empty list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesId {
    pub name: String,
    pub labels: Vec<(String, String)>,
}

impl SeriesId {
    pub fn of(sample: &Sample) -> Self {
        let mut labels = sample.labels.clone();
        labels.sort();
        Self {
            name: sample.name.clone(),
            labels,
        }
    }
}
