//! Child grouping: bucket child summaries by enclosing parent period.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::layer::Layer;
use crate::period::PeriodWindower;
use crate::summary::ChildSummary;

/// Parent period start -> child summaries in that period, oldest first.
pub type ChildBuckets = BTreeMap<NaiveDate, Vec<ChildSummary>>;

/// Partition child summaries into buckets keyed by the parent period start.
///
/// The key comes from each child's own `period_start`, which is already a
/// local calendar date in the owner's zone. Every child lands in exactly one
/// bucket; periods without children get no bucket. Children of any layer
/// other than `parent.child()` are ignored.
pub fn group_children(
    children: impl IntoIterator<Item = ChildSummary>,
    parent: Layer,
    windower: &PeriodWindower,
) -> ChildBuckets {
    let child_layer = parent.child();
    let mut buckets = ChildBuckets::new();

    for child in children {
        if Some(child.layer) != child_layer {
            continue;
        }
        let key = windower.key_for(child.period_start, parent);
        buckets.entry(key).or_default().push(child);
    }

    for bucket in buckets.values_mut() {
        bucket.sort_by_key(|child| (child.period_start, child.created_at));
    }

    buckets
}
