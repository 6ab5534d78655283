//! Total order over advice entries.

use core::cmp::Ordering;
use std::sync::Arc;

use crate::advice::Order;
use crate::entry::AdviceEntry;

/// Orders entries by explicit precedence, then aspect priority, then
/// registration order.
///
/// 1. [`Order::Highest`] first, numeric values ascending, [`Order::Lowest`]
///    and unset last.
/// 2. Higher aspect priority first.
/// 3. Earlier registration first.
pub struct AdviceSorter;

impl AdviceSorter {
    /// Compares two entries.
    #[must_use]
    pub fn compare(a: &AdviceEntry, b: &AdviceEntry) -> Ordering {
        let order = |entry: &AdviceEntry| entry.order().unwrap_or(Order::Lowest);
        order(a)
            .cmp(&order(b))
            .then_with(|| b.aspect().priority().cmp(&a.aspect().priority()))
            .then_with(|| a.seq().cmp(&b.seq()))
    }

    /// Sorts `entries` in dispatch order.
    pub fn sort(entries: &mut [Arc<AdviceEntry>]) {
        entries.sort_by(|a, b| Self::compare(a, b));
    }
}
