use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::record::Record;

pub type Atomic<T> = Arc<RwLock<T>>;

#[inline]
pub fn atomic<T>(t: T) -> Atomic<T> {
    Arc::new(RwLock::new(t))
}

/// Removes the records at the given positions from `records` in one batch.
///
/// Positions are interpreted against the current ordering of `records`; the
/// relative order of surviving records is preserved. Out-of-range positions
/// are ignored.
pub fn delete_by_index(records: &mut Vec<Record>, positions: &[usize]) {
    if positions.is_empty() {
        return;
    }
    let to_delete: HashSet<usize> = positions.iter().copied().collect();
    let mut index = 0;
    records.retain(|_| {
        let keep = !to_delete.contains(&index);
        index += 1;
        keep
    });
}
