//! Derive downstream work lists from upstream cache entries

use std::collections::BTreeSet;

use crate::error::ResolveError;
use crate::key::{EntityId, Partition};
use crate::kind::EntityKind;
use crate::store::EntityStore;

/// Union of `column` values across every stored `upstream` entry.
///
/// Reads the store on every call so the result always reflects resumed
/// progress. Fails with [`ResolveError::DependencyUnavailable`] when the
/// upstream stage has stored nothing yet for this partition.
pub fn derive_ids(
    store: &EntityStore,
    partition: &Partition,
    upstream: EntityKind,
    column: &str,
) -> Result<BTreeSet<EntityId>, ResolveError> {
    let mut ids = BTreeSet::new();
    let mut entries = 0usize;

    for entry in store.list_entries(partition, upstream)? {
        let entry = entry?;
        entries += 1;
        match entry.record.column(column) {
            Some(cells) => ids.extend(cells.filter_map(EntityId::from_value)),
            None => log::warn!(
                "{upstream} {} in {partition} has no {column} column, skipping",
                entry.id
            ),
        };
    }

    if entries == 0 {
        return Err(ResolveError::DependencyUnavailable {
            partition: partition.clone(),
            kind: upstream,
            column: column.to_string(),
        });
    }

    log::debug!(
        "derived {} ids from {column} across {entries} {upstream} entries",
        ids.len()
    );
    Ok(ids)
}
