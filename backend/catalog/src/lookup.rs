use std::collections::HashMap;

use store::RawRecord;

/// Record id to record, borrowed from the fetched collection.
pub type Lookup<'a, T> = HashMap<&'a str, &'a RawRecord<T>>;

pub fn build_lookup<T>(records: &[RawRecord<T>]) -> Lookup<'_, T> {
    records
        .iter()
        .map(|record| (record.id.as_str(), record))
        .collect()
}

/// Resolves ids through `lookup`, keeping order and skipping dangling ids.
pub fn resolve<'a, T, U>(
    ids: Option<&'a Vec<String>>,
    lookup: &Lookup<'a, T>,
    mut view: impl FnMut(&'a RawRecord<T>) -> Option<U>,
) -> Vec<U> {
    ids.into_iter()
        .flatten()
        .filter_map(|id| lookup.get(id.as_str()).and_then(|record| view(*record)))
        .collect()
}
