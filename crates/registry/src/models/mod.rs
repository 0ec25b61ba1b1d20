#![forbid(unsafe_code)]

mod dataset;
mod stage;
mod workflow;

pub use dataset::*;
pub use stage::*;
pub use workflow::*;

use std::collections::BTreeMap;

/// Result of a publish: the saved record plus its tag. Publishing an
/// already-tagged version is not an error; `already_published` tells the
/// caller to warn instead.
#[derive(Clone, Debug)]
pub struct PublishOutcome<T> {
    pub record: T,
    pub tag: i64,
    pub already_published: bool,
}

/// Three-level find grouping: name, then split/category (`"-"` when the
/// kind has none), then the matching records in listing order.
pub type VersionTree<T> = BTreeMap<String, BTreeMap<String, Vec<T>>>;

pub(crate) fn group_records<T>(
    records: Vec<T>,
    name: impl Fn(&T) -> String,
    category: impl Fn(&T) -> String,
) -> VersionTree<T> {
    let mut tree: VersionTree<T> = BTreeMap::new();
    for record in records {
        tree.entry(name(&record))
            .or_default()
            .entry(category(&record))
            .or_default()
            .push(record);
    }
    tree
}

/// RFC 3339 rendering of an epoch-milliseconds creation stamp, for
/// display only; the raw value stays the source of truth.
pub(crate) fn format_timestamp_ms(ms: i64) -> Option<String> {
    let nanos = (ms as i128).checked_mul(1_000_000)?;
    let stamp = time::OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()?;
    stamp
        .format(&time::format_description::well_known::Rfc3339)
        .ok()
}
