//! Grouped views over a set of catalog entries.
//!
//! The groups borrow from the input slice; nothing is cloned. `BTreeMap`
//! keeps group keys in a stable sorted order so listings render the same way
//! on every request.

use std::collections::BTreeMap;

use crate::types::MetadataRecord;

/// A catalog entry as consumed by the grouping views. Path is absent for
/// shared files that never lived on a device.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub name: String,
    pub path: Option<String>,
    pub metadata: Option<MetadataRecord>,
    pub content: String,
}

/// Three parallel views over the same entries. Entries without metadata
/// appear in `all` but in neither keyed view.
#[derive(Debug, Default)]
pub struct GroupedCatalog<'a> {
    pub by_device_type: BTreeMap<&'a str, Vec<&'a CatalogEntry>>,
    pub by_brand: BTreeMap<&'a str, Vec<&'a CatalogEntry>>,
    pub all: Vec<&'a CatalogEntry>,
}

pub fn group_by_metadata(entries: &[CatalogEntry]) -> GroupedCatalog<'_> {
    let mut grouped = GroupedCatalog::default();
    for entry in entries {
        grouped.all.push(entry);
        let Some(meta) = &entry.metadata else { continue };
        grouped.by_device_type.entry(meta.device_type.as_str()).or_default().push(entry);
        grouped.by_brand.entry(meta.brand.as_str()).or_default().push(entry);
    }
    grouped
}
