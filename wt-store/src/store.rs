use std::ops::Index;

use indexmap::IndexMap;

use crate::record::WeightRecord;
use crate::result::{WeightError, WeightResult};

/// Named weight records, as produced by a single load pass.
///
/// Records are never mutated once inserted, derived records are only ever added under new names.
#[derive(Debug, Default, Clone)]
pub struct WeightStore {
    records: IndexMap<String, WeightRecord>,
}

impl WeightStore {
    pub fn new() -> Self {
        WeightStore::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&WeightRecord> {
        self.records.get(name)
    }

    pub fn require(&self, name: &str) -> WeightResult<&WeightRecord> {
        self.records
            .get(name)
            .ok_or_else(|| WeightError::MissingWeight(name.to_owned()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeightRecord> {
        self.records.values()
    }

    pub fn total_bytes(&self) -> usize {
        self.records.values().map(|r| r.bytes().len()).sum()
    }

    pub(crate) fn insert_loaded(&mut self, record: WeightRecord) {
        let prev = self.records.insert(record.name().to_owned(), record);
        assert!(prev.is_none(), "Each name can only be loaded once");
    }

    /// Add a record derived from existing ones, under its own name.
    pub fn insert_derived(&mut self, record: WeightRecord) -> WeightResult<()> {
        if self.records.contains_key(record.name()) {
            return Err(WeightError::DuplicateRecord(record.name().to_owned()));
        }
        log::debug!("Inserting derived record {:?}", record);
        self.records.insert(record.name().to_owned(), record);
        Ok(())
    }

    /// Drop every buffer held by this store, returning the number of bytes released.
    pub fn release(&mut self) -> usize {
        let mut released = 0;
        for (name, record) in self.records.drain(..) {
            log::debug!("Releasing '{}' ({} bytes)", name, record.bytes().len());
            released += record.bytes().len();
        }
        released
    }
}

impl Index<&str> for WeightStore {
    type Output = WeightRecord;

    fn index(&self, name: &str) -> &Self::Output {
        self.records
            .get(name)
            .unwrap_or_else(|| panic!("No weight named '{}' in store", name))
    }
}

impl IntoIterator for WeightStore {
    type Item = WeightRecord;
    type IntoIter = indexmap::map::IntoValues<String, WeightRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_values()
    }
}
