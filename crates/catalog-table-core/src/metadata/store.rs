//! Per-table mapping from column name to [`VariableMeta`].
//!
//! A table owns one store and every column it hands out holds a handle to the
//! same store, so writes through a column are visible through the table and
//! vice versa. Lookups never fail: a missing name materializes a default
//! record.
use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::metadata::VariableMeta;

/// Shared, single-threaded handle to a [`MetadataStore`].
pub type SharedStore = Rc<RefCell<MetadataStore>>;

/// Column name → metadata record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataStore {
    entries: HashMap<String, VariableMeta>,
}

impl MetadataStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap this store in a fresh shared handle.
    pub fn into_shared(self) -> SharedStore {
        Rc::new(RefCell::new(self))
    }

    /// Return the record for `name`, inserting a default one if absent.
    pub fn get(&mut self, name: &str) -> VariableMeta {
        self.entry(name).clone()
    }

    /// Mutable access to the record for `name`, inserting a default one if absent.
    pub fn entry(&mut self, name: &str) -> &mut VariableMeta {
        self.entries.entry(name.to_string()).or_default()
    }

    /// Look up `name` without materializing anything.
    pub fn peek(&self, name: &str) -> Option<&VariableMeta> {
        self.entries.get(name)
    }

    /// Overwrite the record for `name`.
    pub fn set(&mut self, name: &str, meta: VariableMeta) {
        self.entries.insert(name.to_string(), meta);
    }

    /// Move the record stored under `old` to `new`, replacing whatever `new`
    /// held. No-op if `old` has no record.
    pub fn rename(&mut self, old: &str, new: &str) {
        if old == new {
            return;
        }
        if let Some(meta) = self.entries.remove(old) {
            self.entries.insert(new.to_string(), meta);
        }
    }

    /// Remove and return the record for `name`.
    pub fn remove(&mut self, name: &str) -> Option<VariableMeta> {
        self.entries.remove(name)
    }

    /// Whether `name` currently has a record.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records for exactly `names`, in the order given; absent names are
    /// materialized as defaults.
    pub fn all_columns_metadata<S: AsRef<str>>(
        &mut self,
        names: &[S],
    ) -> Vec<(String, VariableMeta)> {
        names
            .iter()
            .map(|name| (name.as_ref().to_string(), self.get(name.as_ref())))
            .collect()
    }

    /// A new store holding copies of the records for `names` only.
    pub fn subset<S: AsRef<str>>(&self, names: &[S]) -> MetadataStore {
        let entries = names
            .iter()
            .filter_map(|name| {
                let name = name.as_ref();
                self.entries
                    .get(name)
                    .map(|meta| (name.to_string(), meta.clone()))
            })
            .collect();
        MetadataStore { entries }
    }
}

impl FromIterator<(String, VariableMeta)> for MetadataStore {
    fn from_iter<T: IntoIterator<Item = (String, VariableMeta)>>(iter: T) -> Self {
        MetadataStore {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta_with_unit(unit: &str) -> VariableMeta {
        VariableMeta {
            unit: Some(unit.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn get_materializes_default_on_miss() {
        let mut store = MetadataStore::new();
        assert!(!store.contains("pop"));

        assert_eq!(store.get("pop"), VariableMeta::default());
        assert!(store.contains("pop"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn rename_moves_without_duplicating() {
        let mut store = MetadataStore::new();
        store.set("x", meta_with_unit("kg"));

        store.rename("x", "y");

        assert!(!store.contains("x"));
        assert_eq!(store.get("y"), meta_with_unit("kg"));
        assert_eq!(store.get("x"), VariableMeta::default());
    }

    #[test]
    fn rename_overwrites_target_and_ignores_missing_source() {
        let mut store = MetadataStore::new();
        store.set("x", meta_with_unit("kg"));
        store.set("y", meta_with_unit("m"));

        store.rename("x", "y");
        assert_eq!(store.peek("y"), Some(&meta_with_unit("kg")));

        store.rename("absent", "y");
        assert_eq!(store.peek("y"), Some(&meta_with_unit("kg")));
        assert!(!store.contains("absent"));
    }

    #[test]
    fn all_columns_metadata_follows_requested_order() {
        let mut store = MetadataStore::new();
        store.set("gdp", meta_with_unit("USD"));
        store.set("pop", meta_with_unit("people"));

        let flat = store.all_columns_metadata(&["country", "pop", "gdp"]);
        let names: Vec<_> = flat.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["country", "pop", "gdp"]);
        assert_eq!(flat[1].1, meta_with_unit("people"));
        assert_eq!(flat[0].1, VariableMeta::default());
    }

    #[test]
    fn subset_keeps_only_requested_names() {
        let mut store = MetadataStore::new();
        store.set("a", meta_with_unit("kg"));
        store.set("b", meta_with_unit("m"));

        let sub = store.subset(&["b", "missing"]);
        assert_eq!(sub.len(), 1);
        assert_eq!(sub.peek("b"), Some(&meta_with_unit("m")));
    }
}
