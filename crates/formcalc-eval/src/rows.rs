use formcalc_common::split_indexed;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// Live row indices per indexed family (`rows_0_amount`, `rows_3_amount`
/// give family `rows` the indices `{0, 3}`).
///
/// Aggregates expand `rows_?_amount` over these indices. Indices are kept
/// per family so removing a row from one repeater does not make another
/// repeater's aggregates read phantom rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowIndexSet {
    families: FxHashMap<String, BTreeSet<u32>>,
}

impl RowIndexSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = RowIndexSet::new();
        for name in names {
            set.insert_name(name.as_ref());
        }
        set
    }

    /// Record the row index of an indexed name. Returns false for names that
    /// are not part of a family.
    pub fn insert_name(&mut self, name: &str) -> bool {
        match split_indexed(name) {
            Some(indexed) => {
                self.insert(indexed.family, indexed.index);
                true
            }
            None => false,
        }
    }

    pub fn insert(&mut self, family: &str, index: u32) {
        self.families
            .entry(family.to_string())
            .or_default()
            .insert(index);
    }

    /// Sorted indices for a family. An unknown family yields the union of
    /// every known index.
    pub fn indices_for(&self, family: &str) -> Vec<u32> {
        match self.families.get(family) {
            Some(indices) => indices.iter().copied().collect(),
            None => {
                let union: BTreeSet<u32> = self.families.values().flatten().copied().collect();
                union.into_iter().collect()
            }
        }
    }

    pub fn contains_family(&self, family: &str) -> bool {
        self.families.contains_key(family)
    }

    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.families.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    pub fn clear(&mut self) {
        self.families.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_tracked_per_family() {
        let rows = RowIndexSet::from_names([
            "rows_0_amount",
            "rows_2_amount",
            "items_5_qty",
            "harga",
        ]);
        assert_eq!(rows.indices_for("rows"), vec![0, 2]);
        assert_eq!(rows.indices_for("items"), vec![5]);
        assert_eq!(rows.indices_for("missing"), vec![0, 2, 5]);
        assert!(!rows.contains_family("harga"));
    }
}
