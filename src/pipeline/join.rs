// src/pipeline/join.rs

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::hash::{BuildHasher, Hash};

use super::summary::{CodeLabel, LabeledRow, LabeledTable, SummaryTable};

/// Anything that can name a code.
pub trait LabelSource<K> {
    fn lookup(&self, key: &K) -> Option<&str>;
}

impl<K: Eq + Hash, S: BuildHasher> LabelSource<K> for HashMap<K, String, S> {
    fn lookup(&self, key: &K) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl<K: Ord> LabelSource<K> for BTreeMap<K, String> {
    fn lookup(&self, key: &K) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

/// Display label for `key`; an unmapped code stands for itself.
pub fn label_for<K: Display>(key: &K, labels: &impl LabelSource<K>) -> String {
    labels
        .lookup(key)
        .map(str::to_string)
        .unwrap_or_else(|| key.to_string())
}

/// Attach a display label to every key of `table`, keeping row order.
pub fn join<K, V>(table: &SummaryTable<K, V>, labels: &impl LabelSource<K>) -> LabeledTable<K, V>
where
    K: Clone + Display,
    V: Clone,
{
    LabeledTable::new(
        table
            .rows()
            .iter()
            .map(|row| LabeledRow {
                key: row.key.clone(),
                label: label_for(&row.key, labels),
                value: row.value.clone(),
            })
            .collect(),
    )
}

/// The fixed "top prescriber categories" legend, in the order given.
pub fn top_prescribers(selected: &[i64], labels: &impl LabelSource<i64>) -> Vec<CodeLabel<i64>> {
    selected
        .iter()
        .map(|&code| CodeLabel {
            code,
            label: label_for(&code, labels),
        })
        .collect()
}

/// Category legend shown under the category chart, sorted by code.
pub fn category_descriptions(labels: &BTreeMap<String, String>) -> Vec<CodeLabel<String>> {
    labels
        .iter()
        .map(|(code, label)| CodeLabel {
            code: code.clone(),
            label: label.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmapped_key_falls_back_to_code() {
        let labels: HashMap<i64, String> = HashMap::from([(1, "Paris".to_string())]);
        let table = SummaryTable::new(vec![(1i64, 10u64), (2, 4)]);

        let joined = join(&table, &labels);
        let pairs: Vec<(i64, &str)> = joined
            .rows()
            .iter()
            .map(|r| (r.key, r.label.as_str()))
            .collect();
        assert_eq!(pairs, vec![(1, "Paris"), (2, "2")]);
        assert_eq!(joined.rows()[1].value, 4);
    }

    #[test]
    fn test_join_string_keys() {
        let labels = BTreeMap::from([("A".to_string(), "Alimentary".to_string())]);
        let table = SummaryTable::new(vec![("Z".to_string(), 1u64), ("A".to_string(), 2)]);
        let joined = join(&table, &labels);
        assert_eq!(joined.label_of(&"A".to_string()), Some("Alimentary"));
        assert_eq!(joined.label_of(&"Z".to_string()), Some("Z"));
    }

    #[test]
    fn test_top_prescribers_keep_selection_order() {
        let labels: HashMap<i64, String> =
            HashMap::from([(90, "Salaried".to_string()), (1, "GP".to_string())]);
        let legend = top_prescribers(&[1, 90, 42], &labels);
        let labels: Vec<&str> = legend.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["GP", "Salaried", "42"]);
    }

    #[test]
    fn test_category_descriptions_sorted() {
        let labels = BTreeMap::from([
            ("N".to_string(), "Nervous".to_string()),
            ("A".to_string(), "Alimentary".to_string()),
        ]);
        let legend = category_descriptions(&labels);
        assert_eq!(legend[0].code, "A");
        assert_eq!(legend[1].label, "Nervous");
    }
}
