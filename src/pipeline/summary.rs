// src/pipeline/summary.rs

use serde::Serialize;

/// One reducer's output: ordered `(key, value)` rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTable<K, V> {
    rows: Vec<SummaryRow<K, V>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> SummaryTable<K, V> {
    pub fn new(rows: Vec<(K, V)>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|(key, value)| SummaryRow { key, value })
                .collect(),
        }
    }

    pub fn rows(&self) -> &[SummaryRow<K, V>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.rows.iter().map(|r| &r.key)
    }

    pub fn get(&self, key: &K) -> Option<&V>
    where
        K: PartialEq,
    {
        self.rows.iter().find(|r| &r.key == key).map(|r| &r.value)
    }
}

impl<K> SummaryTable<K, u64> {
    pub fn total(&self) -> u64 {
        self.rows.iter().map(|r| r.value).sum()
    }
}

/// A summary table whose keys carry a display label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledTable<K, V> {
    rows: Vec<LabeledRow<K, V>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledRow<K, V> {
    pub key: K,
    pub label: String,
    pub value: V,
}

impl<K, V> LabeledTable<K, V> {
    pub fn new(rows: Vec<LabeledRow<K, V>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[LabeledRow<K, V>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn label_of(&self, key: &K) -> Option<&str>
    where
        K: PartialEq,
    {
        self.rows
            .iter()
            .find(|r| &r.key == key)
            .map(|r| r.label.as_str())
    }
}

/// Mean of a group. A group nothing contributed to is `NoData`, never `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MeanValue {
    NoData,
    Mean(f64),
}

impl MeanValue {
    pub fn from_sum(sum: f64, count: u64) -> Self {
        if count == 0 {
            MeanValue::NoData
        } else {
            MeanValue::Mean(sum / count as f64)
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            MeanValue::Mean(v) => Some(v),
            MeanValue::NoData => None,
        }
    }
}

/// One scatter point: a record's prescriber category and its box count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScatterPoint {
    pub prescriber_category_code: i64,
    pub box_count: u64,
}

/// A code with its display label, for legend tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeLabel<K> {
    pub code: K,
    pub label: String,
}
