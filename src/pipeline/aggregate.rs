// src/pipeline/aggregate.rs
//
// The six dashboard reducers. Each is a fold over normalized records that can
// also be split across rayon workers and merged back in input order.

use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use super::summary::{MeanValue, ScatterPoint, SummaryTable};
use crate::model::{AgeBracket, GenderLabel, NormalizedRecord};

/// A single-pass, mergeable fold over records.
pub trait Reducer: Clone + Send + Sync {
    type Output;

    fn add(&mut self, record: &NormalizedRecord);

    /// Absorb a partial built from records that came *after* this one's.
    fn merge(&mut self, other: Self);

    fn finish(self) -> Self::Output;
}

/// Fold `records` on the current thread.
pub fn reduce<R: Reducer>(records: &[NormalizedRecord], init: R) -> R::Output {
    let mut acc = init;
    for record in records {
        acc.add(record);
    }
    acc.finish()
}

/// Fold `records` on the rayon pool. Gives the same output as `reduce`:
/// every reducer's `merge` is exact and keeps input order.
pub fn reduce_parallel<R: Reducer>(records: &[NormalizedRecord], init: R) -> R::Output {
    records
        .par_iter()
        .fold(
            || init.clone(),
            |mut acc, record| {
                acc.add(record);
                acc
            },
        )
        .reduce(
            || init.clone(),
            |mut left, right| {
                left.merge(right);
                left
            },
        )
        .finish()
}

/// Counts per key, remembering the order keys were first seen in.
#[derive(Debug, Clone)]
pub struct GroupCounts<K> {
    order: Vec<K>,
    counts: HashMap<K, u64>,
}

impl<K> Default for GroupCounts<K> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            counts: HashMap::new(),
        }
    }
}

impl<K: Clone + Eq + Hash> GroupCounts<K> {
    pub fn bump(&mut self, key: K, n: u64) {
        match self.counts.get_mut(&key) {
            Some(count) => *count += n,
            None => {
                self.order.push(key.clone());
                self.counts.insert(key, n);
            }
        }
    }

    pub fn merge(&mut self, other: Self) {
        let mut counts = other.counts;
        for key in other.order {
            if let Some(n) = counts.remove(&key) {
                self.bump(key, n);
            }
        }
    }

    /// Keys listed in `canonical` come first, in that order and only if
    /// seen; everything else follows in first-seen order.
    pub fn into_table(mut self, canonical: &[K]) -> SummaryTable<K, u64> {
        let mut rows = Vec::with_capacity(self.order.len());
        for key in canonical {
            if let Some(n) = self.counts.remove(key) {
                rows.push((key.clone(), n));
            }
        }
        for key in self.order {
            if let Some(n) = self.counts.remove(&key) {
                rows.push((key, n));
            }
        }
        SummaryTable::new(rows)
    }
}

// ─── gender ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct GenderDistribution {
    counts: [u64; 3],
}

impl Reducer for GenderDistribution {
    type Output = SummaryTable<GenderLabel, u64>;

    fn add(&mut self, record: &NormalizedRecord) {
        self.counts[record.gender.index()] += 1;
    }

    fn merge(&mut self, other: Self) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts) {
            *mine += theirs;
        }
    }

    fn finish(self) -> Self::Output {
        SummaryTable::new(
            GenderLabel::ALL
                .into_iter()
                .map(|g| (g, self.counts[g.index()]))
                .collect(),
        )
    }
}

// ─── age histogram ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct AgeHistogram {
    counts: [u64; 3],
}

impl Reducer for AgeHistogram {
    type Output = SummaryTable<AgeBracket, u64>;

    fn add(&mut self, record: &NormalizedRecord) {
        if let Some(bracket) = record.age_bracket {
            self.counts[bracket.index()] += 1;
        }
    }

    fn merge(&mut self, other: Self) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts) {
            *mine += theirs;
        }
    }

    fn finish(self) -> Self::Output {
        SummaryTable::new(
            AgeBracket::ALL
                .into_iter()
                .map(|b| (b, self.counts[b.index()]))
                .collect(),
        )
    }
}

// ─── medication category within one bracket ─────────────────────────────

#[derive(Debug, Clone)]
pub struct CategoryByAge {
    bracket: AgeBracket,
    order: Vec<String>,
    counts: GroupCounts<String>,
}

impl CategoryByAge {
    pub fn new(bracket: AgeBracket, order: &[String]) -> Self {
        Self {
            bracket,
            order: order.to_vec(),
            counts: GroupCounts::default(),
        }
    }
}

impl Reducer for CategoryByAge {
    type Output = SummaryTable<String, u64>;

    fn add(&mut self, record: &NormalizedRecord) {
        if record.age_bracket == Some(self.bracket) {
            self.counts.bump(record.medication_category.clone(), 1);
        }
    }

    fn merge(&mut self, other: Self) {
        self.counts.merge(other.counts);
    }

    fn finish(self) -> Self::Output {
        self.counts.into_table(&self.order)
    }
}

// ─── region ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RegionDistribution {
    order: Vec<i64>,
    counts: GroupCounts<i64>,
}

impl RegionDistribution {
    pub fn new(order: &[i64]) -> Self {
        Self {
            order: order.to_vec(),
            counts: GroupCounts::default(),
        }
    }
}

impl Reducer for RegionDistribution {
    type Output = SummaryTable<i64, u64>;

    fn add(&mut self, record: &NormalizedRecord) {
        if let Some(region) = record.region_code {
            self.counts.bump(region, 1);
        }
    }

    fn merge(&mut self, other: Self) {
        self.counts.merge(other.counts);
    }

    fn finish(self) -> Self::Output {
        self.counts.into_table(&self.order)
    }
}

// ─── prescriber scatter (projection, not a reduction) ───────────────────

/// One point per record that has both a prescriber code and a box count.
/// A record missing either cannot be plotted and is left out.
#[derive(Debug, Clone, Default)]
pub struct PrescriberScatter {
    points: Vec<ScatterPoint>,
}

impl Reducer for PrescriberScatter {
    type Output = Vec<ScatterPoint>;

    fn add(&mut self, record: &NormalizedRecord) {
        if let (Some(code), Some(boxes)) = (record.prescriber_category_code, record.box_count) {
            self.points.push(ScatterPoint {
                prescriber_category_code: code,
                box_count: boxes,
            });
        }
    }

    fn merge(&mut self, other: Self) {
        self.points.extend(other.points);
    }

    fn finish(self) -> Self::Output {
        self.points
    }
}

// ─── mean refund per bracket ────────────────────────────────────────────

/// Amounts are summed as whole cents, so the total does not depend on how
/// the records were split between workers.
#[derive(Debug, Clone, Default)]
pub struct RefundMeanByAge {
    cents: [i128; 3],
    counts: [u64; 3],
}

/// REM carries two decimals; round away the binary representation error.
fn to_cents(amount: f64) -> i128 {
    (amount * 100.0).round() as i128
}

impl Reducer for RefundMeanByAge {
    type Output = SummaryTable<AgeBracket, MeanValue>;

    fn add(&mut self, record: &NormalizedRecord) {
        if let (Some(bracket), Some(amount)) = (record.age_bracket, record.refund_amount) {
            self.cents[bracket.index()] += to_cents(amount);
            self.counts[bracket.index()] += 1;
        }
    }

    fn merge(&mut self, other: Self) {
        for i in 0..3 {
            self.cents[i] += other.cents[i];
            self.counts[i] += other.counts[i];
        }
    }

    fn finish(self) -> Self::Output {
        SummaryTable::new(
            AgeBracket::ALL
                .into_iter()
                .map(|b| {
                    let sum = self.cents[b.index()] as f64 / 100.0;
                    (b, MeanValue::from_sum(sum, self.counts[b.index()]))
                })
                .collect(),
        )
    }
}

// ─── convenience entry points ───────────────────────────────────────────

pub fn gender_distribution(records: &[NormalizedRecord]) -> SummaryTable<GenderLabel, u64> {
    reduce(records, GenderDistribution::default())
}

pub fn age_histogram(records: &[NormalizedRecord]) -> SummaryTable<AgeBracket, u64> {
    reduce(records, AgeHistogram::default())
}

pub fn category_by_age(
    records: &[NormalizedRecord],
    bracket: AgeBracket,
    order: &[String],
) -> SummaryTable<String, u64> {
    reduce(records, CategoryByAge::new(bracket, order))
}

pub fn region_distribution(records: &[NormalizedRecord], order: &[i64]) -> SummaryTable<i64, u64> {
    reduce(records, RegionDistribution::new(order))
}

pub fn prescriber_scatter(records: &[NormalizedRecord]) -> Vec<ScatterPoint> {
    reduce(records, PrescriberScatter::default())
}

pub fn refund_mean_by_age(records: &[NormalizedRecord]) -> SummaryTable<AgeBracket, MeanValue> {
    reduce(records, RefundMeanByAge::default())
}

/// Prescriber codes sorted by total boxes, smallest first (ties by code).
/// This is the category axis order of the scatter chart.
pub fn prescriber_order_by_total(points: &[ScatterPoint]) -> Vec<i64> {
    let mut totals: BTreeMap<i64, u64> = BTreeMap::new();
    for p in points {
        *totals.entry(p.prescriber_category_code).or_default() += p.box_count;
    }
    let mut ordered: Vec<(i64, u64)> = totals.into_iter().collect();
    ordered.sort_by_key(|&(code, total)| (total, code));
    ordered.into_iter().map(|(code, _)| code).collect()
}
