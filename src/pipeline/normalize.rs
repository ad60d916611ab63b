// src/pipeline/normalize.rs

use serde::Serialize;
use tracing::warn;

use super::bucket::bucket;
use crate::model::{GenderLabel, NormalizedRecord, RawRecord};

/// Per-field count of cells that could not be coerced.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParseFailures {
    pub gender: usize,
    pub age: usize,
    pub region: usize,
    pub prescriber: usize,
    pub box_count: usize,
    pub refund_amount: usize,
}

impl ParseFailures {
    pub fn total(&self) -> usize {
        self.gender + self.age + self.region + self.prescriber + self.box_count + self.refund_amount
    }
}

#[derive(Debug, Clone)]
pub struct Normalized {
    pub records: Vec<NormalizedRecord>,
    pub failures: ParseFailures,
}

/// Coerce every raw row. Never fails: a bad cell only blanks its own field.
pub fn normalize(rows: &[RawRecord]) -> Normalized {
    let mut failures = ParseFailures::default();
    let records: Vec<NormalizedRecord> = rows
        .iter()
        .map(|raw| normalize_record(raw, &mut failures))
        .collect();

    if failures.total() > 0 {
        warn!(rows = rows.len(), ?failures, "some fields could not be parsed");
    }
    Normalized { records, failures }
}

pub fn normalize_record(raw: &RawRecord, failures: &mut ParseFailures) -> NormalizedRecord {
    let gender = match parse_integer(&raw.gender_code) {
        Some(code) => GenderLabel::from_code(code),
        None => {
            failures.gender += 1;
            GenderLabel::Unknown
        }
    };

    let age = counted(
        parse_integer(&raw.age).and_then(|v| u32::try_from(v).ok()),
        &mut failures.age,
    );
    let region_code = counted(parse_integer(&raw.region_code), &mut failures.region);
    let prescriber_category_code = counted(
        parse_integer(&raw.prescriber_category_code),
        &mut failures.prescriber,
    );
    let box_count = counted(
        parse_integer(&raw.box_count).and_then(|v| u64::try_from(v).ok()),
        &mut failures.box_count,
    );
    let refund_amount = counted(
        parse_refund_amount(&raw.refund_amount),
        &mut failures.refund_amount,
    );

    NormalizedRecord {
        gender,
        age,
        age_bracket: bucket(age),
        medication_category: raw.medication_category.clone(),
        region_code,
        prescriber_category_code,
        box_count,
        refund_amount,
    }
}

/// `"12,50"` → `12.5`. Blank, non-numeric and non-finite input give `None`.
pub fn parse_refund_amount(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replacen(',', ".", 1);
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Whole number, also accepting a float rendering such as `"45.0"`.
fn parse_integer(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64)
        .map(|v| v as i64)
}

fn counted<T>(value: Option<T>, failures: &mut usize) -> Option<T> {
    if value.is_none() {
        *failures += 1;
    }
    value
}
