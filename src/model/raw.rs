// src/model/raw.rs

use serde::{Deserialize, Serialize};

/// One data row as it comes off the wire, before any coercion.
///
/// Every field is the untouched cell text; a cell the row did not carry is
/// an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub gender_code: String,
    pub age: String,
    pub medication_category: String,
    pub region_code: String,
    pub prescriber_category_code: String,
    pub box_count: String,
    pub refund_amount: String,
}

impl RawRecord {
    /// Test/fixture helper: build a row from string slices in field order.
    pub fn from_fields(
        gender_code: &str,
        age: &str,
        medication_category: &str,
        region_code: &str,
        prescriber_category_code: &str,
        box_count: &str,
        refund_amount: &str,
    ) -> Self {
        Self {
            gender_code: gender_code.to_string(),
            age: age.to_string(),
            medication_category: medication_category.to_string(),
            region_code: region_code.to_string(),
            prescriber_category_code: prescriber_category_code.to_string(),
            box_count: box_count.to_string(),
            refund_amount: refund_amount.to_string(),
        }
    }
}
