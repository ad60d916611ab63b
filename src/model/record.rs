// src/model/record.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DashboardError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenderLabel {
    Male,
    Female,
    Unknown,
}

impl GenderLabel {
    pub const ALL: [GenderLabel; 3] = [GenderLabel::Male, GenderLabel::Female, GenderLabel::Unknown];

    /// Total mapping from the dataset's `sexe` code. 9 and every other value
    /// land in `Unknown`.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => GenderLabel::Male,
            2 => GenderLabel::Female,
            _ => GenderLabel::Unknown,
        }
    }

    /// Position in `ALL`.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            GenderLabel::Male => "Male",
            GenderLabel::Female => "Female",
            GenderLabel::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for GenderLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fixed age partition shared by every age-based chart.
///
/// Intervals are half-open: [0,19), [19,59), [59,∞).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeBracket {
    #[serde(rename = "0-19")]
    Young,
    #[serde(rename = "20-59")]
    Adult,
    #[serde(rename = "60+")]
    Senior,
}

impl AgeBracket {
    /// Canonical display order.
    pub const ALL: [AgeBracket; 3] = [AgeBracket::Young, AgeBracket::Adult, AgeBracket::Senior];

    /// Inclusive lower bound of each bracket; the last one is unbounded above.
    const LOWER_BOUNDS: [(u32, AgeBracket); 3] = [
        (0, AgeBracket::Young),
        (19, AgeBracket::Adult),
        (59, AgeBracket::Senior),
    ];

    pub fn for_age(age: u32) -> Self {
        Self::LOWER_BOUNDS
            .iter()
            .rev()
            .find(|(lower, _)| age >= *lower)
            .map(|(_, bracket)| *bracket)
            .unwrap_or(AgeBracket::Young)
    }

    /// Position in `ALL`.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeBracket::Young => "0-19",
            AgeBracket::Adult => "20-59",
            AgeBracket::Senior => "60+",
        }
    }

    /// Parse a selector value such as `"20-59"`.
    pub fn from_label(label: &str) -> Result<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|b| b.label() == label)
            .ok_or_else(|| DashboardError::InvalidAgeBracket(label.to_string()))
    }
}

impl fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Typed projection of a `RawRecord`. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub gender: GenderLabel,
    pub age: Option<u32>,
    pub age_bracket: Option<AgeBracket>,
    pub medication_category: String,
    pub region_code: Option<i64>,
    pub prescriber_category_code: Option<i64>,
    pub box_count: Option<u64>,
    pub refund_amount: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_codes() {
        assert_eq!(GenderLabel::from_code(1), GenderLabel::Male);
        assert_eq!(GenderLabel::from_code(2), GenderLabel::Female);
        assert_eq!(GenderLabel::from_code(9), GenderLabel::Unknown);
        assert_eq!(GenderLabel::from_code(0), GenderLabel::Unknown);
        assert_eq!(GenderLabel::from_code(-3), GenderLabel::Unknown);
    }

    #[test]
    fn test_bracket_labels_round_trip() {
        for b in AgeBracket::ALL {
            assert_eq!(AgeBracket::from_label(b.label()).unwrap(), b);
        }
        assert_eq!(AgeBracket::from_label(" 60+ ").unwrap(), AgeBracket::Senior);
        assert!(matches!(
            AgeBracket::from_label("60 and above"),
            Err(DashboardError::InvalidAgeBracket(_))
        ));
    }

    #[test]
    fn test_bracket_serializes_as_label() {
        let json = serde_json::to_string(&AgeBracket::ALL).unwrap();
        assert_eq!(json, r#"["0-19","20-59","60+"]"#);
    }
}
