// src/pipeline/bucket.rs

use crate::model::AgeBracket;

/// Assign an age to its bracket. Every age-based reducer goes through here.
pub fn bucket(age: Option<u32>) -> Option<AgeBracket> {
    age.map(AgeBracket::for_age)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_belong_to_upper_bracket() {
        assert_eq!(bucket(Some(0)), Some(AgeBracket::Young));
        assert_eq!(bucket(Some(18)), Some(AgeBracket::Young));
        assert_eq!(bucket(Some(19)), Some(AgeBracket::Adult));
        assert_eq!(bucket(Some(58)), Some(AgeBracket::Adult));
        assert_eq!(bucket(Some(59)), Some(AgeBracket::Senior));
        assert_eq!(bucket(Some(u32::MAX)), Some(AgeBracket::Senior));
    }

    #[test]
    fn test_missing_age_has_no_bracket() {
        assert_eq!(bucket(None), None);
    }

    #[test]
    fn test_partition_has_no_gaps() {
        // brackets must be contiguous and non-decreasing along the age axis
        let mut prev = AgeBracket::Young;
        for age in 0..=150u32 {
            let b = bucket(Some(age)).unwrap();
            assert!(b == prev || b.index() == prev.index() + 1, "gap at {}", age);
            prev = b;
        }
        assert_eq!(prev, AgeBracket::Senior);
    }
}
