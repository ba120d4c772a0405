use serde::{Deserialize, Serialize};
use std::fmt;

/// Score band on the nine-point senior secondary scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A1,
    B2,
    B3,
    C4,
    C5,
    C6,
    D7,
    E8,
    F9,
}

// Lower bound of each band, best first. Bounds are inclusive.
const BANDS: [(f64, Grade); 8] = [
    (75.0, Grade::A1),
    (70.0, Grade::B2),
    (65.0, Grade::B3),
    (60.0, Grade::C4),
    (55.0, Grade::C5),
    (50.0, Grade::C6),
    (45.0, Grade::D7),
    (40.0, Grade::E8),
];

/// Bucket a numeric score (0-100) into a grade.
///
/// Out-of-range scores are clamped; NaN falls through to `F9`.
pub fn grade_for(score: f64) -> Grade {
    let score = score.clamp(0.0, 100.0);
    BANDS
        .iter()
        .find(|(floor, _)| score >= *floor)
        .map(|(_, grade)| *grade)
        .unwrap_or(Grade::F9)
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A1 => "A1",
            Grade::B2 => "B2",
            Grade::B3 => "B3",
            Grade::C4 => "C4",
            Grade::C5 => "C5",
            Grade::C6 => "C6",
            Grade::D7 => "D7",
            Grade::E8 => "E8",
            Grade::F9 => "F9",
        }
    }

    pub fn remark(&self) -> &'static str {
        match self {
            Grade::A1 => "Excellent",
            Grade::B2 => "Very Good",
            Grade::B3 => "Good",
            Grade::C4 | Grade::C5 | Grade::C6 => "Credit",
            Grade::D7 => "Pass",
            Grade::E8 => "Weak Pass",
            Grade::F9 => "Fail",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_boundaries_are_inclusive_on_lower_bound() {
        assert_eq!(grade_for(75.0), Grade::A1);
        assert_eq!(grade_for(74.99), Grade::B2);
        assert_eq!(grade_for(70.0), Grade::B2);
        assert_eq!(grade_for(65.0), Grade::B3);
        assert_eq!(grade_for(60.0), Grade::C4);
        assert_eq!(grade_for(55.0), Grade::C5);
        assert_eq!(grade_for(50.0), Grade::C6);
        assert_eq!(grade_for(45.0), Grade::D7);
        assert_eq!(grade_for(40.0), Grade::E8);
        assert_eq!(grade_for(39.5), Grade::F9);
    }

    #[test]
    fn out_of_range_scores_clamp() {
        assert_eq!(grade_for(130.0), Grade::A1);
        assert_eq!(grade_for(-5.0), Grade::F9);
    }

    #[test]
    fn remarks() {
        assert_eq!(Grade::A1.remark(), "Excellent");
        assert_eq!(Grade::F9.remark(), "Fail");
        assert_eq!(Grade::C5.to_string(), "C5");
    }
}
