//! # Grade Module
//!
//! Letter grades derived from a 0-100 score via fixed, inclusive thresholds.

use crate::tables::GradeThresholds;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Letter grade for a composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "F")]
    F,
}

impl Grade {
    /// Grade a score. Each threshold is the lowest score earning that grade.
    #[must_use]
    pub fn from_score(score: u8, thresholds: &GradeThresholds) -> Self {
        if score >= thresholds.a_plus {
            Self::APlus
        } else if score >= thresholds.a {
            Self::A
        } else if score >= thresholds.b_plus {
            Self::BPlus
        } else if score >= thresholds.b {
            Self::B
        } else if score >= thresholds.c_plus {
            Self::CPlus
        } else if score >= thresholds.c {
            Self::C
        } else if score >= thresholds.d {
            Self::D
        } else {
            Self::F
        }
    }

    /// Display label ("A+", "B", ...).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::APlus => "A+",
            Self::A => "A",
            Self::BPlus => "B+",
            Self::B => "B",
            Self::CPlus => "C+",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_inclusive() {
        let t = GradeThresholds::default();
        assert_eq!(Grade::from_score(100, &t), Grade::APlus);
        assert_eq!(Grade::from_score(90, &t), Grade::APlus);
        assert_eq!(Grade::from_score(89, &t), Grade::A);
        assert_eq!(Grade::from_score(80, &t), Grade::A);
        assert_eq!(Grade::from_score(79, &t), Grade::BPlus);
        assert_eq!(Grade::from_score(60, &t), Grade::B);
        assert_eq!(Grade::from_score(50, &t), Grade::CPlus);
        assert_eq!(Grade::from_score(40, &t), Grade::C);
        assert_eq!(Grade::from_score(30, &t), Grade::D);
        assert_eq!(Grade::from_score(29, &t), Grade::F);
        assert_eq!(Grade::from_score(0, &t), Grade::F);
    }

    #[test]
    fn serializes_as_label() {
        let json = serde_json::to_string(&Grade::BPlus).unwrap();
        assert_eq!(json, "\"B+\"");
        assert_eq!(Grade::CPlus.to_string(), "C+");
    }
}
