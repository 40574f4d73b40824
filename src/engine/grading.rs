// src/engine/grading.rs

use std::fmt;

use serde::{Deserialize, Serialize};

/// Letter grade shown next to a percentage score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lower bounds, checked top-down; the first one met wins.
const BANDS: [(i64, Grade); 5] = [
    (90, Grade::APlus),
    (80, Grade::A),
    (70, Grade::B),
    (60, Grade::C),
    (50, Grade::D),
];

pub fn letter_grade(score: i64) -> Grade {
    BANDS
        .iter()
        .find(|(min, _)| score >= *min)
        .map(|(_, grade)| *grade)
        .unwrap_or(Grade::F)
}

/// Pass/fail against the quiz threshold. Independent of the letter grade.
pub fn passed(score: i64, passing_score: i64) -> bool {
    score >= passing_score
}
