use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tolerance used for every budget/limit comparison in the planner.
pub const EPSILON: f64 = 0.01;

/// Classic 1-decimal rounding used for displayed scores:
/// `Int(10*x + 0.5) / 10`
pub fn round_off_1_decimal(x: f64) -> f64 {
    ((10.0 * x) + 0.5).floor() / 10.0
}

pub fn round_off_2_decimal(x: f64) -> f64 {
    ((100.0 * x) + 0.5).floor() / 100.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub name: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub is_attendance: bool,
}

impl Item {
    pub fn is_graded(&self) -> bool {
        self.score.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// 0 means "not assigned yet".
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub weight: f64,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Category {
    /// Share of the final grade carried by each item. `None` for an empty category.
    pub fn item_weight(&self) -> Option<f64> {
        if self.items.is_empty() {
            return None;
        }
        Some(self.weight / (self.items.len() as f64))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LetterGrade {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C-")]
    CMinus,
    #[serde(rename = "D+")]
    DPlus,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "D-")]
    DMinus,
    #[serde(rename = "F")]
    F,
}

/// Highest letter first; `from_percentage` relies on this order.
pub const GRADE_TABLE: [(LetterGrade, f64); 12] = [
    (LetterGrade::A, 93.0),
    (LetterGrade::AMinus, 90.0),
    (LetterGrade::BPlus, 87.0),
    (LetterGrade::B, 83.0),
    (LetterGrade::BMinus, 80.0),
    (LetterGrade::CPlus, 77.0),
    (LetterGrade::C, 73.0),
    (LetterGrade::CMinus, 70.0),
    (LetterGrade::DPlus, 67.0),
    (LetterGrade::D, 63.0),
    (LetterGrade::DMinus, 60.0),
    (LetterGrade::F, 0.0),
];

impl LetterGrade {
    pub fn threshold(self) -> f64 {
        GRADE_TABLE
            .iter()
            .find(|(g, _)| *g == self)
            .map(|(_, t)| *t)
            .unwrap_or(0.0)
    }

    pub fn from_percentage(pct: f64) -> LetterGrade {
        GRADE_TABLE
            .iter()
            .find(|(_, t)| pct >= *t)
            .map(|(g, _)| *g)
            .unwrap_or(LetterGrade::F)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LetterGrade::A => "A",
            LetterGrade::AMinus => "A-",
            LetterGrade::BPlus => "B+",
            LetterGrade::B => "B",
            LetterGrade::BMinus => "B-",
            LetterGrade::CPlus => "C+",
            LetterGrade::C => "C",
            LetterGrade::CMinus => "C-",
            LetterGrade::DPlus => "D+",
            LetterGrade::D => "D",
            LetterGrade::DMinus => "D-",
            LetterGrade::F => "F",
        }
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LetterGrade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim().to_ascii_uppercase();
        GRADE_TABLE
            .iter()
            .map(|(g, _)| *g)
            .find(|g| g.as_str() == t)
            .ok_or_else(|| format!("unknown letter grade: {}", s.trim()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeAggregate {
    /// Weighted average over graded items only.
    pub current: f64,
    /// Final grade if every ungraded item scores 100.
    pub max: f64,
    /// Final grade if every ungraded item scores 0.
    pub min: f64,
    pub graded_weight: f64,
    pub ungraded_weight: f64,
    /// Part of the 100 points not yet assigned to any category.
    pub unassigned_weight: f64,
}

pub fn aggregate(categories: &[Category]) -> GradeAggregate {
    let mut earned = 0.0_f64;
    let mut graded_weight = 0.0_f64;
    let mut ungraded_weight = 0.0_f64;
    let mut total_weight = 0.0_f64;

    for cat in categories {
        total_weight += cat.weight;
        let Some(item_weight) = cat.item_weight() else {
            continue;
        };
        for item in &cat.items {
            match item.score {
                Some(score) => {
                    earned += item_weight * score / 100.0;
                    graded_weight += item_weight;
                }
                None => ungraded_weight += item_weight,
            }
        }
    }

    let current = if graded_weight > 0.0 {
        100.0 * earned / graded_weight
    } else {
        0.0
    };
    let min = earned.clamp(0.0, 100.0);
    let max = (earned + ungraded_weight).clamp(min, 100.0);

    GradeAggregate {
        current,
        max,
        min,
        graded_weight,
        ungraded_weight,
        unassigned_weight: (100.0 - total_weight).max(0.0),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub target: f64,
    pub max_possible: f64,
    /// `max_possible - target`, may be negative.
    pub slack: f64,
    pub achievable: bool,
}

impl Budget {
    /// Points that may still be given up across all ungraded slots.
    pub fn deductible(&self) -> f64 {
        self.slack.max(0.0)
    }

    pub fn has_slack(&self) -> bool {
        self.slack > 0.0
    }
}

pub fn compute_budget(max_possible: f64, target: f64) -> Budget {
    let slack = max_possible - target;
    Budget {
        target,
        max_possible,
        slack,
        achievable: max_possible >= target - EPSILON,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightValidation {
    pub valid: bool,
    pub total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn validate_total_weight(categories: &[Category]) -> WeightValidation {
    let total: f64 = categories.iter().map(|c| c.weight).sum();
    let valid = (total - 100.0).abs() < EPSILON;
    WeightValidation {
        valid,
        total,
        error: if valid {
            None
        } else {
            Some(format!("Total weight is {:.1}%, must equal 100%", total))
        },
    }
}
