use crate::calc::{round_off_1_decimal, Category};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Attendance slots store `1.0` for attend and `0.0` for absent.
pub const ATTEND: f64 = 1.0;
pub const ABSENT: f64 = 0.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UngradedSlot {
    pub category_id: i64,
    #[serde(default)]
    pub category_name: String,
    pub item_name: String,
    #[serde(default)]
    pub item_index: usize,
    pub item_weight: f64,
    #[serde(default)]
    pub max_deduction: f64,
    #[serde(default)]
    pub deducted_points: f64,
    #[serde(default = "full_score")]
    pub assumed_score: f64,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_attendance: bool,
}

fn full_score() -> f64 {
    100.0
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub category_id: i64,
    pub item_name: String,
}

impl UngradedSlot {
    pub fn new(category: &Category, item_index: usize, item_weight: f64, is_attendance: bool) -> Self {
        let item_name = category
            .items
            .get(item_index)
            .map(|i| i.name.clone())
            .unwrap_or_default();
        Self {
            category_id: category.id,
            category_name: category.name.clone(),
            item_name,
            item_index,
            item_weight,
            max_deduction: 0.0,
            deducted_points: 0.0,
            assumed_score: if is_attendance { ATTEND } else { 100.0 },
            is_pinned: false,
            is_attendance,
        }
    }

    pub fn key(&self) -> SlotKey {
        SlotKey {
            category_id: self.category_id,
            item_name: self.item_name.clone(),
        }
    }

    pub fn is_attending(&self) -> bool {
        self.is_attendance && self.assumed_score >= ATTEND
    }

    /// Score on the 0-100 scale regardless of slot kind.
    pub fn effective_score(&self) -> f64 {
        if self.is_attendance {
            if self.is_attending() {
                100.0
            } else {
                0.0
            }
        } else {
            self.assumed_score
        }
    }

    /// Sets a regular slot's deduction and derives its score from it.
    pub fn set_deduction(&mut self, deducted: f64) {
        self.deducted_points = deducted.max(0.0);
        self.assumed_score = score_from_deduction(self.item_weight, self.deducted_points);
    }

    pub fn set_attending(&mut self, attend: bool) {
        if attend {
            self.assumed_score = ATTEND;
            self.deducted_points = 0.0;
        } else {
            self.assumed_score = ABSENT;
            self.deducted_points = self.item_weight;
        }
    }

    /// Puts the slot at its best possible value with nothing left to give up.
    pub fn max_out(&mut self) {
        self.max_deduction = 0.0;
        self.deducted_points = 0.0;
        self.assumed_score = if self.is_attendance { ATTEND } else { 100.0 };
    }

    /// Re-derives deduction and capacity from the frozen score after the
    /// item weight changed.
    fn refreeze(&mut self, item_weight: f64, previous: &UngradedSlot) {
        self.is_pinned = true;
        self.item_weight = item_weight;
        self.max_deduction = item_weight;
        if self.is_attendance {
            let attend = previous.is_attendance && previous.assumed_score >= ATTEND;
            self.set_attending(attend);
        } else {
            self.assumed_score = previous.assumed_score.clamp(0.0, 100.0);
            self.deducted_points = deduction_for_score(item_weight, self.assumed_score);
        }
    }
}

pub fn deduction_for_score(item_weight: f64, score: f64) -> f64 {
    item_weight * (100.0 - score) / 100.0
}

/// Regular-slot score for a given deduction, clamped and rounded to 1 decimal.
pub fn score_from_deduction(item_weight: f64, deducted: f64) -> f64 {
    if item_weight <= 0.0 {
        return 100.0;
    }
    let reduction = deducted * 100.0 / item_weight;
    round_off_1_decimal((100.0 - reduction).clamp(0.0, 100.0))
}

pub fn is_attendance_item(
    category: &Category,
    item_index: usize,
    attendance_keywords: &[String],
) -> bool {
    let Some(item) = category.items.get(item_index) else {
        return false;
    };
    if item.is_attendance {
        return true;
    }
    let item_name = item.name.to_lowercase();
    let category_name = category.name.to_lowercase();
    attendance_keywords.iter().any(|k| {
        let k = k.trim().to_lowercase();
        !k.is_empty() && (item_name.contains(&k) || category_name.contains(&k))
    })
}

/// Builds a fresh slot list from the categories. Slots that were pinned in
/// `previous` (matched by category id and item name) stay pinned and keep
/// their score.
pub fn collect_ungraded_slots(
    categories: &[Category],
    previous: &[UngradedSlot],
    attendance_keywords: &[String],
) -> Vec<UngradedSlot> {
    let mut pinned: HashMap<SlotKey, &UngradedSlot> = previous
        .iter()
        .filter(|s| s.is_pinned)
        .map(|s| (s.key(), s))
        .collect();

    let mut slots = Vec::new();
    for cat in categories {
        let Some(item_weight) = cat.item_weight() else {
            continue;
        };
        for (idx, item) in cat.items.iter().enumerate() {
            if item.is_graded() {
                continue;
            }
            let is_attendance = is_attendance_item(cat, idx, attendance_keywords);
            let mut slot = UngradedSlot::new(cat, idx, item_weight, is_attendance);
            // A pin is carried over to at most one item.
            if let Some(prev) = pinned.remove(&slot.key()) {
                slot.refreeze(item_weight, prev);
            }
            slots.push(slot);
        }
    }
    slots
}
