use super::slots::{deduction_for_score, UngradedSlot};
use super::{within_budget, EngineError};
use crate::calc::{round_off_1_decimal, EPSILON};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EditOutcome {
    /// The new value fit inside the budget as-is.
    Applied,
    /// The new value asked for more than the slot can lose; it was capped.
    Clamped,
    /// Other slots gave back enough points to make room.
    Redistributed,
    /// Other slots could not make enough room; the edited slot was limited.
    Limited,
    /// The slot is pinned and was left untouched.
    Pinned,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditResult {
    pub slots: Vec<UngradedSlot>,
    pub outcome: EditOutcome,
}

impl EditResult {
    /// False only when redistribution could not free the full amount.
    pub fn fully_redistributed(&self) -> bool {
        self.outcome != EditOutcome::Limited
    }
}

fn sum_deductions_except(slots: &[UngradedSlot], index: usize) -> f64 {
    slots
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, s)| s.deducted_points)
        .sum()
}

/// Attendance slots can only be fully absent or fully attended.
fn commit_deduction(slot: &mut UngradedSlot, deduction: f64) {
    if slot.is_attendance {
        slot.set_attending(deduction < slot.item_weight - EPSILON);
    } else {
        slot.set_deduction(deduction);
    }
}

/// Sets slot `index` to `new_score` and keeps the total deduction inside
/// `total_deductible` by taking points back from other unpinned slots.
pub fn apply_edit(
    slots: &[UngradedSlot],
    index: usize,
    new_score: f64,
    total_deductible: f64,
) -> Result<EditResult, EngineError> {
    let mut out = slots.to_vec();
    let Some(slot) = out.get(index).cloned() else {
        return Err(EngineError::SlotOutOfRange {
            index,
            len: out.len(),
        });
    };
    if slot.is_pinned {
        return Ok(EditResult {
            slots: out,
            outcome: EditOutcome::Pinned,
        });
    }

    let score = new_score.clamp(0.0, 100.0);
    let new_deduction = if slot.is_attendance {
        if score >= 50.0 {
            0.0
        } else {
            slot.item_weight
        }
    } else {
        deduction_for_score(slot.item_weight, score)
    };

    if new_deduction > slot.max_deduction + EPSILON {
        commit_deduction(&mut out[index], slot.max_deduction);
        return Ok(EditResult {
            slots: out,
            outcome: EditOutcome::Clamped,
        });
    }

    let other_deductions = sum_deductions_except(&out, index);
    let new_total = new_deduction + other_deductions;

    if slot.is_attendance {
        commit_deduction(&mut out[index], new_deduction);
    } else {
        out[index].deducted_points = new_deduction;
        out[index].assumed_score = round_off_1_decimal(score);
    }
    if within_budget(new_total, total_deductible) {
        return Ok(EditResult {
            slots: out,
            outcome: EditOutcome::Applied,
        });
    }

    let need_to_free = new_total - total_deductible;
    if redistribute(&mut out, index, need_to_free) {
        debug!(index, need_to_free, "edit absorbed by other slots");
        return Ok(EditResult {
            slots: out,
            outcome: EditOutcome::Redistributed,
        });
    }

    let others_after = sum_deductions_except(&out, index);
    let max_allowed = (total_deductible - others_after)
        .min(slot.max_deduction)
        .max(0.0);
    commit_deduction(&mut out[index], max_allowed);
    debug!(index, need_to_free, max_allowed, "edit limited by budget");
    Ok(EditResult {
        slots: out,
        outcome: EditOutcome::Limited,
    })
}

/// Takes `need_to_free` points of deduction back from unpinned slots other
/// than `exclude`. Returns whether the full amount was freed.
fn redistribute(slots: &mut [UngradedSlot], exclude: usize, need_to_free: f64) -> bool {
    let mut candidates: Vec<usize> = slots
        .iter()
        .enumerate()
        .filter(|(j, s)| *j != exclude && !s.is_pinned && s.deducted_points > 0.0)
        .map(|(j, _)| j)
        .collect();
    if candidates.is_empty() {
        return false;
    }
    candidates.sort_by(|&a, &b| {
        slots[b]
            .deducted_points
            .partial_cmp(&slots[a].deducted_points)
            .unwrap_or(Ordering::Equal)
    });

    let mut remaining = need_to_free;

    // Phase 1: proportional to each slot's capacity.
    let regular: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|&j| !slots[j].is_attendance)
        .collect();
    let capacity: f64 = regular.iter().map(|&j| slots[j].max_deduction).sum();
    if capacity > 0.0 {
        for &j in &regular {
            if remaining <= EPSILON {
                break;
            }
            let target = need_to_free * slots[j].max_deduction / capacity;
            let reduction = slots[j].deducted_points.min(target).min(remaining);
            slots[j].deducted_points -= reduction;
            remaining -= reduction;
        }
    }

    // Phase 2: greedy, largest deduction first.
    for &j in &candidates {
        if remaining <= EPSILON {
            break;
        }
        let available = slots[j].deducted_points;
        if available <= 0.0 {
            continue;
        }
        if slots[j].is_attendance {
            slots[j].set_attending(true);
            remaining -= available;
        } else {
            let reduction = available.min(remaining);
            slots[j].deducted_points -= reduction;
            remaining -= reduction;
        }
    }

    for &j in &candidates {
        if !slots[j].is_attendance {
            let d = slots[j].deducted_points;
            slots[j].set_deduction(d);
        }
    }

    remaining <= EPSILON
}

pub fn toggle_pin(slots: &[UngradedSlot], index: usize) -> Result<Vec<UngradedSlot>, EngineError> {
    let mut out = slots.to_vec();
    let len = out.len();
    let slot = out
        .get_mut(index)
        .ok_or(EngineError::SlotOutOfRange { index, len })?;
    slot.is_pinned = !slot.is_pinned;
    Ok(out)
}
