use super::attendance::{round_attendance, Need};
use super::slots::{score_from_deduction, UngradedSlot};
use super::{CONVERGENCE_EPSILON, MAX_SACRIFICE_ROUNDS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Every regular slot needs the same percentage of its own weight.
    #[default]
    Proportional,
    /// Every slot absorbs the same absolute deduction; slots too small to
    /// absorb their share are sacrificed and the rest carries over.
    Equal,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Proportional => "proportional",
            Strategy::Equal => "equal",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "proportional" => Ok(Strategy::Proportional),
            "equal" => Ok(Strategy::Equal),
            other => Err(format!(
                "strategy must be one of: proportional, equal (got {})",
                other
            )),
        }
    }
}

/// Assigns a required score to every unpinned slot so that the total
/// deduction spends `deductible` points. Pinned slots keep their values and
/// their deductions are taken off the budget first.
pub fn allocate(strategy: Strategy, slots: &[UngradedSlot], deductible: f64) -> Vec<UngradedSlot> {
    let mut out = slots.to_vec();
    let active: Vec<usize> = out
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.is_pinned)
        .map(|(i, _)| i)
        .collect();
    if active.is_empty() {
        return out;
    }

    let pinned_deductions: f64 = out
        .iter()
        .filter(|s| s.is_pinned)
        .map(|s| s.deducted_points)
        .sum();
    let budget = deductible - pinned_deductions;
    if budget <= 0.0 {
        for &i in &active {
            out[i].max_out();
        }
        return out;
    }

    for &i in &active {
        out[i].max_deduction = out[i].item_weight;
    }
    let total_weight: f64 = active.iter().map(|&i| out[i].item_weight).sum();
    if total_weight <= 0.0 {
        return out;
    }

    let mut needs: Vec<Need> = active
        .iter()
        .map(|&i| Need {
            weight: out[i].item_weight,
            needed: out[i].item_weight,
            is_attendance: out[i].is_attendance,
        })
        .collect();

    match strategy {
        Strategy::Proportional => proportional_needs(&mut needs, budget, total_weight),
        Strategy::Equal => equal_needs(&mut needs, budget),
    }
    let rounding = round_attendance(&mut needs);
    debug!(
        strategy = strategy.as_str(),
        budget,
        sessions = rounding.sessions_needed,
        surplus = rounding.surplus,
        "allocated slots"
    );

    for (&i, need) in active.iter().zip(&needs) {
        let slot = &mut out[i];
        if slot.is_attendance {
            slot.set_attending(need.needed >= slot.item_weight * 0.5);
        } else {
            let deducted = (slot.item_weight - need.needed).max(0.0);
            slot.deducted_points = deducted;
            slot.assumed_score = score_from_deduction(slot.item_weight, deducted);
        }
    }
    out
}

fn proportional_needs(needs: &mut [Need], budget: f64, total_weight: f64) {
    let ratio = ((total_weight - budget) / total_weight).clamp(0.0, 1.0);
    for n in needs.iter_mut() {
        n.needed = n.weight * ratio;
    }
}

fn equal_needs(needs: &mut [Need], budget: f64) {
    let mut sacrificed = vec![false; needs.len()];
    let mut remaining = budget;
    let mut rounds = 0;

    while remaining > CONVERGENCE_EPSILON && rounds < MAX_SACRIFICE_ROUNDS {
        let active = sacrificed.iter().filter(|s| !**s).count();
        if active == 0 {
            break;
        }
        let share = remaining / (active as f64);
        let mut carry_over = 0.0_f64;

        for (n, gone) in needs.iter_mut().zip(sacrificed.iter_mut()) {
            if *gone {
                continue;
            }
            let next = n.needed - share;
            if next < 0.0 {
                n.needed = 0.0;
                carry_over += -next;
                *gone = true;
            } else {
                n.needed = next;
            }
        }

        remaining = carry_over;
        rounds += 1;
    }
}
