use super::CONVERGENCE_EPSILON;
use std::cmp::Ordering;

/// Working value for one slot while a strategy runs: how much of its own
/// weight the student still needs to keep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Need {
    pub weight: f64,
    pub needed: f64,
    pub is_attendance: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(super) struct AttendanceRounding {
    pub sessions_needed: usize,
    pub surplus: f64,
}

/// Turns fractional attendance needs into whole attend/absent sessions and
/// hands the rounding surplus to the regular slots as extra deduction.
///
/// Sessions with the largest need are attended first, until the kept weight
/// covers the total need. For one-point sessions that is `ceil(total)`.
pub(super) fn round_attendance(needs: &mut [Need]) -> AttendanceRounding {
    let mut order: Vec<usize> = needs
        .iter()
        .enumerate()
        .filter(|(_, n)| n.is_attendance)
        .map(|(i, _)| i)
        .collect();
    if order.is_empty() {
        return AttendanceRounding::default();
    }

    let total_needed: f64 = order.iter().map(|&i| needs[i].needed).sum();
    order.sort_by(|&a, &b| {
        needs[b]
            .needed
            .partial_cmp(&needs[a].needed)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept = 0.0_f64;
    let mut sessions_needed = 0_usize;
    for &i in &order {
        if kept >= total_needed - CONVERGENCE_EPSILON {
            needs[i].needed = 0.0;
        } else {
            kept += needs[i].weight;
            sessions_needed += 1;
            needs[i].needed = needs[i].weight;
        }
    }

    let surplus = (kept - total_needed).max(0.0);
    if surplus > CONVERGENCE_EPSILON {
        spread_surplus(needs, surplus);
    }

    AttendanceRounding {
        sessions_needed,
        surplus,
    }
}

/// Extra deduction on regular slots, proportional to each one's current need.
fn spread_surplus(needs: &mut [Need], surplus: f64) {
    let total_regular: f64 = needs
        .iter()
        .filter(|n| !n.is_attendance && n.needed > 0.0)
        .map(|n| n.needed)
        .sum();
    if total_regular <= 0.0 {
        return;
    }
    for n in needs.iter_mut().filter(|n| !n.is_attendance && n.needed > 0.0) {
        let extra = surplus * n.needed / total_regular;
        n.needed = (n.needed - extra).max(0.0);
    }
}
