use super::slots::UngradedSlot;
use crate::calc::Category;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Final grade if every graded item keeps its score and every ungraded item
/// lands on its slot's assumed score. Items without a slot count as 100.
/// Slots are matched by category id and item position.
pub fn projected_grade(categories: &[Category], slots: &[UngradedSlot]) -> f64 {
    let by_position: HashMap<(i64, usize), &UngradedSlot> = slots
        .iter()
        .map(|s| ((s.category_id, s.item_index), s))
        .collect();

    let mut total = 0.0_f64;
    for cat in categories {
        let Some(item_weight) = cat.item_weight() else {
            continue;
        };
        for (idx, item) in cat.items.iter().enumerate() {
            let score = match item.score {
                Some(s) => s,
                None => by_position
                    .get(&(cat.id, idx))
                    .map(|s| s.effective_score())
                    .unwrap_or(100.0),
            };
            total += item_weight * score / 100.0;
        }
    }
    total
}

/// Rate limiter for the live projection while a slider is dragged.
///
/// The first request after a quiet period runs immediately; requests that
/// arrive within `window` of the last run are reported as pending and are
/// picked up by the next run.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last_run: Option<Instant>,
    pending: bool,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_run: None,
            pending: false,
        }
    }

    /// Records a change at `now` and says whether to recompute right away.
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last_run {
            Some(t) if now.saturating_duration_since(t) < self.window => {
                self.pending = true;
                false
            }
            _ => {
                self.mark_run(now);
                true
            }
        }
    }

    pub fn mark_run(&mut self, now: Instant) {
        self.last_run = Some(now);
        self.pending = false;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}
