use crate::calc::{compute_budget, LetterGrade};
use crate::engine::{allocate, apply_edit, Strategy, UngradedSlot};
use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{
    get_optional_f64, get_parsed, get_required_as, get_required_f64, get_required_index,
    handle_with,
};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

// Stateless access to the engine: callers pass their own slot lists and the
// planner state is left alone.

fn engine_allocate(_state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let strategy: Strategy = get_parsed(params, "strategy")?;
    let slots: Vec<UngradedSlot> = get_required_as(params, "slots")?;
    let deductible = get_required_f64(params, "totalDeductible")?;
    Ok(json!({ "slots": allocate(strategy, &slots, deductible) }))
}

/// Without a capacity every edit would clamp to zero, so `applyEdit` slots
/// must carry one.
fn require_max_deduction(params: &serde_json::Value) -> Result<(), HandlerErr> {
    let Some(slots) = params.get("slots").and_then(|v| v.as_array()) else {
        return Ok(());
    };
    for (i, slot) in slots.iter().enumerate() {
        if !slot.get("maxDeduction").is_some_and(|v| v.is_number()) {
            return Err(HandlerErr::bad_params(format!(
                "slots[{}].maxDeduction is required",
                i
            )));
        }
    }
    Ok(())
}

fn engine_apply_edit(_state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_max_deduction(params)?;
    let slots: Vec<UngradedSlot> = get_required_as(params, "slots")?;
    let index = get_required_index(params, "index")?;
    let score = get_required_f64(params, "score")?;
    let deductible = get_required_f64(params, "totalDeductible")?;
    let res = apply_edit(&slots, index, score, deductible)?;
    Ok(json!(res))
}

fn engine_budget(_state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let max_possible = get_required_f64(params, "maxPossible")?;
    let target = match get_optional_f64(params, "targetPercent")? {
        Some(pct) => pct,
        None => get_parsed::<LetterGrade>(params, "target")?.threshold(),
    };
    let budget = compute_budget(max_possible, target);
    Ok(json!({
        "budget": budget,
        "totalDeductiblePoints": budget.deductible(),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "engine.allocate" => Some(handle_with(state, req, engine_allocate)),
        "engine.applyEdit" => Some(handle_with(state, req, engine_apply_edit)),
        "engine.budget" => Some(handle_with(state, req, engine_budget)),
        _ => None,
    }
}
