use crate::calc::LetterGrade;
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{get_required_f64, get_required_index, handle_with};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::time::Instant;
use tracing::debug;

fn projection(state: &AppState) -> serde_json::Value {
    let grade = state.planner.projected_grade();
    json!({
        "projectedGrade": grade,
        "projectedLetter": LetterGrade::from_percentage(grade),
        "attendance": state.planner.attendance_summary(),
    })
}

fn slots_edit(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let index = get_required_index(params, "index")?;
    let score = get_required_f64(params, "score")?;
    let outcome = state.planner.edit_slot(index, score)?;
    debug!(index, score, ?outcome, "slot edited");

    let mut result = json!({
        "outcome": outcome,
        "slots": state.planner.slots(),
    });
    if state.debouncer.ready(Instant::now()) {
        result["projection"] = projection(state);
    }
    result["projectionPending"] = json!(state.debouncer.is_pending());
    Ok(result)
}

fn slots_toggle_pin(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let index = get_required_index(params, "index")?;
    let pinned = state.planner.toggle_pin(index)?;
    debug!(index, pinned, "slot pin toggled");
    Ok(json!({
        "isPinned": pinned,
        "slots": state.planner.slots(),
    }))
}

fn projection_get(state: &mut AppState) -> serde_json::Value {
    state.debouncer.mark_run(Instant::now());
    projection(state)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "slots.list" => Some(ok(&req.id, json!({ "slots": state.planner.slots() }))),
        "slots.edit" => Some(handle_with(state, req, slots_edit)),
        "slots.togglePin" => Some(handle_with(state, req, slots_toggle_pin)),
        "projection.get" => Some(ok(&req.id, projection_get(state))),
        _ => None,
    }
}
