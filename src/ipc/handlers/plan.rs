use crate::calc::LetterGrade;
use crate::engine::Strategy;
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{get_parsed, handle_with};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use tracing::info;

fn target_set(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let target: LetterGrade = get_parsed(params, "target")?;
    state.planner.set_target(target);
    info!(target_grade = target.as_str(), "target changed");
    Ok(json!(state.planner.report()))
}

fn strategy_set(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let strategy: Strategy = get_parsed(params, "strategy")?;
    state.planner.set_strategy(strategy);
    info!(strategy = strategy.as_str(), "strategy changed");
    Ok(json!(state.planner.report()))
}

fn grades_aggregate(state: &AppState) -> serde_json::Value {
    let agg = state.planner.aggregate();
    json!({
        "aggregate": agg,
        "currentLetter": LetterGrade::from_percentage(agg.current),
        "maxLetter": LetterGrade::from_percentage(agg.max),
        "minLetter": LetterGrade::from_percentage(agg.min),
        "budget": state.planner.budget(),
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "target.set" => Some(handle_with(state, req, target_set)),
        "strategy.set" => Some(handle_with(state, req, strategy_set)),
        "grades.aggregate" => Some(ok(&req.id, grades_aggregate(state))),
        "plan.get" => Some(ok(&req.id, json!(state.planner.report()))),
        _ => None,
    }
}
