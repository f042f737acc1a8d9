use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use tracing::info;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "categories": state.planner.categories().len(),
            "slots": state.planner.slots().len(),
        }),
    )
}

fn planner_snapshot(state: &AppState) -> serde_json::Value {
    let p = &state.planner;
    json!({
        "categories": p.categories(),
        "target": p.target(),
        "strategy": p.strategy(),
        "validation": p.validate(),
        "config": state.config,
    })
}

fn handle_planner_reset(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.planner.reset();
    info!("planner reset");
    ok(&req.id, planner_snapshot(state))
}

fn handle_planner_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, planner_snapshot(state))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "planner.reset" => Some(handle_planner_reset(state, req)),
        "planner.get" => Some(handle_planner_get(state, req)),
        _ => None,
    }
}
