use crate::calc::Category;
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{
    get_nullable_f64, get_optional_bool, get_optional_f64, get_optional_str, get_required_as,
    get_required_i64, get_required_index, handle_with,
};
use crate::ipc::types::{AppState, Request};
use crate::planner::ItemPatch;
use serde_json::json;
use tracing::info;

fn categories_result(state: &AppState) -> serde_json::Value {
    json!({
        "categories": state.planner.categories(),
        "validation": state.planner.validate(),
    })
}

fn categories_set(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let categories: Vec<Category> = get_required_as(params, "categories")?;
    let count = categories.len();
    state.planner.set_categories(categories)?;
    info!(count, "categories replaced");
    Ok(categories_result(state))
}

fn categories_add(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let name = get_optional_str(params, "name")?;
    let weight = get_optional_f64(params, "weight")?;
    let id = state.planner.add_category(name, weight)?;
    info!(category_id = id, "category added");
    let mut result = categories_result(state);
    result["categoryId"] = json!(id);
    Ok(result)
}

fn categories_update(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_i64(params, "categoryId")?;
    let name = get_optional_str(params, "name")?;
    let weight = get_optional_f64(params, "weight")?;
    state.planner.update_category(id, name, weight)?;
    Ok(categories_result(state))
}

fn categories_delete(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_i64(params, "categoryId")?;
    state.planner.delete_category(id)?;
    info!(category_id = id, "category deleted");
    Ok(categories_result(state))
}

fn items_add(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let category_id = get_required_i64(params, "categoryId")?;
    let name = get_optional_str(params, "name")?;
    let score = get_optional_f64(params, "score")?;
    let is_attendance = get_optional_bool(params, "isAttendance")?.unwrap_or(false);
    let index = state
        .planner
        .add_item(category_id, name, score, is_attendance)?;
    let mut result = categories_result(state);
    result["itemIndex"] = json!(index);
    Ok(result)
}

fn items_update(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let category_id = get_required_i64(params, "categoryId")?;
    let index = get_required_index(params, "itemIndex")?;
    let patch = ItemPatch {
        name: get_optional_str(params, "name")?.map(str::to_string),
        score: get_nullable_f64(params, "score")?,
        is_attendance: get_optional_bool(params, "isAttendance")?,
    };
    state.planner.update_item(category_id, index, patch)?;
    Ok(categories_result(state))
}

fn items_delete(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let category_id = get_required_i64(params, "categoryId")?;
    let index = get_required_index(params, "itemIndex")?;
    state.planner.delete_item(category_id, index)?;
    Ok(categories_result(state))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "categories.list" => Some(ok(&req.id, categories_result(state))),
        "categories.validate" => Some(ok(&req.id, json!(state.planner.validate()))),
        "categories.set" => Some(handle_with(state, req, categories_set)),
        "categories.add" => Some(handle_with(state, req, categories_add)),
        "categories.update" => Some(handle_with(state, req, categories_update)),
        "categories.delete" => Some(handle_with(state, req, categories_delete)),
        "items.add" => Some(handle_with(state, req, items_add)),
        "items.update" => Some(handle_with(state, req, items_update)),
        "items.delete" => Some(handle_with(state, req, items_delete)),
        _ => None,
    }
}
