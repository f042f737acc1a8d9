use super::error::{ok, HandlerErr};
use super::types::{AppState, Request};
use serde::de::DeserializeOwned;
use tracing::warn;

pub type HandlerFn = fn(&mut AppState, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>;

/// Runs `f` on the request params and wraps the outcome in a response.
pub fn handle_with(state: &mut AppState, req: &Request, f: HandlerFn) -> serde_json::Value {
    match f(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => {
            warn!(method = %req.method, code = error.code, "{}", error.message);
            error.response(&req.id)
        }
    }
}

pub fn get_required_f64(params: &serde_json::Value, key: &str) -> Result<f64, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_required_i64(params: &serde_json::Value, key: &str) -> Result<i64, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_required_index(params: &serde_json::Value, key: &str) -> Result<usize, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_u64())
        .map(|v| v as usize)
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_required_str<'a>(params: &'a serde_json::Value, key: &str) -> Result<&'a str, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_optional_str<'a>(params: &'a serde_json::Value, key: &str) -> Result<Option<&'a str>, HandlerErr> {
    match params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v
            .as_str()
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a string", key))),
    }
}

pub fn get_optional_f64(params: &serde_json::Value, key: &str) -> Result<Option<f64>, HandlerErr> {
    match params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a number", key))),
    }
}

pub fn get_optional_bool(params: &serde_json::Value, key: &str) -> Result<Option<bool>, HandlerErr> {
    match params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v
            .as_bool()
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a boolean", key))),
    }
}

/// Absent key => `None`; `null` => `Some(None)`; number => `Some(Some(x))`.
pub fn get_nullable_f64(params: &serde_json::Value, key: &str) -> Result<Option<Option<f64>>, HandlerErr> {
    match params.get(key) {
        None => Ok(None),
        Some(serde_json::Value::Null) => Ok(Some(None)),
        Some(v) => v
            .as_f64()
            .map(|x| Some(Some(x)))
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a number or null", key))),
    }
}

/// Deserializes `params[key]` into `T`.
pub fn get_required_as<T: DeserializeOwned>(params: &serde_json::Value, key: &str) -> Result<T, HandlerErr> {
    let v = params
        .get(key)
        .cloned()
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))?;
    serde_json::from_value(v).map_err(|e| HandlerErr::bad_params(format!("invalid {}: {}", key, e)))
}

/// Parses a `FromStr` value held as a string under `key`.
pub fn get_parsed<T>(params: &serde_json::Value, key: &str) -> Result<T, HandlerErr>
where
    T: std::str::FromStr<Err = String>,
{
    get_required_str(params, key)?
        .parse()
        .map_err(HandlerErr::bad_params)
}
