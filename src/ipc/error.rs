use crate::engine::EngineError;
use crate::planner::PlannerError;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

#[derive(Debug)]
pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn bad_params(message: impl Into<String>) -> Self {
        Self {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<PlannerError> for HandlerErr {
    fn from(e: PlannerError) -> Self {
        let details = match &e {
            PlannerError::CategoryNotFound(id) => Some(json!({ "categoryId": id })),
            PlannerError::ItemNotFound { category_id, index } => {
                Some(json!({ "categoryId": category_id, "itemIndex": index }))
            }
            PlannerError::Engine(EngineError::SlotOutOfRange { index, len }) => {
                Some(json!({ "index": index, "len": len }))
            }
            PlannerError::Invalid(_) => None,
        };
        Self {
            code: e.code(),
            message: e.to_string(),
            details,
        }
    }
}

impl From<EngineError> for HandlerErr {
    fn from(e: EngineError) -> Self {
        PlannerError::from(e).into()
    }
}
