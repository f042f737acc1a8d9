use crate::config::PlannerConfig;
use crate::engine::Debouncer;
use crate::planner::PlannerState;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: PlannerConfig,
    pub planner: PlannerState,
    pub debouncer: Debouncer,
}

impl AppState {
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            planner: PlannerState::new(&config),
            debouncer: Debouncer::new(config.debounce_window()),
            config,
        }
    }
}
