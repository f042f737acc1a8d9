use crate::calc::LetterGrade;
use crate::engine::Strategy;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const CONFIG_ENV: &str = "GRADEPLANNERD_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlannerConfig {
    pub default_target: LetterGrade,
    pub default_strategy: Strategy,
    pub projection_debounce_ms: u64,
    /// Ungraded items whose item or category name contains one of these
    /// (case-insensitive) are treated as attendance.
    pub attendance_keywords: Vec<String>,
    pub log_level: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_target: LetterGrade::A,
            default_strategy: Strategy::Proportional,
            projection_debounce_ms: 100,
            attendance_keywords: vec!["attendance".to_string()],
            log_level: "info".to_string(),
        }
    }
}

impl PlannerConfig {
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.projection_debounce_ms)
    }

    pub fn log_level(&self) -> tracing::Level {
        self.log_level.trim().parse().unwrap_or(tracing::Level::INFO)
    }
}

pub fn load_from_path(path: &Path) -> anyhow::Result<PlannerConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: PlannerConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}

/// Config from the file named by `GRADEPLANNERD_CONFIG`, or defaults when unset.
pub fn load() -> anyhow::Result<PlannerConfig> {
    match std::env::var_os(CONFIG_ENV) {
        Some(p) if !p.is_empty() => load_from_path(Path::new(&p)),
        _ => Ok(PlannerConfig::default()),
    }
}
