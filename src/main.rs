mod calc;
mod config;
mod engine;
mod ipc;
mod planner;

use std::io::{self, BufRead, Write};
use tracing::{info, warn};

fn main() {
    let (cfg, cfg_error) = match config::load() {
        Ok(cfg) => (cfg, None),
        Err(e) => (config::PlannerConfig::default(), Some(e)),
    };

    // stdout carries the IPC channel; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(cfg.log_level())
        .with_target(false)
        .init();
    if let Some(e) = cfg_error {
        warn!("config not loaded, using defaults: {e:#}");
    }
    info!(version = env!("CARGO_PKG_VERSION"), "gradeplannerd started");

    let mut state = ipc::AppState::new(cfg);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                warn!("bad request line: {}", e);
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    info!("stdin closed, exiting");
}
