use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar(config: &Path) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradeplannerd");
    let mut child = Command::new(exe)
        .env("GRADEPLANNERD_CONFIG", config)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradeplannerd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

#[test]
fn config_file_sets_defaults_and_keywords() {
    let dir = temp_dir("gradeplannerd-config");
    let cfg = dir.join("config.json");
    std::fs::write(
        &cfg,
        r#"{ "defaultTarget": "B+", "defaultStrategy": "equal", "attendanceKeywords": ["present"] }"#,
    )
    .expect("write config");

    let (mut child, mut stdin, mut reader) = spawn_sidecar(&cfg);
    let snapshot = request_ok(&mut stdin, &mut reader, "1", "planner.get", json!({}));
    assert_eq!(snapshot["target"], json!("B+"));
    assert_eq!(snapshot["strategy"], json!("equal"));
    assert_eq!(snapshot["config"]["attendanceKeywords"], json!(["present"]));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "categories.set",
        json!({ "categories": [
            { "id": 1, "name": "Attendance", "weight": 50, "items": [{ "name": "Mon" }] },
            { "id": 2, "name": "Participation", "weight": 50, "items": [{ "name": "Present Tue" }] }
        ]}),
    );
    let slots = request_ok(&mut stdin, &mut reader, "3", "slots.list", json!({}));
    assert_eq!(slots["slots"][0]["isAttendance"], json!(false));
    assert_eq!(slots["slots"][1]["isAttendance"], json!(true));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn unreadable_config_falls_back_to_defaults() {
    let dir = temp_dir("gradeplannerd-bad-config");
    let cfg = dir.join("config.json");
    std::fs::write(&cfg, "{ not json").expect("write config");

    let (mut child, mut stdin, mut reader) = spawn_sidecar(&cfg);
    let snapshot = request_ok(&mut stdin, &mut reader, "1", "planner.get", json!({}));
    assert_eq!(snapshot["target"], json!("A"));
    assert_eq!(snapshot["strategy"], json!("proportional"));
    assert_eq!(snapshot["config"]["projectionDebounceMs"], json!(100));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(dir);
}
