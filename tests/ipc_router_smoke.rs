use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradeplannerd");
    let mut child = Command::new(exe)
        .env_remove("GRADEPLANNERD_CONFIG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradeplannerd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn read_response(reader: &mut BufReader<ChildStdout>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response");
    serde_json::from_str(line.trim()).expect("parse response json")
}

fn request(
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

    let value = read_response(reader);
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let code = value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        assert_ne!(
            code, "not_implemented",
            "unexpected unknown method for {}",
            method
        );
    }
    value
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["ok"], json!(true));
    assert_eq!(health["result"]["version"], json!(env!("CARGO_PKG_VERSION")));

    let calls: Vec<(&str, serde_json::Value)> = vec![
        ("planner.get", json!({})),
        (
            "categories.set",
            json!({ "categories": [
                { "id": 1, "name": "Exams", "weight": 60, "items": [
                    { "name": "Midterm", "score": 90 },
                    { "name": "Final", "score": null }
                ]},
                { "id": 2, "name": "Homework", "weight": 40, "items": [
                    { "name": "HW1", "score": 100 }
                ]}
            ]}),
        ),
        ("categories.list", json!({})),
        ("categories.validate", json!({})),
        ("categories.add", json!({ "name": "Extra", "weight": 0 })),
        ("categories.update", json!({ "categoryId": 3, "name": "Bonus" })),
        ("items.add", json!({ "categoryId": 3, "name": "B2" })),
        ("items.update", json!({ "categoryId": 3, "itemIndex": 1, "score": 80 })),
        ("items.delete", json!({ "categoryId": 3, "itemIndex": 1 })),
        ("categories.delete", json!({ "categoryId": 3 })),
        ("target.set", json!({ "target": "B+" })),
        ("strategy.set", json!({ "strategy": "equal" })),
        ("grades.aggregate", json!({})),
        ("plan.get", json!({})),
        ("slots.list", json!({})),
        ("slots.edit", json!({ "index": 0, "score": 85 })),
        ("slots.togglePin", json!({ "index": 0 })),
        ("projection.get", json!({})),
        ("engine.budget", json!({ "maxPossible": 100, "target": "A" })),
        (
            "engine.allocate",
            json!({
                "strategy": "proportional",
                "totalDeductible": 2,
                "slots": [{ "categoryId": 1, "itemName": "Final", "itemWeight": 10 }]
            }),
        ),
        (
            "engine.applyEdit",
            json!({
                "index": 0,
                "score": 90,
                "totalDeductible": 2,
                "slots": [{ "categoryId": 1, "itemName": "Final", "itemWeight": 10, "maxDeduction": 10 }]
            }),
        ),
        ("planner.reset", json!({})),
    ];
    for (i, (method, params)) in calls.into_iter().enumerate() {
        let id = format!("{}", i + 2);
        let resp = request(&mut stdin, &mut reader, &id, method, params);
        assert_eq!(resp["ok"], json!(true), "{} failed: {}", method, resp);
    }

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn unknown_method_and_bad_json_are_reported() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let payload = json!({ "id": "u1", "method": "grades.teleport", "params": {} });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");
    let resp = read_response(&mut reader);
    assert_eq!(resp["ok"], json!(false));
    assert_eq!(resp["error"]["code"], json!("not_implemented"));
    assert!(resp["error"]["message"]
        .as_str()
        .unwrap_or("")
        .contains("grades.teleport"));

    writeln!(stdin, "{{ this is not json").expect("write garbage");
    stdin.flush().expect("flush");
    let resp = read_response(&mut reader);
    assert_eq!(resp["ok"], json!(false));
    assert_eq!(resp["error"]["code"], json!("bad_json"));

    // The sidecar keeps serving after a bad line.
    let resp = request(&mut stdin, &mut reader, "h2", "health", json!({}));
    assert_eq!(resp["ok"], json!(true));

    drop(stdin);
    let _ = child.wait();
}
