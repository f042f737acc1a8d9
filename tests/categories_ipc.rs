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

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> &str {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

#[test]
fn category_and_item_crud_recomputes_slots() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let empty = request_ok(&mut stdin, &mut reader, "1", "categories.list", json!({}));
    assert_eq!(empty["categories"], json!([]));
    assert_eq!(empty["validation"]["valid"], json!(false));

    let added = request_ok(&mut stdin, &mut reader, "2", "categories.add", json!({}));
    assert_eq!(added["categoryId"], json!(1));
    assert_eq!(added["categories"][0]["name"], json!("New Category"));
    assert_eq!(added["categories"][0]["items"][0]["name"], json!("Item 1"));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "categories.update",
        json!({ "categoryId": 1, "name": "Labs", "weight": 100 }),
    );
    let item = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "items.add",
        json!({ "categoryId": 1, "score": 70 }),
    );
    assert_eq!(item["itemIndex"], json!(1));
    assert_eq!(item["categories"][0]["items"][1]["name"], json!("Item 2"));
    assert_eq!(item["validation"]["valid"], json!(true));

    let slots = request_ok(&mut stdin, &mut reader, "5", "slots.list", json!({}));
    assert_eq!(slots["slots"].as_array().map(|a| a.len()), Some(1));
    assert_eq!(slots["slots"][0]["itemName"], json!("Item 1"));

    // Clearing a score turns the item back into a slot.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "items.update",
        json!({ "categoryId": 1, "itemIndex": 1, "score": null, "name": "Lab 2" }),
    );
    let slots = request_ok(&mut stdin, &mut reader, "7", "slots.list", json!({}));
    assert_eq!(slots["slots"].as_array().map(|a| a.len()), Some(2));
    assert_eq!(slots["slots"][1]["itemName"], json!("Lab 2"));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "items.delete",
        json!({ "categoryId": 1, "itemIndex": 0 }),
    );
    let listed = request_ok(&mut stdin, &mut reader, "9", "categories.list", json!({}));
    assert_eq!(listed["categories"][0]["items"].as_array().map(|a| a.len()), Some(1));

    let _ = request_ok(&mut stdin, &mut reader, "10", "categories.delete", json!({ "categoryId": 1 }));
    let plan = request_ok(&mut stdin, &mut reader, "11", "plan.get", json!({}));
    assert_eq!(plan["slots"], json!([]));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn invalid_edits_are_rejected_with_codes() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "categories.add",
        json!({ "name": "Exams", "weight": 60 }),
    );

    let resp = request(&mut stdin, &mut reader, "2", "categories.add", json!({ "name": "Big", "weight": 150 }));
    assert_eq!(error_code(&resp), "bad_params");
    assert_eq!(resp["error"]["message"], json!("category weight cannot exceed 100%"));

    let resp = request(&mut stdin, &mut reader, "3", "categories.update", json!({ "categoryId": 1, "name": "" }));
    assert_eq!(error_code(&resp), "bad_params");

    let long = "x".repeat(101);
    let resp = request(&mut stdin, &mut reader, "4", "items.add", json!({ "categoryId": 1, "name": long }));
    assert_eq!(error_code(&resp), "bad_params");

    let resp = request(&mut stdin, &mut reader, "4b", "items.add", json!({ "categoryId": 1, "name": "Item 1" }));
    assert_eq!(error_code(&resp), "bad_params");

    let resp = request(&mut stdin, &mut reader, "5", "items.update", json!({ "categoryId": 1, "itemIndex": 0, "score": -5 }));
    assert_eq!(error_code(&resp), "bad_params");

    let resp = request(&mut stdin, &mut reader, "6", "categories.delete", json!({ "categoryId": 42 }));
    assert_eq!(error_code(&resp), "not_found");
    assert_eq!(resp["error"]["details"], json!({ "categoryId": 42 }));

    let resp = request(&mut stdin, &mut reader, "7", "items.delete", json!({ "categoryId": 1, "itemIndex": 3 }));
    assert_eq!(error_code(&resp), "not_found");

    let resp = request(&mut stdin, &mut reader, "8", "categories.update", json!({ "name": "x" }));
    assert_eq!(error_code(&resp), "bad_params");

    let resp = request(&mut stdin, &mut reader, "9", "categories.set", json!({ "categories": "nope" }));
    assert_eq!(error_code(&resp), "bad_params");

    let resp = request(&mut stdin, &mut reader, "10", "target.set", json!({ "target": "E" }));
    assert_eq!(error_code(&resp), "bad_params");

    let resp = request(&mut stdin, &mut reader, "11", "strategy.set", json!({ "strategy": "custom" }));
    assert_eq!(error_code(&resp), "bad_params");

    // Nothing above changed the one valid category.
    let v = request_ok(&mut stdin, &mut reader, "12", "categories.validate", json!({}));
    assert_eq!(v["valid"], json!(false));
    assert_eq!(v["total"], json!(60.0));
    assert_eq!(v["error"], json!("Total weight is 60.0%, must equal 100%"));

    let _ = request_ok(&mut stdin, &mut reader, "13", "categories.add", json!({ "name": "Labs", "weight": 40 }));
    let v = request_ok(&mut stdin, &mut reader, "14", "categories.validate", json!({}));
    assert_eq!(v["valid"], json!(true));
    assert!(v.get("error").is_none());
    assert_eq!(v["categoryIssues"], json!([]));

    let reset = request_ok(&mut stdin, &mut reader, "15", "planner.reset", json!({}));
    assert_eq!(reset["categories"], json!([]));
    assert_eq!(reset["target"], json!("A"));

    drop(stdin);
    let _ = child.wait();
}
