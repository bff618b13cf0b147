use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
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

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradebookd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradebookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn raw_request(
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
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = raw_request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn submit(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    name: &str,
    term: &str,
    score: f64,
) {
    let _ = request_ok(
        stdin,
        reader,
        id,
        "roster.submitTerm",
        json!({
            "name": name,
            "term": term,
            "subjects": [{ "subject": "Math", "score": score }]
        }),
    );
}

fn row_names(result: &serde_json::Value) -> Vec<String> {
    result
        .get("rows")
        .and_then(|v| v.as_array())
        .expect("rows")
        .iter()
        .map(|r| {
            r.get("name")
                .and_then(|v| v.as_str())
                .expect("name")
                .to_string()
        })
        .collect()
}

fn row_ranks(result: &serde_json::Value) -> Vec<u64> {
    result
        .get("rows")
        .and_then(|v| v.as_array())
        .expect("rows")
        .iter()
        .map(|r| r.get("rank").and_then(|v| v.as_u64()).expect("rank"))
        .collect()
}

#[test]
fn rank_is_gpa_desc_while_rows_follow_requested_sort() {
    let workspace = temp_dir("gradebook-query-rank");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    // Term GPAs: Zoe 5.00, Amy 2.00, Ben 3.00, Dan 0.00 (fails).
    submit(&mut stdin, &mut reader, "2", "Zoe", "Term 1", 90.0);
    submit(&mut stdin, &mut reader, "3", "Amy", "Term 1", 46.0);
    submit(&mut stdin, &mut reader, "4", "Ben", "Term 1", 55.0);
    submit(&mut stdin, &mut reader, "5", "Dan", "Term 1", 30.0);
    // Cara only has Term 2.
    submit(&mut stdin, &mut reader, "6", "Cara", "Term 2", 99.0);

    // No sort requested: roster order with GPA-desc rank labels.
    let unsorted = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "roster.query",
        json!({ "term": "Term 1" }),
    );
    assert_eq!(unsorted.get("empty").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(row_names(&unsorted), ["Zoe", "Amy", "Ben", "Dan"]);
    assert_eq!(row_ranks(&unsorted), [1, 3, 2, 4]);

    // Display sort changes row order only; the rank labels do not move.
    let by_name = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "roster.query",
        json!({ "term": "Term 1", "sort": "nameAsc" }),
    );
    assert_eq!(row_names(&by_name), ["Amy", "Ben", "Dan", "Zoe"]);
    assert_eq!(row_ranks(&by_name), [3, 2, 4, 1]);

    let by_avg = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "roster.query",
        json!({ "term": "Term 1", "sort": "avgDesc" }),
    );
    assert_eq!(row_names(&by_avg), ["Zoe", "Ben", "Amy", "Dan"]);

    // Search narrows before ranking, so ranks are relative to the match set.
    let searched = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "roster.query",
        json!({ "term": "Term 1", "search": "AM" }),
    );
    assert_eq!(row_names(&searched), ["Amy"]);
    assert_eq!(row_ranks(&searched), [1]);

    // Status filtering drops students without a record for the term.
    let passing = request_ok(
        &mut stdin,
        &mut reader,
        "11",
        "roster.query",
        json!({ "term": "Term 1", "status": "pass" }),
    );
    assert_eq!(row_names(&passing), ["Zoe", "Amy", "Ben"]);
    let failing = request_ok(
        &mut stdin,
        &mut reader,
        "12",
        "roster.query",
        json!({ "term": "Term 1", "status": "fail" }),
    );
    assert_eq!(row_names(&failing), ["Dan"]);
    assert_eq!(row_ranks(&failing), [1]);

    let bad_status = raw_request(
        &mut stdin,
        &mut reader,
        "13",
        "roster.query",
        json!({ "term": "Term 1", "status": "incomplete" }),
    );
    assert_eq!(
        bad_status
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("bad_params")
    );

    // A term with no surviving records is an explicit empty result.
    let empty = request_ok(
        &mut stdin,
        &mut reader,
        "14",
        "roster.query",
        json!({ "term": "Term 9" }),
    );
    assert_eq!(empty.get("empty").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(
        empty.get("rows").and_then(|v| v.as_array()).map(|r| r.len()),
        Some(0)
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
