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

fn student_names(listed: &serde_json::Value) -> Vec<String> {
    listed
        .get("students")
        .and_then(|v| v.as_array())
        .expect("students")
        .iter()
        .map(|s| {
            s.get("name")
                .and_then(|v| v.as_str())
                .expect("name")
                .to_string()
        })
        .collect()
}

#[test]
fn snapshot_bundle_round_trips_and_rejects_garbage() {
    let workspace_a = temp_dir("gradebook-bundle-src");
    let workspace_b = temp_dir("gradebook-bundle-dst");
    let bundle = workspace_a.join("roster.snapshot.zip");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace_a.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "roster.submitTerm",
        json!({
            "name": "Ada",
            "term": "Term 1",
            "subjects": [{ "subject": "Math", "score": 80 }]
        }),
    );

    let exported = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "backup.exportSnapshotBundle",
        json!({ "outPath": bundle.to_string_lossy() }),
    );
    assert_eq!(
        exported.get("bundleFormat").and_then(|v| v.as_str()),
        Some("gradebook-snapshot-v1")
    );
    assert_eq!(exported.get("entryCount").and_then(|v| v.as_u64()), Some(3));
    assert!(exported
        .get("dbSha256")
        .and_then(|v| v.as_str())
        .map(|s| s.len() == 64)
        .unwrap_or(false));

    // Import into a fresh workspace and read the roster back out of it.
    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "backup.importSnapshotBundle",
        json!({
            "inPath": bundle.to_string_lossy(),
            "workspacePath": workspace_b.to_string_lossy()
        }),
    );
    assert_eq!(
        imported.get("bundleFormatDetected").and_then(|v| v.as_str()),
        Some("gradebook-snapshot-v1")
    );
    assert_eq!(imported.get("studentCount").and_then(|v| v.as_u64()), Some(1));

    let listed = request_ok(&mut stdin, &mut reader, "5", "roster.list", json!({}));
    assert_eq!(student_names(&listed), ["Ada"]);

    // A non-bundle input is rejected and the open workspace stays usable.
    let garbage = workspace_b.join("garbage.zip");
    std::fs::write(&garbage, b"this is not a zip archive").expect("write garbage");
    let rejected = raw_request(
        &mut stdin,
        &mut reader,
        "6",
        "backup.importSnapshotBundle",
        json!({
            "inPath": garbage.to_string_lossy(),
            "workspacePath": workspace_b.to_string_lossy()
        }),
    );
    assert_eq!(
        rejected
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("io_failed")
    );
    let listed = request_ok(&mut stdin, &mut reader, "7", "roster.list", json!({}));
    assert_eq!(student_names(&listed), ["Ada"]);

    let missing = raw_request(
        &mut stdin,
        &mut reader,
        "8",
        "backup.importSnapshotBundle",
        json!({
            "inPath": workspace_b.join("nope.zip").to_string_lossy(),
            "workspacePath": workspace_b.to_string_lossy()
        }),
    );
    assert_eq!(
        missing
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("not_found")
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace_a);
    let _ = std::fs::remove_dir_all(workspace_b);
}
