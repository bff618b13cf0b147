use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::report::build_report;
use serde_json::json;

fn handle_student_report(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.db.is_none() {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    }

    let Some(name) = req.params.get("name").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.name", None);
    };

    let Some(student) = state.roster.find_by_name(name.trim()) else {
        return err(
            &req.id,
            "not_found",
            format!("student not found: {}", name.trim()),
            None,
        );
    };

    let report = build_report(&state.scale, student);
    ok(&req.id, json!({ "report": report }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.studentModel" => Some(handle_student_report(state, req)),
        _ => None,
    }
}
