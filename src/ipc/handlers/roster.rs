use crate::grading::{format_mark, TermScores};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store;
use serde_json::json;

fn handle_roster_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.db.is_none() {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    }

    let students: Vec<serde_json::Value> = state
        .roster
        .students()
        .iter()
        .enumerate()
        .map(|(index, s)| {
            let terms: Vec<&str> = s.terms.iter().map(|(t, _)| t.as_str()).collect();
            json!({
                "index": index,
                "studentId": s.id,
                "name": s.name,
                "terms": terms,
                "cumulativeGpa": format_mark(s.cumulative_gpa()),
                "promotion": s.promotion_status(),
                "updatedAt": s.updated_at,
            })
        })
        .collect();

    ok(&req.id, json!({ "students": students }))
}

fn handle_roster_submit_term(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(name) = req.params.get("name").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.name", None);
    };
    let Some(term) = req.params.get("term").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.term", None);
    };
    let Some(raw_subjects) = req.params.get("subjects").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing params.subjects array", None);
    };

    // Entry-form rule enforced at this boundary; the engine itself would
    // degrade an empty set to zero marks.
    if raw_subjects.is_empty() {
        return err(
            &req.id,
            "validation_failed",
            "at least one subject is required",
            None,
        );
    }

    let mut entries: Vec<(String, f64)> = Vec::with_capacity(raw_subjects.len());
    for raw in raw_subjects {
        let subject = raw.get("subject").and_then(|v| v.as_str());
        let score = raw.get("score").and_then(|v| v.as_f64());
        let (Some(subject), Some(score)) = (subject, score) else {
            return err(
                &req.id,
                "validation_failed",
                "all subjects and scores are required",
                None,
            );
        };
        entries.push((subject.to_string(), score));
    }

    let scores = match TermScores::from_entries(entries) {
        Ok(v) => v,
        Err(e) => return err(&req.id, &e.code, e.message, e.details),
    };

    let outcome = match state.roster.submit_term(&state.scale, name, term, scores) {
        Ok(v) => v,
        Err(e) => return err(&req.id, &e.code, e.message, e.details),
    };

    if let Err(e) = store::save_roster(conn, &state.roster) {
        return err(&req.id, "db_query_failed", format!("{e:?}"), None);
    }

    ok(
        &req.id,
        json!({
            "studentId": outcome.student_id,
            "index": outcome.index,
            "created": outcome.created,
            "record": outcome.record
        }),
    )
}

fn handle_roster_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(index) = req.params.get("index").and_then(|v| v.as_u64()) else {
        return err(&req.id, "bad_params", "missing params.index", None);
    };
    // Deletion is irreversible; the caller must state the confirmation
    // explicitly, the dialog itself is the shell's concern.
    if req.params.get("confirm").and_then(|v| v.as_bool()) != Some(true) {
        return err(
            &req.id,
            "bad_params",
            "deletion requires confirm: true",
            None,
        );
    }

    let removed = match state.roster.delete_at(index as usize) {
        Ok(v) => v,
        Err(e) => return err(&req.id, &e.code, e.message, e.details),
    };

    if let Err(e) = store::save_roster(conn, &state.roster) {
        return err(&req.id, "db_query_failed", format!("{e:?}"), None);
    }

    ok(
        &req.id,
        json!({
            "deletedName": removed.name,
            "remaining": state.roster.len()
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.list" => Some(handle_roster_list(state, req)),
        "roster.submitTerm" => Some(handle_roster_submit_term(state, req)),
        "roster.delete" => Some(handle_roster_delete(state, req)),
        _ => None,
    }
}
