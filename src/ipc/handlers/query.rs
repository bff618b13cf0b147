use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::query::{query_term, QueryOptions, SortKey, StatusFilter};
use serde_json::json;

fn handle_roster_query(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.db.is_none() {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    }

    let term = match req.params.get("term").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing params.term", None),
    };

    let search = match req.params.get("search") {
        None => None,
        Some(v) if v.is_null() => None,
        Some(v) => {
            let Some(s) = v.as_str() else {
                return err(&req.id, "bad_params", "search must be a string", None);
            };
            Some(s.to_string())
        }
    };

    let status = match req.params.get("status") {
        None => StatusFilter::All,
        Some(v) if v.is_null() => StatusFilter::All,
        Some(v) => {
            let parsed = v.as_str().and_then(StatusFilter::parse);
            let Some(parsed) = parsed else {
                return err(
                    &req.id,
                    "bad_params",
                    "status must be one of: all, pass, fail",
                    None,
                );
            };
            parsed
        }
    };

    // Unknown sort strings fall through to roster order on purpose.
    let sort = req
        .params
        .get("sort")
        .and_then(|v| v.as_str())
        .and_then(SortKey::parse);

    let result = query_term(
        &state.roster,
        &state.scale,
        &term,
        &QueryOptions {
            search,
            status,
            sort,
        },
    );

    ok(
        &req.id,
        json!({ "rows": result.rows, "empty": result.empty }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.query" => Some(handle_roster_query(state, req)),
        _ => None,
    }
}
