use crate::grading::{GradeBand, GradeScale};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store;
use serde_json::json;

fn handle_scale_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.db.is_none() {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    }
    ok(&req.id, json!({ "bands": state.scale.bands() }))
}

fn handle_scale_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(raw_bands) = req.params.get("bands").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing params.bands array", None);
    };

    let mut bands: Vec<GradeBand> = Vec::with_capacity(raw_bands.len());
    for (i, raw) in raw_bands.iter().enumerate() {
        let min = raw.get("min").and_then(|v| v.as_f64());
        let max = raw.get("max").and_then(|v| v.as_f64());
        let letter = raw.get("letter").and_then(|v| v.as_str());
        let (Some(min), Some(max), Some(letter)) = (min, max, letter) else {
            return err(
                &req.id,
                "validation_failed",
                "each band needs numeric min/max and a letter",
                Some(json!({ "band": i })),
            );
        };
        bands.push(GradeBand {
            min,
            max,
            letter: letter.to_string(),
        });
    }

    // All-or-nothing: nothing is replaced or persisted unless every band is
    // valid. Already-stored term records are never recomputed.
    let scale = match GradeScale::new(bands) {
        Ok(v) => v,
        Err(e) => return err(&req.id, &e.code, e.message, e.details),
    };

    if let Err(e) = store::save_scale(conn, &scale) {
        return err(&req.id, "db_query_failed", format!("{e:?}"), None);
    }
    state.scale = scale;

    ok(
        &req.id,
        json!({ "bandCount": state.scale.bands().len() }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "scale.get" => Some(handle_scale_get(state, req)),
        "scale.update" => Some(handle_scale_update(state, req)),
        _ => None,
    }
}
