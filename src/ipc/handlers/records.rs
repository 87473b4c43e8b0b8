use crate::ipc::error::{err, ok, store_err};
use crate::ipc::helpers::{required_id, required_str};
use crate::ipc::types::{AppState, Request};
use crate::store::ReviewAction;
use serde_json::json;
use tracing::info;

fn required_action(req: &Request) -> Result<ReviewAction, serde_json::Value> {
    let raw = required_str(req, "action")?;
    ReviewAction::parse(&raw).ok_or_else(|| {
        err(
            &req.id,
            "bad_params",
            "action must be one of: approve, reject",
            None,
        )
    })
}

fn handle_records_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let collection = match required_str(req, "collection") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(records) = req.params.get("records").and_then(|v| v.as_array()).cloned() else {
        return err(&req.id, "bad_params", "records must be an array", None);
    };

    match state.store.load(&collection, records) {
        Ok(summary) => {
            info!(
                collection = %collection,
                count = summary.count,
                duplicates = summary.duplicates_dropped,
                "collection loaded"
            );
            ok(
                &req.id,
                json!({
                    "collection": collection.trim(),
                    "count": summary.count,
                    "duplicatesDropped": summary.duplicates_dropped,
                }),
            )
        }
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_records_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let collection = match required_str(req, "collection") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let id = match required_id(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match state.store.get(&collection, &id) {
        Some(record) => ok(&req.id, json!({ "record": record })),
        None => err(
            &req.id,
            "not_found",
            format!("{collection} record {id} not found"),
            None,
        ),
    }
}

fn handle_records_patch(state: &mut AppState, req: &Request) -> serde_json::Value {
    let collection = match required_str(req, "collection") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let id = match required_id(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(fields) = req.params.get("fields").and_then(|v| v.as_object()).cloned() else {
        return err(&req.id, "bad_params", "fields must be an object", None);
    };
    match state.store.patch(&collection, &id, fields) {
        Ok(record) => ok(&req.id, json!({ "record": record })),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_records_remove(state: &mut AppState, req: &Request) -> serde_json::Value {
    let collection = match required_str(req, "collection") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let id = match required_id(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match state.store.remove(&collection, &id) {
        Ok(record) => ok(&req.id, json!({ "removed": record })),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_classrooms_review(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match required_id(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let action = match required_action(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match state.store.review_classroom(&id, action) {
        Ok(record) => ok(&req.id, json!({ "record": record })),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_students_review(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match required_id(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let action = match required_action(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match state.store.review_student(&id, action) {
        Ok(record) => ok(&req.id, json!({ "record": record })),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_students_set_role(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match required_id(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let role = match required_str(req, "role") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match state.store.set_student_role(&id, &role) {
        Ok(record) => ok(&req.id, json!({ "record": record })),
        Err(e) => store_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "records.load" => Some(handle_records_load(state, req)),
        "records.get" => Some(handle_records_get(state, req)),
        "records.patch" => Some(handle_records_patch(state, req)),
        "records.remove" => Some(handle_records_remove(state, req)),
        "classrooms.review" => Some(handle_classrooms_review(state, req)),
        "students.review" => Some(handle_students_review(state, req)),
        "students.setRole" => Some(handle_students_set_role(state, req)),
        _ => None,
    }
}
