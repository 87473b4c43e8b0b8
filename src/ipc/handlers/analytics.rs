use crate::analytics::{self, Period};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::views::ViewKind;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::json;

fn parse_now(req: &Request) -> Result<NaiveDateTime, serde_json::Value> {
    match req.params.get("now").and_then(|v| v.as_str()) {
        None => Ok(Utc::now().naive_utc()),
        Some(raw) => DateTime::parse_from_rfc3339(raw.trim())
            .map(|dt| dt.naive_utc())
            .map_err(|e| err(&req.id, "bad_params", format!("now must be RFC 3339: {e}"), None)),
    }
}

fn handle_analytics_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let raw_period = req
        .params
        .get("period")
        .and_then(|v| v.as_str())
        .unwrap_or("all");
    let Some(period) = Period::parse(raw_period) else {
        return err(
            &req.id,
            "bad_params",
            "period must be one of: all, day, week, month, year",
            None,
        );
    };
    let now = match parse_now(req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let store = &state.store;
    ok(
        &req.id,
        json!({
            "classrooms": analytics::classroom_counts(store.records(ViewKind::Classrooms.collection())),
            "students": analytics::student_counts(store.records(ViewKind::Students.collection())),
            "feedback": analytics::feedback_counts(
                store.records(ViewKind::Reviews.collection()),
                period,
                now,
            ),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "analytics.summary" => Some(handle_analytics_summary(state, req)),
        _ => None,
    }
}
