mod test_support;

use serde_json::json;
use test_support::{request, request_ok, row_ids, spawn_sidecar, spawn_sidecar_in, temp_dir};

#[test]
fn view_criteria_survive_a_restart() {
    let workspace = temp_dir("feedbackd-workspace");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(selected["restoredViews"], json!(0));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "view.fromQueryString",
        json!({
            "view": "reviews",
            "query": "search=smith&year=2024&sortBy=teacher&sortDir=asc",
            "pageSize": 5
        }),
    );
    drop(stdin);
    let _ = child.wait();

    let (_child, mut stdin, mut reader) = spawn_sidecar_in(&workspace);
    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["workspacePath"], json!(workspace.to_string_lossy()));

    let state = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "view.state",
        json!({ "view": "reviews" }),
    );
    assert_eq!(state["criteria"]["search"], json!("smith"));
    assert_eq!(state["criteria"]["filters"], json!({ "year": "2024" }));
    assert_eq!(state["criteria"]["sortBy"], json!("teacher"));
    assert_eq!(state["criteria"]["sortDir"], json!("asc"));
    assert_eq!(state["pageSize"], json!(5));

    let untouched = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "view.state",
        json!({ "view": "students" }),
    );
    assert_eq!(untouched["criteria"]["search"], json!(""));
}

#[test]
fn feedback_counts_use_the_trailing_window() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "records.load",
        json!({
            "collection": "reviews",
            "records": [
                { "id": 1, "teacher_fullname": "A", "created_at": "2025-06-15T09:00:00Z" },
                { "id": 2, "teacher_fullname": "B", "created_at": "2025-06-11T09:00:00Z" },
                { "id": 3, "teacher_fullname": "C", "created_at": "2025-03-01T09:00:00Z" },
                { "id": 4, "teacher_fullname": "D" }
            ]
        }),
    );

    let now = "2025-06-15T12:00:00Z";
    let expected = [("all", 4), ("day", 1), ("week", 2), ("month", 2), ("year", 3)];
    for (i, (period, count)) in expected.into_iter().enumerate() {
        let summary = request_ok(
            &mut stdin,
            &mut reader,
            &format!("p{i}"),
            "analytics.summary",
            json!({ "period": period, "now": now }),
        );
        assert_eq!(summary["feedback"]["period"], json!(period));
        assert_eq!(summary["feedback"]["totalReviews"], json!(count), "{period}");
    }

    let bad_now = request(
        &mut stdin,
        &mut reader,
        "bad",
        "analytics.summary",
        json!({ "now": "yesterday" }),
    );
    assert_eq!(bad_now["error"]["code"], json!("bad_params"));

    // Reviews default to newest first.
    let newest = request_ok(
        &mut stdin,
        &mut reader,
        "view",
        "view.query",
        json!({ "view": "reviews" }),
    );
    assert_eq!(row_ids(&newest), vec![1, 2, 3, 4]);
}
