use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::views::ViewKind;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Opens the workspace db and restores remembered view criteria.
/// Returns how many views were restored.
pub fn open_workspace(state: &mut AppState, path: &Path) -> anyhow::Result<usize> {
    let conn = db::open_db(path)?;
    let mut restored = 0;
    for (view, criteria) in db::view_state_load_all(&conn)? {
        let Some(kind) = ViewKind::parse(&view) else {
            warn!(view = %view, "ignoring saved state for unknown view");
            continue;
        };
        match criteria {
            Ok(c) => {
                state.sessions.insert(kind, c);
                restored += 1;
            }
            Err(e) => warn!(view = %view, error = %e, "ignoring unreadable saved criteria"),
        }
    }
    state.workspace = Some(path.to_path_buf());
    state.db = Some(conn);
    info!(workspace = %path.display(), restored, "workspace opened");
    Ok(restored)
}

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "collections": state.store.sizes(),
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match open_workspace(state, &path) {
        Ok(restored) => ok(
            &req.id,
            json!({ "workspacePath": path.to_string_lossy(), "restoredViews": restored }),
        ),
        Err(e) => err(&req.id, "db_open_failed", format!("{e:#}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
