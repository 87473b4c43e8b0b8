use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::store::id_key;
use crate::views::ViewKind;
use std::num::NonZeroUsize;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn required_id(req: &Request) -> Result<String, serde_json::Value> {
    req.params
        .get("id")
        .and_then(id_key)
        .ok_or_else(|| err(&req.id, "bad_params", "missing id", None))
}

pub fn required_view(req: &Request) -> Result<ViewKind, serde_json::Value> {
    let raw = required_str(req, "view")?;
    ViewKind::parse(&raw).ok_or_else(|| {
        let names: Vec<&str> = ViewKind::ALL.iter().map(|v| v.as_str()).collect();
        err(
            &req.id,
            "bad_params",
            format!("view must be one of: {}", names.join(", ")),
            None,
        )
    })
}

/// `pageSize` from params, else `fallback`, else the configured default.
/// Non-positive sizes are passed through so the pipeline rejects them as
/// configuration errors.
pub fn page_size(
    state: &AppState,
    req: &Request,
    fallback: Option<NonZeroUsize>,
) -> Result<i64, serde_json::Value> {
    let size = match req.params.get("pageSize").filter(|v| !v.is_null()) {
        None => {
            let size = fallback.unwrap_or(state.config.default_page_size);
            i64::try_from(size.get()).unwrap_or(i64::MAX)
        }
        Some(value) => value.as_i64().ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                "pageSize must be an integer",
                None,
            )
        })?,
    };
    let max = state.config.max_page_size.get();
    if usize::try_from(size).map(|s| s > max).unwrap_or(false) {
        return Err(err(
            &req.id,
            "bad_params",
            format!("pageSize must be in range 1..={}", max),
            None,
        ));
    }
    Ok(size)
}
