use crate::criteria::{Criteria, SortDir};
use crate::db;
use crate::ipc::error::{err, listview_err, ok};
use crate::ipc::helpers::{page_size, required_str, required_view};
use crate::ipc::types::{AppState, Request};
use crate::listview::{self, MatchMode, PageView};
use crate::views::ViewKind;
use serde_json::json;
use tracing::{debug, warn};

fn page_json(
    view: ViewKind,
    criteria: &Criteria,
    page: &PageView<'_, serde_json::Value>,
    total_count: usize,
) -> serde_json::Value {
    json!({
        "view": view.as_str(),
        "criteria": criteria,
        "rows": page.visible,
        "page": page.page,
        "pageSize": page.page_size.get(),
        "totalPages": page.total_pages,
        "filteredCount": page.filtered_count,
        "totalCount": total_count,
    })
}

/// Applies `mutate` to a copy of the view's session criteria, runs the
/// pipeline, clamps the page into range and only then commits the copy.
/// Criteria the pipeline rejects never reach the session. The page size the
/// run used is remembered for later requests that omit `pageSize`.
fn update_session(
    state: &mut AppState,
    req: &Request,
    mutate: impl FnOnce(&mut Criteria),
) -> serde_json::Value {
    let view = match required_view(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let mut criteria = state.sessions.get(&view).cloned().unwrap_or_default();
    let size = match page_size(state, req, criteria.page_size) {
        Ok(v) => v,
        Err(e) => return e,
    };
    mutate(&mut criteria);

    let spec = view.spec();
    let records = state.store.records(view.collection());
    let mut page = match listview::run(records, &spec, &criteria, size) {
        Ok(p) => p,
        Err(e) => return listview_err(&req.id, &e),
    };
    if criteria.page > page.total_pages {
        criteria.clamp_to(page.total_pages);
        page = match listview::run(records, &spec, &criteria, size) {
            Ok(p) => p,
            Err(e) => return listview_err(&req.id, &e),
        };
    }
    criteria.page_size = Some(page.page_size);
    let result = page_json(view, &criteria, &page, records.len());

    if let Some(conn) = state.db.as_ref() {
        if let Err(e) = db::view_state_save(conn, view.as_str(), &criteria) {
            warn!(view = view.as_str(), error = %format!("{e:#}"), "failed to persist view criteria");
        }
    }
    debug!(view = view.as_str(), page = criteria.page, "view session updated");
    state.sessions.insert(view, criteria);
    ok(&req.id, result)
}

fn handle_view_query(state: &mut AppState, req: &Request) -> serde_json::Value {
    let view = match required_view(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let criteria = match req.params.get("criteria").filter(|v| !v.is_null()) {
        None => Criteria::default(),
        Some(raw) => match serde_json::from_value::<Criteria>(raw.clone()) {
            Ok(c) => c,
            Err(e) => {
                return err(
                    &req.id,
                    "bad_params",
                    format!("criteria is malformed: {e}"),
                    None,
                )
            }
        },
    };

    let size = match page_size(state, req, criteria.page_size) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let records = state.store.records(view.collection());
    match listview::run(records, &view.spec(), &criteria, size) {
        Ok(page) => ok(&req.id, page_json(view, &criteria, &page, records.len())),
        Err(e) => listview_err(&req.id, &e),
    }
}

fn handle_view_set_search(state: &mut AppState, req: &Request) -> serde_json::Value {
    let search = match required_str(req, "search") {
        Ok(v) => v,
        Err(e) => return e,
    };
    update_session(state, req, |c| c.set_search(search))
}

fn handle_view_set_filter(state: &mut AppState, req: &Request) -> serde_json::Value {
    let filter = match required_str(req, "filter") {
        Ok(v) => v,
        Err(e) => return e,
    };
    // null clears the filter just like an empty string
    let value = match req.params.get("value") {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Bool(b)) => (if *b { "yes" } else { "no" }).to_string(),
        Some(_) => {
            return err(
                &req.id,
                "bad_params",
                "value must be a string, boolean or null",
                None,
            )
        }
    };
    update_session(state, req, |c| c.set_filter(&filter, value))
}

fn handle_view_set_sort(state: &mut AppState, req: &Request) -> serde_json::Value {
    let sort_by = req
        .params
        .get("sortBy")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    let sort_dir = match req.params.get("sortDir").filter(|v| !v.is_null()) {
        None => None,
        Some(v) => match v.as_str().and_then(SortDir::parse) {
            Some(d) => Some(d),
            None => {
                return err(
                    &req.id,
                    "bad_params",
                    "sortDir must be one of: asc, desc",
                    None,
                )
            }
        },
    };
    update_session(state, req, |c| c.set_sort(sort_by, sort_dir))
}

fn handle_view_set_page(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(page) = req
        .params
        .get("page")
        .and_then(|v| v.as_u64())
        .filter(|p| *p >= 1)
    else {
        return err(
            &req.id,
            "bad_params",
            "page must be a positive integer",
            None,
        );
    };
    let page = usize::try_from(page).unwrap_or(usize::MAX);
    update_session(state, req, |c| c.set_page(page))
}

fn handle_view_state(state: &mut AppState, req: &Request) -> serde_json::Value {
    update_session(state, req, |_| {})
}

fn handle_view_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    update_session(state, req, |c| c.clear())
}

fn handle_view_from_query_string(state: &mut AppState, req: &Request) -> serde_json::Value {
    let view = match required_view(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let query = match required_str(req, "query") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let decoded = Criteria::from_query_string(&view.spec(), &query);
    update_session(state, req, |c| *c = decoded)
}

fn handle_view_to_query_string(state: &mut AppState, req: &Request) -> serde_json::Value {
    let view = match required_view(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let criteria = state.sessions.get(&view).cloned().unwrap_or_default();
    ok(
        &req.id,
        json!({
            "view": view.as_str(),
            "query": criteria.to_query_string(&view.spec()),
        }),
    )
}

fn handle_view_options(state: &mut AppState, req: &Request) -> serde_json::Value {
    let view = match required_view(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let name = match required_str(req, "filter") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let spec = view.spec();
    let Some(field) = spec.filter(&name) else {
        return err(
            &req.id,
            "bad_params",
            format!("view {} has no filter {}", view.as_str(), name),
            None,
        );
    };
    let options = match field.mode {
        MatchMode::Flag => vec!["yes".to_string(), "no".to_string()],
        MatchMode::Exact | MatchMode::Contains => {
            listview::distinct_values(state.store.records(view.collection()), field.path)
        }
    };
    ok(
        &req.id,
        json!({ "view": view.as_str(), "filter": name, "options": options }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "view.query" => Some(handle_view_query(state, req)),
        "view.state" => Some(handle_view_state(state, req)),
        "view.setSearch" => Some(handle_view_set_search(state, req)),
        "view.setFilter" => Some(handle_view_set_filter(state, req)),
        "view.setSort" => Some(handle_view_set_sort(state, req)),
        "view.setPage" => Some(handle_view_set_page(state, req)),
        "view.clear" => Some(handle_view_clear(state, req)),
        "view.options" => Some(handle_view_options(state, req)),
        "view.toQueryString" => Some(handle_view_to_query_string(state, req)),
        "view.fromQueryString" => Some(handle_view_from_query_string(state, req)),
        _ => None,
    }
}
