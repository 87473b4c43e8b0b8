//! Search, filter, sort and paginate a record collection for one list view.
//!
//! Everything here is pure: the input slice is only borrowed and the
//! returned page holds references into it. Criteria state (including the
//! current page) belongs to the caller; see `criteria.rs` for the policy that
//! keeps the page in range.

use crate::criteria::{Criteria, SortDir};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::num::NonZeroUsize;

/// Read access to a record's fields by dotted path (`user.name`).
pub trait RecordFields {
    /// String form of a scalar field. `None` for missing, null or composite values.
    fn text(&self, path: &str) -> Option<Cow<'_, str>>;

    fn flag(&self, path: &str) -> Option<bool>;

    /// Finite numbers only; `NaN` and infinities read as missing.
    fn number(&self, path: &str) -> Option<f64> {
        self.text(path)
            .and_then(|t| t.trim().parse::<f64>().ok())
            .filter(|n| n.is_finite())
    }
}

pub fn lookup<'a>(value: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    path.split('.').try_fold(value, |cur, key| cur.get(key))
}

impl RecordFields for serde_json::Value {
    fn text(&self, path: &str) -> Option<Cow<'_, str>> {
        match lookup(self, path)? {
            serde_json::Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            serde_json::Value::Number(n) => Some(Cow::Owned(n.to_string())),
            serde_json::Value::Bool(b) => Some(Cow::Owned(b.to_string())),
            _ => None,
        }
    }

    fn flag(&self, path: &str) -> Option<bool> {
        match lookup(self, path)? {
            serde_json::Value::Bool(b) => Some(*b),
            serde_json::Value::String(s) => parse_flag(s),
            _ => None,
        }
    }

    fn number(&self, path: &str) -> Option<f64> {
        let n = match lookup(self, path)? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        n.filter(|n| n.is_finite())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Case-insensitive equality.
    Exact,
    /// Case-insensitive substring.
    Contains,
    /// Boolean field selected with yes/no.
    Flag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKind {
    Text,
    Number,
    Timestamp,
}

#[derive(Debug, Clone)]
pub struct FilterField {
    pub name: &'static str,
    pub path: &'static str,
    pub mode: MatchMode,
}

#[derive(Debug, Clone)]
pub struct SortKey {
    pub name: &'static str,
    pub path: &'static str,
    pub kind: SortKind,
}

/// Static description of one list view: which fields are searched, which
/// filters and sort keys exist, and the sort applied when criteria name none.
#[derive(Debug, Clone)]
pub struct ViewSpec {
    pub name: &'static str,
    pub search_fields: Vec<&'static str>,
    pub filters: Vec<FilterField>,
    pub sort_keys: Vec<SortKey>,
    pub default_sort: Option<(&'static str, SortDir)>,
}

impl ViewSpec {
    pub fn filter(&self, name: &str) -> Option<&FilterField> {
        self.filters.iter().find(|f| f.name == name)
    }

    pub fn sort_key(&self, name: &str) -> Option<&SortKey> {
        self.sort_keys.iter().find(|k| k.name == name)
    }
}

/// Caller misconfiguration. Every variant surfaces as `invalid_configuration`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListViewError {
    PageSize(i64),
    PageZero,
    UnknownFilter(String),
    UnknownSortKey(String),
    FlagValue { filter: String, value: String },
}

impl ListViewError {
    pub fn code(&self) -> &'static str {
        "invalid_configuration"
    }
}

impl fmt::Display for ListViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListViewError::PageSize(size) => {
                write!(f, "pageSize must be greater than zero (got {size})")
            }
            ListViewError::PageZero => write!(f, "page is 1-indexed; 0 is not a page"),
            ListViewError::UnknownFilter(name) => write!(f, "unknown filter: {name}"),
            ListViewError::UnknownSortKey(name) => write!(f, "unknown sort key: {name}"),
            ListViewError::FlagValue { filter, value } => {
                write!(f, "filter {filter} expects yes or no (got {value:?})")
            }
        }
    }
}

impl std::error::Error for ListViewError {}

/// One rendered page. `visible` borrows from the records passed to [`run`].
#[derive(Debug)]
pub struct PageView<'a, R> {
    pub visible: Vec<&'a R>,
    pub page: usize,
    pub page_size: NonZeroUsize,
    pub total_pages: usize,
    pub filtered_count: usize,
}

pub fn checked_page_size(page_size: i64) -> Result<NonZeroUsize, ListViewError> {
    usize::try_from(page_size)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or(ListViewError::PageSize(page_size))
}

pub fn total_pages(count: usize, page_size: NonZeroUsize) -> usize {
    count.div_ceil(page_size.get()).max(1)
}

pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

enum Needle {
    Text(String),
    Flag(bool),
}

struct ActiveFilter<'s> {
    field: &'s FilterField,
    needle: Needle,
}

impl ActiveFilter<'_> {
    fn matches<R: RecordFields>(&self, record: &R) -> bool {
        match (&self.needle, self.field.mode) {
            (Needle::Flag(want), _) => record.flag(self.field.path) == Some(*want),
            (Needle::Text(want), MatchMode::Contains) => record
                .text(self.field.path)
                .map(|v| v.to_lowercase().contains(want.as_str()))
                .unwrap_or(false),
            (Needle::Text(want), _) => record
                .text(self.field.path)
                .map(|v| v.to_lowercase() == *want)
                .unwrap_or(false),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    let t = raw.trim();
    if t.eq_ignore_ascii_case("yes") || t.eq_ignore_ascii_case("true") {
        Some(true)
    } else if t.eq_ignore_ascii_case("no") || t.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn active_filters<'s>(
    spec: &'s ViewSpec,
    criteria: &Criteria,
) -> Result<Vec<ActiveFilter<'s>>, ListViewError> {
    let mut out = Vec::new();
    for (name, value) in &criteria.filters {
        let Some(field) = spec.filter(name) else {
            return Err(ListViewError::UnknownFilter(name.clone()));
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        let needle = match field.mode {
            MatchMode::Flag => match parse_flag(value) {
                Some(b) => Needle::Flag(b),
                None => {
                    return Err(ListViewError::FlagValue {
                        filter: name.clone(),
                        value: value.to_string(),
                    })
                }
            },
            MatchMode::Exact | MatchMode::Contains => Needle::Text(value.to_lowercase()),
        };
        out.push(ActiveFilter { field, needle });
    }
    Ok(out)
}

fn resolve_sort<'s>(
    spec: &'s ViewSpec,
    criteria: &Criteria,
) -> Result<Option<(&'s SortKey, SortDir)>, ListViewError> {
    let requested = match criteria.sort_by.as_deref() {
        Some(name) if !name.trim().is_empty() => Some((name, SortDir::Asc)),
        _ => spec.default_sort,
    };
    let Some((name, default_dir)) = requested else {
        return Ok(None);
    };
    let key = spec
        .sort_key(name)
        .ok_or_else(|| ListViewError::UnknownSortKey(name.to_string()))?;
    Ok(Some((key, criteria.sort_dir.unwrap_or(default_dir))))
}

fn matches_search<R: RecordFields>(record: &R, fields: &[&str], needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    fields.iter().any(|path| {
        record
            .text(path)
            .map(|v| v.to_lowercase().contains(needle))
            .unwrap_or(false)
    })
}

/// Parses the timestamp shapes the backend emits: RFC 3339, a space-separated
/// `YYYY-MM-DD HH:MM:SS`, or a bare date. Offsets are normalized to UTC.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let t = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(t, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(t, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// Missing values trail present ones regardless of direction.
fn order_present<T>(
    a: Option<T>,
    b: Option<T>,
    dir: SortDir,
    cmp: impl Fn(&T, &T) -> Ordering,
) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => dir.apply(cmp(&x, &y)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn compare_records<R: RecordFields>(a: &R, b: &R, key: &SortKey, dir: SortDir) -> Ordering {
    match key.kind {
        SortKind::Text => order_present(a.text(key.path), b.text(key.path), dir, |x, y| {
            compare_text(x, y)
        }),
        SortKind::Number => order_present(a.number(key.path), b.number(key.path), dir, |x, y| {
            x.total_cmp(y)
        }),
        SortKind::Timestamp => order_present(
            a.text(key.path).and_then(|t| parse_timestamp(&t)),
            b.text(key.path).and_then(|t| parse_timestamp(&t)),
            dir,
            |x, y| x.cmp(y),
        ),
    }
}

fn page_slice<'a, R>(rows: &[&'a R], page: usize, page_size: NonZeroUsize) -> Vec<&'a R> {
    let size = page_size.get();
    let start = page.saturating_sub(1).saturating_mul(size);
    rows.iter().skip(start).take(size).copied().collect()
}

/// Runs the pipeline: filter, then sort the whole filtered set, then slice.
///
/// A page past the end yields an empty `visible`; clamping is the caller's job.
pub fn run<'a, R: RecordFields>(
    records: &'a [R],
    spec: &ViewSpec,
    criteria: &Criteria,
    page_size: i64,
) -> Result<PageView<'a, R>, ListViewError> {
    let page_size = checked_page_size(page_size)?;
    if criteria.page == 0 {
        return Err(ListViewError::PageZero);
    }
    let filters = active_filters(spec, criteria)?;
    let sort = resolve_sort(spec, criteria)?;
    let search = criteria.search.trim().to_lowercase();

    let mut rows: Vec<&'a R> = records
        .iter()
        .filter(|r| {
            matches_search(*r, &spec.search_fields, &search) && filters.iter().all(|f| f.matches(*r))
        })
        .collect();

    // sort_by is stable, so equal keys keep input order.
    if let Some((key, dir)) = sort {
        rows.sort_by(|a, b| compare_records(*a, *b, key, dir));
    }

    let filtered_count = rows.len();
    Ok(PageView {
        visible: page_slice(&rows, criteria.page, page_size),
        page: criteria.page,
        page_size,
        total_pages: total_pages(filtered_count, page_size),
        filtered_count,
    })
}

/// Distinct non-blank values of a field in first-seen order, for filter dropdowns.
pub fn distinct_values<R: RecordFields>(records: &[R], path: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for record in records {
        let Some(value) = record.text(path) else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() || !seen.insert(value.to_string()) {
            continue;
        }
        out.push(value.to_string());
    }
    out
}
