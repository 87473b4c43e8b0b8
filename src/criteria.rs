//! Caller-owned list criteria and the rules for mutating them.
//!
//! Search, filter and sort changes send the view back to page 1. A page change
//! touches nothing else. Criteria round-trip through a URL query string so a
//! view can be restored from a link.

use crate::listview::{clamp_page, ViewSpec};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn parse(raw: &str) -> Option<Self> {
        let t = raw.trim();
        if t.eq_ignore_ascii_case("asc") {
            Some(SortDir::Asc)
        } else if t.eq_ignore_ascii_case("desc") {
            Some(SortDir::Desc)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }

    pub fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        }
    }
}

fn first_page() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criteria {
    #[serde(default)]
    pub search: String,
    /// Filter name -> selected value. Blank values are unset.
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_dir: Option<SortDir>,
    #[serde(default = "first_page")]
    pub page: usize,
    /// Page size the session was last run with. Requests that omit
    /// `pageSize` reuse it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<NonZeroUsize>,
}

impl Default for Criteria {
    fn default() -> Self {
        Self {
            search: String::new(),
            filters: BTreeMap::new(),
            sort_by: None,
            sort_dir: None,
            page: 1,
            page_size: None,
        }
    }
}

impl Criteria {
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.page = 1;
    }

    pub fn set_filter(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if value.trim().is_empty() {
            self.filters.remove(name);
        } else {
            self.filters.insert(name.to_string(), value);
        }
        self.page = 1;
    }

    pub fn set_sort(&mut self, sort_by: Option<String>, sort_dir: Option<SortDir>) {
        self.sort_by = sort_by.filter(|s| !s.trim().is_empty());
        self.sort_dir = sort_dir;
        self.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn clamp_to(&mut self, total_pages: usize) {
        self.page = clamp_page(self.page, total_pages);
    }

    pub fn clear(&mut self) {
        *self = Criteria::default();
    }

    /// Encodes the non-default parts of the criteria. Filters follow the
    /// view's declaration order and `page` is omitted on page 1.
    pub fn to_query_string(&self, spec: &ViewSpec) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::new();
        if !self.search.is_empty() {
            pairs.push(("search", self.search.clone()));
        }
        for field in &spec.filters {
            if let Some(value) = self.filters.get(field.name) {
                if !value.trim().is_empty() {
                    pairs.push((field.name, value.clone()));
                }
            }
        }
        if let Some(sort_by) = self.sort_by.as_ref() {
            pairs.push(("sortBy", sort_by.clone()));
        }
        if let Some(dir) = self.sort_dir {
            pairs.push(("sortDir", dir.as_str().to_string()));
        }
        if self.page != 1 {
            pairs.push(("page", self.page.to_string()));
        }
        pairs
            .iter()
            .map(|(k, v)| format!("{}={}", url_encode(k), url_encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Lenient decode: unknown keys, filters the view does not define and
    /// unknown sort keys are dropped. A bad or zero `page` becomes 1.
    pub fn from_query_string(spec: &ViewSpec, query: &str) -> Criteria {
        let mut criteria = Criteria::default();
        let query = query.trim().trim_start_matches('?');
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = url_decode(raw_key);
            let value = url_decode(raw_value);
            match key.as_str() {
                "search" => criteria.search = value,
                "sortBy" => {
                    if spec.sort_key(&value).is_some() {
                        criteria.sort_by = Some(value);
                    }
                }
                "sortDir" => criteria.sort_dir = SortDir::parse(&value),
                "page" => criteria.page = value.trim().parse::<usize>().unwrap_or(1).max(1),
                other => {
                    if spec.filter(other).is_some() && !value.trim().is_empty() {
                        criteria.filters.insert(other.to_string(), value);
                    }
                }
            }
        }
        criteria
    }
}

fn url_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(b))
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// `+` is a space; `%XX` is a byte. Malformed escapes are kept verbatim.
fn url_decode(s: &str) -> String {
    let raw = s.as_bytes();
    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        match raw[i] {
            b'+' => {
                bytes.push(b' ');
                i += 1;
            }
            b'%' => {
                let decoded = raw
                    .get(i + 1..i + 3)
                    .and_then(|hex| std::str::from_utf8(hex).ok())
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok());
                match decoded {
                    Some(b) => {
                        bytes.push(b);
                        i += 3;
                    }
                    None => {
                        bytes.push(b'%');
                        i += 1;
                    }
                }
            }
            b => {
                bytes.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}
