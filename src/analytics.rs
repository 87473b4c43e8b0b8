use crate::listview::{parse_timestamp, RecordFields};
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    All,
    Day,
    Week,
    Month,
    Year,
}

impl Period {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Some(Period::All),
            "day" => Some(Period::Day),
            "week" => Some(Period::Week),
            "month" => Some(Period::Month),
            "year" => Some(Period::Year),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Period::All => "all",
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }

    fn window(self) -> Option<Duration> {
        match self {
            Period::All => None,
            Period::Day => Some(Duration::days(1)),
            Period::Week => Some(Duration::days(7)),
            Period::Month => Some(Duration::days(30)),
            Period::Year => Some(Duration::days(365)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassroomCounts {
    pub total: usize,
    pub approved: usize,
    pub pending: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentCounts {
    pub total: usize,
    pub class_representatives: usize,
    pub by_role: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackCounts {
    pub period: &'static str,
    pub total_reviews: usize,
}

// Anything that is neither approved nor rejected shows as pending.
pub fn classroom_counts(classrooms: &[Value]) -> ClassroomCounts {
    let mut out = ClassroomCounts::default();
    for c in classrooms {
        out.total += 1;
        match c.text("class_status").map(|s| s.trim().to_ascii_uppercase()) {
            Some(s) if s == "APPROVED" => out.approved += 1,
            Some(s) if s == "REJECTED" => out.rejected += 1,
            _ => out.pending += 1,
        }
    }
    out
}

pub fn student_counts(students: &[Value]) -> StudentCounts {
    let mut out = StudentCounts::default();
    for s in students {
        out.total += 1;
        if s.flag("is_class_representative") == Some(true) {
            out.class_representatives += 1;
        }
        let role = s
            .text("role")
            .map(|r| r.trim().to_ascii_lowercase())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "unknown".to_string());
        *out.by_role.entry(role).or_insert(0) += 1;
    }
    out
}

/// Reviews created in the trailing window `(now - period, now]`. Undated
/// reviews only count toward `Period::All`.
pub fn feedback_counts(reviews: &[Value], period: Period, now: NaiveDateTime) -> FeedbackCounts {
    let total_reviews = match period.window() {
        None => reviews.len(),
        Some(window) => {
            let since = now - window;
            reviews
                .iter()
                .filter_map(|r| r.text("created_at").and_then(|t| parse_timestamp(&t)))
                .filter(|at| *at > since && *at <= now)
                .count()
        }
    };
    FeedbackCounts {
        period: period.as_str(),
        total_reviews,
    }
}
