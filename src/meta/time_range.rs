//! Insight date-range shortcuts.
//!
//! Shortcuts resolve against the current UTC date at call time. `maximum` and
//! anything unrecognized resolve to no explicit range, leaving the Graph API
//! to apply its own default window.

use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;

/// Inclusive date span sent to the insights endpoint as `time_range`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DateSpan {
    #[serde(serialize_with = "ymd")]
    pub since: NaiveDate,
    #[serde(serialize_with = "ymd")]
    pub until: NaiveDate,
}

fn ymd<S: serde::Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&date.format("%Y-%m-%d"))
}

/// Shortcut names accepted by [`resolve_time_range`].
pub const SHORTCUTS: &[&str] = &[
    "today",
    "yesterday",
    "last_7d",
    "last_14d",
    "last_30d",
    "this_month",
    "last_month",
    "maximum",
];

/// Resolve a shortcut against today's UTC date.
pub fn resolve_time_range(range: &str) -> Option<DateSpan> {
    resolve_time_range_on(range, Utc::now().date_naive())
}

/// Resolve a shortcut against an explicit `today`.
pub fn resolve_time_range_on(range: &str, today: NaiveDate) -> Option<DateSpan> {
    let span = |since: NaiveDate, until: NaiveDate| Some(DateSpan { since, until });

    match range {
        "today" => span(today, today),
        "yesterday" => {
            let yesterday = today - Duration::days(1);
            span(yesterday, yesterday)
        }
        "last_7d" => span(today - Duration::days(7), today),
        "last_14d" => span(today - Duration::days(14), today),
        "last_30d" => span(today - Duration::days(30), today),
        "this_month" => span(first_of_month(today), today),
        "last_month" => {
            let last_day = first_of_month(today) - Duration::days(1);
            span(first_of_month(last_day), last_day)
        }
        // "maximum" and unknown shortcuts: let the API pick the window
        _ => None,
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}
