//! Records pushed by the store, decoded tolerantly.
//!
//! Absent paths decode to empty collections and malformed fields decode to
//! `None`; nothing here fails.

use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActiveSession {
    pub subject: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceEntry {
    pub time: Option<String>,
}

/// studentId -> entry for one subject on one date.
pub type DaySnapshot = BTreeMap<String, AttendanceEntry>;

/// date -> day snapshot for one subject.
pub type SubjectHistory = BTreeMap<String, DaySnapshot>;

/// Backend key order: integer-like keys first, numerically; then the rest
/// lexicographically.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Children of a keyed node in backend key order. Arrays are treated as
/// index-keyed objects; null children are skipped.
fn keyed_entries(value: Option<&Value>) -> Vec<(String, &Value)> {
    let mut out: Vec<(String, &Value)> = match value {
        Some(Value::Object(map)) => map
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), v))
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    };
    out.sort_by(|a, b| compare_keys(&a.0, &b.0));
    out
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn decode_roster(value: Option<&Value>) -> Vec<RosterEntry> {
    keyed_entries(value)
        .into_iter()
        .map(|(id, student)| RosterEntry {
            id,
            name: non_empty_str(student.get("name")),
        })
        .collect()
}

/// Accepts both `["Math", "Art"]` and `{ "a": "Math", "b": "Art" }`.
/// Repeated names are kept as listed.
pub fn decode_subjects(value: Option<&Value>) -> Vec<String> {
    keyed_entries(value)
        .into_iter()
        .filter_map(|(_, v)| non_empty_str(Some(v)))
        .collect()
}

pub fn decode_active_session(value: Option<&Value>) -> Option<ActiveSession> {
    let value = value?;
    let session = ActiveSession {
        subject: non_empty_str(value.get("subject")),
        date: non_empty_str(value.get("date")),
    };
    if session.subject.is_none() && session.date.is_none() {
        return None;
    }
    Some(session)
}

fn decode_entry(value: &Value) -> AttendanceEntry {
    let time = match value.get("time") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    AttendanceEntry { time }
}

pub fn decode_day(value: Option<&Value>) -> DaySnapshot {
    keyed_entries(value)
        .into_iter()
        .map(|(student_id, entry)| (student_id, decode_entry(entry)))
        .collect()
}

/// Every date key counts as a recorded session, even when its payload is not
/// a student map.
pub fn decode_history(value: Option<&Value>) -> SubjectHistory {
    keyed_entries(value)
        .into_iter()
        .map(|(date, day)| {
            let snapshot = if day.is_object() || day.is_array() {
                decode_day(Some(day))
            } else {
                DaySnapshot::new()
            };
            (date, snapshot)
        })
        .collect()
}
