use crate::model::SubjectHistory;
use serde::Serialize;
use std::collections::BTreeMap;

/// 1-decimal rounding used for every displayed percentage:
/// `floor(10*x + 0.5) / 10`
pub fn round_off_1_decimal(x: f64) -> f64 {
    ((10.0 * x) + 0.5).floor() / 10.0
}

/// `attended / total * 100` rounded to one decimal, `0.0` when no sessions
/// were recorded.
pub fn attendance_percentage(attended: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_off_1_decimal(100.0 * f64::from(attended) / f64::from(total))
}

/// Per-subject totals derived from the whole attendance history. Never
/// persisted; rebuilt on every history push.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    pub totals: BTreeMap<String, u32>,
    pub total_sessions: u32,
}

impl Aggregate {
    pub fn from_history(history: &SubjectHistory) -> Self {
        let mut totals: BTreeMap<String, u32> = BTreeMap::new();
        for day in history.values() {
            for student_id in day.keys() {
                *totals.entry(student_id.clone()).or_insert(0) += 1;
            }
        }
        Self {
            totals,
            total_sessions: u32::try_from(history.len()).unwrap_or(u32::MAX),
        }
    }

    pub fn attended(&self, student_id: &str) -> u32 {
        self.totals.get(student_id).copied().unwrap_or(0)
    }

    pub fn percentage(&self, student_id: &str) -> f64 {
        attendance_percentage(self.attended(student_id), self.total_sessions)
    }
}
