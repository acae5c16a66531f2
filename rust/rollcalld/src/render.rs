//! Display rows for the attendance table.
//!
//! Everything here is a pure function of its inputs: the same roster, day
//! snapshot and aggregate always produce the same rows.

use crate::aggregate::Aggregate;
use crate::model::{DaySnapshot, RosterEntry};
use serde::Serialize;

pub const PLACEHOLDER: &str = "-";
pub const NO_STUDENTS: &str = "No students found.";
pub const NO_SUBJECTS: &str = "No subjects available";
pub const DEFAULT_TEACHER_LABEL: &str = "Teacher";
pub const COLUMNS: [&str; 6] = ["ID", "Name", "Status", "Time", "Attended/Total", "Percentage"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Present,
    Absent,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Present => "Present",
            Status::Absent => "Absent",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Status::Present => "status-present",
            Status::Absent => "status-absent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRow {
    pub id: String,
    pub name: String,
    pub status: Status,
    pub time: String,
    pub attended: u32,
    pub total: u32,
    pub fraction: String,
    pub percentage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TableRow {
    Student(StudentRow),
    Placeholder { message: String },
}

pub fn render_rows(roster: &[RosterEntry], today: &DaySnapshot, aggregate: &Aggregate) -> Vec<TableRow> {
    if roster.is_empty() {
        return vec![TableRow::Placeholder {
            message: NO_STUDENTS.to_string(),
        }];
    }

    roster
        .iter()
        .map(|student| {
            let entry = today.get(&student.id);
            let status = if entry.is_some() {
                Status::Present
            } else {
                Status::Absent
            };
            let time = entry
                .and_then(|e| e.time.clone())
                .unwrap_or_else(|| PLACEHOLDER.to_string());
            let attended = aggregate.attended(&student.id);
            let total = aggregate.total_sessions;

            TableRow::Student(StudentRow {
                id: student.id.clone(),
                name: student
                    .name
                    .clone()
                    .unwrap_or_else(|| PLACEHOLDER.to_string()),
                status,
                time,
                attended,
                total,
                fraction: format!("{}/{}", attended, total),
                percentage: format!("{:.1}%", aggregate.percentage(&student.id)),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectSelector {
    pub options: Vec<SubjectOption>,
    pub selected: Option<String>,
    pub disabled: bool,
}

pub fn subject_selector(subjects: &[String], selected: Option<&str>) -> SubjectSelector {
    if subjects.is_empty() {
        return SubjectSelector {
            options: vec![SubjectOption {
                value: String::new(),
                label: NO_SUBJECTS.to_string(),
            }],
            selected: None,
            disabled: true,
        };
    }
    SubjectSelector {
        options: subjects
            .iter()
            .map(|s| SubjectOption {
                value: s.clone(),
                label: s.clone(),
            })
            .collect(),
        selected: selected.map(str::to_string),
        disabled: false,
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `<tbody>` inner HTML for the host. All record text is escaped.
pub fn render_tbody_html(rows: &[TableRow]) -> String {
    let mut out = String::new();
    for row in rows {
        match row {
            TableRow::Placeholder { message } => {
                out.push_str(&format!(
                    "<tr><td colspan=\"{}\" class=\"center-muted\">{}</td></tr>",
                    COLUMNS.len(),
                    escape_html(message)
                ));
            }
            TableRow::Student(r) => {
                out.push_str(&format!(
                    "<tr><td>{}</td><td>{}</td><td class=\"{}\">{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    escape_html(&r.id),
                    escape_html(&r.name),
                    r.status.css_class(),
                    r.status.label(),
                    escape_html(&r.time),
                    escape_html(&r.fraction),
                    escape_html(&r.percentage),
                ));
            }
        }
    }
    out
}
