use crate::error::SelectionError;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn subjects_select(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let subject = get_required_str(params, "subject")?;
    let selected = state
        .dashboard
        .select_subject(&subject, &mut state.store)
        .map_err(|e| {
            let code = match e {
                SelectionError::NotSignedIn => "not_signed_in",
                SelectionError::UnknownSubject(_) => "not_found",
            };
            HandlerErr::new(code, e.to_string())
        })?;
    Ok(json!({ "selectedSubject": selected }))
}

fn dashboard_get(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    serde_json::to_value(state.dashboard.view())
        .map_err(|e| HandlerErr::new("serialize_failed", e.to_string()))
}

fn handle_subjects_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = subjects_select(state, &req.params);
    respond(&req.id, result)
}

fn handle_dashboard_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, dashboard_get(state))
}

fn handle_dashboard_html(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, Ok(json!({ "tbody": state.dashboard.tbody_html() })))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "subjects.select" => Some(handle_subjects_select(state, req)),
        "dashboard.get" => Some(handle_dashboard_get(state, req)),
        "dashboard.html" => Some(handle_dashboard_html(state, req)),
        _ => None,
    }
}
