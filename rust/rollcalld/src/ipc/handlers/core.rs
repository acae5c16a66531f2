use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "signedIn": state.dashboard.is_signed_in(),
            "selectedSubject": state.dashboard.selected_subject(),
            "connected": state.store.is_connected(),
            "subscriptionCount": state.store.subscription_count(),
            "subscriptions": state.store.subscriptions_by_path(),
            "liveAttendanceSubscriptions": state.dashboard.live_today_subscriptions(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        _ => None,
    }
}
