use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::HandlerErr;

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    // The calendar day can change between requests with no store push.
    state.dashboard.roll_date(&mut state.store);
    state.settle();
    let resp = dispatch(state, &req);
    // Responses go out only once every event the request caused is handled.
    state.settle();
    resp
}

fn dispatch(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Some(resp) = handlers::core::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::auth::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::dashboard::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::store::try_handle(state, req) {
        return resp;
    }

    HandlerErr::new("not_implemented", format!("unknown method: {}", req.method)).response(&req.id)
}
