use crate::auth::AuthService;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{AppState, Request};
use log::warn;
use serde_json::json;

fn auth_sign_in(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let email = get_required_str(params, "email")?;
    let password = get_required_str(params, "password")?;
    state.dashboard.clear_login_message();

    match state.auth.sign_in(&email, &password) {
        Ok(identity) => Ok(json!({
            "email": identity.email,
            "uid": identity.uid,
        })),
        Err(e) => {
            warn!("event=sign_in status=failed kind={}", e.kind());
            state.dashboard.set_login_message(e.to_string());
            Err(HandlerErr::new("auth_failed", e.to_string())
                .with_details(json!({ "kind": e.kind() })))
        }
    }
}

fn handle_auth_sign_in(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = auth_sign_in(state, &req.params);
    respond(&req.id, result)
}

fn handle_auth_sign_out(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.auth.sign_out();
    respond(&req.id, Ok(json!({ "signedIn": false })))
}

fn handle_auth_state(state: &mut AppState, req: &Request) -> serde_json::Value {
    let current = state.auth.current();
    respond(
        &req.id,
        Ok(json!({
            "signedIn": current.is_some(),
            "email": current.map(|i| i.email.clone()),
        })),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.signIn" => Some(handle_auth_sign_in(state, req)),
        "auth.signOut" => Some(handle_auth_sign_out(state, req)),
        "auth.state" => Some(handle_auth_state(state, req)),
        _ => None,
    }
}
