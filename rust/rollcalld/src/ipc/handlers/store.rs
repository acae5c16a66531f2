//! Backend bridge surface. The host forwards realtime backend changes here;
//! the dashboard itself never writes.

use crate::config;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{get_required_path, get_required_str};
use crate::ipc::types::{AppState, Request};
use log::info;
use serde_json::json;
use std::path::PathBuf;

fn store_set(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let path = get_required_path(params, "path")?;
    let Some(value) = params.get("value") else {
        return Err(HandlerErr::bad_params("missing value"));
    };
    state.store.set(&path, value.clone());
    Ok(json!({ "path": path.to_string() }))
}

fn store_remove(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let path = get_required_path(params, "path")?;
    state.store.remove(&path);
    Ok(json!({ "path": path.to_string() }))
}

fn store_get(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let path = get_required_path(params, "path")?;
    Ok(json!({
        "path": path.to_string(),
        "value": state.store.get(&path),
    }))
}

/// Replaces the whole tree from `params.data` or the JSON file at `params.file`.
fn store_load(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let data = match params.get("data") {
        Some(data) => data.clone(),
        None => {
            let file = PathBuf::from(get_required_str(params, "file")?);
            config::load_seed(&file).map_err(|e| {
                HandlerErr::new("load_failed", format!("{e:#}"))
                    .with_details(json!({ "file": file.to_string_lossy() }))
            })?
        }
    };
    state.store.load(data);
    info!("event=store_loaded");
    Ok(json!({ "loaded": true }))
}

fn store_set_connected(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let connected = params
        .get("connected")
        .and_then(|v| v.as_bool())
        .ok_or_else(|| HandlerErr::bad_params("missing connected"))?;
    state.store.set_connected(connected);
    state.auth.set_reachable(connected);
    info!("event=backend_connectivity connected={}", connected);
    Ok(json!({ "connected": connected }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "store.set" => store_set(state, &req.params),
        "store.remove" => store_remove(state, &req.params),
        "store.get" => store_get(state, &req.params),
        "store.load" => store_load(state, &req.params),
        "store.setConnected" => store_set_connected(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
