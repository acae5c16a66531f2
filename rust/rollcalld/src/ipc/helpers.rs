use crate::error::StoreError;
use crate::ipc::error::HandlerErr;
use crate::store::StorePath;
use serde_json::json;

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_required_path(params: &serde_json::Value, key: &str) -> Result<StorePath, HandlerErr> {
    let raw = get_required_str(params, key)?;
    StorePath::parse(&raw).map_err(|e| store_err(&e))
}

pub fn store_err(e: &StoreError) -> HandlerErr {
    match e {
        StoreError::InvalidKey { key, .. } => {
            HandlerErr::bad_params(e.to_string()).with_details(json!({ "key": key }))
        }
    }
}
