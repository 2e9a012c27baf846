use serde::de::DeserializeOwned;

use crate::ipc::error::err;
use crate::store::StoreError;

/// Maps semantic store failures onto the stable protocol error codes.
pub fn store_err(id: &str, e: &StoreError) -> serde_json::Value {
    let code = match e {
        StoreError::BadInput(_) => "bad_params",
        StoreError::NotFound(_) => "not_found",
        StoreError::DuplicatePeriod(_) => "duplicate_period",
        StoreError::Storage(_) => "storage_failed",
    };
    err(id, code, e.to_string(), None)
}

pub fn param_i64(params: &serde_json::Value, key: &str) -> Option<i64> {
    params.get(key).and_then(|v| v.as_i64())
}

pub fn param_str<'a>(params: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

pub fn param_opt_string(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Decodes `params[key]` into a typed payload; the error branch is a ready
/// `bad_params` response.
pub fn decode_param<T: DeserializeOwned>(
    id: &str,
    params: &serde_json::Value,
    key: &str,
) -> Result<T, serde_json::Value> {
    let Some(raw) = params.get(key) else {
        return Err(err(id, "bad_params", format!("missing {}", key), None));
    };
    serde_json::from_value(raw.clone())
        .map_err(|e| err(id, "bad_params", format!("invalid {}: {}", key, e), None))
}
