use crate::analytics::AnalyticsError;
use serde_json::json;
use tracing::error;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn analytics_err(id: &str, e: AnalyticsError) -> serde_json::Value {
    if let AnalyticsError::Store(inner) = &e {
        error!(error = %inner, "store query failed");
    }
    err(id, e.code(), e.to_string(), e.details())
}

/// Serialises a result struct into an `ok` envelope.
pub fn ok_json<T: serde::Serialize>(id: &str, result: &T) -> serde_json::Value {
    match serde_json::to_value(result) {
        Ok(v) => ok(id, v),
        Err(e) => err(id, "serialize_failed", e.to_string(), None),
    }
}
