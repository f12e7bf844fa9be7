//! Parameter extraction shared by the handler modules. Every helper returns
//! the ready-made error envelope on failure.

use crate::analytics::model::LineType;
use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;
use serde_json::Value;

pub fn db_conn<'a>(state: &'a AppState, req: &Request) -> Result<&'a Connection, Value> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

pub fn required_str(req: &Request, key: &str) -> Result<String, Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

/// Absent and `null` both read as `None`; any other non-string is rejected.
pub fn optional_str(req: &Request, key: &str) -> Result<Option<String>, Value> {
    match req.params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(err(
            &req.id,
            "bad_params",
            format!("{} must be a string", key),
            None,
        )),
    }
}

pub fn optional_f64(req: &Request, key: &str) -> Result<Option<f64>, Value> {
    match req.params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_f64().map(Some).ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("{} must be a number", key),
                None,
            )
        }),
    }
}

pub fn optional_top_n(req: &Request) -> Result<Option<usize>, Value> {
    match req.params.get("topN") {
        None | Some(Value::Null) => Ok(None),
        Some(v) => match v.as_u64() {
            Some(n) if n >= 1 => Ok(Some(n as usize)),
            _ => Err(err(
                &req.id,
                "bad_params",
                "topN must be a positive integer",
                None,
            )),
        },
    }
}

pub fn optional_line_type(req: &Request) -> Result<Option<LineType>, Value> {
    let Some(raw) = optional_str(req, "lineType")? else {
        return Ok(None);
    };
    LineType::parse(&raw).map(Some).ok_or_else(|| {
        err(
            &req.id,
            "bad_params",
            "lineType must be one of: first-tier, regular, custom",
            Some(serde_json::json!({ "lineType": raw })),
        )
    })
}
