use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;
use tracing::{debug, info_span, warn};

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    let span = info_span!("request", id = %req.id, method = %req.method);
    let _guard = span.enter();

    let resp = dispatch(state, &req);
    match resp.get("error") {
        Some(e) => warn!(
            code = e.get("code").and_then(|v| v.as_str()).unwrap_or(""),
            message = e.get("message").and_then(|v| v.as_str()).unwrap_or(""),
            "request failed"
        ),
        None => debug!("request ok"),
    }
    resp
}

fn dispatch(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Some(resp) = handlers::core::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::setup::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::thresholds::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::analytics::try_handle(state, req) {
        return resp;
    }

    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}
