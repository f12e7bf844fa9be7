mod analytics;
mod config;
mod db;
mod ipc;
mod logging;
mod store;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info, warn};

fn main() {
    logging::init_logging();
    info!(version = env!("CARGO_PKG_VERSION"), "scored starting");

    let mut state = ipc::AppState::default();

    if let Some(path) = std::env::var_os(config::WORKSPACE_ENV).map(PathBuf::from) {
        if let Err(e) = ipc::select_workspace(&mut state, &path) {
            // Stay up; the client can still select a workspace explicitly.
            error!(workspace = %path.display(), error = %e, "failed to open workspace from env");
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "unparseable request line");
                // No id to echo back.
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    info!("stdin closed, shutting down");
}
