use crate::analytics::AnalyticsService;
use crate::ipc::error::{analytics_err, err, ok_json};
use crate::ipc::handlers::params::{db_conn, optional_line_type, optional_str, required_str};
use crate::ipc::types::{AppState, Request};
use crate::store::SqliteStore;

fn handle_thresholds_segment(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let exam_id = match required_str(req, "examId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let subject_id = match optional_str(req, "subjectId") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let store = SqliteStore::new(conn);
    match AnalyticsService::new(&store).segment_thresholds(&exam_id, subject_id.as_deref()) {
        Ok(report) => ok_json(&req.id, &report),
        Err(e) => analytics_err(&req.id, e),
    }
}

fn handle_thresholds_lines(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let grade_id = match optional_str(req, "gradeId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let exam_id = match optional_str(req, "examId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let line_type = match optional_line_type(req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let store = SqliteStore::new(conn);
    let service = AnalyticsService::new(&store);
    // gradeId wins when both are given.
    let report = match (grade_id, exam_id) {
        (Some(grade_id), _) => service.lines(&grade_id, line_type),
        (None, Some(exam_id)) => service.lines_for_exam(&exam_id, line_type),
        (None, None) => {
            return err(&req.id, "bad_params", "missing gradeId or examId", None);
        }
    };
    match report {
        Ok(report) => ok_json(&req.id, &report),
        Err(e) => analytics_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "thresholds.segment" => Some(handle_thresholds_segment(state, req)),
        "thresholds.lines" => Some(handle_thresholds_lines(state, req)),
        _ => None,
    }
}
