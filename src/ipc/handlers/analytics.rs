use crate::analytics::AnalyticsService;
use crate::config::{self, AnalysisSettings};
use crate::ipc::error::{analytics_err, err, ok_json};
use crate::ipc::handlers::params::{
    db_conn, optional_f64, optional_line_type, optional_str, optional_top_n, required_str,
};
use crate::ipc::types::{AppState, Request};
use crate::store::SqliteStore;
use rusqlite::Connection;
use serde_json::Value;

type HandlerResult = Result<Value, Value>;

/// Common request shape: required `examId`, optional `classId`.
struct ExamScope {
    exam_id: String,
    class_id: Option<String>,
}

fn exam_scope(req: &Request) -> Result<ExamScope, Value> {
    Ok(ExamScope {
        exam_id: required_str(req, "examId")?,
        class_id: optional_str(req, "classId")?,
    })
}

fn settings(conn: &Connection, req: &Request) -> Result<AnalysisSettings, Value> {
    config::load_analysis(conn)
        .map_err(|e| err(&req.id, "db_query_failed", e.to_string(), None))
}

fn run<F>(state: &AppState, req: &Request, f: F) -> Value
where
    F: FnOnce(&Connection, &AnalyticsService<'_, SqliteStore<'_>>) -> HandlerResult,
{
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let store = SqliteStore::new(conn);
    let service = AnalyticsService::new(&store);
    match f(conn, &service) {
        Ok(v) | Err(v) => v,
    }
}

fn handle_exam_overview(state: &mut AppState, req: &Request) -> Value {
    run(state, req, |_, service| {
        let scope = exam_scope(req)?;
        service
            .exam_overview(&scope.exam_id, scope.class_id.as_deref())
            .map(|r| ok_json(&req.id, &r))
            .map_err(|e| analytics_err(&req.id, e))
    })
}

fn handle_subjects_stats(state: &mut AppState, req: &Request) -> Value {
    run(state, req, |_, service| {
        let scope = exam_scope(req)?;
        service
            .subject_stats(&scope.exam_id, scope.class_id.as_deref())
            .map(|r| ok_json(&req.id, &r))
            .map_err(|e| analytics_err(&req.id, e))
    })
}

fn handle_classes_compare(state: &mut AppState, req: &Request) -> Value {
    run(state, req, |_, service| {
        let exam_id = required_str(req, "examId")?;
        service
            .class_compare(&exam_id)
            .map(|r| ok_json(&req.id, &r))
            .map_err(|e| analytics_err(&req.id, e))
    })
}

fn handle_ranking_total(state: &mut AppState, req: &Request) -> Value {
    run(state, req, |_, service| {
        let scope = exam_scope(req)?;
        let limit = optional_top_n(req)?;
        service
            .total_ranking(&scope.exam_id, scope.class_id.as_deref(), limit)
            .map(|r| ok_json(&req.id, &r))
            .map_err(|e| analytics_err(&req.id, e))
    })
}

/// Bounded view of the total ranking; `topN` falls back to the configured default.
fn handle_ranking_top(state: &mut AppState, req: &Request) -> Value {
    run(state, req, |conn, service| {
        let scope = exam_scope(req)?;
        let limit = match optional_top_n(req)? {
            Some(n) => n,
            None => settings(conn, req)?.default_top_n,
        };
        service
            .total_ranking(&scope.exam_id, scope.class_id.as_deref(), Some(limit))
            .map(|r| ok_json(&req.id, &r))
            .map_err(|e| analytics_err(&req.id, e))
    })
}

fn handle_ranking_subject(state: &mut AppState, req: &Request) -> Value {
    run(state, req, |_, service| {
        let scope = exam_scope(req)?;
        let subject_id = required_str(req, "subjectId")?;
        let limit = optional_top_n(req)?;
        service
            .subject_ranking(
                &scope.exam_id,
                &subject_id,
                scope.class_id.as_deref(),
                limit,
            )
            .map(|r| ok_json(&req.id, &r))
            .map_err(|e| analytics_err(&req.id, e))
    })
}

fn handle_segments(state: &mut AppState, req: &Request) -> Value {
    run(state, req, |_, service| {
        let scope = exam_scope(req)?;
        let subject_id = optional_str(req, "subjectId")?;
        service
            .segments(
                &scope.exam_id,
                subject_id.as_deref(),
                scope.class_id.as_deref(),
            )
            .map(|r| ok_json(&req.id, &r))
            .map_err(|e| analytics_err(&req.id, e))
    })
}

fn handle_critical(state: &mut AppState, req: &Request) -> Value {
    run(state, req, |conn, service| {
        let scope = exam_scope(req)?;
        let line_type = optional_line_type(req)?;
        let range = match optional_f64(req, "range")? {
            Some(v) => v,
            None => settings(conn, req)?.critical_range,
        };
        service
            .critical(&scope.exam_id, line_type, range, scope.class_id.as_deref())
            .map(|r| ok_json(&req.id, &r))
            .map_err(|e| analytics_err(&req.id, e))
    })
}

fn handle_balance(state: &mut AppState, req: &Request) -> Value {
    run(state, req, |conn, service| {
        let scope = exam_scope(req)?;
        let threshold = match optional_f64(req, "threshold")? {
            Some(v) => v,
            None => settings(conn, req)?.balance_threshold,
        };
        service
            .balance(&scope.exam_id, scope.class_id.as_deref(), threshold)
            .map(|r| ok_json(&req.id, &r))
            .map_err(|e| analytics_err(&req.id, e))
    })
}

fn handle_progress(state: &mut AppState, req: &Request) -> Value {
    run(state, req, |_, service| {
        let current = required_str(req, "currentExamId")?;
        let previous = required_str(req, "previousExamId")?;
        let class_id = optional_str(req, "classId")?;
        service
            .progress(&current, &previous, class_id.as_deref())
            .map(|r| ok_json(&req.id, &r))
            .map_err(|e| analytics_err(&req.id, e))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "analytics.exam.overview" => Some(handle_exam_overview(state, req)),
        "analytics.subjects.stats" => Some(handle_subjects_stats(state, req)),
        "analytics.classes.compare" => Some(handle_classes_compare(state, req)),
        "analytics.ranking.total" => Some(handle_ranking_total(state, req)),
        "analytics.ranking.top" => Some(handle_ranking_top(state, req)),
        "analytics.ranking.subject" => Some(handle_ranking_subject(state, req)),
        "analytics.segments" => Some(handle_segments(state, req)),
        "analytics.critical" => Some(handle_critical(state, req)),
        "analytics.balance" => Some(handle_balance(state, req)),
        "analytics.progress" => Some(handle_progress(state, req)),
        _ => None,
    }
}
