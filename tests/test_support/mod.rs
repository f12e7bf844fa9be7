#![allow(dead_code)]

use rusqlite::{params, Connection};
use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

pub struct Sidecar {
    pub child: Child,
    pub stdin: ChildStdin,
    pub reader: BufReader<ChildStdout>,
    next_id: u64,
}

impl Drop for Sidecar {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub fn spawn_sidecar() -> Sidecar {
    let exe = env!("CARGO_BIN_EXE_scored");
    let mut child = Command::new(exe)
        .env_remove("SCORED_WORKSPACE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn scored");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    Sidecar {
        child,
        stdin,
        reader: BufReader::new(stdout),
        next_id: 0,
    }
}

impl Sidecar {
    pub fn send_raw(&mut self, line: &str) -> serde_json::Value {
        writeln!(self.stdin, "{}", line).expect("write request");
        self.stdin.flush().expect("flush request");
        let mut out = String::new();
        self.reader.read_line(&mut out).expect("read response line");
        assert!(!out.trim().is_empty(), "empty response for {}", line);
        serde_json::from_str(out.trim()).expect("parse response json")
    }

    pub fn request(&mut self, method: &str, params: serde_json::Value) -> serde_json::Value {
        self.next_id += 1;
        let id = self.next_id.to_string();
        let payload = json!({
            "id": id,
            "method": method,
            "params": params,
        });
        let value = self.send_raw(&payload.to_string());
        assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id.as_str()));
        value
    }

    pub fn request_ok(&mut self, method: &str, params: serde_json::Value) -> serde_json::Value {
        let value = self.request(method, params);
        assert!(
            value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
            "{} failed: {}",
            method,
            value
        );
        value.get("result").cloned().unwrap_or_else(|| json!({}))
    }

    /// Returns the error code of a request that must fail.
    pub fn request_err(&mut self, method: &str, params: serde_json::Value) -> String {
        let value = self.request(method, params);
        assert_eq!(
            value.get("ok").and_then(|v| v.as_bool()),
            Some(false),
            "{} unexpectedly succeeded: {}",
            method,
            value
        );
        value
            .pointer("/error/code")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    }

    pub fn select_workspace(&mut self, workspace: &Path) {
        let _ = self.request_ok(
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        );
    }
}

/// Direct writer for the workspace database; the daemon itself never writes
/// entity rows.
pub struct Seed {
    pub conn: Connection,
}

impl Seed {
    /// Call after `workspace.select` so the schema exists.
    pub fn open(workspace: &Path) -> Self {
        let conn = Connection::open(workspace.join("scored.sqlite3")).expect("open workspace db");
        Self { conn }
    }

    pub fn grade(&self, id: &str) -> &Self {
        self.conn
            .execute("INSERT INTO grades(id, name) VALUES(?, ?)", params![id, id])
            .expect("insert grade");
        self
    }

    pub fn class(&self, id: &str, grade_id: &str, name: &str) -> &Self {
        self.conn
            .execute(
                "INSERT INTO classes(id, grade_id, name) VALUES(?, ?, ?)",
                params![id, grade_id, name],
            )
            .expect("insert class");
        self
    }

    pub fn student(&self, id: &str, class_id: &str, sort_order: i64) -> &Self {
        self.conn
            .execute(
                "INSERT INTO students(id, class_id, name, sort_order) VALUES(?, ?, ?, ?)",
                params![id, class_id, format!("Student {}", id), sort_order],
            )
            .expect("insert student");
        self
    }

    pub fn subject(&self, id: &str, name: &str) -> &Self {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO subjects(id, name) VALUES(?, ?)",
                params![id, name],
            )
            .expect("insert subject");
        self
    }

    pub fn exam(&self, id: &str, grade_id: &str) -> &Self {
        self.conn
            .execute(
                "INSERT INTO exams(id, grade_id, name, status) VALUES(?, ?, ?, 'published')",
                params![id, grade_id, format!("Exam {}", id)],
            )
            .expect("insert exam");
        self
    }

    /// Exam subject id is `{exam}-{subject}`.
    pub fn exam_subject(
        &self,
        exam_id: &str,
        subject_id: &str,
        max_score: f64,
        include_in_total: bool,
        sort_order: i64,
    ) -> &Self {
        self.conn
            .execute(
                "INSERT INTO exam_subjects(id, exam_id, subject_id, max_score, include_in_total, sort_order)
                 VALUES(?, ?, ?, ?, ?, ?)",
                params![
                    format!("{}-{}", exam_id, subject_id),
                    exam_id,
                    subject_id,
                    max_score,
                    include_in_total as i64,
                    sort_order
                ],
            )
            .expect("insert exam subject");
        self
    }

    pub fn subject_lines(
        &self,
        exam_id: &str,
        subject_id: &str,
        excellent: Option<f64>,
        pass: Option<f64>,
    ) -> &Self {
        self.conn
            .execute(
                "UPDATE exam_subjects SET excellent_line = ?, pass_line = ?
                 WHERE exam_id = ? AND subject_id = ?",
                params![excellent, pass, exam_id, subject_id],
            )
            .expect("update subject lines");
        self
    }

    pub fn score(&self, exam_id: &str, subject_id: &str, student_id: &str, raw: f64) -> &Self {
        self.insert_score(exam_id, subject_id, student_id, Some(raw), false)
    }

    pub fn absent(&self, exam_id: &str, subject_id: &str, student_id: &str) -> &Self {
        self.insert_score(exam_id, subject_id, student_id, None, true)
    }

    fn insert_score(
        &self,
        exam_id: &str,
        subject_id: &str,
        student_id: &str,
        raw: Option<f64>,
        absent: bool,
    ) -> &Self {
        let es = format!("{}-{}", exam_id, subject_id);
        self.conn
            .execute(
                "INSERT INTO scores(id, exam_subject_id, student_id, raw_score, is_absent)
                 VALUES(?, ?, ?, ?, ?)",
                params![format!("{}-{}", es, student_id), es, student_id, raw, absent as i64],
            )
            .expect("insert score");
        self
    }

    pub fn segment(
        &self,
        id: &str,
        grade_id: &str,
        subject_id: Option<&str>,
        mins: (f64, f64, f64, f64),
        is_default: bool,
        is_active: bool,
    ) -> &Self {
        self.conn
            .execute(
                "INSERT INTO score_segments(id, grade_id, subject_id, excellent_min, good_min,
                                            pass_min, fail_max, is_default, is_active)
                 VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    id,
                    grade_id,
                    subject_id,
                    mins.0,
                    mins.1,
                    mins.2,
                    mins.3,
                    is_default as i64,
                    is_active as i64
                ],
            )
            .expect("insert segment");
        self
    }

    pub fn line(&self, id: &str, grade_id: &str, line_type: &str, value: f64, active: bool) -> &Self {
        self.conn
            .execute(
                "INSERT INTO score_lines(id, grade_id, name, line_type, score_value, is_active)
                 VALUES(?, ?, ?, ?, ?, ?)",
                params![id, grade_id, format!("Line {}", id), line_type, value, active as i64],
            )
            .expect("insert line");
        self
    }
}

/// One-subject exam (`total`, max 1000) whose subject scores equal the totals.
pub fn seed_totals(seed: &Seed, exam_id: &str, rows: &[(&str, f64)]) {
    seed.subject("total", "Total")
        .exam(exam_id, "g1")
        .exam_subject(exam_id, "total", 1000.0, true, 0);
    for (student, total) in rows {
        seed.score(exam_id, "total", student, *total);
    }
}
