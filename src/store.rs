//! Read access to the entity store.
//!
//! The engine only ever reads: exams, their subjects, score records, score
//! segments and score lines. `ScoreStore` is the seam; `SqliteStore` reads the
//! workspace database.

use crate::analytics::model::{
    ClassRef, Exam, ExamSubject, LineType, ScoreLine, ScoreRecord, ScoreSegment,
};
use rusqlite::{Connection, OptionalExtension};

pub trait ScoreStore {
    fn exam(&self, exam_id: &str) -> rusqlite::Result<Option<Exam>>;
    fn class(&self, class_id: &str) -> rusqlite::Result<Option<ClassRef>>;
    fn grade_exists(&self, grade_id: &str) -> rusqlite::Result<bool>;
    /// Exam subjects in display order.
    fn exam_subjects(&self, exam_id: &str) -> rusqlite::Result<Vec<ExamSubject>>;
    /// Score records ordered by student sort order, then subject order.
    fn score_records(
        &self,
        exam_id: &str,
        class_id: Option<&str>,
    ) -> rusqlite::Result<Vec<ScoreRecord>>;
    fn score_segments(&self, grade_id: &str) -> rusqlite::Result<Vec<ScoreSegment>>;
    fn score_lines(&self, grade_id: &str) -> rusqlite::Result<Vec<ScoreLine>>;
}

pub struct SqliteStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl ScoreStore for SqliteStore<'_> {
    fn exam(&self, exam_id: &str) -> rusqlite::Result<Option<Exam>> {
        self.conn
            .query_row(
                "SELECT id, name, grade_id, status FROM exams WHERE id = ?",
                [exam_id],
                |r| {
                    Ok(Exam {
                        id: r.get(0)?,
                        name: r.get(1)?,
                        grade_id: r.get(2)?,
                        status: r.get(3)?,
                    })
                },
            )
            .optional()
    }

    fn class(&self, class_id: &str) -> rusqlite::Result<Option<ClassRef>> {
        self.conn
            .query_row(
                "SELECT id, grade_id, name FROM classes WHERE id = ?",
                [class_id],
                |r| {
                    Ok(ClassRef {
                        id: r.get(0)?,
                        grade_id: r.get(1)?,
                        name: r.get(2)?,
                    })
                },
            )
            .optional()
    }

    fn grade_exists(&self, grade_id: &str) -> rusqlite::Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM grades WHERE id = ?", [grade_id], |r| r.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    fn exam_subjects(&self, exam_id: &str) -> rusqlite::Result<Vec<ExamSubject>> {
        let mut stmt = self.conn.prepare(
            "SELECT es.id, es.subject_id, COALESCE(sub.name, es.subject_id),
                    es.max_score, es.weight, es.include_in_total, es.include_in_rank,
                    es.excellent_line, es.pass_line, es.low_line
             FROM exam_subjects es
             LEFT JOIN subjects sub ON sub.id = es.subject_id
             WHERE es.exam_id = ?
             ORDER BY es.sort_order, es.rowid",
        )?;
        let rows = stmt.query_map([exam_id], |r| {
            Ok(ExamSubject {
                id: r.get(0)?,
                subject_id: r.get(1)?,
                subject_name: r.get(2)?,
                max_score: r.get(3)?,
                weight: r.get(4)?,
                include_in_total: r.get::<_, i64>(5)? != 0,
                include_in_rank: r.get::<_, i64>(6)? != 0,
                excellent_line: r.get(7)?,
                pass_line: r.get(8)?,
                low_line: r.get(9)?,
            })
        })?;
        rows.collect()
    }

    fn score_records(
        &self,
        exam_id: &str,
        class_id: Option<&str>,
    ) -> rusqlite::Result<Vec<ScoreRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT st.id, st.name, c.id, c.name, sc.exam_subject_id,
                    sc.raw_score, sc.is_absent
             FROM scores sc
             JOIN exam_subjects es ON es.id = sc.exam_subject_id
             JOIN students st ON st.id = sc.student_id
             JOIN classes c ON c.id = st.class_id
             WHERE es.exam_id = ?1 AND (?2 IS NULL OR st.class_id = ?2)
             ORDER BY c.name, st.sort_order, st.rowid, es.sort_order, es.rowid",
        )?;
        let rows = stmt.query_map((exam_id, class_id), |r| {
            let is_absent = r.get::<_, i64>(6)? != 0;
            let raw: Option<f64> = r.get(5)?;
            Ok(ScoreRecord {
                student_id: r.get(0)?,
                student_name: r.get(1)?,
                class_id: r.get(2)?,
                class_name: r.get(3)?,
                exam_subject_id: r.get(4)?,
                // A missing raw value with no absence flag still counts as present.
                raw_score: if is_absent { 0.0 } else { raw.unwrap_or(0.0) },
                is_absent,
            })
        })?;
        rows.collect()
    }

    fn score_segments(&self, grade_id: &str) -> rusqlite::Result<Vec<ScoreSegment>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, grade_id, subject_id, excellent_min, good_min, pass_min, fail_max,
                    is_default, is_active
             FROM score_segments
             WHERE grade_id = ?
             ORDER BY rowid",
        )?;
        let rows = stmt.query_map([grade_id], |r| {
            Ok(ScoreSegment {
                id: r.get(0)?,
                grade_id: r.get(1)?,
                subject_id: r.get(2)?,
                excellent_min: r.get(3)?,
                good_min: r.get(4)?,
                pass_min: r.get(5)?,
                fail_max: r.get(6)?,
                is_default: r.get::<_, i64>(7)? != 0,
                is_active: r.get::<_, i64>(8)? != 0,
            })
        })?;
        rows.collect()
    }

    fn score_lines(&self, grade_id: &str) -> rusqlite::Result<Vec<ScoreLine>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, grade_id, name, line_type, score_value, is_active
             FROM score_lines
             WHERE grade_id = ?
             ORDER BY rowid",
        )?;
        let rows = stmt.query_map([grade_id], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, f64>(4)?,
                r.get::<_, i64>(5)? != 0,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, grade_id, name, line_type, score_value, is_active) = row?;
            // Lines with an unrecognised type cannot be filtered by type; treat as custom.
            let line_type = LineType::parse(&line_type).unwrap_or(LineType::Custom);
            out.push(ScoreLine {
                id,
                grade_id,
                name,
                line_type,
                score_value,
                is_active,
            });
        }
        Ok(out)
    }
}
