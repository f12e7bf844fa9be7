use super::aggregate::{aggregate, class_aggregates, ClassAggregate};
use super::balance::{analyze_balance, BalanceEntry};
use super::critical::{find_critical, CriticalEntry};
use super::error::{AnalyticsError, AnalyticsResult};
use super::model::{ExamSnapshot, ExamSubject, LineType, ScoreLine, ScoreSegment};
use super::overview::{exam_overview, subject_stats, ExamOverview, SubjectStats};
use super::progress::{compare_progress, Progress, ProgressEntry};
use super::ranking::{rank, subject_population, top_n, total_population, RankedEntry};
use super::segments::{classify, SegmentDistribution};
use super::thresholds::{resolve_lines, resolve_segment, ResolvedSegment, SegmentQuery};
use crate::store::ScoreStore;
use chrono::Utc;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentThresholdsReport {
    pub exam_id: String,
    pub grade_id: String,
    pub subject_id: Option<String>,
    pub max_score: f64,
    #[serde(flatten)]
    pub resolved: ResolvedSegment,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinesReport {
    pub grade_id: String,
    pub line_type: Option<LineType>,
    pub lines: Vec<ScoreLine>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectStatsReport {
    pub exam_id: String,
    pub class_id: Option<String>,
    pub subjects: Vec<SubjectStats>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassCompareReport {
    pub exam_id: String,
    pub grade_id: String,
    pub classes: Vec<ClassAggregate>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingReport {
    pub exam_id: String,
    pub class_id: Option<String>,
    pub subject_id: Option<String>,
    pub population_size: usize,
    pub ranked_count: usize,
    pub top_n: Option<usize>,
    pub entries: Vec<RankedEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentsReport {
    pub exam_id: String,
    pub class_id: Option<String>,
    pub subject_id: Option<String>,
    pub max_score: f64,
    pub thresholds: ResolvedSegment,
    pub distribution: SegmentDistribution,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalReport {
    pub exam_id: String,
    pub class_id: Option<String>,
    pub line_type: Option<LineType>,
    pub range: f64,
    pub lines: Vec<ScoreLine>,
    pub students: Vec<CriticalEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceReport {
    pub exam_id: String,
    pub class_id: Option<String>,
    pub threshold: f64,
    pub imbalanced_count: usize,
    pub students: Vec<BalanceEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub current_exam_id: String,
    pub previous_exam_id: String,
    pub class_id: Option<String>,
    pub up_count: usize,
    pub down_count: usize,
    pub stable_count: usize,
    pub students: Vec<ProgressEntry>,
}

/// Binds the engine to an entity store. Every method reads one fresh snapshot
/// and computes over it; nothing is retained between calls.
pub struct AnalyticsService<'a, S: ScoreStore> {
    store: &'a S,
}

impl<'a, S: ScoreStore> AnalyticsService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    fn snapshot(&self, exam_id: &str, class_id: Option<&str>) -> AnalyticsResult<ExamSnapshot> {
        let exam = self
            .store
            .exam(exam_id)?
            .ok_or_else(|| AnalyticsError::not_found("exam", exam_id))?;
        if let Some(class_id) = class_id {
            if self.store.class(class_id)?.is_none() {
                return Err(AnalyticsError::not_found("class", class_id));
            }
        }
        let subjects = self.store.exam_subjects(exam_id)?;
        let records = self.store.score_records(exam_id, class_id)?;
        debug!(
            exam_id,
            class_id,
            subjects = subjects.len(),
            records = records.len(),
            "snapshot loaded"
        );
        Ok(ExamSnapshot {
            exam,
            class_id: class_id.map(|s| s.to_string()),
            subjects,
            records,
        })
    }

    fn require_subject<'s>(
        snapshot: &'s ExamSnapshot,
        subject_id: &str,
    ) -> AnalyticsResult<&'s ExamSubject> {
        snapshot
            .subject(subject_id)
            .ok_or_else(|| AnalyticsError::not_found("subject", subject_id))
    }

    fn resolve(
        snapshot: &ExamSnapshot,
        subject: Option<&ExamSubject>,
        segments: &[ScoreSegment],
    ) -> (f64, ResolvedSegment) {
        let max_score = subject
            .map(|s| s.max_score)
            .unwrap_or_else(|| snapshot.total_max_score());
        let resolved = resolve_segment(&SegmentQuery {
            grade_id: &snapshot.exam.grade_id,
            subject,
            max_score,
            segments,
        });
        debug!(
            subject_id = subject.map(|s| s.subject_id.as_str()),
            source = ?resolved.source,
            "segment thresholds resolved"
        );
        (max_score, resolved)
    }

    pub fn segment_thresholds(
        &self,
        exam_id: &str,
        subject_id: Option<&str>,
    ) -> AnalyticsResult<SegmentThresholdsReport> {
        let exam = self
            .store
            .exam(exam_id)?
            .ok_or_else(|| AnalyticsError::not_found("exam", exam_id))?;
        let snapshot = ExamSnapshot {
            subjects: self.store.exam_subjects(exam_id)?,
            exam,
            class_id: None,
            records: Vec::new(),
        };
        let subject = match subject_id {
            Some(id) => Some(Self::require_subject(&snapshot, id)?),
            None => None,
        };
        let segments = self.store.score_segments(&snapshot.exam.grade_id)?;
        let (max_score, resolved) = Self::resolve(&snapshot, subject, &segments);
        Ok(SegmentThresholdsReport {
            exam_id: snapshot.exam.id.clone(),
            grade_id: snapshot.exam.grade_id.clone(),
            subject_id: subject_id.map(|s| s.to_string()),
            max_score,
            resolved,
        })
    }

    pub fn lines(&self, grade_id: &str, line_type: Option<LineType>) -> AnalyticsResult<LinesReport> {
        if !self.store.grade_exists(grade_id)? {
            return Err(AnalyticsError::not_found("grade", grade_id));
        }
        let lines = resolve_lines(grade_id, line_type, &self.store.score_lines(grade_id)?);
        Ok(LinesReport {
            grade_id: grade_id.to_string(),
            line_type,
            lines,
        })
    }

    pub fn lines_for_exam(
        &self,
        exam_id: &str,
        line_type: Option<LineType>,
    ) -> AnalyticsResult<LinesReport> {
        let exam = self
            .store
            .exam(exam_id)?
            .ok_or_else(|| AnalyticsError::not_found("exam", exam_id))?;
        self.lines(&exam.grade_id, line_type)
    }

    pub fn exam_overview(
        &self,
        exam_id: &str,
        class_id: Option<&str>,
    ) -> AnalyticsResult<ExamOverview> {
        let snapshot = self.snapshot(exam_id, class_id)?;
        let aggregates = aggregate(&snapshot);
        let segments = self.store.score_segments(&snapshot.exam.grade_id)?;
        let (_, resolved) = Self::resolve(&snapshot, None, &segments);
        let mut overview = exam_overview(&snapshot, &aggregates, &resolved);
        overview.generated_at = Some(Utc::now().to_rfc3339());
        Ok(overview)
    }

    pub fn subject_stats(
        &self,
        exam_id: &str,
        class_id: Option<&str>,
    ) -> AnalyticsResult<SubjectStatsReport> {
        let snapshot = self.snapshot(exam_id, class_id)?;
        let aggregates = aggregate(&snapshot);
        let segments = self.store.score_segments(&snapshot.exam.grade_id)?;
        let subjects = snapshot
            .subjects
            .iter()
            .map(|subject| {
                let (_, resolved) = Self::resolve(&snapshot, Some(subject), &segments);
                subject_stats(&snapshot, &aggregates, subject, &resolved)
            })
            .collect();
        Ok(SubjectStatsReport {
            exam_id: exam_id.to_string(),
            class_id: class_id.map(|s| s.to_string()),
            subjects,
        })
    }

    pub fn class_compare(&self, exam_id: &str) -> AnalyticsResult<ClassCompareReport> {
        let snapshot = self.snapshot(exam_id, None)?;
        let aggregates = aggregate(&snapshot);
        Ok(ClassCompareReport {
            exam_id: exam_id.to_string(),
            grade_id: snapshot.exam.grade_id.clone(),
            classes: class_aggregates(&aggregates),
        })
    }

    pub fn total_ranking(
        &self,
        exam_id: &str,
        class_id: Option<&str>,
        limit: Option<usize>,
    ) -> AnalyticsResult<RankingReport> {
        let snapshot = self.snapshot(exam_id, class_id)?;
        let aggregates = aggregate(&snapshot);
        let ranked = rank(total_population(&aggregates));
        Ok(RankingReport {
            exam_id: exam_id.to_string(),
            class_id: class_id.map(|s| s.to_string()),
            subject_id: None,
            population_size: aggregates.len(),
            ranked_count: ranked.len(),
            top_n: limit,
            entries: top_n(ranked, limit),
        })
    }

    pub fn subject_ranking(
        &self,
        exam_id: &str,
        subject_id: &str,
        class_id: Option<&str>,
        limit: Option<usize>,
    ) -> AnalyticsResult<RankingReport> {
        let snapshot = self.snapshot(exam_id, class_id)?;
        Self::require_subject(&snapshot, subject_id)?;
        let aggregates = aggregate(&snapshot);
        let ranked = rank(subject_population(&aggregates, subject_id));
        Ok(RankingReport {
            exam_id: exam_id.to_string(),
            class_id: class_id.map(|s| s.to_string()),
            subject_id: Some(subject_id.to_string()),
            population_size: aggregates.len(),
            ranked_count: ranked.len(),
            top_n: limit,
            entries: top_n(ranked, limit),
        })
    }

    pub fn segments(
        &self,
        exam_id: &str,
        subject_id: Option<&str>,
        class_id: Option<&str>,
    ) -> AnalyticsResult<SegmentsReport> {
        let snapshot = self.snapshot(exam_id, class_id)?;
        let subject = match subject_id {
            Some(id) => Some(Self::require_subject(&snapshot, id)?),
            None => None,
        };
        let aggregates = aggregate(&snapshot);
        let segments = self.store.score_segments(&snapshot.exam.grade_id)?;
        let (max_score, resolved) = Self::resolve(&snapshot, subject, &segments);
        let scores: Vec<f64> = match subject {
            Some(s) => aggregates
                .subject_scores(&s.subject_id)
                .into_iter()
                .map(|(_, v)| v)
                .collect(),
            None => aggregates.usable_totals(),
        };
        let distribution = classify(&scores, &resolved.thresholds);
        Ok(SegmentsReport {
            exam_id: exam_id.to_string(),
            class_id: class_id.map(|s| s.to_string()),
            subject_id: subject_id.map(|s| s.to_string()),
            max_score,
            thresholds: resolved,
            distribution,
        })
    }

    pub fn critical(
        &self,
        exam_id: &str,
        line_type: Option<LineType>,
        range: f64,
        class_id: Option<&str>,
    ) -> AnalyticsResult<CriticalReport> {
        if range < 0.0 {
            return Err(AnalyticsError::BadParams("range must be non-negative".into()));
        }
        let snapshot = self.snapshot(exam_id, class_id)?;
        let aggregates = aggregate(&snapshot);
        let grade_id = &snapshot.exam.grade_id;
        let lines = resolve_lines(grade_id, line_type, &self.store.score_lines(grade_id)?);
        let students = find_critical(&aggregates, &lines, range);
        debug!(
            exam_id,
            lines = lines.len(),
            hits = students.len(),
            "critical students computed"
        );
        Ok(CriticalReport {
            exam_id: exam_id.to_string(),
            class_id: class_id.map(|s| s.to_string()),
            line_type,
            range,
            lines,
            students,
        })
    }

    pub fn balance(
        &self,
        exam_id: &str,
        class_id: Option<&str>,
        threshold: f64,
    ) -> AnalyticsResult<BalanceReport> {
        if threshold < 0.0 {
            return Err(AnalyticsError::BadParams(
                "threshold must be non-negative".into(),
            ));
        }
        let snapshot = self.snapshot(exam_id, class_id)?;
        let aggregates = aggregate(&snapshot);
        let students = analyze_balance(&aggregates, &snapshot.subjects, threshold);
        Ok(BalanceReport {
            exam_id: exam_id.to_string(),
            class_id: class_id.map(|s| s.to_string()),
            threshold,
            imbalanced_count: students.iter().filter(|s| s.is_imbalanced).count(),
            students,
        })
    }

    pub fn progress(
        &self,
        current_exam_id: &str,
        previous_exam_id: &str,
        class_id: Option<&str>,
    ) -> AnalyticsResult<ProgressReport> {
        let current = aggregate(&self.snapshot(current_exam_id, class_id)?);
        let previous = aggregate(&self.snapshot(previous_exam_id, class_id)?);
        let students = compare_progress(&current, &previous);
        let count = |p: Progress| students.iter().filter(|s| s.progress == p).count();
        let (up_count, down_count, stable_count) = (
            count(Progress::Up),
            count(Progress::Down),
            count(Progress::Stable),
        );
        Ok(ProgressReport {
            current_exam_id: current_exam_id.to_string(),
            previous_exam_id: previous_exam_id.to_string(),
            class_id: class_id.map(|s| s.to_string()),
            up_count,
            down_count,
            stable_count,
            students,
        })
    }
}
